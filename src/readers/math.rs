// XNA math structs. All value types.

use crate::buffer::ByteCursor;
use crate::error::{Result, XnbError};
use crate::xnb::Value;

const VECTOR_FIELDS: [&str; 4] = ["x", "y", "z", "w"];
const RECTANGLE_FIELDS: [&str; 4] = ["x", "y", "width", "height"];

fn vector_name(dims: usize) -> &'static str {
    match dims {
        2 => "Vector2",
        3 => "Vector3",
        _ => "Vector4",
    }
}

pub(super) fn read_vector(c: &mut ByteCursor, dims: usize) -> Result<Value> {
    let mut fields = Vec::with_capacity(dims);
    for name in &VECTOR_FIELDS[..dims] {
        fields.push((name.to_string(), Value::Single(c.read_f32()?)));
    }
    Ok(Value::Struct(fields))
}

pub(super) fn read_rectangle(c: &mut ByteCursor) -> Result<Value> {
    let mut fields = Vec::with_capacity(4);
    for name in RECTANGLE_FIELDS {
        fields.push((name.to_string(), Value::Int32(c.read_i32()?)));
    }
    Ok(Value::Struct(fields))
}

pub(super) fn write_vector(c: &mut ByteCursor, value: &Value, dims: usize) -> Result<()> {
    let name = vector_name(dims);
    for field in &VECTOR_FIELDS[..dims] {
        let v = value
            .field(field)
            .ok_or_else(|| XnbError::mismatch(format!("{name}.{field}"), value.kind()))?;
        match v {
            Value::Single(f) => c.write_f32(*f),
            other => return Err(XnbError::mismatch("Single", other.kind())),
        }
    }
    Ok(())
}

pub(super) fn write_rectangle(c: &mut ByteCursor, value: &Value) -> Result<()> {
    for field in RECTANGLE_FIELDS {
        let v = value
            .field(field)
            .ok_or_else(|| XnbError::mismatch(format!("Rectangle.{field}"), value.kind()))?;
        match v {
            Value::Int32(i) => c.write_i32(*i),
            other => return Err(XnbError::mismatch("Int32", other.kind())),
        }
    }
    Ok(())
}
