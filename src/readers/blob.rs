// Opaque payload readers producing export placeholders.

use crate::buffer::ByteCursor;
use crate::error::{Result, XnbError};
use crate::xnb::{Export, Value};

fn invalid_export(kind: &str, value: &Value) -> XnbError {
    match value {
        Value::Export(e) => {
            XnbError::InvalidExport(format!("expected a {kind} export, found {}", e.kind()))
        }
        other => XnbError::InvalidExport(format!(
            "expected a {kind} export, found a {} value",
            other.kind()
        )),
    }
}

fn write_len(c: &mut ByteCursor, len: usize) -> Result<()> {
    let len = u32::try_from(len)
        .map_err(|_| XnbError::InvalidExport(format!("payload of {len} bytes is too large")))?;
    c.write_u32(len);
    Ok(())
}

// ---------------------------------------------------------------------------
// Texture2D
// ---------------------------------------------------------------------------

pub(super) fn read_texture(c: &mut ByteCursor) -> Result<Value> {
    let format = c.read_i32()?;
    let width = c.read_u32()?;
    let height = c.read_u32()?;
    let mip_count = c.read_u32()?;
    let mut mips = Vec::new();
    for _ in 0..mip_count {
        let len = c.read_u32()? as usize;
        mips.push(c.read_bytes(len)?.to_vec());
    }
    Ok(Value::Export(Export::Texture2D {
        format,
        width,
        height,
        mips,
    }))
}

pub(super) fn write_texture(c: &mut ByteCursor, value: &Value) -> Result<()> {
    let Value::Export(Export::Texture2D {
        format,
        width,
        height,
        mips,
    }) = value
    else {
        return Err(invalid_export("Texture2D", value));
    };
    c.write_i32(*format);
    c.write_u32(*width);
    c.write_u32(*height);
    write_len(c, mips.len())?;
    for mip in mips {
        write_len(c, mip.len())?;
        c.write_bytes(mip);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Effect, TBin, BmFont
// ---------------------------------------------------------------------------

pub(super) fn read_effect(c: &mut ByteCursor) -> Result<Value> {
    let len = c.read_u32()? as usize;
    Ok(Value::Export(Export::Effect(c.read_bytes(len)?.to_vec())))
}

pub(super) fn write_effect(c: &mut ByteCursor, value: &Value) -> Result<()> {
    let Value::Export(Export::Effect(data)) = value else {
        return Err(invalid_export("Effect", value));
    };
    write_len(c, data.len())?;
    c.write_bytes(data);
    Ok(())
}

/// The map length is a signed 32-bit count.
pub(super) fn read_tbin(c: &mut ByteCursor) -> Result<Value> {
    let len = c.read_i32()?;
    let len = usize::try_from(len)
        .map_err(|_| XnbError::CorruptData(format!("negative TBin length {len}")))?;
    Ok(Value::Export(Export::TBin(c.read_bytes(len)?.to_vec())))
}

pub(super) fn write_tbin(c: &mut ByteCursor, value: &Value) -> Result<()> {
    let Value::Export(Export::TBin(data)) = value else {
        return Err(invalid_export("TBin", value));
    };
    let len = i32::try_from(data.len())
        .map_err(|_| XnbError::InvalidExport(format!("TBin of {} bytes is too large", data.len())))?;
    c.write_i32(len);
    c.write_bytes(data);
    Ok(())
}

pub(super) fn read_bmfont(c: &mut ByteCursor) -> Result<Value> {
    Ok(Value::Export(Export::BmFont(c.read_prefixed_string()?)))
}

pub(super) fn write_bmfont(c: &mut ByteCursor, value: &Value) -> Result<()> {
    let Value::Export(Export::BmFont(xml)) = value else {
        return Err(invalid_export("BmFont", value));
    };
    c.write_prefixed_string(xml);
    Ok(())
}
