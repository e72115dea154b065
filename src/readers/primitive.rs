// Primitive codecs.

use crate::buffer::ByteCursor;
use crate::error::{Result, XnbError};
use crate::xnb::Value;

pub(super) fn read_bool(c: &mut ByteCursor) -> Result<Value> {
    Ok(Value::Boolean(c.read_u8()? != 0))
}

/// UTF-8 sequence length implied by a lead byte (1..=4).
///
/// Each pair of bits in the constant holds `len - 1` for one value of the
/// lead byte's top four bits.
fn char_len(lead: u8) -> usize {
    (((0xE500_0000u32 >> ((lead >> 3) & 0x1E)) & 3) + 1) as usize
}

pub(super) fn read_char(c: &mut ByteCursor) -> Result<Value> {
    let len = char_len(c.peek_u8()?);
    let bytes = c.read_bytes(len)?;
    let s = std::str::from_utf8(bytes)
        .map_err(|e| XnbError::CorruptData(format!("invalid UTF-8 in Char: {e}")))?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(Value::Char(ch)),
        _ => Err(XnbError::CorruptData(format!("Char decodes to {s:?}"))),
    }
}

pub(super) fn write_bool(c: &mut ByteCursor, value: &Value) -> Result<()> {
    match value {
        Value::Boolean(b) => {
            c.write_u8(u8::from(*b));
            Ok(())
        }
        other => Err(XnbError::mismatch("Boolean", other.kind())),
    }
}

pub(super) fn write_char(c: &mut ByteCursor, value: &Value) -> Result<()> {
    match value {
        Value::Char(ch) => {
            let mut buf = [0u8; 4];
            c.write_bytes(ch.encode_utf8(&mut buf).as_bytes());
            Ok(())
        }
        other => Err(XnbError::mismatch("Char", other.kind())),
    }
}

pub(super) fn write_i32(c: &mut ByteCursor, value: &Value) -> Result<()> {
    match value {
        Value::Int32(v) => {
            c.write_i32(*v);
            Ok(())
        }
        other => Err(XnbError::mismatch("Int32", other.kind())),
    }
}

pub(super) fn write_u32(c: &mut ByteCursor, value: &Value) -> Result<()> {
    match value {
        Value::UInt32(v) => {
            c.write_u32(*v);
            Ok(())
        }
        other => Err(XnbError::mismatch("UInt32", other.kind())),
    }
}

pub(super) fn write_f32(c: &mut ByteCursor, value: &Value) -> Result<()> {
    match value {
        Value::Single(v) => {
            c.write_f32(*v);
            Ok(())
        }
        other => Err(XnbError::mismatch("Single", other.kind())),
    }
}

pub(super) fn write_f64(c: &mut ByteCursor, value: &Value) -> Result<()> {
    match value {
        Value::Double(v) => {
            c.write_f64(*v);
            Ok(())
        }
        other => Err(XnbError::mismatch("Double", other.kind())),
    }
}

pub(super) fn write_string(c: &mut ByteCursor, value: &Value) -> Result<()> {
    match value {
        Value::String(s) => {
            c.write_prefixed_string(s);
            Ok(())
        }
        other => Err(XnbError::mismatch("String", other.kind())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_length_from_lead_byte() {
        assert_eq!(char_len(b'A'), 1);
        assert_eq!(char_len(0xC3), 2);
        assert_eq!(char_len(0xE2), 3);
        assert_eq!(char_len(0xF0), 4);
    }

    #[test]
    fn multibyte_chars_roundtrip() {
        for ch in ['a', 'é', '€', '🦀'] {
            let mut c = ByteCursor::writer();
            write_char(&mut c, &Value::Char(ch)).unwrap();
            assert_eq!(c.len(), ch.len_utf8());
            let mut r = ByteCursor::new(c.into_inner());
            assert_eq!(read_char(&mut r).unwrap(), Value::Char(ch));
            assert_eq!(r.remaining(), 0);
        }
    }

    #[test]
    fn broken_char_is_corrupt() {
        let mut c = ByteCursor::new(vec![0xE2, 0x41, 0x41]);
        assert!(matches!(read_char(&mut c), Err(XnbError::CorruptData(_))));
    }

    #[test]
    fn any_nonzero_byte_is_true() {
        let mut c = ByteCursor::new(vec![0, 1, 0x80]);
        assert_eq!(read_bool(&mut c).unwrap(), Value::Boolean(false));
        assert_eq!(read_bool(&mut c).unwrap(), Value::Boolean(true));
        assert_eq!(read_bool(&mut c).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn wrong_shape_is_a_mismatch() {
        let mut c = ByteCursor::writer();
        let err = write_i32(&mut c, &Value::String("x".into())).unwrap_err();
        assert!(matches!(
            err,
            XnbError::ValueMismatch { ref expected, ref found } if expected == "Int32" && found == "String"
        ));
        assert!(c.is_empty());
    }
}
