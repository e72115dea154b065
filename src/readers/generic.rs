// Parametric readers. All reference types.
//
//   Array<T> / List<T>   u32 count, then count elements
//   Dictionary<K, V>     u32 count, then count (key, value) pairs
//   Nullable<T>          u8 presence flag, then T when nonzero

use std::collections::HashMap;

use log::warn;

use super::{ContentResolver, TypeReader};
use crate::buffer::ByteCursor;
use crate::error::{Result, XnbError};
use crate::xnb::Value;

/// Cap on speculative preallocation from an untrusted count.
const MAX_PREALLOC: usize = 4096;

pub(super) fn read_sequence(
    elem: &TypeReader,
    c: &mut ByteCursor,
    resolver: &ContentResolver,
) -> Result<Value> {
    let count = c.read_u32()? as usize;
    let mut items = Vec::with_capacity(count.min(MAX_PREALLOC));
    for _ in 0..count {
        items.push(resolver.read_with(elem, c)?);
    }
    Ok(Value::Array(items))
}

pub(super) fn write_sequence(
    elem: &TypeReader,
    c: &mut ByteCursor,
    value: &Value,
    resolver: &ContentResolver,
) -> Result<()> {
    let Value::Array(items) = value else {
        return Err(XnbError::mismatch("Array", value.kind()));
    };
    c.write_u32(items.len() as u32);
    for item in items {
        resolver.write_with(elem, c, item)?;
    }
    Ok(())
}

/// Keys are compared by their encoded bytes, so any key type works. A
/// repeated key keeps its first position and takes the last value.
pub(super) fn read_dictionary(
    key: &TypeReader,
    val: &TypeReader,
    c: &mut ByteCursor,
    resolver: &ContentResolver,
) -> Result<Value> {
    let count = c.read_u32()? as usize;
    let mut entries: Vec<(Value, Value)> = Vec::with_capacity(count.min(MAX_PREALLOC));
    let mut seen: HashMap<Vec<u8>, usize> = HashMap::new();

    for _ in 0..count {
        let start = c.position();
        let k = resolver.read_with(key, c)?;
        let encoded = c.as_slice()[start..c.position()].to_vec();
        let v = resolver.read_with(val, c)?;

        match seen.get(&encoded) {
            Some(&slot) => {
                warn!("duplicate dictionary key {k:?}, keeping the last value");
                entries[slot].1 = v;
            }
            None => {
                seen.insert(encoded, entries.len());
                entries.push((k, v));
            }
        }
    }
    Ok(Value::Dictionary(entries))
}

pub(super) fn write_dictionary(
    key: &TypeReader,
    val: &TypeReader,
    c: &mut ByteCursor,
    value: &Value,
    resolver: &ContentResolver,
) -> Result<()> {
    let Value::Dictionary(entries) = value else {
        return Err(XnbError::mismatch("Dictionary", value.kind()));
    };
    c.write_u32(entries.len() as u32);
    for (k, v) in entries {
        resolver.write_with(key, c, k)?;
        resolver.write_with(val, c, v)?;
    }
    Ok(())
}

pub(super) fn read_nullable(
    inner: &TypeReader,
    c: &mut ByteCursor,
    resolver: &ContentResolver,
) -> Result<Value> {
    if c.read_u8()? == 0 {
        return Ok(Value::Null);
    }
    resolver.read_with(inner, c)
}

pub(super) fn write_nullable(
    inner: &TypeReader,
    c: &mut ByteCursor,
    value: &Value,
    resolver: &ContentResolver,
) -> Result<()> {
    if matches!(value, Value::Null) {
        c.write_u8(0);
        return Ok(());
    }
    c.write_u8(1);
    resolver.write_with(inner, c, value)
}
