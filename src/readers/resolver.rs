// Index dispatch over one file's reader table.
//
// Every reference-typed value in the content stream is introduced by a
// varuint holding the 1-based position of its reader. Value-typed elements
// carry no index and are decoded by the parent's element reader directly.

use log::trace;

use super::{TypeReader, TypeTag};
use crate::buffer::ByteCursor;
use crate::error::{Result, XnbError};
use crate::xnb::Value;

#[derive(Debug, Clone, Default)]
pub struct ContentResolver {
    readers: Vec<TypeReader>,
}

impl ContentResolver {
    pub fn new(readers: Vec<TypeReader>) -> Self {
        Self { readers }
    }

    pub fn readers(&self) -> &[TypeReader] {
        &self.readers
    }

    /// 1-based index of the first table entry with this tag.
    pub fn index_of(&self, tag: &TypeTag) -> Option<u32> {
        self.readers
            .iter()
            .position(|r| &r.tag() == tag)
            .map(|i| i as u32 + 1)
    }

    fn reader_at(&self, index: u32) -> Result<&TypeReader> {
        index
            .checked_sub(1)
            .and_then(|i| self.readers.get(i as usize))
            .ok_or(XnbError::InvalidReaderIndex {
                index,
                count: self.readers.len(),
            })
    }

    // -----------------------------------------------------------------------
    // Reading
    // -----------------------------------------------------------------------

    /// Read a reader index, then the value it introduces.
    pub fn read(&self, c: &mut ByteCursor) -> Result<Value> {
        let index = c.read_varuint()?;
        let reader = self.reader_at(index)?;
        trace!("dispatch index {index} ({}) at {}", reader.tag(), c.position());
        reader.read(c, self)
    }

    /// Read an element of type `reader`: inline for value types, through
    /// index dispatch otherwise.
    pub fn read_with(&self, reader: &TypeReader, c: &mut ByteCursor) -> Result<Value> {
        if reader.is_value_type() {
            reader.read(c, self)
        } else {
            self.read(c)
        }
    }

    // -----------------------------------------------------------------------
    // Writing
    // -----------------------------------------------------------------------

    /// Write the root value through the first reader, index included.
    pub fn write(&self, c: &mut ByteCursor, value: &Value) -> Result<()> {
        let root = self.reader_at(1)?;
        c.write_varuint(1);
        root.write(c, value, self)
    }

    /// Write an element of type `reader`, mirroring [`read_with`].
    ///
    /// [`read_with`]: Self::read_with
    pub fn write_with(&self, reader: &TypeReader, c: &mut ByteCursor, value: &Value) -> Result<()> {
        self.write_index(reader, c)?;
        reader.write(c, value, self)
    }

    /// Prefix a reference-typed element with its reader index. Value types
    /// write nothing.
    pub fn write_index(&self, reader: &TypeReader, c: &mut ByteCursor) -> Result<()> {
        if reader.is_value_type() {
            return Ok(());
        }
        let tag = reader.tag();
        let index = self.index_of(&tag).ok_or_else(|| {
            XnbError::UnsupportedType(format!("{tag} is not in the reader table"))
        })?;
        c.write_varuint(index);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shared resources
// ---------------------------------------------------------------------------

/// Read the shared-resource count, which must be zero.
pub fn read_shared_resources(c: &mut ByteCursor) -> Result<()> {
    match c.read_varuint()? {
        0 => Ok(()),
        n => Err(XnbError::UnsupportedFeature(format!(
            "{n} shared resources"
        ))),
    }
}

pub fn write_shared_resources(c: &mut ByteCursor) {
    c.write_varuint(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ContentResolver {
        ContentResolver::new(vec![
            TypeReader::List(Box::new(TypeReader::String)),
            TypeReader::String,
        ])
    }

    #[test]
    fn index_zero_and_out_of_range_fail() {
        let r = table();
        for index in [0u8, 3] {
            let mut c = ByteCursor::new(vec![index]);
            assert!(matches!(
                r.read(&mut c),
                Err(XnbError::InvalidReaderIndex { count: 2, .. })
            ));
        }
    }

    #[test]
    fn reference_elements_dispatch_through_the_table() {
        let r = table();
        let value = Value::Array(vec!["a".into(), "bc".into()]);
        let mut c = ByteCursor::writer();
        r.write(&mut c, &value).unwrap();
        assert_eq!(
            c.as_slice(),
            &[1, 2, 0, 0, 0, 2, 1, b'a', 2, 2, b'b', b'c']
        );

        let mut c = ByteCursor::new(c.into_inner());
        assert_eq!(r.read(&mut c).unwrap(), value);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn value_types_carry_no_index() {
        let r = table();
        let mut c = ByteCursor::writer();
        r.write_index(&TypeReader::Int32, &mut c).unwrap();
        assert!(c.is_empty());
        assert!(r.write_index(&TypeReader::Effect, &mut c).is_err());
    }

    #[test]
    fn shared_resources_must_be_zero() {
        assert!(read_shared_resources(&mut ByteCursor::new(vec![0])).is_ok());
        assert!(matches!(
            read_shared_resources(&mut ByteCursor::new(vec![1])),
            Err(XnbError::UnsupportedFeature(_))
        ));
    }
}
