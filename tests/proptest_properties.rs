use proptest::prelude::*;
use xnbkit::buffer::ByteCursor;
use xnbkit::buffer::varint;
use xnbkit::xnb::{HeaderInfo, ReaderDescriptor};
use xnbkit::{Document, Value, pack, unpack};

fn document(readers: &[&str], content: Value) -> Document {
    Document {
        header: HeaderInfo::default(),
        readers: readers.iter().map(|r| ReaderDescriptor::new(*r, 0)).collect(),
        content,
    }
}

fn vector2() -> impl Strategy<Value = Value> {
    (-1.0e6f32..1.0e6, -1.0e6f32..1.0e6)
        .prop_map(|(x, y)| Value::structure([("x", x.into()), ("y", y.into())]))
}

proptest! {
    #[test]
    fn prop_varuint_roundtrip_is_minimal(n in any::<u32>()) {
        let mut c = ByteCursor::writer();
        c.write_varuint(n);
        let bytes = c.into_inner();
        prop_assert_eq!(bytes.len(), varint::sizeof_u32(n));
        let expected_len = if n == 0 { 1 } else { (32 - n.leading_zeros() as usize).div_ceil(7) };
        prop_assert_eq!(bytes.len(), expected_len);
        for (i, b) in bytes.iter().enumerate() {
            prop_assert_eq!(b & 0x80 != 0, i + 1 < bytes.len());
        }
        let mut r = ByteCursor::new(bytes);
        prop_assert_eq!(r.read_varuint().unwrap(), n);
    }

    #[test]
    fn prop_prefixed_string_roundtrip(s in r"[^\x00]{0,200}") {
        let mut c = ByteCursor::writer();
        c.write_prefixed_string(&s);
        let bytes = c.into_inner();
        let (prefix, used) = varint::decode_u32(&bytes).unwrap();
        prop_assert_eq!(prefix as usize, s.len());
        prop_assert_eq!(used + s.len(), bytes.len());
        let mut r = ByteCursor::new(bytes);
        prop_assert_eq!(r.read_prefixed_string().unwrap(), s);
    }

    #[test]
    fn prop_bit_reads_advance_by_whole_words(
        data in proptest::collection::vec(any::<u8>(), 64..128),
        widths in proptest::collection::vec(0u32..=16, 0..24)
    ) {
        let mut c = ByteCursor::new(data);
        let mut total = 0u32;
        for n in widths {
            c.read_bits(n).unwrap();
            total += n;
            prop_assert!(c.bit_position() < 16);
            prop_assert_eq!(c.position(), 2 * (total / 16) as usize);
            prop_assert_eq!(c.bit_position(), total % 16);
        }
    }

    #[test]
    fn prop_int_list_roundtrip(items in proptest::collection::vec(any::<i32>(), 0..64)) {
        let doc = document(
            &["Microsoft.Xna.Framework.Content.ListReader`1[[System.Int32]]"],
            Value::Array(items.into_iter().map(Value::Int32).collect()),
        );
        prop_assert_eq!(unpack(&pack(&doc).unwrap()).unwrap(), doc);
    }

    #[test]
    fn prop_string_dictionary_roundtrip(
        map in proptest::collection::btree_map("[a-zA-Z0-9_ ]{0,16}", any::<i32>(), 0..32)
    ) {
        let doc = document(
            &[
                "Microsoft.Xna.Framework.Content.DictionaryReader`2[[System.String],[System.Int32]]",
                "Microsoft.Xna.Framework.Content.StringReader",
            ],
            Value::Dictionary(
                map.into_iter()
                    .map(|(k, v)| (Value::String(k), Value::Int32(v)))
                    .collect(),
            ),
        );
        prop_assert_eq!(unpack(&pack(&doc).unwrap()).unwrap(), doc);
    }

    #[test]
    fn prop_nullable_vector_array_roundtrip(
        items in proptest::collection::vec(proptest::option::of(vector2()), 0..16)
    ) {
        let doc = document(
            &[
                "Microsoft.Xna.Framework.Content.ArrayReader`1[[System.Nullable`1[[Microsoft.Xna.Framework.Vector2]]]]",
                "Microsoft.Xna.Framework.Content.NullableReader`1[[Microsoft.Xna.Framework.Vector2]]",
            ],
            Value::Array(items.into_iter().map(|v| v.unwrap_or(Value::Null)).collect()),
        );
        prop_assert_eq!(unpack(&pack(&doc).unwrap()).unwrap(), doc);
    }

    #[test]
    fn prop_unpack_never_panics(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = unpack(&data);
        let mut framed = b"XNBw\x05\x80".to_vec();
        framed.extend_from_slice(&((data.len() + 14) as u32).to_le_bytes());
        framed.extend_from_slice(&1024u32.to_le_bytes());
        framed.extend_from_slice(&data);
        let _ = unpack(&framed);
    }
}
