mod common;

use proptest::prelude::*;

use common::{pair, Wire};
use nrbf::codec::{Reader, Writer};
use nrbf::{DecodeOptions, Message, TypeDescriptor, TypeRegistry};

proptest! {
    #[test]
    fn fuzz_decode_no_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = Message::decode(&bytes, &DecodeOptions::default());
    }

    #[test]
    fn fuzz_header_then_garbage(
        root in any::<i32>(),
        payload in prop::collection::vec(any::<u8>(), 0..512)
    ) {
        let bytes = Wire::header(root).bytes(&payload).into_bytes();
        if let Ok(message) = Message::decode(&bytes, &DecodeOptions::default()) {
            // Whatever decoded must also survive reconstruction attempts.
            let types = TypeRegistry::new().with(TypeDescriptor::new("Pair").fields(["X", "Y"]));
            let _ = message.reconstruct(&types);
            let _ = message.reconstruct(&TypeRegistry::new());
            let _ = message.encode();
        }
    }

    #[test]
    fn fuzz_truncated_pair_fails_cleanly(cut in 0usize..45) {
        let bytes = pair();
        prop_assume!(cut < bytes.len());
        prop_assert!(Message::decode(&bytes[..cut], &DecodeOptions::default()).is_err());
    }

    #[test]
    fn fuzz_string_round_trip(s in ".{0,300}") {
        let mut writer = Writer::new();
        writer.write_string(&s, "value").unwrap();
        let bytes = writer.into_bytes();

        let mut reader = Reader::new(&bytes);
        prop_assert_eq!(reader.read_string("value").unwrap(), s);
        prop_assert!(reader.is_empty());
    }

    #[test]
    fn fuzz_length_prefix_round_trip(len in 0usize..=i32::MAX as usize) {
        let mut writer = Writer::new();
        writer.write_length_prefix(len, "len").unwrap();
        let bytes = writer.into_bytes();
        prop_assert!(bytes.len() <= 5);

        let mut reader = Reader::new(&bytes);
        prop_assert_eq!(reader.read_length_prefix("len").unwrap(), len);
    }
}
