//! Byte-exact encodings and decode boundaries.

use kvwire::{
    decode_value, encode_key, encode_record, encode_value, DecodeError, ErrorKind, Key, Kind,
    EncodeError, MappedKey, MappedRecord, MappedValue, Record, Signature, Value, ValueView,
};

fn encode(value: &Value) -> Vec<u8> {
    encode_value(value).unwrap()
}

#[test]
fn test_absent_scalar() {
    assert_eq!(encode(&Value::absent()), [0x00]);
}

#[test]
fn test_one_byte_scalar() {
    assert_eq!(encode(&Value::scalar(b"a".to_vec())), [0x01, 0x01, 0x61]);
}

#[test]
fn test_three_byte_scalar() {
    assert_eq!(
        encode(&Value::scalar(b"abc".to_vec())),
        [0x01, 0x03, 0x61, 0x62, 0x63]
    );
}

#[test]
fn test_array_of_one_scalar() {
    let value = Value::array_from([Value::scalar(b"abc".to_vec())]);
    let bytes = encode(&value);
    assert_eq!(bytes, [0x41, 0x01, 0x05, 0x01, 0x03, 0x61, 0x62, 0x63]);

    let mapped = decode_value(&bytes).unwrap();
    assert_eq!(mapped.kind(), Kind::Array);
    assert_eq!(mapped.count(), 1);
    assert_eq!(mapped.value_at(0).unwrap().scalar(), Some(&b"abc"[..]));
}

#[test]
fn test_record_list_of_one_key_only_record() {
    let record = Record::new().with_key_bytes(b"abc".to_vec());
    assert_eq!(encode_record(&record).unwrap(), [0x40, 0x03, 0x61, 0x62, 0x63]);

    let bytes = encode(&Value::record_list_from([record]));
    assert_eq!(bytes, [0x11, 0x01, 0x05, 0x40, 0x03, 0x61, 0x62, 0x63]);

    let mapped = decode_value(&bytes).unwrap();
    assert_eq!(mapped.kind(), Kind::RecordList);
    let record = mapped.record_at(0).unwrap();
    assert_eq!(record.key(), Some(&b"abc"[..]));
    assert_eq!(record.value(), None);
}

#[test]
fn test_three_field_record() {
    let bytes = [0x54, 0x02, 0x61, 0x62, 0x02, 0x63, 0x64, 0x02, 0x65, 0x66];
    let record = Record::new()
        .with_key_bytes(b"ab".to_vec())
        .with_value_bytes(b"cd".to_vec())
        .with_scheme_bytes(b"ef".to_vec());
    assert_eq!(encode_record(&record).unwrap(), bytes);

    let mapped = MappedRecord::new(&bytes).unwrap();
    assert_eq!(mapped.key(), Some(&b"ab"[..]));
    assert_eq!(mapped.value(), Some(&b"cd"[..]));
    assert_eq!(mapped.scheme(), Some(&b"ef"[..]));
}

#[test]
fn test_empty_key() {
    assert_eq!(encode_key(&Key::new()), [0x00]);
    assert!(MappedKey::new(&[0x00]).unwrap().is_empty());
}

#[test]
fn test_scalar_length_boundaries() {
    for (len, header) in [(1usize, 0x01u8), (255, 0x01), (256, 0x02), (65535, 0x02)] {
        let payload = vec![0x5A; len];
        let bytes = encode(&Value::scalar(payload.clone()));
        assert_eq!(bytes[0], header, "len {len}");
        assert_eq!(bytes.len(), 1 + header as usize + len);
        assert_eq!(decode_value(&bytes).unwrap().scalar(), Some(&payload[..]));
    }
}

#[test]
fn test_empty_scalar_collapses_to_absent() {
    let empty = encode(&Value::scalar(Vec::new()));
    let absent = encode(&Value::absent());
    assert_eq!(empty, absent);
    // Only one of the two states survives decoding.
    let decoded = decode_value(&empty).unwrap().to_value().unwrap();
    assert!(decoded.is_absent());
}

#[test]
fn test_scalar_too_large() {
    let err = encode_value(&Value::scalar(vec![0; 65536])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueTooLarge);
}

#[test]
fn test_reserved_length_code() {
    let err = MappedValue::new(&[0x03, 0x00, 0x00, 0x00]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedEncoding);
}

#[test]
fn test_conflicting_kind() {
    let err = MappedValue::new(&[0x51, 0x01, 0x01, 0x00]).unwrap_err();
    assert_eq!(err, DecodeError::ConflictingKind { header: 0x51 });
}

#[test]
fn test_extensions_rejected() {
    for header in [0x08u8, 0x04] {
        let err = MappedValue::new(&[header]).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedExtension { .. }));
        assert_eq!(err.kind(), ErrorKind::UnsupportedEncoding);
    }
}

#[test]
fn test_two_byte_counts() {
    let value = Value::array_from((0..300).map(|_| Value::absent()));
    let bytes = encode(&value);
    // array-size code 2, content-length code 2
    assert_eq!(&bytes[..5], &[0x82, 0x01, 0x2C, 0x01, 0x2C]);

    let mapped = decode_value(&bytes).unwrap();
    assert_eq!(mapped.count(), 300);
    assert_eq!(mapped.value_at(299).unwrap().kind(), Kind::Absent);
}

#[test]
fn test_out_of_range_index() {
    let bytes = encode(&Value::array_from([Value::absent()]));
    let mapped = decode_value(&bytes).unwrap();
    let err = mapped.value_at(1).unwrap_err();
    assert_eq!(err, DecodeError::IndexOutOfRange { index: 1, count: 1 });
    assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
}

#[test]
fn test_truncated_input() {
    assert_eq!(MappedValue::new(&[]).unwrap_err().kind(), ErrorKind::TruncatedBuffer);
    assert_eq!(
        MappedValue::new(&[0x02, 0x01]).unwrap_err().kind(),
        ErrorKind::TruncatedBuffer
    );
    assert_eq!(
        MappedValue::new(&[0x41, 0x01]).unwrap_err().kind(),
        ErrorKind::TruncatedBuffer
    );
}

#[test]
fn test_unsigned_stamped_record_last_in_list() {
    let signed = Record::new()
        .with_key_bytes(b"a".to_vec())
        .with_timestamp(1)
        .with_signature(Signature::new([0x11; 32], [0x22; 32]));
    let plain = Record::new().with_key_bytes(b"b".to_vec());
    let unsigned = Record::new().with_key_bytes(vec![b'c'; 70]).with_timestamp(3);
    let value = Value::record_list_from([signed, plain, unsigned.clone()]);

    let bytes = encode(&value);
    let mapped = decode_value(&bytes).unwrap();
    assert_eq!(mapped.count(), 3);
    let last = mapped.record_at(2).unwrap();
    assert!(!last.is_signed());
    assert_eq!(last.to_record(), unsigned);
    assert_eq!(mapped.to_value().unwrap(), value);
}

#[test]
fn test_unsigned_stamped_record_before_siblings_rejected() {
    let unsigned = Record::new().with_key_bytes(b"a".to_vec()).with_timestamp(1);
    let next = Record::new().with_key_bytes(vec![b'b'; 70]).with_timestamp(2);
    let err = encode_value(&Value::record_list_from([unsigned, next])).unwrap_err();
    assert_eq!(err, EncodeError::UnsignedRecordNotLast { index: 0 });
}
