//! # Stream Safety Tests
//!
//! Sticky overflow, look-ahead, excision and the end-to-end message
//! scenarios the codec has to get right.

use ironsight_bitbuf::{BitBufConfig, BitBufError, BitReader, BitWriter, COORD_RESOLUTION};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CANARY: u8 = 0xA5;

#[test]
fn test_six_bit_field_round_trip() {
    let mut writer = BitWriter::new([0u8; 4]);
    writer.write_unsigned_bits(37, 6);

    let mut reader = BitReader::with_bit_count(writer.data(), writer.position());
    assert_eq!(reader.read_unsigned_bits(6), 37);
}

#[test]
fn test_coord_within_resolution() {
    let mut writer = BitWriter::new([0u8; 8]);
    writer.write_coord(128.5);

    let mut reader = BitReader::with_bit_count(writer.data(), writer.position());
    assert!((reader.read_coord() - 128.5).abs() < COORD_RESOLUTION);
}

#[test]
fn test_negative_varint_two_bytes() {
    let mut writer = BitWriter::new([0u8; 8]);
    writer.write_signed_var_i32(-300);
    assert_eq!(writer.bytes_written(), 2);
    assert_eq!(writer.as_bytes(), &[0xD7, 0x04]);

    let mut reader = BitReader::new(writer.as_bytes());
    assert_eq!(reader.read_signed_var_i32(), -300);
}

#[test]
fn test_overflow_clamps_cursor() {
    let mut writer = BitWriter::new([0u8; 4]);
    writer.write_unsigned_bits(0xFFFFF, 20);
    assert!(!writer.is_overflowed());
    writer.write_unsigned_bits(0xFFFFF, 20);
    assert!(writer.is_overflowed());
    assert_eq!(writer.position(), 32);
    assert_eq!(writer.bits_left(), 0);
    // The failed write left the last 12 bits alone.
    assert_eq!(writer.data(), &[0xFF, 0xFF, 0x0F, 0x00]);
    assert!(matches!(writer.check(), Err(BitBufError::Overflowed { position: 32, capacity: 32, .. })));
}

#[test]
fn test_unit_normal_rebuilds_z_sign() {
    let mut writer = BitWriter::new([0u8; 8]);
    writer.write_vec3_normal([0.6, 0.8, -0.0]);

    let mut reader = BitReader::with_bit_count(writer.data(), writer.position());
    let [x, y, z] = reader.read_vec3_normal();
    assert!((x - 0.6).abs() < 1.0 / 2047.0);
    assert!((y - 0.8).abs() < 1.0 / 2047.0);
    assert!(z.abs() < 1.0 / 2047.0);
    assert!(z.is_sign_negative());
}

#[test]
fn test_excise_middle_byte() {
    let bytes = [0x10u8, 0x21, 0x32, 0x43, 0x54, 0x65, 0x76, 0x87];
    let mut reader = BitReader::new(bytes);
    assert!(reader.excise_bits(16, 8));
    assert_eq!(reader.capacity_bits(), 56);
    assert_eq!(reader.position(), 16);

    reader.seek(0);
    let mut out = [0u8; 7];
    assert!(reader.read_bytes(&mut out));
    assert_eq!(out, [0x10, 0x21, 0x43, 0x54, 0x65, 0x76, 0x87]);
    assert_eq!(reader.bits_left(), 0);
}

#[test]
fn test_excise_random_ranges() {
    let mut rng = StdRng::seed_from_u64(0xE5C1);
    for _ in 0..200 {
        let original: Vec<u8> = (0..24).map(|_| rng.gen()).collect();
        let capacity = rng.gen_range(1..=192u32);
        let start = rng.gen_range(0..=capacity);
        let count = rng.gen_range(0..=capacity - start);

        let mut reader = BitReader::with_bit_count(original.clone(), capacity);
        assert!(reader.excise_bits(start, count));
        assert_eq!(reader.capacity_bits(), capacity - count);

        // Rebuild the expected stream bit by bit from the untouched copy.
        let mut source = BitReader::with_bit_count(original.as_slice(), capacity);
        let mut expected = Vec::new();
        for bit in 0..capacity {
            let value = source.read_bit();
            if bit < start || bit >= start + count {
                expected.push(value);
            }
        }

        reader.seek(0);
        for (i, &value) in expected.iter().enumerate() {
            assert_eq!(reader.read_bit(), value, "bit {i} start {start} count {count}");
        }
        assert_eq!(reader.bits_left(), 0);
        assert!(!reader.is_overflowed());
    }
}

#[test]
fn test_write_overflow_leaves_canaries() {
    let mut storage = [CANARY; 16];
    {
        let mut writer = BitWriter::new(&mut storage[..8]);
        writer.write_u32(0xFFFF_FFFF);
        writer.write_u16(0x0000);
        writer.write_u32(0x1234_5678);
        assert!(writer.is_overflowed());
        assert_eq!(writer.position(), 64);

        // Every later write is a no-op.
        writer.write_u8(0);
        writer.write_var_u64(u64::MAX);
        assert!(!writer.write_bytes(&[0; 32]));
        writer.write_coord(-1234.5);
    }
    assert_eq!(&storage[..6], &[0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00]);
    assert_eq!(&storage[6..], &[CANARY; 10]);
}

#[test]
fn test_bulk_write_overflow_leaves_canaries() {
    let mut storage = [CANARY; 12];
    {
        let mut writer = BitWriter::new(&mut storage[..4]);
        assert!(!writer.write_bytes(&[0u8; 5]));
        assert!(writer.is_overflowed());
    }
    assert_eq!(storage, [CANARY; 12]);
}

#[test]
fn test_read_overflow_returns_zero() {
    let storage = [0xFFu8; 8];
    let mut reader = BitReader::new(&storage[..3]);
    assert_eq!(reader.read_u16(), 0xFFFF);
    assert_eq!(reader.read_u32(), 0);
    assert!(reader.is_overflowed());
    assert_eq!(reader.position(), 24);

    assert_eq!(reader.read_u8(), 0);
    assert!(!reader.read_bit());
    assert_eq!(reader.read_var_u32(), 0);
    assert_eq!(reader.read_coord(), 0.0);
    assert!(reader.check().is_err());
}

#[test]
fn test_seek_out_of_range() {
    let mut reader = BitReader::new([0u8; 4]);
    assert!(reader.seek(32));
    assert!(!reader.seek(33));
    assert!(reader.is_overflowed());
    assert_eq!(reader.position(), 32);

    reader.reset();
    assert!(reader.seek_relative(10));
    assert!(!reader.seek_relative(-11));
    assert!(reader.is_overflowed());
}

#[test]
fn test_peek_then_read() {
    let mut rng = StdRng::seed_from_u64(0x9EE4);
    let fields: Vec<(u32, u32)> = (0..200)
        .map(|_| {
            let width = rng.gen_range(1..=32u32);
            (rng.gen::<u32>() >> (32 - width), width)
        })
        .collect();

    let mut writer = BitWriter::new(vec![0u8; 1024]);
    for &(value, width) in &fields {
        writer.write_unsigned_bits(value, width);
    }

    let mut reader = BitReader::with_bit_count(writer.as_bytes(), writer.position());
    for &(value, width) in &fields {
        let before = reader.position();
        assert_eq!(reader.peek_unsigned_bits(width), value);
        assert_eq!(reader.position(), before);
        assert_eq!(reader.read_unsigned_bits(width), value);
        assert_eq!(reader.position(), before + width);
    }
}

#[test]
fn test_message_dispatch_with_peek() {
    let mut writer = BitWriter::new([0u8; 32]);
    writer.write_unsigned_bits(5, 6);
    writer.write_string("chat", true, None);

    let mut reader = BitReader::with_bit_count(writer.data(), writer.position());
    let kind = reader.peek_unsigned_bits(6);
    assert_eq!(kind, 5);
    assert_eq!(reader.check_read_unsigned_bits(6), 5);
    assert_eq!(reader.read_unsigned_bits(6), kind);
    assert_eq!(reader.read_string(16, false).unwrap(), "chat");
    assert!(reader.check().is_ok());
}

#[test]
fn test_compare_encoded_fields() {
    let encode = |value: f32| {
        let mut writer = BitWriter::new([0u8; 16]);
        writer.write_u64(0x0102_0304_0506_0708);
        writer.write_coord(value);
        (writer.data().to_vec(), writer.position())
    };
    let a = encode(12.5);
    let b = encode(12.5);
    let c = encode(12.25);

    let mut ra = BitReader::with_bit_count(a.0.as_slice(), a.1);
    let mut rb = BitReader::with_bit_count(b.0.as_slice(), b.1);
    assert!(!ra.compare_bits(&mut rb, a.1));

    let mut ra = BitReader::with_bit_count(a.0.as_slice(), a.1);
    let mut rc = BitReader::with_bit_count(c.0.as_slice(), c.1);
    assert!(ra.compare_bits(&mut rc, a.1));
    assert_eq!(ra.bits_left(), 0);
}

#[test]
fn test_back_patched_length_prefix() {
    let config = BitBufConfig {
        packet_bytes: 64,
        ..BitBufConfig::default()
    };
    let mut writer = config.packet_writer().unwrap();
    writer.set_debug_label("entity_update");

    let header = writer.position();
    writer.write_unsigned_bits(0, 10);
    let body = writer.position();
    writer.write_var_u32(1234);
    writer.write_coord_mp(-12.75, false, false);
    writer.write_angle(271.0, 10);
    let end = writer.position();

    assert!(writer.seek_to_bit(header));
    writer.write_unsigned_bits(end - body, 10);
    assert!(writer.seek_to_bit(end));
    assert!(writer.check().is_ok());

    let mut reader = BitReader::with_bit_count(writer.as_bytes(), writer.position());
    let length = reader.read_unsigned_bits(10);
    assert_eq!(length, end - body);
    assert_eq!(reader.bits_left(), length);
    assert_eq!(reader.read_var_u32(), 1234);
    assert_eq!(reader.read_coord_mp(false, false), -12.75);
    assert!((reader.read_angle(10) - 271.0).abs() < 360.0 / 1024.0);
}

#[test]
fn test_string_limit_from_config() {
    let config = BitBufConfig::from_toml_str("max_string_len = 4").unwrap();
    let mut writer = BitWriter::new([0u8; 16]);
    writer.write_string("toolong", true, None);

    let mut reader = BitReader::with_bit_count(writer.data(), writer.position());
    assert_eq!(
        reader.read_string(config.max_string_len, false),
        Err(BitBufError::StringTooLong { limit: 4 })
    );
    assert_eq!(reader.bits_left(), 0);
}
