//! Benchmark for bit buffer encode/decode throughput.
//!
//! TARGET: a full 1200 byte packet of mixed fields in under 5 microseconds
//!
//! Run with: cargo bench --package ironsight_bitbuf --bench bitbuf_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ironsight_bitbuf::{BitReader, BitWriter};

const PACKET_BYTES: usize = 1200;

fn benchmark_unsigned_bits(c: &mut Criterion) {
    let mut group = c.benchmark_group("unsigned_bits");
    group.throughput(Throughput::Bytes(PACKET_BYTES as u64));

    group.bench_function("write_13_bit_fields", |b| {
        let mut writer = BitWriter::new(vec![0u8; PACKET_BYTES]);
        b.iter(|| {
            writer.reset();
            let mut value = 0u32;
            while writer.bits_left() >= 13 {
                writer.write_unsigned_bits(black_box(value), 13);
                value = value.wrapping_add(0x3F1);
            }
            black_box(writer.position())
        });
    });

    let mut writer = BitWriter::new(vec![0u8; PACKET_BYTES]);
    while writer.bits_left() >= 13 {
        writer.write_unsigned_bits(0x1ABC, 13);
    }
    let packet = writer.into_inner();

    group.bench_function("read_13_bit_fields", |b| {
        b.iter(|| {
            let mut reader = BitReader::new(packet.as_slice());
            let mut sum = 0u32;
            while reader.bits_left() >= 13 {
                sum = sum.wrapping_add(reader.read_unsigned_bits(13));
            }
            black_box(sum)
        });
    });

    group.finish();
}

fn benchmark_varints(c: &mut Criterion) {
    let values: Vec<u32> = (0..256u32).map(|i| i.wrapping_mul(0x9E37_79B9) >> (i % 32)).collect();

    let mut group = c.benchmark_group("varints");
    group.throughput(Throughput::Elements(values.len() as u64));

    group.bench_function("write_aligned", |b| {
        let mut writer = BitWriter::new(vec![0u8; PACKET_BYTES * 2]);
        b.iter(|| {
            writer.reset();
            for &value in &values {
                writer.write_var_u32(black_box(value));
            }
            black_box(writer.position())
        });
    });

    group.bench_function("write_unaligned", |b| {
        let mut writer = BitWriter::new(vec![0u8; PACKET_BYTES * 2]);
        b.iter(|| {
            writer.reset();
            writer.write_bit(true);
            for &value in &values {
                writer.write_var_u32(black_box(value));
            }
            black_box(writer.position())
        });
    });

    group.finish();
}

fn benchmark_quantized(c: &mut Criterion) {
    let positions: Vec<[f32; 3]> = (0..64)
        .map(|i| {
            let t = i as f32;
            [t * 37.25 - 1200.0, t * 0.5, 4000.0 - t * 61.125]
        })
        .collect();

    let mut group = c.benchmark_group("quantized");
    group.throughput(Throughput::Elements(positions.len() as u64));

    group.bench_function("vec3_coord_round_trip", |b| {
        let mut writer = BitWriter::new(vec![0u8; PACKET_BYTES]);
        b.iter(|| {
            writer.reset();
            for &position in &positions {
                writer.write_vec3_coord(black_box(position));
            }
            let mut reader = BitReader::with_bit_count(writer.data(), writer.position());
            for _ in 0..positions.len() {
                black_box(reader.read_vec3_coord());
            }
        });
    });

    group.bench_function("coord_mp_low_precision", |b| {
        let mut writer = BitWriter::new(vec![0u8; PACKET_BYTES]);
        b.iter(|| {
            writer.reset();
            for &[x, y, z] in &positions {
                writer.write_coord_mp(black_box(x), false, true);
                writer.write_coord_mp(black_box(y), false, true);
                writer.write_coord_mp(black_box(z), false, true);
            }
            black_box(writer.position())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_unsigned_bits,
    benchmark_varints,
    benchmark_quantized
);
criterion_main!(benches);
