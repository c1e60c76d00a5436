use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hzip::{Compression, Huffman};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SAMPLE: &[u8] = b"The quick brown fox jumps over the lazy dog. \
Pack my box with five dozen liquor jugs. How vexingly quick daft zebras jump!\n";

fn generate_text(len: usize) -> Vec<u8> {
    SAMPLE.iter().copied().cycle().take(len).collect()
}

fn generate_uniform(len: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    (0..len).map(|_| rng.gen_range(1..128u8)).collect()
}

fn bench_compress(c: &mut Criterion) {
    let codec = Huffman::new();
    let mut group = c.benchmark_group("huffman_compress");

    for size in [1_000, 10_000, 100_000, 1_000_000] {
        let text = generate_text(size);
        let uniform = generate_uniform(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("text", size), &text, |b, data| {
            b.iter(|| codec.compress(black_box(data)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("uniform", size), &uniform, |b, data| {
            b.iter(|| codec.compress(black_box(data)).unwrap())
        });
    }

    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let codec = Huffman::new();
    let mut group = c.benchmark_group("huffman_decompress");

    for size in [1_000, 10_000, 100_000, 1_000_000] {
        let archive = codec.compress(&generate_text(size)).unwrap();
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("text", size), &archive, |b, data| {
            b.iter(|| codec.decompress(black_box(data)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compress, bench_decompress);
criterion_main!(benches);
