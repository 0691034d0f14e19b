//! Tokenization throughput benchmark.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use unitok_core::Tokenizer;

const LINES: &[&str] = &[
    "Capt. O'Connor's car can't've cost $100,000.",
    "Mr. Miller (Mary's ex-brother-in-law) can't afford $15,000.00.",
    "Visit https://www.youtube.com/watch?v=AaZ_RSt0KP8 or email a.almukhanov@energo.gov.kz.",
    "The U.S. economy grew 3.5%-5.5% in 2024, according to Gen. Smith.",
    "peace-loving T-shirt wearers don't mind ☀☀ weather.",
];

fn bench_tokenize(c: &mut Criterion) {
    let tokenizer = Tokenizer::with_language("eng").expect("resources load");
    let total_chars: usize = LINES.iter().map(|l| l.chars().count()).sum();

    let mut group = c.benchmark_group("tokenize");
    group.throughput(Throughput::Elements(total_chars as u64));
    group.bench_function("mixed_english_lines", |b| {
        b.iter(|| {
            for line in LINES {
                black_box(tokenizer.tokenize_string(black_box(line)));
            }
        })
    });
    group.finish();
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
