//! Extraction latency benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scroll_harvest::config::ExtractionConfig;
use scroll_harvest::extraction::ContentExtractor;
use scroll_harvest::navigation::positional_similarity;

const CARD: &str = "\
Remix
Download
Prompt
A fox curled up in a library armchair, warm lamp light, watercolor
Creation Time 25 Aug 2025 02:30:47
Model: v6
Aspect ratio 1:1";

fn noisy_card(filler_lines: usize) -> String {
    let mut text = String::new();
    for i in 0..filler_lines {
        text.push_str(&format!("tag {i}\n"));
    }
    text.push_str(CARD);
    text
}

fn bench_extract(c: &mut Criterion) {
    let extractor = ContentExtractor::new(ExtractionConfig::default()).expect("extractor");

    let mut group = c.benchmark_group("extract_metadata");
    for filler in [0usize, 50, 500] {
        let text = noisy_card(filler);
        group.bench_with_input(BenchmarkId::new("card", filler), &text, |b, text| {
            b.iter(|| extractor.extract_metadata(black_box(text)));
        });
    }
    group.bench_function("no_timestamp", |b| {
        b.iter(|| extractor.extract_metadata(black_box("Just some unrelated text without dates")));
    });
    group.finish();

    let batch: Vec<String> = (0..100).map(|_| CARD.to_string()).collect();
    c.bench_function("extract_batch_100", |b| {
        b.iter(|| extractor.extract_batch(black_box(&batch)));
    });
}

fn bench_similarity(c: &mut Criterion) {
    let a = "a quiet forest path in autumn light with fallen leaves and mist";
    let b = "a quiet forest path in autumn light with fallen leaves and fog!";
    c.bench_function("positional_similarity", |bench| {
        bench.iter(|| positional_similarity(black_box(a), black_box(b)));
    });
}

criterion_group!(benches, bench_extract, bench_similarity);
criterion_main!(benches);
