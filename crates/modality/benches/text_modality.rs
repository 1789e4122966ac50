//! Benchmarks for building the text modality
//!
//! Run with: cargo bench --package modality

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use modality::{BaseTokenizer, StopWords, TextModality};

const WORDS: &[&str] = &[
    "droid", "empire", "rebel", "farm", "boy", "princess", "smuggler", "ship", "planet", "war",
    "ring", "hobbit", "wizard", "mountain", "journey", "king", "sword", "dragon", "city", "night",
];

fn synthetic_corpus(n_docs: usize, doc_len: usize) -> (Vec<String>, Vec<String>) {
    let ids = (0..n_docs).map(|i| i.to_string()).collect();
    let texts = (0..n_docs)
        .map(|i| {
            (0..doc_len)
                .map(|j| WORDS[(i * 7 + j * 13) % WORDS.len()])
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    (ids, texts)
}

fn bench_build_text_modality(c: &mut Criterion) {
    let (ids, texts) = synthetic_corpus(2000, 120);
    let text_refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
    let modality = TextModality::new(BaseTokenizer::default().with_stop_words(StopWords::english()))
        .with_max_vocab(5000)
        .with_max_doc_freq(0.9);

    c.bench_function("text_modality_build_2000_docs", |b| {
        b.iter(|| {
            let features = modality
                .build_corpus(black_box(ids.clone()), black_box(&text_refs))
                .unwrap();
            black_box(features)
        })
    });
}

criterion_group!(benches, bench_build_text_modality);
criterion_main!(benches);
