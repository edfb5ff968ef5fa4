//! Benchmark suite for gateprep-algo
//!
//! Run with: cargo bench

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gateprep_algo::{build_learning_path, initial_state, recommend, Catalog, Subject, Subtopic};

fn large_catalog() -> Catalog {
    Catalog {
        topics: (0..40)
            .map(|s| Subject {
                title: format!("Subject {s}"),
                subtopics: (0..12)
                    .map(|t| Subtopic {
                        title: format!("Topic {t}"),
                        key_points: vec!["point".to_string()],
                        examples: Vec::new(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

fn bench_recommend(c: &mut Criterion) {
    let catalog = large_catalog();
    let state = initial_state("bench", &catalog, Utc::now());
    let now = Utc::now();
    c.bench_function("recommend top 3 of 480", |b| {
        b.iter(|| recommend(black_box(&state), 3, now))
    });
}

fn bench_learning_path(c: &mut Criterion) {
    let catalog = large_catalog();
    let state = initial_state("bench", &catalog, Utc::now());
    c.bench_function("build_learning_path 40 subjects", |b| {
        b.iter(|| build_learning_path(black_box(&state), &catalog))
    });
}

criterion_group!(benches, bench_recommend, bench_learning_path);
criterion_main!(benches);
