use criterion::{criterion_group, criterion_main};


criterion_group!(
    benches,
    fit::bench_fit_chunk,
    fit::bench_fit_hyperparameters,
    scan::bench_ln_likelihood_ratio,
    scan::bench_find_jumps,
);
criterion_main!(benches);
