#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use cachesim::{config, Hierarchy, ReplacementPolicy};
use color_eyre::eyre;
use criterion::{black_box, Criterion};

fn cache(num_sets: usize, line_size: u32, associativity: usize) -> config::Cache {
    config::Cache {
        name: None,
        num_sets,
        line_size,
        associativity,
        replacement_policy: ReplacementPolicy::LRU,
        write_policy: config::WritePolicy::WRITE_BACK,
    }
}

fn run(levels: Vec<config::Cache>, num_requests: u64) -> eyre::Result<cachesim::stats::Snapshot> {
    let mut sim = Hierarchy::new(config::Hierarchy {
        levels,
        address_width_bits: 32,
        latency: None,
        random_seed: 0,
    })?;
    // knuth lcg driving a mixed request stream over a 1 MiB working set
    let mut state = 0xcafe_f00d_u64;
    for i in 0..num_requests {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let addr = state % (1 << 20);
        if i % 4 == 0 {
            sim.write(addr, state as u8)?;
        } else {
            sim.read(addr)?;
        }
    }
    Ok(sim.snapshot())
}

pub fn single_level_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_level");
    group.sample_size(10);

    group.bench_function("lru_write_back/100000", |b| {
        b.iter(|| run(black_box(vec![cache(64, 64, 4)]), 100_000));
    });
}

pub fn three_level_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("three_levels");
    group.sample_size(10);

    group.bench_function("lru_write_back/100000", |b| {
        b.iter(|| {
            run(
                black_box(vec![
                    cache(64, 64, 4),
                    cache(256, 64, 8),
                    cache(1024, 64, 16),
                ]),
                100_000,
            )
        });
    });
}

criterion::criterion_group!(benches, single_level_benchmark, three_level_benchmark);
criterion::criterion_main!(benches);
