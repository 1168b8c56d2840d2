//! Benchmarks for link realization and reuse
//!
//! Run with: cargo bench -p gscm-sim --bench registry_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gscm_core::GscmConfig;
use gscm_sim::{hex_sites, LinkRegistry, LinkRequest, Node};

const FC: f64 = 3.5e9;

fn nodes(num_ue: u32) -> Vec<Node> {
    let mut nodes: Vec<Node> = hex_sites(500.0, 7)
        .unwrap()
        .into_iter()
        .enumerate()
        .map(|(i, p)| Node::bs(i as u32, [p[0], p[1], 25.0]).with_antennas(4))
        .collect();
    for k in 0..num_ue {
        let angle = k as f64 * 0.7;
        let r = 30.0 + 5.0 * k as f64;
        nodes.push(Node::ue(100 + k, [r * angle.cos(), r * angle.sin(), 1.5]));
    }
    nodes
}

fn config(spatial_consistency: bool) -> GscmConfig {
    let mut config = GscmConfig::default();
    config.scenario.wrap_around = true;
    config.scenario.spatial_consistency = spatial_consistency;
    config
}

// ============================================================================
// Realization
// ============================================================================

fn bench_realize(c: &mut Criterion) {
    let mut group = c.benchmark_group("realize");
    group.sample_size(10);

    for consistent in [false, true] {
        group.bench_with_input(BenchmarkId::new("7_sites_20_ue", consistent), &consistent, |b, &consistent| {
            b.iter(|| {
                let mut registry = LinkRegistry::new(&config(consistent)).unwrap();
                registry.attach_nodes(nodes(20));
                for ue in 100..120 {
                    for bs in 0..7 {
                        registry.resolve(&LinkRequest::new(bs, ue, FC, 4, 1)).unwrap();
                    }
                }
                registry.len()
            })
        });
    }

    group.finish();
}

// ============================================================================
// Reuse
// ============================================================================

fn bench_reuse(c: &mut Criterion) {
    let mut registry = LinkRegistry::new(&config(false)).unwrap();
    registry.attach_nodes(nodes(1));
    let down = LinkRequest::new(0, 100, FC, 4, 1);
    let up = down.reversed();
    registry.resolve(&down).unwrap();

    c.bench_function("reciprocal_descriptor", |b| {
        b.iter(|| {
            registry.descriptor(black_box(&up)).unwrap();
            registry.descriptor(black_box(&down)).unwrap()
        })
    });
}

criterion_group!(
    name = registry_benches;
    config = Criterion::default();
    targets = bench_realize, bench_reuse
);

criterion_main!(registry_benches);
