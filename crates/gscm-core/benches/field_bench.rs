//! Benchmarks for correlated field construction and parameter generation
//!
//! Run with: cargo bench -p gscm-core --bench field_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gscm_core::spatial_grid::GRID_RESOLUTION_M;
use gscm_core::{
    AutoCorrelationField, ClusterContext, ClusterParameterGenerator, Condition, FactoryHall,
    LargeScaleParameterGenerator, LinkGeometry, LosAngles, Randomness, Scenario, ScenarioParams, SpatialGrid,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ============================================================================
// Field Construction
// ============================================================================

fn bench_field_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_build");
    group.sample_size(10);

    for side in [200.0, 500.0, 1000.0] {
        let grid = SpatialGrid::rasterize([0.0, 0.0], [side, side], GRID_RESOLUTION_M, 50.0).unwrap();
        group.throughput(Throughput::Elements(grid.len() as u64));

        group.bench_with_input(BenchmarkId::new("exp_kernel_d50", side as u64), &grid, |b, grid| {
            let mut rng = StdRng::seed_from_u64(0);
            b.iter(|| AutoCorrelationField::build(&mut rng, black_box(grid), &[Some(50.0)]).unwrap())
        });
    }

    let grid = SpatialGrid::rasterize([0.0, 0.0], [500.0, 500.0], GRID_RESOLUTION_M, 50.0).unwrap();
    let lsp_distances = [Some(50.0), Some(12.0), Some(30.0), Some(18.0), Some(15.0), Some(15.0), Some(15.0)];
    group.bench_function("lsp_batch_7", |b| {
        let mut rng = StdRng::seed_from_u64(1);
        b.iter(|| AutoCorrelationField::build(&mut rng, &grid, black_box(&lsp_distances)).unwrap())
    });

    group.finish();
}

fn bench_field_sample(c: &mut Criterion) {
    let grid = SpatialGrid::rasterize([0.0, 0.0], [500.0, 500.0], GRID_RESOLUTION_M, 50.0).unwrap();
    let mut rng = StdRng::seed_from_u64(2);
    let fields = AutoCorrelationField::build(&mut rng, &grid, &[Some(50.0)]).unwrap();
    let field = &fields[0];

    c.bench_function("field_sample_uniform", |b| {
        b.iter(|| field.sample_uniform(black_box(&[123.4, 321.0])).unwrap())
    });
}

// ============================================================================
// Parameter Generation
// ============================================================================

fn bench_link_parameters(c: &mut Criterion) {
    let mut group = c.benchmark_group("link_parameters");
    let bs = [0.0, 0.0, 25.0];
    let ue = [100.0, 50.0, 1.5];
    let hall = FactoryHall::default();
    let geom = LinkGeometry::new(&bs, &ue, 3.5e9);

    for condition in [Condition::Los, Condition::Nlos] {
        let params = ScenarioParams::lookup(Scenario::UMa, condition, condition == Condition::Los, &geom, &hall);
        let label = format!("{:?}", condition);

        group.bench_with_input(BenchmarkId::new("lsp_and_clusters", &label), &params, |b, params| {
            let mut rng = StdRng::seed_from_u64(3);
            b.iter(|| {
                let mut draws = Randomness::independent(&mut rng);
                let lsp = LargeScaleParameterGenerator::default()
                    .generate(params, condition, &mut draws)
                    .unwrap();
                let ctx = ClusterContext {
                    scenario: Scenario::UMa,
                    params,
                    lsp: &lsp,
                    los_angles: LosAngles::between(&bs, &ue),
                    hall: &hall,
                };
                ClusterParameterGenerator::new(true).generate(&ctx, &mut draws).unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(
    name = field_benches;
    config = Criterion::default();
    targets = bench_field_build, bench_field_sample
);

criterion_group!(
    name = generation_benches;
    config = Criterion::default();
    targets = bench_link_parameters
);

criterion_main!(field_benches, generation_benches);
