use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use glam::Vec3;

use atrium::renderer::FitOutcome;
use atrium::{BoundingBox, Camera, DirectionalLight, GeometryDecimator, MeshAsset, ShadowFrustumFitter};

fn grid(cols: u32, rows: u32) -> MeshAsset {
    let positions = (0..rows)
        .flat_map(|z| (0..cols).map(move |x| Vec3::new(x as f32, 0.0, z as f32)))
        .collect();

    let mut indices = Vec::new();
    for z in 0..rows - 1 {
        for x in 0..cols - 1 {
            let a = z * cols + x;
            let c = a + cols;
            indices.extend_from_slice(&[a, c, a + 1, a + 1, c, c + 1]);
        }
    }

    MeshAsset::new("grid", positions, indices).unwrap()
}

fn bench_decimation(c: &mut Criterion) {
    let mesh = grid(245, 245);
    let decimator = GeometryDecimator::default();

    let mut group = c.benchmark_group("Decimation");

    group.bench_function("60k vertices @ 0.3", |b| {
        b.iter(|| black_box(decimator.decimate(mesh.clone(), black_box(0.3))));
    });

    group.bench_function("below threshold", |b| {
        let small = grid(80, 100);
        b.iter(|| black_box(decimator.decimate(small.clone(), 0.3)));
    });

    group.finish();
}

fn bench_shadow_fit(c: &mut Criterion) {
    let mut camera = Camera::new_perspective(60.0, 16.0 / 9.0, 0.1, 500.0);
    camera.look_at(Vec3::new(0.0, 20.0, 80.0), Vec3::ZERO, Vec3::Y);

    // 2,500 building blocks on a 50 x 50 plot.
    let objects: Vec<BoundingBox> = (0..50)
        .flat_map(|z| {
            (0..50).map(move |x| {
                let center = Vec3::new(x as f32 * 4.0 - 100.0, 3.0, z as f32 * 4.0 - 100.0);
                BoundingBox::new(center - Vec3::new(1.5, 3.0, 1.5), center + Vec3::new(1.5, 3.0, 1.5))
            })
        })
        .collect();

    let mut group = c.benchmark_group("Shadow Fitting");

    group.bench_function("2.5k objects", |b| {
        let mut fitter = ShadowFrustumFitter::new();
        let mut light = DirectionalLight::new(Vec3::new(60.0, 120.0, 40.0), Vec3::ZERO);
        b.iter(|| {
            let outcome = fitter.fit(camera.frustum(), &mut light, &objects);
            debug_assert!(matches!(outcome, FitOutcome::Fitted { .. }));
            black_box(outcome)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_decimation, bench_shadow_fit);
criterion_main!(benches);
