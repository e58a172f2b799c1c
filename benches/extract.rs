use criterion::{black_box, criterion_group, criterion_main, Criterion};

use glam::{UVec3, Vec3};
use voxsculpt::field::grid::VoxelField;
use voxsculpt::field::voxel::Voxel;
use voxsculpt::mesh::extract::{ExtractParams, Extractor, Strategy};

fn sphere_field(size: u32, radius: f32) -> VoxelField {
    let dims = UVec3::splat(size);
    let mut field = VoxelField::new(dims).expect("valid dims");
    let center = Vec3::splat(size as f32 / 2.0);
    for i in 0..field.len() {
        let pos = field.pos_of(i).as_vec3();
        let d = (1.0 - (pos.distance(center) / radius)).clamp(0.0, 1.0);
        field.set_sample(i, Voxel::from_density(d));
    }
    field
}

fn bench_extract(c: &mut Criterion, size: u32, strategy: Strategy, name: &str) {
    let field = sphere_field(size, size as f32 * 0.4);
    let mut extractor = Extractor::new();
    extractor.prepare(field.dims()).expect("prepare");
    let params = ExtractParams {
        strategy,
        ..Default::default()
    };

    c.bench_function(name, |b| {
        b.iter(|| extractor.extract(black_box(&field), black_box(&params)))
    });
}

fn bench_extract_sequential_32(c: &mut Criterion) {
    bench_extract(c, 32, Strategy::Sequential, "extract_sequential_32");
}

fn bench_extract_parallel_32(c: &mut Criterion) {
    bench_extract(c, 32, Strategy::Parallel, "extract_parallel_32");
}

fn bench_extract_sequential_64(c: &mut Criterion) {
    bench_extract(c, 64, Strategy::Sequential, "extract_sequential_64");
}

fn bench_extract_parallel_64(c: &mut Criterion) {
    bench_extract(c, 64, Strategy::Parallel, "extract_parallel_64");
}

criterion_group!(
    benches,
    bench_extract_sequential_32,
    bench_extract_parallel_32,
    bench_extract_sequential_64,
    bench_extract_parallel_64
);
criterion_main!(benches);
