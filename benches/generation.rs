use criterion::{criterion_group, criterion_main, Criterion};

use rand::rngs::StdRng;
use rand::SeedableRng;

use xtal::external::{StaticElementTable, StaticSymmetryDatabase};
use xtal::generate::{CancellationToken, DimensionParams};
use xtal::{CrystalGenerator, GenerationParams};

pub fn benchmark(c: &mut Criterion) {
    let elements = StaticElementTable::new();
    let symmetry = StaticSymmetryDatabase::new();
    let generator = CrystalGenerator::new(&elements, &symmetry);
    let params = GenerationParams::default();
    let cancel = CancellationToken::new();

    c.bench_function("generate_nacl_rocksalt", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(0);
            generator.generate(
                &mut rng,
                225,
                &["Na".to_string(), "Cl".to_string()],
                &[1, 1],
                1.0,
                DimensionParams::ThreeD,
                &params,
                &cancel,
            )
        })
    });

    c.bench_function("generate_li_cmc21", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(0);
            generator.generate(
                &mut rng,
                36,
                &["Li".to_string()],
                &[16],
                1.0,
                DimensionParams::ThreeD,
                &params,
                &cancel,
            )
        })
    });
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
