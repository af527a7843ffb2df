use audio_features::{SpectrumEngine, SpectrumKind};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_spectrum(c: &mut Criterion) {
    let mut engine = SpectrumEngine::new();
    engine.init(1024, SpectrumKind::Magnitude).unwrap();

    let frame: Vec<f64> = (0..1024).map(|i| (i as f64 * 0.01).sin()).collect();
    let mut out = vec![0.0; 513];

    c.bench_function("magnitude_spectrum_1024", |b| {
        b.iter(|| {
            engine
                .compute(black_box(&frame), None, black_box(&mut out))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_spectrum);
criterion_main!(benches);
