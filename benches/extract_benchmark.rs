use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sphinx_markup_extract::formats::{Formatter, FormatterRegistry};
use sphinx_markup_extract::{ExtractConfig, Extractor, SourceRef};

fn synthetic_sources(files: usize, per_file: usize) -> Vec<(SourceRef, String)> {
    (0..files)
        .map(|f| {
            let mut text = String::from("\"\"\"Generated extension.\"\"\"\n\ndef setup(app):\n");
            for i in 0..per_file {
                text.push_str(&format!(
                    "    app.add_directive('dir-{f}-{i}', Directive{i})\n"
                ));
                text.push_str(&format!(
                    "    app.add_role(name='role-{f}-{i}', role=make_role({{'a': [1, 2]}}))\n"
                ));
            }
            text.push_str("    return {'version': '1.0'}\n");
            let name = format!("ext/mod{}.py", f);
            (SourceRef::new(&name, name.as_str()), text)
        })
        .collect()
}

fn bench_extract(c: &mut Criterion) {
    let extractor = Extractor::new();
    let sources = synthetic_sources(50, 40);

    c.bench_function("extract_50_files", |b| {
        b.iter(|| extractor.extract(black_box(sources.clone())))
    });
}

fn bench_formats(c: &mut Criterion) {
    let model = Extractor::new().extract(synthetic_sources(20, 40)).model;
    let registry = FormatterRegistry::with_builtin_formatters(&ExtractConfig::default()).unwrap();

    for name in registry.names() {
        let formatter = registry.get(name).unwrap();
        c.bench_function(&format!("render_{}", name), |b| {
            b.iter(|| formatter.render(black_box(&model)).unwrap())
        });
    }
}

criterion_group!(benches, bench_extract, bench_formats);
criterion_main!(benches);
