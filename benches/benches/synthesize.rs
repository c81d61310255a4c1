use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use normalize_convgen::{
    Compiler, ConversionModule, Interpreter, Request, Runtime, Type, Universe, Value,
};

/// Two scopes with a `Wide` record of `width` fields and a chain of `depth`
/// nested records.
fn universe(width: usize, depth: usize) -> Universe {
    let declare = |scope: &str, int: &'static str| {
        let scope = scope.to_string();
        move |s: &mut normalize_convgen::schema::ScopeBuilder<'_>| {
            s.record("Wide", |r| {
                for i in 0..width {
                    r.field(&format!("Field{i}"), int);
                }
            });
            for level in 0..depth {
                let next = format!("*{scope}.Level{}", level + 1);
                s.record(&format!("Level{level}"), |r| {
                    r.field("Value", int).field("Next", &next);
                });
            }
            s.record(&format!("Level{depth}"), |r| {
                r.field("Value", int);
            });
        }
    };
    Universe::builder()
        .scope("a", declare("a", "int32"))
        .scope("b", declare("b", "int64"))
        .build()
        .expect("valid universe")
}

fn compiler(universe: &Universe, name: &str) -> Compiler<'_> {
    let request = Request::record(name, Type::named("a", name), Type::named("b", name));
    Compiler::new(universe).module(ConversionModule::new("bench").request(request))
}

fn bench_wide_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("wide_record");
    for width in [16, 128, 512] {
        let universe = universe(width, 0);
        let compiler = compiler(&universe, "Wide");
        group.bench_function(BenchmarkId::from_parameter(width), |b| {
            b.iter(|| compiler.compile().expect("compiles"));
        });
    }
    group.finish();
}

fn bench_nested_subplans(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_subplans");
    for depth in [4, 32] {
        let universe = universe(0, depth);
        let compiler = compiler(&universe, "Level0");
        group.bench_function(BenchmarkId::from_parameter(depth), |b| {
            b.iter(|| compiler.compile().expect("compiles"));
        });
    }
    group.finish();
}

struct NoRuntime;
impl Runtime for NoRuntime {}

fn bench_interpreter(c: &mut Criterion) {
    let width = 128;
    let universe = universe(width, 0);
    let output = compiler(&universe, "Wide").compile().expect("compiles");
    let runtime = NoRuntime;
    let interp = Interpreter::new(&output, &universe, &runtime);
    let names: Vec<String> = (0..width).map(|i| format!("Field{i}")).collect();
    let value = Value::record(names.iter().map(|n| (n.as_str(), Value::Int(7))));

    let mut group = c.benchmark_group("interpreter");
    group.bench_function(BenchmarkId::from_parameter(width), |b| {
        b.iter(|| interp.convert("Wide", value.clone()).expect("converts"));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_wide_records,
    bench_nested_subplans,
    bench_interpreter
);
criterion_main!(benches);
