use std::hint::black_box;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;
use serde_json::{json, Value};
use tui_tree_diagram::{
    expand_all, HierarchyBuilder, LayoutEngine, Scene, TreeDiagram, TreeSession,
};

/// `breadth` children per node down to `depth` levels.
fn generated(prefix: &str, breadth: usize, depth: usize) -> Value {
    let children = if depth == 0 {
        Vec::new()
    } else {
        (0..breadth)
            .map(|index| generated(&format!("{prefix}.{index}"), breadth, depth - 1))
            .collect()
    };
    json!({ "valor": prefix, "subnodos": children })
}

fn example() -> Value {
    json!([generated("root", 4, 5)])
}

fn build(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("build");
    group.throughput(Throughput::Elements(1));

    let raw = example();
    group.bench_function("generated", |bencher| {
        bencher.iter(|| {
            black_box(HierarchyBuilder::default().build(black_box(&raw)).unwrap());
        });
    });

    group.finish();
}

fn layout(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("layout");
    group.throughput(Throughput::Elements(1));

    let mut hierarchy = HierarchyBuilder::default().build(&example()).unwrap();
    expand_all(&mut hierarchy);
    let engine = LayoutEngine::default();
    group.bench_function("expanded", |bencher| {
        bencher.iter(|| engine.layout(black_box(&mut hierarchy)));
    });

    group.finish();
}

fn cycles(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("cycle");
    group.throughput(Throughput::Elements(1)); // Commands per second

    let mut session = TreeSession::default();
    session.load(&mut example()).unwrap();
    group.bench_function("toggle", |bencher| {
        bencher.iter(|| black_box(session.toggle(black_box("root.2")).unwrap()));
    });

    group.finish();
}

fn renders(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("render");
    group.throughput(Throughput::Elements(1)); // Frames per second

    let buffer_size = Rect::new(0, 0, 200, 60);
    let mut session = TreeSession::default();
    let mut scene = Scene::new(Instant::now());
    session.load(&mut example()).unwrap().present(&mut scene);
    session.toggle("root.1").unwrap().present(&mut scene);
    let frame = scene.frame();

    group.bench_function("generated", |bencher| {
        bencher.iter_batched(
            || TreeDiagram::new(&frame, session.layout_engine()),
            |diagram| {
                let mut buffer = Buffer::empty(buffer_size);
                black_box(diagram).render(buffer_size, black_box(&mut buffer));
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

/// Create flamegraphs with `cargo bench --bench bench -- --profile-time=5`
#[cfg(unix)]
fn profiled() -> Criterion {
    use pprof::criterion::{Output, PProfProfiler};
    Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}
#[cfg(not(unix))]
fn profiled() -> Criterion {
    Criterion::default()
}

criterion_group! {
    name = benches;
    config = profiled();
    targets = build, layout, cycles, renders
}
criterion_main!(benches);
