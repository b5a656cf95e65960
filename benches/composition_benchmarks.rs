use cim_trait_compositor::{
    validate_and_sort, CompositorOptions, DependencyGraph, FieldDefinition, FieldType,
    TraitComposer, TraitCompositor, TraitDefinition,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Layered graph: every trait depends on up to three traits of the previous layer.
fn layered_graph(traits: usize, width: usize) -> DependencyGraph {
    DependencyGraph::from_traits((0..traits).map(|i| {
        let mut definition = TraitDefinition::new(format!("Trait{i}"), "1.0.0")
            .with_field(format!("field_{i}"), FieldDefinition::new(FieldType::String))
            .with_field("shared", FieldDefinition::new(FieldType::String));
        if i >= width {
            let layer_start = (i / width - 1) * width;
            for offset in 0..3usize.min(width) {
                definition = definition.depends_on(format!("Trait{}", layer_start + (i + offset) % width));
            }
        }
        definition
    }))
}

fn benchmark_validate_and_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_and_sort");
    for size in [100usize, 500, 1000] {
        let graph = layered_graph(size, 10);
        group.bench_with_input(BenchmarkId::from_parameter(size), &graph, |b, graph| {
            b.iter(|| validate_and_sort(black_box(graph)))
        });
    }
    group.finish();
}

fn benchmark_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    for size in [10usize, 100] {
        let graph = layered_graph(size, 10);
        let layers: Vec<TraitDefinition> = validate_and_sort(&graph)
            .unwrap()
            .iter()
            .filter_map(|name| graph.get_trait(name).cloned())
            .collect();
        let compositor = TraitCompositor::new(CompositorOptions::default());
        group.bench_with_input(BenchmarkId::new("ordered_layers", size), &layers, |b, layers| {
            b.iter(|| compositor.compose(black_box(layers), None))
        });
    }
    group.finish();
}

fn benchmark_pipeline(c: &mut Criterion) {
    let graph = layered_graph(200, 10);
    let composer = TraitComposer::default();
    c.bench_function("pipeline_compose_leaf", |b| {
        b.iter(|| composer.compose(black_box(&graph), &["Trait199"], None))
    });
}

criterion_group!(benches, benchmark_validate_and_sort, benchmark_compose, benchmark_pipeline);
criterion_main!(benches);
