//! Benchmarks for weft-core propagation
//!
//! Run with: cargo bench

use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use weft_core::{Child, Fragment, HostTree, MemoryTree, Runtime};

fn setup() -> (Rc<MemoryTree>, Runtime) {
    let tree = Rc::new(MemoryTree::new());
    let rt = Runtime::new(tree.clone());
    (tree, rt)
}

// =============================================================================
// SIGNAL BENCHMARKS
// =============================================================================

fn bench_signal_set_unobserved(c: &mut Criterion) {
    let (_, rt) = setup();
    let s = rt.signal(0i64);
    let mut n = 0;
    c.bench_function("signal_set_unobserved", |b| {
        b.iter(|| {
            n += 1;
            s.set(black_box(n))
        })
    });
}

fn bench_signal_set_same_value(c: &mut Criterion) {
    let (_, rt) = setup();
    let s = rt.signal(42i64);
    let s2 = s.clone();
    let _d = rt.derive(move || s2.get());
    c.bench_function("signal_set_same_value", |b| b.iter(|| s.set(black_box(42))));
}

// =============================================================================
// FLUSH BENCHMARKS
// =============================================================================

fn bench_chain_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_flush");
    for depth in [1usize, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            let (_, rt) = setup();
            let source = rt.signal(0i64);
            let mut last = source.clone();
            for _ in 0..depth {
                let prev = last.clone();
                last = rt.derive(move || prev.get() + 1);
            }
            let mut n = 0;
            b.iter(|| {
                n += 1;
                source.set(n);
                black_box(rt.flush())
            })
        });
    }
    group.finish();
}

fn bench_fan_out_bindings(c: &mut Criterion) {
    // Every flush allocates fresh text nodes in the arena, keep runs short.
    let mut group = c.benchmark_group("fan_out_bindings");
    group.sample_size(20);
    for width in [10usize, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            let (tree, rt) = setup();
            let root = tree.create_node("div", None);
            tree.append_child(tree.document(), root);
            let source = rt.signal(0i64);
            let children: Vec<Child> = (0..width).map(|_| Child::signal(&source)).collect();
            rt.attach(root, children);

            let mut n = 0;
            b.iter(|| {
                n += 1;
                source.set(n);
                black_box(rt.flush())
            })
        });
    }
    group.finish();
}

fn bench_list_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_update");
    group.sample_size(20);
    for len in [10i64, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            let (tree, rt) = setup();
            let items = rt.signal((0..len).collect::<Vec<i64>>());
            let i = items.clone();
            let handle = rt.bind(move |_| Fragment::list(i.get()));
            rt.attach(tree.document(), [handle]);

            let mut offset = 0;
            b.iter(|| {
                offset += 1;
                items.set((offset..offset + len).collect());
                black_box(rt.flush())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_signal_set_unobserved,
    bench_signal_set_same_value,
    bench_chain_flush,
    bench_fan_out_bindings,
    bench_list_update,
);
criterion_main!(benches);
