//! 比较器性能基准测试
//!
//! 使用 criterion 测试结构比较与抑制查询在大型表面上的性能

use apicompat_core::{
    ApiComparer, AttributeData, AttributeExclusions, RuleCatalog, RuleSettings, Side,
    SuppressionEngine, SuppressionOptions, SurfaceAssembly, SurfaceMember, SurfaceNamespace,
    SurfaceParameter, SurfaceType, SymbolForest,
};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::collections::HashSet;
use std::hint::black_box;
use std::sync::Arc;

/// 生成包含 `type_count` 个类型的表面，`variant` 控制右侧版本的差异
fn create_surface(type_count: usize, variant: bool) -> SurfaceAssembly {
    let mut namespace = SurfaceNamespace::new("Bench");
    for i in 0..type_count {
        let mut ty = SurfaceType::class(format!("Type{i}"))
            .with_attribute(AttributeData::new("T:Bench.MarkerAttribute").with_argument(i as i64));
        for m in 0..10 {
            let mut member = SurfaceMember::method(format!("Method{m}"))
                .with_parameter(SurfaceParameter::new("value", "System.Int32"))
                .returns("System.Int32");
            if variant && (i + m) % 7 == 0 {
                member = member.with_attribute(AttributeData::new("T:Bench.NewAttribute"));
            }
            ty = ty.with_member(member);
        }
        if !(variant && i % 13 == 0) {
            namespace = namespace.with_type(ty);
        }
    }
    SurfaceAssembly::new("Bench").with_namespace(namespace)
}

fn forests(type_count: usize) -> (SymbolForest, SymbolForest) {
    (
        SymbolForest::with_namespaces(Side::Left, create_surface(type_count, false).lower()),
        SymbolForest::with_namespaces(Side::Right, create_surface(type_count, true).lower()),
    )
}

fn comparer(strict_mode: bool) -> ApiComparer {
    ApiComparer::new(Arc::new(RuleCatalog::new(
        RuleSettings::new(strict_mode),
        AttributeExclusions::default(),
    )))
}

/// 基准测试：不同规模下的结构比较
fn bench_get_differences(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_differences");

    for type_count in [100usize, 1_000, 5_000].iter() {
        let (left, right) = forests(*type_count);
        group.throughput(Throughput::Elements(left.node_count() as u64));
        group.bench_with_input(
            BenchmarkId::new("types", type_count),
            &(left, right),
            |b, (left, right)| {
                let comparer = comparer(true);
                b.iter(|| black_box(comparer.get_differences(left, right)));
            },
        );
    }

    group.finish();
}

/// 基准测试：表面降级
fn bench_lowering(c: &mut Criterion) {
    let surface = create_surface(1_000, false);
    c.bench_function("lower_1000_types", |b| {
        b.iter(|| black_box(surface.lower()));
    });
}

/// 基准测试：抑制查询的命中与未命中
fn bench_suppression_lookup(c: &mut Criterion) {
    let (left, right) = forests(1_000);
    let differences = comparer(true).get_differences(&left, &right);

    let engine = SuppressionEngine::new(SuppressionOptions::default());
    for difference in differences.iter().step_by(2) {
        engine.accept(difference);
    }

    c.bench_function("is_suppressed", |b| {
        b.iter(|| {
            differences
                .iter()
                .filter(|d| engine.is_suppressed(black_box(d)))
                .count()
        });
    });

    c.bench_function("baseline_accept", |b| {
        b.iter(|| {
            let engine = SuppressionEngine::new(SuppressionOptions::new(HashSet::new(), true));
            for difference in &differences {
                engine.is_suppressed(difference);
            }
            black_box(engine.len())
        });
    });
}

criterion_group!(
    benches,
    bench_get_differences,
    bench_lowering,
    bench_suppression_lookup
);
criterion_main!(benches);
