use criterion::{criterion_group, criterion_main, Criterion, BenchmarkId};
use std::hint::black_box;
use filter_composer::lexer::Lexer;
use filter_composer::reducer::{reduce, Action, ConditionPatch};
use filter_composer::schema::ColumnDescriptor;
use filter_composer::serializer::{render_sql, serialize};
use filter_composer::sql::PredicateCompiler;
use filter_composer::{parse, FilterState};

// 基准测试用的列描述符
fn bench_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id", "bigint"),
        ColumnDescriptor::new("status", "character varying"),
        ColumnDescriptor::new("total", "numeric"),
        ColumnDescriptor::new("paid", "boolean"),
        ColumnDescriptor::new("created_at", "date"),
    ]
}

// 通过 reducer 构造一个 group_count × conditions_per_group 规模的状态
fn build_state(group_count: usize, conditions_per_group: usize) -> FilterState {
    let columns = bench_columns();
    let mut state = FilterState::new();
    for g in 0..group_count {
        state = reduce(state, Action::AddGroup, &columns);
        let group = state.groups.last().unwrap().id;
        for c in 0..conditions_per_group {
            if c > 0 {
                state = reduce(state, Action::AddCondition(group), &columns);
            }
            let condition = state.groups.last().unwrap().conditions.last().unwrap().id;
            state = reduce(
                state,
                Action::UpdateCondition {
                    group,
                    condition,
                    patch: ConditionPatch::Value(format!("{}", g * 10 + c)),
                },
                &columns,
            );
        }
    }
    state
}

// 基准测试：旧版子句的词法分析性能
fn benchmark_lexer(c: &mut Criterion) {
    let test_cases = vec![
        ("simple", "status = 'active'"),
        ("medium", "status = 'active';total > 100;name LIKE '%acme%'"),
        ("complex", "created_at BETWEEN '2024-01-01' AND '2024-01-31' AND status IN (1, 2, 'new') AND deleted_at IS NOT NULL"),
    ];

    let mut group = c.benchmark_group("lexer_performance");

    for (name, raw) in test_cases {
        group.bench_with_input(BenchmarkId::new("tokenize", name), &raw, |b, &raw| {
            b.iter(|| {
                let tokens: Vec<_> = Lexer::new(black_box(raw)).collect();
                black_box(tokens)
            })
        });
    }

    group.finish();
}

// 基准测试：三种持久化格式的解析性能
fn benchmark_parser(c: &mut Criterion) {
    let test_cases = vec![
        ("canonical", serialize(&build_state(2, 2))),
        ("legacy_a", "status = 'active';total > 100;name LIKE '%acme%'".to_string()),
        (
            "legacy_b",
            "status = 'active' AND total > 100 AND deleted_at IS NULL".to_string(),
        ),
    ];

    let mut group = c.benchmark_group("parser_performance");

    for (name, raw) in &test_cases {
        group.bench_with_input(BenchmarkId::new("parse", name), raw, |b, raw| {
            b.iter(|| black_box(parse(Some(black_box(raw.as_str())))))
        });
    }

    group.finish();
}

// 基准测试：规范序列化与SQL预览渲染性能
fn benchmark_serializer(c: &mut Criterion) {
    let test_cases = vec![
        ("small", build_state(1, 1)),
        ("medium", build_state(3, 3)),
        ("large", build_state(8, 4)),
    ];

    let mut group = c.benchmark_group("serializer_performance");

    for (name, state) in &test_cases {
        group.bench_with_input(BenchmarkId::new("serialize", name), state, |b, state| {
            b.iter(|| black_box(serialize(black_box(state))))
        });
        group.bench_with_input(BenchmarkId::new("render_sql", name), state, |b, state| {
            b.iter(|| black_box(render_sql(black_box(state))))
        });
    }

    group.finish();
}

// 基准测试：sea-query谓词编译性能
fn benchmark_predicate_compiler(c: &mut Criterion) {
    let columns = bench_columns();
    let test_cases = vec![
        ("small", build_state(1, 1)),
        ("medium", build_state(3, 3)),
        ("large", build_state(8, 4)),
    ];

    let mut group = c.benchmark_group("predicate_compiler_performance");

    for (name, state) in &test_cases {
        group.bench_with_input(BenchmarkId::new("compile", name), state, |b, state| {
            b.iter(|| {
                let compiler = PredicateCompiler::new(&columns);
                match compiler.compile_select("orders", black_box(state)) {
                    Ok(sql) => black_box(sql),
                    Err(_) => panic!("编译失败"),
                }
            })
        });
    }

    group.finish();
}

// 基准测试：完整的端到端处理 (解析 → 预览 → 重新序列化)
fn benchmark_end_to_end(c: &mut Criterion) {
    let test_cases = vec![
        ("canonical", serialize(&build_state(3, 3))),
        ("legacy_a", "status = 'active';total > 100".to_string()),
        (
            "legacy_b",
            "name LIKE '%acme%' AND created_at BETWEEN '2024-01-01' AND '2024-01-31'".to_string(),
        ),
    ];

    let mut group = c.benchmark_group("end_to_end_performance");

    for (name, raw) in &test_cases {
        group.bench_with_input(BenchmarkId::new("full_pipeline", name), raw, |b, raw| {
            b.iter(|| {
                // 完整的处理流程
                let state = parse(Some(black_box(raw.as_str())));
                let preview = render_sql(&state);
                let canonical = serialize(&state);
                black_box((preview, canonical))
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_lexer,
    benchmark_parser,
    benchmark_serializer,
    benchmark_predicate_compiler,
    benchmark_end_to_end
);
criterion_main!(benches);
