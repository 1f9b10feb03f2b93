use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use agrostat::anova::one_way;
use agrostat::correlation::{correlate, CorrelationConfig, CorrelationMethod};
use agrostat::regression::{compare_models, RegressionConfig};
use agrostat::report::{analyze, AnalysisConfig};
use agrostat::table::{ObservationTable, TableBuilder, YIELD};

/// Deterministic synthetic field table with `rows` observations.
fn field_table(rows: usize) -> ObservationTable {
    let crops = ["milho", "soja", "trigo", "feijao"];
    let stages = ["vegetativo", "floracao", "maturacao"];
    let moisture: Vec<f64> = (0..rows).map(|i| 15.0 + ((i * 37) % 50) as f64).collect();
    let ph: Vec<f64> = (0..rows).map(|i| 5.0 + ((i * 13) % 30) as f64 / 10.0).collect();
    let temperature: Vec<f64> = (0..rows).map(|i| 12.0 + ((i * 7) % 20) as f64).collect();
    let yield_kg: Vec<f64> = (0..rows)
        .map(|i| 0.5 + 0.06 * moisture[i] + 0.3 * ph[i] - 0.02 * temperature[i] + (i % 4) as f64 * 0.4)
        .collect();

    TableBuilder::new()
        .categorical_column("cultura", (0..rows).map(|i| crops[i % crops.len()]))
        .categorical_column("estagio_fenologico", (0..rows).map(|i| stages[(i / 4) % stages.len()]))
        .numeric_column("umidade_solo", moisture)
        .numeric_column("ph", ph)
        .numeric_column("temperatura_solo", temperature)
        .numeric_column(YIELD, yield_kg)
        .build()
        .unwrap()
}

fn bench_correlation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Correlation");

    for rows in [100, 1_000, 10_000] {
        let table = field_table(rows);
        group.bench_with_input(BenchmarkId::new("pearson", rows), &table, |b, table| {
            b.iter(|| correlate(table, YIELD, &CorrelationConfig::default()).unwrap());
        });
        let spearman = CorrelationConfig {
            method: CorrelationMethod::Spearman,
            ..CorrelationConfig::default()
        };
        group.bench_with_input(BenchmarkId::new("spearman", rows), &table, |b, table| {
            b.iter(|| correlate(table, YIELD, &spearman).unwrap());
        });
    }
    group.finish();
}

fn bench_regression(c: &mut Criterion) {
    let mut group = c.benchmark_group("Regression");

    for rows in [100, 1_000] {
        let table = field_table(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &table, |b, table| {
            b.iter(|| compare_models(table, YIELD, &RegressionConfig::default()).unwrap());
        });
    }
    group.finish();
}

fn bench_anova(c: &mut Criterion) {
    let mut group = c.benchmark_group("ANOVA");

    for rows in [100, 1_000, 10_000] {
        let table = field_table(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &table, |b, table| {
            b.iter(|| one_way(table, "cultura", YIELD).unwrap());
        });
    }
    group.finish();
}

fn bench_report(c: &mut Criterion) {
    let table = field_table(1_000);
    let config = AnalysisConfig::default();
    c.bench_function("Report_1000", |b| {
        b.iter(|| analyze(&table, &config).unwrap());
    });

    #[cfg(feature = "parallel")]
    c.bench_function("ParReport_1000", |b| {
        b.iter(|| agrostat::parallel::par_analyze(&table, &config).unwrap());
    });
}

criterion_group!(
    benches,
    bench_correlation,
    bench_regression,
    bench_anova,
    bench_report
);
criterion_main!(benches);
