//! Basic usage example for the agrostat library.
//!
//! This example loads a synthetic set of field observations, runs the full
//! analysis and prints the main findings.
//!
//! Run with `RUST_LOG=agrostat=debug` to see the engines' tracing output.

use std::collections::HashMap;

use agrostat::anova::PostHoc;
use agrostat::prelude::*;
use tracing_subscriber::EnvFilter;

fn observations() -> Vec<Record> {
    let crops = ["milho", "soja", "trigo"];
    let stages = ["vegetativo", "floracao", "maturacao"];
    (0..60)
        .map(|i| {
            let crop = i % 3;
            let moisture = 25.0 + 15.0 * crop as f64 + ((i * 7) % 12) as f64;
            let ph = 5.4 + ((i * 5) % 14) as f64 / 10.0;
            let temperature = 14.0 + ((i * 3) % 16) as f64;
            let noise = ((i * 11) % 9) as f64 * 0.05;
            let yield_kg = 0.6 + 0.05 * moisture + 0.2 * ph - 0.01 * temperature + noise;

            let mut record = HashMap::new();
            record.insert("cultura".to_string(), Value::from(crops[crop]));
            record.insert("estagio_fenologico".to_string(), Value::from(stages[(i / 3) % 3]));
            record.insert("umidade_solo".to_string(), Value::from(moisture));
            record.insert("ph".to_string(), Value::from(ph));
            record.insert("temperatura_solo".to_string(), Value::from(temperature));
            // Every tenth reading lost its yield measurement
            let yield_value = (i % 10 != 9).then_some(yield_kg);
            record.insert(YIELD.to_string(), Value::from(yield_value));
            record
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Agrostat - Basic Usage Example\n");

    let table = TableBuilder::new()
        .schema(Schema::agronomic())
        .require(YIELD)
        .records(observations())
        .with_condition_classes()
        .build()?;
    println!("Loaded {} observations with a yield value\n", table.rows());

    let report = analyze(&table, &AnalysisConfig::default())?;

    if let Some(correlation) = report.correlation.completed() {
        println!("Correlation with {YIELD}:");
        for entry in correlation.ranked().iter().take(5) {
            match entry.coefficient {
                Some(r) => println!("  {:<20} {r:>7.3}", entry.variable),
                None => println!("  {:<20} {:>7}", entry.variable, "n/a"),
            }
        }
        println!();
    }

    if let Some(comparison) = report.regression.completed() {
        println!("Model comparison (test partition):");
        for candidate in &comparison.candidates {
            println!(
                "  {:<12} R² = {:>6.3}  MSE = {:>7.4}  CV R² = {:.3} ± {:.3}",
                candidate.kind.name(),
                candidate.metrics.test_r2,
                candidate.metrics.test_mse,
                candidate.metrics.cv_r2_mean,
                candidate.metrics.cv_r2_std,
            );
        }
        println!("  Best: {}", comparison.best_model().kind.name());
        println!(
            "  OLS F = {:.2} (p = {:.4}), significant at 5%: {:?}",
            comparison.ols.f_statistic,
            comparison.ols.f_p_value,
            comparison.ols.significant_terms(0.05),
        );
        println!(
            "  Residuals within 2 sd: {:.1}%",
            comparison.residuals.within_two_sd * 100.0
        );
        println!();
    }

    for section in &report.anova {
        match section.outcome.completed() {
            Some(anova) => {
                println!(
                    "ANOVA by {}: F = {:.3}, p = {:.4}, Kruskal–Wallis p = {:.4}",
                    section.grouping,
                    anova.parametric.statistic,
                    anova.parametric.p_value,
                    anova.rank_based.p_value,
                );
                let method = match anova.post_hoc {
                    PostHoc::NotRun => continue,
                    PostHoc::Tukey { .. } => "Tukey HSD",
                    PostHoc::Bonferroni { .. } => "Bonferroni",
                };
                for (a, b) in anova.post_hoc.significant_pairs() {
                    println!("  {a} ≠ {b} ({method})");
                }
            }
            None => println!("ANOVA by {}: failed", section.grouping),
        }
    }
    println!();

    println!("Recommendations:");
    for line in report.recommendations.iter().chain(&report.anova_summary) {
        println!("  - {line}");
    }

    Ok(())
}
