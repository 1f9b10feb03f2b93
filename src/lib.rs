//! # Agrostat
//!
//! Statistical analysis of agronomic sensor data: which field conditions
//! drive crop yield, how well they predict it, and whether yield differs
//! across crops, phenological stages and condition classes.
//!
//! ## Overview
//!
//! Every analysis reads one typed [`ObservationTable`](table::ObservationTable)
//! of field observations (soil moisture, pH, temperatures, nutrients, crop,
//! stage, yield). The library provides:
//! - **Correlation**: Pearson or Spearman matrix, ranked against the target
//! - **Regression comparison**: linear, ridge, lasso and polynomial models on
//!   a seeded train/test split, with k-fold cross-validation, variance
//!   inflation factors, OLS coefficient tests and residual diagnostics
//! - **ANOVA**: assumption checks, one-way F-test, Kruskal–Wallis and
//!   Tukey HSD (or Bonferroni) post-hoc comparisons
//! - **Reports**: every engine merged into one serializable document with
//!   recommendations
//!
//! ## Quick Start
//!
//! ```rust
//! use agrostat::prelude::*;
//!
//! let crops = ["milho", "soja", "trigo"];
//! let table = TableBuilder::new()
//!     .categorical_column("cultura", (0..30).map(|i| crops[i % 3]))
//!     .numeric_column("umidade_solo", (0..30).map(|i| 20.0 + 30.0 * (i % 3) as f64 + (i / 3) as f64))
//!     .numeric_column(YIELD, (0..30).map(|i| 1.0 + 3.0 * (i % 3) as f64 + 0.1 * (i / 3) as f64))
//!     .build()
//!     .unwrap();
//!
//! let anova = one_way(&table, "cultura", YIELD).unwrap();
//! assert!(anova.significant());
//!
//! let report = analyze(&table, &AnalysisConfig::default()).unwrap();
//! assert!(report.is_complete());
//! ```
//!
//! ## Missing values
//!
//! Missing cells stay missing in the table. Correlation and ANOVA use the
//! rows complete for the variables they touch; regression keeps every row
//! with a target value and imputes predictors with training-partition means.
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization of configs and results (default)
//! - `parallel`: Enable parallel analysis using rayon
//! - `python`: Enable Python bindings via PyO3

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod anova;
pub mod correlation;
pub mod error;
#[cfg(feature = "python")]
pub mod python;
pub mod regression;
pub mod report;
pub mod stats;
pub mod table;

#[cfg(feature = "parallel")]
pub mod parallel;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::anova::{
        one_way, one_way_with, ANOVAConfig, ANOVAResult, Assumptions, EffectMagnitude,
        GroupedResponse, PostHoc,
    };
    pub use crate::correlation::{
        correlate, CorrelationConfig, CorrelationEntry, CorrelationMethod, CorrelationResult,
    };
    pub use crate::error::{Error, Result};
    pub use crate::regression::{
        compare_models, CoefficientEstimate, FittedModel, ModelKind, ModelMetrics, OLSSummary,
        RegressionComparison, RegressionConfig, ResidualSummary, VIFEntry, VIFLevel,
    };
    pub use crate::report::{
        analyze, AnalysisConfig, AnalysisReport, EngineOutcome, R2Band, ReportMode,
    };
    pub use crate::table::{ObservationTable, Record, Schema, TableBuilder, Value, YIELD};

    #[cfg(feature = "parallel")]
    pub use crate::parallel::{par_analyze, par_one_way};
}

// Re-export commonly used items at crate root
pub use anova::{one_way, one_way_with};
pub use correlation::correlate;
pub use error::{Error, Result};
pub use regression::compare_models;
pub use report::{analyze, AnalysisConfig, AnalysisReport};
pub use table::{ObservationTable, TableBuilder};

#[cfg(feature = "parallel")]
pub use parallel::{par_analyze, par_one_way};
