//! Statistical kernel shared by the analysis engines.
//!
//! Special functions, distribution tails, descriptive statistics, the small
//! dense linear algebra the regression engine needs, and the hypothesis
//! tests used by ANOVA and residual diagnostics.

pub mod descriptive;
pub mod distributions;
pub mod hypothesis;
pub mod linalg;
pub mod special;

pub use descriptive::{mean, median, pearson, rank_average, spearman, std_dev, variance, Ranking};
pub use distributions::{
    chi_squared_p_value, f_distribution_p_value, studentized_range_cdf,
    studentized_range_p_value, studentized_range_quantile, t_two_sided_p_value,
};
pub use hypothesis::{levene, shapiro_wilk, two_sample_t_test, TestResult};
