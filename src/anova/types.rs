//! ANOVA engine types.

use std::fmt;

use crate::stats::TestResult;

/// Configuration for the one-way analysis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ANOVAConfig {
    /// Significance level for every test (default: 0.05).
    pub alpha: f64,
    /// Smallest group tested for normality (default: 3).
    pub min_normality_size: usize,
    /// Group size considered adequate (default: 5).
    pub adequate_group_size: usize,
}

impl Default for ANOVAConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            min_normality_size: 3,
            adequate_group_size: 5,
        }
    }
}

/// Conventional magnitude bands of an effect size.
///
/// < 0.01 negligible, [0.01, 0.06) small, [0.06, 0.14) medium, ≥ 0.14 large.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EffectMagnitude {
    /// Below 0.01.
    Negligible,
    /// 0.01 up to 0.06.
    Small,
    /// 0.06 up to 0.14.
    Medium,
    /// 0.14 and above.
    Large,
}

impl EffectMagnitude {
    /// Band of an effect size; `None` when it is undefined.
    #[must_use]
    pub fn classify(value: f64) -> Option<Self> {
        if value.is_nan() {
            None
        } else if value < 0.01 {
            Some(Self::Negligible)
        } else if value < 0.06 {
            Some(Self::Small)
        } else if value < 0.14 {
            Some(Self::Medium)
        } else {
            Some(Self::Large)
        }
    }

    /// Lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Negligible => "negligible",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for EffectMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive summary of one group.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupSummary {
    /// Group label.
    pub name: String,
    /// Number of observations.
    pub count: usize,
    /// Group mean.
    pub mean: f64,
    /// Sample standard deviation; NaN for a single observation.
    pub std_dev: f64,
    /// Shapiro–Wilk result; `None` when the group was too small or constant.
    pub normality: Option<TestResult>,
}

/// Assumption verdicts.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assumptions {
    /// Every tested group has Shapiro–Wilk p > alpha (false if none was tested).
    pub normality: bool,
    /// Number of groups that entered the normality verdict.
    pub normality_tested: usize,
    /// Levene (median-centred) p > alpha.
    pub homogeneity: bool,
    /// Levene result; `None` when it could not be computed.
    pub levene: Option<TestResult>,
    /// Observations are assumed independent.
    pub independence: bool,
    /// Every group has at least the adequate size.
    pub adequate_sample_size: bool,
}

impl Assumptions {
    /// Whether normality and homogeneity both hold.
    #[must_use]
    pub fn parametric_ok(&self) -> bool {
        self.normality && self.homogeneity
    }
}

/// One-way F-test with η².
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FTest {
    /// F statistic; NaN when every observation is equal.
    pub statistic: f64,
    /// Upper-tail p-value; NaN when the statistic is NaN.
    pub p_value: f64,
    /// Between-groups degrees of freedom (k − 1).
    pub df_between: usize,
    /// Within-groups degrees of freedom (N − k).
    pub df_within: usize,
    /// Between-groups sum of squares.
    pub ss_between: f64,
    /// Within-groups sum of squares.
    pub ss_within: f64,
    /// η² = SSB / SST.
    pub eta_squared: f64,
    /// Band of η².
    pub effect: Option<EffectMagnitude>,
}

impl FTest {
    /// Within-groups mean square (the pooled variance).
    #[must_use]
    pub fn mean_square_within(&self) -> f64 {
        if self.df_within == 0 {
            f64::NAN
        } else {
            self.ss_within / self.df_within as f64
        }
    }
}

/// Kruskal–Wallis H test with ε².
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KruskalWallis {
    /// Tie-corrected H; NaN when every observation is tied.
    pub statistic: f64,
    /// χ² upper-tail p-value with k − 1 degrees of freedom.
    pub p_value: f64,
    /// Degrees of freedom (k − 1).
    pub df: usize,
    /// ε² = (H − (k − 1)) / (N − k).
    pub epsilon_squared: f64,
    /// Band of ε².
    pub effect: Option<EffectMagnitude>,
}

/// Tukey–Kramer comparison of two groups.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TukeyComparison {
    /// First group (sorted order).
    pub group_a: String,
    /// Second group.
    pub group_b: String,
    /// mean(b) − mean(a).
    pub mean_diff: f64,
    /// Studentized range statistic.
    pub q: f64,
    /// Family-wise adjusted p-value.
    pub p_adjusted: f64,
    /// Lower bound of the simultaneous confidence interval.
    pub lower: f64,
    /// Upper bound of the simultaneous confidence interval.
    pub upper: f64,
    /// Whether the difference is significant.
    pub reject: bool,
}

/// Pairwise t-test with Bonferroni adjustment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BonferroniComparison {
    /// First group (sorted order).
    pub group_a: String,
    /// Second group.
    pub group_b: String,
    /// t statistic, signed as mean(a) − mean(b).
    pub t_statistic: f64,
    /// Unadjusted p-value.
    pub p_value: f64,
    /// min(p · m, 1) for m comparisons.
    pub p_adjusted: f64,
    /// Whether the adjusted p-value is below alpha.
    pub significant: bool,
}

/// Outcome of the post-hoc stage.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "method", rename_all = "snake_case"))]
pub enum PostHoc {
    /// The F-test was not significant.
    NotRun,
    /// Tukey–Kramer HSD.
    Tukey {
        /// All pairs in sorted group order.
        comparisons: Vec<TukeyComparison>,
    },
    /// Pairwise t-tests, used when Tukey failed.
    Bonferroni {
        /// Why Tukey could not be used.
        cause: String,
        /// All pairs in sorted group order.
        comparisons: Vec<BonferroniComparison>,
    },
}

impl PostHoc {
    /// Pairs found significantly different.
    #[must_use]
    pub fn significant_pairs(&self) -> Vec<(&str, &str)> {
        match self {
            Self::NotRun => Vec::new(),
            Self::Tukey { comparisons } => comparisons
                .iter()
                .filter(|c| c.reject)
                .map(|c| (c.group_a.as_str(), c.group_b.as_str()))
                .collect(),
            Self::Bonferroni { comparisons, .. } => comparisons
                .iter()
                .filter(|c| c.significant)
                .map(|c| (c.group_a.as_str(), c.group_b.as_str()))
                .collect(),
        }
    }
}

/// Complete one-way analysis of a response over a grouping.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ANOVAResult {
    /// Categorical grouping variable.
    pub grouping: String,
    /// Numeric response variable.
    pub response: String,
    /// Significance level used.
    pub alpha: f64,
    /// Groups in sorted label order.
    pub groups: Vec<GroupSummary>,
    /// Assumption verdicts.
    pub assumptions: Assumptions,
    /// Parametric omnibus test.
    pub parametric: FTest,
    /// Rank-based omnibus test.
    pub rank_based: KruskalWallis,
    /// Pairwise comparisons.
    pub post_hoc: PostHoc,
}

impl ANOVAResult {
    /// Whether the F-test rejects equal means.
    #[must_use]
    pub fn significant(&self) -> bool {
        self.parametric.p_value < self.alpha
    }

    /// Whether the Kruskal–Wallis test rejects equal distributions.
    #[must_use]
    pub fn rank_significant(&self) -> bool {
        self.rank_based.p_value < self.alpha
    }

    /// Total number of observations.
    #[must_use]
    pub fn observations(&self) -> usize {
        self.groups.iter().map(|g| g.count).sum()
    }
}
