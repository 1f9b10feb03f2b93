//! Condition classes derived from raw soil measurements.
//!
//! The ANOVA groupings for moisture, pH and temperature are not measured
//! directly: they are bands over a numeric sensor reading. Boundaries are
//! inclusive on the upper side of each band, first match wins.

use super::ObservationTable;

/// Column holding the soil moisture class.
pub const MOISTURE_CLASS_COLUMN: &str = "categoria_umidade";
/// Column holding the soil pH class.
pub const PH_CLASS_COLUMN: &str = "categoria_ph";
/// Column holding the soil temperature class.
pub const TEMPERATURE_CLASS_COLUMN: &str = "categoria_temperatura";

/// A categorical band over one numeric measurement.
pub trait ConditionClass: Sized {
    /// Numeric variable the class is derived from.
    const SOURCE: &'static str;
    /// Categorical column the class is stored in.
    const COLUMN: &'static str;

    /// Band for a measurement.
    fn classify(value: f64) -> Self;

    /// Label stored in the table.
    fn label(&self) -> &'static str;
}

/// Soil moisture band (`umidade_solo`, %).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoilMoistureClass {
    /// Below 20.
    VeryDry,
    /// 20 to 35.
    Dry,
    /// Above 35 up to 50.
    Ideal,
    /// Above 50 up to 65.
    Wet,
    /// Above 65.
    VeryWet,
}

impl ConditionClass for SoilMoistureClass {
    const SOURCE: &'static str = "umidade_solo";
    const COLUMN: &'static str = MOISTURE_CLASS_COLUMN;

    fn classify(value: f64) -> Self {
        match value {
            v if v < 20.0 => Self::VeryDry,
            v if v <= 35.0 => Self::Dry,
            v if v <= 50.0 => Self::Ideal,
            v if v <= 65.0 => Self::Wet,
            _ => Self::VeryWet,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::VeryDry => "Muito Seco",
            Self::Dry => "Seco",
            Self::Ideal => "Ideal",
            Self::Wet => "Úmido",
            Self::VeryWet => "Muito Úmido",
        }
    }
}

/// Soil pH band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhClass {
    /// Below 5.5.
    VeryAcidic,
    /// 5.5 to 6.5.
    SlightlyAcidic,
    /// Above 6.5 up to 7.5.
    Neutral,
    /// Above 7.5.
    Alkaline,
}

impl ConditionClass for PhClass {
    const SOURCE: &'static str = "ph";
    const COLUMN: &'static str = PH_CLASS_COLUMN;

    fn classify(value: f64) -> Self {
        match value {
            v if v < 5.5 => Self::VeryAcidic,
            v if v <= 6.5 => Self::SlightlyAcidic,
            v if v <= 7.5 => Self::Neutral,
            _ => Self::Alkaline,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::VeryAcidic => "Muito Ácido",
            Self::SlightlyAcidic => "Levemente Ácido",
            Self::Neutral => "Neutro",
            Self::Alkaline => "Alcalino",
        }
    }
}

/// Soil temperature band (`temperatura_solo`, °C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoilTemperatureClass {
    /// Below 18.
    Cold,
    /// 18 to 25.
    Ideal,
    /// Above 25 up to 30.
    Warm,
    /// Above 30.
    VeryHot,
}

impl ConditionClass for SoilTemperatureClass {
    const SOURCE: &'static str = "temperatura_solo";
    const COLUMN: &'static str = TEMPERATURE_CLASS_COLUMN;

    fn classify(value: f64) -> Self {
        match value {
            v if v < 18.0 => Self::Cold,
            v if v <= 25.0 => Self::Ideal,
            v if v <= 30.0 => Self::Warm,
            _ => Self::VeryHot,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Cold => "Frio",
            Self::Ideal => "Ideal",
            Self::Warm => "Quente",
            Self::VeryHot => "Muito Quente",
        }
    }
}

/// Derive `C::COLUMN` from `C::SOURCE`; a table without the source is left as is.
pub(crate) fn attach<C: ConditionClass>(table: &mut ObservationTable) {
    let Ok(source) = table.numeric(C::SOURCE) else {
        tracing::debug!(source = C::SOURCE, "condition class skipped, no source column");
        return;
    };
    let labels: Vec<Option<String>> = source
        .iter()
        .map(|v| v.map(|v| C::classify(v).label().to_string()))
        .collect();
    table.push_categorical(C::COLUMN, labels);
}
