//! Air quality classification.
//!
//! Maps an AQI value onto the six EPA style categories and a single pollutant
//! concentration onto a traffic light severity. Every function here is pure
//! and total over `f64`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::Reading;

/// Share of the danger level below which a pollutant still counts as safe.
pub const MODERATE_RATIO: f64 = 0.7;

/// Coarse traffic light severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Green,
    Yellow,
    Red,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Green => "Safe",
            Severity::Yellow => "Moderate",
            Severity::Red => "Unsafe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Green => write!(f, "green"),
            Severity::Yellow => write!(f, "yellow"),
            Severity::Red => write!(f, "red"),
        }
    }
}

/// AQI category, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AqiCategory {
    /// 0 to 50
    Good,
    /// 51 to 100
    Moderate,
    /// 101 to 150
    UnhealthySensitive,
    /// 151 to 200
    Unhealthy,
    /// 201 to 300
    VeryUnhealthy,
    /// Above 300
    Hazardous,
}

const AQI_BREAKPOINTS: [(f64, AqiCategory); 5] = [
    (50.0, AqiCategory::Good),
    (100.0, AqiCategory::Moderate),
    (150.0, AqiCategory::UnhealthySensitive),
    (200.0, AqiCategory::Unhealthy),
    (300.0, AqiCategory::VeryUnhealthy),
];

impl AqiCategory {
    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthySensitive => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }

    /// Colour name of the detailed six step scale.
    pub fn color(&self) -> &'static str {
        match self {
            AqiCategory::Good => "green",
            AqiCategory::Moderate => "yellow",
            AqiCategory::UnhealthySensitive => "orange",
            AqiCategory::Unhealthy => "red",
            AqiCategory::VeryUnhealthy => "purple",
            AqiCategory::Hazardous => "maroon",
        }
    }

    /// Collapses the category onto the three step view.
    pub fn severity(&self) -> Severity {
        match self {
            AqiCategory::Good => Severity::Green,
            AqiCategory::Moderate => Severity::Yellow,
            _ => Severity::Red,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AqiCategory::Good => {
                "Air quality is considered satisfactory, and air pollution poses little or no risk."
            }
            AqiCategory::Moderate => {
                "Air quality is acceptable; some pollutants may be a concern for very sensitive people."
            }
            AqiCategory::UnhealthySensitive => {
                "Members of sensitive groups may experience health effects."
            }
            AqiCategory::Unhealthy => "Everyone may begin to experience health effects.",
            AqiCategory::VeryUnhealthy => "Health alert: everyone may experience more serious effects.",
            AqiCategory::Hazardous => "Health warnings of emergency conditions.",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Places `aqi` into its category. A value sitting on a breakpoint belongs
/// to the lower category; anything not below 300 (NaN included) is hazardous.
pub fn classify_aqi(aqi: f64) -> AqiCategory {
    AQI_BREAKPOINTS
        .iter()
        .find(|(upper, _)| aqi <= *upper)
        .map(|(_, category)| *category)
        .unwrap_or(AqiCategory::Hazardous)
}

/// Traffic light for a concentration against its safe and danger bounds.
pub fn classify_pollutant(value: f64, safe_bound: f64, danger_bound: f64) -> Severity {
    if value <= safe_bound {
        Severity::Green
    } else if value <= danger_bound {
        Severity::Yellow
    } else {
        Severity::Red
    }
}

/// The five pollutants that make up the weighted index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    Co2,
    Pm25,
    Voc,
    Co,
    No2,
}

impl Pollutant {
    pub const ALL: [Pollutant; 5] = [
        Pollutant::Co2,
        Pollutant::Pm25,
        Pollutant::Voc,
        Pollutant::Co,
        Pollutant::No2,
    ];

    pub fn unit(&self) -> &'static str {
        match self {
            Pollutant::Co2 | Pollutant::Co => "ppm",
            Pollutant::Pm25 => "µg/m³",
            Pollutant::Voc => "mg/m³",
            Pollutant::No2 => "ppb",
        }
    }

    pub fn thresholds(&self) -> &'static ThresholdSpec {
        match self {
            Pollutant::Co2 => &CO2,
            Pollutant::Pm25 => &PM25,
            Pollutant::Voc => &VOC,
            Pollutant::Co => &CO,
            Pollutant::No2 => &NO2,
        }
    }

    /// Concentration of this pollutant in `reading`.
    pub fn value(&self, reading: &Reading) -> f64 {
        match self {
            Pollutant::Co2 => reading.co2,
            Pollutant::Pm25 => reading.pm25,
            Pollutant::Voc => reading.voc,
            Pollutant::Co => reading.co,
            Pollutant::No2 => reading.no2,
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Pollutant::Co2 => write!(f, "CO₂"),
            Pollutant::Pm25 => write!(f, "PM2.5"),
            Pollutant::Voc => write!(f, "VOC"),
            Pollutant::Co => write!(f, "CO"),
            Pollutant::No2 => write!(f, "NO₂"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSpec {
    /// Published reference level, shown for display only; classification
    /// uses `danger_level * MODERATE_RATIO` as the green bound
    pub safe_level: f64,
    pub danger_level: f64,
    /// Contribution to the weighted index
    pub weight: f64,
}

impl ThresholdSpec {
    /// Classifies against the moderate cut-off at 70% of the danger level.
    pub fn classify(&self, value: f64) -> Severity {
        classify_pollutant(value, self.danger_level * MODERATE_RATIO, self.danger_level)
    }
}

pub const CO2: ThresholdSpec = ThresholdSpec { safe_level: 600.0, danger_level: 1000.0, weight: 0.30 };
pub const PM25: ThresholdSpec = ThresholdSpec { safe_level: 12.0, danger_level: 35.0, weight: 0.25 };
pub const VOC: ThresholdSpec = ThresholdSpec { safe_level: 0.3, danger_level: 0.5, weight: 0.20 };
pub const CO: ThresholdSpec = ThresholdSpec { safe_level: 9.0, danger_level: 35.0, weight: 0.15 };
pub const NO2: ThresholdSpec = ThresholdSpec { safe_level: 53.0, danger_level: 100.0, weight: 0.10 };

/// Per pollutant scores, already normalised onto the common 0 to 500 scale.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasScores {
    pub co2: f64,
    pub pm25: f64,
    pub voc: f64,
    pub co: f64,
    pub no2: f64,
}

impl GasScores {
    pub fn get(&self, pollutant: Pollutant) -> f64 {
        match pollutant {
            Pollutant::Co2 => self.co2,
            Pollutant::Pm25 => self.pm25,
            Pollutant::Voc => self.voc,
            Pollutant::Co => self.co,
            Pollutant::No2 => self.no2,
        }
    }
}

/// `AQI = Σ(score_i × weight_i)` over the five weighted pollutants.
pub fn weighted_aqi(scores: &GasScores) -> f64 {
    Pollutant::ALL
        .iter()
        .map(|p| scores.get(*p) * p.thresholds().weight)
        .sum()
}

/// Classification of a whole reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub aqi: AqiCategory,
    pub pollutants: Vec<(Pollutant, Severity)>,
}

impl Assessment {
    /// Worst of the overall AQI severity and every pollutant severity.
    pub fn worst(&self) -> Severity {
        self.pollutants
            .iter()
            .map(|(_, severity)| *severity)
            .fold(self.aqi.severity(), Severity::max)
    }
}

pub fn assess(reading: &Reading) -> Assessment {
    Assessment {
        aqi: classify_aqi(reading.aqi),
        pollutants: Pollutant::ALL
            .iter()
            .map(|p| (*p, p.thresholds().classify(p.value(reading))))
            .collect(),
    }
}
