//! Directional growth trends over a child's most recent records.

use shared::{Language, MalnutritionStatus};
use std::collections::BTreeMap;

use crate::domain::models::growth_record::GrowthRecord;

/// Records considered for trends, most recent by `recorded_at`
pub const TREND_WINDOW: u32 = 5;

/// Records, by age order, scanned for a concerning prediction
const STATUS_SCAN_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    fn between(first: f64, last: f64) -> Self {
        if last > first {
            TrendDirection::Increasing
        } else if last < first {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendAlert {
    WeightDecreasing,
    HeightDecreasing,
    ConcerningStatus(MalnutritionStatus),
}

impl TrendAlert {
    pub fn message(&self, language: Language) -> String {
        match (self, language) {
            (TrendAlert::WeightDecreasing, Language::English) => "Weight showing decreasing trend".to_string(),
            (TrendAlert::WeightDecreasing, Language::Swahili) => "Uzito unashuka - hali ya wasiwasi".to_string(),
            (TrendAlert::HeightDecreasing, Language::English) => "Height showing concerning pattern".to_string(),
            (TrendAlert::HeightDecreasing, Language::Swahili) => "Urefu una mfumo wa wasiwasi".to_string(),
            (TrendAlert::ConcerningStatus(status), Language::English) => {
                format!("Concerning nutritional status: {}", status)
            }
            (TrendAlert::ConcerningStatus(status), Language::Swahili) => {
                format!("Hali ya lishe ya wasiwasi: {}", status)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendAnalysis {
    pub weight: Option<TrendDirection>,
    pub height: Option<TrendDirection>,
    pub alerts: Vec<TrendAlert>,
}

impl TrendAnalysis {
    /// `{"weight": ..., "height": ...}`, empty when there was too little data
    pub fn trends(&self) -> BTreeMap<String, String> {
        let mut trends = BTreeMap::new();
        if let Some(weight) = self.weight {
            trends.insert("weight".to_string(), weight.as_str().to_string());
        }
        if let Some(height) = self.height {
            trends.insert("height".to_string(), height.as_str().to_string());
        }
        trends
    }

    pub fn alert_messages(&self, language: Language) -> Vec<String> {
        self.alerts.iter().map(|alert| alert.message(language)).collect()
    }
}

/// Compare the youngest and oldest of `records` by age.
///
/// Fewer than two records yields no trends and no alerts. Records of equal
/// age keep their given order.
pub fn analyze_trends(records: &[GrowthRecord]) -> TrendAnalysis {
    if records.len() < 2 {
        return TrendAnalysis::default();
    }

    let mut by_age: Vec<&GrowthRecord> = records.iter().collect();
    by_age.sort_by_key(|r| r.age_months);

    let first = by_age[0];
    let last = by_age[by_age.len() - 1];

    let weight = TrendDirection::between(first.weight_kg, last.weight_kg);
    let height = TrendDirection::between(first.height_cm, last.height_cm);

    let mut alerts = Vec::new();
    if weight == TrendDirection::Decreasing {
        alerts.push(TrendAlert::WeightDecreasing);
    }
    if height == TrendDirection::Decreasing {
        alerts.push(TrendAlert::HeightDecreasing);
    }

    let scan_start = by_age.len().saturating_sub(STATUS_SCAN_WINDOW);
    let concerning = by_age[scan_start..]
        .iter()
        .filter_map(|r| r.prediction_results.as_ref())
        .map(|p| p.malnutrition_status)
        .find(|status| status.is_concerning());
    if let Some(status) = concerning {
        alerts.push(TrendAlert::ConcerningStatus(status));
    }

    TrendAnalysis {
        weight: Some(weight),
        height: Some(height),
        alerts,
    }
}
