//! Experience gating, debt ratio derivation and risk thresholds

use std::fmt;

use serde::{Deserialize, Serialize};

/// Applicants with less experience are rejected before any inference
pub const MIN_EXPERIENCE_MONTHS: f64 = 6.0;

/// Inclusive upper bound of the LOW band
pub const LOW_RISK_MAX: f64 = 0.3;

/// Inclusive upper bound of the MEDIUM band
pub const MEDIUM_RISK_MAX: f64 = 0.6;

/// Debt ratio used when income is zero or negative
pub const NO_INCOME_DEBT_RATIO: f64 = 100.0;

/// Risk band of a defuzzified score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    /// Thresholds are inclusive on the lower band: 0.3 is LOW, 0.6 is MEDIUM
    pub fn from_risk(risk: f64) -> Self {
        if risk <= LOW_RISK_MAX {
            RiskCategory::Low
        } else if risk <= MEDIUM_RISK_MAX {
            RiskCategory::Medium
        } else {
            RiskCategory::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "low",
            RiskCategory::Medium => "medium",
            RiskCategory::High => "high",
        }
    }
}

/// Outcome of a loan application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    InsufficientExperience,
    Approved,
    GuarantorRequired,
    Rejected,
}

/// A decision with the risk score that produced it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assessment {
    pub decision: Decision,
    /// Rounded risk score, absent when rejected on experience
    pub risk: Option<f64>,
    /// Derived debt ratio, absent when rejected on experience
    pub debt_ratio: Option<f64>,
}

impl Assessment {
    pub fn insufficient_experience() -> Self {
        Self {
            decision: Decision::InsufficientExperience,
            risk: None,
            debt_ratio: None,
        }
    }

    /// Only built from a defuzzified score, which always lies in [0, 1]
    pub(crate) fn from_risk(risk: f64, debt_ratio: f64) -> Self {
        let decision = match RiskCategory::from_risk(risk) {
            RiskCategory::Low => Decision::Approved,
            RiskCategory::Medium => Decision::GuarantorRequired,
            RiskCategory::High => Decision::Rejected,
        };
        Self {
            decision,
            risk: Some(risk),
            debt_ratio: Some(debt_ratio),
        }
    }

    pub fn category(&self) -> Option<RiskCategory> {
        self.risk.map(RiskCategory::from_risk)
    }

    /// Human-readable decision with the embedded risk score
    pub fn label(&self) -> String {
        match (self.decision, self.risk) {
            (Decision::InsufficientExperience, _) | (_, None) => {
                "Rejected — insufficient work experience".to_string()
            }
            (Decision::Approved, Some(risk)) => format!("Approved (LOW risk: {})", risk),
            (Decision::GuarantorRequired, Some(risk)) => {
                format!("Guarantor required (MEDIUM risk: {})", risk)
            }
            (Decision::Rejected, Some(risk)) => format!("Rejected (HIGH risk: {})", risk),
        }
    }
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Debt as a percentage of income, clamped to [0, 100]
pub fn debt_ratio(income: f64, debt: f64) -> f64 {
    if income <= 0.0 {
        NO_INCOME_DEBT_RATIO
    } else {
        (debt / income * 100.0).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debt_ratio() {
        assert_eq!(debt_ratio(8000.0, 200.0), 2.5);
        assert_eq!(debt_ratio(3500.0, 1400.0), 40.0);
        assert_eq!(debt_ratio(100.0, 500.0), 100.0);
        assert_eq!(debt_ratio(0.0, 0.0), 100.0);
        assert_eq!(debt_ratio(-10.0, 5.0), 100.0);
        assert_eq!(debt_ratio(1000.0, -50.0), 0.0);
    }

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(RiskCategory::from_risk(0.0), RiskCategory::Low);
        assert_eq!(RiskCategory::from_risk(0.3), RiskCategory::Low);
        assert_eq!(RiskCategory::from_risk(0.301), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_risk(0.6), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_risk(0.601), RiskCategory::High);
    }

    #[test]
    fn test_labels() {
        assert_eq!(
            Assessment::from_risk(0.153, 2.5).label(),
            "Approved (LOW risk: 0.153)"
        );
        assert_eq!(
            Assessment::from_risk(0.5, 40.0).label(),
            "Guarantor required (MEDIUM risk: 0.5)"
        );
        assert_eq!(
            Assessment::from_risk(0.847, 90.0).to_string(),
            "Rejected (HIGH risk: 0.847)"
        );
        assert_eq!(
            Assessment::insufficient_experience().label(),
            "Rejected — insufficient work experience"
        );
    }

    #[test]
    fn test_category_follows_risk() {
        assert_eq!(Assessment::insufficient_experience().category(), None);
        assert_eq!(
            Assessment::from_risk(0.6, 50.0).category(),
            Some(RiskCategory::Medium)
        );
        assert_eq!(Assessment::from_risk(0.6, 50.0).decision, Decision::GuarantorRequired);
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(serde_json::to_string(&RiskCategory::High).unwrap(), "\"high\"");
        assert_eq!(
            serde_json::to_string(&Decision::GuarantorRequired).unwrap(),
            "\"guarantor_required\""
        );
    }
}
