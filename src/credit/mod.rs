//! Loan risk assessment
//!
//! Maps `(income, debt, experience)` to a decision:
//!
//! 1. Applicants with less than six months of experience are rejected
//!    without running the fuzzy model.
//! 2. The debt ratio is derived from income and debt.
//! 3. The fuzzy model turns `(income, debt_ratio)` into a risk score.
//! 4. The score is banded into LOW, MEDIUM or HIGH.
//!
//! # Example
//!
//! ```rust,ignore
//! use credit_risk::credit::evaluate;
//!
//! let assessment = evaluate(8000.0, 200.0, 24.0)?;
//! assert!(assessment.risk.unwrap() <= 0.3);
//! println!("{}", assessment); // Approved (LOW risk: 0.153)
//! ```

pub mod decision;
pub mod definitions;

use std::sync::OnceLock;

use serde::Serialize;
use tracing::debug;

use crate::error::{RiskError, RiskResult};
use crate::fuzzy::{DefuzzificationMethod, EvaluationContext, Inference, InferenceSystem};

pub use decision::{
    debt_ratio, Assessment, Decision, RiskCategory, LOW_RISK_MAX, MEDIUM_RISK_MAX,
    MIN_EXPERIENCE_MONTHS,
};
pub use definitions::{inference_system, DEBT_RATIO, INCOME, RISK};

/// An assessment together with the inference that produced it
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub assessment: Assessment,
    /// Absent when the experience gate rejected the application
    pub inference: Option<Inference>,
}

/// The loan risk model. Immutable once built and safe to share.
#[derive(Debug, Clone)]
pub struct CreditModel {
    system: InferenceSystem,
}

static SHARED_MODEL: OnceLock<RiskResult<CreditModel>> = OnceLock::new();

impl CreditModel {
    pub fn new(method: DefuzzificationMethod) -> RiskResult<Self> {
        Ok(Self {
            system: inference_system(method)?,
        })
    }

    /// Process-wide model with the default defuzzifier, built on first use
    pub fn shared() -> RiskResult<&'static CreditModel> {
        SHARED_MODEL
            .get_or_init(|| CreditModel::new(DefuzzificationMethod::default()))
            .as_ref()
            .map_err(|e| e.clone())
    }

    pub fn system(&self) -> &InferenceSystem {
        &self.system
    }

    pub fn assess(&self, income: f64, debt: f64, experience_months: f64) -> RiskResult<Assessment> {
        self.explain(income, debt, experience_months)
            .map(|explanation| explanation.assessment)
    }

    /// Assess and keep the inference trace
    pub fn explain(
        &self,
        income: f64,
        debt: f64,
        experience_months: f64,
    ) -> RiskResult<Explanation> {
        for (field, value) in [("income", income), ("debt", debt), ("experience", experience_months)] {
            if !value.is_finite() {
                return Err(RiskError::non_finite(field, value));
            }
        }

        if experience_months < MIN_EXPERIENCE_MONTHS {
            debug!(experience_months, "rejected on work experience");
            return Ok(Explanation {
                assessment: Assessment::insufficient_experience(),
                inference: None,
            });
        }

        let ratio = debt_ratio(income, debt);
        let mut ctx = EvaluationContext::new()
            .with_input(INCOME, income)
            .with_input(DEBT_RATIO, ratio);
        let inference = self.system.infer(&mut ctx)?;
        let assessment = Assessment::from_risk(inference.output, ratio);

        debug!(
            income,
            debt,
            experience_months,
            debt_ratio = ratio,
            risk = inference.output,
            category = assessment.category().map(|c| c.as_str()),
            "assessment complete"
        );

        Ok(Explanation {
            assessment,
            inference: Some(inference),
        })
    }
}

/// Assess an application with the shared model
pub fn evaluate(income: f64, debt: f64, experience_months: f64) -> RiskResult<Assessment> {
    CreditModel::shared()?.assess(income, debt, experience_months)
}
