//! Universes of discourse and linguistic variables

use super::membership::{Degree, MembershipFunction};
use crate::error::{ErrorCode, RiskResult};
use crate::risk_ensure;

/// A sampled universe of discourse: `start..=stop` in increments of `step`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Universe {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl Universe {
    pub const fn new(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step }
    }

    pub fn validate(&self) -> RiskResult<()> {
        risk_ensure!(
            self.start.is_finite() && self.stop.is_finite() && self.stop > self.start,
            ErrorCode::ModelError,
            "universe bounds must be finite with stop > start, got {}..{}",
            self.start,
            self.stop
        );
        risk_ensure!(
            self.step.is_finite() && self.step > 0.0,
            ErrorCode::ModelError,
            "universe step must be positive, got {}",
            self.step
        );
        Ok(())
    }

    /// Number of sample points, both bounds included
    pub fn len(&self) -> usize {
        ((self.stop - self.start) / self.step).round() as usize + 1
    }

    /// Sample points computed from the index so no rounding error accumulates
    pub fn samples(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| self.start + i as f64 * self.step)
            .collect()
    }

    /// Clamp a crisp value into the universe bounds
    pub fn clip(&self, x: f64) -> f64 {
        x.clamp(self.start, self.stop)
    }
}

/// Whether a variable feeds the rule base or is produced by it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Antecedent,
    Consequent,
}

/// A labelled fuzzy set on a variable
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzySet {
    pub label: String,
    pub membership: MembershipFunction,
}

/// A linguistic variable with an ordered list of labelled sets
#[derive(Debug, Clone)]
pub struct LinguisticVariable {
    name: String,
    kind: VariableKind,
    universe: Universe,
    terms: Vec<FuzzySet>,
}

impl LinguisticVariable {
    pub fn antecedent(name: impl Into<String>, universe: Universe) -> Self {
        Self::new(name, VariableKind::Antecedent, universe)
    }

    pub fn consequent(name: impl Into<String>, universe: Universe) -> Self {
        Self::new(name, VariableKind::Consequent, universe)
    }

    fn new(name: impl Into<String>, kind: VariableKind, universe: Universe) -> Self {
        Self {
            name: name.into(),
            kind,
            universe,
            terms: Vec::new(),
        }
    }

    /// Add a labelled set, rejecting duplicates and malformed functions
    pub fn with_term(
        mut self,
        label: impl Into<String>,
        membership: MembershipFunction,
    ) -> RiskResult<Self> {
        let label = label.into();
        membership.validate().map_err(|e| {
            e.with_context("variable", self.name.clone())
                .with_context("label", label.clone())
        })?;
        risk_ensure!(
            self.term(&label).is_none(),
            ErrorCode::DuplicateLabel,
            "label '{}' declared twice on '{}'",
            label,
            self.name
        );
        self.terms.push(FuzzySet { label, membership });
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn terms(&self) -> &[FuzzySet] {
        &self.terms
    }

    pub fn term(&self, label: &str) -> Option<&FuzzySet> {
        self.terms.iter().find(|t| t.label == label)
    }

    pub fn term_index(&self, label: &str) -> Option<usize> {
        self.terms.iter().position(|t| t.label == label)
    }

    /// Fuzzify a crisp value: one degree per label, in declaration order.
    /// The value is clipped to the universe first.
    pub fn fuzzify(&self, value: f64) -> Vec<(&str, Degree)> {
        let x = self.universe.clip(value);
        self.terms
            .iter()
            .map(|t| (t.label.as_str(), t.membership.evaluate(x)))
            .collect()
    }

    /// Label with the highest non-zero membership; earlier labels win ties
    pub fn dominant_term(&self, value: f64) -> Option<(&str, Degree)> {
        self.fuzzify(value)
            .into_iter()
            .fold(None, |best, (label, degree)| match best {
                Some((_, d)) if d >= degree => best,
                _ => Some((label, degree)),
            })
            .filter(|(_, degree)| degree.value() > 0.0)
    }
}
