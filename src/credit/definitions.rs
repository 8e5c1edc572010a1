//! Fixed linguistic variables and rule base of the loan risk model
//!
//! These tables are the model. Changing any breakpoint or rule changes
//! every risk score the service produces.

use crate::error::RiskResult;
use crate::fuzzy::{
    DefuzzificationMethod, FuzzyRule, InferenceSystem, LinguisticVariable, MembershipFunction,
    Term, Universe,
};

use crate::fuzzy::MembershipFunction::{Trapezoidal, Triangular};

pub const INCOME: &str = "income";
pub const DEBT_RATIO: &str = "debt_ratio";
pub const RISK: &str = "risk";

/// A variable declared as constant data
#[derive(Debug, Clone, Copy)]
pub struct VariableSpec {
    pub name: &'static str,
    pub universe: Universe,
    pub terms: &'static [(&'static str, MembershipFunction)],
}

/// A rule declared as constant data; the consequent is always on `risk`
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    pub when: &'static [(&'static str, &'static str)],
    pub then: &'static str,
}

/// Monthly income, 0..10000
pub const INCOME_SPEC: VariableSpec = VariableSpec {
    name: INCOME,
    universe: Universe::new(0.0, 10000.0, 1.0),
    terms: &[
        ("low", Trapezoidal(0.0, 0.0, 800.0, 2000.0)),
        ("medium", Triangular(1500.0, 3500.0, 5500.0)),
        ("high", Trapezoidal(4000.0, 7000.0, 10000.0, 10000.0)),
    ],
};

/// Debt as a percentage of income, 0..100
pub const DEBT_RATIO_SPEC: VariableSpec = VariableSpec {
    name: DEBT_RATIO,
    universe: Universe::new(0.0, 100.0, 1.0),
    terms: &[
        ("low", Trapezoidal(0.0, 0.0, 10.0, 30.0)),
        ("medium", Triangular(20.0, 40.0, 60.0)),
        ("high", Trapezoidal(50.0, 70.0, 100.0, 100.0)),
    ],
};

/// Risk score, 0.00..1.00 sampled every 0.01
pub const RISK_SPEC: VariableSpec = VariableSpec {
    name: RISK,
    universe: Universe::new(0.0, 1.0, 0.01),
    terms: &[
        ("low", Trapezoidal(0.0, 0.0, 0.2, 0.4)),
        ("medium", Triangular(0.3, 0.5, 0.7)),
        ("high", Trapezoidal(0.6, 0.8, 1.0, 1.0)),
    ],
};

pub const RULES: [RuleSpec; 7] = [
    RuleSpec { when: &[(INCOME, "high"), (DEBT_RATIO, "low")], then: "low" },
    RuleSpec { when: &[(INCOME, "low"), (DEBT_RATIO, "high")], then: "high" },
    RuleSpec { when: &[(INCOME, "medium"), (DEBT_RATIO, "medium")], then: "medium" },
    RuleSpec { when: &[(DEBT_RATIO, "low"), (INCOME, "medium")], then: "low" },
    RuleSpec { when: &[(DEBT_RATIO, "medium"), (INCOME, "low")], then: "high" },
    RuleSpec { when: &[(INCOME, "high"), (DEBT_RATIO, "medium")], then: "medium" },
    RuleSpec { when: &[(DEBT_RATIO, "high")], then: "high" },
];

impl VariableSpec {
    fn build(
        &self,
        make: fn(String, Universe) -> LinguisticVariable,
    ) -> RiskResult<LinguisticVariable> {
        self.terms
            .iter()
            .try_fold(make(self.name.to_string(), self.universe), |var, (label, mf)| {
                var.with_term(*label, *mf)
            })
    }

    pub fn antecedent(&self) -> RiskResult<LinguisticVariable> {
        self.build(|name, universe| LinguisticVariable::antecedent(name, universe))
    }

    pub fn consequent(&self) -> RiskResult<LinguisticVariable> {
        self.build(|name, universe| LinguisticVariable::consequent(name, universe))
    }
}

impl RuleSpec {
    pub fn to_rule(&self, index: usize) -> FuzzyRule {
        FuzzyRule::new(
            self.when.iter().map(|(var, label)| Term::new(*var, *label)).collect(),
            Term::new(RISK, self.then),
        )
        .with_name(format!("r{}", index + 1))
    }
}

/// Assemble the loan risk inference system from the constant tables
pub fn inference_system(method: DefuzzificationMethod) -> RiskResult<InferenceSystem> {
    InferenceSystem::builder()
        .input(INCOME_SPEC.antecedent()?)
        .input(DEBT_RATIO_SPEC.antecedent()?)
        .output(RISK_SPEC.consequent()?)
        .rules(RULES.iter().enumerate().map(|(i, spec)| spec.to_rule(i)))
        .defuzzification(method)
        .build()
}
