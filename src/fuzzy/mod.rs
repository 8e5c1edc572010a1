//! Fuzzy logic primitives
//!
//! This module provides a small Mamdani inference toolkit:
//! - Piecewise-linear membership functions (triangular, trapezoidal)
//! - Linguistic variables over sampled universes of discourse
//! - Conjunctive fuzzy rules
//! - An immutable inference system with centroid defuzzification
//!
//! Operators are fixed: minimum for AND and implication, maximum for
//! aggregation.

pub mod engine;
pub mod membership;
pub mod rule;
pub mod variable;

pub use engine::{
    area_centroid, centroid, round_to, DefuzzificationMethod, EvaluationContext, FuzzifiedInput,
    Inference, InferenceSystem, InferenceSystemBuilder, RuleActivation, OUTPUT_DECIMALS,
};
pub use membership::{Degree, MembershipFunction};
pub use rule::{FuzzyRule, Term};
pub use variable::{FuzzySet, LinguisticVariable, Universe, VariableKind};
