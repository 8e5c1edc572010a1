//! Mamdani inference: fuzzify -> activate -> aggregate -> defuzzify
//!
//! An [`InferenceSystem`] is immutable once built. All per-evaluation state
//! lives in an [`EvaluationContext`] owned by the caller, so one system can be
//! shared across threads without locking.

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::membership::Degree;
use super::rule::FuzzyRule;
use super::variable::{LinguisticVariable, VariableKind};
use crate::error::{ErrorCode, RiskError, RiskResult};
use crate::{risk_bail, risk_ensure};

/// Decimal digits kept on the crisp output
pub const OUTPUT_DECIMALS: i32 = 3;

/// Defuzzification method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefuzzificationMethod {
    /// Discrete center of gravity: `sum(x * mu) / sum(mu)` over the samples
    #[default]
    Centroid,
    /// Center of gravity of the piecewise-linear set, integrated per segment
    AreaCentroid,
}

impl DefuzzificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefuzzificationMethod::Centroid => "centroid",
            DefuzzificationMethod::AreaCentroid => "area-centroid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "centroid" | "cog" => Some(DefuzzificationMethod::Centroid),
            "area-centroid" | "area_centroid" | "area" => Some(DefuzzificationMethod::AreaCentroid),
            _ => None,
        }
    }
}

// ============================================================================
// Evaluation Context
// ============================================================================

/// Crisp inputs for one evaluation and, afterwards, its crisp output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationContext {
    inputs: Vec<(String, f64)>,
    output: Option<f64>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, variable: impl Into<String>, value: f64) -> Self {
        self.set_input(variable, value);
        self
    }

    /// Set or replace an input value. Clears any previous output.
    pub fn set_input(&mut self, variable: impl Into<String>, value: f64) {
        let variable = variable.into();
        self.output = None;
        match self.inputs.iter_mut().find(|(name, _)| *name == variable) {
            Some(slot) => slot.1 = value,
            None => self.inputs.push((variable, value)),
        }
    }

    pub fn input(&self, variable: &str) -> Option<f64> {
        self.inputs
            .iter()
            .find(|(name, _)| name == variable)
            .map(|(_, v)| *v)
    }

    /// Defuzzified output, present only after a successful evaluation
    pub fn output(&self) -> Option<f64> {
        self.output
    }
}

// ============================================================================
// Inference trace
// ============================================================================

/// Degrees of one input variable after fuzzification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzifiedInput {
    pub variable: String,
    /// Crisp value after clipping to the universe
    pub value: f64,
    pub degrees: Vec<(String, f64)>,
    /// Label the value belongs to most, if any
    pub dominant: Option<String>,
}

/// Firing strength of one rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleActivation {
    /// Position of the rule in the rule base, starting at 1
    pub rule: usize,
    pub name: Option<String>,
    pub consequent: String,
    pub strength: f64,
}

/// Everything computed during one evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inference {
    pub fuzzified: Vec<FuzzifiedInput>,
    pub activations: Vec<RuleActivation>,
    /// Aggregated output membership at every sample point
    #[serde(skip)]
    pub aggregate: Vec<(f64, Degree)>,
    /// Unrounded defuzzified value
    pub centroid: f64,
    /// Centroid rounded to [`OUTPUT_DECIMALS`]
    pub output: f64,
}

impl Inference {
    /// Rules that fired with non-zero strength
    pub fn fired(&self) -> impl Iterator<Item = &RuleActivation> {
        self.activations.iter().filter(|a| a.strength > 0.0)
    }
}

// ============================================================================
// Inference System
// ============================================================================

/// Rule with variable and label names resolved to indices
#[derive(Debug, Clone)]
struct CompiledRule {
    terms: Vec<(usize, usize)>,
    consequent: usize,
}

/// An immutable Mamdani fuzzy inference system with one output variable
#[derive(Debug, Clone)]
pub struct InferenceSystem {
    inputs: Vec<LinguisticVariable>,
    output: LinguisticVariable,
    rules: Vec<FuzzyRule>,
    compiled: Vec<CompiledRule>,
    samples: Vec<f64>,
    /// Membership of each output label at every sample point
    curves: Vec<Vec<Degree>>,
    defuzz_method: DefuzzificationMethod,
}

impl InferenceSystem {
    pub fn builder() -> InferenceSystemBuilder {
        InferenceSystemBuilder::default()
    }

    pub fn inputs(&self) -> &[LinguisticVariable] {
        &self.inputs
    }

    pub fn output(&self) -> &LinguisticVariable {
        &self.output
    }

    pub fn rules(&self) -> &[FuzzyRule] {
        &self.rules
    }

    pub fn defuzzification(&self) -> DefuzzificationMethod {
        self.defuzz_method
    }

    /// Evaluate and return the rounded crisp output
    pub fn evaluate(&self, ctx: &mut EvaluationContext) -> RiskResult<f64> {
        self.infer(ctx).map(|inference| inference.output)
    }

    /// Evaluate and return the full trace
    pub fn infer(&self, ctx: &mut EvaluationContext) -> RiskResult<Inference> {
        ctx.output = None;

        // Fuzzify
        let mut fuzzified = Vec::with_capacity(self.inputs.len());
        for var in &self.inputs {
            let raw = ctx
                .input(var.name())
                .ok_or_else(|| RiskError::missing_input(var.name()))?;
            if !raw.is_finite() {
                return Err(RiskError::non_finite(var.name(), raw));
            }
            let value = var.universe().clip(raw);
            let degrees = var
                .terms()
                .iter()
                .map(|t| t.membership.evaluate(value))
                .collect::<Vec<_>>();
            fuzzified.push((value, degrees));
        }

        // Activate
        let strengths: Vec<Degree> = self
            .compiled
            .iter()
            .enumerate()
            .map(|(i, rule)| {
                let strength = rule
                    .terms
                    .iter()
                    .fold(Degree::ONE, |acc, &(var, term)| acc.and(&fuzzified[var].1[term]));
                trace!(
                    rule = i + 1,
                    consequent = %self.output.terms()[rule.consequent].label,
                    strength = strength.value(),
                    "rule activated"
                );
                strength
            })
            .collect();

        // Aggregate
        let mut aggregate = vec![Degree::ZERO; self.samples.len()];
        for (rule, strength) in self.compiled.iter().zip(&strengths) {
            let curve = &self.curves[rule.consequent];
            for (acc, mu) in aggregate.iter_mut().zip(curve) {
                *acc = acc.or(&strength.implies_mamdani(mu));
            }
        }

        // Defuzzify
        let centroid = self.defuzzify(&aggregate)?;
        let output = round_to(centroid, OUTPUT_DECIMALS);
        ctx.output = Some(output);

        Ok(Inference {
            fuzzified: self
                .inputs
                .iter()
                .zip(fuzzified)
                .map(|(var, (value, degrees))| FuzzifiedInput {
                    variable: var.name().to_string(),
                    value,
                    degrees: var
                        .terms()
                        .iter()
                        .zip(degrees)
                        .map(|(t, d)| (t.label.clone(), d.value()))
                        .collect(),
                    dominant: var.dominant_term(value).map(|(label, _)| label.to_string()),
                })
                .collect(),
            activations: self
                .rules
                .iter()
                .zip(&strengths)
                .enumerate()
                .map(|(i, (rule, strength))| RuleActivation {
                    rule: i + 1,
                    name: rule.name.clone(),
                    consequent: rule.consequent.label.clone(),
                    strength: strength.value(),
                })
                .collect(),
            aggregate: self.samples.iter().copied().zip(aggregate).collect(),
            centroid,
            output,
        })
    }

    fn defuzzify(&self, aggregate: &[Degree]) -> RiskResult<f64> {
        let crisp = match self.defuzz_method {
            DefuzzificationMethod::Centroid => centroid(&self.samples, aggregate),
            DefuzzificationMethod::AreaCentroid => area_centroid(&self.samples, aggregate),
        };
        crisp.ok_or_else(|| {
            warn!(
                variable = self.output.name(),
                method = self.defuzz_method.as_str(),
                "aggregated output set is empty"
            );
            RiskError::degenerate(self.output.name())
        })
    }
}

/// Discrete centroid. `None` when the set has no membership anywhere.
pub fn centroid(samples: &[f64], membership: &[Degree]) -> Option<f64> {
    let (moment, mass) = samples
        .iter()
        .zip(membership)
        .fold((0.0, 0.0), |(n, d), (x, mu)| (n + x * mu.value(), d + mu.value()));
    (mass > 0.0).then(|| moment / mass)
}

/// Centroid of the piecewise-linear set through the sample points.
/// Each segment is a rectangle, a triangle or a trapezoid.
pub fn area_centroid(samples: &[f64], membership: &[Degree]) -> Option<f64> {
    let mut moment = 0.0;
    let mut area = 0.0;
    for i in 1..samples.len().min(membership.len()) {
        let (x1, x2) = (samples[i - 1], samples[i]);
        let (y1, y2) = (membership[i - 1].value(), membership[i].value());
        if (y1 == 0.0 && y2 == 0.0) || x1 == x2 {
            continue;
        }
        let width = x2 - x1;
        let (center, segment_area) = if y1 == y2 {
            (0.5 * (x1 + x2), width * y1)
        } else if y1 == 0.0 {
            (x1 + 2.0 / 3.0 * width, 0.5 * width * y2)
        } else if y2 == 0.0 {
            (x1 + width / 3.0, 0.5 * width * y1)
        } else {
            (
                x1 + 2.0 / 3.0 * width * (y2 + 0.5 * y1) / (y1 + y2),
                0.5 * width * (y1 + y2),
            )
        };
        moment += center * segment_area;
        area += segment_area;
    }
    (area > 0.0).then(|| moment / area)
}

/// Round half away from zero to `decimals` digits
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// ============================================================================
// Builder
// ============================================================================

#[derive(Debug, Default)]
pub struct InferenceSystemBuilder {
    inputs: Vec<LinguisticVariable>,
    output: Option<LinguisticVariable>,
    rules: Vec<FuzzyRule>,
    defuzz_method: DefuzzificationMethod,
}

impl InferenceSystemBuilder {
    pub fn input(mut self, var: LinguisticVariable) -> Self {
        self.inputs.push(var);
        self
    }

    pub fn output(mut self, var: LinguisticVariable) -> Self {
        self.output = Some(var);
        self
    }

    pub fn rule(mut self, rule: FuzzyRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = FuzzyRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn defuzzification(mut self, method: DefuzzificationMethod) -> Self {
        self.defuzz_method = method;
        self
    }

    /// Validate every variable and resolve every rule reference
    pub fn build(self) -> RiskResult<InferenceSystem> {
        let output = match self.output {
            Some(output) => output,
            None => risk_bail!(ErrorCode::ModelError, "inference system has no output variable"),
        };
        risk_ensure!(
            output.kind() == VariableKind::Consequent,
            ErrorCode::ModelError,
            "'{}' is not a consequent variable",
            output.name()
        );
        risk_ensure!(
            !output.terms().is_empty(),
            ErrorCode::ModelError,
            "output '{}' has no labels",
            output.name()
        );
        output.universe().validate()?;

        for (i, var) in self.inputs.iter().enumerate() {
            risk_ensure!(
                var.kind() == VariableKind::Antecedent,
                ErrorCode::ModelError,
                "'{}' is not an antecedent variable",
                var.name()
            );
            risk_ensure!(
                self.inputs[..i].iter().all(|other| other.name() != var.name()),
                ErrorCode::ModelError,
                "input '{}' declared twice",
                var.name()
            );
            var.universe().validate()?;
        }
        risk_ensure!(!self.rules.is_empty(), ErrorCode::ModelError, "rule base is empty");

        let compiled = self
            .rules
            .iter()
            .map(|rule| compile_rule(rule, &self.inputs, &output))
            .collect::<RiskResult<Vec<_>>>()?;

        let samples = output.universe().samples();
        let curves = output
            .terms()
            .iter()
            .map(|t| samples.iter().map(|&x| t.membership.evaluate(x)).collect())
            .collect();

        Ok(InferenceSystem {
            inputs: self.inputs,
            output,
            rules: self.rules,
            compiled,
            samples,
            curves,
            defuzz_method: self.defuzz_method,
        })
    }
}

fn compile_rule(
    rule: &FuzzyRule,
    inputs: &[LinguisticVariable],
    output: &LinguisticVariable,
) -> RiskResult<CompiledRule> {
    risk_ensure!(
        !rule.antecedents.is_empty(),
        ErrorCode::ModelError,
        "rule '{}' has no antecedent",
        rule
    );

    let mut terms = Vec::with_capacity(rule.antecedents.len());
    for term in &rule.antecedents {
        let var_idx = match inputs.iter().position(|v| v.name() == term.variable) {
            Some(idx) => idx,
            None => risk_bail!(
                ErrorCode::UnknownVariable,
                "rule '{}' references unknown input '{}'",
                rule,
                term.variable
            ),
        };
        let term_idx = match inputs[var_idx].term_index(&term.label) {
            Some(idx) => idx,
            None => risk_bail!(
                ErrorCode::UnknownLabel,
                "'{}' has no label '{}'",
                term.variable,
                term.label
            ),
        };
        terms.push((var_idx, term_idx));
    }

    risk_ensure!(
        rule.consequent.variable == output.name(),
        ErrorCode::UnknownVariable,
        "rule '{}' concludes on '{}', expected '{}'",
        rule,
        rule.consequent.variable,
        output.name()
    );
    let consequent = match output.term_index(&rule.consequent.label) {
        Some(idx) => idx,
        None => risk_bail!(
            ErrorCode::UnknownLabel,
            "'{}' has no label '{}'",
            output.name(),
            rule.consequent.label
        ),
    };

    Ok(CompiledRule { terms, consequent })
}
