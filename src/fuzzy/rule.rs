//! Fuzzy rules: conjunctions of membership terms implying one output term

use std::fmt;

/// A `(variable, label)` reference, e.g. `income is high`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub variable: String,
    pub label: String,
}

impl Term {
    pub fn new(variable: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            label: label.into(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is {}", self.variable, self.label)
    }
}

/// A Mamdani rule. Antecedent terms are ANDed with the minimum t-norm.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyRule {
    /// Rule name/label
    pub name: Option<String>,
    /// Antecedents (ANDed together)
    pub antecedents: Vec<Term>,
    pub consequent: Term,
}

impl FuzzyRule {
    pub fn new(antecedents: Vec<Term>, consequent: Term) -> Self {
        Self {
            name: None,
            antecedents,
            consequent,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Display for FuzzyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref name) = self.name {
            write!(f, "{}: ", name)?;
        }
        write!(f, "IF ")?;
        for (i, term) in self.antecedents.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{}", term)?;
        }
        write!(f, " THEN {}", self.consequent)
    }
}
