//! credit-risk
//!
//! A fuzzy-logic loan risk engine with an HTTP front end.
//!
//! # Architecture
//!
//! - [`fuzzy`] - Mamdani inference toolkit: membership functions, linguistic
//!   variables, rules and an immutable inference system
//! - [`credit`] - The loan model: variable tables, rule base, experience
//!   gate and risk banding
//! - [`server`] - axum service exposing `POST /calculate`
//! - [`config`] - TOML configuration with environment overrides
//! - [`error`] - Coded error type shared by every layer
//!
//! # Example
//!
//! ```rust,ignore
//! use credit_risk::{evaluate, Decision};
//!
//! let assessment = evaluate(3500.0, 1400.0, 12.0)?;
//! assert_eq!(assessment.decision, Decision::GuarantorRequired);
//! println!("{}", assessment); // Guarantor required (MEDIUM risk: 0.5)
//! ```

pub mod config;
pub mod credit;
pub mod error;
pub mod fuzzy;
pub mod logging;
pub mod server;

// Re-export the assessment API
pub use credit::{evaluate, Assessment, CreditModel, Decision, Explanation, RiskCategory};

// Re-export fuzzy toolkit types
pub use fuzzy::{
    DefuzzificationMethod, EvaluationContext, FuzzyRule, Inference, InferenceSystem,
    LinguisticVariable, MembershipFunction, Universe,
};

// Re-export async server types
pub use server::{create_router, run_server, AppState, ServerConfig};

// Re-export configuration types
pub use config::{ConfigError, LogFormat, LoggingConfig, ModelConfig, RiskConfig};

// Re-export error types
pub use error::{ErrorCode, ErrorResponse, RiskError, RiskResult};
