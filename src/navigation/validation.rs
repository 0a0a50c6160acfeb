//! URL validation contract and auto-fix.
//!
//! # Responsibilities
//! - Define the report a validation gateway returns
//! - Derive corrected query parameters from a failing report
//! - Log every failed rule
//!
//! # Design Decisions
//! - Auto-fix is all or nothing: one uncorrectable item aborts it
//! - An item is correctable when it carries a `fix`, or when its first failed
//!   rule says the parameter is not allowed (the parameter is dropped)

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::navigation::error::HostError;
use crate::routing::{QueryParameters, QueryValue};

/// Why a rule failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Validity {
    /// The parameter must not be present at all.
    NotAllowed,
    ValueMissing,
    TypeMismatch,
    PatternMismatch,
    TooLong,
    TooShort,
    RangeUnderflow,
    RangeOverflow,
    StepMismatch,
    BadInput,
    CustomError,
}

/// A failed rule of an invalid item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRule {
    pub rule: String,
    pub validity: Validity,
}

/// A single invalid query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidItem {
    pub key: String,
    pub value: QueryValue,
    /// Replacement value, when the validator knows one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<QueryValue>,
    #[serde(default)]
    pub failed: Vec<FailedRule>,
}

/// Accumulated validation verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub result: bool,
    #[serde(default)]
    pub invalids: IndexMap<String, InvalidItem>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::passing()
    }
}

impl ValidationResult {
    pub fn passing() -> Self {
        Self {
            result: true,
            invalids: IndexMap::new(),
        }
    }

    /// Record an invalid item. The result becomes failing.
    pub fn add_invalid(&mut self, item: InvalidItem) {
        self.result = false;
        self.invalids.insert(item.key.clone(), item);
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.result &= other.result;
        self.invalids.extend(other.invalids);
    }
}

/// Input handed to a validation gateway.
#[derive(Debug, Clone, Copy)]
pub struct ValidationRequest<'a> {
    pub item: &'a QueryParameters,
    pub validation_name: Option<&'a str>,
}

/// Validates the query parameters of a URL.
#[async_trait]
pub trait ValidationGateway: Send + Sync {
    async fn check(&self, request: ValidationRequest<'_>) -> Result<ValidationResult, HostError>;
}

/// Accepts every URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThroughValidator;

#[async_trait]
impl ValidationGateway for PassThroughValidator {
    async fn check(&self, _request: ValidationRequest<'_>) -> Result<ValidationResult, HostError> {
        Ok(ValidationResult::passing())
    }
}

/// Corrected parameters for a failing report, or `None` when some item
/// cannot be corrected.
pub fn fix_parameters(params: &QueryParameters, report: &ValidationResult) -> Option<QueryParameters> {
    let mut fixed = params.clone();
    for item in report.invalids.values() {
        if let Some(fix) = &item.fix {
            fixed.insert(item.key.clone(), fix.clone());
        } else if item.failed.first().map(|rule| rule.validity) == Some(Validity::NotAllowed) {
            fixed.shift_remove(&item.key);
        } else {
            return None;
        }
    }
    Some(fixed)
}

/// Log every failed rule of a report.
pub fn log_failures(url: &str, report: &ValidationResult) {
    for item in report.invalids.values() {
        for failed in &item.failed {
            tracing::warn!(
                url = %url,
                key = %item.key,
                value = ?item.value,
                rule = %failed.rule,
                validity = ?failed.validity,
                "URL validation failed"
            );
        }
    }
}
