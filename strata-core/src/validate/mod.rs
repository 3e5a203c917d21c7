#[cfg(feature = "validation")]
pub mod constraints;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

#[cfg(feature = "validation")]
pub use constraints::{Constraint, ConstraintValidator};

use crate::convert::TypedValue;
use crate::error::{Error, Result};

/// A converted value that broke a declared constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    key: String,
    constraint: String,
    rejected: String,
}

impl ValidationFailure {
    pub fn new(
        key: impl Into<String>,
        constraint: impl Into<String>,
        rejected: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            constraint: constraint.into(),
            rejected: rejected.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn constraint(&self) -> &str {
        &self.constraint
    }

    pub fn rejected(&self) -> &str {
        &self.rejected
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' rejected value '{}': expected {}",
            self.key, self.rejected, self.constraint
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Pass,
    Fail(ValidationFailure),
}

impl ValidationOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Pass => Ok(()),
            Self::Fail(failure) => Err(Error::ValidationError(failure)),
        }
    }
}

pub trait Validator: Send + Sync {
    fn validate(&self, key: &str, value: &TypedValue) -> ValidationOutcome;

    /// Names the validator considers undeclared. Only consulted when unknown-key
    /// validation is switched on.
    fn check_unknown(&self, _names: &BTreeSet<String>) -> Vec<ValidationFailure> {
        Vec::new()
    }
}

/// The validator compiled into this build, if any.
pub fn discovered_validator() -> Option<Arc<dyn Validator>> {
    #[cfg(feature = "validation")]
    {
        tracing::debug!("constraint validation available");
        Some(Arc::new(ConstraintValidator::new()))
    }

    #[cfg(not(feature = "validation"))]
    {
        tracing::info!("validation feature not compiled in; validation skipped");
        None
    }
}
