use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use regex::Regex;

use crate::convert::TypedValue;
use crate::error::{Error, Result};
use crate::validate::{ValidationFailure, ValidationOutcome, Validator};

#[derive(Debug, Clone)]
pub enum Constraint {
    /// Inclusive bounds on a numeric value; either side may be open.
    Range { min: Option<f64>, max: Option<f64> },
    NotBlank,
    /// Whole-value match.
    Pattern(Regex),
    OneOf(Vec<String>),
    MaxLength(usize),
}

impl Constraint {
    pub fn range(min: impl Into<Option<f64>>, max: impl Into<Option<f64>>) -> Self {
        Self::Range {
            min: min.into(),
            max: max.into(),
        }
    }

    pub fn pattern(pattern: &str) -> Result<Self> {
        let anchored = format!("^(?:{pattern})$");
        let regex = Regex::new(&anchored)
            .map_err(|err| Error::Config(format!("invalid pattern constraint '{pattern}': {err}")))?;
        Ok(Self::Pattern(regex))
    }

    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn accepts(&self, value: &TypedValue) -> bool {
        match self {
            Self::Range { min, max } => {
                let number = value
                    .as_f64()
                    .or_else(|| value.to_string().trim().parse::<f64>().ok());
                match number {
                    Some(number) => {
                        min.map_or(true, |min| number >= min) && max.map_or(true, |max| number <= max)
                    }
                    None => false,
                }
            }
            Self::NotBlank => !value.to_string().trim().is_empty(),
            Self::Pattern(regex) => regex.is_match(&value.to_string()),
            Self::OneOf(allowed) => {
                let rendered = value.to_string();
                allowed.iter().any(|candidate| *candidate == rendered)
            }
            Self::MaxLength(limit) => value.to_string().chars().count() <= *limit,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range { min, max } => {
                let low = min.map_or_else(|| "-inf".to_owned(), |min| min.to_string());
                let high = max.map_or_else(|| "+inf".to_owned(), |max| max.to_string());
                write!(f, "range [{low}, {high}]")
            }
            Self::NotBlank => f.write_str("not-blank"),
            Self::Pattern(regex) => write!(f, "pattern {}", regex.as_str()),
            Self::OneOf(values) => write!(f, "one of [{}]", values.join(", ")),
            Self::MaxLength(limit) => write!(f, "max length {limit}"),
        }
    }
}

/// Per-key constraints, checked against converted values at lookup time.
#[derive(Debug, Clone, Default)]
pub struct ConstraintValidator {
    constraints: BTreeMap<String, Vec<Constraint>>,
}

impl ConstraintValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constrain(mut self, key: impl Into<String>, constraint: Constraint) -> Self {
        self.constraints.entry(key.into()).or_default().push(constraint);
        self
    }

    pub fn declared_keys(&self) -> impl Iterator<Item = &str> {
        self.constraints.keys().map(String::as_str)
    }

    fn roots(&self) -> BTreeSet<&str> {
        self.constraints
            .keys()
            .filter_map(|key| key.split('.').next())
            .collect()
    }
}

impl Validator for ConstraintValidator {
    fn validate(&self, key: &str, value: &TypedValue) -> ValidationOutcome {
        let failed = self
            .constraints
            .get(key)
            .and_then(|constraints| constraints.iter().find(|constraint| !constraint.accepts(value)));
        match failed {
            Some(constraint) => ValidationOutcome::Fail(ValidationFailure::new(
                key,
                constraint.to_string(),
                value.to_string(),
            )),
            None => ValidationOutcome::Pass,
        }
    }

    fn check_unknown(&self, names: &BTreeSet<String>) -> Vec<ValidationFailure> {
        let roots = self.roots();
        names
            .iter()
            .filter(|name| !self.constraints.contains_key(*name))
            .filter(|name| {
                name.split('.')
                    .next()
                    .is_some_and(|root| name.contains('.') && roots.contains(root))
            })
            .map(|name| ValidationFailure::new(name.as_str(), "known-key", name.as_str()))
            .collect()
    }
}
