//! Label selectors evaluated against cached namespaces.
//!
//! A [`Selector`] is a conjunction of [`Requirement`]s. Exact-match labels
//! are single-value `In` requirements, so the empty selector (no
//! requirements) matches every namespace.

use crate::error::SelectorError;
use regex::Regex;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
    sync::LazyLock,
};

/// Label map of a cached object.
pub type Labels = BTreeMap<String, String>;

const MAX_NAME_LEN: usize = 63;
const MAX_PREFIX_LEN: usize = 253;

#[allow(clippy::expect_used, reason = "pattern is a compile-time constant")]
static NAME_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").expect("valid name pattern")
});

#[allow(clippy::expect_used, reason = "pattern is a compile-time constant")]
static DNS_SUBDOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("valid subdomain pattern")
});

/// Set-based operator of a [`Requirement`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Key present with one of the values
    In,
    /// Key absent, or present with none of the values
    NotIn,
    /// Key present, any value
    Exists,
    /// Key absent
    DoesNotExist,
}

/// One clause of a [`Selector`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requirement {
    key: String,
    operator: Operator,
    values: BTreeSet<String>,
}

/// Conjunction of requirements over namespace labels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    requirements: Vec<Requirement>,
}

// === Selector ===

impl Selector {
    /// Selector matching every namespace.
    #[must_use]
    pub fn everything() -> Self {
        Self::default()
    }

    /// Returns true when every requirement holds for `labels`.
    #[must_use]
    pub fn matches(&self, labels: &Labels) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }

    /// Returns true when the selector has no requirements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// The requirements in the order they were added.
    #[must_use]
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }
}

impl FromIterator<Requirement> for Selector {
    fn from_iter<T: IntoIterator<Item = Requirement>>(iter: T) -> Self {
        Self {
            requirements: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.requirements.is_empty() {
            return f.write_str("<everything>");
        }
        for (i, r) in self.requirements.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{r}")?;
        }
        Ok(())
    }
}

// === Requirement ===

impl Requirement {
    /// Builds a validated requirement.
    ///
    /// # Errors
    ///
    /// Fails if the key or any value is not a valid label key/value, or if
    /// the number of values does not suit the operator.
    pub fn new<I, S>(key: impl Into<String>, operator: Operator, values: I) -> Result<Self, SelectorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.into();
        validate_key(&key)?;

        let values = values.into_iter().map(Into::into).collect::<BTreeSet<String>>();
        match operator {
            Operator::In | Operator::NotIn if values.is_empty() => {
                return Err(SelectorError::MissingValues { key, operator });
            }
            Operator::Exists | Operator::DoesNotExist if !values.is_empty() => {
                return Err(SelectorError::UnexpectedValues { key, operator });
            }
            _ => {}
        }
        if let Some(value) = values.iter().find(|v| !is_valid_value(v)) {
            return Err(SelectorError::InvalidValue {
                key,
                value: value.clone(),
            });
        }

        Ok(Self {
            key,
            operator,
            values,
        })
    }

    /// Builds a requirement from an operator given by name.
    ///
    /// # Errors
    ///
    /// Fails on an unknown operator or as [`Requirement::new`].
    pub fn parse<I, S>(key: impl Into<String>, operator: &str, values: I) -> Result<Self, SelectorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(key, operator.parse()?, values)
    }

    /// Exact-match requirement `key=value`.
    ///
    /// # Errors
    ///
    /// Fails if the key or value is invalid.
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Result<Self, SelectorError> {
        Self::new(key, Operator::In, Some(value))
    }

    /// Label key this requirement applies to.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Operator of this requirement.
    #[must_use]
    pub fn operator(&self) -> Operator {
        self.operator
    }

    fn matches(&self, labels: &Labels) -> bool {
        match self.operator {
            Operator::In => labels.get(&self.key).is_some_and(|v| self.values.contains(v)),
            Operator::NotIn => labels.get(&self.key).is_none_or(|v| !self.values.contains(v)),
            Operator::Exists => labels.contains_key(&self.key),
            Operator::DoesNotExist => !labels.contains_key(&self.key),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = || self.values.iter().cloned().collect::<Vec<_>>().join(",");
        match self.operator {
            Operator::In if self.values.len() == 1 => write!(f, "{}={}", self.key, values()),
            Operator::In => write!(f, "{} in ({})", self.key, values()),
            Operator::NotIn => write!(f, "{} notin ({})", self.key, values()),
            Operator::Exists => f.write_str(&self.key),
            Operator::DoesNotExist => write!(f, "!{}", self.key),
        }
    }
}

// === Operator ===

impl FromStr for Operator {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "In" => Ok(Self::In),
            "NotIn" => Ok(Self::NotIn),
            "Exists" => Ok(Self::Exists),
            "DoesNotExist" => Ok(Self::DoesNotExist),
            other => Err(SelectorError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::In => "In",
            Self::NotIn => "NotIn",
            Self::Exists => "Exists",
            Self::DoesNotExist => "DoesNotExist",
        })
    }
}

// === Validation ===

fn invalid_key(key: &str, reason: &'static str) -> SelectorError {
    SelectorError::InvalidKey {
        key: key.to_string(),
        reason,
    }
}

/// Qualified name: `[prefix/]name`, prefix a DNS subdomain.
fn validate_key(key: &str) -> Result<(), SelectorError> {
    let name = match key.split_once('/') {
        Some((prefix, name)) => {
            if prefix.is_empty() {
                return Err(invalid_key(key, "prefix part must not be empty"));
            }
            if prefix.len() > MAX_PREFIX_LEN {
                return Err(invalid_key(key, "prefix part must be no more than 253 characters"));
            }
            if !DNS_SUBDOMAIN.is_match(prefix) {
                return Err(invalid_key(key, "prefix part must be a lowercase DNS subdomain"));
            }
            name
        }
        None => key,
    };

    if name.is_empty() {
        return Err(invalid_key(key, "name part must not be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid_key(key, "name part must be no more than 63 characters"));
    }
    if !NAME_PART.is_match(name) {
        return Err(invalid_key(
            key,
            "name part must start and end with an alphanumeric character and contain only '-', '_', '.' or alphanumerics",
        ));
    }
    Ok(())
}

fn is_valid_value(value: &str) -> bool {
    value.is_empty() || (value.len() <= MAX_NAME_LEN && NAME_PART.is_match(value))
}
