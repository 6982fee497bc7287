//! Label selector as sent on the wire.
//!
//! This is the standard two-part Kubernetes selector. It is kept as plain
//! data here: operators stay strings so an unsupported operator is reported
//! when the selector is translated, not as a decode failure.

use crate::de::null_as_default;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Selector over namespace labels. All clauses are ANDed; an empty selector
/// matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LabelSelector {
    /// Required exact-match labels
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,

    /// Set-based requirements, in request order
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<LabelSelectorRequirement>,
}

/// One `matchExpressions` clause.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelSelectorRequirement {
    /// Label key the clause applies to
    pub key: String,

    /// `In`, `NotIn`, `Exists` or `DoesNotExist`
    pub operator: String,

    /// Acceptable values; must be empty for `Exists`/`DoesNotExist`
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl LabelSelector {
    /// Returns true when the selector has no clauses at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty() && self.match_expressions.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSelector {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            match_labels: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            match_expressions: Vec::new(),
        }
    }
}
