//! `getparams.execute` response envelope.

use serde::{Deserialize, Serialize};

/// Parameters returned to the ApplicationSet controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateResponse {
    /// Generator output
    pub output: Output,
}

/// `output` object of a [`GenerateResponse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Output {
    /// One parameter set per selected namespace, in cache order
    pub parameters: Vec<OutParameters>,
}

/// A single parameter set: the namespace name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutParameters {
    /// Namespace name
    pub namespace: String,
}

impl FromIterator<String> for GenerateResponse {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self {
            output: Output {
                parameters: iter
                    .into_iter()
                    .map(|namespace| OutParameters { namespace })
                    .collect(),
            },
        }
    }
}

impl GenerateResponse {
    /// Namespace names in response order.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.output.parameters.iter().map(|p| p.namespace.as_str())
    }
}
