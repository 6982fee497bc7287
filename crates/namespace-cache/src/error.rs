//! Namespace cache errors

use thiserror::Error;

/// Errors raised while connecting the cache to a cluster or querying it.
#[derive(Debug, Error)]
pub enum CacheError {
    /// No usable in-cluster or kubeconfig configuration was found
    #[error("Cluster configuration error: {0}")]
    Config(#[from] kube::config::InferConfigError),

    /// The API server could not be reached or rejected the client
    #[error("Cluster connection error: {0}")]
    Connection(#[from] kube::Error),

    /// The cache's backing session is gone and the query cannot be served
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised when a label selector cannot be represented.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    /// Operator is not `In`, `NotIn`, `Exists` or `DoesNotExist`
    #[error("unsupported operator {0:?}")]
    UnknownOperator(String),

    /// Label key is not a valid qualified name
    #[error("invalid label key {key:?}: {reason}")]
    InvalidKey {
        /// Offending key
        key: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Label value is not a valid label value
    #[error("invalid value {value:?} for label key {key:?}")]
    InvalidValue {
        /// Key the value was given for
        key: String,
        /// Offending value
        value: String,
    },

    /// `In`/`NotIn` given no values
    #[error("operator {operator} on key {key:?} requires at least one value")]
    MissingValues {
        /// Key of the clause
        key: String,
        /// Operator of the clause
        operator: crate::selector::Operator,
    },

    /// `Exists`/`DoesNotExist` given values
    #[error("operator {operator} on key {key:?} does not take values")]
    UnexpectedValues {
        /// Key of the clause
        key: String,
        /// Operator of the clause
        operator: crate::selector::Operator,
    },
}
