//! `getparams.execute` request envelope.

use crate::{de::null_as_default, selector::LabelSelector};
use serde::{Deserialize, Serialize};

/// Body the ApplicationSet controller posts to the plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenerateRequest {
    /// Name of the calling ApplicationSet; carried but not interpreted
    #[serde(default, deserialize_with = "null_as_default")]
    pub application_set_name: String,

    /// Generator input
    #[serde(default, deserialize_with = "null_as_default")]
    pub input: Input,
}

/// `input` object of a [`GenerateRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Input {
    /// User-supplied generator parameters
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: InParameters,
}

/// `input.parameters`: the only accepted parameter is a label selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InParameters {
    /// Selector applied to namespace labels
    #[serde(default, deserialize_with = "null_as_default")]
    pub label_selector: LabelSelector,
}

impl GenerateRequest {
    /// Builds a request for `application_set_name` selecting with `selector`.
    pub fn new(application_set_name: impl Into<String>, selector: LabelSelector) -> Self {
        Self {
            application_set_name: application_set_name.into(),
            input: Input {
                parameters: InParameters {
                    label_selector: selector,
                },
            },
        }
    }

    /// Strictly decodes a request body.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed JSON, wrong types, or any
    /// field not part of the request shape.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// The selector carried in `input.parameters.labelSelector`.
    #[must_use]
    pub fn label_selector(&self) -> &LabelSelector {
        &self.input.parameters.label_selector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_request() {
        let body = br#"{
            "applicationSetName": "tenants",
            "input": {
                "parameters": {
                    "labelSelector": {
                        "matchLabels": {"konflux.ci/type": "user"},
                        "matchExpressions": [
                            {"key": "tier", "operator": "In", "values": ["gold", "silver"]},
                            {"key": "legacy", "operator": "DoesNotExist"}
                        ]
                    }
                }
            }
        }"#;

        let request = GenerateRequest::from_slice(body).unwrap();
        assert_eq!(request.application_set_name, "tenants");

        let selector = request.label_selector();
        assert_eq!(selector.match_labels.get("konflux.ci/type").map(String::as_str), Some("user"));
        assert_eq!(selector.match_expressions.len(), 2);
        assert_eq!(selector.match_expressions[0].values, vec!["gold", "silver"]);
        assert!(selector.match_expressions[1].values.is_empty());
    }

    #[test]
    fn test_decode_empty_selector() {
        let body = br#"{"applicationSetName": "all", "input": {"parameters": {"labelSelector": {}}}}"#;
        let request = GenerateRequest::from_slice(body).unwrap();
        assert!(request.label_selector().is_empty());
    }

    #[test]
    fn test_unknown_top_level_field_rejected() {
        let body = br#"{"applicationSetName": "a", "input": {"parameters": {"labelSelector": {}}}, "extra": 1}"#;
        assert!(GenerateRequest::from_slice(body).is_err());
    }

    #[test]
    fn test_unknown_nested_fields_rejected() {
        let bodies: [&[u8]; 4] = [
            br#"{"input": {"parameters": {"labelSelector": {}}, "values": {}}}"#,
            br#"{"input": {"parameters": {"labelSelector": {}, "namespace": "x"}}}"#,
            br#"{"input": {"parameters": {"labelSelector": {"matchFields": []}}}}"#,
            br#"{"input": {"parameters": {"labelSelector": {"matchExpressions": [{"key": "a", "operator": "Exists", "value": "b"}]}}}}"#,
        ];
        for body in bodies {
            assert!(
                GenerateRequest::from_slice(body).is_err(),
                "should reject {}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_wrong_types_rejected() {
        assert!(GenerateRequest::from_slice(br#"{"applicationSetName": 3}"#).is_err());
        assert!(GenerateRequest::from_slice(br#"{"input": {"parameters": {"labelSelector": {"matchLabels": ["a"]}}}}"#).is_err());
        assert!(GenerateRequest::from_slice(b"not json").is_err());
        assert!(GenerateRequest::from_slice(b"").is_err());
    }

    #[test]
    fn test_null_reads_as_absent() {
        let bodies: [&[u8]; 5] = [
            br#"{"applicationSetName": null, "input": {"parameters": {"labelSelector": {}}}}"#,
            br#"{"applicationSetName": "a", "input": null}"#,
            br#"{"applicationSetName": "a", "input": {"parameters": null}}"#,
            br#"{"applicationSetName": "a", "input": {"parameters": {"labelSelector": null}}}"#,
            br#"{"input": {"parameters": {"labelSelector": {"matchLabels": null, "matchExpressions": null}}}}"#,
        ];
        for body in bodies {
            let request = GenerateRequest::from_slice(body)
                .unwrap_or_else(|e| panic!("{}: {e}", String::from_utf8_lossy(body)));
            assert!(request.label_selector().is_empty());
        }

        let body = br#"{"input": {"parameters": {"labelSelector": {"matchExpressions": [{"key": "a", "operator": "Exists", "values": null}]}}}}"#;
        let request = GenerateRequest::from_slice(body).unwrap();
        assert!(request.label_selector().match_expressions[0].values.is_empty());
    }

    #[test]
    fn test_null_does_not_relax_unknown_fields() {
        let body = br#"{"input": {"parameters": {"labelSelector": null, "extra": null}}}"#;
        assert!(GenerateRequest::from_slice(body).is_err());
    }

    #[test]
    fn test_unrecognized_operator_still_decodes() {
        let body = br#"{"input": {"parameters": {"labelSelector": {"matchExpressions": [{"key": "a", "operator": "Gt", "values": ["1"]}]}}}}"#;
        let request = GenerateRequest::from_slice(body).unwrap();
        assert_eq!(request.label_selector().match_expressions[0].operator, "Gt");
    }

    #[test]
    fn test_serialized_request_decodes_strictly() {
        let selector: LabelSelector = [("konflux.ci/type", "user")].into_iter().collect();
        let request = GenerateRequest::new("test-app", selector);
        let body = serde_json::to_vec(&request).unwrap();
        assert_eq!(GenerateRequest::from_slice(&body).unwrap(), request);
    }
}
