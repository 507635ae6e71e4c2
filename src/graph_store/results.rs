//! SPARQL 1.1 JSON results format, as returned for SELECT queries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectResults {
    #[serde(default)]
    pub head: ResultsHead,
    #[serde(default)]
    pub results: ResultBindings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsHead {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultBindings {
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

/// One result row. Variables left unbound by the query are absent.
pub type Binding = BTreeMap<String, BoundValue>;

/// A value together with the store's type wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundValue {
    /// `uri`, `literal` or `bnode`.
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(
        rename = "xml:lang",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub lang: Option<String>,
}

impl BoundValue {
    pub fn uri(value: &str) -> Self {
        Self {
            kind: "uri".to_string(),
            value: value.to_string(),
            datatype: None,
            lang: None,
        }
    }

    pub fn literal(value: &str) -> Self {
        Self {
            kind: "literal".to_string(),
            value: value.to_string(),
            datatype: None,
            lang: None,
        }
    }

    pub fn typed_literal(value: &str, datatype: &str) -> Self {
        Self {
            datatype: Some(datatype.to_string()),
            ..Self::literal(value)
        }
    }
}

impl SelectResults {
    pub fn bindings(&self) -> &[Binding] {
        &self.results.bindings
    }

    pub fn into_bindings(self) -> Vec<Binding> {
        self.results.bindings
    }
}
