//! Mango (CouchDB-style) rich queries
//!
//! The registry builds typed [`Selector`]s; this module turns them into the
//! JSON selector strings a document store understands, and evaluates such
//! strings against stored documents for backends without a native index.
//!
//! Supported grammar is deliberately small: a top-level `selector` object
//! whose members are implicitly AND-ed, each either a bare string
//! (equality) or an object holding one of `$eq` / `$ne` with a string.

use landreg_core::{Operator, RegistryError, RegistryResult, Selector};
use serde_json::{json, Map, Value};

/// One field comparison inside a selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCondition {
    pub field: String,
    pub op: Operator,
    pub value: String,
}

impl FieldCondition {
    fn matches(&self, doc: &Value) -> bool {
        match (doc.get(&self.field).and_then(Value::as_str), self.op) {
            (Some(actual), Operator::Eq) => actual == self.value,
            (Some(actual), Operator::Ne) => actual != self.value,
            (None, _) => false,
        }
    }

    fn to_json(&self) -> Value {
        match self.op {
            Operator::Eq => Value::String(self.value.clone()),
            Operator::Ne => json!({ "$ne": self.value }),
        }
    }
}

/// Parsed Mango query
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MangoQuery {
    pub conditions: Vec<FieldCondition>,
}

impl MangoQuery {
    pub fn from_selector(selector: &Selector) -> Self {
        Self {
            conditions: vec![FieldCondition {
                field: selector.field.column().to_string(),
                op: selector.op,
                value: selector.value.clone(),
            }],
        }
    }

    /// Render as `{"selector":{...}}`. Values are JSON-escaped.
    pub fn to_query_string(&self) -> String {
        let mut fields = Map::new();
        for condition in &self.conditions {
            fields.insert(condition.field.clone(), condition.to_json());
        }
        json!({ "selector": Value::Object(fields) }).to_string()
    }

    pub fn parse(query: &str) -> RegistryResult<Self> {
        let root: Value = serde_json::from_str(query)
            .map_err(|e| RegistryError::InvalidArgument(format!("query is not JSON: {}", e)))?;
        let selector = root
            .get("selector")
            .and_then(Value::as_object)
            .ok_or_else(|| RegistryError::InvalidArgument("query has no selector object".into()))?;

        let mut conditions = Vec::with_capacity(selector.len());
        for (field, expr) in selector {
            let (op, value) = match expr {
                Value::String(s) => (Operator::Eq, s.clone()),
                Value::Object(ops) if ops.len() == 1 => {
                    let (name, operand) = ops.iter().next().ok_or_else(|| {
                        RegistryError::InvalidArgument(format!("empty operator for {}", field))
                    })?;
                    let op = match name.as_str() {
                        "$eq" => Operator::Eq,
                        "$ne" => Operator::Ne,
                        other => {
                            return Err(RegistryError::InvalidArgument(format!(
                                "unsupported operator {} on {}",
                                other, field
                            )))
                        }
                    };
                    let value = operand.as_str().ok_or_else(|| {
                        RegistryError::InvalidArgument(format!("{} operand must be a string", field))
                    })?;
                    (op, value.to_string())
                }
                _ => {
                    return Err(RegistryError::InvalidArgument(format!(
                        "unsupported condition on {}",
                        field
                    )))
                }
            };
            conditions.push(FieldCondition {
                field: field.clone(),
                op,
                value,
            });
        }

        Ok(Self { conditions })
    }

    /// Conjunction of all conditions. An empty selector matches every object.
    pub fn matches(&self, doc: &Value) -> bool {
        doc.is_object() && self.conditions.iter().all(|c| c.matches(doc))
    }
}
