//! JSON batch operations
//!
//! A batch is a JSON array of store operations. IDs arrive as raw JSON values,
//! so a wrong-typed id (`"abc"`, `{}`, `[1]`, `0`) is reported with its
//! [`crate::InputKind`] rather than rejected by deserialization. Each
//! operation runs on its own; a failure does not stop or undo the others.
//!
//! ```json
//! [
//!   {"op": "create", "left_id": 1, "left_type": "post", "right_type": "user", "right_id": 2},
//!   {"op": "related", "object_id": 1, "left_type": "post", "right_type": "user"}
//! ]
//! ```

use crate::storage::RelationshipStore;
use crate::{Error, Param, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum BatchOp {
    Create {
        left_id: Value,
        left_type: String,
        right_type: String,
        right_id: Value,
    },
    Exists {
        left_id: Value,
        left_type: String,
        right_type: String,
        right_id: Value,
    },
    Delete {
        left_id: Value,
        left_type: String,
        right_type: String,
        right_id: Value,
    },
    Related {
        object_id: Value,
        left_type: String,
        right_type: String,
    },
}

impl BatchOp {
    pub fn name(&self) -> &'static str {
        match self {
            BatchOp::Create { .. } => "create",
            BatchOp::Exists { .. } => "exists",
            BatchOp::Delete { .. } => "delete",
            BatchOp::Related { .. } => "related",
        }
    }
}

/// Result of one batch entry
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub index: usize,
    pub op: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<Param>,
}

/// Parse a batch document
pub fn parse(json: &str) -> Result<Vec<BatchOp>> {
    Ok(serde_json::from_str(json)?)
}

fn apply(store: &mut RelationshipStore, op: &BatchOp) -> Result<Value> {
    let value = match op {
        BatchOp::Create { left_id, left_type, right_type, right_id } => {
            Value::from(store.create(left_id, left_type, right_type, right_id)?)
        }
        BatchOp::Exists { left_id, left_type, right_type, right_id } => {
            serde_json::to_value(store.exists(left_id, left_type, right_type, right_id)?)?
        }
        BatchOp::Delete { left_id, left_type, right_type, right_id } => {
            serde_json::to_value(store.delete(left_id, left_type, right_type, right_id)?)?
        }
        BatchOp::Related { object_id, left_type, right_type } => {
            serde_json::to_value(store.related_ids(object_id, left_type, right_type)?)?
        }
    };
    Ok(value)
}

/// Run every operation in order, collecting one outcome per entry
pub fn run(store: &mut RelationshipStore, ops: &[BatchOp]) -> Vec<BatchOutcome> {
    ops.iter()
        .enumerate()
        .map(|(index, op)| match apply(store, op) {
            Ok(result) => BatchOutcome {
                index,
                op: op.name(),
                ok: true,
                result: Some(result),
                error: None,
                param: None,
            },
            Err(e) => {
                if !e.is_validation() {
                    tracing::warn!("Batch entry {} ({}) failed: {}", index, op.name(), e);
                }
                BatchOutcome {
                    index,
                    op: op.name(),
                    ok: false,
                    result: None,
                    param: Error::param(&e),
                    error: Some(e.to_string()),
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RelationshipContext;
    use serde_json::json;

    fn store() -> RelationshipStore {
        RelationshipStore::open_in_memory(RelationshipContext::new()).unwrap()
    }

    #[test]
    fn test_batch_runs_in_order() {
        let mut store = store();
        let ops = parse(
            r#"[
                {"op": "create", "left_id": 1, "left_type": "post", "right_type": "user", "right_id": 2},
                {"op": "create", "left_id": "3", "left_type": "user", "right_type": "post", "right_id": 1},
                {"op": "exists", "left_id": 2, "left_type": "user", "right_type": "post", "right_id": 1},
                {"op": "related", "object_id": 1, "left_type": "post", "right_type": "user"}
            ]"#,
        )
        .unwrap();

        let outcomes = run(&mut store, &ops);
        assert!(outcomes.iter().all(|o| o.ok));
        assert_eq!(outcomes[0].result, Some(json!(1)));
        assert_eq!(outcomes[2].result, Some(json!(1)));
        assert_eq!(outcomes[3].result, Some(json!([2, 3])));
    }

    #[test]
    fn test_bad_ids_report_kind_and_continue() {
        let mut store = store();
        let ops = parse(
            r#"[
                {"op": "create", "left_id": {"id": 1}, "left_type": "post", "right_type": "user", "right_id": 2},
                {"op": "create", "left_id": 1, "left_type": "post", "right_type": "user", "right_id": [2]},
                {"op": "delete", "left_id": 1, "left_type": "post", "right_type": "user", "right_id": 2}
            ]"#,
        )
        .unwrap();

        let outcomes = run(&mut store, &ops);
        assert!(!outcomes[0].ok);
        assert_eq!(outcomes[0].param, Some(Param::LeftObjectId));
        assert!(outcomes[0].error.as_deref().unwrap().contains("object given"));
        assert_eq!(outcomes[1].param, Some(Param::RightObjectId));
        assert!(outcomes[1].error.as_deref().unwrap().contains("array given"));

        assert!(outcomes[2].ok);
        assert_eq!(outcomes[2].result, Some(Value::Null));
    }

    #[test]
    fn test_unknown_op_rejected() {
        assert!(parse(r#"[{"op": "update", "left_id": 1}]"#).is_err());
    }
}
