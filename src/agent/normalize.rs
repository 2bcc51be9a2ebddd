use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::registry::ToolRegistry;

pub const DEFAULT_NAMESPACE: &str = "default";

/// A parsed, not-yet-validated tool invocation proposed by the generator.
/// Transient: lives for one turn only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandCandidate {
    pub tool: String,
    pub args: Map<String, Value>,
}

impl CommandCandidate {
    pub fn args_value(&self) -> Value {
        Value::Object(self.args.clone())
    }
}

/// Shape one raw extracted object into a candidate, or drop it.
///
/// Dropped: non-objects, objects without a string `tool` field, and tools the
/// registry does not know (logged for observability). A missing or malformed
/// `args` container becomes an empty object. The namespace sentinel is only
/// injected when the tool's schema declares `namespace`; when it does not,
/// a generator-supplied `namespace` is removed. Undeclared argument keys
/// other than `namespace` are left in place for the validator to reject with
/// the expected-argument list.
pub fn normalize(raw: &Value, registry: &ToolRegistry) -> Option<CommandCandidate> {
    let obj = raw.as_object()?;
    let tool = obj.get("tool")?.as_str()?.to_string();

    let Some(schema) = registry.get(&tool) else {
        warn!("Ignored unknown tool: {tool}");
        return None;
    };

    let mut args = match obj.get("args") {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    if schema.declares("namespace") {
        let missing = match args.get("namespace") {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        };
        if missing {
            args.insert(
                "namespace".to_string(),
                Value::String(DEFAULT_NAMESPACE.to_string()),
            );
        }
    } else {
        args.remove("namespace");
    }

    Some(CommandCandidate { tool, args })
}

/// Normalize a batch, preserving extraction order. Order determines execution
/// order, and a later command may depend on an earlier one's side effect.
pub fn normalize_all(raws: &[Value], registry: &ToolRegistry) -> Vec<CommandCandidate> {
    raws.iter()
        .filter_map(|raw| normalize(raw, registry))
        .collect()
}
