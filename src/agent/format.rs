use serde_json::{Map, Value};

/// Render a structured tool result for the terminal.
///
/// Error payloads render as an error line (plus the remote suggestion when
/// present). A `result` envelope is unwrapped. A non-empty list of objects
/// becomes a table whose columns come from the first element's keys, with
/// missing keys rendered empty; a single object becomes `key: value` lines;
/// anything else renders literally.
pub fn pretty(value: &Value) -> String {
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        let mut out = format!("Error: {error}");
        if let Some(suggestion) = value.get("suggestion").and_then(Value::as_str) {
            if !suggestion.is_empty() {
                out.push_str(&format!("\nSuggestion: {suggestion}"));
            }
        }
        return out;
    }

    let data = value.get("result").unwrap_or(value);

    if let Some(items) = data.as_array() {
        if let Some(first) = items.first().and_then(Value::as_object) {
            return render_table(items, first);
        }
    }

    if let Some(obj) = data.as_object() {
        return obj
            .iter()
            .map(|(key, val)| format!("{key}: {}", render_scalar(val)))
            .collect::<Vec<_>>()
            .join("\n");
    }

    render_scalar(data)
}

fn render_table(items: &[Value], first: &Map<String, Value>) -> String {
    let keys: Vec<&String> = first.keys().collect();

    let header = keys
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(" | ");
    let separator = keys
        .iter()
        .map(|k| "-".repeat(k.len()))
        .collect::<Vec<_>>()
        .join("-+-");

    let rows: Vec<String> = items
        .iter()
        .map(|item| {
            keys.iter()
                .map(|key| {
                    item.get(key.as_str())
                        .map(render_scalar)
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect();

    format!("{header}\n{separator}\n{}", rows.join("\n"))
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
