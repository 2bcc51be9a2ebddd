use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)```(?:json)?").unwrap());

/// Pull every top-level JSON object out of arbitrary generator output.
///
/// Fence markup is stripped first, then the text is scanned with a
/// brace-depth counter (string- and escape-aware): an object candidate runs
/// from the offset where depth goes 0->1 to where it returns to 0. A
/// candidate that fails to parse is silently discarded and scanning
/// continues, so one malformed object never hides the valid ones around it.
/// An empty result is not an error; the caller treats it as "no actionable
/// command this turn".
pub fn extract_json_objects(text: &str) -> Vec<Value> {
    let cleaned = CODE_FENCE.replace_all(text, "");
    let cleaned = cleaned.trim();

    let mut objects = Vec::new();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in cleaned.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        if let Some(s) = start.take() {
                            let candidate = &cleaned[s..i + ch.len_utf8()];
                            if let Ok(value) = serde_json::from_str::<Value>(candidate) {
                                objects.push(value);
                            }
                        }
                        in_string = false;
                    }
                }
            }
            _ => {}
        }
    }

    objects
}
