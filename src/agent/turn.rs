use serde_json::{json, Value};
use tracing::{info, warn};

use super::extract;
use super::format;
use super::memory::ConversationTurn;
use super::mcp::ToolBackend;
use super::normalize::{self, CommandCandidate, DEFAULT_NAMESPACE};
use super::prompt;
use super::validate::{validate, Verdict};
use super::Agent;

impl<B: ToolBackend> Agent<B> {
    /// One user turn end to end: compose, generate, extract, normalize,
    /// then validate and execute each surviving candidate in order.
    pub async fn handle_turn(&mut self, input: &str) {
        let prompt = prompt::compose(input, &self.registry, &self.memory);
        let output = self.llm.generate(&prompt).await;

        let raw = extract::extract_json_objects(&output);
        let candidates = normalize::normalize_all(&raw, &self.registry);

        if candidates.is_empty() {
            if output.trim().is_empty() {
                warn!("Generator returned no output for this turn.");
            } else {
                warn!(
                    "Could not find a valid command in generator output: {}",
                    truncate_raw(&output)
                );
            }
            return;
        }

        self.complete_turn(input, candidates).await;
    }

    /// Execute candidates sequentially, in extraction order. A rejected
    /// candidate is reported and skipped without aborting the rest; a later
    /// candidate may depend on an earlier one's side effect, so validation
    /// runs immediately before each dispatch, never up front for the batch.
    pub(crate) async fn complete_turn(&mut self, input: &str, candidates: Vec<CommandCandidate>) {
        let commands = serde_json::to_string_pretty(&candidates).unwrap_or_default();
        let mut results_log = String::new();

        for mut candidate in candidates {
            info!("Executing: {} {}", candidate.tool, candidate.args_value());

            match validate(
                &mut candidate,
                &self.registry,
                &mut self.cache,
                &self.backend,
            )
            .await
            {
                Verdict::Rejected(rejection) => {
                    let detail = serde_json::to_string_pretty(&rejection).unwrap_or_default();
                    println!("[Validation Error(s)]\n{detail}");
                    results_log.push_str(&format!(
                        "validation rejected {}: {detail}\n",
                        candidate.tool
                    ));
                    continue;
                }
                Verdict::Ok => {}
            }

            let result = match self.backend.run(&candidate.tool, &candidate.args).await {
                Ok(value) => value,
                Err(e) => json!({ "error": e.to_string() }),
            };

            if succeeded(&result) {
                self.invalidate_after(&candidate);
            }

            let rendered = format::pretty(&result);
            println!("{rendered}");

            results_log.push_str(&result.to_string());
            results_log.push('\n');
            results_log.push_str(&rendered);
            results_log.push('\n');
        }

        self.memory.record(ConversationTurn {
            user: input.to_string(),
            commands,
            results: results_log,
        });
    }

    /// Drop the cache entries a successful mutating operation may have
    /// outdated. Mirrors the invalidation sets of the remote tools:
    /// namespace deletion and manifest application can touch anything,
    /// deployment mutations also churn pods.
    fn invalidate_after(&mut self, candidate: &CommandCandidate) {
        let tool = candidate.tool.as_str();
        let mutating = ["create_", "delete_", "scale_", "restart_", "apply_"]
            .iter()
            .any(|prefix| tool.starts_with(prefix));
        if !mutating {
            return;
        }

        let namespace = candidate
            .args
            .get("namespace")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_NAMESPACE);

        if tool == "apply_yaml" || tool == "delete_namespace" {
            self.cache.invalidate("namespaces");
            self.cache.invalidate("deployments::");
            self.cache.invalidate("pods::");
            self.cache.invalidate("services::");
        } else if tool.contains("namespace") {
            self.cache.invalidate("namespaces");
        } else if tool.contains("deployment") {
            self.cache.invalidate(&format!("deployments::{namespace}"));
            self.cache.invalidate(&format!("pods::{namespace}"));
        } else if tool.contains("pod") {
            self.cache.invalidate(&format!("pods::{namespace}"));
        } else if tool.contains("service") {
            self.cache.invalidate(&format!("services::{namespace}"));
        }
    }
}

/// A result counts as a successful mutation unless it carries an `error`
/// field or `status: "error"`. `status: "exists"` still invalidates; the
/// extra refetch is harmless.
fn succeeded(result: &Value) -> bool {
    if result.get("error").is_some() {
        return false;
    }
    !matches!(result.get("status").and_then(Value::as_str), Some("error"))
}

fn truncate_raw(raw: &str) -> String {
    const MAX_LEN: usize = 400;
    if raw.len() <= MAX_LEN {
        raw.to_string()
    } else {
        let cut = raw
            .char_indices()
            .take_while(|(i, _)| *i < MAX_LEN)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &raw[..cut])
    }
}
