use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::cache::NameCache;
use super::mcp::ToolBackend;
use super::normalize::{CommandCandidate, DEFAULT_NAMESPACE};
use super::registry::ToolRegistry;

/// Outcome of validating one candidate. A candidate is only ever executed on
/// `Ok`.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Ok,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_ok(&self) -> bool {
        matches!(self, Verdict::Ok)
    }
}

/// All accumulated error messages plus suggestion lists drawn from the
/// schema or live cluster state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rejection {
    pub errors: Vec<String>,
    pub suggestions: BTreeMap<String, Vec<String>>,
}

impl Rejection {
    fn push(&mut self, message: String) {
        self.errors.push(message);
    }

    fn suggest(&mut self, key: &str, values: Vec<String>) {
        self.suggestions.insert(key.to_string(), values);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceKind {
    Pod,
    Deployment,
    Service,
}

impl ResourceKind {
    /// Resource-existence checks apply to tools naming a resource kind,
    /// except creation operations (the target does not exist yet by design).
    fn for_tool(tool: &str) -> Option<Self> {
        if tool.contains("create") {
            return None;
        }
        if tool.contains("pod") {
            Some(ResourceKind::Pod)
        } else if tool.contains("deployment") {
            Some(ResourceKind::Deployment)
        } else if tool.contains("service") || tool.contains("svc") {
            Some(ResourceKind::Service)
        } else {
            None
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ResourceKind::Pod => "Pod",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::Service => "Service",
        }
    }

    fn name_alias(&self) -> &'static str {
        match self {
            ResourceKind::Pod => "pod_name",
            ResourceKind::Deployment => "deployment_name",
            ResourceKind::Service => "service_name",
        }
    }

    fn suggestion_key(&self) -> &'static str {
        match self {
            ResourceKind::Pod => "available_pods",
            ResourceKind::Deployment => "available_deployments",
            ResourceKind::Service => "available_services",
        }
    }
}

/// Cross-check a normalized candidate against its schema and live cluster
/// state. Check order is fixed: unknown arguments, missing required
/// arguments, namespace existence, resource existence, file accessibility.
/// Messages accumulate across checks, but no cluster query is issued once an
/// earlier category has failed (schema failures skip the namespace and
/// resource lookups; a namespace failure skips the resource lookup). A
/// `file` argument that resolves is rewritten to its absolute path.
pub async fn validate(
    candidate: &mut CommandCandidate,
    registry: &ToolRegistry,
    cache: &mut NameCache,
    backend: &dyn ToolBackend,
) -> Verdict {
    let Some(schema) = registry.get(&candidate.tool) else {
        // normally filtered by the normalizer; double failure means a stale registry
        let mut rejection = Rejection::default();
        rejection.push(format!("Unknown tool '{}'.", candidate.tool));
        return Verdict::Rejected(rejection);
    };

    let mut rejection = Rejection::default();

    // 1. unknown arguments
    for key in candidate.args.keys() {
        if !schema.declares(key) {
            rejection.push(format!("Unexpected argument '{key}'."));
            rejection.suggest("expected_args", schema.param_names());
        }
    }

    // 2. missing required arguments
    for (name, spec) in &schema.params {
        if spec.required && !candidate.args.contains_key(name) {
            rejection.push(format!("Missing argument '{name}'."));
        }
    }

    let schema_ok = rejection.errors.is_empty();

    // 3. namespace existence
    let mut namespace_ok = true;
    if schema_ok {
        if let Some(ns) = candidate.args.get("namespace").and_then(Value::as_str) {
            let namespaces = cache.namespaces(backend).await;
            if !namespaces.iter().any(|name| name == ns) {
                rejection.push(format!("Namespace '{ns}' not found."));
                rejection.suggest("available_namespaces", namespaces);
                namespace_ok = false;
            }
        }
    }

    // 4. resource existence, scoped to the candidate's namespace
    if schema_ok && namespace_ok {
        if let Some(kind) = ResourceKind::for_tool(&candidate.tool) {
            let target = candidate
                .args
                .get("name")
                .or_else(|| candidate.args.get(kind.name_alias()))
                .and_then(Value::as_str)
                .map(str::to_string);

            if let Some(target) = target {
                let namespace = candidate
                    .args
                    .get("namespace")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_NAMESPACE)
                    .to_string();

                let names = match kind {
                    ResourceKind::Pod => cache.pods(&namespace, backend).await,
                    ResourceKind::Deployment => cache.deployments(&namespace, backend).await,
                    ResourceKind::Service => cache.services(&namespace, backend).await,
                };

                if !names.iter().any(|name| *name == target) {
                    rejection.push(format!(
                        "{} '{target}' not found in '{namespace}'.",
                        kind.label()
                    ));
                    rejection.suggest(kind.suggestion_key(), names);
                }
            }
        }
    }

    // 5. file accessibility; rewrite to an absolute path on success
    if let Some(path) = candidate
        .args
        .get("file")
        .and_then(Value::as_str)
        .map(str::to_string)
    {
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {
                if let Ok(absolute) = tokio::fs::canonicalize(&path).await {
                    candidate.args.insert(
                        "file".to_string(),
                        Value::String(absolute.to_string_lossy().into_owned()),
                    );
                }
            }
            _ => rejection.push(format!("File '{path}' not found or inaccessible.")),
        }
    }

    if rejection.errors.is_empty() {
        Verdict::Ok
    } else {
        Verdict::Rejected(rejection)
    }
}
