use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

use super::mcp::ToolBackend;

pub const CACHE_TTL: Duration = Duration::from_secs(30);

/// TTL cache of cluster name lists, keyed `namespaces` / `pods::<ns>` /
/// `deployments::<ns>` / `services::<ns>`. An entry older than the TTL is
/// treated as absent and refetched; entries are never refreshed proactively.
/// The executor invalidates by key prefix after mutating operations.
pub struct NameCache {
    entries: HashMap<String, (Instant, Vec<String>)>,
    ttl: Duration,
}

impl NameCache {
    pub fn new() -> Self {
        Self::with_ttl(CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        NameCache {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub async fn namespaces(&mut self, backend: &dyn ToolBackend) -> Vec<String> {
        self.fetch_names("namespaces", "list_namespaces", None, backend)
            .await
    }

    pub async fn pods(&mut self, namespace: &str, backend: &dyn ToolBackend) -> Vec<String> {
        self.fetch_names(&format!("pods::{namespace}"), "list_pods", Some(namespace), backend)
            .await
    }

    pub async fn deployments(&mut self, namespace: &str, backend: &dyn ToolBackend) -> Vec<String> {
        self.fetch_names(
            &format!("deployments::{namespace}"),
            "list_deployments",
            Some(namespace),
            backend,
        )
        .await
    }

    pub async fn services(&mut self, namespace: &str, backend: &dyn ToolBackend) -> Vec<String> {
        self.fetch_names(
            &format!("services::{namespace}"),
            "list_services",
            Some(namespace),
            backend,
        )
        .await
    }

    /// Drop every entry whose key starts with `prefix`.
    pub fn invalidate(&mut self, prefix: &str) {
        self.entries.retain(|key, _| !key.starts_with(prefix));
    }

    async fn fetch_names(
        &mut self,
        key: &str,
        tool: &str,
        namespace: Option<&str>,
        backend: &dyn ToolBackend,
    ) -> Vec<String> {
        if let Some(names) = self.get(key) {
            return names;
        }

        let mut args = Map::new();
        if let Some(ns) = namespace {
            args.insert("namespace".to_string(), Value::String(ns.to_string()));
        }

        match backend.run(tool, &args).await {
            Ok(result) => {
                let names = extract_names(&result);
                self.entries
                    .insert(key.to_string(), (Instant::now(), names.clone()));
                names
            }
            Err(e) => {
                // failed queries are not cached
                warn!("Cluster state query {tool} failed: {e}");
                Vec::new()
            }
        }
    }

    fn get(&mut self, key: &str) -> Option<Vec<String>> {
        match self.entries.get(key) {
            Some((fetched_at, names)) if fetched_at.elapsed() <= self.ttl => Some(names.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }
}

impl Default for NameCache {
    fn default() -> Self {
        Self::new()
    }
}

/// List results are arrays of objects with a `name` field, optionally wrapped
/// in a `result` envelope. Anything else (including error payloads) yields an
/// empty list.
fn extract_names(result: &Value) -> Vec<String> {
    let data = result.get("result").unwrap_or(result);
    data.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testutil::FakeBackend;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn serves_cached_list_within_ttl() {
        let backend = FakeBackend::new().with_namespaces(&["default", "production"]);
        let mut cache = NameCache::new();

        let first = cache.namespaces(&backend).await;
        assert_eq!(first, vec!["default", "production"]);
        assert_eq!(backend.calls_to("list_namespaces"), 1);

        tokio::time::advance(Duration::from_secs(29)).await;
        let second = cache.namespaces(&backend).await;
        assert_eq!(second, first);
        assert_eq!(backend.calls_to("list_namespaces"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refetches_after_ttl_expiry() {
        let backend = FakeBackend::new().with_namespaces(&["default"]);
        let mut cache = NameCache::new();

        cache.namespaces(&backend).await;
        tokio::time::advance(Duration::from_secs(31)).await;
        cache.namespaces(&backend).await;
        assert_eq!(backend.calls_to("list_namespaces"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn scoped_keys_are_independent_and_prefix_invalidation_works() {
        let backend = FakeBackend::new()
            .with_pods("default", &["web-1"])
            .with_pods("production", &["api-1", "api-2"]);
        let mut cache = NameCache::new();

        assert_eq!(cache.pods("default", &backend).await, vec!["web-1"]);
        assert_eq!(
            cache.pods("production", &backend).await,
            vec!["api-1", "api-2"]
        );
        assert_eq!(backend.calls_to("list_pods"), 2);

        // invalidation forces a refetch for both scoped entries
        cache.invalidate("pods::");
        cache.pods("default", &backend).await;
        cache.pods("production", &backend).await;
        assert_eq!(backend.calls_to("list_pods"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_query_is_not_cached() {
        let backend = FakeBackend::new().failing();
        let mut cache = NameCache::new();

        assert!(cache.namespaces(&backend).await.is_empty());
        assert!(cache.namespaces(&backend).await.is_empty());
        assert_eq!(backend.calls_to("list_namespaces"), 2);
    }

    #[test]
    fn names_come_from_plain_or_enveloped_lists() {
        let plain = json!([{"name": "a", "status": "Active"}, {"name": "b"}]);
        assert_eq!(extract_names(&plain), vec!["a", "b"]);

        let enveloped = json!({"result": [{"name": "c"}]});
        assert_eq!(extract_names(&enveloped), vec!["c"]);

        let error = json!({"error": "boom"});
        assert!(extract_names(&error).is_empty());
    }
}
