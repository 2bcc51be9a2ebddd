use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;

use super::error::{AgentError, Result};
use super::mcp::{ToolBackend, ToolDecl};

/// In-memory tool backend with canned cluster state, used in place of the
/// HTTP client across the cache/validator/turn tests.
pub struct FakeBackend {
    namespaces: Vec<String>,
    pods: HashMap<String, Vec<String>>,
    deployments: HashMap<String, Vec<String>>,
    services: HashMap<String, Vec<String>>,
    responses: HashMap<String, Value>,
    fail: bool,
    calls: Mutex<Vec<(String, Value)>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        FakeBackend {
            namespaces: Vec::new(),
            pods: HashMap::new(),
            deployments: HashMap::new(),
            services: HashMap::new(),
            responses: HashMap::new(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_namespaces(mut self, names: &[&str]) -> Self {
        self.namespaces = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_pods(mut self, namespace: &str, names: &[&str]) -> Self {
        self.pods
            .insert(namespace.to_string(), to_strings(names));
        self
    }

    pub fn with_deployments(mut self, namespace: &str, names: &[&str]) -> Self {
        self.deployments
            .insert(namespace.to_string(), to_strings(names));
        self
    }

    pub fn with_services(mut self, namespace: &str, names: &[&str]) -> Self {
        self.services
            .insert(namespace.to_string(), to_strings(names));
        self
    }

    /// Canned response for a specific tool, overriding the list helpers.
    pub fn with_response(mut self, tool: &str, response: Value) -> Self {
        self.responses.insert(tool.to_string(), response);
        self
    }

    /// Every call errors, as if the endpoint were unreachable.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls_to(&self, tool: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == tool)
            .count()
    }

    pub fn recorded_calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    fn scoped_list(&self, table: &HashMap<String, Vec<String>>, args: &Map<String, Value>) -> Value {
        let namespace = args
            .get("namespace")
            .and_then(Value::as_str)
            .unwrap_or("default");
        let names = table.get(namespace).cloned().unwrap_or_default();
        name_list(&names)
    }
}

#[async_trait]
impl ToolBackend for FakeBackend {
    async fn list_tools(&self) -> Result<HashMap<String, ToolDecl>> {
        Ok(HashMap::new())
    }

    async fn run(&self, tool: &str, args: &Map<String, Value>) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((tool.to_string(), Value::Object(args.clone())));

        if self.fail {
            return Err(AgentError::Backend("connection refused".to_string()));
        }

        if let Some(response) = self.responses.get(tool) {
            return Ok(response.clone());
        }

        let result = match tool {
            "list_namespaces" => name_list(&self.namespaces),
            "list_pods" => self.scoped_list(&self.pods, args),
            "list_deployments" => self.scoped_list(&self.deployments, args),
            "list_services" => self.scoped_list(&self.services, args),
            _ => json!({"status": "success", "message": format!("{tool} ok")}),
        };
        Ok(result)
    }
}

fn to_strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn name_list(names: &[String]) -> Value {
    Value::Array(
        names
            .iter()
            .map(|name| json!({"name": name}))
            .collect(),
    )
}
