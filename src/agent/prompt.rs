use super::memory::ConversationMemory;
use super::registry::ToolRegistry;

/// Behavioral contract the generator is expected (not guaranteed) to follow.
/// The downstream extractor/normalizer/validator enforce it for real.
const SYSTEM_RULES: &str = "\
You are a command translator for a Kubernetes management agent.
Convert user input into one or more JSON commands for the MCP server.
Output must be raw JSON only - no markdown, no prose, no code fences.
Each command must be a valid JSON object with 'tool' and 'args'.
";

const BEHAVIOR_RULES: &str = "\
Rules:
- Only call a tool the user explicitly requests. Do not try to run all tools.
- Never go beyond the parameters defined in the tool descriptions.
- If a tool has 'namespace' as a parameter but the user does not specify one, set it to 'default'.
- If a tool does not take 'namespace', never include it.
- If multiple values are given for one argument, emit one JSON command per value.
";

const EXAMPLES: &str = r#"Examples:
{"tool": "list_pods", "args": {"namespace": "default"}}
{"tool": "scale_deployment", "args": {"deployment_name": "nginx", "replicas": 4, "namespace": "default"}}
{"tool": "restart_deployment", "args": {"deployment_name": "cicd", "namespace": "default"}}
{"tool": "get_nodes", "args": {}}
"#;

/// Build the full instruction text for one generation call. Pure function of
/// its inputs: no clock, no randomness, so identical inputs compose the
/// identical prompt.
pub fn compose(user_input: &str, registry: &ToolRegistry, memory: &ConversationMemory) -> String {
    let tool_descriptions: Vec<String> = registry
        .iter()
        .map(|schema| format!("- {}: {}", schema.name, schema.summary()))
        .collect();

    let mut prompt = String::new();
    prompt.push_str(SYSTEM_RULES);
    prompt.push_str("Available tools and their arguments:\n");
    prompt.push_str(&tool_descriptions.join("\n"));
    prompt.push_str("\n\n");
    prompt.push_str(BEHAVIOR_RULES);
    prompt.push_str(EXAMPLES);
    prompt.push('\n');
    prompt.push_str(&memory.render());
    prompt.push_str(&format!("User: {user_input}\nCommand:"));
    prompt
}
