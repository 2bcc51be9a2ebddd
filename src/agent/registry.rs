use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::mcp::ToolDecl;

/// Primitive kind of a declared parameter, parsed from the remote type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Int,
    Float,
    Bool,
    Any,
}

impl ParamKind {
    fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "str" | "string" => ParamKind::String,
            "int" | "integer" => ParamKind::Int,
            "float" | "number" => ParamKind::Float,
            "bool" | "boolean" => ParamKind::Bool,
            _ => ParamKind::Any,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            ParamKind::String => "str",
            ParamKind::Int => "int",
            ParamKind::Float => "float",
            ParamKind::Bool => "bool",
            ParamKind::Any => "any",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub kind: ParamKind,
    pub required: bool,
}

impl ParamSpec {
    /// The remote signature carries bare annotation names (`str`, `int`) with
    /// no default information, so everything is required unless the tag is
    /// wrapped in `Optional[...]`.
    fn from_tag(tag: &str) -> Self {
        let trimmed = tag.trim();
        if let Some(inner) = trimmed
            .strip_prefix("Optional[")
            .and_then(|s| s.strip_suffix(']'))
        {
            ParamSpec {
                kind: ParamKind::from_tag(inner),
                required: false,
            }
        } else {
            ParamSpec {
                kind: ParamKind::from_tag(trimmed),
                required: true,
            }
        }
    }
}

impl fmt::Display for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.required {
            write!(f, "{}", self.kind.tag())
        } else {
            write!(f, "Optional[{}]", self.kind.tag())
        }
    }
}

/// Declared shape of one remote tool. Immutable after load.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: String,
    pub params: BTreeMap<String, ParamSpec>,
    pub doc: String,
}

impl ToolSchema {
    pub fn from_decl(name: &str, decl: &ToolDecl) -> Self {
        let params = decl
            .signature
            .iter()
            // "return" is annotation metadata, not an argument
            .filter(|(param, _)| param.as_str() != "return")
            .map(|(param, tag)| (param.clone(), ParamSpec::from_tag(tag)))
            .collect();
        ToolSchema {
            name: name.to_string(),
            params,
            doc: decl.doc.trim().to_string(),
        }
    }

    pub fn declares(&self, param: &str) -> bool {
        self.params.contains_key(param)
    }

    pub fn param_names(&self) -> Vec<String> {
        self.params.keys().cloned().collect()
    }

    pub fn signature_line(&self) -> String {
        let args: Vec<String> = self
            .params
            .iter()
            .map(|(name, spec)| format!("{name}: {spec}"))
            .collect();
        format!("{}({})", self.name, args.join(", "))
    }

    /// One-line summary used in prompts and the `show tools` dump: the doc
    /// when present, otherwise the rendered signature.
    pub fn summary(&self) -> String {
        if self.doc.is_empty() {
            self.signature_line()
        } else {
            self.doc.clone()
        }
    }
}

/// Static mapping from tool name to schema, populated once at startup from
/// the remote declarations and replaced wholesale on `reload tools`. A
/// `BTreeMap` keeps iteration order stable so composed prompts are
/// deterministic.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolSchema>,
}

impl ToolRegistry {
    pub fn from_decls(decls: HashMap<String, ToolDecl>) -> Self {
        let tools = decls
            .iter()
            .map(|(name, decl)| (name.clone(), ToolSchema::from_decl(name, decl)))
            .collect();
        ToolRegistry { tools }
    }

    pub fn get(&self, name: &str) -> Option<&ToolSchema> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolSchema> {
        self.tools.values()
    }

    /// Multi-line listing for the `show tools` REPL command.
    pub fn describe(&self) -> String {
        let mut lines = Vec::with_capacity(self.tools.len());
        for schema in self.tools.values() {
            if schema.doc.is_empty() {
                lines.push(format!("- {}", schema.signature_line()));
            } else {
                lines.push(format!("- {}: {}", schema.signature_line(), schema.doc));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(signature: &[(&str, &str)], doc: &str) -> ToolDecl {
        ToolDecl {
            signature: signature
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            doc: doc.to_string(),
        }
    }

    #[test]
    fn schema_skips_return_and_parses_kinds() {
        let schema = ToolSchema::from_decl(
            "scale_deployment",
            &decl(
                &[
                    ("deployment_name", "str"),
                    ("replicas", "int"),
                    ("namespace", "str"),
                    ("return", "Any"),
                ],
                "Scale a deployment.",
            ),
        );

        assert!(!schema.declares("return"));
        assert_eq!(schema.params.len(), 3);
        assert_eq!(
            schema.params["replicas"],
            ParamSpec {
                kind: ParamKind::Int,
                required: true
            }
        );
    }

    #[test]
    fn optional_tag_marks_param_not_required() {
        let schema = ToolSchema::from_decl(
            "list_pods",
            &decl(&[("namespace", "Optional[str]")], ""),
        );
        let spec = schema.params["namespace"];
        assert!(!spec.required);
        assert_eq!(spec.kind, ParamKind::String);
    }

    #[test]
    fn summary_falls_back_to_signature() {
        let with_doc = ToolSchema::from_decl("a", &decl(&[("x", "int")], "Does a."));
        assert_eq!(with_doc.summary(), "Does a.");

        let bare = ToolSchema::from_decl("b", &decl(&[("x", "int")], "  "));
        assert_eq!(bare.summary(), "b(x: int)");
    }

    #[test]
    fn registry_lookup_and_describe_are_ordered() {
        let mut decls = HashMap::new();
        decls.insert("zeta".to_string(), decl(&[], "Last."));
        decls.insert("alpha".to_string(), decl(&[("n", "str")], ""));
        let registry = ToolRegistry::from_decls(decls);

        assert!(registry.contains("alpha"));
        assert!(!registry.contains("omega"));

        let dump = registry.describe();
        let alpha_at = dump.find("alpha").unwrap();
        let zeta_at = dump.find("zeta").unwrap();
        assert!(alpha_at < zeta_at);
    }
}
