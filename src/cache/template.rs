//! Key template parsing and resolution.
//!
//! Templates use `{name}` placeholders:
//! - `user:{id}` - substituted from the parameter named `id`
//! - `users:dept:{deptId}:status:{status}` - several placeholders
//! - `user` - no placeholders, used verbatim
//!
//! There is no escaping and no expression syntax. An unbalanced `{` or an
//! empty `{}` is plain text.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A template split into literal text and placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    segments: Vec<Segment>,
    placeholders: Vec<String>,
}

impl ParsedTemplate {
    /// Parse a template string.
    ///
    /// A placeholder is a `{` followed by at least one character up to the
    /// next `}`. Duplicated names are kept; they resolve identically.
    pub fn parse(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut placeholders = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) if close > 0 => {
                    literal.push_str(&rest[..open]);
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    let name = after[..close].to_string();
                    placeholders.push(name.clone());
                    segments.push(Segment::Placeholder(name));
                    rest = &after[close + 1..];
                }
                _ => {
                    // Not a placeholder: keep the brace as text and move on
                    literal.push_str(&rest[..=open]);
                    rest = after;
                }
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            segments,
            placeholders,
        }
    }

    /// Placeholder names in first-seen order.
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Expand placeholders in a single pass.
    ///
    /// Placeholders without a matching parameter, or whose argument is
    /// missing or `null`, stay in the output as literal `{name}`.
    pub fn render<P: AsRef<str>>(&self, params: &[P], args: &[Value]) -> String {
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let arg = params
                        .iter()
                        .position(|param| param.as_ref() == name)
                        .and_then(|pos| args.get(pos))
                        .filter(|arg| !arg.is_null());

                    match arg {
                        Some(arg) => out.push_str(&scalar_text(arg)),
                        None => {
                            out.push('{');
                            out.push_str(name);
                            out.push('}');
                        }
                    }
                }
            }
        }

        out
    }
}

/// Render an argument as placeholder text.
///
/// Strings are unquoted, numbers use their natural form. Nested structures
/// fall back to compact JSON.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Memoized template parses, shared by every resolver that holds a handle.
///
/// Entries are added lazily and never removed: template strings come from
/// operation declarations and are effectively constants.
#[derive(Debug, Default)]
pub struct TemplateCache {
    parsed: DashMap<String, Arc<ParsedTemplate>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the parse for `template`, computing it on first use.
    pub fn get_or_parse(&self, template: &str) -> Arc<ParsedTemplate> {
        if let Some(parsed) = self.parsed.get(template) {
            return Arc::clone(parsed.value());
        }

        let parsed = Arc::new(ParsedTemplate::parse(template));
        debug!(
            "Parsed key template '{}' ({} placeholders)",
            template,
            parsed.placeholders().len()
        );

        // A concurrent parse of the same template may have won; keep theirs
        Arc::clone(
            self.parsed
                .entry(template.to_string())
                .or_insert(parsed)
                .value(),
        )
    }

    /// Number of distinct templates parsed so far.
    pub fn len(&self) -> usize {
        self.parsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsed.is_empty()
    }
}

/// Turns a template (or its absence) plus call arguments into a key.
#[derive(Debug, Clone, Default)]
pub struct KeyResolver {
    templates: Arc<TemplateCache>,
}

impl KeyResolver {
    /// Create a resolver with its own template cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver sharing an existing template cache.
    pub fn with_cache(templates: Arc<TemplateCache>) -> Self {
        Self { templates }
    }

    /// The template cache this resolver memoizes into.
    pub fn templates(&self) -> &Arc<TemplateCache> {
        &self.templates
    }

    /// Resolve a key.
    ///
    /// With a template, placeholders are expanded against `params`/`args`.
    /// Without one, the key is the hex xxh3 digest of the operation identity
    /// and the JSON form of the arguments. Never fails and never empty
    /// unless the template itself is empty.
    pub fn resolve<P: AsRef<str>>(
        &self,
        template: Option<&str>,
        identity: &str,
        params: &[P],
        args: &[Value],
    ) -> String {
        match template {
            Some(template) => self.templates.get_or_parse(template).render(params, args),
            None => auto_key(identity, args),
        }
    }
}

/// Deterministic key for a call with no template.
pub fn auto_key(identity: &str, args: &[Value]) -> String {
    // Serializing `Value`s cannot fail; objects have sorted keys
    let encoded = serde_json::to_string(args).unwrap_or_default();
    let digest = xxh3_64(format!("{identity}::{encoded}").as_bytes());
    format!("{digest:016x}")
}
