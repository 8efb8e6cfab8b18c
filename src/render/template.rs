//! Turning template identifiers and parameters into markup.

use std::{
    io,
    path::{Component, Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use crate::render::{
    markup::{escape, substitute},
    Parameters, Placeholders,
};

/// Resolves textual templates into markup.
///
/// Implementations must be deterministic: the same template and parameters
/// always produce the same markup.
pub trait TemplateEngine: Send + Sync {
    /// Renders the template identified by `template` (e.g.
    /// `8.2.1/tailoringcatalog`) with the given parameters.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] if the template cannot be found, read or
    /// rendered.
    fn process(&self, template: &str, parameters: &Parameters) -> Result<String, TemplateError>;

    /// Converts free text into an escaped markup fragment, substituting the
    /// given placeholders.
    fn to_xhtml(&self, text: &str, placeholders: &Placeholders) -> String;
}

/// Errors raised while resolving a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template identifier would leave the template root.
    #[error("invalid template identifier '{0}'")]
    InvalidKey(String),
    /// No template file exists for the identifier.
    #[error("template {template} not found at {}", path.display())]
    NotFound {
        /// The template identifier.
        template: String,
        /// Where the template was expected.
        path: PathBuf,
    },
    /// The template file could not be read.
    #[error("failed to read template {template}")]
    Io {
        /// The template identifier.
        template: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// A `{{#section}}` has no matching `{{/section}}`.
    #[error("template {template}: section '{section}' is not closed")]
    UnclosedSection {
        /// The template identifier.
        template: String,
        /// The section name.
        section: String,
    },
}

/// Matches `${name}` (escaped) and `$!{name}` (raw) parameter references.
static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(!?)\{([A-Za-z0-9_.\-]+)\}").expect("valid variable regex")
});

/// Matches the opening tag of a repeated section, `{{#name}}`.
static SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{#([A-Za-z0-9_.\-]+)\}\}").expect("valid section regex")
});

/// A template engine reading HTML templates from a directory.
///
/// The template `8.2.1/tailoringcatalog` is read from
/// `{root}/8.2.1/tailoringcatalog.html`. Templates support:
///
/// - `${name}`: the parameter's value, HTML escaped.
/// - `$!{name}`: the parameter's value, inserted as is (for markup fragments
///   produced by [`TemplateEngine::to_xhtml`]).
/// - `{{#name}}...{{/name}}`: the body is rendered once per element if the
///   parameter is a list, once if it is an object or `true`, and skipped if it
///   is missing, `null`, `false` or empty. Inside the body, the element's
///   fields are visible by name and a scalar element is visible as `${.}`.
///
/// Unknown names resolve to the empty string.
#[derive(Debug, Clone)]
pub struct FileTemplateEngine {
    root: PathBuf,
}

impl FileTemplateEngine {
    /// Creates an engine reading templates below `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory templates are read from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, template: &str) -> Result<PathBuf, TemplateError> {
        let relative = Path::new(template);
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if template.is_empty() || !safe {
            return Err(TemplateError::InvalidKey(template.to_string()));
        }
        Ok(self.root.join(format!("{template}.html")))
    }

    fn load(&self, template: &str) -> Result<String, TemplateError> {
        let path = self.path(template)?;
        std::fs::read_to_string(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => TemplateError::NotFound {
                template: template.to_string(),
                path,
            },
            _ => TemplateError::Io {
                template: template.to_string(),
                source,
            },
        })
    }
}

impl TemplateEngine for FileTemplateEngine {
    #[instrument(level = "debug", skip(self, parameters))]
    fn process(&self, template: &str, parameters: &Parameters) -> Result<String, TemplateError> {
        let source = self.load(template)?;
        let root = Value::Object(parameters.clone());
        render(&source, &mut vec![&root]).map_err(|section| TemplateError::UnclosedSection {
            template: template.to_string(),
            section,
        })
    }

    fn to_xhtml(&self, text: &str, placeholders: &Placeholders) -> String {
        let escaped = escape(text);
        substitute(&escaped, |name| {
            placeholders.get(name).map(|value| escape(value).into_owned())
        })
        .into_owned()
    }
}

/// Renders `source` against a stack of scopes, innermost last.
///
/// Returns the name of the first unclosed section on failure.
fn render<'v>(source: &str, scopes: &mut Vec<&'v Value>) -> Result<String, String> {
    let mut output = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(open) = SECTION.captures(rest) {
        let tag = open.get(0).expect("group 0 always matches");
        let name = open[1].to_string();
        let closing = format!("{{{{/{name}}}}}");

        output.push_str(&interpolate(&rest[..tag.start()], scopes));

        let after = &rest[tag.end()..];
        let end = after.find(&closing).ok_or_else(|| name.clone())?;
        let body = &after[..end];

        match lookup(scopes, &name) {
            Some(Value::Array(items)) => {
                for item in items {
                    output.push_str(&render_in(body, scopes, item)?);
                }
            }
            Some(value @ Value::Object(_)) => output.push_str(&render_in(body, scopes, value)?),
            Some(Value::Bool(true)) => output.push_str(&render(body, scopes)?),
            Some(Value::String(s)) if !s.is_empty() => output.push_str(&render(body, scopes)?),
            Some(Value::Number(_)) => output.push_str(&render(body, scopes)?),
            _ => {}
        }

        rest = &after[end + closing.len()..];
    }

    output.push_str(&interpolate(rest, scopes));
    Ok(output)
}

fn render_in<'v>(
    body: &str,
    scopes: &mut Vec<&'v Value>,
    item: &'v Value,
) -> Result<String, String> {
    scopes.push(item);
    let result = render(body, scopes);
    scopes.pop();
    result
}

fn lookup<'v>(scopes: &[&'v Value], name: &str) -> Option<&'v Value> {
    scopes.iter().rev().find_map(|&scope| match scope {
        Value::Object(map) => map.get(name),
        scalar if name == "." => Some(scalar),
        _ => None,
    })
}

fn interpolate(text: &str, scopes: &[&Value]) -> String {
    VARIABLE
        .replace_all(text, |caps: &regex::Captures| {
            let raw = !caps[1].is_empty();
            let value = lookup(scopes, &caps[2]).map(display).unwrap_or_default();
            if raw {
                value
            } else {
                escape(&value).into_owned()
            }
        })
        .into_owned()
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}
