//! Generator configuration.
//!
//! Everything the pipeline needs to recognize its input lives in a
//! [`GenConfig`] value that is passed down explicitly, so several
//! configurations can run side by side.

use serde::Deserialize;

/// Default sigil marking a model declaration.
pub const DEFAULT_MODEL_SIGIL: &str = "sqlgen:model";
/// Default sigil marking a query declaration.
pub const DEFAULT_QUERY_SIGIL: &str = "sqlgen:query";
/// Default attribute namespace holding field annotations.
pub const DEFAULT_ATTRIBUTE: &str = "sqlgen";
/// Default suffix appended to the source file stem to name the output.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_sqlgen.rs";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    pub directives: Sigils,
    pub annotations: AnnotationKeys,
}

/// Literal doc-comment prefixes recognized as directives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Sigils {
    pub model: String,
    pub query: String,
}

impl Default for Sigils {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL_SIGIL.to_string(),
            query: DEFAULT_QUERY_SIGIL.to_string(),
        }
    }
}

impl Sigils {
    /// All recognized sigils, model first.
    pub fn all(&self) -> [&str; 2] {
        [self.model.as_str(), self.query.as_str()]
    }
}

/// Where field annotations are read from: `#[<attribute>(<model> = "...", <query> = "...")]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnnotationKeys {
    pub attribute: String,
    pub model: String,
    pub query: String,
}

impl Default for AnnotationKeys {
    fn default() -> Self {
        Self {
            attribute: DEFAULT_ATTRIBUTE.to_string(),
            model: "model".to_string(),
            query: "query".to_string(),
        }
    }
}

impl GenConfig {
    /// Reject configurations the extractor could not apply unambiguously.
    pub fn validate(&self) -> Result<(), String> {
        let d = &self.directives;
        if d.model.trim().is_empty() || d.query.trim().is_empty() {
            return Err("directive sigils must not be empty".to_string());
        }
        if d.model != d.model.trim() || d.query != d.query.trim() {
            return Err("directive sigils must not contain surrounding whitespace".to_string());
        }
        if d.model.starts_with(&d.query) || d.query.starts_with(&d.model) {
            return Err(format!(
                "directive sigils must not prefix each other: {} / {}",
                d.model, d.query
            ));
        }

        let a = &self.annotations;
        for (what, v) in [
            ("annotations.attribute", &a.attribute),
            ("annotations.model", &a.model),
            ("annotations.query", &a.query),
        ] {
            if !crate::naming::is_valid_rust_ident(v) {
                return Err(format!("{what} must be a plain identifier, got {v:?}"));
            }
        }
        if a.model == a.query {
            return Err(format!(
                "annotations.model and annotations.query must differ: {}",
                a.model
            ));
        }

        Ok(())
    }
}
