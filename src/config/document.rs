//! Parsed configuration document with per-field definedness.
//!
//! # Responsibilities
//! - Parse raw TOML text into a table tree
//! - Answer "was this field path authored?" for any dotted path
//! - Decode individual authored values, naming the path on failure
//!
//! # Design Decisions
//! - Presence comes from the parsed tree itself, not from zero values
//! - Tables descend by key, arrays by numeric index
//! - Values are decoded lazily, one field at a time, by the overlay pass

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::config::loader::{ConfigError, ConfigResult};

/// A parsed configuration document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    root: Table,
}

impl Document {
    /// Parse a TOML document.
    pub fn parse(text: &str) -> ConfigResult<Self> {
        let root: Table = toml::from_str(text)?;
        Ok(Self { root })
    }

    /// A document with nothing defined.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up the value at `path`.
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.root.get(*first)?;
        for segment in rest {
            current = match current {
                Value::Table(table) => table.get(*segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Returns true if the author explicitly set the field at `path`.
    pub fn is_defined(&self, path: &[&str]) -> bool {
        self.get(path).is_some()
    }

    /// Decode the value at `path`, if it was authored.
    pub fn decode<T: DeserializeOwned>(&self, path: &[&str]) -> ConfigResult<Option<T>> {
        match self.get(path) {
            None => Ok(None),
            Some(value) => decode_value(value, &path.join(".")).map(Some),
        }
    }

    /// A cursor positioned at `path`.
    pub fn cursor(&self, path: &[&str]) -> Cursor<'_> {
        Cursor {
            doc: self,
            prefix: path.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A position inside a [`Document`] from which fields are overlaid.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    doc: &'a Document,
    prefix: Vec<String>,
}

impl<'a> Cursor<'a> {
    /// A cursor one level deeper.
    pub fn child(&self, segment: &str) -> Cursor<'a> {
        let mut prefix = self.prefix.clone();
        prefix.push(segment.to_string());
        Cursor {
            doc: self.doc,
            prefix,
        }
    }

    /// Dotted path of `field` below this cursor.
    pub fn path(&self, field: &str) -> String {
        let mut parts = self.prefix.clone();
        parts.push(field.to_string());
        parts.join(".")
    }

    fn value(&self, field: Option<&str>) -> Option<&'a Value> {
        let segments: Vec<&str> = self
            .prefix
            .iter()
            .map(String::as_str)
            .chain(field)
            .collect();
        self.doc.get(&segments)
    }

    /// Returns true if the cursor position itself was authored.
    pub fn exists(&self) -> bool {
        self.value(None).is_some()
    }

    /// Returns true if `field` was authored below this cursor.
    pub fn is_defined(&self, field: &str) -> bool {
        self.value(Some(field)).is_some()
    }

    /// Decode `field` if it was authored.
    pub fn decode<T: DeserializeOwned>(&self, field: &str) -> ConfigResult<Option<T>> {
        match self.value(Some(field)) {
            None => Ok(None),
            Some(value) => decode_value(value, &self.path(field)).map(Some),
        }
    }

    /// Overwrite `target` with the authored value of `field`.
    ///
    /// Leaves `target` untouched when the field is absent and returns
    /// whether the field was authored.
    pub fn overlay<T: DeserializeOwned>(&self, field: &str, target: &mut T) -> ConfigResult<bool> {
        match self.decode(field)? {
            Some(value) => {
                *target = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Entry names at this position: table keys, or indices for arrays.
    ///
    /// An absent position has no entries.
    pub fn keys(&self) -> ConfigResult<Vec<String>> {
        match self.value(None) {
            None => Ok(Vec::new()),
            Some(Value::Table(table)) => Ok(table.keys().cloned().collect()),
            Some(Value::Array(items)) => Ok((0..items.len()).map(|i| i.to_string()).collect()),
            Some(other) => Err(ConfigError::InvalidField {
                path: self.prefix.join("."),
                message: format!("expected a table, found {}", other.type_str()),
            }),
        }
    }
}

fn decode_value<T: DeserializeOwned>(value: &Value, path: &str) -> ConfigResult<T> {
    value
        .clone()
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::InvalidField {
            path: path.to_string(),
            message: e.message().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
        [origins.web]
        origin_url = "http://example.com"
        timeout_secs = 0

        [[origins.web.paths]]
        path = "/api"
    "#;

    #[test]
    fn test_definedness_distinguishes_zero_from_absent() {
        let doc = Document::parse(DOC).unwrap();
        assert!(doc.is_defined(&["origins", "web", "timeout_secs"]));
        assert!(!doc.is_defined(&["origins", "web", "max_ttl_secs"]));
        assert!(doc.is_defined(&["origins", "web", "paths", "0", "path"]));
        assert!(!doc.is_defined(&["origins", "web", "paths", "1", "path"]));
        assert!(!doc.is_defined(&["origins", "web", "paths", "x", "path"]));
    }

    #[test]
    fn test_overlay_only_touches_authored_fields() {
        let doc = Document::parse(DOC).unwrap();
        let cursor = doc.cursor(&["origins", "web"]);

        let mut timeout = 180u64;
        assert!(cursor.overlay("timeout_secs", &mut timeout).unwrap());
        assert_eq!(timeout, 0);

        let mut max_ttl = 86400u64;
        assert!(!cursor.overlay("max_ttl_secs", &mut max_ttl).unwrap());
        assert_eq!(max_ttl, 86400);
    }

    #[test]
    fn test_type_mismatch_names_path() {
        let doc = Document::parse("[origins.web]\ntimeout_secs = \"soon\"\n").unwrap();
        let mut timeout = 0u64;
        let err = doc
            .cursor(&["origins", "web"])
            .overlay("timeout_secs", &mut timeout)
            .unwrap_err();
        assert!(err.to_string().contains("origins.web.timeout_secs"));
    }

    #[test]
    fn test_keys_for_tables_and_arrays() {
        let doc = Document::parse(DOC).unwrap();
        assert_eq!(doc.cursor(&["origins"]).keys().unwrap(), vec!["web"]);
        assert_eq!(doc.cursor(&["origins", "web", "paths"]).keys().unwrap(), vec!["0"]);
        assert!(doc.cursor(&["caches"]).keys().unwrap().is_empty());
        assert!(doc.cursor(&["origins", "web", "origin_url"]).keys().is_err());
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            Document::parse("[origins\nfoo = "),
            Err(ConfigError::Parse(_))
        ));
    }
}
