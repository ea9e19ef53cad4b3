//! Serialized declaration front-end: a TOML document mapping target name to
//! a field dictionary. Unknown keys round-trip through `extra` untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TargetDecl {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<String>>,
    /// Opaque shell-style action metadata. The core never executes these;
    /// wiring a real callback onto the loaded target is a host concern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub essential: bool,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub check_mtime: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<f64>,

    /// Unrecognized keys, preserved verbatim for round-trip fidelity.
    #[serde(flatten)]
    pub extra: toml::value::Table,
}

fn default_true() -> bool {
    true
}

fn is_true(b: &bool) -> bool {
    *b
}

pub type DeclMap = BTreeMap<String, TargetDecl>;

/// Parse a declaration document (`name -> field dict`).
pub fn load_declarations(toml_text: &str) -> Result<DeclMap> {
    Ok(toml::from_str(toml_text)?)
}

/// Serialize a declaration document back to TOML text.
pub fn save_declarations(decls: &DeclMap) -> Result<String> {
    Ok(toml::to_string_pretty(decls)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_recognized_fields() {
        let text = r#"
            [a]
            depends = ["b"]
            essential = true

            [b]
            provides = ["feat"]
            exists = "out/%(ARCH)s/b.out"
        "#;
        let decls = load_declarations(text).unwrap();
        let back = save_declarations(&decls).unwrap();
        let reparsed = load_declarations(&back).unwrap();
        assert_eq!(decls, reparsed);
    }

    #[test]
    fn unknown_keys_are_preserved_in_extra() {
        let text = r#"
            [a]
            depends = ["b"]
            custom_flag = true
        "#;
        let decls = load_declarations(text).unwrap();
        let a = &decls["a"];
        assert_eq!(a.extra.get("custom_flag"), Some(&toml::Value::Boolean(true)));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let decls = load_declarations("[only]\n").unwrap();
        let only = &decls["only"];
        assert!(only.depends.is_empty());
        assert!(only.check_mtime);
        assert!(!only.essential);
    }
}
