// src/exec/template.rs

//! Command template placeholder resolution.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The pattern is a literal; this cannot fail at runtime.
    RE.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex")
    })
}

/// Resolve `{name}` placeholders from the binding map.
///
/// Only identifiers present in `bindings` are substituted; anything else is
/// left untouched, so shell constructs like `awk '{print $1}'` survive
/// resolution.
pub fn resolve(template: &str, bindings: &BTreeMap<String, String>) -> String {
    placeholder_re()
        .replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            match bindings.get(name) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
