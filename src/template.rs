// src/template.rs

//! `{{ key }}` placeholder rendering for step commands and job headers.
//!
//! Rendering is a pure function over a flat `key -> value` map. A placeholder
//! whose key is not in the map is an error; nothing is ever silently replaced
//! with an empty string.
//!
//! ```text
//! cp {{ a }} {{ b }}      with a = "in.txt", b = "out.txt"
//! => cp in.txt out.txt
//! ```
//!
//! Keys are whatever sits between the braces, trimmed, so `{{ step 1 }}` and
//! `{{res-1}}` are both valid.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template references undefined key '{key}'")]
    MissingKey { key: String },

    #[error("unterminated placeholder starting at byte {offset}")]
    Unterminated { offset: usize },

    #[error("empty placeholder at byte {offset}")]
    EmptyPlaceholder { offset: usize },
}

/// A parsed piece of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

/// Split a template into literal text and placeholder keys.
pub fn parse(template: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let mut segments = Vec::new();
    let mut rest = template;
    let mut offset = 0;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            segments.push(Segment::Literal(&rest[..start]));
        }

        let body = &rest[start + 2..];
        let end = body.find("}}").ok_or(TemplateError::Unterminated {
            offset: offset + start,
        })?;

        let key = body[..end].trim();
        if key.is_empty() {
            return Err(TemplateError::EmptyPlaceholder {
                offset: offset + start,
            });
        }
        segments.push(Segment::Placeholder(key));

        let consumed = start + 2 + end + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }

    Ok(segments)
}

/// Unique placeholder keys in order of first appearance.
pub fn placeholders(template: &str) -> Result<Vec<&str>, TemplateError> {
    let mut keys: Vec<&str> = Vec::new();
    for segment in parse(template)? {
        if let Segment::Placeholder(key) = segment {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }
    Ok(keys)
}

/// Placeholder keys of `template` that `bindings` cannot satisfy, in order of
/// first appearance.
pub fn missing_keys<'t>(
    template: &'t str,
    bindings: &BTreeMap<String, String>,
) -> Result<Vec<&'t str>, TemplateError> {
    Ok(placeholders(template)?
        .into_iter()
        .filter(|key| !bindings.contains_key(*key))
        .collect())
}

/// Render `template` against `bindings`.
pub fn render(template: &str, bindings: &BTreeMap<String, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());

    for segment in parse(template)? {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder(key) => {
                let value = bindings
                    .get(key)
                    .ok_or_else(|| TemplateError::MissingKey {
                        key: key.to_string(),
                    })?;
                out.push_str(value);
            }
        }
    }

    Ok(out)
}
