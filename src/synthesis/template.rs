// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Policy rule templates.
//!
//! Templates use `{{ ... }}` expressions over `Name` and `Namespace` (also available as
//! `name` and `namespace`). The dotted field spelling `{{ .Name }}` is accepted as well
//! and rewritten to a plain variable before compiling.

use super::Identity;
use crate::error::Result;
use minijinja::{context, Environment, UndefinedBehavior};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTemplate {
    source: String,
}

impl PolicyTemplate {
    /// Compile-check a template so syntax errors surface before the first render.
    pub fn parse(source: &str) -> Result<Self> {
        let source = normalize_field_references(source);
        environment().template_from_str(&source)?;
        Ok(Self { source })
    }

    pub fn render(&self, identity: &Identity) -> Result<String> {
        let rendered = environment().render_str(
            &self.source,
            context! {
                Name => identity.name.as_str(),
                Namespace => identity.namespace.as_str(),
                name => identity.name.as_str(),
                namespace => identity.namespace.as_str(),
            },
        )?;
        Ok(rendered)
    }
}

fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env
}

/// Rewrite `{{ .Name }}` to `{{ Name }}` inside every expression block. The contents of
/// `{% raw %}` blocks are copied as written.
fn normalize_field_references(template: &str) -> String {
    let mut result = String::with_capacity(template.len());
    let mut remaining = template;

    while let Some(start) = next_block(remaining) {
        result.push_str(&remaining[..start]);
        remaining = &remaining[start..];

        if remaining.starts_with("{%") {
            let Some(end) = remaining.find("%}") else {
                break;
            };
            let tag_end = end + 2;
            let copied = if tag_name(&remaining[2..end]) == "raw" {
                raw_block_len(remaining, tag_end).unwrap_or(remaining.len())
            } else {
                tag_end
            };
            result.push_str(&remaining[..copied]);
            remaining = &remaining[copied..];
            continue;
        }

        result.push_str("{{");
        remaining = &remaining[2..];
        let Some(end) = remaining.find("}}") else {
            break;
        };
        result.push_str(&strip_leading_dots(&remaining[..end]));
        result.push_str("}}");
        remaining = &remaining[end + 2..];
    }

    result.push_str(remaining);
    result
}

/// Offset of the next `{{` or `{%`
fn next_block(template: &str) -> Option<usize> {
    match (template.find("{{"), template.find("{%")) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Name of a statement tag given the text between `{%` and `%}`
fn tag_name(inner: &str) -> &str {
    inner
        .trim_matches(|c: char| c == '-' || c == '+' || c.is_whitespace())
        .split_whitespace()
        .next()
        .unwrap_or("")
}

/// Length of a raw block whose opening tag ends at `from`, up to and including `{% endraw %}`
fn raw_block_len(template: &str, from: usize) -> Option<usize> {
    let mut offset = from;
    while let Some(start) = template[offset..].find("{%") {
        let tag_start = offset + start;
        let end = template[tag_start..].find("%}")? + tag_start;
        if tag_name(&template[tag_start + 2..end]) == "endraw" {
            return Some(end + 2);
        }
        offset = end + 2;
    }
    None
}

/// Drop a `.` that starts a field path. Quoted strings and attribute access
/// (`foo.bar`) are left alone.
fn strip_leading_dots(expression: &str) -> String {
    let mut out = String::with_capacity(expression.len());
    let mut chars = expression.chars().peekable();
    let mut prev: Option<char> = None;
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
        } else if c == '"' || c == '\'' {
            quote = Some(c);
        } else if c == '.' {
            let starts_path = prev.map_or(true, |p| p.is_whitespace() || "(,|-".contains(p));
            let before_ident = chars
                .peek()
                .is_some_and(|n| n.is_ascii_alphabetic() || *n == '_');
            if starts_path && before_ident {
                prev = Some(c);
                continue;
            }
        }
        out.push(c);
        prev = Some(c);
    }

    out
}
