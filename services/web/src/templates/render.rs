//! Mustache-style rendering of cached page fragments.
//!
//! Supports the tags the views use: `{{name}}` (escaped), `{{{name}}}` and
//! `{{& name}}` (raw), `{{#name}}`/`{{^name}}` sections, `{{! comments}}` and
//! `{{> partials}}`. Unknown variables and partials render as nothing.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::TemplateError;

/// Partials may include partials, but not forever.
const MAX_PARTIAL_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Variable { name: String, escape: bool },
    Section { name: String, inverted: bool, children: Vec<Node> },
    Partial(String),
}

enum Tag<'t> {
    Variable(&'t str),
    Raw(&'t str),
    Open(&'t str, bool),
    Close(&'t str),
    Partial(&'t str),
    Comment,
}

/// Renders `template` against `context`, resolving `{{> name}}` from `partials`.
pub fn render(
    template: &str,
    context: &Value,
    partials: &HashMap<String, Arc<str>>,
) -> Result<String, TemplateError> {
    let nodes = parse(template)?;
    let mut out = String::with_capacity(template.len());
    let mut scopes = vec![context];
    render_nodes(&nodes, &mut scopes, partials, &mut out, 0)?;
    Ok(out)
}

fn parse(input: &str) -> Result<Vec<Node>, TemplateError> {
    // Open sections: (name, inverted, nodes collected before the section began).
    let mut open: Vec<(String, bool, Vec<Node>)> = Vec::new();
    let mut current: Vec<Node> = Vec::new();
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            current.push(Node::Text(rest[..start].to_string()));
        }
        let after = &rest[start + 2..];

        let (tag, consumed) = if let Some(inner) = after.strip_prefix('{') {
            let end = inner
                .find("}}}")
                .ok_or_else(|| TemplateError::Parse("unclosed '{{{' tag".to_string()))?;
            (Tag::Raw(inner[..end].trim()), 1 + end + 3)
        } else {
            let end = after
                .find("}}")
                .ok_or_else(|| TemplateError::Parse("unclosed '{{' tag".to_string()))?;
            (classify(after[..end].trim()), end + 2)
        };
        rest = &after[consumed..];

        match tag {
            Tag::Comment => {}
            Tag::Variable(name) => current.push(Node::Variable {
                name: tag_name(name)?,
                escape: true,
            }),
            Tag::Raw(name) => current.push(Node::Variable {
                name: tag_name(name)?,
                escape: false,
            }),
            Tag::Partial(name) => current.push(Node::Partial(tag_name(name)?)),
            Tag::Open(name, inverted) => {
                open.push((tag_name(name)?, inverted, std::mem::take(&mut current)));
            }
            Tag::Close(name) => {
                let (open_name, inverted, parent) = open.pop().ok_or_else(|| {
                    TemplateError::Parse(format!("unexpected closing tag '{}'", name))
                })?;
                if open_name != name {
                    return Err(TemplateError::Parse(format!(
                        "section '{}' closed by '{}'",
                        open_name, name
                    )));
                }
                let children = std::mem::replace(&mut current, parent);
                current.push(Node::Section {
                    name: open_name,
                    inverted,
                    children,
                });
            }
        }
    }

    if !rest.is_empty() {
        current.push(Node::Text(rest.to_string()));
    }
    if let Some((name, _, _)) = open.pop() {
        return Err(TemplateError::Parse(format!("section '{}' is never closed", name)));
    }
    Ok(current)
}

fn classify(body: &str) -> Tag<'_> {
    let mut chars = body.chars();
    match chars.next() {
        Some('#') => Tag::Open(chars.as_str().trim(), false),
        Some('^') => Tag::Open(chars.as_str().trim(), true),
        Some('/') => Tag::Close(chars.as_str().trim()),
        Some('>') => Tag::Partial(chars.as_str().trim()),
        Some('&') => Tag::Raw(chars.as_str().trim()),
        Some('!') => Tag::Comment,
        _ => Tag::Variable(body),
    }
}

fn tag_name(name: &str) -> Result<String, TemplateError> {
    if name.is_empty() {
        return Err(TemplateError::Parse("empty tag".to_string()));
    }
    Ok(name.to_string())
}

fn render_nodes<'a>(
    nodes: &[Node],
    scopes: &mut Vec<&'a Value>,
    partials: &HashMap<String, Arc<str>>,
    out: &mut String,
    depth: usize,
) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Variable { name, escape } => {
                if let Some(value) = lookup(scopes, name) {
                    let text = stringify(value);
                    if *escape {
                        escape_html_into(&text, out);
                    } else {
                        out.push_str(&text);
                    }
                }
            }
            Node::Section {
                name,
                inverted,
                children,
            } => {
                let value = lookup(scopes, name);
                let truthy = value.map(is_truthy).unwrap_or(false);
                if *inverted {
                    if !truthy {
                        render_nodes(children, scopes, partials, out, depth)?;
                    }
                    continue;
                }
                match value {
                    Some(Value::Array(items)) => {
                        for item in items {
                            scopes.push(item);
                            let result = render_nodes(children, scopes, partials, out, depth);
                            scopes.pop();
                            result?;
                        }
                    }
                    Some(value) if value.is_object() => {
                        scopes.push(value);
                        let result = render_nodes(children, scopes, partials, out, depth);
                        scopes.pop();
                        result?;
                    }
                    Some(_) if truthy => render_nodes(children, scopes, partials, out, depth)?,
                    _ => {}
                }
            }
            Node::Partial(name) => {
                if depth >= MAX_PARTIAL_DEPTH {
                    return Err(TemplateError::Parse(format!(
                        "partial '{}' nested deeper than {}",
                        name, MAX_PARTIAL_DEPTH
                    )));
                }
                if let Some(source) = partials.get(name) {
                    let nodes = parse(source)?;
                    render_nodes(&nodes, scopes, partials, out, depth + 1)?;
                }
            }
        }
    }
    Ok(())
}

fn lookup<'a>(scopes: &[&'a Value], name: &str) -> Option<&'a Value> {
    if name == "." {
        return scopes.last().copied();
    }
    let mut parts = name.split('.');
    let first = parts.next()?;
    let mut value = scopes.iter().rev().copied().find_map(|scope| scope.get(first))?;
    for part in parts {
        value = value.get(part)?;
    }
    Some(value)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Number(_) | Value::Object(_) => true,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_html_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
