//! Closed prompt template format.
//!
//! A template is literal text with `{name}` placeholders. `{{` and `}}` stand
//! for literal braces. Nothing else is interpreted: no format specs, no
//! attribute access, no expressions. Templates are parsed once and rendered
//! many times.

use std::collections::{BTreeMap, HashMap};
use thiserror::Error;


#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unclosed '{{' at byte {0}")]
    UnclosedPlaceholder(usize),
    #[error("unmatched '}}' at byte {0}")]
    UnmatchedClose(usize),
    #[error("empty placeholder at byte {0}")]
    EmptyPlaceholder(usize),
    #[error("invalid placeholder name '{name}' at byte {position}")]
    InvalidName { name: String, position: usize },
    #[error("partial variable '{0}' does not appear in the template")]
    UnknownPartial(String),
    #[error("no value bound for placeholder '{0}'")]
    MissingValue(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var(String),
}

/// A parsed prompt template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
    partials: BTreeMap<String, String>,
}

impl PromptTemplate {
    /// Parse a template string
    pub fn parse(source: impl Into<String>) -> Result<Self, TemplateError> {
        let source = source.into();
        let segments = parse_segments(&source)?;
        Ok(Self {
            source,
            segments,
            partials: BTreeMap::new(),
        })
    }

    /// Fix a placeholder to a constant value. The placeholder stops being a
    /// variable of the template.
    pub fn with_partial(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, TemplateError> {
        let name = name.into();
        let known = self
            .segments
            .iter()
            .any(|s| matches!(s, Segment::Var(v) if *v == name));
        if !known {
            return Err(TemplateError::UnknownPartial(name));
        }
        self.partials.insert(name, value.into());
        Ok(self)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn partials(&self) -> &BTreeMap<String, String> {
        &self.partials
    }

    /// Placeholder names that still need a value, in order of first appearance
    pub fn variables(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Var(name) = segment {
                if !self.partials.contains_key(name) && !seen.contains(&name.as_str()) {
                    seen.push(name);
                }
            }
        }
        seen
    }

    /// Substitute every placeholder. Values are inserted verbatim.
    pub fn render(&self, values: &HashMap<String, String>) -> Result<String, TemplateError> {
        self.render_with(|name| values.get(name).map(String::as_str))
    }

    /// Render with an arbitrary lookup
    pub fn render_with<'v, F>(&self, lookup: F) -> Result<String, TemplateError>
    where
        F: Fn(&str) -> Option<&'v str>,
    {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Var(name) => {
                    let value = match self.partials.get(name) {
                        Some(v) => v.as_str(),
                        None => lookup(name).ok_or_else(|| TemplateError::MissingValue(name.clone()))?,
                    };
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

impl std::fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_segments(source: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = source.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    literal.push('{');
                    continue;
                }
                let mut name = String::new();
                let mut closed = false;
                for (_, nc) in chars.by_ref() {
                    if nc == '}' {
                        closed = true;
                        break;
                    }
                    name.push(nc);
                }
                if !closed {
                    return Err(TemplateError::UnclosedPlaceholder(pos));
                }
                // names are taken as written; `{ name }` is not `{name}`
                if name.is_empty() {
                    return Err(TemplateError::EmptyPlaceholder(pos));
                }
                if !is_identifier(&name) {
                    return Err(TemplateError::InvalidName { name, position: pos });
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Var(name));
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    literal.push('}');
                } else {
                    return Err(TemplateError::UnmatchedClose(pos));
                }
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
