//! Path templates with `{name}` placeholders.

use std::collections::BTreeSet;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::{ApiError, Result};

/// Characters escaped when a value is substituted into a single path
/// segment. Everything else passes through untouched.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed path such as `/todos/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(raw: &str) -> Result<Self> {
        if !raw.starts_with('/') {
            return Err(ApiError::config(format!(
                "path template `{raw}` must start with '/'"
            )));
        }

        if raw.split('/').any(is_dot_segment) {
            return Err(ApiError::config(format!(
                "path template `{raw}` contains a dot segment"
            )));
        }

        let mut segments = Vec::new();
        let mut seen = BTreeSet::new();
        let mut literal = String::new();
        let mut chars = raw.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        match c {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => {
                                return Err(ApiError::config(format!(
                                    "nested '{{' in path template `{raw}`"
                                )))
                            }
                            c => name.push(c),
                        }
                    }
                    if !closed {
                        return Err(ApiError::config(format!(
                            "unclosed placeholder in path template `{raw}`"
                        )));
                    }
                    let name = name.trim().to_string();
                    if name.is_empty() {
                        return Err(ApiError::config(format!(
                            "empty placeholder in path template `{raw}`"
                        )));
                    }
                    if !seen.insert(name.clone()) {
                        return Err(ApiError::config(format!(
                            "placeholder `{name}` appears twice in path template `{raw}`"
                        )));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' => {
                    return Err(ApiError::config(format!(
                        "unmatched '}}' in path template `{raw}`"
                    )))
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in the order they appear.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every placeholder with the value returned by `lookup`.
    ///
    /// Values are percent-encoded as a single path segment; literal text is
    /// copied as written. Returns the name of the first placeholder `lookup`
    /// has no value for.
    pub fn expand<F>(&self, lookup: F) -> std::result::Result<String, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut out = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = lookup(name).ok_or_else(|| name.clone())?;
                    out.extend(utf8_percent_encode(&value, PATH_SEGMENT));
                }
            }
        }
        Ok(out)
    }
}

/// `.` and `..` are resolved away by URL normalization.
pub(crate) fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}
