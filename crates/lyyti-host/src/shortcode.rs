//! Shortcode parsing and expansion.
//!
//! Content may embed placeholders such as
//! `[lyyti-participant-count eid="123" status='reactedyes,show']`. The
//! registry replaces every placeholder whose tag has a registered handler
//! with the handler's output. Supported forms:
//!
//! - `[tag]`, `[tag /]`
//! - `[tag a="x" b='y' c=z]` (attribute names are case-insensitive)
//! - `[[tag]]` renders as the literal text `[tag]`
//!
//! Unregistered tags and malformed brackets are left untouched. Enclosing
//! shortcodes (`[tag]...[/tag]`) are not supported.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Attributes passed to a shortcode handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortcodeAttributes {
    named: HashMap<String, String>,
}

impl ShortcodeAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper to add a named attribute.
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.named.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Parse the attribute part of a shortcode (everything after the tag).
    pub fn parse(input: &str) -> Self {
        let bytes = input.as_bytes();
        let len = bytes.len();
        let mut attrs = Self::default();
        let mut i = 0;

        loop {
            while i < len && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= len {
                break;
            }

            // Values without a name are skipped.
            if is_quote(bytes[i]) {
                let (_, next) = read_quoted(input, i);
                i = next;
                continue;
            }

            let start = i;
            while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
                i += 1;
            }
            let name = &input[start..i];
            if name.is_empty() {
                // Stray '=' with no attribute name.
                i += 1;
                continue;
            }

            let mut j = i;
            while j < len && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < len && bytes[j] == b'=' {
                j += 1;
                while j < len && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                let value = if j < len && is_quote(bytes[j]) {
                    let (value, next) = read_quoted(input, j);
                    i = next;
                    value
                } else {
                    let value_start = j;
                    while j < len && !bytes[j].is_ascii_whitespace() {
                        j += 1;
                    }
                    i = j;
                    &input[value_start..j]
                };
                attrs
                    .named
                    .insert(name.to_ascii_lowercase(), value.to_string());
            }
        }

        attrs
    }

    /// Get a named attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.named
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Resolve the effective value for every key in `defaults`.
    ///
    /// A caller-supplied attribute wins whenever it is present, even when it
    /// is empty. Attributes that have no default are dropped.
    pub fn with_defaults<I, K>(&self, defaults: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (K, String)>,
        K: AsRef<str>,
    {
        defaults
            .into_iter()
            .map(|(key, default)| {
                let key = key.as_ref().to_ascii_lowercase();
                let value = self.named.get(&key).cloned().unwrap_or(default);
                (key, value)
            })
            .collect()
    }
}

fn is_quote(byte: u8) -> bool {
    byte == b'"' || byte == b'\''
}

/// Read a quoted value starting at the opening quote `start`.
///
/// Returns the unquoted value and the index just past the closing quote. An
/// unterminated quote runs to the end of input.
fn read_quoted(input: &str, start: usize) -> (&str, usize) {
    let quote = input.as_bytes()[start] as char;
    let value_start = start + 1;
    match input[value_start..].find(quote) {
        Some(offset) => {
            let end = value_start + offset;
            (&input[value_start..end], end + 1)
        }
        None => (&input[value_start..], input.len()),
    }
}

/// Split the inside of a `[...]` into tag and attributes.
fn parse_tag(inner: &str) -> Option<(&str, ShortcodeAttributes)> {
    let inner = inner.trim();
    let inner = inner.strip_suffix('/').unwrap_or(inner).trim_end();
    let tag_end = inner
        .find(|c: char| c.is_whitespace())
        .unwrap_or(inner.len());
    let tag = &inner[..tag_end];

    let valid = !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return None;
    }

    Some((tag, ShortcodeAttributes::parse(&inner[tag_end..])))
}

/// Find the `]` closing a bracket opened before `from`, ignoring brackets
/// inside quoted attribute values. A nested `[` aborts the match.
fn find_closing(input: &str, from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (offset, &byte) in input.as_bytes()[from..].iter().enumerate() {
        match quote {
            Some(q) if byte == q => quote = None,
            Some(_) => {}
            None if is_quote(byte) => quote = Some(byte),
            None if byte == b']' => return Some(from + offset),
            None if byte == b'[' => return None,
            None => {}
        }
    }
    None
}

/// Renders a shortcode into display text.
///
/// Rendering never fails: handlers report problems in-band in the returned
/// string.
#[async_trait]
pub trait ShortcodeHandler: Send + Sync {
    async fn render(&self, attributes: &ShortcodeAttributes) -> String;
}

enum Match<'a> {
    Escaped { literal: &'a str, len: usize },
    Shortcode {
        handler: &'a Arc<dyn ShortcodeHandler>,
        attributes: ShortcodeAttributes,
        len: usize,
    },
}

/// Registry of shortcode handlers keyed by tag.
#[derive(Default)]
pub struct ShortcodeRegistry {
    handlers: HashMap<String, Arc<dyn ShortcodeHandler>>,
}

impl ShortcodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `tag`, replacing any previous handler.
    pub fn register(&mut self, tag: impl Into<String>, handler: Arc<dyn ShortcodeHandler>) {
        let tag = tag.into();
        debug!(tag = %tag, "Registered shortcode");
        self.handlers.insert(tag, handler);
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// Render a single shortcode directly, bypassing content parsing.
    pub async fn render(&self, tag: &str, attributes: &ShortcodeAttributes) -> Option<String> {
        match self.handlers.get(tag) {
            Some(handler) => Some(handler.render(attributes).await),
            None => None,
        }
    }

    /// Expand every registered shortcode in `content`.
    ///
    /// Shortcodes are rendered one after another, in document order.
    pub async fn expand(&self, content: &str) -> String {
        let mut out = String::with_capacity(content.len());
        let mut rest = content;

        while let Some(start) = rest.find('[') {
            out.push_str(&rest[..start]);
            let candidate = &rest[start..];

            match self.match_at(candidate) {
                Some(Match::Escaped { literal, len }) => {
                    out.push_str(literal);
                    rest = &candidate[len..];
                }
                Some(Match::Shortcode {
                    handler,
                    attributes,
                    len,
                }) => {
                    out.push_str(&handler.render(&attributes).await);
                    rest = &candidate[len..];
                }
                None => {
                    out.push('[');
                    rest = &candidate[1..];
                }
            }
        }

        out.push_str(rest);
        out
    }

    /// Try to match a shortcode at the start of `candidate` (which begins
    /// with `[`).
    fn match_at<'a>(&'a self, candidate: &'a str) -> Option<Match<'a>> {
        if candidate.starts_with("[[") {
            let end = find_closing(candidate, 2)?;
            if !candidate[end + 1..].starts_with(']') {
                return None;
            }
            let (tag, _) = parse_tag(&candidate[2..end])?;
            if !self.contains(tag) {
                return None;
            }
            return Some(Match::Escaped {
                literal: &candidate[1..=end],
                len: end + 2,
            });
        }

        let end = find_closing(candidate, 1)?;
        let (tag, attributes) = parse_tag(&candidate[1..end])?;
        let handler = self.handlers.get(tag)?;
        Some(Match::Shortcode {
            handler,
            attributes,
            len: end + 1,
        })
    }
}
