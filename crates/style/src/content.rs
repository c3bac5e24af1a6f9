//! Tokenizer for the `content` property of generated pseudo-elements.
use crate::parsers::{Separator, split_property};

#[derive(Debug, Clone, PartialEq)]
pub enum ContentToken {
    /// A quoted string with escapes resolved.
    Text(String),
    Counter {
        name: String,
        style: Option<String>,
    },
    Counters {
        name: String,
        separator: String,
        style: Option<String>,
    },
    Attr(String),
    /// Anything else is emitted verbatim.
    Raw(String),
}

fn unquote(s: &str) -> Option<&str> {
    let s = s.trim();
    let first = s.chars().next()?;
    if (first == '"' || first == '\'') && s.len() >= 2 && s.ends_with(first) {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

/// Resolves `\XXXX` (four hex digit) escapes.
fn unescape(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' && i + 4 < chars.len() && chars[i + 1..=i + 4].iter().all(|c| c.is_ascii_hexdigit()) {
            let hex: String = chars[i + 1..=i + 4].iter().collect();
            if let Some(c) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                out.push(c);
                i += 5;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn function_args<'a>(token: &'a str, name: &str) -> Option<&'a str> {
    token
        .trim()
        .strip_prefix(name)?
        .strip_prefix('(')?
        .strip_suffix(')')
}

pub fn parse_content(content: &str) -> Vec<ContentToken> {
    split_property(content, Separator::Whitespace)
        .into_iter()
        .map(|token| {
            if let Some(text) = unquote(&token) {
                return ContentToken::Text(unescape(text));
            }
            if let Some(args) = function_args(&token, "counters") {
                let mut parts = split_property(args, Separator::Comma).into_iter();
                let name = parts.next().unwrap_or_default();
                let separator = parts.next().unwrap_or_default();
                let separator = unquote(&separator).map(str::to_string).unwrap_or(separator);
                return ContentToken::Counters {
                    name,
                    separator,
                    style: parts.next(),
                };
            }
            if let Some(args) = function_args(&token, "counter") {
                let mut parts = split_property(args, Separator::Comma).into_iter();
                return ContentToken::Counter {
                    name: parts.next().unwrap_or_default(),
                    style: parts.next(),
                };
            }
            if let Some(args) = function_args(&token, "attr") {
                return ContentToken::Attr(args.trim().to_string());
            }
            ContentToken::Raw(token)
        })
        .collect()
}
