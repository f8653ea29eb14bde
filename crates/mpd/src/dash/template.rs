// References:
// 1. https://github.com/clitic/vsd/blob/30ca1985e4a467ea3304b11c08d3176deaafd22a/vsd/src/dash/template.rs
// 2. https://github.com/emarsden/dash-mpd-rs/blob/6ebdfb4759adbda8233b5b3520804e23ff86e7de/src/fetch.rs#L435-L466

use regex::Regex;
use std::{collections::HashMap, sync::LazyLock};

// From https://dashif.org/docs/DASH-IF-IOP-v4.3.pdf:
// "For the avoidance of doubt, only %0[width]d is permitted and no other identifiers. The reason
// is that such a string replacement can be easily implemented without requiring a specific library."
//
// Example template: "$RepresentationID$/$Number%06d$.m4s"
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)(?:%0?(\d+)d)?$").unwrap());

/// Values bound to template identifiers for one segment.
#[derive(Debug, Clone, Default)]
pub struct Template {
    args: HashMap<&'static str, String>,
}

impl Template {
    pub const REPRESENTATION_ID: &'static str = "RepresentationID";
    pub const NUMBER: &'static str = "Number";
    pub const TIME: &'static str = "Time";
    pub const BANDWIDTH: &'static str = "Bandwidth";

    /// Identifiers a media template may defer to segment enumeration.
    pub const MEDIA_IDENTIFIERS: &'static [&'static str] =
        &[Self::NUMBER, Self::BANDWIDTH, Self::TIME];
    /// Identifiers an initialization template may use.
    pub const INITIALIZATION_IDENTIFIERS: &'static [&'static str] = &[Self::BANDWIDTH];

    pub fn new() -> Self {
        Self {
            args: HashMap::with_capacity(4),
        }
    }

    pub fn insert(&mut self, key: &'static str, value: String) -> &mut Self {
        self.args.insert(key, value);
        self
    }

    pub fn insert_optional(&mut self, key: &'static str, value: Option<String>) -> &mut Self {
        if let Some(value) = value {
            self.args.insert(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    Slot {
        identifier: &'static str,
        width: Option<usize>,
        /// The `$...$` text as written, kept for unresolved slots.
        raw: String,
    },
}

/// Result of scanning a template: literal runs and raw `$...$` bodies.
#[derive(Debug, PartialEq)]
enum Lexeme<'a> {
    Text(String),
    Placeholder(&'a str),
}

/// Two-state scanner over `$`-delimited placeholders.
///
/// `$$` produces a single literal `$`. Everything outside a placeholder,
/// `%` included, is copied verbatim. An unterminated placeholder is literal text.
fn scan(template: &str) -> Vec<Lexeme<'_>> {
    enum State {
        Outside,
        Inside { start: usize },
    }

    let mut lexemes = Vec::new();
    let mut text = String::new();
    let mut state = State::Outside;

    for (index, c) in template.char_indices() {
        match state {
            State::Outside if c == '$' => state = State::Inside { start: index + 1 },
            State::Outside => text.push(c),
            State::Inside { start } if c == '$' => {
                if start == index {
                    text.push('$');
                } else {
                    if !text.is_empty() {
                        lexemes.push(Lexeme::Text(std::mem::take(&mut text)));
                    }
                    lexemes.push(Lexeme::Placeholder(&template[start..index]));
                }
                state = State::Outside;
            }
            State::Inside { .. } => {}
        }
    }

    if let State::Inside { start } = state {
        text.push('$');
        text.push_str(&template[start..]);
    }
    if !text.is_empty() {
        lexemes.push(Lexeme::Text(text));
    }

    lexemes
}

fn push_literal(tokens: &mut Vec<Token>, s: &str) {
    match tokens.last_mut() {
        Some(Token::Literal(last)) => last.push_str(s),
        _ => tokens.push(Token::Literal(s.to_string())),
    }
}

fn pad(value: &str, width: Option<usize>) -> String {
    match width {
        Some(width) => format!("{value:0>width$}"),
        None => value.to_string(),
    }
}

/// A segment template with `$RepresentationID$` already substituted and the
/// remaining identifiers kept as deferred slots.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateUrl {
    tokens: Vec<Token>,
}

/// An allowed identifier without a bound value.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedSlot {
    pub identifier: &'static str,
    /// The address with every unresolved slot left as written.
    pub partial: String,
}

impl TemplateUrl {
    /// Parses `template`, recognizing only `identifiers` (plus `RepresentationID`)
    /// as placeholders.
    pub fn parse(template: &str, identifiers: &[&'static str], representation_id: &str) -> Self {
        let mut tokens: Vec<Token> = Vec::new();

        for lexeme in scan(template) {
            let body = match lexeme {
                Lexeme::Text(text) => {
                    push_literal(&mut tokens, &text);
                    continue;
                }
                Lexeme::Placeholder(body) => body,
            };

            let Some(caps) = PLACEHOLDER_REGEX.captures(body) else {
                push_literal(&mut tokens, &format!("${body}$"));
                continue;
            };
            let name = caps.get(1).map_or("", |m| m.as_str());
            let width = caps.get(2).and_then(|m| m.as_str().parse().ok());

            if name == Template::REPRESENTATION_ID {
                push_literal(&mut tokens, &pad(representation_id, width));
            } else if let Some(identifier) = identifiers.iter().find(|i| **i == name).copied() {
                tokens.push(Token::Slot {
                    identifier,
                    width,
                    raw: format!("${body}$"),
                });
            } else {
                push_literal(&mut tokens, &format!("${body}$"));
            }
        }

        Self { tokens }
    }

    /// Fills every slot from `args`.
    pub fn resolve(&self, args: &Template) -> Result<String, UnresolvedSlot> {
        let mut output = String::new();
        let mut missing = None;

        for token in self.tokens.iter() {
            match token {
                Token::Literal(text) => output.push_str(text),
                Token::Slot {
                    identifier,
                    width,
                    raw,
                } => match args.get(identifier) {
                    Some(value) => output.push_str(&pad(value, *width)),
                    None => {
                        missing.get_or_insert(*identifier);
                        output.push_str(raw);
                    }
                },
            }
        }

        match missing {
            Some(identifier) => Err(UnresolvedSlot {
                identifier,
                partial: output,
            }),
            None => Ok(output),
        }
    }
}
