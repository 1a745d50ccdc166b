//! Line templates with `{token}` placeholders.
//!
//! A template is parsed once, when it is configured, into literal text and [`Token`]s.
//! Parsing never fails: anything that is not a recognized token (an unknown name, an
//! unterminated `{`, a stray `}`) is kept as literal text. `{{` and `}}` escape braces.

use std::{fmt, str::FromStr};

use compact_str::CompactString;

/// A placeholder that the renderer expands from the bar's state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Token {
    /// `{bar}`: the glyph bar, stretched over the width left by the rest of the line.
    Bar,
    /// `{percent}`: completion percentage.
    Percent,
    /// `{counter}`: `current / total`.
    Counter,
    /// `{pos}` or `{current}`: the current count.
    Pos,
    /// `{total}` or `{len}`: the total count.
    Total,
    /// `{elapsed}`: time since start.
    Elapsed,
    /// `{eta}` or `{time_left}`: estimated time remaining.
    Eta,
    /// `{speed}`: average items (or bytes) per second.
    Speed,
    /// `{msg}` or `{message}`: the bar's message.
    Message,
    /// `{spinner}` or `{tick}`: the current tick glyph.
    Spinner,
}

impl Token {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bar" => Self::Bar,
            "percent" => Self::Percent,
            "counter" => Self::Counter,
            "pos" | "current" => Self::Pos,
            "total" | "len" => Self::Total,
            "elapsed" => Self::Elapsed,
            "eta" | "time_left" => Self::Eta,
            "speed" => Self::Speed,
            "msg" | "message" => Self::Message,
            "spinner" | "tick" => Self::Spinner,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Segment {
    Literal(CompactString),
    Token(Token),
}

/// A parsed line template.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(from = "CompactString", into = "CompactString")
)]
pub struct Template {
    source: CompactString,
    segments: Vec<Segment>,
}

impl Template {
    /// Parses `source`. Unrecognized placeholders are kept verbatim.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = CompactString::default();
        let mut rest = source;

        while let Some(at) = rest.find(['{', '}']) {
            literal.push_str(&rest[..at]);
            let tail = &rest[at..];

            if tail.starts_with("{{") {
                literal.push('{');
                rest = &tail[2..];
                continue;
            }
            if tail.starts_with('}') {
                literal.push('}');
                rest = if tail.starts_with("}}") { &tail[2..] } else { &tail[1..] };
                continue;
            }

            // `tail` starts with a single '{': look for the closing brace before any other
            // opening one.
            match tail[1..].find(['{', '}']) {
                Some(end) if tail.as_bytes()[end + 1] == b'}' => {
                    let name = &tail[1..=end];
                    if let Some(token) = Token::from_name(name) {
                        if !literal.is_empty() {
                            segments.push(Segment::Literal(std::mem::take(&mut literal)));
                        }
                        segments.push(Segment::Token(token));
                    } else {
                        literal.push_str(&tail[..end + 2]);
                    }
                    rest = &tail[end + 2..];
                }
                _ => {
                    literal.push('{');
                    rest = &tail[1..];
                }
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            source: source.into(),
            segments,
        }
    }

    /// Returns the template text as configured.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns `true` if the template contains the given token.
    #[must_use]
    pub fn contains(&self, token: Token) -> bool {
        self.segments
            .iter()
            .any(|segment| *segment == Segment::Token(token))
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl From<&str> for Template {
    fn from(source: &str) -> Self {
        Self::parse(source)
    }
}

impl From<CompactString> for Template {
    fn from(source: CompactString) -> Self {
        Self::parse(&source)
    }
}

impl From<Template> for CompactString {
    fn from(template: Template) -> Self {
        template.source
    }
}

impl FromStr for Template {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
