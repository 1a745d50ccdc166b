//! Turns a [`BarSnapshot`] and a [`Style`] into one line of text.
//!
//! Tokens other than `{bar}` are expanded first; the bar then takes whatever width the
//! rest of the line leaves (split evenly if the template has several). The result is
//! truncated or padded with spaces to exactly the line width so a shorter line fully
//! covers a longer previous one.

use std::borrow::Cow;

use compact_str::{CompactString, format_compact};
use console::{Alignment, measure_text_width, pad_str};

use crate::{
    progress::BarSnapshot,
    style::{BarGlyphs, Style},
    template::{Segment, Token},
    units::{Units, format_duration},
};

/// Line width used when neither the bar nor the terminal provides one.
pub(crate) const DEFAULT_WIDTH: usize = 80;

enum Piece<'a> {
    Text(Cow<'a, str>),
    Bar,
}

/// Renders the full line for `snapshot`.
pub(crate) fn render_line(snapshot: &BarSnapshot, style: &Style, width: usize) -> String {
    let template = style.template_for(snapshot.total() == 0);

    let mut bars = 0;
    let pieces: Vec<Piece<'_>> = template
        .segments()
        .iter()
        .map(|segment| match segment {
            Segment::Literal(text) => Piece::Text(Cow::Borrowed(text.as_str())),
            Segment::Token(Token::Bar) => {
                bars += 1;
                Piece::Bar
            }
            Segment::Token(token) => {
                Piece::Text(Cow::Owned(expand(*token, snapshot, style.units).into()))
            }
        })
        .collect();

    let bar = if bars == 0 {
        String::new()
    } else {
        let used: usize = pieces
            .iter()
            .map(|piece| match piece {
                Piece::Text(text) => measure_text_width(text),
                Piece::Bar => 0,
            })
            .sum();
        draw_bar(snapshot, &style.bar, width.saturating_sub(used) / bars)
    };

    let mut line = String::with_capacity(width);
    for piece in &pieces {
        match piece {
            Piece::Text(text) => line.push_str(text),
            Piece::Bar => line.push_str(&bar),
        }
    }

    fit(&line, width)
}

/// Truncates or pads `line` to exactly `width` columns on a single screen line.
///
/// Control characters other than the escape that starts a color sequence become spaces.
pub(crate) fn fit(line: &str, width: usize) -> String {
    let line: Cow<'_, str> = if line.chars().any(breaks_line) {
        Cow::Owned(
            line.chars()
                .map(|c| if breaks_line(c) { ' ' } else { c })
                .collect(),
        )
    } else {
        Cow::Borrowed(line)
    };
    pad_str(&line, width, Alignment::Left, Some("")).into_owned()
}

fn breaks_line(c: char) -> bool {
    c.is_control() && c != '\x1b'
}

fn expand(token: Token, snapshot: &BarSnapshot, units: Units) -> CompactString {
    let indeterminate = snapshot.total() == 0;

    match token {
        Token::Bar => CompactString::default(),
        Token::Percent if indeterminate => CompactString::default(),
        Token::Percent => format_compact!("{:.2} %", snapshot.fraction() * 100.0),
        Token::Counter if indeterminate => units.format(snapshot.current()),
        Token::Counter => format_compact!(
            "{} / {}",
            units.format(snapshot.current()),
            units.format(snapshot.total())
        ),
        Token::Pos => units.format(snapshot.current()),
        Token::Total => units.format(snapshot.total()),
        Token::Elapsed => format_duration(snapshot.elapsed()),
        Token::Eta if indeterminate => CompactString::default(),
        Token::Eta => snapshot
            .eta()
            .map_or_else(|| CompactString::from("?"), format_duration),
        Token::Speed => units.format_rate(snapshot.speed()),
        Token::Message => snapshot.message().into(),
        Token::Spinner => snapshot.spinner().into(),
    }
}

/// Draws `start fill.. head empty.. end` in `size` columns.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn draw_bar(snapshot: &BarSnapshot, glyphs: &BarGlyphs, size: usize) -> String {
    let edges = measure_text_width(&glyphs.start) + measure_text_width(&glyphs.end);
    if size <= edges {
        return String::new();
    }
    let inner = size - edges;
    let filled = ((snapshot.fraction() * inner as f64).floor() as usize).min(inner);

    let mut bar = String::with_capacity(size * glyphs.fill.len().max(1));
    bar.push_str(&glyphs.start);
    if snapshot.total() == 0 {
        bar.push_str(&glyphs.empty.repeat(inner));
    } else if filled == inner {
        bar.push_str(&glyphs.fill.repeat(inner));
    } else {
        bar.push_str(&glyphs.fill.repeat(filled));
        bar.push_str(&glyphs.head);
        bar.push_str(&glyphs.empty.repeat(inner - filled - 1));
    }
    bar.push_str(&glyphs.end);
    bar
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{fit, render_line};
    use crate::{
        progress::BarSnapshot,
        style::{BarGlyphs, Style},
        units::Units,
    };

    fn snapshot(current: u64, total: u64) -> BarSnapshot {
        BarSnapshot {
            current,
            total,
            elapsed: Duration::from_secs(10),
            spinner: "|".into(),
            ..BarSnapshot::default()
        }
    }

    fn style(template: &str) -> Style {
        Style {
            template: Some(template.into()),
            ..Style::default()
        }
    }

    #[test]
    fn test_bar_fills_remaining_width() {
        let line = render_line(&snapshot(50, 100), &style("{bar} x"), 14);
        assert_eq!(line, "[=====>----] x");
        assert_eq!(line.chars().count(), 14);
    }

    /// Bar Extremes
    /// Empty and full bars, and a bar with no room at all.
    #[test]
    fn test_bar_extremes() {
        assert_eq!(render_line(&snapshot(0, 10), &style("{bar}"), 7), "[>----]");
        assert_eq!(render_line(&snapshot(10, 10), &style("{bar}"), 7), "[=====]");
        assert_eq!(
            render_line(&snapshot(3, 10), &style("0123456789{bar}"), 10),
            "0123456789"
        );
    }

    #[test]
    fn test_custom_glyphs() {
        let mut s = style("{bar}");
        s.bar = BarGlyphs::parse("|#>.|").unwrap();
        assert_eq!(render_line(&snapshot(5, 10), &s, 8), "|###>..|");
    }

    /// Token Expansion
    /// Counter, percent, ETA and speed in both unit systems.
    #[test]
    fn test_token_expansion() {
        let line = render_line(
            &snapshot(25, 100),
            &style("{counter} {percent} {eta} {speed} {elapsed}"),
            60,
        );
        assert_eq!(line.trim_end(), "25 / 100 25.00 % 30s 2.50/s 10s");

        let mut bytes = style("{pos} of {total}");
        bytes.units = Units::Bytes;
        let line = render_line(&snapshot(512, 1_048_576), &bytes, 40);
        assert_eq!(line.trim_end(), "512 B of 1.00 MiB");
    }

    #[test]
    fn test_unknown_eta() {
        let line = render_line(&snapshot(0, 100), &style("eta {eta}"), 10);
        assert_eq!(line.trim_end(), "eta ?");
    }

    /// Spinner Mode
    /// The default layout without a total shows the spinner and no bar.
    #[test]
    fn test_indeterminate_default_layout() {
        let mut snap = snapshot(7, 0);
        snap.message = "scan: ".into();
        let line = render_line(&snap, &Style::default(), 40);
        assert_eq!(line.trim_end(), "scan: | 7 0.70/s 10s");

        let line = render_line(&snap, &style("[{bar}]{percent}{eta}"), 10);
        assert_eq!(line.trim_end(), "[[------]]");
    }

    #[test]
    fn test_literal_passthrough() {
        let line = render_line(&snapshot(1, 2), &style("{what} {pos}"), 12);
        assert_eq!(line, "{what} 1    ");
    }

    #[test]
    fn test_fit() {
        assert_eq!(fit("abcdef", 3), "abc");
        assert_eq!(fit("ab", 4), "ab  ");
    }

    /// Single Line
    /// Line breaks in the message or template never split the rendered line.
    #[test]
    fn test_line_breaks_become_spaces() {
        assert_eq!(fit("x\ny\r\tz", 8), "x y  z  ");

        let mut snap = snapshot(1, 2);
        snap.message = "x\ny".into();
        let line = render_line(&snap, &style("{msg}\r{pos}"), 6);
        assert_eq!(line, "x y 1 ");
    }
}
