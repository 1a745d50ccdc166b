//! Display configuration for a progress bar.
//!
//! [`Style`] is plain data: it can be built up front (or deserialized, with the `serde`
//! feature) and handed to a [`ProgressBarBuilder`](crate::ProgressBarBuilder), or
//! adjusted on a live bar through the configuration methods of
//! [`ProgressBar`](crate::ProgressBar).

use std::{borrow::Cow, time::Duration};

use compact_str::{CompactString, ToCompactString};

use crate::{template::Template, units::Units};

/// Minimum interval between two renders unless configured otherwise.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// The five glyphs a bar is drawn with: `start fill head empty end`, e.g. `[==>--]`.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BarGlyphs {
    /// Left edge.
    pub start: CompactString,
    /// Completed portion.
    pub fill: CompactString,
    /// Boundary between completed and remaining.
    pub head: CompactString,
    /// Remaining portion.
    pub empty: CompactString,
    /// Right edge.
    pub end: CompactString,
}

impl BarGlyphs {
    /// Parses glyphs from a string of at least five characters, e.g. `"[=>-]"`.
    ///
    /// Returns `None` when fewer than five characters are given. Extra characters are
    /// ignored.
    #[must_use]
    pub fn parse(glyphs: &str) -> Option<Self> {
        let mut chars = glyphs.chars().map(|c| c.to_compact_string());
        Some(Self {
            start: chars.next()?,
            fill: chars.next()?,
            head: chars.next()?,
            empty: chars.next()?,
            end: chars.next()?,
        })
    }
}

impl Default for BarGlyphs {
    fn default() -> Self {
        Self {
            start: "[".into(),
            fill: "=".into(),
            head: ">".into(),
            empty: "-".into(),
            end: "]".into(),
        }
    }
}

/// The spinner glyphs cycled by [`ProgressBar::tick`](crate::ProgressBar::tick).
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickGlyphs(Vec<CompactString>);

impl TickGlyphs {
    /// One glyph per character of `glyphs`. Returns `None` for an empty string.
    #[must_use]
    pub fn parse(glyphs: &str) -> Option<Self> {
        let glyphs: Vec<_> = glyphs.chars().map(|c| c.to_compact_string()).collect();
        (!glyphs.is_empty()).then_some(Self(glyphs))
    }

    /// Returns the glyph for the given tick count.
    #[must_use]
    pub fn glyph(&self, tick: usize) -> &str {
        self.0
            .get(tick % self.0.len().max(1))
            .map_or("", CompactString::as_str)
    }

    /// Number of glyphs in the cycle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no glyphs, which only a deserialized value can have.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for TickGlyphs {
    fn default() -> Self {
        Self(vec!["\\".into(), "|".into(), "/".into(), "-".into()])
    }
}

/// A component of the default line layout.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Component {
    /// The message prefix.
    Message,
    /// The spinner glyph (always shown for bars without a total).
    Tick,
    /// `current / total`.
    Counter,
    /// The glyph bar.
    Bar,
    /// The completion percentage.
    Percent,
    /// Items (or bytes) per second.
    Speed,
    /// Time remaining (elapsed time for bars without a total).
    TimeLeft,
}

/// Which components the default layout shows.
///
/// Only used when no explicit template is set.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(clippy::struct_excessive_bools)]
pub struct Components {
    /// See [`Component::Message`].
    pub message: bool,
    /// See [`Component::Tick`].
    pub tick: bool,
    /// See [`Component::Counter`].
    pub counter: bool,
    /// See [`Component::Bar`].
    pub bar: bool,
    /// See [`Component::Percent`].
    pub percent: bool,
    /// See [`Component::Speed`].
    pub speed: bool,
    /// See [`Component::TimeLeft`].
    pub time_left: bool,
}

impl Default for Components {
    fn default() -> Self {
        Self {
            message: true,
            tick: false,
            counter: true,
            bar: true,
            percent: true,
            speed: true,
            time_left: true,
        }
    }
}

impl Components {
    /// Shows or hides one component.
    pub fn set(&mut self, component: Component, visible: bool) {
        let flag = match component {
            Component::Message => &mut self.message,
            Component::Tick => &mut self.tick,
            Component::Counter => &mut self.counter,
            Component::Bar => &mut self.bar,
            Component::Percent => &mut self.percent,
            Component::Speed => &mut self.speed,
            Component::TimeLeft => &mut self.time_left,
        };
        *flag = visible;
    }

    /// Builds the layout for these components.
    ///
    /// `indeterminate` bars (total of zero) get a spinner and the elapsed time in place of
    /// the bar, percentage and time remaining.
    #[must_use]
    pub fn template(&self, indeterminate: bool) -> Template {
        let mut parts = Vec::with_capacity(6);
        if self.tick || indeterminate {
            parts.push("{spinner}");
        }
        if self.counter {
            parts.push("{counter}");
        }
        if !indeterminate {
            if self.bar {
                parts.push("{bar}");
            }
            if self.percent {
                parts.push("{percent}");
            }
        }
        if self.speed {
            parts.push("{speed}");
        }
        if self.time_left {
            parts.push(if indeterminate { "{elapsed}" } else { "{eta}" });
        }

        let body = parts.join(" ");
        if self.message {
            Template::parse(&format!("{{msg}}{body}"))
        } else {
            Template::parse(&body)
        }
    }
}

/// Complete display configuration of a bar.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Style {
    /// Explicit line template; `None` uses the layout from [`show`](Self::show).
    pub template: Option<Template>,
    /// Bar glyphs.
    pub bar: BarGlyphs,
    /// Spinner glyphs.
    pub ticks: TickGlyphs,
    /// Fixed line width; `None` follows the terminal.
    pub width: Option<usize>,
    /// Count display units.
    pub units: Units,
    /// Minimum time between renders; zero renders on every update.
    pub refresh_interval: Duration,
    /// Components of the default layout.
    pub show: Components,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            template: None,
            bar: BarGlyphs::default(),
            ticks: TickGlyphs::default(),
            width: None,
            units: Units::default(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            show: Components::default(),
        }
    }
}

impl Style {
    /// The template used to render a bar, given whether it has a total.
    pub(crate) fn template_for(&self, indeterminate: bool) -> Cow<'_, Template> {
        self.template.as_ref().map_or_else(
            || Cow::Owned(self.show.template(indeterminate)),
            Cow::Borrowed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{BarGlyphs, Component, Components, Style, TickGlyphs};

    #[test]
    fn test_bar_glyphs() {
        let glyphs = BarGlyphs::parse("╢▌▌░╟").unwrap();
        assert_eq!(glyphs.start, "╢");
        assert_eq!(glyphs.empty, "░");
        assert_eq!(glyphs.end, "╟");

        assert!(BarGlyphs::parse("[=>]").is_none());
        assert_eq!(BarGlyphs::parse("[=>-]").unwrap(), BarGlyphs::default());
    }

    #[test]
    fn test_tick_glyphs_cycle() {
        let ticks = TickGlyphs::parse("ab").unwrap();
        assert_eq!(ticks.glyph(0), "a");
        assert_eq!(ticks.glyph(1), "b");
        assert_eq!(ticks.glyph(2), "a");
        assert!(TickGlyphs::parse("").is_none());
    }

    /// Default Layout
    /// The layout follows the visible components and switches shape without a total.
    #[test]
    fn test_default_layout() {
        let mut show = Components::default();
        assert_eq!(
            show.template(false).as_str(),
            "{msg}{counter} {bar} {percent} {speed} {eta}"
        );
        assert_eq!(
            show.template(true).as_str(),
            "{msg}{spinner} {counter} {speed} {elapsed}"
        );

        show.set(Component::Speed, false);
        show.set(Component::Message, false);
        show.set(Component::Tick, true);
        assert_eq!(
            show.template(false).as_str(),
            "{spinner} {counter} {bar} {percent} {eta}"
        );
    }

    #[test]
    fn test_explicit_template_wins() {
        let style = Style {
            template: Some("{pos}".into()),
            ..Style::default()
        };
        assert_eq!(style.template_for(true).as_str(), "{pos}");
        assert_eq!(style.template_for(false).as_str(), "{pos}");
    }
}
