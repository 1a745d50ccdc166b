//! Fluent interface for constructing [`ProgressBar`] instances.
//!
//! Simple bars come from [`ProgressBar::new`] or [`ProgressBar::on`] and are configured
//! afterwards. [`ProgressBarBuilder`] sets everything up front instead, which suits
//! bars described by a stored [`Style`], and lets the caller choose the start time.
//!
//! # Key Features
//!
//! * **One configuration, many bars:** a builder is `Clone`, so a configured template can
//!   stamp out bars for several streams or [`MultiBar`](crate::MultiBar) rows.
//! * **Time Travel:** the start time can be set explicitly, e.g. to resume a task that
//!   started before the bar existed, so speed and ETA account for the earlier work.

use std::{io::Write, time::Duration};

use compact_str::CompactString;
use web_time::Instant;

use crate::{
    progress::ProgressBar,
    style::{BarGlyphs, Component, Style, TickGlyphs},
    target::{DrawTarget, Stream, Terminal},
    template::Template,
    units::Units,
};

/// A builder for [`ProgressBar`]s.
#[derive(Clone, Debug, Default)]
pub struct ProgressBarBuilder {
    total: u64,
    position: u64,
    style: Style,
    message: CompactString,
    start: Option<Instant>,
}

impl ProgressBarBuilder {
    /// Starts building a bar; a `total` of zero builds a spinner.
    #[must_use]
    pub fn new(total: u64) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Replaces the whole style.
    #[must_use]
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Sets the line template.
    #[must_use]
    pub fn template(mut self, template: &str) -> Self {
        self.style.template = Some(Template::parse(template));
        self
    }

    /// Sets the bar glyphs; ignored when fewer than five are given.
    #[must_use]
    pub fn bar_glyphs(mut self, glyphs: &str) -> Self {
        if let Some(glyphs) = BarGlyphs::parse(glyphs) {
            self.style.bar = glyphs;
        }
        self
    }

    /// Sets the spinner glyphs; ignored when empty.
    #[must_use]
    pub fn tick_glyphs(mut self, glyphs: &str) -> Self {
        if let Some(ticks) = TickGlyphs::parse(glyphs) {
            self.style.ticks = ticks;
        }
        self
    }

    /// Sets the message.
    #[must_use]
    pub fn message(mut self, message: impl Into<CompactString>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the display units.
    #[must_use]
    pub const fn units(mut self, units: Units) -> Self {
        self.style.units = units;
        self
    }

    /// Fixes the line width.
    #[must_use]
    pub const fn width(mut self, width: usize) -> Self {
        self.style.width = Some(width);
        self
    }

    /// Sets the minimum time between renders.
    #[must_use]
    pub const fn refresh_interval(mut self, interval: Duration) -> Self {
        self.style.refresh_interval = interval;
        self
    }

    /// Shows or hides a component of the default layout.
    #[must_use]
    pub fn show(mut self, component: Component, visible: bool) -> Self {
        self.style.show.set(component, visible);
        self
    }

    /// Sets the initial count, capped at the total when there is one.
    #[must_use]
    pub const fn position(mut self, position: u64) -> Self {
        self.position = position;
        self
    }

    /// Sets the start time explicitly.
    #[must_use]
    pub const fn start_time(mut self, start: Instant) -> Self {
        self.start = Some(start);
        self
    }

    /// Builds a bar on stdout.
    #[must_use]
    pub fn build(self) -> ProgressBar {
        self.build_on_stream(Stream::Stdout)
    }

    /// Builds a bar on `stream`, sized to the terminal behind it.
    #[must_use]
    pub fn build_on_stream(self, stream: Stream) -> ProgressBar {
        self.build_with_target(Terminal::for_stream(stream))
    }

    /// Builds a bar writing to `handle`.
    #[must_use]
    pub fn build_on<W: Write + Send>(self, handle: W) -> ProgressBar<Terminal<W>> {
        self.build_with_target(Terminal::new(handle))
    }

    /// Builds a bar drawing to `target`.
    ///
    /// Nothing is drawn until the first update.
    #[must_use]
    pub fn build_with_target<T: DrawTarget>(self, target: T) -> ProgressBar<T> {
        let bar = ProgressBar::from_parts(
            target,
            self.total,
            self.style,
            self.message,
            self.start.unwrap_or_else(Instant::now),
        );
        bar.preset(self.position);
        bar
    }
}
