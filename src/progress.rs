//! The [`ProgressBar`] handle.
//!
//! State is split the same way throughout the crate:
//!
//! * **Hot data:** current count, total and the finished flag live in atomics, so
//!   [`current`](ProgressBar::current), [`total`](ProgressBar::total) and
//!   [`is_finished`](ProgressBar::is_finished) never lock.
//! * **Cold data:** the style, message, timing and the draw target sit behind one
//!   [`Mutex`](parking_lot::Mutex). Every mutation takes it, which serializes updates and
//!   renders of the same bar even when several threads share the handle.
//!
//! # Throttling
//!
//! Updates render at most once per refresh interval (100 ms by default). A render is
//! never skipped when the bar has not rendered yet, on the update that brings the count
//! to the total, or on `finish*`. Once complete, further updates are throttled as usual. Skipped renders still update the state.

use std::{
    fmt,
    io::Write,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use compact_str::CompactString;
use parking_lot::Mutex;
use web_time::Instant;

use crate::{
    render,
    style::{BarGlyphs, Component, Style, TickGlyphs},
    target::{DrawTarget, Stream, Terminal},
    template::Template,
    units::{DurationUnit, Units},
};

/// A cloneable handle to a progress bar.
///
/// Clones point at the same bar. A bar created with [`new`](Self::new) or
/// [`on`](Self::on) writes to a stream; one created by
/// [`MultiBar::create_bar`](crate::MultiBar::create_bar) renders into its row.
pub struct ProgressBar<T = Terminal<Stream>> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    current: AtomicU64,
    total: AtomicU64,
    finished: AtomicBool,
    cold: Mutex<Cold<T>>,
}

struct Cold<T> {
    style: Style,
    message: CompactString,
    start: Instant,
    last_render: Option<Instant>,
    tick: usize,
    target: T,
}

impl<T> Cold<T> {
    fn render_due(&self, now: Instant) -> bool {
        let interval = self.style.refresh_interval;
        self.last_render
            .is_none_or(|last| interval.is_zero() || now.duration_since(last) >= interval)
    }
}

impl<T> Clone for ProgressBar<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for ProgressBar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressBar")
            .field("current", &self.shared.current.load(Ordering::Relaxed))
            .field("total", &self.shared.total.load(Ordering::Relaxed))
            .field("finished", &self.shared.finished.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl ProgressBar {
    /// Creates a bar on stdout.
    ///
    /// A `total` of zero makes an indeterminate bar, shown as a spinner.
    #[must_use]
    pub fn new(total: u64) -> Self {
        Self::on_stream(Stream::Stdout, total)
    }

    /// Creates a bar on `stream`, sized to the terminal behind that stream.
    #[must_use]
    pub fn on_stream(stream: Stream, total: u64) -> Self {
        Self::with_target(Terminal::for_stream(stream), total)
    }
}

impl<W: Write + Send> ProgressBar<Terminal<W>> {
    /// Creates a bar writing to `handle`.
    ///
    /// The line width follows whichever standard stream is a terminal; use
    /// [`on_stream`](ProgressBar::on_stream) to size it to the stream being written.
    #[must_use]
    pub fn on(handle: W, total: u64) -> Self {
        Self::with_target(Terminal::new(handle), total)
    }
}

impl<T: DrawTarget> ProgressBar<T> {
    /// Creates a bar with the default style drawing to `target`.
    #[must_use]
    pub fn with_target(target: T, total: u64) -> Self {
        Self::from_parts(
            target,
            total,
            Style::default(),
            CompactString::default(),
            Instant::now(),
        )
    }

    pub(crate) fn from_parts(
        target: T,
        total: u64,
        style: Style,
        message: CompactString,
        start: Instant,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                current: AtomicU64::new(0),
                total: AtomicU64::new(total),
                finished: AtomicBool::new(false),
                cold: Mutex::new(Cold {
                    style,
                    message,
                    start,
                    last_render: None,
                    tick: 0,
                    target,
                }),
            }),
        }
    }

    // ========================================================================
    // Configuration (effective from the next render)
    // ========================================================================

    /// Sets the display units of the counts and speed.
    pub fn set_units(&self, units: Units) {
        self.shared.cold.lock().style.units = units;
    }

    /// Sets the line template, e.g. `"{msg}[{bar}] {percent} {eta}"`.
    ///
    /// Unrecognized placeholders are printed literally.
    pub fn format(&self, template: &str) {
        self.shared.cold.lock().style.template = Some(Template::parse(template));
    }

    /// Sets the bar glyphs from a `start fill head empty end` string such as `"[=>-]"`.
    ///
    /// Ignored when fewer than five characters are given.
    pub fn bar_format(&self, glyphs: &str) {
        if let Some(glyphs) = BarGlyphs::parse(glyphs) {
            self.shared.cold.lock().style.bar = glyphs;
        }
    }

    /// Sets the spinner glyphs, one per character. Ignored when empty.
    pub fn tick_format(&self, glyphs: &str) {
        if let Some(ticks) = TickGlyphs::parse(glyphs) {
            self.shared.cold.lock().style.ticks = ticks;
        }
    }

    /// Sets the message shown by `{msg}`.
    pub fn message(&self, text: impl Into<CompactString>) {
        self.shared.cold.lock().message = text.into();
    }

    /// Fixes the line width; `None` follows the terminal.
    pub fn set_width(&self, width: Option<usize>) {
        self.shared.cold.lock().style.width = width;
    }

    /// Sets the minimum time between renders. A `value` of zero renders on every update.
    pub fn set_max_refresh_rate(&self, unit: DurationUnit, value: u64) {
        self.shared.cold.lock().style.refresh_interval = unit.duration(value);
    }

    /// Shows or hides a component of the default layout.
    pub fn show(&self, component: Component, visible: bool) {
        self.shared.cold.lock().style.show.set(component, visible);
    }

    /// Replaces the whole style.
    pub fn set_style(&self, style: Style) {
        self.shared.cold.lock().style = style;
    }

    // ========================================================================
    // Progress
    // ========================================================================

    /// Advances the spinner by one glyph.
    pub fn tick(&self) {
        let mut cold = self.shared.cold.lock();
        if self.is_finished() {
            return;
        }
        cold.tick = cold.tick.wrapping_add(1);
        self.draw(&mut cold, false);
    }

    /// Adds `delta` to the current count, capped at the total when there is one.
    ///
    /// Returns the new count. Does nothing after [`finish`](Self::finish).
    pub fn add(&self, delta: u64) -> u64 {
        let mut cold = self.shared.cold.lock();
        if self.is_finished() {
            return self.current();
        }
        let before = self.current();
        let current = self.clamp(before.saturating_add(delta));
        self.shared.current.store(current, Ordering::Relaxed);
        let total = self.total();
        self.draw(&mut cold, completes(before, current, total, total));
        current
    }

    /// Adds one to the current count. Returns the new count.
    pub fn inc(&self) -> u64 {
        self.add(1)
    }

    /// Sets the current count, capped at the total when there is one.
    ///
    /// Unlike [`add`](Self::add) this may move the count backwards.
    pub fn set(&self, value: u64) {
        let mut cold = self.shared.cold.lock();
        if self.is_finished() {
            return;
        }
        let before = self.current();
        let current = self.clamp(value);
        self.shared.current.store(current, Ordering::Relaxed);
        let total = self.total();
        self.draw(&mut cold, completes(before, current, total, total));
    }

    /// Changes the total, capping the current count at the new total.
    ///
    /// A total of zero turns the bar into a spinner.
    pub fn set_total(&self, total: u64) {
        let mut cold = self.shared.cold.lock();
        if self.is_finished() {
            return;
        }
        let before = self.current();
        let previous = self.shared.total.swap(total, Ordering::Relaxed);
        let current = self.clamp(before);
        self.shared.current.store(current, Ordering::Relaxed);
        self.draw(&mut cold, completes(before, current, previous, total));
    }

    /// Restarts the clock used for the elapsed time, speed and ETA.
    pub fn reset_start_time(&self) {
        self.shared.cold.lock().start = Instant::now();
    }

    /// Completes the bar: the count jumps to the total, the final state is drawn and the
    /// line is left in place.
    pub fn finish(&self) {
        self.finish_with(None, None);
    }

    /// Like [`finish`](Self::finish), but the final line shows `s` instead of the bar.
    pub fn finish_print(&self, s: &str) {
        self.finish_with(Some(s), None);
    }

    /// Like [`finish`](Self::finish), then prints `s` on its own line below the bar.
    pub fn finish_println(&self, s: &str) {
        self.finish_with(None, Some(s));
    }

    fn finish_with(&self, replace: Option<&str>, below: Option<&str>) {
        let mut cold = self.shared.cold.lock();
        if self.shared.finished.swap(true, Ordering::AcqRel) {
            return;
        }
        let total = self.total();
        if total > 0 {
            self.shared.current.store(total, Ordering::Relaxed);
        }

        let now = Instant::now();
        let width = Self::width(&cold);
        let line = match replace {
            Some(s) => render::fit(s, width),
            None => render::render_line(&self.snapshot_with(&cold, now), &cold.style, width),
        };
        cold.last_render = Some(now);
        cold.target.finish(&line, below);
    }

    /// Sets the initial count without drawing.
    pub(crate) fn preset(&self, position: u64) {
        let _cold = self.shared.cold.lock();
        self.shared
            .current
            .store(self.clamp(position), Ordering::Relaxed);
    }

    /// Renders now, ignoring the refresh interval.
    pub(crate) fn force_draw(&self) {
        let mut cold = self.shared.cold.lock();
        if !self.is_finished() {
            self.draw(&mut cold, true);
        }
    }

    fn draw(&self, cold: &mut Cold<T>, force: bool) {
        let now = Instant::now();
        if !force && !cold.render_due(now) {
            return;
        }

        let line = render::render_line(
            &self.snapshot_with(cold, now),
            &cold.style,
            Self::width(cold),
        );
        cold.last_render = Some(now);
        cold.target.draw(&line);
    }

    fn width(cold: &Cold<T>) -> usize {
        cold.style
            .width
            .or_else(|| cold.target.width())
            .unwrap_or(render::DEFAULT_WIDTH)
    }

    fn clamp(&self, value: u64) -> u64 {
        let total = self.total();
        if total > 0 { value.min(total) } else { value }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Gets the current count.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.shared.current.load(Ordering::Relaxed)
    }

    /// Gets the total (zero for a spinner).
    #[must_use]
    pub fn total(&self) -> u64 {
        self.shared.total.load(Ordering::Relaxed)
    }

    /// Checks whether one of the `finish*` methods has been called.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::Acquire)
    }

    /// Time since the bar was created or its clock was last reset.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.shared.cold.lock().start.elapsed()
    }

    /// Creates a consistent snapshot of the bar's state.
    #[must_use]
    pub fn snapshot(&self) -> BarSnapshot {
        let cold = self.shared.cold.lock();
        self.snapshot_with(&cold, Instant::now())
    }

    fn snapshot_with(&self, cold: &Cold<T>, now: Instant) -> BarSnapshot {
        BarSnapshot {
            current: self.current(),
            total: self.total(),
            elapsed: now.duration_since(cold.start),
            finished: self.is_finished(),
            message: cold.message.clone(),
            spinner: cold.style.ticks.glyph(cold.tick).into(),
        }
    }
}

/// Whether an update moved the count from below its total to the total.
const fn completes(before: u64, after: u64, old_total: u64, new_total: u64) -> bool {
    let was = old_total > 0 && before >= old_total;
    !was && new_total > 0 && after >= new_total
}

/// A plain-data snapshot of a [`ProgressBar`] at one instant; the renderer's input.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BarSnapshot {
    pub(crate) current: u64,
    pub(crate) total: u64,
    pub(crate) elapsed: Duration,
    pub(crate) finished: bool,
    pub(crate) message: CompactString,
    pub(crate) spinner: CompactString,
}

impl BarSnapshot {
    /// Returns the current count.
    #[must_use]
    pub const fn current(&self) -> u64 {
        self.current
    }

    /// Returns the total count.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Returns the time since start.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns whether the bar is finished.
    #[must_use]
    pub const fn finished(&self) -> bool {
        self.finished
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the spinner glyph at this instant.
    #[must_use]
    pub fn spinner(&self) -> &str {
        &self.spinner
    }

    /// Completed fraction in `[0, 1]`; zero without a total.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f64 / self.total as f64).min(1.0)
        }
    }

    /// Estimates the time remaining as `elapsed * (total - current) / current`.
    ///
    /// Returns `None` without a total or before any progress was made.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn eta(&self) -> Option<Duration> {
        if self.total == 0 || self.current == 0 {
            return None;
        }
        let remaining = self.total.saturating_sub(self.current) as f64;
        let secs = self.elapsed.as_secs_f64() * remaining / self.current as f64;
        Some(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
    }

    /// Average items (or bytes) per second since start.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn speed(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.current as f64 / secs
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use proptest::prelude::*;

    use super::{BarSnapshot, ProgressBar};
    use crate::{
        target::{Terminal, testing::Recorder},
        units::{DurationUnit, Units},
    };

    fn quiet_bar(total: u64) -> (ProgressBar<Terminal<Recorder>>, Recorder) {
        let rec = Recorder::default();
        let pb = ProgressBar::on(rec.clone(), total);
        pb.set_width(Some(60));
        (pb, rec)
    }

    /// Basic Lifecycle
    /// New -> Add -> Finish, with the count capped at the total.
    #[test]
    fn test_basic_lifecycle() {
        let (pb, _rec) = quiet_bar(100);

        assert_eq!(pb.current(), 0);
        assert!(!pb.is_finished());

        assert_eq!(pb.add(40), 40);
        assert_eq!(pb.inc(), 41);
        assert_eq!(pb.add(1_000), 100);

        pb.set(10);
        assert_eq!(pb.current(), 10);

        pb.finish();
        assert!(pb.is_finished());
        assert_eq!(pb.current(), 100);
    }

    /// Finished Is Terminal
    /// Mutators after `finish` neither change state nor write.
    #[test]
    fn test_mutators_after_finish_are_noops() {
        let (pb, rec) = quiet_bar(10);
        pb.set_max_refresh_rate(DurationUnit::Millis, 0);
        pb.add(3);
        pb.finish();
        let written = rec.writes().len();

        assert_eq!(pb.add(5), 10);
        assert_eq!(pb.inc(), 10);
        pb.set(2);
        pb.tick();
        pb.finish();
        pb.finish_print("again");

        assert_eq!(pb.current(), 10);
        assert_eq!(rec.writes().len(), written);
    }

    #[test]
    fn test_inc_matches_add() {
        let (a, _) = quiet_bar(50);
        let (b, _) = quiet_bar(50);
        for _ in 0..30 {
            a.inc();
        }
        b.add(30);
        assert_eq!(a.current(), 30);
        assert_eq!(a.current(), b.current());
    }

    /// Spinner Mode
    /// Without a total counts are unbounded and finish leaves them alone.
    #[test]
    fn test_indeterminate() {
        let (pb, _rec) = quiet_bar(0);
        assert_eq!(pb.add(u64::MAX - 1), u64::MAX - 1);
        assert_eq!(pb.add(10), u64::MAX);
        pb.set(7);
        pb.finish();
        assert_eq!(pb.current(), 7);
        assert_eq!(pb.total(), 0);
    }

    /// Throttling
    /// Updates inside the refresh interval change state but are not written.
    #[test]
    fn test_refresh_throttle() {
        let (pb, rec) = quiet_bar(100);
        pb.set_max_refresh_rate(DurationUnit::Secs, 3600);

        pb.add(1);
        pb.add(1);
        pb.tick();
        pb.set(50);
        assert_eq!(rec.writes().len(), 1, "only the first update renders");
        assert_eq!(pb.current(), 50);

        // Completion always renders.
        pb.set(100);
        assert_eq!(rec.writes().len(), 2);
    }

    /// Throttling After Completion
    /// Only the update that completes the bar skips the interval.
    #[test]
    fn test_complete_bar_stays_throttled() {
        let (pb, rec) = quiet_bar(10);
        pb.set_max_refresh_rate(DurationUnit::Secs, 3600);

        pb.add(10);
        assert_eq!(rec.writes().len(), 1);

        for _ in 0..100 {
            pb.tick();
            pb.add(1);
            pb.set(10);
        }
        assert_eq!(rec.writes().len(), 1);
        assert_eq!(pb.current(), 10);

        // Dropping below and completing again is a new transition.
        pb.set(4);
        pb.set(10);
        assert_eq!(rec.writes().len(), 2);

        // Shrinking the total onto the count completes it too.
        let (pb, rec) = quiet_bar(10);
        pb.set_max_refresh_rate(DurationUnit::Secs, 3600);
        pb.add(6);
        pb.set_total(5);
        assert_eq!(rec.writes().len(), 2);
        pb.set_total(5);
        assert_eq!(rec.writes().len(), 2);
    }

    #[test]
    fn test_zero_interval_renders_every_update() {
        let (pb, rec) = quiet_bar(100);
        pb.set_max_refresh_rate(DurationUnit::Nanos, 0);
        for _ in 0..5 {
            pb.inc();
        }
        assert_eq!(rec.writes().len(), 5);
    }

    /// Final Output
    /// The three `finish*` flavours differ only in what follows the carriage return.
    #[test]
    fn test_finish_variants() {
        let (pb, rec) = quiet_bar(4);
        pb.format("{pos}/{total}");
        pb.set_width(Some(8));
        pb.finish();
        assert_eq!(rec.writes(), vec!["\r4/4     \n"]);

        let (pb, rec) = quiet_bar(4);
        pb.set_width(Some(8));
        pb.finish_print("done");
        assert_eq!(rec.writes(), vec!["\rdone    \n"]);

        let (pb, rec) = quiet_bar(4);
        pb.format("{pos}/{total}");
        pb.set_width(Some(3));
        pb.finish_println("all good");
        assert_eq!(rec.writes(), vec!["\r4/4\n", "all good\n"]);
    }

    #[test]
    fn test_message_and_units_apply_on_next_render() {
        let (pb, rec) = quiet_bar(2048);
        pb.set_max_refresh_rate(DurationUnit::Millis, 0);
        pb.format("{msg}{counter}");
        pb.set_width(Some(30));
        pb.message("copy: ");
        pb.set_units(Units::Bytes);
        pb.add(1024);

        assert_eq!(rec.output().trim_end(), "\rcopy: 1.00 KiB / 2.00 KiB");
    }

    #[test]
    fn test_tick_cycles_spinner() {
        let (pb, _rec) = quiet_bar(0);
        pb.tick_format("ab");
        assert_eq!(pb.snapshot().spinner(), "a");
        pb.tick();
        assert_eq!(pb.snapshot().spinner(), "b");
        pb.tick();
        assert_eq!(pb.snapshot().spinner(), "a");

        pb.tick_format("");
        assert_eq!(pb.snapshot().spinner(), "a", "empty glyph set is ignored");
    }

    #[test]
    fn test_set_total_reclamps() {
        let (pb, _rec) = quiet_bar(100);
        pb.set(80);
        pb.set_total(50);
        assert_eq!(pb.current(), 50);
        assert_eq!(pb.total(), 50);
    }

    #[test]
    fn test_reset_start_time() {
        let (pb, _rec) = quiet_bar(10);
        thread::sleep(Duration::from_millis(20));
        let before = pb.elapsed();
        pb.reset_start_time();
        assert!(pb.elapsed() < before);
    }

    /// Shared Handles
    /// Clones updated from many threads lose no increments.
    #[test]
    fn test_concurrent_clones() {
        let (pb, _rec) = quiet_bar(0);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pb = pb.clone();
                thread::spawn(move || {
                    for _ in 0..250 {
                        pb.inc();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(pb.current(), 2000);
    }

    #[test]
    fn test_eta() {
        let snap = BarSnapshot {
            current: 25,
            total: 100,
            elapsed: Duration::from_secs(10),
            ..BarSnapshot::default()
        };
        assert_eq!(snap.eta(), Some(Duration::from_secs(30)));
        assert!((snap.speed() - 2.5).abs() < f64::EPSILON);

        let stalled = BarSnapshot {
            total: 100,
            elapsed: Duration::from_secs(10),
            ..BarSnapshot::default()
        };
        assert_eq!(stalled.eta(), None);
        assert!(BarSnapshot::default().eta().is_none());
    }

    #[derive(Clone, Debug)]
    enum Op {
        Add(u64),
        Inc,
        Set(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u64..500).prop_map(Op::Add),
            Just(Op::Inc),
            (0u64..500).prop_map(Op::Set),
        ]
    }

    proptest! {
        /// Any sequence of updates keeps the count within `[0, total]`, and `add`/`inc`
        /// never move it backwards.
        #[test]
        fn prop_count_stays_in_range(total in 1u64..300, ops in prop::collection::vec(op(), 0..64)) {
            let (pb, _rec) = quiet_bar(total);
            for op in ops {
                let before = pb.current();
                match op {
                    Op::Add(n) => {
                        let after = pb.add(n);
                        prop_assert!(after >= before);
                        prop_assert_eq!(after, pb.current());
                    }
                    Op::Inc => {
                        prop_assert!(pb.inc() >= before);
                    }
                    Op::Set(n) => pb.set(n),
                }
                prop_assert!(pb.current() <= total);
            }
        }
    }
}
