//! Several progress bars drawn on fixed terminal rows.
//!
//! [`MultiBar`] is the registry for "multi-bar" output. Each bar it creates gets a row,
//! top to bottom in creation order, and renders into that row instead of writing to the
//! stream. A single [`listen`](MultiBar::listen) loop owns the stream and redraws all rows
//! together, so bars updated from different threads never interleave their output.
//!
//! # Synchronization Strategy
//!
//! * **Board:** row contents, finished flags and the queue of pending `println` lines sit
//!   behind one [`Mutex`](parking_lot::Mutex). Bars lock it only to store a freshly
//!   rendered line, then wake the listener through a [`Condvar`].
//! * **Screen:** the output stream and the number of rows currently on screen sit behind
//!   a second mutex, held for one whole frame, so every frame is written atomically.
//!
//! # Redraw
//!
//! Each frame moves the cursor up over the rows drawn last time, prints the queued
//! `println` lines (which pushes the bar region down), then rewrites every row and leaves
//! the cursor below the last one. Every write is either one complete line or one cursor
//! movement.

use std::{collections::VecDeque, fmt, io::Write, sync::Arc, time::Duration};

use compact_str::CompactString;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::{
    builder::ProgressBarBuilder,
    progress::ProgressBar,
    target::{DrawTarget, Sink, Stream, terminal_width},
};

/// Longest the listener sleeps without an update.
const LISTEN_INTERVAL: Duration = Duration::from_millis(100);

/// Clears the line the cursor is on.
const CLEAR_LINE: &str = "\r\x1b[2K";

#[derive(Default)]
struct Board {
    rows: Vec<RowState>,
    pending: VecDeque<CompactString>,
    dirty: bool,
}

impl Board {
    fn all_finished(&self) -> bool {
        self.rows.iter().all(|row| row.finished)
    }
}

#[derive(Default)]
struct RowState {
    line: String,
    finished: bool,
}

#[derive(Default)]
struct Shared {
    board: Mutex<Board>,
    wake: Condvar,
    stream: Option<Stream>,
}

impl Shared {
    fn update(&self, apply: impl FnOnce(&mut Board)) {
        {
            let mut board = self.board.lock();
            apply(&mut *board);
            board.dirty = true;
        }
        self.wake.notify_all();
    }
}

struct Screen<W> {
    sink: Sink<W>,
    drawn: usize,
}

/// A registry of progress bars sharing one output stream.
///
/// Create the bars with [`create_bar`](Self::create_bar), hand them to worker threads,
/// then call [`listen`](Self::listen), which returns once every bar has finished.
///
/// # Examples
///
/// ```no_run
/// use std::thread;
///
/// use pbar::MultiBar;
///
/// let mb = MultiBar::new();
/// for n in 0..3 {
///     let pb = mb.create_bar(100);
///     pb.message(format!("task {n}: "));
///     thread::spawn(move || {
///         for _ in 0..100 {
///             pb.inc();
///         }
///         pb.finish();
///     });
/// }
/// mb.println("working...");
/// mb.listen();
/// ```
pub struct MultiBar<W = Stream> {
    shared: Arc<Shared>,
    screen: Mutex<Screen<W>>,
}

impl<W> fmt::Debug for MultiBar<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let board = self.shared.board.lock();
        f.debug_struct("MultiBar")
            .field("rows", &board.rows.len())
            .field("pending", &board.pending.len())
            .finish_non_exhaustive()
    }
}

impl MultiBar {
    /// Creates an empty registry on stdout.
    #[must_use]
    pub fn new() -> Self {
        Self::on_stream(Stream::Stdout)
    }

    /// Creates an empty registry on `stream`; rows are sized to the terminal behind it.
    #[must_use]
    pub fn on_stream(stream: Stream) -> Self {
        Self::bound(stream, Some(stream))
    }
}

impl Default for MultiBar {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> MultiBar<W> {
    /// Creates an empty registry writing to `handle`.
    #[must_use]
    pub fn on(handle: W) -> Self {
        Self::bound(handle, None)
    }

    fn bound(handle: W, stream: Option<Stream>) -> Self {
        Self {
            shared: Arc::new(Shared {
                stream,
                ..Shared::default()
            }),
            screen: Mutex::new(Screen {
                sink: Sink::new(handle),
                drawn: 0,
            }),
        }
    }

    /// Queues `text` to be printed above the bars on the next redraw.
    ///
    /// Lines are printed once each, in the order they were queued.
    pub fn println(&self, text: impl Into<CompactString>) {
        let text = text.into();
        self.shared.update(|board| board.pending.push_back(text));
    }

    /// Creates a bar with the default style on a new bottom row.
    #[must_use]
    pub fn create_bar(&self, total: u64) -> ProgressBar<Row> {
        self.create_bar_from(ProgressBarBuilder::new(total))
    }

    /// Creates a bar from a builder on a new bottom row.
    #[must_use]
    pub fn create_bar_from(&self, builder: ProgressBarBuilder) -> ProgressBar<Row> {
        let index = {
            let mut board = self.shared.board.lock();
            board.rows.push(RowState::default());
            board.rows.len() - 1
        };

        let bar = builder.build_with_target(Row {
            shared: Arc::clone(&self.shared),
            index,
        });
        bar.force_draw();
        bar
    }

    /// Redraws the rows until every bar has finished.
    ///
    /// Wakes on every row update or `println`, and at least every 100 ms. Returns after
    /// the frame showing the final state of every bar has been written. With no bars it
    /// only flushes queued lines.
    pub fn listen(&self) {
        debug!(rows = self.len(), "listening for progress updates");

        let mut frames = 0_usize;
        loop {
            let (printed, rows, done) = {
                let mut board = self.shared.board.lock();
                if !board.dirty && !board.all_finished() {
                    self.shared.wake.wait_for(&mut board, LISTEN_INTERVAL);
                }
                board.dirty = false;
                let printed: Vec<CompactString> = board.pending.drain(..).collect();
                let rows: Vec<String> = board.rows.iter().map(|row| row.line.clone()).collect();
                (printed, rows, board.all_finished())
            };

            self.redraw(&printed, &rows);
            frames += 1;

            if done {
                break;
            }
        }

        debug!(frames, "all progress bars finished");
    }

    fn redraw(&self, printed: &[CompactString], rows: &[String]) {
        let mut screen = self.screen.lock();

        if screen.drawn > 0 {
            let up = format!("\x1b[{}A", screen.drawn);
            screen.sink.write(up.as_bytes());
        }
        for line in printed {
            screen.sink.write(format!("{CLEAR_LINE}{line}\n").as_bytes());
        }
        for line in rows {
            screen.sink.write(format!("{CLEAR_LINE}{line}\n").as_bytes());
        }
        screen.drawn = rows.len();
        screen.sink.flush();

        trace!(printed = printed.len(), rows = rows.len(), "redrew progress rows");
    }

    /// Number of bars (rows) created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.board.lock().rows.len()
    }

    /// Returns `true` if no bar has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.board.lock().rows.is_empty()
    }

    /// Checks whether every bar has finished; `true` when there are none.
    #[must_use]
    pub fn is_all_finished(&self) -> bool {
        self.shared.board.lock().all_finished()
    }
}

/// The draw target of a bar owned by a [`MultiBar`]: one row of the bar region.
pub struct Row {
    shared: Arc<Shared>,
    index: usize,
}

impl Row {
    /// Zero-based row position, counted from the top of the bar region.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row").field("index", &self.index).finish()
    }
}

impl DrawTarget for Row {
    fn draw(&mut self, line: &str) {
        let index = self.index;
        self.shared.update(|board| {
            let row = &mut board.rows[index];
            row.line.clear();
            row.line.push_str(line);
        });
    }

    /// Stores the final line. A line `below` cannot grow the row, so it is queued like a
    /// [`MultiBar::println`] line instead.
    fn finish(&mut self, line: &str, below: Option<&str>) {
        let index = self.index;
        self.shared.update(|board| {
            let row = &mut board.rows[index];
            row.line.clear();
            row.line.push_str(line);
            row.finished = true;
            if let Some(below) = below {
                board.pending.push_back(below.into());
            }
        });
    }

    fn width(&self) -> Option<usize> {
        self.shared.stream.map_or_else(terminal_width, Stream::width)
    }
}
