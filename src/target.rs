//! Where rendered lines go.
//!
//! A [`ProgressBar`](crate::ProgressBar) renders a line of text and hands it to its
//! [`DrawTarget`]. Two targets exist:
//!
//! * [`Terminal`]: a standalone bar that owns a writer and overwrites its line in place
//!   with a carriage return.
//! * [`Row`](crate::multi::Row): a row of a [`MultiBar`](crate::MultiBar), which stores the
//!   line for the multi-bar's redraw loop instead of writing it.
//!
//! Writes are best-effort. The first failed write turns the sink into a permanent no-op,
//! so a closed pipe never interrupts the computation being tracked.

use std::{
    fmt,
    io::{self, Write},
    str::FromStr,
};

use console::Term;
use tracing::warn;

use crate::error::Error;

/// Receives the lines a bar renders.
pub trait DrawTarget: Send {
    /// Replaces the bar's current line with `line`.
    fn draw(&mut self, line: &str);

    /// Writes the final `line` and leaves it in place, followed by `below` on its own
    /// line if given.
    fn finish(&mut self, line: &str, below: Option<&str>);

    /// Width available to the bar, if known.
    fn width(&self) -> Option<usize> {
        terminal_width()
    }
}

/// Column count of the attached terminal, checking stderr before stdout.
pub(crate) fn terminal_width() -> Option<usize> {
    Stream::Stderr.width().or_else(|| Stream::Stdout.width())
}

/// A standard output stream.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Stream {
    /// The process's standard output.
    #[default]
    Stdout,
    /// The process's standard error.
    Stderr,
}

impl Stream {
    /// Column count of the terminal behind this stream, if it is one.
    #[must_use]
    pub fn width(self) -> Option<usize> {
        let term = match self {
            Self::Stdout => Term::stdout(),
            Self::Stderr => Term::stderr(),
        };
        term.size_checked().map(|(_rows, cols)| usize::from(cols))
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stdout => io::stdout().write(buf),
            Self::Stderr => io::stderr().write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            Self::Stdout => io::stdout().lock().write_all(buf),
            Self::Stderr => io::stderr().lock().write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout => io::stdout().flush(),
            Self::Stderr => io::stderr().flush(),
        }
    }
}

impl FromStr for Stream {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" | "out" => Ok(Self::Stdout),
            "stderr" | "err" => Ok(Self::Stderr),
            _ => Err(Error::UnknownStream(s.into())),
        }
    }
}

/// A writer that goes quiet after its first failure.
pub(crate) struct Sink<W> {
    inner: W,
    degraded: bool,
}

impl<W: Write> Sink<W> {
    pub(crate) const fn new(inner: W) -> Self {
        Self {
            inner,
            degraded: false,
        }
    }

    /// Writes `bytes` in full, or nothing at all once degraded.
    pub(crate) fn write(&mut self, bytes: &[u8]) {
        if self.degraded {
            return;
        }
        if let Err(err) = self.inner.write_all(bytes) {
            self.degrade(&err);
        }
    }

    pub(crate) fn flush(&mut self) {
        if self.degraded {
            return;
        }
        if let Err(err) = self.inner.flush() {
            self.degrade(&err);
        }
    }

    pub(crate) const fn is_degraded(&self) -> bool {
        self.degraded
    }

    fn degrade(&mut self, err: &io::Error) {
        warn!(error = %err, "progress output failed, further output is discarded");
        self.degraded = true;
    }
}

/// A standalone bar's output: one line, overwritten in place.
pub struct Terminal<W> {
    sink: Sink<W>,
    stream: Option<Stream>,
}

impl Terminal<Stream> {
    /// Writes to `stream` and sizes lines to the terminal behind it.
    pub const fn for_stream(stream: Stream) -> Self {
        Self {
            sink: Sink::new(stream),
            stream: Some(stream),
        }
    }
}

impl<W: Write> Terminal<W> {
    /// Wraps a writer. Lines are sized to whichever standard stream is a terminal.
    pub const fn new(writer: W) -> Self {
        Self {
            sink: Sink::new(writer),
            stream: None,
        }
    }

    /// Returns `true` once a write has failed and output is being discarded.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.sink.is_degraded()
    }
}

impl<W> fmt::Debug for Terminal<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal")
            .field("stream", &self.stream)
            .field("degraded", &self.sink.degraded)
            .finish_non_exhaustive()
    }
}

impl<W: Write + Send> DrawTarget for Terminal<W> {
    fn draw(&mut self, line: &str) {
        self.sink.write(format!("\r{line}").as_bytes());
        self.sink.flush();
    }

    fn finish(&mut self, line: &str, below: Option<&str>) {
        self.sink.write(format!("\r{line}\n").as_bytes());
        if let Some(below) = below {
            self.sink.write(format!("{below}\n").as_bytes());
        }
        self.sink.flush();
    }

    fn width(&self) -> Option<usize> {
        self.stream.map_or_else(terminal_width, Stream::width)
    }
}

/// In-memory writers for tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::{
        io::{self, Write},
        sync::Arc,
    };

    use parking_lot::Mutex;

    /// Records every `write` call separately; clones share the record.
    #[derive(Clone, Default)]
    pub(crate) struct Recorder {
        writes: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        pub(crate) fn writes(&self) -> Vec<String> {
            self.writes.lock().clone()
        }

        pub(crate) fn output(&self) -> String {
            self.writes.lock().concat()
        }
    }

    impl Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes
                .lock()
                .push(String::from_utf8_lossy(buf).into_owned());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Fails every call, counting attempts.
    #[derive(Clone, Default)]
    pub(crate) struct Broken {
        pub(crate) attempts: Arc<Mutex<usize>>,
    }

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            *self.attempts.lock() += 1;
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            *self.attempts.lock() += 1;
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DrawTarget, Stream, Terminal,
        testing::{Broken, Recorder},
    };

    #[test]
    fn test_terminal_overwrites_in_place() {
        let rec = Recorder::default();
        let mut term = Terminal::new(rec.clone());

        term.draw("one");
        term.draw("two");
        term.finish("done", Some("bye"));

        assert_eq!(rec.writes(), vec!["\rone", "\rtwo", "\rdone\n", "bye\n"]);
    }

    /// Degraded Sink
    /// A failing writer is tried once and then never touched again.
    #[test]
    fn test_broken_stream_degrades() {
        let broken = Broken::default();
        let mut term = Terminal::new(broken.clone());

        term.draw("a");
        assert!(term.is_degraded());
        let attempts = *broken.attempts.lock();

        term.draw("b");
        term.finish("c", Some("d"));
        assert_eq!(*broken.attempts.lock(), attempts);
    }

    #[test]
    fn test_width_follows_bound_stream() {
        let term = Terminal::for_stream(Stream::Stderr);
        assert_eq!(term.stream, Some(Stream::Stderr));
        assert_eq!(term.width(), Stream::Stderr.width());

        let term = Terminal::for_stream(Stream::Stdout);
        assert_eq!(term.width(), Stream::Stdout.width());

        assert_eq!(Terminal::new(Recorder::default()).stream, None);
    }

    #[test]
    fn test_parse_stream() {
        assert_eq!("stderr".parse::<Stream>(), Ok(Stream::Stderr));
        assert_eq!("STDOUT".parse::<Stream>(), Ok(Stream::Stdout));
        assert!("tty".parse::<Stream>().is_err());
    }
}
