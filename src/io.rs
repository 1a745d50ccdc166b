//! I/O wrappers for tracking data transfer.
//!
//! [`ProgressReader`] and [`ProgressWriter`] wrap any [`std::io::Read`] or
//! [`std::io::Write`] and add every byte successfully transferred to a [`ProgressBar`].
//! Pair them with [`Units::Bytes`](crate::Units::Bytes) to show sizes and throughput.
//!
//! Typical uses are file copies, downloads and hashing large files; the wrapped bar is
//! throttled as usual, so the overhead per call is one lock and an occasional render.

use std::io::{self, Read, Write};

use crate::{progress::ProgressBar, target::DrawTarget};

/// A wrapper around [`Read`] that advances a [`ProgressBar`] by the bytes read.
pub struct ProgressReader<R, T> {
    inner: R,
    bar: ProgressBar<T>,
}

impl<R, T> ProgressReader<R, T> {
    /// Creates a new `ProgressReader` wrapping `inner` with the given `bar`.
    pub const fn new(inner: R, bar: ProgressBar<T>) -> Self {
        Self { inner, bar }
    }

    /// Returns the bar being driven.
    pub const fn bar(&self) -> &ProgressBar<T> {
        &self.bar
    }

    /// Unwraps the reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read, T: DrawTarget> Read for ProgressReader<R, T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bar.add(n as u64);
        Ok(n)
    }
}

/// A wrapper around [`Write`] that advances a [`ProgressBar`] by the bytes written.
pub struct ProgressWriter<W, T> {
    inner: W,
    bar: ProgressBar<T>,
}

impl<W, T> ProgressWriter<W, T> {
    /// Creates a new `ProgressWriter` wrapping `inner` with the given `bar`.
    pub const fn new(inner: W, bar: ProgressBar<T>) -> Self {
        Self { inner, bar }
    }

    /// Returns the bar being driven.
    pub const fn bar(&self) -> &ProgressBar<T> {
        &self.bar
    }

    /// Unwraps the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write, T: DrawTarget> Write for ProgressWriter<W, T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.bar.add(n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
