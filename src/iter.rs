//! Iterator adapters for automatic progress tracking.
//!
//! This module provides the [`ProgressIteratorExt`] trait, which adds helper methods
//! to any Rust [`Iterator`]. This allows you to attach a progress bar to a loop with
//! a single method call.
//!
//! # Heuristics
//!
//! The adapters check [`Iterator::size_hint`]:
//! * If the iterator reports an exact length, the bar's total is that length.
//! * Otherwise the total is zero and the bar is shown as a spinner.
//!
//! # Example
//!
//! ```no_run
//! use pbar::ProgressIteratorExt;
//!
//! // A bar with a total of 3, because the length is known
//! for item in vec![1, 2, 3].into_iter().progress() {
//!     // ...
//! }
//! ```

use std::io::Write;

use crate::{
    multi::{MultiBar, Row},
    progress::ProgressBar,
    target::{DrawTarget, Stream, Terminal},
};

/// An iterator adapter that counts items on a [`ProgressBar`].
///
/// Increments the bar on every item and finishes it when the iterator is exhausted.
pub struct ProgressIter<I, T = Terminal<Stream>> {
    iter: I,
    bar: ProgressBar<T>,
}

impl<I, T> ProgressIter<I, T> {
    /// Creates a new `ProgressIter`.
    ///
    /// Note: This is usually constructed via [`ProgressIteratorExt`] methods.
    pub const fn new(iter: I, bar: ProgressBar<T>) -> Self {
        Self { iter, bar }
    }

    /// Returns the bar being driven.
    pub const fn bar(&self) -> &ProgressBar<T> {
        &self.bar
    }
}

impl<I: Iterator, T: DrawTarget> Iterator for ProgressIter<I, T> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.iter.next();

        if item.is_some() {
            self.bar.inc();
        } else {
            self.bar.finish();
        }

        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

/// Extension trait to attach a progress bar to any iterator.
pub trait ProgressIteratorExt: Iterator + Sized {
    /// Counts the items on a new stdout bar.
    fn progress(self) -> ProgressIter<Self> {
        let total = total_from_size_hint(&self);
        ProgressIter::new(self, ProgressBar::new(total))
    }

    /// Counts the items on a new bar writing to `handle`.
    fn progress_on<W: Write + Send>(self, handle: W) -> ProgressIter<Self, Terminal<W>> {
        let total = total_from_size_hint(&self);
        ProgressIter::new(self, ProgressBar::on(handle, total))
    }

    /// Counts the items on an existing bar.
    fn progress_with<T: DrawTarget>(self, bar: ProgressBar<T>) -> ProgressIter<Self, T> {
        ProgressIter::new(self, bar)
    }

    /// Counts the items on a new row of `multi`.
    fn progress_in<W: Write>(self, multi: &MultiBar<W>) -> ProgressIter<Self, Row> {
        let total = total_from_size_hint(&self);
        ProgressIter::new(self, multi.create_bar(total))
    }
}

impl<I: Iterator> ProgressIteratorExt for I {}

/// The exact length of `iter` if it reports one, otherwise zero.
fn total_from_size_hint(iter: &impl Iterator) -> u64 {
    match iter.size_hint() {
        (lower, Some(upper)) if lower == upper => lower as u64,
        _ => 0,
    }
}
