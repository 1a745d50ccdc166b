//! # `pbar`
//!
//! Terminal progress bars that can be shared across threads.
//!
//! `pbar` draws one bar per line and redraws it in place. It is designed to be:
//!
//! * **Safe to share**: bar handles are cheap to clone ([`Arc`](std::sync::Arc)-based) and
//!   every update of a bar is serialized, so worker threads can drive the same bar.
//! * **Quiet under load**: renders are throttled (100 ms by default) while the counts stay
//!   exact, and a closed output stream turns into a silent no-op instead of an error.
//! * **Composable**: [`MultiBar`] stacks bars on fixed rows and owns the stream, so bars
//!   and `println` output from many threads never interleave.
//!
//! ## Modules
//!
//! * [`progress`]: The [`ProgressBar`] handle and its [`BarSnapshot`].
//! * [`multi`]: The [`MultiBar`] registry and its [`Row`] draw target.
//! * [`builder`]: Fluent interface for constructing configured [`ProgressBar`]s.
//! * [`style`]: Plain-data display configuration ([`Style`]).
//! * [`template`]: `{token}` line templates.
//! * [`target`]: Where rendered lines go ([`DrawTarget`], [`Stream`]).
//! * [`units`]: Count, byte and duration formatting.
//! * [`io`]: Wrappers for [`std::io::Read`] and [`std::io::Write`] that track progress automatically.
//! * [`iter`]: Extension traits for tracking progress on Iterators.
//!
//! ## Example
//!
//! ```no_run
//! use pbar::{ProgressBar, Stream, Units};
//!
//! let pb = ProgressBar::on_stream(Stream::Stderr, 4 * 1024 * 1024);
//! pb.set_units(Units::Bytes);
//! pb.message("download: ");
//! for _ in 0..64 {
//!     pb.add(64 * 1024);
//! }
//! pb.finish_println("done");
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod builder;
pub mod error;
pub mod io;
pub mod iter;
pub mod multi;
pub mod progress;
mod render;
pub mod style;
pub mod target;
pub mod template;
pub mod units;

pub use builder::ProgressBarBuilder;
pub use error::{Error, Result};
pub use iter::{ProgressIter, ProgressIteratorExt};
pub use multi::{MultiBar, Row};
pub use progress::{BarSnapshot, ProgressBar};
pub use style::{BarGlyphs, Component, Components, Style, TickGlyphs};
pub use target::{DrawTarget, Stream, Terminal};
pub use template::{Template, Token};
pub use units::{DurationUnit, Units};
