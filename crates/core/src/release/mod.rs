//! Local release profiling.
//!
//! Computes the on-disk size of a release and guesses its title, year and
//! episode numbering from the name.

mod guesser;
mod profiler;
mod types;

pub use guesser::{HeuristicGuesser, MetadataGuesser};
pub use profiler::{total_size, ReleaseProfiler};
pub use types::*;
