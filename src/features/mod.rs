//! Feature construction.
//!
//! Two producers share one naming scheme: [`build_supervised`] turns the
//! daily history into a complete-rows feature table with one-step-ahead
//! targets, and [`build_future_row`] derives the single row for the day
//! being forecast directly from the history tail.

mod future;
mod supervised;

pub use future::{align_row, build_future_row, fallback_values};
pub use supervised::build_supervised;
