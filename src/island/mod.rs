//! The island's expansion logic: states, reducer, deferred actions and the
//! controller that ties them to the window.

mod controller;
pub mod scheduler;
mod state;

pub use controller::{ExpansionController, FrameSink};
pub use state::IslandTimings;
