mod island_window;
pub mod screen_monitor;

pub use island_window::{IslandWindow, WindowFrameSink};
pub use screen_monitor::start_monitoring as start_screen_monitor;
