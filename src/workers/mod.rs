/// Background tasks
pub mod auto_selection_monitor;


// Re-export commonly used types
pub use auto_selection_monitor::{AutoSelectionEvent, AutoSelectionMonitor, PollerState};
