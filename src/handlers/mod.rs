// Handler modules
pub mod usage;

// Re-export all handler functions
pub use usage::{handle_pods, handle_report, handle_statefulset};
