// Handler modules
pub mod checks;
pub mod scan;

// Re-export all handler functions
pub use checks::handle_checks;
pub use scan::{ScanOptions, handle_scan};
