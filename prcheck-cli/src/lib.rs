// All core functionality is in prcheck-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod locations;

// Re-export core types for convenience
pub use prcheck_core::*;

// Re-export CLI utilities
pub use locations::Locations;
