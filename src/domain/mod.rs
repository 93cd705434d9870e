//! Domain types and DTOs
//!
//! These types define the data structures of the intake pipeline: the closed
//! field set, the step table, analysis results, sessions and SOW documents.

pub mod analysis;
pub mod documents;
pub mod intake;
pub mod session;
pub mod steps;

// Re-export commonly used types
pub use analysis::*;
pub use documents::*;
pub use intake::*;
pub use session::*;
pub use steps::*;
