//! Data models
//!
//! Shared between activation-server and its clients (via API).
//! All IDs are opaque strings issued by the upstream platform.

pub mod branch;
pub mod package;
pub mod registration;
pub mod reservation;
pub mod session;
pub mod trainer;

// Re-exports
pub use branch::*;
pub use package::*;
pub use registration::*;
pub use reservation::*;
pub use session::*;
pub use trainer::*;
