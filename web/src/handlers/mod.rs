//! HTTP and WebSocket handlers.

pub mod health;
pub mod rooms;

// Re-export common handler utilities
pub use health::{HealthReport, health_check};
pub use rooms::expert_rooms_socket;
