//! External service clients.

mod maintenance;
mod verify;

pub use maintenance::Maintenance;
pub use verify::VerifyGate;
