//! `glade_server`
//!
//! Relay-side systems:
//! - Room registry keyed by join code
//! - Per-room session state (players, animals, world, obstacles)
//! - Fixed-period animal AI tick per room
//! - Event routing and fan-out over one TCP endpoint
//!
//! Trust model: clients are authoritative over their own transforms. The
//! relay arbitrates health, kills/deaths and broadcast order only.

pub mod registry;
pub mod relay;
pub mod session;

pub use relay::Relay;
