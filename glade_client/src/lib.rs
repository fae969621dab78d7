//! `glade_client`
//!
//! Client-side systems:
//! - Connection management over the framed relay protocol
//! - Room state mirroring (players, world, scoreboard, chat)
//! - Local viewpoint kinematics and decoupled look control
//! - Interpolation for remote entity transforms
//! - View-only projectile tracers
//!
//! Rendering, HUD widgets and raw input capture are external collaborators;
//! they consume the state these modules produce.

pub mod client;
pub mod input;
pub mod interp;
pub mod kinematics;
pub mod projectile;

pub use client::GameClient;
