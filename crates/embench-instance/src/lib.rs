//! # Embench Instance
//!
//! Lifecycle controller for isolated embedded application instances.
//!
//! This crate provides functionality for:
//! - Driving one instance per controller through the lifecycle state machine
//! - Scratch provisioning, listener binding, and application boot
//! - Bounded startup synchronization with the application's own init
//! - Read-only instance handles for trial code
//! - Idempotent teardown with best-effort scratch reclamation

pub mod config;
pub mod controller;
pub mod handle;

pub use config::InstanceConfig;
pub use controller::InstanceController;
pub use handle::InstanceHandle;
