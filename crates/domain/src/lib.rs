//! # smartfarm-domain
//!
//! Pure domain model for the smartfarm device-messaging fabric.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Farms** and **Beds** (the installation hierarchy)
//! - Define **Sensors** and **Actuators** (specs, snapshots, the action vocabulary)
//! - Define **Envelopes** (typed payloads and their boundary validation)
//! - Define **Topics** (pattern matching and both naming schemes)
//! - Define **Command records** (the audit trail of dispatched commands)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or runtime crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod actuator;
pub mod command;
pub mod envelope;
pub mod farm;
pub mod sensor;
pub mod topic;
