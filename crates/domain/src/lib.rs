//! # lumeq-domain
//!
//! Pure domain model for the lumeq smart-lighting command pipeline.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define the **abstract command** vocabulary (`turn`, `brightness`, `toggle`)
//!   that sits between button resolution and vendor adapters
//! - Define **command records** (queued work items with a status lifecycle)
//! - Define **button events** (raw remote presses awaiting resolution)
//! - Define **devices** and **device groups** (read-only directory entries)
//! - Define the **button mapping** (immutable `(remote, button)` → target table)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod button;
pub mod command;
pub mod device;
pub mod group;
pub mod mapping;
