//! # lumeq-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `CommandQueue` — the transactional claim/complete protocol
//!   - `ButtonEventRepository` — fetch, claim, and drain raw button presses
//!   - `DeviceDirectory` / `GroupDirectory` — read-only lookups
//!   - `VendorAdapter` — validate, transform, and send abstract commands
//! - Define **use-case services**:
//!   - `DispatchService` — claim a batch and push each record through an adapter
//!   - `CommandProcessor` — the per-brand polling loop around dispatch
//!   - `ButtonResolver` — button press → abstract command, including group
//!     toggle resolution
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `lumeq-domain` only (plus `tokio::time` for the poll loops).
//! Never imports adapter crates. Adapters depend on *this* crate, not the
//! reverse.

pub mod ports;
pub mod services;
