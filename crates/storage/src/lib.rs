//! In-process staging store for snapstage
//!
//! This crate implements the staging store seam with:
//! - MemoryStore: shared array / metadata / shape tables (DashMap)
//! - MemoryClient: one process's connection handle, collective init
//! - Fault injection: fail the next matching call with a chosen status
//! - Journal: ordered record of successful mutating calls per rank
//!
//! The store is the reference implementation used by tests and single-node
//! runs. Arrays are version-addressed; republishing the same region at the
//! same version overwrites it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod region;
pub mod store;

pub use client::MemoryClient;
pub use store::{MemoryStore, StoreEvent};
