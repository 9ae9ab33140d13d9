//! Snapshot publication integration tests
//!
//! Ranks are threads of one process sharing a `LocalGroup` and a
//! `MemoryStore`; every test reads results back the way a consumer would.

#[path = "../common/mod.rs"]
mod common;

mod failure;
mod lifecycle;
mod scenario;
mod tiling;
