//! # Payload specs
//!
//! Shape of the remote payloads and the pure transforms that turn them into
//! rows. Nothing in here touches the network or the disk.
//!
//! ## Typical call chain
//! ```text
//! pipeline → fetch::HttpFetcher → core::net (status + body)
//!                             ↘  specs::area_tree::flatten → Snapshot
//!          → store::SnapshotStore::append
//! ```
//!
//! ## Conventions
//! - Payload field names stay as the server spells them (`TotalCount`,
//!   `UnavailableSpace`, `childArea`) through serde renames; Rust side uses
//!   snake_case.
//! - Flattening is a pure function of (tree, minute).

pub mod area_tree;

pub use area_tree::{flatten, AreaId, AreaNode, OccupancyRecord, Snapshot};
