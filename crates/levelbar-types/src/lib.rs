//! Shared data model for levelbar.
//!
//! A [`Snapshot`] is one fetched state of the outside world: an aggregate
//! total plus an ordered list of [`Level`]s, each holding a count and the
//! [`Detail`] records behind it. This crate has no engine dependencies; it
//! only knows how to describe and parse that state.
//!
//! ```text
//! Snapshot { total }
//!     └── Level { name, value }       (ordered, display order)
//!             └── Detail { id, subject, organization? }
//! ```
//!
//! # Key Types
//!
//! |------------------|------------------------------------------------|
//! | Type             | Purpose                                        |
//! |------------------|------------------------------------------------|
//! | [`Snapshot`]     | Total + ordered levels, parsed from JSON       |
//! | [`Level`]        | Named category with a value and detail records |
//! | [`Detail`]       | Leaf record pointing at an external resource   |
//! | [`DetailId`]     | Opaque string-or-number identifier             |
//! | [`Ticket`]       | Flat ticket record, groupable into a snapshot  |
//! |------------------|------------------------------------------------|

pub mod ids;
pub mod snapshot;
pub mod tickets;

pub use ids::DetailId;
pub use snapshot::{Detail, Level, Snapshot, SnapshotError};
pub use tickets::{Ticket, group_by_department};
