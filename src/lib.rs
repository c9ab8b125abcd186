//! # Archive Cache
//!
//! A polling fetch-and-retention engine that keeps a local, queryable mirror
//! of completed-job archives in sync with one or more remote archive
//! directories, under a bounded-size/expiration retention policy.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌─────────────┐
//! │  Locations   │──▶│ Fetch Cycle  │──▶│   Store      │
//! │ (poll dirs)  │   │ (reconciler) │   │ file / kv   │
//! └──────────────┘   └──────┬───────┘   └──────┬──────┘
//!                           │                  │
//!                    events ▼                  ▼ reads
//!                    ┌──────────┐       ┌──────────┐
//!                    │ Listener │       │   HTTP   │
//!                    │ callback │       │ (extern) │
//!                    └──────────┘       └──────────┘
//! ```
//!
//! Each cycle lists every monitored location, ingests newly archived jobs
//! into the storage backend, evicts entries beyond the retention limit or
//! gone from their source, rebuilds the combined overview document, and
//! notifies the registered listener. The HTTP layer is a pure read-through
//! front end over the store and never participates in reconciliation.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and fail-fast validation |
//! | [`models`] | Core data types and document schemas |
//! | [`error`] | Error taxonomy |
//! | [`source`] | Archive directory sources and bundle decoding |
//! | [`cache`] | Per-location ingested-id bookkeeping |
//! | [`store`] | Pluggable storage backend contract and factory |
//! | [`store_fs`] | File-per-document backend |
//! | [`store_kv`] | Embedded SQLite key-value backend |
//! | [`legacy`] | Pre-format-change overview migration |
//! | [`overview`] | Combined overview aggregation |
//! | [`fetcher`] | The fetch cycle (reconciler) |
//! | [`poller`] | Interval scheduling and on-demand triggers |

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod legacy;
pub mod models;
pub mod overview;
pub mod poller;
pub mod source;
pub mod store;
pub mod store_fs;
pub mod store_kv;
