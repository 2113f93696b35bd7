//! Filmroll Store - the on-disk side of the film collection mirror
//!
//! Owns the content directory: one `<slug>.json` record and one
//! `<slug>.<ext>` poster per film, plus the aggregate snapshot written
//! elsewhere. [`Reconciler`] merges a fresh scrape into it.

pub mod entry;
pub mod fsutil;
pub mod image;
pub mod reconcile;
pub mod report;
pub mod slug;
pub mod snapshot;

pub use entry::{PersistedEntry, load_entries};
pub use image::{CacheError, CacheOutcome, ImageCache};
pub use reconcile::{FailurePolicy, ReconcileError, Reconciler, dedupe_and_sort};
pub use report::RunReport;
pub use slug::slugify;
pub use snapshot::{SnapshotEntry, write_snapshot};
