//! Sheet registry, group index and the fetch pipeline.
//!
//! # Architecture
//!
//! - [`SheetLoader`] owns the group index and a `DashMap` of records
//! - `get_or_load` flips `NotLoaded → Loading` under the record's shard lock
//!   and spawns the fetch pipeline on the tokio runtime
//! - the pipeline stores `Loaded` (with a standing data-source listener) or
//!   `Error` when it completes
//! - every mutation is reported through [`UpdateNotifier`] subscribers
//!
//! # State machine
//!
//! ```text
//! NotLoaded ──get_or_load──▶ Loading ──▶ Loaded
//!                                   └──▶ Error
//! ```
//!
//! Only [`SheetLoader::restore`] moves a record backwards.

mod loader;
mod notify;
mod pipeline;
mod snapshot;
mod state;

pub use loader::SheetLoader;
pub use notify::{SheetUpdate, UpdateKind, UpdateNotifier};
pub use snapshot::{LoaderSnapshot, SheetSnapshot};
pub use state::{Sheet, SheetGroup, SheetState, SheetSummary};
