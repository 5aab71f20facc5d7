//! Session orchestration
//!
//! [`HarvestSession`] is the caller the engine components were built for. It
//! owns fresh instances of each one, so sessions never share learned state.

pub mod download;
pub mod session;

pub use download::{ButtonDownload, DownloadAction, DownloadOutcome};
pub use session::{DownloadSummary, HarvestReport, HarvestSession, HarvestedItem, Termination};
