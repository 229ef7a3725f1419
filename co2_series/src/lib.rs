//! CO2 time-series core: incremental caching of today's readings, display
//! downsampling, Savitzky-Golay smoothing, derivatives on irregular time
//! grids, dwell-time accounting, and a write-once archive of finished days.

#![deny(missing_docs)]

pub mod cache;
pub mod config;
pub mod day;
pub mod db;
pub mod downsample;
pub mod dwell;
pub mod gradient;
pub mod ingest;
pub mod models;
pub mod monitor;
pub mod pipeline;
#[allow(missing_docs)]
pub mod schema;
pub mod smoothing;
pub mod status;
pub mod store;
pub mod summary;
pub mod tz;

pub use day::{Clock, DayCalendar, DayKey, ManualClock, SystemClock};
pub use models::Reading;
pub use monitor::{Monitor, Payload};
pub use pipeline::{Pipeline, ProcessedSeries};
