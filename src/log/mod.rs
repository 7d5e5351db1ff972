//! Log Module
//!
//! The segmented commit log itself.
//!
//! ## Offset Layout
//! ```text
//!   segment 0            segment 3            segment 7 (active)
//! ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────┐
//! │ 0.store 0.index  │ │ 3.store 3.index  │ │ 7.store 7.index  │
//! │ offsets 0..=2    │ │ offsets 3..=6    │ │ offsets 7..      │ ← append
//! └──────────────────┘ └──────────────────┘ └──────────────────┘
//!          ▲
//!          └── truncate(2) drops this segment
//! ```
//!
//! A segment's base offset is the next unused offset at the moment the
//! previous segment was rotated, so segments are contiguous and never overlap.

mod manager;
mod reader;

pub use manager::Log;
pub use reader::{LogReader, SegmentReader};
