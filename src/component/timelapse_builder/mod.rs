//! 縮時攝影元件
//!
//! 依日夜過濾每個資料夾的照片，逐資料夾編碼成片段後依日期串接成單一影片

mod folder_batch;
mod frame_collector;
mod global_assembler;
mod main;

pub use folder_batch::{
    FolderBatch, disambiguate_manifest_paths, format_template_date, render_template,
};
pub use frame_collector::{FolderScan, Frame, FrameCollector, read_frame};
pub use global_assembler::{GlobalAssembler, Segment, order_segments};
pub use main::{RunSummary, TimelapseBuilder};
