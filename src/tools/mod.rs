mod cpu_monitor;
mod ffmpeg_command;
mod folder_scanner;
mod manifest;
mod metadata_reader;
mod path_validator;
pub(crate) mod solar_window;
mod task_scheduler;
mod timestamp_parser;

pub use cpu_monitor::CpuMonitor;
pub use ffmpeg_command::{FfmpegCommand, SEGMENT_EXTENSION};
pub use folder_scanner::{list_source_folders, scan_image_files};
pub use manifest::{manifest_line, parse_manifest_line, read_manifest, render_manifest, write_manifest};
pub use metadata_reader::{
    CAPTURE_TIME_TAG, ExifMetadataReader, MetadataReader, MetadataTags, TagValue,
    capture_time_text,
};
pub use path_validator::{ensure_directory_exists, to_absolute, validate_directory_exists};
pub use solar_window::{DayPhase, Ephemeris, SolarWindow, SunTimes, SunriseEphemeris};
pub use task_scheduler::{EncodingTask, TaskScheduler, TaskStatus};
pub use timestamp_parser::parse_exif_timestamp;
