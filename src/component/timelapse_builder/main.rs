use super::folder_batch::{FolderBatch, disambiguate_manifest_paths};
use super::frame_collector::FrameCollector;
use super::global_assembler::{GlobalAssembler, Segment};
use crate::config::TimelapseConfig;
use crate::tools::{
    Ephemeris, ExifMetadataReader, MetadataReader, SolarWindow, SunriseEphemeris, TaskScheduler,
    ensure_directory_exists, list_source_folders, to_absolute, validate_directory_exists,
};
use anyhow::{Result, bail};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct RunSummary {
    pub folders: usize,
    pub frames_scanned: usize,
    pub frames_kept: usize,
    pub frames_night: usize,
    pub frame_failures: usize,
    pub manifests_written: usize,
    pub manifest_failures: usize,
    pub segments_encoded: usize,
    pub segments_failed: usize,
    pub output_path: PathBuf,
    pub elapsed: Duration,
}

impl RunSummary {
    #[must_use]
    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed.as_secs_f64() / 60.0
    }

    pub fn print(&self) {
        println!();
        println!("{}", style("=== 縮時攝影摘要 ===").cyan().bold());
        println!("  資料夾: {} 個", self.folders);
        println!(
            "  影像: 掃描 {} 張，保留 {} 張，夜間 {} 張",
            self.frames_scanned,
            style(self.frames_kept).green(),
            self.frames_night
        );
        if self.frame_failures > 0 {
            println!("  無法讀取: {} 張", style(self.frame_failures).red());
        }
        println!("  清單: {} 份", self.manifests_written);
        if self.manifest_failures > 0 {
            println!("  清單寫入失敗: {} 份", style(self.manifest_failures).red());
        }
        println!("  片段: 成功 {} 個", style(self.segments_encoded).green());
        if self.segments_failed > 0 {
            println!("  片段失敗: {} 個", style(self.segments_failed).red());
        }
        println!("  耗時: {:.1} 分鐘", self.elapsed_minutes());
        println!(
            "{}",
            style(format!("輸出檔案: {}", self.output_path.display())).green()
        );
    }
}

/// 掃描、分批、編碼、合併的完整流程
pub struct TimelapseBuilder<M: MetadataReader = ExifMetadataReader, E: Ephemeris = SunriseEphemeris>
{
    config: TimelapseConfig,
    reader: M,
    window: SolarWindow<E>,
    shutdown_signal: Arc<AtomicBool>,
}

impl TimelapseBuilder {
    #[must_use]
    pub fn new(config: TimelapseConfig, shutdown_signal: Arc<AtomicBool>) -> Self {
        let ephemeris = SunriseEphemeris::new(config.utc_offset());
        Self::with_collaborators(config, ExifMetadataReader, ephemeris, shutdown_signal)
    }
}

impl<M: MetadataReader, E: Ephemeris> TimelapseBuilder<M, E> {
    pub fn with_collaborators(
        config: TimelapseConfig,
        reader: M,
        ephemeris: E,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        let window = SolarWindow::new(ephemeris, config.location, config.night_buffer());
        Self {
            config,
            reader,
            window,
            shutdown_signal,
        }
    }

    pub fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        let config = self.resolved_config()?;
        let mut summary = RunSummary::default();

        let folders = list_source_folders(&config.source_root)?;
        info!("找到 {} 個資料夾", folders.len());
        summary.folders = folders.len();

        let mut batches = self.scan_folders(&config, &folders, &mut summary);
        self.check_shutdown()?;

        disambiguate_manifest_paths(&mut batches);
        let written = Self::write_manifests(batches, &mut summary);

        let segments = self.encode_segments(&config, &written, &mut summary)?;

        let assembler = GlobalAssembler::new(
            &config.encoder,
            &config.chunks_manifest_path(),
            &config.output_path(),
        );
        summary.output_path = assembler.assemble(segments)?;
        summary.elapsed = started.elapsed();

        info!("完成，耗時 {:.1} 分鐘", summary.elapsed_minutes());
        Ok(summary)
    }

    fn resolved_config(&self) -> Result<TimelapseConfig> {
        self.config.validate()?;

        let mut config = self.config.clone();
        config.source_root = to_absolute(&config.source_root)?;
        validate_directory_exists(&config.source_root)?;

        config.output_dir = to_absolute(&config.output_dir)?;
        ensure_directory_exists(&config.output_dir)?;
        Ok(config)
    }

    fn check_shutdown(&self) -> Result<()> {
        if self.shutdown_signal.load(Ordering::SeqCst) {
            bail!("已中斷");
        }
        Ok(())
    }

    /// 每個資料夾平行掃描並排序，全部完成後才回傳
    fn scan_folders(
        &self,
        config: &TimelapseConfig,
        folders: &[PathBuf],
        summary: &mut RunSummary,
    ) -> Vec<FolderBatch> {
        let progress_bar = ProgressBar::new(folders.len() as u64);
        if let Ok(progress_style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            progress_bar.set_style(progress_style.progress_chars("#>-"));
        }
        progress_bar.set_message("讀取 EXIF 中...");

        let collector =
            FrameCollector::new(config, &self.reader, &self.window, &self.shutdown_signal);

        let scans: Vec<_> = folders
            .par_iter()
            .map(|folder| {
                let scan = collector.collect(folder);
                progress_bar.inc(1);
                scan
            })
            .collect();

        progress_bar.finish_with_message("完成");

        scans
            .into_iter()
            .filter_map(|scan| {
                summary.frames_scanned += scan.scanned;
                summary.frames_kept += scan.frames.len();
                summary.frames_night += scan.night_frames;
                summary.frame_failures += scan.failures.len();

                let batch = FolderBatch::build(
                    &scan.folder,
                    scan.frames,
                    &config.output_template,
                    &config.output_dir,
                );
                if batch.is_none() {
                    info!("{}: 沒有白天的影像，略過", scan.folder.display());
                }
                batch
            })
            .collect()
    }

    fn write_manifests(batches: Vec<FolderBatch>, summary: &mut RunSummary) -> Vec<FolderBatch> {
        let results: Vec<_> = batches
            .into_par_iter()
            .map(|batch| {
                let result = batch.write_manifest().map(|_| ());
                (batch, result)
            })
            .collect();

        results
            .into_iter()
            .filter_map(|(batch, result)| match result {
                Ok(()) => {
                    summary.manifests_written += 1;
                    Some(batch)
                }
                Err(e) => {
                    error!("{}: {e}", batch.folder.display());
                    summary.manifest_failures += 1;
                    None
                }
            })
            .collect()
    }

    /// 所有片段編碼結束後，只回傳成功的片段
    fn encode_segments(
        &self,
        config: &TimelapseConfig,
        batches: &[FolderBatch],
        summary: &mut RunSummary,
    ) -> Result<Vec<Segment>> {
        let manifest_paths: Vec<PathBuf> =
            batches.iter().map(|b| b.manifest_path.clone()).collect();

        let mut scheduler = TaskScheduler::new(
            &manifest_paths,
            config.encoder.clone(),
            Arc::clone(&self.shutdown_signal),
        );
        scheduler.run()?;

        let segments: Vec<Segment> = scheduler
            .into_tasks()
            .into_iter()
            .zip(batches)
            .filter_map(|(task, batch)| {
                if task.succeeded() {
                    summary.segments_encoded += 1;
                    Some(Segment {
                        path: task.segment_path,
                        start_date: batch.start_date,
                    })
                } else {
                    summary.segments_failed += 1;
                    warn!(
                        "{} 的片段編碼失敗，不會納入最終影片",
                        batch.folder.display()
                    );
                    None
                }
            })
            .collect();

        Ok(segments)
    }
}
