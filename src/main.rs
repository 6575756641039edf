use anyhow::Result;
use console::style;
use daylight_timelapse::component::TimelapseBuilder;
use daylight_timelapse::config::TimelapseConfig;
use daylight_timelapse::init;
use daylight_timelapse::signal::setup_shutdown_signal;
use dialoguer::Input;
use log::{error, info};
use std::path::PathBuf;

fn main() -> Result<()> {
    init::init();
    let shutdown_signal = setup_shutdown_signal()?;

    let mut config = TimelapseConfig::new()?;
    if config.source_root.as_os_str().is_empty() {
        config.source_root = prompt_source_root()?;
    }

    println!("{}", style("=== 白天縮時攝影 ===").cyan().bold());
    let builder = TimelapseBuilder::new(config, shutdown_signal);

    match builder.run() {
        Ok(summary) => {
            summary.print();
            info!("Program exited normally");
            Ok(())
        }
        Err(e) => {
            error!("縮時攝影產生失敗: {e:#}");
            Ok(())
        }
    }
}

fn prompt_source_root() -> Result<PathBuf> {
    let path: String = Input::new()
        .with_prompt("請輸入照片根目錄路徑")
        .interact_text()?;
    Ok(PathBuf::from(path.trim()))
}
