// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod engine;
mod gui;
mod scope;
mod types;
mod visualizer;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use eframe::egui;
use log::info;

use crate::scope::ScopeConfig;

// 读取配置：第一个命令行参数为 JSON 配置文件路径，缺省时使用默认值
fn load_config() -> Result<ScopeConfig> {
    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        return Ok(ScopeConfig::default());
    };
    let text = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = ScopeConfig::from_json_str(&text)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    info!("loaded config from {}", path.display());
    Ok(config)
}

// 入口函数
fn main() -> Result<()> {
    env_logger::init();
    let config = load_config()?;
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1400.0, 900.0])
        .with_min_inner_size([900.0, 600.0])
        .with_title("DualScope");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "DualScope",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(gui::DualScopeApp::new(&config))
        }),
    )
    .map_err(|err| anyhow::anyhow!("window closed with error: {err:?}"))
}
