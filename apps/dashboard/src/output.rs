//! Renders dashboard regions to the terminal and to files in an output directory.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

use dashboard_core::{
    view::{ChartSink, SessionSink, StatusSink, TableSink},
    RetryRequest,
};
use serde::Serialize;
use shared::{
    domain::{ChartRegion, TableResult},
    protocol::{ChartSpec, RenderOptions},
};
use tracing::{debug, error, info};

pub const TABLE_FILE: &str = "table.html";

pub fn chart_file(region: ChartRegion) -> String {
    format!("{}.json", region.container_id())
}

/// What a chart renderer needs to draw one region.
#[derive(Debug, Serialize)]
struct ChartDocument<'a> {
    data: &'a [serde_json::Value],
    layout: &'a serde_json::Map<String, serde_json::Value>,
    config: &'a RenderOptions,
}

pub struct OutputView {
    dir: PathBuf,
    session_expired: AtomicBool,
}

impl OutputView {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            session_expired: AtomicBool::new(false),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn session_expired(&self) -> bool {
        self.session_expired.load(Ordering::SeqCst)
    }

    fn write(&self, name: &str, contents: &[u8]) {
        let path = self.dir.join(name);
        match fs::write(&path, contents) {
            Ok(()) => debug!(path = %path.display(), "output: written"),
            Err(err) => error!(path = %path.display(), error = %err, "output: write failed"),
        }
    }
}

impl TableSink for OutputView {
    fn show_loading(&self) {
        println!("Loading...");
    }

    fn show_table(&self, table: &TableResult) {
        self.write(TABLE_FILE, table.rendered_markup.as_bytes());
        info!(columns = ?table.column_names, "output: table rendered");
    }

    fn show_record_count(&self, label: &str) {
        println!("{label}");
    }

    fn show_error(&self, retry: &RetryRequest) {
        eprintln!("Error loading data: {}", retry.message);
        eprintln!("Run the same command again to retry.");
    }
}

impl ChartSink for OutputView {
    fn render(&self, region: ChartRegion, spec: &ChartSpec, options: &RenderOptions) {
        let document = ChartDocument {
            data: &spec.data,
            layout: &spec.layout,
            config: options,
        };
        match serde_json::to_vec_pretty(&document) {
            Ok(bytes) => self.write(&chart_file(region), &bytes),
            Err(err) => error!(
                region = region.container_id(),
                error = %err,
                "output: chart encode failed"
            ),
        }
    }

    fn set_visible(&self, region: ChartRegion, visible: bool) {
        if visible {
            return;
        }
        let path = self.dir.join(chart_file(region));
        match fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "output: hidden chart removed"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => error!(path = %path.display(), error = %err, "output: remove failed"),
        }
    }
}

impl StatusSink for OutputView {
    fn show_status(&self, text: &str) {
        println!("{text}");
    }

    fn set_controls_enabled(&self, _enabled: bool) {}
}

impl SessionSink for OutputView {
    fn reload(&self) {
        self.session_expired.store(true, Ordering::SeqCst);
    }
}
