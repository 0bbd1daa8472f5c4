//! View model of the dashboard page and the sinks that render it.

use std::sync::Arc;

use serde::Serialize;
use shared::{
    domain::{ChartRegion, FilterState, TableResult},
    protocol::{ChartSpec, RenderOptions},
};

use crate::summary::READY_STATUS;

/// Table failure with enough context to run the same cycle again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryRequest {
    pub state: FilterState,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableRegion {
    Idle,
    Loading,
    Loaded { table: TableResult },
    Error { retry: RetryRequest },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NurseWiseRegion {
    Hidden,
    Visible { spec: ChartSpec },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub controls_enabled: bool,
    pub status: String,
    pub table: TableRegion,
    pub record_count: Option<String>,
    pub monthly_trend: Option<ChartSpec>,
    pub escalation_distribution: Option<ChartSpec>,
    pub nurse_wise_trend: NurseWiseRegion,
    /// Sequence number of the most recently issued apply cycle.
    pub latest_sequence: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            controls_enabled: true,
            status: READY_STATUS.to_string(),
            table: TableRegion::Idle,
            record_count: None,
            monthly_trend: None,
            escalation_distribution: None,
            nurse_wise_trend: NurseWiseRegion::Hidden,
            latest_sequence: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    Status(String),
    /// Disables controls and puts the table region in its loading state.
    Loading,
    LoadingCleared,
    Table(TableResult),
    TableFailed(RetryRequest),
    Chart(ChartRegion, ChartSpec),
    NurseWiseHidden,
}

impl ViewState {
    pub fn dispatch(&mut self, update: &ViewUpdate) {
        match update {
            ViewUpdate::Status(text) => self.status = text.clone(),
            ViewUpdate::Loading => {
                self.controls_enabled = false;
                self.table = TableRegion::Loading;
            }
            ViewUpdate::LoadingCleared => self.controls_enabled = true,
            ViewUpdate::Table(table) => {
                self.record_count = Some(record_count_label(table.row_count));
                self.table = TableRegion::Loaded {
                    table: table.clone(),
                };
            }
            ViewUpdate::TableFailed(retry) => {
                self.table = TableRegion::Error {
                    retry: retry.clone(),
                };
            }
            ViewUpdate::Chart(region, spec) => match region {
                ChartRegion::MonthlyTrend => self.monthly_trend = Some(spec.clone()),
                ChartRegion::EscalationDistribution => {
                    self.escalation_distribution = Some(spec.clone())
                }
                ChartRegion::NurseWiseTrend => {
                    self.nurse_wise_trend = NurseWiseRegion::Visible { spec: spec.clone() }
                }
            },
            ViewUpdate::NurseWiseHidden => self.nurse_wise_trend = NurseWiseRegion::Hidden,
        }
    }

    pub fn is_loading(&self) -> bool {
        !self.controls_enabled
    }
}

pub fn record_count_label(row_count: u64) -> String {
    format!("{row_count} records found")
}

pub trait TableSink: Send + Sync {
    fn show_loading(&self);
    fn show_table(&self, table: &TableResult);
    fn show_record_count(&self, label: &str);
    fn show_error(&self, retry: &RetryRequest);
}

pub trait ChartSink: Send + Sync {
    fn render(&self, region: ChartRegion, spec: &ChartSpec, options: &RenderOptions);
    fn set_visible(&self, region: ChartRegion, visible: bool);
}

pub trait StatusSink: Send + Sync {
    fn show_status(&self, text: &str);
    fn set_controls_enabled(&self, enabled: bool);
}

/// Hook for an expired session; the front end re-authenticates out of band.
pub trait SessionSink: Send + Sync {
    fn reload(&self);
}

pub struct DetachedView;

impl TableSink for DetachedView {
    fn show_loading(&self) {}
    fn show_table(&self, _table: &TableResult) {}
    fn show_record_count(&self, _label: &str) {}
    fn show_error(&self, _retry: &RetryRequest) {}
}

impl ChartSink for DetachedView {
    fn render(&self, _region: ChartRegion, _spec: &ChartSpec, _options: &RenderOptions) {}
    fn set_visible(&self, _region: ChartRegion, _visible: bool) {}
}

impl StatusSink for DetachedView {
    fn show_status(&self, _text: &str) {}
    fn set_controls_enabled(&self, _enabled: bool) {}
}

impl SessionSink for DetachedView {
    fn reload(&self) {}
}

#[derive(Clone)]
pub struct Sinks {
    pub table: Arc<dyn TableSink>,
    pub charts: Arc<dyn ChartSink>,
    pub status: Arc<dyn StatusSink>,
    pub session: Arc<dyn SessionSink>,
}

impl Sinks {
    pub fn detached() -> Self {
        let view = Arc::new(DetachedView);
        Self {
            table: view.clone(),
            charts: view.clone(),
            status: view.clone(),
            session: view,
        }
    }

    /// One adapter that renders every region.
    pub fn from_view<V>(view: Arc<V>) -> Self
    where
        V: TableSink + ChartSink + StatusSink + SessionSink + 'static,
    {
        Self {
            table: view.clone(),
            charts: view.clone(),
            status: view.clone(),
            session: view,
        }
    }

    pub(crate) fn forward(&self, update: &ViewUpdate, options: &RenderOptions) {
        match update {
            ViewUpdate::Status(text) => self.status.show_status(text),
            ViewUpdate::Loading => {
                self.table.show_loading();
                self.status.set_controls_enabled(false);
            }
            ViewUpdate::LoadingCleared => self.status.set_controls_enabled(true),
            ViewUpdate::Table(table) => {
                self.table.show_table(table);
                self.table
                    .show_record_count(&record_count_label(table.row_count));
            }
            ViewUpdate::TableFailed(retry) => self.table.show_error(retry),
            ViewUpdate::Chart(region, spec) => {
                if *region == ChartRegion::NurseWiseTrend {
                    self.charts.set_visible(*region, true);
                }
                self.charts.render(*region, spec, options);
            }
            ViewUpdate::NurseWiseHidden => {
                self.charts.set_visible(ChartRegion::NurseWiseTrend, false)
            }
        }
    }
}
