use std::{
    str::FromStr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use futures::future::join;
use serde::{Deserialize, Serialize};
use shared::{
    domain::{ChartRegion, FilterState, QueryParams, TableResult},
    error::{ApiError, ErrorCode},
    protocol::{ChartsResponse, FilterResponse, RenderOptions},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

pub mod chart;
pub mod error;
pub mod format;
pub mod normalize;
pub mod summary;
pub mod transport;
pub mod view;
pub mod widget;

pub use chart::{ChartBundle, ChartDecodeError};
pub use error::FetchError;
pub use normalize::normalize;
pub use summary::summarize;
pub use transport::{DashboardApi, HttpDashboardApi, HttpOptions};
pub use view::{RetryRequest, Sinks, ViewState, ViewUpdate};
pub use widget::{FilterControls, HospitalPicker, MultiSelectWidget};

/// What to do with a response whose apply cycle has since been superseded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleResponsePolicy {
    /// Every response is rendered when it arrives; the last arrival wins.
    #[default]
    ArrivalOrder,
    /// Only responses of the most recently issued cycle are rendered.
    LatestIssuedOnly,
}

impl FromStr for StaleResponsePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "arrival_order" => Ok(Self::ArrivalOrder),
            "latest_issued_only" | "latest" => Ok(Self::LatestIssuedOnly),
            other => Err(format!("unknown stale response policy '{other}'")),
        }
    }
}

/// How one region of an apply cycle settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RegionOutcome {
    Rendered,
    Failed { error: ApiError },
    ReauthRequired,
    /// A newer cycle was issued before this response arrived.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub sequence: u64,
    pub params: QueryParams,
    pub table: RegionOutcome,
    pub charts: RegionOutcome,
}

impl ApplyReport {
    pub fn requires_reauth(&self) -> bool {
        self.table == RegionOutcome::ReauthRequired
            || self.charts == RegionOutcome::ReauthRequired
    }
}

pub struct FilterController {
    api: Arc<dyn DashboardApi>,
    sinks: Sinks,
    hospitals: Option<Arc<dyn MultiSelectWidget>>,
    policy: StaleResponsePolicy,
    render_options: RenderOptions,
    sequence: AtomicU64,
    view: Mutex<ViewState>,
}

impl FilterController {
    pub fn new(api: Arc<dyn DashboardApi>) -> Self {
        Self::new_with_sinks(api, Sinks::detached())
    }

    pub fn new_with_sinks(api: Arc<dyn DashboardApi>, sinks: Sinks) -> Self {
        Self {
            api,
            sinks,
            hospitals: None,
            policy: StaleResponsePolicy::default(),
            render_options: RenderOptions::default(),
            sequence: AtomicU64::new(0),
            view: Mutex::new(ViewState::default()),
        }
    }

    pub fn with_hospital_widget(mut self, widget: Arc<dyn MultiSelectWidget>) -> Self {
        self.hospitals = Some(widget);
        self
    }

    pub fn with_policy(mut self, policy: StaleResponsePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Snapshot of the current view.
    pub async fn view(&self) -> ViewState {
        self.view.lock().await.clone()
    }

    /// Reads the controls and the attached hospital widget.
    pub fn read_state(&self, controls: &dyn FilterControls) -> FilterState {
        widget::read_filter_state(controls, self.hospitals.as_deref())
    }

    /// Runs one apply cycle: loading state, then the table and chart requests
    /// concurrently, each rendered as it settles.
    pub async fn apply(&self, state: &FilterState) -> ApplyReport {
        let params = normalize(state);
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            sequence,
            escalation = %params.escalation,
            email = %params.email,
            hospital = %params.hospital,
            date = %params.date,
            exclude_camera = %params.exclude_camera,
            "dashboard: applying filters"
        );

        let status = summarize(
            &state.escalation,
            &state.nurse_email,
            &state.hospitals,
            state.start_date,
            state.end_date,
        );
        {
            let mut view = self.view.lock().await;
            view.latest_sequence = view.latest_sequence.max(sequence);
            self.dispatch(&mut view, ViewUpdate::Loading);
            self.dispatch(&mut view, ViewUpdate::Status(status));
        }

        let (table, charts) = join(
            self.load_table(sequence, state, &params),
            self.load_charts(sequence, state, &params),
        )
        .await;

        ApplyReport {
            sequence,
            params,
            table,
            charts,
        }
    }

    pub async fn retry(&self, request: &RetryRequest) -> ApplyReport {
        info!(reason = %request.message, "dashboard: retrying table load");
        self.apply(&request.state).await
    }

    /// Restores default filters, selects every hospital, and applies.
    pub async fn reset(&self, state: &mut FilterState) -> ApplyReport {
        if let Some(widget) = &self.hospitals {
            state.hospitals.available = widget.options();
        }
        state.reset();
        if let Some(widget) = &self.hospitals {
            widget.set_selection(state.hospitals.selected.clone());
        }
        self.apply(state).await
    }

    /// Waits for the next hospital selection change and re-applies the filters.
    /// Returns `None` once the widget has gone away.
    pub async fn apply_next_hospital_change(
        &self,
        changes: &mut broadcast::Receiver<Vec<String>>,
        controls: &dyn FilterControls,
    ) -> Option<ApplyReport> {
        match changes.recv().await {
            Ok(selection) => {
                debug!(selected = selection.len(), "dashboard: hospital selection changed")
            }
            // Only the latest selection matters; the state is re-read below.
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "dashboard: hospital changes coalesced")
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
        let state = self.read_state(controls);
        Some(self.apply(&state).await)
    }

    /// Re-applies on every change of the attached hospital widget until it closes.
    pub async fn follow_hospital_changes(&self, controls: &dyn FilterControls) {
        let Some(widget) = &self.hospitals else {
            return;
        };
        let mut changes = widget.subscribe();
        while self
            .apply_next_hospital_change(&mut changes, controls)
            .await
            .is_some()
        {}
    }

    async fn load_table(
        &self,
        sequence: u64,
        state: &FilterState,
        params: &QueryParams,
    ) -> RegionOutcome {
        let result = self.api.fetch_table(params).await;
        if let Err(err) = &result {
            if err.requires_reauth() {
                self.reload_session(sequence, "table", err);
                return RegionOutcome::ReauthRequired;
            }
        }

        let mut view = self.view.lock().await;
        if self.is_stale(&view, sequence) {
            debug!(
                sequence,
                latest = view.latest_sequence,
                "dashboard: stale table response dropped"
            );
            return RegionOutcome::Discarded;
        }

        match result {
            Ok(body) => {
                let table = table_result(body);
                info!(
                    sequence,
                    rows = table.row_count,
                    columns = table.column_names.len(),
                    "dashboard: table loaded"
                );
                self.dispatch(&mut view, ViewUpdate::Table(table));
                RegionOutcome::Rendered
            }
            Err(err) => {
                error!(sequence, error = %err, "dashboard: error loading filtered data");
                let api_error = ApiError::from(&err);
                self.dispatch(
                    &mut view,
                    ViewUpdate::TableFailed(RetryRequest {
                        state: state.clone(),
                        message: api_error.message.clone(),
                    }),
                );
                RegionOutcome::Failed { error: api_error }
            }
        }
    }

    async fn load_charts(
        &self,
        sequence: u64,
        state: &FilterState,
        params: &QueryParams,
    ) -> RegionOutcome {
        let result = self.api.fetch_charts(params).await;

        let mut view = self.view.lock().await;
        let outcome = match result {
            Err(err) if err.requires_reauth() => {
                self.reload_session(sequence, "charts", &err);
                RegionOutcome::ReauthRequired
            }
            _ if self.is_stale(&view, sequence) => {
                debug!(
                    sequence,
                    latest = view.latest_sequence,
                    "dashboard: stale chart response dropped"
                );
                RegionOutcome::Discarded
            }
            Err(err) => {
                error!(sequence, error = %err, "dashboard: error loading chart data");
                RegionOutcome::Failed {
                    error: ApiError::from(&err),
                }
            }
            Ok(response) => match response.server_error() {
                Some(message) => {
                    error!(sequence, error = message, "dashboard: chart api returned error");
                    RegionOutcome::Failed {
                        error: ApiError::new(ErrorCode::Server, message),
                    }
                }
                None => {
                    self.render_charts(&mut view, sequence, state, &response);
                    RegionOutcome::Rendered
                }
            },
        };

        // Only the chart path releases the controls.
        if !self.is_stale(&view, sequence) {
            self.dispatch(&mut view, ViewUpdate::LoadingCleared);
        }
        outcome
    }

    fn render_charts(
        &self,
        view: &mut ViewState,
        sequence: u64,
        state: &FilterState,
        response: &ChartsResponse,
    ) {
        let bundle = ChartBundle::from_response(response, &state.escalation);

        for (region, spec) in [
            (ChartRegion::MonthlyTrend, bundle.monthly_trend),
            (ChartRegion::EscalationDistribution, bundle.escalation_distribution),
        ] {
            match spec {
                Ok(spec) => self.dispatch(view, ViewUpdate::Chart(region, spec)),
                Err(err) => warn!(
                    sequence,
                    region = region.container_id(),
                    error = %err,
                    "dashboard: chart left unchanged"
                ),
            }
        }

        match bundle.nurse_wise_trend {
            Some(spec) => {
                self.dispatch(view, ViewUpdate::Chart(ChartRegion::NurseWiseTrend, spec));
                info!(sequence, "dashboard: nurse-wise trend chart updated");
            }
            None => {
                self.dispatch(view, ViewUpdate::NurseWiseHidden);
                debug!(
                    sequence,
                    escalation = %state.escalation,
                    has_data = response.nurse_wise_trend.is_some(),
                    "dashboard: nurse-wise trend chart hidden"
                );
            }
        }
        info!(sequence, "dashboard: charts updated");
    }

    fn reload_session(&self, sequence: u64, region: &str, err: &FetchError) {
        warn!(sequence, region, error = %err, "dashboard: authentication required, reloading");
        self.sinks.session.reload();
    }

    fn is_stale(&self, view: &ViewState, sequence: u64) -> bool {
        self.policy == StaleResponsePolicy::LatestIssuedOnly && sequence < view.latest_sequence
    }

    fn dispatch(&self, view: &mut ViewState, update: ViewUpdate) {
        view.dispatch(&update);
        self.sinks.forward(&update, &self.render_options);
    }
}

fn table_result(body: FilterResponse) -> TableResult {
    TableResult {
        row_count: body.row_count,
        column_names: body.columns,
        rendered_markup: format::decorate_table_markup(&body.table_html),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
