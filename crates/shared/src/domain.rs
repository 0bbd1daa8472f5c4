use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sentinel used by every filter dimension to mean "no restriction".
pub const ALL: &str = "all";

/// Wire format of a single date bound (`<input type="date">` value).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Escalation categories that come with a per-nurse trend chart.
pub const NURSE_WISE_ESCALATIONS: [&str; 2] = ["Camera Annotation Events", "Educating nurses"];

pub fn escalation_has_nurse_wise_trend(escalation: &str) -> bool {
    NURSE_WISE_ESCALATIONS.contains(&escalation)
}

/// Hospital multi-select state: what is picked, in pick order, and what could be picked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalSelection {
    pub selected: Vec<String>,
    pub available: Vec<String>,
}

impl HospitalSelection {
    pub fn new(selected: Vec<String>, available: Vec<String>) -> Self {
        Self {
            selected,
            available,
        }
    }

    /// Every available hospital picked, in option order.
    pub fn all_of(available: Vec<String>) -> Self {
        Self {
            selected: available.clone(),
            available,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn covers_all_available(&self) -> bool {
        let selected: BTreeSet<&str> = self.selected.iter().map(String::as_str).collect();
        let available: BTreeSet<&str> = self.available.iter().map(String::as_str).collect();
        selected == available
    }
}

/// Snapshot of every filter control at the moment an apply cycle starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub escalation: String,
    pub nurse_email: String,
    pub hospitals: HospitalSelection,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub exclude_camera_annotations: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            escalation: ALL.to_string(),
            nurse_email: ALL.to_string(),
            hospitals: HospitalSelection::default(),
            start_date: None,
            end_date: None,
            exclude_camera_annotations: false,
        }
    }
}

impl FilterState {
    /// Default filters with every available hospital selected.
    pub fn with_hospitals(available: Vec<String>) -> Self {
        Self {
            hospitals: HospitalSelection::all_of(available),
            ..Self::default()
        }
    }

    /// Restores the reset defaults in place, keeping the available hospital list.
    pub fn reset(&mut self) {
        let available = std::mem::take(&mut self.hospitals.available);
        *self = Self::with_hospitals(available);
    }
}

/// Query string shared by `/api/filter` and `/api/charts`.
///
/// Field order is the serialized pair order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    pub escalation: String,
    pub email: String,
    pub hospital: String,
    pub date: String,
    pub exclude_camera: String,
}

impl QueryParams {
    pub fn as_pairs(&self) -> [(&'static str, &str); 5] {
        [
            ("escalation", self.escalation.as_str()),
            ("email", self.email.as_str()),
            ("hospital", self.hospital.as_str()),
            ("date", self.date.as_str()),
            ("exclude_camera", self.exclude_camera.as_str()),
        ]
    }
}

/// Table region payload after a successful `/api/filter` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableResult {
    pub row_count: u64,
    pub column_names: Vec<String>,
    pub rendered_markup: String,
}

/// Chart regions on the dashboard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartRegion {
    MonthlyTrend,
    EscalationDistribution,
    NurseWiseTrend,
}

impl ChartRegion {
    pub const fn container_id(self) -> &'static str {
        match self {
            ChartRegion::MonthlyTrend => "monthly-trend-chart",
            ChartRegion::EscalationDistribution => "escalation-distribution-chart",
            ChartRegion::NurseWiseTrend => "nurse-wise-trend-chart",
        }
    }
}
