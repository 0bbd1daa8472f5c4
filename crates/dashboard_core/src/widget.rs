//! Filter control capabilities and the filter state reader.

use std::sync::{Mutex, PoisonError};

use chrono::NaiveDate;
use shared::domain::{FilterState, HospitalSelection, ALL, DATE_FORMAT};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Read access to the single-value filter controls.
///
/// `None` means the control is not present on the page.
pub trait FilterControls: Send + Sync {
    fn escalation(&self) -> Option<String>;
    fn nurse_email(&self) -> Option<String>;
    fn start_date(&self) -> Option<String>;
    fn end_date(&self) -> Option<String>;
    fn exclude_camera_annotations(&self) -> Option<bool>;
}

/// Hospital multi-select.
pub trait MultiSelectWidget: Send + Sync {
    fn options(&self) -> Vec<String>;
    fn selection(&self) -> Vec<String>;
    fn set_selection(&self, selection: Vec<String>);
    /// Receives the new selection after every change.
    fn subscribe(&self) -> broadcast::Receiver<Vec<String>>;
}

pub fn read_filter_state(
    controls: &dyn FilterControls,
    hospitals: Option<&dyn MultiSelectWidget>,
) -> FilterState {
    let hospitals = hospitals
        .map(|widget| HospitalSelection::new(widget.selection(), widget.options()))
        .unwrap_or_default();

    FilterState {
        escalation: controls.escalation().unwrap_or_else(|| ALL.to_string()),
        nurse_email: controls.nurse_email().unwrap_or_else(|| ALL.to_string()),
        hospitals,
        start_date: parse_date_control(controls.start_date()),
        end_date: parse_date_control(controls.end_date()),
        exclude_camera_annotations: controls.exclude_camera_annotations().unwrap_or(false),
    }
}

fn parse_date_control(value: Option<String>) -> Option<NaiveDate> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(value, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(err) => {
            debug!(value, error = %err, "filters: ignoring unparsable date control");
            None
        }
    }
}

pub fn select_all_hospitals(widget: &dyn MultiSelectWidget) {
    widget.set_selection(widget.options());
    info!("filters: all hospitals selected");
}

pub fn unselect_all_hospitals(widget: &dyn MultiSelectWidget) {
    widget.set_selection(Vec::new());
    info!("filters: all hospitals unselected");
}

/// In-memory multi-select used by front ends without a native widget.
pub struct HospitalPicker {
    options: Vec<String>,
    selection: Mutex<Vec<String>>,
    changes: broadcast::Sender<Vec<String>>,
}

impl HospitalPicker {
    /// Starts with every option selected.
    pub fn new(options: Vec<String>) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            selection: Mutex::new(options.clone()),
            options,
            changes,
        }
    }
}

impl MultiSelectWidget for HospitalPicker {
    fn options(&self) -> Vec<String> {
        self.options.clone()
    }

    fn selection(&self) -> Vec<String> {
        self.selection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_selection(&self, selection: Vec<String>) {
        let mut kept = Vec::with_capacity(selection.len());
        for name in selection {
            if self.options.contains(&name) && !kept.contains(&name) {
                kept.push(name);
            }
        }
        *self.selection.lock().unwrap_or_else(PoisonError::into_inner) = kept.clone();
        let _ = self.changes.send(kept);
    }

    fn subscribe(&self) -> broadcast::Receiver<Vec<String>> {
        self.changes.subscribe()
    }
}
