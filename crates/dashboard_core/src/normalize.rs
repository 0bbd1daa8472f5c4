//! Filter state to query string translation.

use chrono::NaiveDate;
use shared::domain::{FilterState, HospitalSelection, QueryParams, ALL, DATE_FORMAT};

/// Above this many picked hospitals the filter is sent as `all`, keeping the
/// query string and the backend IN-clause bounded.
pub const MAX_HOSPITALS_IN_QUERY: usize = 100;

pub fn normalize(state: &FilterState) -> QueryParams {
    QueryParams {
        escalation: or_all(&state.escalation),
        email: or_all(&state.nurse_email),
        hospital: hospital_param(&state.hospitals),
        date: date_param(state.start_date, state.end_date),
        exclude_camera: state.exclude_camera_annotations.to_string(),
    }
}

pub fn hospital_param(hospitals: &HospitalSelection) -> String {
    if hospitals.is_empty()
        || hospitals.covers_all_available()
        || hospitals.len() > MAX_HOSPITALS_IN_QUERY
    {
        ALL.to_string()
    } else {
        hospitals.selected.join(",")
    }
}

/// A lone bound is not an open-ended range; it disables the date filter.
pub fn date_param(start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    match (start, end) {
        (Some(start), Some(end)) => format!(
            "{},{}",
            start.format(DATE_FORMAT),
            end.format(DATE_FORMAT)
        ),
        _ => ALL.to_string(),
    }
}

fn or_all(value: &str) -> String {
    if value.trim().is_empty() {
        ALL.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
#[path = "tests/normalize_tests.rs"]
mod tests;
