//! Human-readable description of the active filters.

use chrono::NaiveDate;
use shared::domain::{HospitalSelection, ALL, DATE_FORMAT};

pub const READY_STATUS: &str = "Ready to filter data";
pub const NO_FILTERS_STATUS: &str = "Showing all data";

pub fn summarize(
    escalation: &str,
    email: &str,
    hospitals: &HospitalSelection,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> String {
    let mut clauses = Vec::new();

    if is_set(escalation) {
        clauses.push(format!("Escalation: {escalation}"));
    }
    if is_set(email) {
        let nurse = email.split('@').next().unwrap_or(email);
        clauses.push(format!("Nurse: {nurse}"));
    }
    if let Some(clause) = hospital_clause(hospitals) {
        clauses.push(clause);
    }
    if let Some(clause) = date_clause(start_date, end_date) {
        clauses.push(clause);
    }

    if clauses.is_empty() {
        NO_FILTERS_STATUS.to_string()
    } else {
        format!("Active filters: {}", clauses.join(", "))
    }
}

fn is_set(value: &str) -> bool {
    !value.trim().is_empty() && value != ALL
}

fn hospital_clause(hospitals: &HospitalSelection) -> Option<String> {
    let selected = &hospitals.selected;
    if selected.is_empty()
        || selected.iter().any(|name| name == ALL)
        || hospitals.covers_all_available()
    {
        return None;
    }

    Some(match selected.len() {
        1 => format!("Hospital: {}", selected[0]),
        2..=3 => format!("Hospitals: {}", selected.join(", ")),
        n => format!("Hospitals: {} +{} more", selected[..2].join(", "), n - 2),
    })
}

fn date_clause(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<String> {
    match (start, end) {
        (Some(start), Some(end)) => Some(format!(
            "Date Range: {} to {}",
            start.format(DATE_FORMAT),
            end.format(DATE_FORMAT)
        )),
        (Some(start), None) => Some(format!("From: {}", start.format(DATE_FORMAT))),
        (None, Some(end)) => Some(format!("Until: {}", end.format(DATE_FORMAT))),
        (None, None) => None,
    }
}
