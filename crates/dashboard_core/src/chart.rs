//! Decoding of `/api/charts` payloads into renderable chart specs.

use serde_json::Value;
use shared::{
    domain::escalation_has_nurse_wise_trend,
    protocol::{ChartSpec, ChartsResponse},
};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_CHART_HEIGHT: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartDecodeError {
    #[error("chart payload missing")]
    Missing,
    #[error("chart payload is not valid JSON: {0}")]
    Json(String),
    #[error("chart payload has no `{0}`")]
    MissingField(&'static str),
    #[error("chart payload field `{0}` has the wrong type")]
    WrongType(&'static str),
}

/// Decodes one chart field and fills in layout defaults.
///
/// The server sends each chart as a JSON-encoded string; an inline object is
/// accepted as well.
pub fn decode_chart(raw: Option<&Value>) -> Result<ChartSpec, ChartDecodeError> {
    let parsed = match raw {
        None | Some(Value::Null) => return Err(ChartDecodeError::Missing),
        Some(Value::String(encoded)) if encoded.is_empty() => {
            return Err(ChartDecodeError::Missing)
        }
        Some(Value::String(encoded)) => serde_json::from_str::<Value>(encoded)
            .map_err(|err| ChartDecodeError::Json(err.to_string()))?,
        Some(other) => other.clone(),
    };

    let Value::Object(mut object) = parsed else {
        return Err(ChartDecodeError::WrongType("root"));
    };

    let data = match object.remove("data") {
        None | Some(Value::Null) => return Err(ChartDecodeError::MissingField("data")),
        Some(Value::Array(traces)) => traces,
        Some(_) => return Err(ChartDecodeError::WrongType("data")),
    };
    let layout = match object.remove("layout") {
        None | Some(Value::Null) => return Err(ChartDecodeError::MissingField("layout")),
        Some(Value::Object(layout)) => layout,
        Some(_) => return Err(ChartDecodeError::WrongType("layout")),
    };

    let mut spec = ChartSpec { data, layout };
    apply_layout_defaults(&mut spec);
    Ok(spec)
}

/// Sets `height` and `autosize` only where the server left them out.
pub fn apply_layout_defaults(spec: &mut ChartSpec) {
    for (key, default) in [
        ("height", Value::from(DEFAULT_CHART_HEIGHT)),
        ("autosize", Value::Bool(true)),
    ] {
        match spec.layout.get(key) {
            None | Some(Value::Null) => {
                spec.layout.insert(key.to_string(), default);
            }
            Some(_) => {}
        }
    }
}

/// Charts of one response, each decoded independently.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartBundle {
    pub monthly_trend: Result<ChartSpec, ChartDecodeError>,
    pub escalation_distribution: Result<ChartSpec, ChartDecodeError>,
    /// `Some` only for a qualifying escalation with a decodable payload.
    pub nurse_wise_trend: Option<ChartSpec>,
}

impl ChartBundle {
    pub fn from_response(response: &ChartsResponse, escalation: &str) -> Self {
        let monthly_trend = decode_chart(response.monthly_trend.as_ref());
        if let Ok(spec) = &monthly_trend {
            debug!(
                traces = spec.data.len(),
                names = ?spec.trace_names(),
                "charts: monthly trend decoded"
            );
        }

        let escalation_distribution = decode_chart(response.escalation_dist.as_ref());
        if let Ok(spec) = &escalation_distribution {
            let labels = spec.data.first().and_then(|trace| trace.get("labels"));
            debug!(labels = ?labels, "charts: escalation distribution decoded");
        }

        let nurse_wise_trend = if escalation_has_nurse_wise_trend(escalation) {
            match decode_chart(response.nurse_wise_trend.as_ref()) {
                Ok(spec) => Some(spec),
                Err(ChartDecodeError::Missing) => None,
                Err(err) => {
                    warn!(escalation, error = %err, "charts: nurse-wise trend skipped");
                    None
                }
            }
        } else {
            None
        };

        Self {
            monthly_trend,
            escalation_distribution,
            nurse_wise_trend,
        }
    }
}

#[cfg(test)]
#[path = "tests/chart_tests.rs"]
mod tests;
