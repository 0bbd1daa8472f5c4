use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `GET /api/filter` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterResponse {
    pub row_count: u64,
    #[serde(default)]
    pub columns: Vec<String>,
    pub table_html: String,
}

/// `GET /api/charts` body.
///
/// Chart fields carry a JSON-encoded chart spec. They are kept as raw values
/// so that one malformed chart cannot fail decoding of the whole response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_trend: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_dist: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nurse_wise_trend: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChartsResponse {
    /// Server-side computation failure reported at HTTP 200.
    pub fn server_error(&self) -> Option<&str> {
        self.error.as_deref().filter(|message| !message.is_empty())
    }
}

/// Declarative `{data, layout}` pair consumed by the chart renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub data: Vec<Value>,
    pub layout: Map<String, Value>,
}

impl ChartSpec {
    /// `name` of every trace that has one.
    pub fn trace_names(&self) -> Vec<&str> {
        self.data
            .iter()
            .filter_map(|trace| trace.get("name").and_then(Value::as_str))
            .collect()
    }
}

/// Renderer options applied to every dashboard chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub responsive: bool,
    pub display_mode_bar: bool,
    pub mode_bar_buttons_to_remove: Vec<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            responsive: true,
            display_mode_bar: true,
            mode_bar_buttons_to_remove: vec!["toImage".to_string()],
        }
    }
}
