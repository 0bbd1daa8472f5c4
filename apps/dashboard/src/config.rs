use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use dashboard_core::{HttpOptions, StaleResponsePolicy};
use tracing::warn;

pub const SETTINGS_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub session_cookie: Option<String>,
    pub request_timeout_secs: u64,
    pub stale_policy: StaleResponsePolicy,
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".into(),
            session_cookie: None,
            request_timeout_secs: 0,
            stale_policy: StaleResponsePolicy::default(),
            output_dir: PathBuf::from("./dashboard-out"),
        }
    }
}

impl Settings {
    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            session_cookie: self.session_cookie.clone(),
            // 0 leaves requests without a client-side timeout.
            request_timeout: (self.request_timeout_secs > 0)
                .then(|| Duration::from_secs(self.request_timeout_secs)),
        }
    }
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    let env: HashMap<String, String> = std::env::vars().collect();
    resolve_settings(file.as_deref(), &env)
}

fn resolve_settings(file: Option<&str>, env: &HashMap<String, String>) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        match toml::from_str::<HashMap<String, toml::Value>>(raw) {
            Ok(file_cfg) => apply_file(&mut settings, &file_cfg),
            Err(err) => warn!(error = %err, "config: ignoring unreadable {SETTINGS_FILE}"),
        }
    }

    if let Some(v) = env.get("DASHBOARD_SERVER_URL") {
        settings.server_url = v.clone();
    }
    if let Some(v) = env.get("APP__SERVER_URL") {
        settings.server_url = v.clone();
    }

    if let Some(v) = env.get("DASHBOARD_SESSION_COOKIE") {
        settings.session_cookie = Some(v.clone());
    }

    if let Some(v) = env.get("APP__REQUEST_TIMEOUT_SECS") {
        set_timeout(&mut settings, v);
    }

    if let Some(v) = env.get("APP__STALE_POLICY") {
        set_policy(&mut settings, v);
    }

    if let Some(v) = env.get("APP__OUTPUT_DIR") {
        settings.output_dir = PathBuf::from(v);
    }

    settings
}

fn apply_file(settings: &mut Settings, file_cfg: &HashMap<String, toml::Value>) {
    if let Some(v) = file_cfg.get("server_url").and_then(toml::Value::as_str) {
        settings.server_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("session_cookie").and_then(toml::Value::as_str) {
        settings.session_cookie = Some(v.to_string());
    }
    match file_cfg.get("request_timeout_secs") {
        Some(toml::Value::Integer(v)) => {
            settings.request_timeout_secs = u64::try_from(*v).unwrap_or_default()
        }
        Some(toml::Value::String(v)) => set_timeout(settings, v),
        _ => {}
    }
    if let Some(v) = file_cfg.get("stale_policy").and_then(toml::Value::as_str) {
        set_policy(settings, v);
    }
    if let Some(v) = file_cfg.get("output_dir").and_then(toml::Value::as_str) {
        settings.output_dir = PathBuf::from(v);
    }
}

fn set_timeout(settings: &mut Settings, raw: &str) {
    match raw.trim().parse::<u64>() {
        Ok(parsed) => settings.request_timeout_secs = parsed,
        Err(err) => warn!(value = raw, error = %err, "config: ignoring request timeout"),
    }
}

fn set_policy(settings: &mut Settings, raw: &str) {
    match raw.parse::<StaleResponsePolicy>() {
        Ok(policy) => settings.stale_policy = policy,
        Err(err) => warn!(error = %err, "config: keeping stale response policy"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_without_file_or_env() {
        assert_eq!(resolve_settings(None, &HashMap::new()), Settings::default());
    }

    #[test]
    fn file_values_are_applied() {
        let file = r#"
            server_url = "https://dash.example.org"
            session_cookie = "session=xyz"
            request_timeout_secs = 15
            stale_policy = "latest_issued_only"
            output_dir = "/tmp/dash"
        "#;
        let settings = resolve_settings(Some(file), &HashMap::new());
        assert_eq!(settings.server_url, "https://dash.example.org");
        assert_eq!(settings.session_cookie.as_deref(), Some("session=xyz"));
        assert_eq!(settings.request_timeout_secs, 15);
        assert_eq!(settings.stale_policy, StaleResponsePolicy::LatestIssuedOnly);
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/dash"));
    }

    #[test]
    fn env_overrides_file_and_app_prefix_wins() {
        let file = "server_url = \"https://file.example.org\"\nrequest_timeout_secs = 20";
        let settings = resolve_settings(
            Some(file),
            &env(&[
                ("DASHBOARD_SERVER_URL", "https://env.example.org"),
                ("APP__SERVER_URL", "https://app.example.org"),
                ("APP__REQUEST_TIMEOUT_SECS", "0"),
                ("APP__STALE_POLICY", "latest"),
            ]),
        );
        assert_eq!(settings.server_url, "https://app.example.org");
        assert_eq!(settings.request_timeout_secs, 0);
        assert_eq!(settings.http_options().request_timeout, None);
        assert_eq!(settings.stale_policy, StaleResponsePolicy::LatestIssuedOnly);
    }

    #[test]
    fn invalid_values_keep_previous_settings() {
        let settings = resolve_settings(
            Some("not toml at all ="),
            &env(&[
                ("APP__REQUEST_TIMEOUT_SECS", "soon"),
                ("APP__STALE_POLICY", "newest"),
            ]),
        );
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn requests_have_no_timeout_by_default() {
        let options = resolve_settings(None, &HashMap::new()).http_options();
        assert_eq!(options.request_timeout, None);
        assert_eq!(options.session_cookie, None);
    }

    #[test]
    fn configured_timeout_becomes_http_option() {
        let settings = resolve_settings(None, &env(&[("APP__REQUEST_TIMEOUT_SECS", "45")]));
        assert_eq!(
            settings.http_options().request_timeout,
            Some(Duration::from_secs(45))
        );
    }
}
