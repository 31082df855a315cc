use crate::config::LdLinkConfig;
use crate::error::{QueryError, QueryResult};
use crate::infra::http_client::ensure_success;
use crate::pipeline::filter::parse_statistic;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{instrument, warn};

static R2_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*R2:\s*(\S+)").expect("static regex"));

/// Report lines that mean LDpair had nothing to compare
const REJECTION_MARKERS: [&str; 4] = [
    "not in 1000G reference panel",
    "on different chromosomes",
    "is not a valid",
    "error",
];

/// LDpair client for the LDLink REST API.
pub struct LdLinkClient {
    http: reqwest::Client,
    config: LdLinkConfig,
}

impl LdLinkClient {
    pub fn new(http: reqwest::Client, config: LdLinkConfig) -> Self {
        if config.token.is_none() {
            warn!("No LDLink token configured; LDpair requests will likely be rejected");
        }
        Self { http, config }
    }

    #[instrument(skip(self))]
    pub async fn r2(&self, first: &str, second: &str) -> QueryResult<f64> {
        let mut query = vec![
            ("var1", first),
            ("var2", second),
            ("pop", self.config.population.as_str()),
            ("genome_build", self.config.genome_build.as_str()),
        ];
        if let Some(token) = self.config.token.as_deref() {
            query.push(("token", token));
        }

        let resp = self.http.get(&self.config.api_url).query(&query).send().await?;
        let body = ensure_success(resp)?.text().await?;
        parse_ldpair_report(&body)
    }
}

/// Extracts r² from an LDpair response, either the plain-text report or the
/// JSON form.
pub fn parse_ldpair_report(body: &str) -> QueryResult<f64> {
    let trimmed = body.trim();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| QueryError::Response(format!("LDpair JSON: {e}")))?;
        return r2_from_json(&value);
    }

    if let Some(caps) = R2_LINE.captures(trimmed) {
        return parse_statistic("r2", &caps[1]);
    }

    let lowered = trimmed.to_lowercase();
    if let Some(marker) = REJECTION_MARKERS.iter().find(|m| lowered.contains(*m)) {
        let line = trimmed
            .lines()
            .find(|l| l.to_lowercase().contains(marker))
            .unwrap_or(trimmed);
        return Err(QueryError::Rejected(line.trim().to_string()));
    }

    Err(QueryError::Response("LDpair report has no R2 line".into()))
}

fn r2_from_json(value: &Value) -> QueryResult<f64> {
    let value = match value {
        Value::Array(items) => items
            .first()
            .ok_or_else(|| QueryError::Response("empty LDpair JSON array".into()))?,
        other => other,
    };

    if let Some(error) = value.get("error") {
        let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
        return Err(QueryError::Rejected(message));
    }

    let r2 = value
        .get("statistics")
        .and_then(|s| s.get("r2"))
        .or_else(|| value.get("r2"))
        .ok_or_else(|| QueryError::Response("LDpair JSON has no r2".into()))?;

    match r2 {
        Value::Number(n) => n.as_f64().ok_or_else(|| QueryError::MalformedNumber {
            field: "r2",
            value: n.to_string(),
        }),
        Value::String(s) => parse_statistic("r2", s),
        other => Err(QueryError::MalformedNumber {
            field: "r2",
            value: other.to_string(),
        }),
    }
}
