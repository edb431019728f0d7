use anyhow::{bail, Context, Result};
use reqwest::Client;
use url::Url;

use crate::api::types::{
    HealthStatus, LoginRequest, OverviewMetrics, QualityCheck, TimeSeries, TokenResponse,
    TopProducts,
};
use crate::api::MetricsApi;
use crate::state::{AuthSession, Config};

/// reqwest-backed client. Holds the injected auth session and attaches its
/// token as a Bearer header on every metrics request.
pub struct HttpApi {
    client: Client,
    base: Url,
    session: AuthSession,
}

impl HttpApi {
    pub fn new(cfg: &Config, session: AuthSession) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.http_timeout_ms))
            .build()?;
        let base = Url::parse(&cfg.api_base)
            .with_context(|| format!("invalid API_BASE: {}", cfg.api_base))?;
        Ok(Self { client, base, session })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut url = self.base.join(path)?;
        for (k, v) in query {
            url.query_pairs_mut().append_pair(k, v);
        }
        let mut req = self.client.get(url);
        if let Some(token) = self.session.token() {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.with_context(|| format!("GET {} failed", path))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("{}", error_detail(status.as_u16(), &body));
        }
        resp.json::<T>()
            .await
            .with_context(|| format!("malformed payload from {}", path))
    }
}

/// Prefer the FastAPI error envelope's `detail` field when the body carries
/// one; otherwise fall back to the bare status code.
fn error_detail(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
            return detail.to_string();
        }
    }
    format!("request failed with status {}", status)
}

#[async_trait::async_trait]
impl MetricsApi for HttpApi {
    async fn fetch_overview(&self) -> Result<OverviewMetrics> {
        self.get_json("/metrics/overview", &[]).await
    }

    async fn fetch_events_timeseries(&self, hours: u32) -> Result<TimeSeries> {
        self.get_json("/metrics/events_timeseries", &[("hours", hours.to_string())])
            .await
    }

    async fn fetch_revenue_timeseries(&self, days: u32) -> Result<TimeSeries> {
        self.get_json("/metrics/revenue_timeseries", &[("days", days.to_string())])
            .await
    }

    async fn fetch_top_products(&self, limit: u32) -> Result<TopProducts> {
        self.get_json("/metrics/top_products", &[("limit", limit.to_string())])
            .await
    }

    async fn fetch_quality_latest(&self) -> Result<QualityCheck> {
        self.get_json("/quality/latest", &[]).await
    }

    async fn fetch_health(&self) -> Result<HealthStatus> {
        self.get_json("/health/pipelines", &[]).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let url = self.base.join("/auth/login")?;
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let resp = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .context("POST /auth/login failed")?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("{}", error_detail(status.as_u16(), &text));
        }
        resp.json().await.context("malformed login response")
    }
}
