use std::sync::{Arc, RwLock};

use anyhow::Result;
use tokio::time::Duration;

use crate::api::MetricsApi;
use crate::logging::{json_log, obj, v_str};
use crate::views::View;

#[derive(Clone)]
pub struct Config {
    pub api_base: String,
    pub username: String,
    pub password: String,
    pub http_timeout_ms: u64,
    pub events_hours: u32,
    pub top_limit: u32,
    pub overview_poll_ms: u64,
    pub events_poll_ms: u64,
    pub revenue_poll_ms: u64,
    pub top_products_poll_ms: u64,
    pub quality_poll_ms: u64,
    pub health_poll_ms: u64,
    pub summary_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            api_base: std::env::var("API_BASE").unwrap_or_else(|_| "http://localhost:8000".to_string()),
            username: std::env::var("SF_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            password: std::env::var("SF_PASSWORD").unwrap_or_else(|_| "admin".to_string()),
            http_timeout_ms: std::env::var("HTTP_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(10_000),
            events_hours: std::env::var("EVENTS_HOURS").ok().and_then(|v| v.parse().ok()).unwrap_or(24),
            top_limit: std::env::var("TOP_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
            overview_poll_ms: std::env::var("OVERVIEW_POLL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(30_000),
            events_poll_ms: std::env::var("EVENTS_POLL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(10_000),
            revenue_poll_ms: std::env::var("REVENUE_POLL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(60_000),
            top_products_poll_ms: std::env::var("TOP_PRODUCTS_POLL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(60_000),
            quality_poll_ms: std::env::var("QUALITY_POLL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(60_000),
            health_poll_ms: std::env::var("HEALTH_POLL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(30_000),
            summary_secs: std::env::var("SUMMARY_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(30),
        }
    }

    pub fn poll_period(&self, view: View) -> Duration {
        let ms = match view {
            View::Overview => self.overview_poll_ms,
            View::Events => self.events_poll_ms,
            View::Revenue => self.revenue_poll_ms,
            View::TopProducts => self.top_products_poll_ms,
            View::Quality => self.quality_poll_ms,
            View::Health => self.health_poll_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Shared auth context. Injected into the HTTP client and the route guard;
/// written only by login and logout, read-only everywhere else.
#[derive(Clone, Default)]
pub struct AuthSession {
    token: Arc<RwLock<Option<String>>>,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn set_token(&self, token: String) {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token);
        }
        json_log("auth", obj(&[("event", v_str("token_stored"))]));
    }

    /// Idempotent: clearing an already-empty session is a no-op.
    pub fn clear(&self) {
        let was_set = match self.token.write() {
            Ok(mut slot) => slot.take().is_some(),
            Err(_) => false,
        };
        if was_set {
            json_log("auth", obj(&[("event", v_str("session_cleared"))]));
        }
    }

    /// Single-attempt login. On success the returned token is stored; on
    /// failure the session is left untouched and the server's error detail
    /// propagates to the caller.
    pub async fn login(&self, api: &dyn MetricsApi, username: &str, password: &str) -> Result<()> {
        let resp = api.login(username, password).await?;
        self.set_token(resp.access_token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::View;

    fn test_config() -> Config {
        Config {
            api_base: "http://localhost:8000".to_string(),
            username: "admin".to_string(),
            password: "admin".to_string(),
            http_timeout_ms: 10_000,
            events_hours: 24,
            top_limit: 10,
            overview_poll_ms: 30_000,
            events_poll_ms: 10_000,
            revenue_poll_ms: 60_000,
            top_products_poll_ms: 60_000,
            quality_poll_ms: 60_000,
            health_poll_ms: 30_000,
            summary_secs: 30,
        }
    }

    #[test]
    fn test_poll_periods_per_view() {
        let cfg = test_config();
        assert_eq!(cfg.poll_period(View::Events), Duration::from_secs(10));
        assert_eq!(cfg.poll_period(View::Overview), Duration::from_secs(30));
        assert_eq!(cfg.poll_period(View::Health), Duration::from_secs(30));
        assert_eq!(cfg.poll_period(View::Quality), Duration::from_secs(60));
        assert_eq!(cfg.poll_period(View::Revenue), Duration::from_secs(60));
        assert_eq!(cfg.poll_period(View::TopProducts), Duration::from_secs(60));
    }

    #[test]
    fn test_session_starts_unauthenticated() {
        let session = AuthSession::new();
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
    }

    #[test]
    fn test_session_stores_and_reads_token() {
        let session = AuthSession::new();
        session.set_token("tok-1".to_string());
        assert!(session.is_authenticated());
        assert_eq!(session.token().as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_session_clear_is_idempotent() {
        let session = AuthSession::new();
        session.set_token("tok-1".to_string());
        session.clear();
        assert!(!session.is_authenticated());
        session.clear();
        session.clear();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_session_clones_share_state() {
        let session = AuthSession::new();
        let other = session.clone();
        session.set_token("tok-2".to_string());
        assert_eq!(other.token().as_deref(), Some("tok-2"));
        other.clear();
        assert!(!session.is_authenticated());
    }
}
