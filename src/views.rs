use std::collections::HashMap;
use std::sync::Arc;

use crate::api::{HealthStatus, MetricsApi, OverviewMetrics, QualityCheck, TimeSeries, TopProducts};
use crate::guard::{self, Access};
use crate::logging::{json_log, obj, v_num, v_str};
use crate::state::{AuthSession, Config};
use crate::sync::{PollHandle, Poller, SnapshotCell};

/// The six protected dashboard views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Overview,
    Events,
    Revenue,
    TopProducts,
    Quality,
    Health,
}

impl View {
    pub const ALL: [View; 6] = [
        View::Overview,
        View::Events,
        View::Revenue,
        View::TopProducts,
        View::Quality,
        View::Health,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            View::Overview => "overview",
            View::Events => "events",
            View::Revenue => "revenue",
            View::TopProducts => "top_products",
            View::Quality => "quality",
            View::Health => "health",
        }
    }

    pub const fn path(&self) -> &'static str {
        match self {
            View::Overview => "/dashboard/overview",
            View::Events => "/dashboard/events",
            View::Revenue => "/dashboard/revenue",
            View::TopProducts => "/dashboard/top-products",
            View::Quality => "/dashboard/quality",
            View::Health => "/dashboard/health",
        }
    }
}

/// Day-range selector for the revenue view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayRange {
    Seven,
    Thirty,
    Ninety,
    #[default]
    Year,
}

impl DayRange {
    pub const ALL: [DayRange; 4] = [DayRange::Seven, DayRange::Thirty, DayRange::Ninety, DayRange::Year];

    pub fn days(&self) -> u32 {
        match self {
            DayRange::Seven => 7,
            DayRange::Thirty => 30,
            DayRange::Ninety => 90,
            DayRange::Year => 365,
        }
    }

    pub fn from_days(days: u32) -> Option<Self> {
        match days {
            7 => Some(DayRange::Seven),
            30 => Some(DayRange::Thirty),
            90 => Some(DayRange::Ninety),
            365 => Some(DayRange::Year),
            _ => None,
        }
    }
}

/// Owns one snapshot cell per view and at most one live poll handle per view.
pub struct Dashboard {
    cfg: Config,
    api: Arc<dyn MetricsApi>,
    session: AuthSession,
    day_range: DayRange,
    handles: HashMap<View, PollHandle>,
    pub overview: SnapshotCell<OverviewMetrics>,
    pub events: SnapshotCell<TimeSeries>,
    pub revenue: SnapshotCell<TimeSeries>,
    pub top_products: SnapshotCell<TopProducts>,
    pub quality: SnapshotCell<QualityCheck>,
    pub health: SnapshotCell<HealthStatus>,
}

impl Dashboard {
    pub fn new(cfg: Config, api: Arc<dyn MetricsApi>, session: AuthSession) -> Self {
        Self {
            cfg,
            api,
            session,
            day_range: DayRange::default(),
            handles: HashMap::new(),
            overview: SnapshotCell::new("overview"),
            events: SnapshotCell::new("events"),
            revenue: SnapshotCell::new("revenue"),
            top_products: SnapshotCell::new("top_products"),
            quality: SnapshotCell::new("quality"),
            health: SnapshotCell::new("health"),
        }
    }

    pub fn day_range(&self) -> DayRange {
        self.day_range
    }

    pub fn is_running(&self, view: View) -> bool {
        self.handles.contains_key(&view)
    }

    /// Guard-checked startup. Without a token nothing is started and the
    /// caller is told to redirect.
    pub fn start_all(&mut self) -> Access {
        if guard::check(&self.session) == Access::RedirectToLogin {
            return Access::RedirectToLogin;
        }
        for view in View::ALL {
            self.start_view(view);
        }
        Access::Granted
    }

    fn start_view(&mut self, view: View) {
        if self.handles.contains_key(&view) {
            return;
        }
        let handle = self.spawn(view);
        self.handles.insert(view, handle);
    }

    fn spawn(&self, view: View) -> PollHandle {
        let period = self.cfg.poll_period(view);
        match view {
            View::Overview => {
                let api = self.api.clone();
                Poller::start(self.overview.clone(), period, move || {
                    let api = api.clone();
                    async move { api.fetch_overview().await }
                })
            }
            View::Events => {
                let api = self.api.clone();
                let hours = self.cfg.events_hours;
                Poller::start(self.events.clone(), period, move || {
                    let api = api.clone();
                    async move { api.fetch_events_timeseries(hours).await }
                })
            }
            View::Revenue => {
                let api = self.api.clone();
                let days = self.day_range.days();
                Poller::start(self.revenue.clone(), period, move || {
                    let api = api.clone();
                    async move { api.fetch_revenue_timeseries(days).await }
                })
            }
            View::TopProducts => {
                let api = self.api.clone();
                let limit = self.cfg.top_limit;
                Poller::start(self.top_products.clone(), period, move || {
                    let api = api.clone();
                    async move { api.fetch_top_products(limit).await }
                })
            }
            View::Quality => {
                let api = self.api.clone();
                Poller::start(self.quality.clone(), period, move || {
                    let api = api.clone();
                    async move { api.fetch_quality_latest().await }
                })
            }
            View::Health => {
                let api = self.api.clone();
                Poller::start(self.health.clone(), period, move || {
                    let api = api.clone();
                    async move { api.fetch_health().await }
                })
            }
        }
    }

    /// Restart the revenue poller for a new range. The old timer is cancelled
    /// (invalidating its in-flight fetches) before the new subscription's
    /// immediate fetch is issued.
    pub fn set_day_range(&mut self, range: DayRange) {
        if range == self.day_range {
            return;
        }
        let was_running = self.handles.remove(&View::Revenue).map(|h| h.cancel()).is_some();
        self.day_range = range;
        json_log(
            "poll",
            obj(&[
                ("view", v_str("revenue")),
                ("event", v_str("range_changed")),
                ("days", v_num(range.days() as f64)),
            ]),
        );
        if was_running {
            self.start_view(View::Revenue);
        }
    }

    pub fn shutdown(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.cancel();
        }
        json_log("poll", obj(&[("event", v_str("shutdown"))]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use crate::api::TokenResponse;

    struct NullApi;

    #[async_trait]
    impl MetricsApi for NullApi {
        async fn fetch_overview(&self) -> Result<OverviewMetrics> {
            bail!("unreachable")
        }
        async fn fetch_events_timeseries(&self, _hours: u32) -> Result<TimeSeries> {
            bail!("unreachable")
        }
        async fn fetch_revenue_timeseries(&self, _days: u32) -> Result<TimeSeries> {
            bail!("unreachable")
        }
        async fn fetch_top_products(&self, _limit: u32) -> Result<TopProducts> {
            bail!("unreachable")
        }
        async fn fetch_quality_latest(&self) -> Result<QualityCheck> {
            bail!("unreachable")
        }
        async fn fetch_health(&self) -> Result<HealthStatus> {
            bail!("unreachable")
        }
        async fn login(&self, _username: &str, _password: &str) -> Result<TokenResponse> {
            bail!("unreachable")
        }
    }

    fn test_config() -> Config {
        Config {
            api_base: "http://localhost:8000".to_string(),
            username: "admin".to_string(),
            password: "admin".to_string(),
            http_timeout_ms: 1_000,
            events_hours: 24,
            top_limit: 10,
            overview_poll_ms: 60_000,
            events_poll_ms: 60_000,
            revenue_poll_ms: 60_000,
            top_products_poll_ms: 60_000,
            quality_poll_ms: 60_000,
            health_poll_ms: 60_000,
            summary_secs: 30,
        }
    }

    #[test]
    fn test_view_labels_unique() {
        let labels: std::collections::HashSet<_> = View::ALL.iter().map(|v| v.label()).collect();
        assert_eq!(labels.len(), View::ALL.len());
    }

    #[test]
    fn test_view_paths() {
        assert_eq!(View::Overview.path(), "/dashboard/overview");
        assert_eq!(View::TopProducts.path(), "/dashboard/top-products");
    }

    #[test]
    fn test_day_range_values() {
        let days: Vec<u32> = DayRange::ALL.iter().map(|r| r.days()).collect();
        assert_eq!(days, vec![7, 30, 90, 365]);
        for range in DayRange::ALL {
            assert_eq!(DayRange::from_days(range.days()), Some(range));
        }
        assert_eq!(DayRange::from_days(14), None);
    }

    #[test]
    fn test_day_range_defaults_to_year() {
        assert_eq!(DayRange::default(), DayRange::Year);
    }

    #[test]
    fn test_unauthenticated_dashboard_starts_nothing() {
        let session = AuthSession::new();
        let mut dash = Dashboard::new(test_config(), Arc::new(NullApi), session);
        assert_eq!(dash.start_all(), Access::RedirectToLogin);
        for view in View::ALL {
            assert!(!dash.is_running(view));
        }
    }

    #[test]
    fn test_day_range_change_without_pollers_only_records() {
        let session = AuthSession::new();
        let mut dash = Dashboard::new(test_config(), Arc::new(NullApi), session);
        dash.set_day_range(DayRange::Seven);
        assert_eq!(dash.day_range(), DayRange::Seven);
        assert!(!dash.is_running(View::Revenue));
    }
}
