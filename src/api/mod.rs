use anyhow::Result;
use async_trait::async_trait;

pub mod http;
pub mod types;

pub use types::{
    HealthStatus, LoginRequest, OverviewMetrics, PipelineStatus, QualityCheck, TimeSeries,
    TimeSeriesPoint, TokenResponse, TopProduct, TopProducts,
};

/// One method per backend endpoint. The trait is the seam between the sync
/// layer and the network; tests substitute an in-process fake.
#[async_trait]
pub trait MetricsApi: Send + Sync {
    async fn fetch_overview(&self) -> Result<OverviewMetrics>;
    async fn fetch_events_timeseries(&self, hours: u32) -> Result<TimeSeries>;
    async fn fetch_revenue_timeseries(&self, days: u32) -> Result<TimeSeries>;
    async fn fetch_top_products(&self, limit: u32) -> Result<TopProducts>;
    async fn fetch_quality_latest(&self) -> Result<QualityCheck>;
    async fn fetch_health(&self) -> Result<HealthStatus>;
    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse>;
}
