use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::time::{interval, Duration};

use streamforge::api::http::HttpApi;
use streamforge::format::{format_currency, format_lag, format_last_run, format_number, format_percent};
use streamforge::guard::Access;
use streamforge::logging::{json_log, obj, v_num, v_str};
use streamforge::state::{AuthSession, Config};
use streamforge::views::Dashboard;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let session = AuthSession::new();
    let api = Arc::new(HttpApi::new(&cfg, session.clone())?);

    if let Err(err) = session.login(api.as_ref(), &cfg.username, &cfg.password).await {
        json_log(
            "auth",
            obj(&[("event", v_str("login_failed")), ("error", v_str(&err.to_string()))]),
        );
        bail!("login failed: {err}");
    }
    json_log("auth", obj(&[("event", v_str("login_ok")), ("user", v_str(&cfg.username))]));

    let mut dash = Dashboard::new(cfg.clone(), api, session.clone());
    let access = dash.start_all();
    if access == Access::RedirectToLogin {
        bail!("no session token; nothing to poll");
    }
    json_log(
        "guard",
        obj(&[("event", v_str("navigate")), ("target", v_str(access.target()))]),
    );

    let mut summary = interval(Duration::from_secs(cfg.summary_secs.max(1)));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = summary.tick() => print_summary(&dash),
        }
    }

    dash.shutdown();
    session.clear();
    Ok(())
}

fn print_summary(dash: &Dashboard) {
    if let Some(m) = dash.overview.get() {
        json_log(
            "summary",
            obj(&[
                ("view", v_str("overview")),
                ("total_users", v_str(&format_number(m.total_users as f64))),
                ("total_events", v_str(&format_number(m.total_events as f64))),
                ("total_revenue", v_str(&format_currency(m.total_revenue))),
                ("conversion_rate", v_str(&format_percent(m.conversion_rate))),
                ("events_last_hour", v_str(&format_number(m.events_last_hour as f64))),
                ("revenue_today", v_str(&format_currency(m.revenue_today))),
            ]),
        );
    }
    if let Some(ts) = dash.events.get() {
        json_log(
            "summary",
            obj(&[("view", v_str("events")), ("points", v_num(ts.data.len() as f64))]),
        );
    }
    if let Some(ts) = dash.revenue.get() {
        json_log(
            "summary",
            obj(&[
                ("view", v_str("revenue")),
                ("days", v_num(dash.day_range().days() as f64)),
                ("points", v_num(ts.data.len() as f64)),
            ]),
        );
    }
    if let Some(tp) = dash.top_products.get() {
        if let Some(top) = tp.products.first() {
            json_log(
                "summary",
                obj(&[
                    ("view", v_str("top_products")),
                    ("count", v_num(tp.products.len() as f64)),
                    ("top_name", v_str(&top.product_name)),
                    ("top_revenue", v_str(&format_currency(top.revenue))),
                ]),
            );
        }
    }
    if let Some(q) = dash.quality.get() {
        json_log(
            "summary",
            obj(&[
                ("view", v_str("quality")),
                ("checkpoint", v_str(&q.checkpoint_name)),
                ("success", serde_json::json!(q.success)),
                ("passed", v_num(q.expectations_passed as f64)),
                ("failed", v_num(q.expectations_failed as f64)),
            ]),
        );
    }
    if let Some(h) = dash.health.get() {
        for p in &h.pipelines {
            json_log(
                "summary",
                obj(&[
                    ("view", v_str("health")),
                    ("pipeline", v_str(&p.pipeline_name)),
                    ("status", v_str(p.status.as_deref().unwrap_or("Unknown"))),
                    ("last_run", v_str(&format_last_run(p.last_run_ts))),
                    ("lag", v_str(&format_lag(p.lag_seconds))),
                ]),
            );
        }
        json_log(
            "summary",
            obj(&[
                ("view", v_str("health")),
                ("tables", v_num(h.table_counts.len() as f64)),
                ("last_dbt_run", v_str(&format_last_run(h.last_dbt_run))),
                ("last_ge_run", v_str(&format_last_run(h.last_ge_run))),
            ]),
        );
    }
}
