//! Prometheus text exposition format.
//!
//! Renders windowed uptime stats for scraping by a Prometheus server or
//! compatible agent.

use std::time::Duration;

use pulse_health::UptimeStats;

/// Render uptime stats for a trailing window into Prometheus text format.
pub fn render_prometheus(stats: &UptimeStats, window: Duration) -> String {
    let window = format!("{}s", window.as_secs());
    let mut out = String::new();

    out.push_str("# HELP pulse_uptime_percent Percentage of good health checks in the window.\n");
    out.push_str("# TYPE pulse_uptime_percent gauge\n");
    out.push_str(&format!(
        "pulse_uptime_percent{{window=\"{window}\"}} {:.2}\n",
        stats.uptime
    ));

    out.push_str("# HELP pulse_health_checks Health checks recorded in the window.\n");
    out.push_str("# TYPE pulse_health_checks gauge\n");
    out.push_str(&format!(
        "pulse_health_checks{{window=\"{window}\",status=\"good\"}} {}\n",
        stats.good
    ));
    out.push_str(&format!(
        "pulse_health_checks{{window=\"{window}\",status=\"bad\"}} {}\n",
        stats.bad
    ));

    out
}
