use tabled::Tabled;

use crate::cli::output::{print_json, print_table};
use crate::config::{OutputMode, RuntimeConfig};
use crate::error::AppError;
use crate::models::AggregateView;
use crate::resolve;

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "METRIC")]
    metric: &'static str,
    #[tabled(rename = "VALUE")]
    value: String,
}

fn metric_rows(view: &AggregateView) -> Vec<MetricRow> {
    let mut rows = vec![
        MetricRow {
            metric: "Switched-on bulbs",
            value: view.on_count.to_string(),
        },
        MetricRow {
            metric: "Switched-off bulbs",
            value: view.off_count.to_string(),
        },
        MetricRow {
            metric: "All lights on",
            value: if view.all_on { "yes" } else { "no" }.to_string(),
        },
    ];
    if let Some(users) = view.logged_in_users {
        rows.push(MetricRow {
            metric: "Logged-in users",
            value: users.to_string(),
        });
    }
    rows
}

pub async fn handle(config: &RuntimeConfig) -> Result<(), AppError> {
    let sync = resolve::open_sync(config)?;
    sync.refresh().await?;
    let view = sync.snapshot().aggregate;

    if config.output_mode == OutputMode::Table {
        print_table(&metric_rows(&view));
    } else {
        print_json(&serde_json::to_value(view)?);
    }
    Ok(())
}
