use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub client_id: String,
    pub severity: String,
    pub message: String,
    pub created_at: String,
}

/// Read-only alert feed, loaded once at process start.
pub fn load(path: &str) -> anyhow::Result<Vec<Alert>> {
    let mut csv_reader = csv::Reader::from_path(path)?;

    let mut alerts = vec![];
    for record in csv_reader.deserialize() {
        let alert: Alert = record?;
        alerts.push(alert);
    }

    log::info!("loaded {} alerts from {path}", alerts.len());

    Ok(alerts)
}
