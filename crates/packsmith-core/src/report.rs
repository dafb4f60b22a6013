use chrono::{DateTime, Utc};
use packsmith_runtime::HealthLevel;
use serde::Serialize;

/// Health of one managed resource at the time of the status check.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceStatus {
    pub id: String,
    pub name: String,
    /// Kind of the resource that produced this entry (e.g. `nomad_pack`).
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub health: HealthLevel,
    pub health_message: String,
    /// The parsed status row as JSON, opaque to the report.
    pub state_json: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub resources: Vec<ResourceStatus>,
    pub health: HealthLevel,
    pub health_message: String,
    pub generated_at: DateTime<Utc>,
}

impl StatusReport {
    /// Fold resource health into an overall health: the worst one wins.
    pub fn from_resources(resources: Vec<ResourceStatus>) -> Self {
        let total = resources.len();
        let ready = resources
            .iter()
            .filter(|r| r.health == HealthLevel::Ready)
            .count();

        let worst = resources.iter().map(|r| r.health).min_by_key(|h| h.rank());
        let (health, health_message) = match worst {
            None => (HealthLevel::Unknown, "no resources reported".to_owned()),
            Some(HealthLevel::Ready) => (HealthLevel::Ready, "all resources are ready".to_owned()),
            Some(worst) => (worst, format!("{ready} of {total} resources ready")),
        };

        Self {
            resources,
            health,
            health_message,
            generated_at: Utc::now(),
        }
    }
}
