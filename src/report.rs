// src/report.rs
use crate::utils::error::AppError;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: &'static str,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

/// What happened during one `pipeline` invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub query: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub stages: Vec<StageReport>,
}

impl RunReport {
    pub fn start(query: &str) -> Self {
        Self {
            query: query.to_string(),
            started_at: chrono::Utc::now().to_rfc3339(),
            finished_at: None,
            stages: Vec::new(),
        }
    }

    pub fn succeeded(&mut self, stage: &'static str, rows: usize, detail: Option<serde_json::Value>) {
        self.stages.push(StageReport {
            stage,
            status: StageStatus::Succeeded,
            rows: Some(rows),
            error: None,
            detail,
        });
    }

    pub fn failed(&mut self, stage: &'static str, error: &AppError) {
        self.stages.push(StageReport {
            stage,
            status: StageStatus::Failed,
            rows: None,
            error: Some(error.to_string()),
            detail: None,
        });
    }

    pub fn failures(&self) -> usize {
        self.stages.iter().filter(|s| s.status == StageStatus::Failed).count()
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(chrono::Utc::now().to_rfc3339());
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::info!("Saved run report to {}", path.display());
        Ok(())
    }
}
