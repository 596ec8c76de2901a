use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A GitLab project as returned by the projects listing.
///
/// Only the fields the traversal needs are deserialized; everything else in
/// the API payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    /// Numeric project ID, used to address pipeline/job listings
    pub id: u64,
    /// Display name including the namespace (e.g. "group / tool")
    pub name_with_namespace: String,
}

/// A single pipeline run of a project.
#[derive(Debug, Clone, Deserialize)]
pub struct Pipeline {
    pub id: u64,
    /// Git reference the pipeline ran on (branch or tag name)
    #[serde(rename = "ref")]
    pub ref_: String,
    pub status: PipelineStatus,
    /// Link to the pipeline page on the server
    pub web_url: String,
}

impl Pipeline {
    /// An okay pipeline does not warrant job-level detail.
    pub fn is_okay(&self) -> bool {
        matches!(
            self.status,
            PipelineStatus::Success | PipelineStatus::Canceled
        )
    }
}

/// A job within a pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    /// Stage this job belongs to
    pub stage: String,
    /// Job name as defined in the CI configuration
    pub name: String,
    pub status: JobStatus,
    /// When the job was created; defines the display order
    pub created_at: DateTime<Utc>,
}

/// Pipeline status, closed over the values the presenter distinguishes.
/// Anything the server reports beyond these maps to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Created,
    Running,
    Canceled,
    Success,
    Failed,
    #[serde(other)]
    Other,
}

impl PipelineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Canceled => "canceled",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Other => "other",
        }
    }
}

/// Job status. `Skipped` and `Success` are the ones filtered out by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Created,
    Pending,
    Running,
    Failed,
    Success,
    Canceled,
    Skipped,
    Manual,
    #[serde(other)]
    Other,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Failed => "failed",
            Self::Success => "success",
            Self::Canceled => "canceled",
            Self::Skipped => "skipped",
            Self::Manual => "manual",
            Self::Other => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_pipeline_status_maps_to_other() {
        let pipeline: Pipeline = serde_json::from_str(
            r#"{"id": 7, "ref": "main", "status": "waiting_for_resource",
                "web_url": "https://gitlab.com/g/p/-/pipelines/7"}"#,
        )
        .unwrap();
        assert_eq!(pipeline.status, PipelineStatus::Other);
    }

    #[test]
    fn test_okay_pipeline_classification() {
        let statuses = [
            (PipelineStatus::Success, true),
            (PipelineStatus::Canceled, true),
            (PipelineStatus::Failed, false),
            (PipelineStatus::Running, false),
            (PipelineStatus::Created, false),
            (PipelineStatus::Other, false),
        ];
        for (status, okay) in statuses {
            let pipeline = Pipeline {
                id: 1,
                ref_: "main".to_string(),
                status,
                web_url: String::new(),
            };
            assert_eq!(pipeline.is_okay(), okay, "status {status:?}");
        }
    }

    #[test]
    fn test_job_deserializes_with_timestamp() {
        let job: Job = serde_json::from_str(
            r#"{"stage": "test", "name": "unit", "status": "failed",
                "created_at": "2024-03-01T12:00:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.stage, "test");
    }
}
