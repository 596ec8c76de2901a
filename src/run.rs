use futures::{pin_mut, Stream, StreamExt, TryStreamExt};
use log::info;

use crate::error::{PipestatError, Result};
use crate::output;
use crate::providers::gitlab::types::{Job, JobStatus, Pipeline, Project};
use crate::providers::gitlab::GitLabClient;

/// Operator-supplied filters and bounds for one `run` invocation.
#[derive(Debug, Clone)]
pub struct RunFilters {
    /// Substring matched against project names including namespace
    pub projects: Option<String>,
    /// Substring matched against the ref a pipeline ran on
    pub references: Option<String>,
    pub limit_projects: usize,
    pub limit_pipelines: usize,
    /// How many pipeline entries to scan per project, independent of how
    /// many end up accepted
    pub search_depth: usize,
}

/// Display behavior derived from the global verbose flag.
#[derive(Debug, Clone, Copy)]
pub struct DisplayOptions {
    pub show_link: bool,
    pub hide_jobs: bool,
    pub hide_okay_jobs: bool,
}

impl DisplayOptions {
    pub fn from_verbose(verbose: bool) -> Self {
        Self {
            show_link: verbose,
            hide_jobs: !verbose,
            hide_okay_jobs: !verbose,
        }
    }
}

/// Walk projects, pipelines and jobs sequentially and print each as a line.
///
/// A denied pipeline listing is reported inline and skips only that project;
/// any other remote failure aborts the run.
pub async fn execute(
    client: &GitLabClient,
    filters: &RunFilters,
    display: &DisplayOptions,
) -> Result<()> {
    let projects = {
        let stream = client.projects(filters.projects.as_deref())?;
        collect_projects(stream, filters.limit_projects).await?
    };
    info!("Traversing {} project(s)", projects.len());

    for project in &projects {
        println!("{}", output::project_line(project));

        let pipelines = {
            let stream = client.pipelines(project.id)?;
            let scanned = scan_pipelines(
                stream,
                filters.references.as_deref(),
                filters.limit_pipelines,
                filters.search_depth,
            )
            .await;
            match scanned {
                Ok(pipelines) => pipelines,
                Err(PipestatError::AccessDenied(message)) => {
                    println!("{}", output::skipped_line(&message));
                    Vec::new()
                }
                Err(other) => return Err(other),
            }
        };

        for pipeline in &pipelines {
            println!("{}", output::pipeline_line(pipeline));
            if pipeline.is_okay() || display.hide_jobs {
                continue;
            }
            if display.show_link {
                println!("{}", output::link_line(&pipeline.web_url));
            }
            let jobs = client.pipeline_jobs(project.id, pipeline.id).await?;
            for job in order_jobs(jobs, display.hide_okay_jobs) {
                println!("{}", output::job_line(&job));
            }
        }
    }

    Ok(())
}

/// Take at most `limit` projects from the lazy sequence, then sort them by
/// namespaced name for deterministic output.
async fn collect_projects<S>(projects: S, limit: usize) -> Result<Vec<Project>>
where
    S: Stream<Item = Result<Project>>,
{
    let mut taken: Vec<Project> = projects.take(limit).try_collect().await?;
    taken.sort_by(|a, b| a.name_with_namespace.cmp(&b.name_with_namespace));
    Ok(taken)
}

/// Scan at most `depth` entries of the pipeline sequence, accepting those
/// whose ref contains the filter, and stop early once `limit` are accepted.
async fn scan_pipelines<S>(
    pipelines: S,
    ref_filter: Option<&str>,
    limit: usize,
    depth: usize,
) -> Result<Vec<Pipeline>>
where
    S: Stream<Item = Result<Pipeline>>,
{
    let mut accepted = Vec::new();
    if limit == 0 {
        return Ok(accepted);
    }

    let scanned = pipelines.take(depth);
    pin_mut!(scanned);

    while let Some(pipeline) = scanned.try_next().await? {
        if ref_filter.map_or(true, |filter| pipeline.ref_.contains(filter)) {
            accepted.push(pipeline);
        }
        if accepted.len() >= limit {
            break;
        }
    }

    Ok(accepted)
}

/// Order jobs by creation time; drop skipped/successful ones unless the
/// operator wants to see them.
fn order_jobs(mut jobs: Vec<Job>, hide_okay: bool) -> Vec<Job> {
    jobs.sort_by_key(|job| job.created_at);
    if hide_okay {
        jobs.retain(|job| !matches!(job.status, JobStatus::Skipped | JobStatus::Success));
    }
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::gitlab::types::PipelineStatus;
    use chrono::{TimeZone, Utc};
    use futures::stream;
    use std::cell::Cell;
    use std::rc::Rc;

    fn project(id: u64, name: &str) -> Project {
        Project {
            id,
            name_with_namespace: name.to_string(),
        }
    }

    fn pipeline(id: u64, ref_: &str, status: PipelineStatus) -> Pipeline {
        Pipeline {
            id,
            ref_: ref_.to_string(),
            status,
            web_url: format!("https://ci.example/p/-/pipelines/{id}"),
        }
    }

    fn job(name: &str, status: JobStatus, minute: u32) -> Job {
        Job {
            stage: "build".to_string(),
            name: name.to_string(),
            status,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_project_truncation_and_ordering() {
        let remote = vec![
            Ok(project(1, "zeta / svc")),
            Ok(project(2, "alpha / app")),
            Ok(project(3, "mid / lib")),
            Ok(project(4, "never / reached")),
        ];

        let taken = collect_projects(stream::iter(remote), 3).await.unwrap();

        let names: Vec<_> = taken
            .iter()
            .map(|p| p.name_with_namespace.as_str())
            .collect();
        assert_eq!(names, vec!["alpha / app", "mid / lib", "zeta / svc"]);
    }

    #[tokio::test]
    async fn test_project_truncation_with_fewer_than_limit() {
        let remote = vec![Ok(project(1, "only / one"))];
        let taken = collect_projects(stream::iter(remote), 5).await.unwrap();
        assert_eq!(taken.len(), 1);
    }

    #[tokio::test]
    async fn test_pipeline_scan_never_exceeds_depth() {
        let polled = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&polled);
        // Unbounded remote sequence; only the depth cap terminates the scan.
        let remote = stream::iter((1u64..).map(move |id| {
            counter.set(counter.get() + 1);
            Ok(pipeline(id, "main", PipelineStatus::Success))
        }));

        let found = scan_pipelines(remote, Some("no-such-ref"), 100, 7)
            .await
            .unwrap();

        assert!(found.is_empty());
        assert_eq!(polled.get(), 7);
    }

    #[tokio::test]
    async fn test_pipeline_scan_stops_at_limit() {
        let remote = stream::iter(vec![
            Ok(pipeline(31, "main", PipelineStatus::Success)),
            Ok(pipeline(30, "main", PipelineStatus::Failed)),
            Ok(pipeline(29, "main", PipelineStatus::Running)),
        ]);

        let found = scan_pipelines(remote, None, 2, 50).await.unwrap();

        let ids: Vec<_> = found.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![31, 30]);
        assert!(!found[1].is_okay());
    }

    #[tokio::test]
    async fn test_pipeline_scan_honors_ref_filter() {
        let remote = stream::iter(vec![
            Ok(pipeline(3, "main", PipelineStatus::Success)),
            Ok(pipeline(2, "develop", PipelineStatus::Failed)),
            Ok(pipeline(1, "feature/devtools", PipelineStatus::Failed)),
        ]);

        let found = scan_pipelines(remote, Some("dev"), 5, 50).await.unwrap();

        let refs: Vec<_> = found.iter().map(|p| p.ref_.as_str()).collect();
        assert_eq!(refs, vec!["develop", "feature/devtools"]);
    }

    #[tokio::test]
    async fn test_pipeline_scan_with_zero_limit_polls_nothing() {
        let polled = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&polled);
        let remote = stream::iter((1u64..).map(move |id| {
            counter.set(counter.get() + 1);
            Ok(pipeline(id, "main", PipelineStatus::Failed))
        }));

        let found = scan_pipelines(remote, None, 0, 50).await.unwrap();

        assert!(found.is_empty());
        assert_eq!(polled.get(), 0);
    }

    #[test]
    fn test_job_suppression_hides_okay_statuses() {
        let jobs = vec![
            job("deploy", JobStatus::Skipped, 4),
            job("lint", JobStatus::Success, 1),
            job("test", JobStatus::Failed, 3),
            job("build", JobStatus::Running, 2),
        ];

        let shown = order_jobs(jobs, true);

        let names: Vec<_> = shown.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["build", "test"]);
    }

    #[test]
    fn test_jobs_ordered_by_creation_time_when_unfiltered() {
        let jobs = vec![
            job("c", JobStatus::Success, 30),
            job("a", JobStatus::Skipped, 10),
            job("b", JobStatus::Failed, 20),
        ];

        let shown = order_jobs(jobs, false);

        let names: Vec<_> = shown.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_verbose_reveals_jobs_and_links() {
        let quiet = DisplayOptions::from_verbose(false);
        assert!(quiet.hide_jobs);
        assert!(quiet.hide_okay_jobs);
        assert!(!quiet.show_link);

        let verbose = DisplayOptions::from_verbose(true);
        assert!(!verbose.hide_jobs);
        assert!(!verbose.hide_okay_jobs);
        assert!(verbose.show_link);
    }
}
