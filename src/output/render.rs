use console::StyledObject;

use super::styling;
use crate::providers::gitlab::types::{Job, JobStatus, Pipeline, PipelineStatus, Project};
use crate::registry::Profile;

/// Display-style tag for a status value. The mapping from status kinds to
/// tags is fixed here; which escape sequences a tag turns into is left to
/// the styling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusStyle {
    /// Still moving (created, running)
    Notice,
    /// Finished well
    Good,
    /// Not interesting (canceled, skipped, ...)
    Muted,
    /// Needs attention
    Alert,
}

pub fn pipeline_status_style(status: PipelineStatus) -> StatusStyle {
    match status {
        PipelineStatus::Created | PipelineStatus::Running => StatusStyle::Notice,
        PipelineStatus::Canceled => StatusStyle::Muted,
        PipelineStatus::Success => StatusStyle::Good,
        PipelineStatus::Failed | PipelineStatus::Other => StatusStyle::Alert,
    }
}

pub fn job_status_style(status: JobStatus) -> StatusStyle {
    match status {
        JobStatus::Created | JobStatus::Running => StatusStyle::Notice,
        JobStatus::Failed => StatusStyle::Alert,
        _ => StatusStyle::Muted,
    }
}

fn paint(text: &str, tag: StatusStyle) -> StyledObject<String> {
    match tag {
        StatusStyle::Notice => styling::bright_yellow(text),
        StatusStyle::Good => styling::bright_green(text),
        StatusStyle::Muted => styling::grey(text),
        StatusStyle::Alert => styling::bright_red(text),
    }
}

pub fn project_line(project: &Project) -> String {
    styling::bright_magenta(&project.name_with_namespace).to_string()
}

/// One pipeline row: `|- <id> ---- <ref> ---->` plus the colored status.
pub fn pipeline_line(pipeline: &Pipeline) -> String {
    let id = dash_pad(&pipeline.id.to_string(), 19);
    let ref_ = dash_pad(&truncate(&pipeline.ref_, 29), 31);
    let status = paint(pipeline.status.as_str(), pipeline_status_style(pipeline.status));
    format!("|- {id} {ref_}> {status}")
}

/// One job row, indented below its pipeline.
pub fn job_line(job: &Job) -> String {
    let stage = space_pad(&truncate(&job.stage, 19), 20);
    let name = space_pad(&truncate(&job.name, 31), 32);
    let status = paint(job.status.as_str(), job_status_style(job.status));
    format!("   > {stage}{name} {status}")
}

/// Inline report for a project whose pipeline listing was denied.
pub fn skipped_line(message: &str) -> String {
    format!("|- Skipped: {}", styling::bright_red(message))
}

/// Web link line shown below a not-okay pipeline in verbose mode.
pub fn link_line(url: &str) -> String {
    format!("   # {url}")
}

/// Render the server listing, one row per profile.
///
/// Column widths follow the longest alias and URL so rows align. The active
/// profile is marked and its alias highlighted; tokens are never shown in
/// plaintext, only as a placeholder run of the same length.
pub fn server_rows(servers: &[(&str, &Profile)]) -> Vec<String> {
    let alias_width = servers
        .iter()
        .map(|(alias, _)| alias.chars().count())
        .max()
        .unwrap_or(0);
    let url_width = servers
        .iter()
        .map(|(_, profile)| profile.url.chars().count())
        .max()
        .unwrap_or(0);

    servers
        .iter()
        .map(|(alias, profile)| {
            let marker = if profile.active { "*" } else { " " };
            let alias_text = space_pad(alias, alias_width);
            let alias_text = if profile.active {
                styling::bright_green(alias_text).to_string()
            } else {
                alias_text
            };
            let url_text = space_pad(&profile.url, url_width);
            let token_text = profile.token.as_ref().map_or_else(
                || "<no token>".to_string(),
                |token| "*".repeat(token.chars().count()),
            );
            format!("{marker} {alias_text} {url_text} {token_text}")
        })
        .collect()
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn dash_pad(text: &str, width: usize) -> String {
    format!("{:-<width$}", format!("{text} "))
}

fn space_pad(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}
