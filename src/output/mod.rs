mod render;
mod styling;

pub use render::{
    job_line, link_line, pipeline_line, project_line, server_rows, skipped_line,
};
