use std::collections::VecDeque;

use futures::stream::TryStreamExt;
use futures::Stream;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use super::types::{Job, Pipeline, Project};
use crate::error::{PipestatError, Result};

pub(crate) const PAGE_SIZE: usize = 50;

/// REST client against the GitLab v4 API.
///
/// All listing endpoints are exposed as lazily paged sequences: nothing is
/// requested until the consumer polls, and how much of the conceptually
/// unbounded remote stream gets materialized is decided entirely by the
/// consumer (`take`, early stop).
pub struct GitLabClient {
    client: reqwest::Client,
    api: Url,
}

impl GitLabClient {
    /// Create a client for the given server.
    ///
    /// * `base_url` - Server root (e.g. "https://gitlab.com")
    /// * `token` - Optional personal access token; absent means anonymous
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("pipestat/", env!("CARGO_PKG_VERSION"))),
        );

        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| PipestatError::Config(format!("Invalid token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PipestatError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base = Url::parse(base_url)
            .map_err(|e| PipestatError::Config(format!("Invalid server URL: {e}")))?;

        let api = base
            .join("api/v4/")
            .map_err(|e| PipestatError::Config(format!("Invalid API URL: {e}")))?;

        Ok(Self { client, api })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.api
            .join(path)
            .map_err(|e| PipestatError::Config(format!("Invalid endpoint '{path}': {e}")))
    }

    /// List projects visible to the operator as a lazy stream.
    ///
    /// With a search term the whole server is searched by name substring;
    /// without one only starred projects are listed, since an unfiltered
    /// listing of everything visible would be unbounded and irrelevant.
    pub fn projects(&self, search: Option<&str>) -> Result<impl Stream<Item = Result<Project>> + '_> {
        let mut url = self.endpoint("projects")?;
        match search {
            Some(term) => {
                url.query_pairs_mut().append_pair("search", term);
            }
            None => {
                url.query_pairs_mut().append_pair("starred", "true");
            }
        }
        Ok(self.paged(url))
    }

    /// List a project's pipelines, newest first, as a lazy stream.
    pub fn pipelines(&self, project_id: u64) -> Result<impl Stream<Item = Result<Pipeline>> + '_> {
        let url = self.endpoint(&format!("projects/{project_id}/pipelines"))?;
        Ok(self.paged(url))
    }

    /// Fetch all jobs of a pipeline. Job lists are bounded by pipeline size,
    /// so this drains the pages instead of exposing a stream.
    pub async fn pipeline_jobs(&self, project_id: u64, pipeline_id: u64) -> Result<Vec<Job>> {
        let url = self.endpoint(&format!("projects/{project_id}/pipelines/{pipeline_id}/jobs"))?;
        self.paged(url).try_collect().await
    }

    /// Turn a paginated listing endpoint into a lazy stream of items.
    ///
    /// Pages are requested on demand as the consumer polls past the buffered
    /// items; a short page marks the end of the sequence.
    fn paged<'a, T>(&'a self, endpoint: Url) -> impl Stream<Item = Result<T>> + 'a
    where
        T: DeserializeOwned + 'a,
    {
        struct PageState<T> {
            page: usize,
            buffered: VecDeque<T>,
            exhausted: bool,
        }

        let state = PageState {
            page: 1,
            buffered: VecDeque::new(),
            exhausted: false,
        };

        futures::stream::try_unfold(state, move |mut state| {
            let mut url = endpoint.clone();
            async move {
                loop {
                    if let Some(item) = state.buffered.pop_front() {
                        return Ok(Some((item, state)));
                    }
                    if state.exhausted {
                        return Ok(None);
                    }

                    url.query_pairs_mut()
                        .append_pair("per_page", &PAGE_SIZE.to_string())
                        .append_pair("page", &state.page.to_string());

                    debug!("GET {url}");
                    let items: Vec<T> = self.fetch_page(url.clone()).await?;
                    if items.len() < PAGE_SIZE {
                        state.exhausted = true;
                    }
                    state.page += 1;
                    state.buffered.extend(items);
                }
            }
        })
    }

    async fn fetch_page<T>(&self, url: Url) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = response
                .text()
                .await
                .ok()
                .filter(|body| !body.is_empty())
                .unwrap_or_else(|| format!("{status}"));
            return Err(PipestatError::AccessDenied(message));
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(PipestatError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
