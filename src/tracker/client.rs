use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};

use crate::{error::TrackerError, settings::Credentials};

use super::{
    entities::{Myself, SearchRequest, SearchResponse, WorklogRequest},
    SearchMethod, TrackerApi,
};

const REQUEST_TIMEOUT_SECS: u64 = 20;
const API_PREFIX: &str = "rest/api/2";

/// [TrackerApi] over the tracker's REST API, authenticated with HTTP Basic.
#[derive(Clone)]
pub struct JiraClient {
    credentials: Credentials,
    client: Client,
}

impl JiraClient {
    pub fn new(credentials: Credentials) -> Result<Self, TrackerError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()
            .map_err(|e| TrackerError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            credentials,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.credentials.base_url.trim_end_matches('/');
        let suffix = path.trim_start_matches('/');
        format!("{base}/{API_PREFIX}/{suffix}")
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.credentials.username, Some(&self.credentials.api_token))
    }

    /// Sends the request and returns the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, TrackerError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| TrackerError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TrackerError::Network(format!("failed to read response: {e}")))?;

        if status.is_success() {
            Ok(body)
        } else {
            error!("Tracker responded with {status}: {body}");
            Err(TrackerError::from_status(status.as_u16(), body))
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, TrackerError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| TrackerError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl TrackerApi for JiraClient {
    #[instrument(skip(self, request), fields(jql = %request.jql))]
    async fn search(
        &self,
        method: SearchMethod,
        request: &SearchRequest,
    ) -> Result<SearchResponse, TrackerError> {
        debug!("Searching with {method:?}");
        let builder = match method {
            SearchMethod::Get => self
                .client
                .get(self.endpoint("search"))
                .query(&request.query_params()),
            SearchMethod::Post => self.client.post(self.endpoint("search")).json(request),
        };
        self.send_json(builder).await
    }

    #[instrument(skip(self, worklog))]
    async fn add_worklog(&self, key: &str, worklog: &WorklogRequest) -> Result<(), TrackerError> {
        let builder = self
            .client
            .post(self.endpoint(&format!("issue/{key}/worklog")))
            .json(worklog);
        self.send(builder).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn myself(&self) -> Result<Myself, TrackerError> {
        self.send_json(self.client.get(self.endpoint("myself"))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_paths() {
        let client = JiraClient::new(Credentials {
            base_url: "https://example.atlassian.net/".into(),
            username: "me".into(),
            api_token: "token".into(),
        })
        .unwrap();
        assert_eq!(
            client.endpoint("/issue/WL-1/worklog"),
            "https://example.atlassian.net/rest/api/2/issue/WL-1/worklog"
        );
    }
}
