//! The issue tracker boundary. [TrackerApi] is the contract the HTTP client implements, the
//! fetch and submit flows are written against it so they can run without a network.

pub mod client;
pub mod entities;
pub mod fetch;
pub mod submit;

use async_trait::async_trait;
use entities::{Myself, SearchRequest, SearchResponse, WorklogRequest};

use crate::error::TrackerError;

/// How a search is sent. Some tracker deployments refuse one of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMethod {
    Get,
    Post,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackerApi: Send + Sync {
    async fn search(
        &self,
        method: SearchMethod,
        request: &SearchRequest,
    ) -> Result<SearchResponse, TrackerError>;

    async fn add_worklog(&self, key: &str, worklog: &WorklogRequest) -> Result<(), TrackerError>;

    async fn myself(&self) -> Result<Myself, TrackerError>;
}
