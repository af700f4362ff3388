//! StorCycle OpenAPI client: token issuance, authenticated JSON calls, the
//! job status listing and the project endpoints.

mod http;
mod jobs;
mod projects;

pub use http::{BearerPages, ClientError, HttpConfig, Result, StorcycleClient};
pub use jobs::JOB_STATUS_ENDPOINT;
pub use projects::archive_project_payload;
