//! Project (dataset) endpoints

use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::info;

use super::http::{ClientError, Result, StorcycleClient, status_error};
use crate::auth::Token;
use crate::config::ProjectDefaults;
use crate::ingest::{FetchError, RawRecord, fetch_all};

const PROJECT_TYPE: &str = "ScanAndArchive";

impl StorcycleClient {
    /// `GET /projects/{id}`: 200 means present, 404 absent, anything else fails.
    pub async fn project_exists(&self, token: &Token, dataset_id: &str) -> Result<bool> {
        let response = self
            .get_raw(token, &["projects", dataset_id], &[])
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(status_error(status, response.url())),
        }
    }

    pub async fn get_project(&self, token: &Token, dataset_id: &str) -> Result<Value> {
        self.get_json(token, &["projects", dataset_id], &[]).await
    }

    /// `PUT /projects/archive/{name}` with the default archive payload
    pub async fn create_project(
        &self,
        token: &Token,
        defaults: &ProjectDefaults,
        name: &str,
        description: &str,
        directory: &str,
    ) -> Result<Value> {
        if name.is_empty() {
            return Err(ClientError::InvalidArgument("empty project name".to_string()));
        }

        let payload = archive_project_payload(defaults, description, directory);
        let created = self
            .put_json(token, &["projects", "archive", name], &payload)
            .await?;

        info!(name, directory, "Created archive project");
        Ok(created)
    }

    /// Every active ScanAndArchive project, across all pages
    pub async fn list_projects(
        &self,
        token: &Token,
        page_size: usize,
    ) -> std::result::Result<Vec<RawRecord>, FetchError> {
        let filters = [
            ("active".to_string(), "true".to_string()),
            ("filterBy".to_string(), PROJECT_TYPE.to_string()),
        ];
        fetch_all(&self.pages(token), "projects", &filters, page_size).await
    }
}

/// Body for a new archive project: keep originals, no age/size filter,
/// scheduled to run immediately.
pub fn archive_project_payload(
    defaults: &ProjectDefaults,
    description: &str,
    directory: &str,
) -> Value {
    json!({
        "description": description,
        "share": defaults.share,
        "projectType": PROJECT_TYPE,
        "workingDirectory": directory,
        "targets": defaults.targets,
        "active": true,
        "enabled": true,
        "breadCrumbAction": "KeepOriginal",
        "delayedActionDays": 0,
        "filter": {
            "minimumAge": "AnyAge",
            "customAgeInDays": 0,
            "minimumSize": "Any",
        },
        "schedule": {"period": "Now"},
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HttpConfig;

    #[tokio::test]
    async fn test_create_project_rejects_empty_name() {
        let client = StorcycleClient::new(HttpConfig::default()).unwrap();
        let token = Token::new("tok", chrono::Utc::now());

        let result = client
            .create_project(&token, &ProjectDefaults::default(), "", "desc", "/bil/x")
            .await;
        assert!(matches!(result, Err(ClientError::InvalidArgument(_))));
    }

    #[test]
    fn test_archive_payload_uses_defaults() {
        let payload = archive_project_payload(
            &ProjectDefaults::default(),
            "Mouse brain atlas",
            "/bil/data/ab/cd/abcd1234",
        );

        assert_eq!(payload["description"], "Mouse brain atlas");
        assert_eq!(payload["share"], "BIL Published Data");
        assert_eq!(payload["projectType"], "ScanAndArchive");
        assert_eq!(payload["workingDirectory"], "/bil/data/ab/cd/abcd1234");
        assert_eq!(payload["targets"], json!(["BIL Published Data on Tape"]));
        assert_eq!(payload["breadCrumbAction"], "KeepOriginal");
        assert_eq!(payload["delayedActionDays"], 0);
        assert_eq!(payload["filter"]["minimumAge"], "AnyAge");
        assert_eq!(payload["schedule"]["period"], "Now");
    }
}
