use anyhow::{bail, Result};
use reqwest::{Client, Response};
use wordset_api::{
    handlers::task::{FillResponse, TaskResponse},
    ErrorResponse,
};

/// Thin HTTP client for the endpoints the CLI drives.
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub async fn fill(&self, study_set_id: i64, user_id: &str) -> Result<i64> {
        let response = self
            .http
            .post(format!("{}/study-sets/{}/fill", self.base_url, study_set_id))
            .header("x-user-id", user_id)
            .send()
            .await?;

        let body: FillResponse = Self::decode(response).await?;
        Ok(body.task_id)
    }

    pub async fn task(&self, task_id: i64) -> Result<TaskResponse> {
        let response = self
            .http
            .get(format!("{}/tasks/{}", self.base_url, task_id))
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await?;
        match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(body) => bail!("{} ({})", body.error, status),
            Err(_) => bail!("Request failed with {}: {}", status, text),
        }
    }
}
