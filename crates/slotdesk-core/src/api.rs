use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use slotdesk_shared::{
    AutomationResponse, AutomationStartRequest, ConnectionTestRequest, ConnectionTestResponse,
    LogEntryDto, ReferenceAddRequest, ReferenceDeleteRequest, ReferencesDto, SettingsDto,
    SettingsUpdate, SuccessResponse, TaskCreate, TaskDto, TaskReorderRequest, TaskUpdate,
};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::ApiError;

pub type ApiResult<T> = Result<T, ApiError>;

/// JSON/HTTP contract of the automation backend.
#[async_trait]
pub trait Backend {
    async fn list_tasks(&self) -> ApiResult<Vec<TaskDto>>;
    async fn create_task(&self, task: &TaskCreate) -> ApiResult<SuccessResponse>;
    async fn update_task(&self, task: &TaskUpdate) -> ApiResult<SuccessResponse>;
    async fn delete_task(&self, id: &str) -> ApiResult<SuccessResponse>;
    async fn reorder_tasks(&self, request: &TaskReorderRequest) -> ApiResult<SuccessResponse>;

    async fn list_references(&self) -> ApiResult<ReferencesDto>;
    async fn add_reference(&self, request: &ReferenceAddRequest) -> ApiResult<SuccessResponse>;
    async fn delete_reference(
        &self,
        request: &ReferenceDeleteRequest,
    ) -> ApiResult<SuccessResponse>;

    async fn start_automation(
        &self,
        request: &AutomationStartRequest,
    ) -> ApiResult<AutomationResponse>;
    async fn stop_automation(&self) -> ApiResult<AutomationResponse>;

    async fn list_logs(&self) -> ApiResult<Vec<LogEntryDto>>;

    async fn get_settings(&self) -> ApiResult<SettingsDto>;
    async fn save_settings(&self, settings: &SettingsUpdate) -> ApiResult<SuccessResponse>;
    async fn test_connection(
        &self,
        request: &ConnectionTestRequest,
    ) -> ApiResult<ConnectionTestResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base = Url::parse(&normalized).map_err(|_| ApiError::BadUrl(base_url.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ApiError::Transport {
                url: base.to_string(),
                source,
            })?;

        Ok(Self { client, base })
    }

    pub fn from_config(cfg: &Config) -> ApiResult<Self> {
        Self::new(&cfg.api_url(), cfg.api_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|_| ApiError::BadUrl(format!("{}{}", self.base, path)))
    }

    async fn send<B, R>(&self, method: Method, url: Url, body: Option<&B>) -> ApiResult<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let request_id = Uuid::new_v4();
        let url_text = url.to_string();
        debug!(%request_id, %method, url = %url_text, "backend request");

        let mut request = self.client.request(method, url);
        if let Some(payload) = body {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(|source| {
            warn!(%request_id, url = %url_text, error = %source, "backend unreachable");
            ApiError::Transport {
                url: url_text.clone(),
                source,
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|source| ApiError::Transport {
            url: url_text.clone(),
            source,
        })?;

        if !status.is_success() {
            warn!(
                %request_id,
                url = %url_text,
                status = status.as_u16(),
                "backend returned non-success status"
            );
            return Err(ApiError::status(status.as_u16(), text));
        }

        debug!(%request_id, status = status.as_u16(), bytes = text.len(), "backend response");
        decode_body(&url_text, &text)
    }
}

fn decode_body<R: DeserializeOwned>(url: &str, text: &str) -> ApiResult<R> {
    serde_json::from_str(text).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })
}

#[async_trait]
impl Backend for HttpBackend {
    #[instrument(skip(self))]
    async fn list_tasks(&self) -> ApiResult<Vec<TaskDto>> {
        let url = self.endpoint("/api/tasks")?;
        self.send::<(), _>(Method::GET, url, None).await
    }

    #[instrument(skip(self, task), fields(num_auto = %task.num_auto))]
    async fn create_task(&self, task: &TaskCreate) -> ApiResult<SuccessResponse> {
        let url = self.endpoint("/api/tasks/create")?;
        self.send(Method::POST, url, Some(task)).await
    }

    #[instrument(skip(self, task), fields(task_id = %task.id))]
    async fn update_task(&self, task: &TaskUpdate) -> ApiResult<SuccessResponse> {
        let url = self.endpoint("/api/tasks/update")?;
        self.send(Method::PUT, url, Some(task)).await
    }

    #[instrument(skip(self))]
    async fn delete_task(&self, id: &str) -> ApiResult<SuccessResponse> {
        let mut url = self.endpoint("/api/tasks/delete")?;
        url.query_pairs_mut().append_pair("id", id);
        self.send::<(), _>(Method::DELETE, url, None).await
    }

    #[instrument(skip(self, request), fields(count = request.task_positions.len()))]
    async fn reorder_tasks(&self, request: &TaskReorderRequest) -> ApiResult<SuccessResponse> {
        let url = self.endpoint("/api/tasks/reorder")?;
        self.send(Method::POST, url, Some(request)).await
    }

    #[instrument(skip(self))]
    async fn list_references(&self) -> ApiResult<ReferencesDto> {
        let url = self.endpoint("/api/references")?;
        self.send::<(), _>(Method::GET, url, None).await
    }

    #[instrument(skip(self, request), fields(kind = %request.kind))]
    async fn add_reference(&self, request: &ReferenceAddRequest) -> ApiResult<SuccessResponse> {
        let url = self.endpoint("/api/references/add")?;
        self.send(Method::POST, url, Some(request)).await
    }

    #[instrument(skip(self, request), fields(kind = %request.kind, item_id = %request.item_id))]
    async fn delete_reference(
        &self,
        request: &ReferenceDeleteRequest,
    ) -> ApiResult<SuccessResponse> {
        let url = self.endpoint("/api/references/delete")?;
        self.send(Method::DELETE, url, Some(request)).await
    }

    #[instrument(skip(self, request), fields(count = request.task_ids.len(), parallel = request.parallel))]
    async fn start_automation(
        &self,
        request: &AutomationStartRequest,
    ) -> ApiResult<AutomationResponse> {
        let url = self.endpoint("/api/automation/start")?;
        self.send(Method::POST, url, Some(request)).await
    }

    #[instrument(skip(self))]
    async fn stop_automation(&self) -> ApiResult<AutomationResponse> {
        let url = self.endpoint("/api/automation/stop")?;
        self.send::<(), _>(Method::POST, url, None).await
    }

    #[instrument(skip(self))]
    async fn list_logs(&self) -> ApiResult<Vec<LogEntryDto>> {
        let url = self.endpoint("/api/logs")?;
        self.send::<(), _>(Method::GET, url, None).await
    }

    #[instrument(skip(self))]
    async fn get_settings(&self) -> ApiResult<SettingsDto> {
        let url = self.endpoint("/api/settings")?;
        self.send::<(), _>(Method::GET, url, None).await
    }

    #[instrument(skip(self, settings))]
    async fn save_settings(&self, settings: &SettingsUpdate) -> ApiResult<SuccessResponse> {
        let url = self.endpoint("/api/settings")?;
        self.send(Method::POST, url, Some(settings)).await
    }

    #[instrument(skip(self, request), fields(site_url = %request.site_url))]
    async fn test_connection(
        &self,
        request: &ConnectionTestRequest,
    ) -> ApiResult<ConnectionTestResponse> {
        let url = self.endpoint("/api/connection/test")?;
        self.send(Method::POST, url, Some(request)).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use slotdesk_shared::SuccessResponse;

    use super::{HttpBackend, decode_body};
    use crate::error::{ApiError, ErrorClass};

    #[test]
    fn endpoints_join_under_base_path() {
        let backend = HttpBackend::new("http://panel.local:8000/sub", Duration::from_secs(5))
            .expect("backend");
        let url = backend.endpoint("/api/tasks").expect("endpoint");
        assert_eq!(url.as_str(), "http://panel.local:8000/sub/api/tasks");
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let err = HttpBackend::new("not a url", Duration::from_secs(5)).expect_err("bad url");
        assert!(matches!(err, ApiError::BadUrl(_)));
        assert_eq!(err.class(), ErrorClass::Transport);
    }

    #[test]
    fn delete_url_encodes_id() {
        let backend =
            HttpBackend::new("http://127.0.0.1:8000", Duration::from_secs(5)).expect("backend");
        let mut url = backend.endpoint("/api/tasks/delete").expect("endpoint");
        url.query_pairs_mut().append_pair("id", "task 1&x");
        assert_eq!(url.query(), Some("id=task+1%26x"));
    }

    #[test]
    fn success_body_decodes_with_defaults() {
        let ok: SuccessResponse = decode_body("u", "{}").expect("decode");
        assert!(ok.success);
        assert!(decode_body::<SuccessResponse>("u", "<html>").is_err());
    }
}
