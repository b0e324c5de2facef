use crate::config::EnvConfig;
use crate::models::{Note, NoteDraft, NoteSummary, Notebook};
use crate::storage::TOKEN_KEY;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// Backend operations the tree and the editor depend on.
///
/// `ApiClient` speaks HTTP; tests use an in-memory fake.
pub(crate) trait NotesBackend {
    async fn list_notebooks(&self) -> ApiResult<Vec<Notebook>>;
    async fn create_notebook(&self, name: &str, parent_id: Option<&str>) -> ApiResult<Notebook>;
    async fn rename_notebook(&self, id: &str, name: &str) -> ApiResult<Notebook>;
    async fn reparent_notebook(&self, id: &str, parent_id: Option<&str>) -> ApiResult<Notebook>;
    async fn delete_notebook(&self, id: &str) -> ApiResult<()>;

    /// `None` lists notes that live outside any notebook.
    async fn list_notes(&self, notebook_id: Option<&str>) -> ApiResult<Vec<NoteSummary>>;
    async fn get_note(&self, id: &str) -> ApiResult<Note>;
    async fn create_note(&self, notebook_id: Option<&str>) -> ApiResult<Note>;
    async fn move_note(&self, id: &str, notebook_id: Option<&str>) -> ApiResult<Note>;
    async fn delete_note(&self, id: &str) -> ApiResult<()>;
    async fn save_note(&self, id: &str, draft: &NoteDraft) -> ApiResult<Note>;
    async fn set_pinned(&self, id: &str, pinned: bool) -> ApiResult<Note>;
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateNotebookRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// `parentId` is always sent: `null` moves the notebook to the root.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReparentNotebookRequest {
    pub parent_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateNoteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notebook_id: Option<String>,
    pub title: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MoveNoteRequest {
    pub notebook_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetPinnedRequest {
    pub is_pinned: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) token: Option<String>,
}

impl ApiClient {
    #[cfg(test)]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            token: None,
        }
    }

    pub fn load_from_storage() -> Self {
        let base_url = EnvConfig::new().api_url;
        let token = web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .and_then(|s| s.get_item(TOKEN_KEY).ok().flatten());

        Self { base_url, token }
    }

    #[cfg(test)]
    pub fn save_to_storage(&self) {
        if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
            if let Some(token) = &self.token {
                let _ = storage.set_item(TOKEN_KEY, token);
            }
        }
    }

    pub fn clear_storage() {
        if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
            let _ = storage.remove_item(TOKEN_KEY);
        }
    }

    #[cfg(test)]
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    #[cfg(test)]
    pub fn get_token(&self) -> Option<&String> {
        self.token.as_ref()
    }

    pub fn get_auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn logout(&mut self) {
        self.token = None;
        Self::clear_storage();
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Path segment for a note listing; the backend calls the no-notebook
    /// bucket `root`.
    pub(crate) fn notes_listing_path(notebook_id: Option<&str>) -> String {
        match notebook_id {
            Some(id) => format!("/notes/notebook/{}", urlencoding::encode(id)),
            None => "/notes/notebook/root".to_string(),
        }
    }

    fn build(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> reqwest::RequestBuilder {
        let mut req = reqwest::Client::new().request(method, self.url(path));
        if let Some(header) = self.get_auth_header() {
            req = req.header("Authorization", header);
        }
        if let Some(b) = body {
            req = req.json(b);
        }
        req
    }

    async fn checked(res: reqwest::Response, ctx: &str) -> ApiResult<reqwest::Response> {
        let status = res.status();
        if status.is_success() {
            Ok(res)
        } else if status.as_u16() == 401 {
            Err(ApiError::unauthorized())
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, ctx))
        }
    }

    async fn request_api<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<T> {
        let ctx = format!("{method} {path} failed");
        let res = self
            .build(method, path, body.as_ref())
            .send()
            .await
            .map_err(ApiError::network)?;
        let res = Self::checked(res, &ctx).await?;
        res.json().await.map_err(ApiError::parse)
    }

    /// For endpoints whose response body is irrelevant (deletes).
    async fn request_empty(&self, method: Method, path: &str) -> ApiResult<()> {
        let ctx = format!("{method} {path} failed");
        let res = self
            .build(method, path, None)
            .send()
            .await
            .map_err(ApiError::network)?;
        Self::checked(res, &ctx).await.map(|_| ())
    }

    fn body(value: &impl Serialize) -> ApiResult<Option<serde_json::Value>> {
        serde_json::to_value(value).map(Some).map_err(ApiError::parse)
    }
}

impl NotesBackend for ApiClient {
    async fn list_notebooks(&self) -> ApiResult<Vec<Notebook>> {
        self.request_api(Method::GET, "/notebooks", None).await
    }

    async fn create_notebook(&self, name: &str, parent_id: Option<&str>) -> ApiResult<Notebook> {
        let body = Self::body(&CreateNotebookRequest {
            name: name.to_string(),
            parent_id: parent_id.map(str::to_string),
        })?;
        self.request_api(Method::POST, "/notebooks", body).await
    }

    async fn rename_notebook(&self, id: &str, name: &str) -> ApiResult<Notebook> {
        let path = format!("/notebooks/{}", urlencoding::encode(id));
        self.request_api(Method::PATCH, &path, Some(serde_json::json!({ "name": name })))
            .await
    }

    async fn reparent_notebook(&self, id: &str, parent_id: Option<&str>) -> ApiResult<Notebook> {
        let path = format!("/notebooks/{}", urlencoding::encode(id));
        let body = Self::body(&ReparentNotebookRequest {
            parent_id: parent_id.map(str::to_string),
        })?;
        self.request_api(Method::PATCH, &path, body).await
    }

    async fn delete_notebook(&self, id: &str) -> ApiResult<()> {
        let path = format!("/notebooks/{}", urlencoding::encode(id));
        self.request_empty(Method::DELETE, &path).await
    }

    async fn list_notes(&self, notebook_id: Option<&str>) -> ApiResult<Vec<NoteSummary>> {
        let path = Self::notes_listing_path(notebook_id);
        self.request_api(Method::GET, &path, None).await
    }

    async fn get_note(&self, id: &str) -> ApiResult<Note> {
        let path = format!("/notes/{}", urlencoding::encode(id));
        self.request_api(Method::GET, &path, None).await
    }

    async fn create_note(&self, notebook_id: Option<&str>) -> ApiResult<Note> {
        let body = Self::body(&CreateNoteRequest {
            notebook_id: notebook_id.map(str::to_string),
            title: String::new(),
        })?;
        self.request_api(Method::POST, "/notes", body).await
    }

    async fn move_note(&self, id: &str, notebook_id: Option<&str>) -> ApiResult<Note> {
        let path = format!("/notes/{}/move", urlencoding::encode(id));
        let body = Self::body(&MoveNoteRequest {
            notebook_id: notebook_id.map(str::to_string),
        })?;
        self.request_api(Method::PATCH, &path, body).await
    }

    async fn delete_note(&self, id: &str) -> ApiResult<()> {
        let path = format!("/notes/{}", urlencoding::encode(id));
        self.request_empty(Method::DELETE, &path).await
    }

    async fn save_note(&self, id: &str, draft: &NoteDraft) -> ApiResult<Note> {
        let path = format!("/notes/{}", urlencoding::encode(id));
        self.request_api(Method::PATCH, &path, Self::body(draft)?).await
    }

    async fn set_pinned(&self, id: &str, pinned: bool) -> ApiResult<Note> {
        let path = format!("/notes/{}", urlencoding::encode(id));
        let body = Self::body(&SetPinnedRequest { is_pinned: pinned })?;
        self.request_api(Method::PATCH, &path, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_client_new() {
        let client = ApiClient::new("http://localhost:3000".to_string());
        assert_eq!(client.base_url, "http://localhost:3000");
        assert!(client.token.is_none());
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_api_client_get_auth_header_with_token() {
        let mut client = ApiClient::new("http://localhost:3000".to_string());
        assert!(client.get_auth_header().is_none());
        client.set_token("my-jwt-token".to_string());
        let header = client.get_auth_header().expect("Should have auth header");
        assert_eq!(header, "Bearer my-jwt-token");
        assert!(client.is_authenticated());
    }

    #[test]
    fn test_urls_are_rooted_under_api() {
        let client = ApiClient::new("http://localhost:3000/".to_string());
        assert_eq!(client.url("/notebooks"), "http://localhost:3000/api/notebooks");
    }

    #[test]
    fn test_root_notes_use_root_bucket() {
        assert_eq!(ApiClient::notes_listing_path(None), "/notes/notebook/root");
        assert_eq!(
            ApiClient::notes_listing_path(Some("a b")),
            "/notes/notebook/a%20b"
        );
    }

    #[test]
    fn test_reparent_request_always_sends_parent_id() {
        let to_root = serde_json::to_value(ReparentNotebookRequest { parent_id: None })
            .expect("should serialize");
        assert_eq!(to_root, serde_json::json!({ "parentId": null }));

        let nested = serde_json::to_value(ReparentNotebookRequest {
            parent_id: Some("nb-1".to_string()),
        })
        .expect("should serialize");
        assert_eq!(nested["parentId"], "nb-1");
    }

    #[test]
    fn test_move_note_request_contract() {
        let v = serde_json::to_value(MoveNoteRequest { notebook_id: None })
            .expect("should serialize");
        assert_eq!(v, serde_json::json!({ "notebookId": null }));
    }

    #[test]
    fn test_create_notebook_request_omits_missing_parent() {
        let v = serde_json::to_value(CreateNotebookRequest {
            name: "Work".to_string(),
            parent_id: None,
        })
        .expect("should serialize");
        assert_eq!(v, serde_json::json!({ "name": "Work" }));
    }

    #[test]
    fn test_pin_request_contract() {
        let v = serde_json::to_value(SetPinnedRequest { is_pinned: true })
            .expect("should serialize");
        assert_eq!(v, serde_json::json!({ "isPinned": true }));
    }

    #[test]
    fn test_error_display_is_message() {
        let e = ApiError::http(reqwest::StatusCode::NOT_FOUND, "gone".to_string(), "GET /x failed");
        assert_eq!(e.kind, ApiErrorKind::Http);
        assert_eq!(e.to_string(), "GET /x failed (404 Not Found): gone");
    }
}
