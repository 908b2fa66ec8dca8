//! Plain HTTP endpoints of the presentation server.

use std::time::Duration;

use log::debug;
use serde::Deserialize;

use crate::error::ApiError;
use crate::parser::Slide;
use crate::protocol::FileId;

const TIMEOUT: Duration = Duration::from_secs(10);

/// Reply of `GET /api/check/<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckResponse {
    pub exists: bool,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default, rename = "slideCount")]
    pub slide_count: Option<usize>,
}

/// Reply of `GET /api/markdown/<id>`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarkdownResponse {
    pub content: String,
    #[serde(default)]
    pub slides: Vec<Slide>,
}

pub trait PresentationApi {
    fn check(&self, file_id: &FileId) -> Result<CheckResponse, ApiError>;
    fn markdown(&self, file_id: &FileId) -> Result<MarkdownResponse, ApiError>;
}

pub struct HttpApi {
    base: String,
    agent: ureq::Agent,
}

impl HttpApi {
    pub fn new(base: impl Into<String>) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(TIMEOUT))
            .build()
            .into();
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        file_id: &FileId,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!("GET {url}");
        let mut response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(404)) => {
                return Err(ApiError::NotFound(file_id.to_string()));
            }
            Err(e) => return Err(ApiError::Http(e.to_string())),
        };
        response
            .body_mut()
            .read_json::<T>()
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

impl PresentationApi for HttpApi {
    fn check(&self, file_id: &FileId) -> Result<CheckResponse, ApiError> {
        self.get_json(&format!("/api/check/{file_id}"), file_id)
    }

    fn markdown(&self, file_id: &FileId) -> Result<MarkdownResponse, ApiError> {
        self.get_json(&format!("/api/markdown/{file_id}"), file_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_response_shapes() {
        let missing: CheckResponse = serde_json::from_str(r#"{"exists": false}"#).unwrap();
        assert!(!missing.exists);
        assert_eq!(missing.slide_count, None);

        let found: CheckResponse =
            serde_json::from_str(r#"{"exists": true, "filename": "talk.md", "slideCount": 4}"#)
                .unwrap();
        assert_eq!(found.filename.as_deref(), Some("talk.md"));
        assert_eq!(found.slide_count, Some(4));
    }

    #[test]
    fn test_markdown_response() {
        let body = r##"{"content": "# A", "slides": [{"index": 0, "html": "<h1>A</h1>", "mermaid": null, "raw": "# A"}]}"##;
        let parsed: MarkdownResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.slides.len(), 1);
        assert_eq!(parsed.slides[0].diagram, None);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let api = HttpApi::new("http://localhost:8080/");
        assert_eq!(api.url("/api/check/x"), "http://localhost:8080/api/check/x");
    }

    #[test]
    fn test_unreachable_server_is_http_error() {
        // Port 9 (discard) is essentially never listening
        let api = HttpApi::new("http://127.0.0.1:9");
        let err = api.check(&FileId::new("x")).unwrap_err();
        assert!(matches!(err, ApiError::Http(_)), "got {err:?}");
    }
}
