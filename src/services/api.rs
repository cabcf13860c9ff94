//! Collaborator interfaces the onboarding core calls out to.
//!
//! Transport is not modelled here; implementations wrap whatever client the
//! host application uses. Every call is async and reports failures as
//! [`ApiError`], which the wizard treats as recoverable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

use crate::persistence::{OnboardingType, ServerOnboarding};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Server-side profile record as returned by `profile.get`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    pub onboarding_completed: bool,
    #[serde(default)]
    pub onboarding_type: Option<OnboardingType>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ProfileRecord {
    pub fn status(&self) -> ServerOnboarding {
        if self.onboarding_completed {
            ServerOnboarding::Completed {
                onboarding_type: self.onboarding_type,
            }
        } else {
            ServerOnboarding::NotCompleted
        }
    }
}

/// Maps a profile lookup onto the tri-state server status.
pub fn server_status(record: Option<&ProfileRecord>) -> ServerOnboarding {
    record.map_or(ServerOnboarding::Missing, ProfileRecord::status)
}

#[async_trait]
pub trait ProfileApi: Send + Sync {
    /// `Ok(None)` when the user has no profile record yet.
    async fn get(&self) -> Result<Option<ProfileRecord>, ApiError>;
    async fn update(&self, payload: &Value) -> Result<(), ApiError>;
    async fn submit(&self, payload: &Value) -> Result<(), ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Txt,
}

impl DocumentKind {
    pub fn from_file_name(name: &str) -> Option<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())?
            .to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_file_name(&self.file_name)
    }
}

#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Extracts an enrichment payload from an uploaded business document.
    async fn parse(&self, document: &DocumentUpload) -> Result<Value, ApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub place_id: String,
    pub main_text: String,
    #[serde(default)]
    pub secondary_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRequest {
    pub query: String,
    pub kind: OnboardingType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub error: Option<String>,
}

#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn autocomplete(&self, query: &str) -> Result<Vec<Prediction>, ApiError>;
    async fn lookup(&self, request: &LookupRequest) -> Result<LookupResponse, ApiError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPalette {
    #[serde(default)]
    pub colors: Vec<String>,
}

#[async_trait]
pub trait MediaApi: Send + Sync {
    async fn extract_colors(&self, image_url: &str) -> Result<ColorPalette, ApiError>;
}
