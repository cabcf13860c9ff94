use async_trait::async_trait;
use onboardbase::services::{
    ApiError, ColorPalette, DocumentApi, DocumentUpload, LookupRequest, LookupResponse, MediaApi,
    Prediction, ProfileApi, ProfileRecord, SearchApi,
};
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;

/// Profile endpoint double recording every write.
#[derive(Default)]
pub struct FakeProfile {
    pub record: Option<ProfileRecord>,
    pub reject_writes: Mutex<bool>,
    pub submitted: Mutex<Vec<Value>>,
    pub updated: Mutex<Vec<Value>>,
}

impl FakeProfile {
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn not_completed() -> Self {
        Self::with_record(json!({"onboarding_completed": false}))
    }

    pub fn with_record(raw: Value) -> Self {
        Self {
            record: Some(serde_json::from_value(raw).expect("valid profile record")),
            ..Self::default()
        }
    }

    pub fn reject_writes(&self, reject: bool) {
        *self.reject_writes.lock().unwrap() = reject;
    }

    fn write(&self, log: &Mutex<Vec<Value>>, payload: &Value) -> Result<(), ApiError> {
        if *self.reject_writes.lock().unwrap() {
            return Err(ApiError::Rejected("profile service unavailable".into()));
        }
        log.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

#[async_trait]
impl ProfileApi for FakeProfile {
    async fn get(&self) -> Result<Option<ProfileRecord>, ApiError> {
        Ok(self.record.clone())
    }

    async fn update(&self, payload: &Value) -> Result<(), ApiError> {
        self.write(&self.updated, payload)
    }

    async fn submit(&self, payload: &Value) -> Result<(), ApiError> {
        self.write(&self.submitted, payload)
    }
}

pub struct FakeDocuments {
    pub payload: Result<Value, ApiError>,
}

#[async_trait]
impl DocumentApi for FakeDocuments {
    async fn parse(&self, _document: &DocumentUpload) -> Result<Value, ApiError> {
        self.payload.clone()
    }
}

/// Smart search double; `latency` is simulated with tokio time.
pub struct FakeSearch {
    pub response: Result<LookupResponse, ApiError>,
    pub latency: Duration,
    pub autocompleted: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn found(data: Value, latency: Duration) -> Self {
        Self::responding(
            LookupResponse {
                success: true,
                data,
                error: None,
            },
            latency,
        )
    }

    pub fn responding(response: LookupResponse, latency: Duration) -> Self {
        Self {
            response: Ok(response),
            latency,
            autocompleted: Mutex::new(Vec::new()),
        }
    }

    pub fn autocomplete_calls(&self) -> Vec<String> {
        self.autocompleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchApi for FakeSearch {
    async fn autocomplete(&self, query: &str) -> Result<Vec<Prediction>, ApiError> {
        self.autocompleted.lock().unwrap().push(query.to_string());
        Ok(vec![Prediction {
            place_id: format!("place-{query}"),
            main_text: query.to_string(),
            secondary_text: "Springfield".into(),
        }])
    }

    async fn lookup(&self, _request: &LookupRequest) -> Result<LookupResponse, ApiError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.response.clone()
    }
}

pub struct FakeMedia {
    pub colors: Vec<String>,
}

#[async_trait]
impl MediaApi for FakeMedia {
    async fn extract_colors(&self, _image_url: &str) -> Result<ColorPalette, ApiError> {
        Ok(ColorPalette {
            colors: self.colors.clone(),
        })
    }
}
