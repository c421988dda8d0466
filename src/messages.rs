/// Messages exchanged between the popup, the background and page agents
use crate::error::PlatformError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TabId = i32;

/// One-shot request answered by the background
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum RuntimeRequest {
    GetHistory {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_time: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_time: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<Uuid>,
    },
}

impl RuntimeRequest {
    pub fn get_history(start_time: f64, end_time: f64) -> RuntimeRequest {
        RuntimeRequest::GetHistory {
            start_time: Some(start_time),
            end_time: Some(end_time),
            request_id: Some(Uuid::new_v4()),
        }
    }
}

/// Answer to `GET_HISTORY`: `{urls}` on success, `{error}` otherwise
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
}

impl HistoryResponse {
    pub fn found(urls: Vec<String>, request_id: Option<Uuid>) -> HistoryResponse {
        HistoryResponse {
            urls: Some(urls),
            error: None,
            request_id,
        }
    }

    pub fn failed(error: &PlatformError, request_id: Option<Uuid>) -> HistoryResponse {
        HistoryResponse {
            urls: None,
            error: Some(error.to_string()),
            request_id,
        }
    }
}

/// Commands pushed straight to a page agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageCommand {
    EnableHighlight {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    DisableHighlight {},
    UpdateHighlightColor {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    UpdateVisitedUrls {
        #[serde(default)]
        urls: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    /// Re-evaluate with the current mirrors
    UpdateHighlight {},
}

/// What the browser reports when a tab changes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TabUpdate {
    pub status: Option<String>,
    pub url: Option<String>,
}

impl TabUpdate {
    /// The page finished loading and has a URL
    pub fn is_load_complete(&self) -> bool {
        self.status.as_deref() == Some("complete") && self.url.is_some()
    }
}

/// Delivery of commands to page agents
#[allow(async_fn_in_trait)]
pub trait TabMessenger {
    /// The active tab of the current window, if any
    async fn active_tab(&self) -> Result<Option<TabId>, PlatformError>;

    async fn send_command(&self, tab: TabId, command: &PageCommand) -> Result<(), PlatformError>;
}

/// The popup's line to the background
#[allow(async_fn_in_trait)]
pub trait BackgroundLink {
    /// `Ok(None)` when the background sent no answer
    async fn request(&self, request: &RuntimeRequest) -> Result<Option<HistoryResponse>, PlatformError>;
}
