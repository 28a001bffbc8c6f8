//! Minimal Notion API client.
//!
//! This crate provides a focused client for Notion's database query API:
//! - Cursor-based pagination over database pages
//! - Typed property values (checkbox, select, status) with a catch-all
//!   for every other property kind

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

const API_BASE: &str = "https://api.notion.com/v1";
const API_VERSION: &str = "2022-06-28";

/// Errors that can occur when using the Notion client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Notion API client.
#[derive(Clone)]
pub struct Notion {
    client: reqwest::Client,
    api_key: String,
}

impl Notion {
    /// Create a new Notion client with the given integration token.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client"),
            api_key: api_key.into(),
        }
    }

    /// Create a Notion client from the NOTION_API_KEY environment variable.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("NOTION_API_KEY").map_err(|_| Error::NoApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Query one page of results from a database.
    ///
    /// Pass the `next_cursor` of the previous response to fetch the
    /// following page.
    pub async fn query_database(
        &self,
        database_id: &str,
        query: DatabaseQuery,
    ) -> Result<QueryResponse, Error> {
        let headers = self.build_headers()?;

        let response = self
            .client
            .post(format!("{API_BASE}/databases/{database_id}/query"))
            .headers(headers)
            .json(&query)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        headers.insert("Notion-Version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }
}

// ============================================================================
// Request types
// ============================================================================

/// A database query request body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatabaseQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl DatabaseQuery {
    /// Create an empty query (first page, server default page size).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.start_cursor = Some(cursor.into());
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

// ============================================================================
// Response types
// ============================================================================

/// One page of database query results.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    pub results: Vec<Page>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

/// A page (row) in a Notion database.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    pub last_edited_time: String,
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

impl Page {
    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

/// A property value on a page.
///
/// Only the kinds the sync logic inspects are modeled; everything else
/// (dates, people, formulas, ...) lands in `Other`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Checkbox { checkbox: bool },
    Select { select: Option<SelectOption> },
    Status { status: Option<SelectOption> },
    #[serde(other)]
    Other,
}

impl PropertyValue {
    /// Extract the value of a checkbox property.
    pub fn as_checkbox(&self) -> Option<bool> {
        if let PropertyValue::Checkbox { checkbox } = self {
            Some(*checkbox)
        } else {
            None
        }
    }

    /// Extract the selected option name of a status or select property.
    pub fn as_status_name(&self) -> Option<&str> {
        match self {
            PropertyValue::Select { select } => select.as_ref().map(|o| o.name.as_str()),
            PropertyValue::Status { status } => status.as_ref().map(|o| o.name.as_str()),
            _ => None,
        }
    }
}

/// A named option of a select or status property.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = Notion::new("secret-token");
        assert_eq!(client.api_key, "secret-token");
    }

    #[test]
    fn test_query_serialization() {
        let query = DatabaseQuery::new()
            .with_start_cursor("abc")
            .with_page_size(100);
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["start_cursor"], "abc");
        assert_eq!(json["page_size"], 100);

        // Empty query serializes to an empty object
        let empty = serde_json::to_value(DatabaseQuery::new()).unwrap();
        assert_eq!(empty, serde_json::json!({}));
    }

    #[test]
    fn test_response_deserialization() {
        let raw = r#"{
            "object": "list",
            "results": [{
                "object": "page",
                "id": "page-1",
                "last_edited_time": "2024-05-01T12:00:00.000Z",
                "properties": {
                    "Done": { "id": "a", "type": "checkbox", "checkbox": true },
                    "Status": { "id": "b", "type": "status", "status": { "name": "In Progress", "color": "blue" } },
                    "Priority": { "id": "c", "type": "select", "select": null },
                    "Due": { "id": "d", "type": "date", "date": null }
                }
            }],
            "has_more": true,
            "next_cursor": "cursor-2"
        }"#;

        let response: QueryResponse = serde_json::from_str(raw).unwrap();
        assert!(response.has_more);
        assert_eq!(response.next_cursor.as_deref(), Some("cursor-2"));
        assert_eq!(response.results.len(), 1);

        let page = &response.results[0];
        assert_eq!(page.id, "page-1");
        assert_eq!(page.property("Done").unwrap().as_checkbox(), Some(true));
        assert_eq!(
            page.property("Status").unwrap().as_status_name(),
            Some("In Progress")
        );
        assert_eq!(page.property("Priority").unwrap().as_status_name(), None);
        assert!(matches!(
            page.property("Due").unwrap(),
            PropertyValue::Other
        ));
    }

    #[test]
    fn test_select_as_status_name() {
        let value: PropertyValue = serde_json::from_str(
            r#"{ "type": "select", "select": { "name": "Done", "color": "green" } }"#,
        )
        .unwrap();
        assert_eq!(value.as_status_name(), Some("Done"));
        assert_eq!(value.as_checkbox(), None);
    }
}
