//! Task source adapter.
//!
//! Queries the external task tracker for completed tasks and normalizes
//! its user-defined, inconsistent schema into a uniform shape. Completion
//! detection is an ordered list of named strategies rather than ad-hoc
//! field scanning; the first matching strategy wins.

use async_trait::async_trait;
use notion::{DatabaseQuery, Notion, Page};
use thiserror::Error;
use tracing::warn;

/// Results per query page.
const PAGE_SIZE: u32 = 100;

/// Safety cap on pagination so a misbehaving source cannot loop forever.
const MAX_PAGES: usize = 50;

/// Errors from the task source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("task source unavailable: {0}")]
    Unavailable(String),
}

/// A completed task observed at the external source. Ephemeral: input to
/// reconciliation only, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTask {
    /// Stable external identifier.
    pub id: String,

    /// When the task was last touched at the source.
    pub completed_at: String,
}

/// Anything that can report the current set of completed tasks.
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn list_completed(&self) -> Result<Vec<CompletedTask>, SourceError>;
}

/// Rules deciding whether a raw task record counts as completed.
///
/// The upstream schema is user-defined, so three strategies are tried in
/// order: a checkbox from the configured allow-list, the configured
/// status property matching the done value, and finally any checkbox on
/// the record at all.
#[derive(Debug, Clone)]
pub struct CompletionRules {
    /// Checkbox-like property names treated as completion markers.
    pub checkbox_allowlist: Vec<String>,

    /// Status-like property name to compare against `done_value`.
    pub status_property: String,

    /// Value of `status_property` that marks a task done (case-insensitive).
    pub done_value: String,
}

impl Default for CompletionRules {
    fn default() -> Self {
        Self {
            checkbox_allowlist: vec![
                "Done".to_string(),
                "Completed".to_string(),
                "Complete".to_string(),
            ],
            status_property: "Status".to_string(),
            done_value: "Done".to_string(),
        }
    }
}

impl CompletionRules {
    /// Apply the strategies in order; first match wins.
    pub fn is_completed(&self, page: &Page) -> bool {
        self.allowlisted_checkbox_true(page)
            || self.status_matches_done(page)
            || self.any_checkbox_true(page)
    }

    /// Strategy 1: a checkbox property from the allow-list is true.
    pub fn allowlisted_checkbox_true(&self, page: &Page) -> bool {
        self.checkbox_allowlist.iter().any(|name| {
            page.property(name)
                .and_then(|p| p.as_checkbox())
                .unwrap_or(false)
        })
    }

    /// Strategy 2: the status property equals the done value,
    /// case-insensitive. Covers both status and select property kinds.
    pub fn status_matches_done(&self, page: &Page) -> bool {
        page.property(&self.status_property)
            .and_then(|p| p.as_status_name())
            .map(|name| name.eq_ignore_ascii_case(&self.done_value))
            .unwrap_or(false)
    }

    /// Strategy 3: any checkbox property anywhere on the record is true.
    pub fn any_checkbox_true(&self, page: &Page) -> bool {
        page.properties
            .values()
            .any(|p| p.as_checkbox().unwrap_or(false))
    }
}

/// Task source backed by a Notion database.
pub struct NotionTaskSource {
    client: Notion,
    database_id: String,
    rules: CompletionRules,
}

impl NotionTaskSource {
    pub fn new(client: Notion, database_id: impl Into<String>, rules: CompletionRules) -> Self {
        Self {
            client,
            database_id: database_id.into(),
            rules,
        }
    }
}

#[async_trait]
impl TaskSource for NotionTaskSource {
    async fn list_completed(&self) -> Result<Vec<CompletedTask>, SourceError> {
        if self.database_id.is_empty() {
            return Err(SourceError::Unavailable(
                "NOTION_DATABASE_ID is not set".to_string(),
            ));
        }

        let mut completed = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut query = DatabaseQuery::new().with_page_size(PAGE_SIZE);
            if let Some(c) = &cursor {
                query = query.with_start_cursor(c.clone());
            }

            let response = self
                .client
                .query_database(&self.database_id, query)
                .await
                .map_err(|e| SourceError::Unavailable(e.to_string()))?;

            for page in &response.results {
                if self.rules.is_completed(page) {
                    completed.push(CompletedTask {
                        id: page.id.clone(),
                        completed_at: page.last_edited_time.clone(),
                    });
                }
            }

            if !response.has_more {
                return Ok(completed);
            }
            cursor = response.next_cursor;
            if cursor.is_none() {
                return Ok(completed);
            }
        }

        warn!(
            pages = MAX_PAGES,
            "task source still reports more results at the page cap; truncating snapshot"
        );
        Ok(completed)
    }
}
