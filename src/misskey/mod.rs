//! Misskey REST API surface used by the actions.
//!
//! `MisskeyApi` is the capability the dispatch core depends on; `MisskeyClient`
//! implements it over HTTP. Only the handful of endpoints the actions need are
//! modelled, and only the note fields worth showing to a tool caller.

mod client;

pub use client::MisskeyClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Downstream operations, one HTTP request each. No retries.
#[async_trait]
pub trait MisskeyApi: Send + Sync {
    /// `notes/create`
    async fn create_note(&self, request: CreateNote) -> Result<Note, MisskeyError>;

    /// `notes/search`
    async fn search_notes(&self, request: SearchNotes) -> Result<Vec<Note>, MisskeyError>;

    /// `users/notes`
    async fn user_notes(&self, request: UserNotes) -> Result<Vec<Note>, MisskeyError>;
}

#[derive(Debug, Error)]
pub enum MisskeyError {
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status} [{code}]: {message}")]
    Api {
        endpoint: &'static str,
        status: u16,
        code: String,
        message: String,
    },

    #[error("invalid JSON for {endpoint}: {source}")]
    Json {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Home,
    Followers,
    Specified,
}

/// The author block embedded in every note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserLite {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    /// `None` for local users.
    pub host: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub created_at: String,
    pub user_id: String,
    pub user: Option<UserLite>,
    pub text: Option<String>,
    pub cw: Option<String>,
    pub visibility: Visibility,
    pub reply_id: Option<String>,
    pub renote_id: Option<String>,
    pub replies_count: u64,
    pub renote_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNote {
    pub text: String,
    pub visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cw: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub local_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchNotes {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNotes {
    pub user_id: String,
    pub limit: u32,
    pub with_replies: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatedNote {
    pub created_note: Note,
}
