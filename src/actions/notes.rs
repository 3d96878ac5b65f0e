use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{clamp_limit, require_non_blank};
use crate::dispatch::{ActionError, ActionOutput, ExecutionContext, TypedAction};
use crate::misskey::{CreateNote, SearchNotes, Visibility};

/// Audience of a new note. `specified` (direct) notes are not offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NoteVisibility {
    #[default]
    Public,
    Home,
    Followers,
}

impl From<NoteVisibility> for Visibility {
    fn from(v: NoteVisibility) -> Self {
        match v {
            NoteVisibility::Public => Visibility::Public,
            NoteVisibility::Home => Visibility::Home,
            NoteVisibility::Followers => Visibility::Followers,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostNoteParams {
    /// The text of the note to post
    pub text: String,
    /// Who can see the note (default: public)
    #[serde(default)]
    pub visibility: NoteVisibility,
    /// Content warning shown in place of the text until expanded
    #[serde(default)]
    pub cw: Option<String>,
    /// Keep the note off federation
    #[serde(default)]
    pub local_only: bool,
}

pub struct PostNoteAction;

#[async_trait]
impl TypedAction for PostNoteAction {
    const NAME: &'static str = "post_misskey_note";
    const DESCRIPTION: &'static str = "Post a note to Misskey";
    type Params = PostNoteParams;

    async fn run(
        &self,
        ctx: &ExecutionContext,
        params: PostNoteParams,
    ) -> Result<ActionOutput, ActionError> {
        let text = require_non_blank(Self::NAME, "text", params.text)?;
        let client = ctx.client(Self::NAME)?;

        info!(
            text_length = text.chars().count(),
            visibility = ?params.visibility,
            "posting note"
        );
        let note = client
            .create_note(CreateNote {
                text: text.clone(),
                visibility: params.visibility.into(),
                cw: params.cw.filter(|cw| !cw.trim().is_empty()),
                local_only: params.local_only,
            })
            .await
            .map_err(|source| ActionError::downstream(Self::NAME, source))?;

        info!(note_id = %note.id, "note posted");
        Ok(ActionOutput::text(format!(
            "Note posted successfully. ID: {}, Text: {}",
            note.id, text
        )))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchNotesParams {
    /// The search query for notes
    pub query: String,
    /// Only return notes by this user ID
    #[serde(default)]
    pub user_id: Option<String>,
    /// Maximum number of notes (1-100, default 10)
    #[serde(default)]
    pub limit: Option<u32>,
}

pub struct SearchNotesAction;

#[async_trait]
impl TypedAction for SearchNotesAction {
    const NAME: &'static str = "search_misskey_notes";
    const DESCRIPTION: &'static str =
        "Search notes on Misskey by keyword, optionally restricted to one user";
    type Params = SearchNotesParams;

    async fn run(
        &self,
        ctx: &ExecutionContext,
        params: SearchNotesParams,
    ) -> Result<ActionOutput, ActionError> {
        let query = require_non_blank(Self::NAME, "query", params.query)?;
        let client = ctx.client(Self::NAME)?;
        let request = SearchNotes {
            query,
            user_id: params
                .user_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
            limit: clamp_limit(params.limit),
        };

        info!(query = %request.query, limit = request.limit, "searching notes");
        let notes = client
            .search_notes(request)
            .await
            .map_err(|source| ActionError::downstream(Self::NAME, source))?;
        info!(found = notes.len(), "search finished");
        ActionOutput::records(Self::NAME, &notes)
    }
}
