use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use super::{clamp_limit, require_non_blank};
use crate::dispatch::{ActionError, ActionOutput, ExecutionContext, TypedAction};
use crate::misskey::UserNotes;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetUserNotesParams {
    /// The ID of the user to get notes for
    pub user_id: String,
    /// Maximum number of notes (1-100, default 10)
    #[serde(default)]
    pub limit: Option<u32>,
    /// Include the user's replies
    #[serde(default)]
    pub with_replies: bool,
}

pub struct GetUserNotesAction;

#[async_trait]
impl TypedAction for GetUserNotesAction {
    const NAME: &'static str = "get_misskey_user_notes";
    const DESCRIPTION: &'static str = "Get the latest notes of a Misskey user";
    type Params = GetUserNotesParams;

    async fn run(
        &self,
        ctx: &ExecutionContext,
        params: GetUserNotesParams,
    ) -> Result<ActionOutput, ActionError> {
        let user_id = require_non_blank(Self::NAME, "userId", params.user_id)?;
        let client = ctx.client(Self::NAME)?;
        let request = UserNotes {
            user_id: user_id.trim().to_string(),
            limit: clamp_limit(params.limit),
            with_replies: params.with_replies,
        };

        info!(user_id = %request.user_id, limit = request.limit, "fetching user notes");
        let notes = client
            .user_notes(request)
            .await
            .map_err(|source| ActionError::downstream(Self::NAME, source))?;
        ActionOutput::records(Self::NAME, &notes)
    }
}
