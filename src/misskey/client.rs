//! HTTP implementation of [`MisskeyApi`].
//!
//! Misskey endpoints are all `POST <instance>/api/<endpoint>` with a JSON body;
//! the access token travels in the body as `i`. Failures come back as
//! `{"error": {"code": ..., "message": ...}}` with a non-2xx status.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{CreateNote, CreatedNote, MisskeyApi, MisskeyError, Note, SearchNotes, UserNotes};
use crate::config::ClientConfig;

pub struct MisskeyClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl MisskeyClient {
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        // base_url is normalized to end with '/'
        format!("{}api/{}", self.base_url, endpoint)
    }

    fn request_body<T: Serialize>(
        &self,
        endpoint: &'static str,
        request: &T,
    ) -> Result<Value, MisskeyError> {
        let mut body = serde_json::to_value(request)
            .map_err(|source| MisskeyError::Json { endpoint, source })?;
        if let (Some(token), Value::Object(map)) = (&self.token, &mut body) {
            map.insert(
                "i".to_string(),
                Value::String(token.expose_secret().to_string()),
            );
        }
        Ok(body)
    }

    async fn post<T: Serialize, R: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: &T,
    ) -> Result<R, MisskeyError> {
        let body = self.request_body(endpoint, request)?;
        debug!(endpoint, "calling Misskey API");

        let response = self
            .http
            .post(self.endpoint_url(endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|source| MisskeyError::Request { endpoint, source })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| MisskeyError::Request { endpoint, source })?;

        decode_response(endpoint, status.as_u16(), &bytes)
    }
}

/// Decode a response body: the payload for 2xx, an `Api` error otherwise.
pub(crate) fn decode_response<R: DeserializeOwned>(
    endpoint: &'static str,
    status: u16,
    body: &[u8],
) -> Result<R, MisskeyError> {
    if !(200..300).contains(&status) {
        return Err(api_error(endpoint, status, body));
    }
    serde_json::from_slice(body).map_err(|source| MisskeyError::Json { endpoint, source })
}

#[async_trait]
impl MisskeyApi for MisskeyClient {
    async fn create_note(&self, request: CreateNote) -> Result<Note, MisskeyError> {
        let created: CreatedNote = self.post("notes/create", &request).await?;
        Ok(created.created_note)
    }

    async fn search_notes(&self, request: SearchNotes) -> Result<Vec<Note>, MisskeyError> {
        self.post("notes/search", &request).await
    }

    async fn user_notes(&self, request: UserNotes) -> Result<Vec<Note>, MisskeyError> {
        self.post("users/notes", &request).await
    }
}

/// Turn a non-2xx response into an `Api` error, falling back to the raw body
/// when the instance (or a proxy in front of it) did not answer with Misskey's
/// error envelope.
pub(crate) fn api_error(endpoint: &'static str, status: u16, body: &[u8]) -> MisskeyError {
    #[derive(serde::Deserialize)]
    struct Envelope {
        error: ErrorBody,
    }
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        code: String,
        message: String,
    }

    match serde_json::from_slice::<Envelope>(body) {
        Ok(envelope) => MisskeyError::Api {
            endpoint,
            status,
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => MisskeyError::Api {
            endpoint,
            status,
            code: "UNKNOWN".to_string(),
            message: String::from_utf8_lossy(body).trim().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::misskey::Visibility;
    use std::time::Duration;

    fn client(token: Option<&str>) -> MisskeyClient {
        let config = ClientConfig {
            base_url: Url::parse("https://misskey.example/").unwrap(),
            token: token.map(|t| SecretString::from(t.to_string())),
            timeout: Duration::from_secs(5),
        };
        MisskeyClient::new(&config).unwrap()
    }

    #[test]
    fn endpoint_url_joins_api_prefix() {
        let c = client(None);
        assert_eq!(
            c.endpoint_url("notes/create"),
            "https://misskey.example/api/notes/create"
        );
    }

    #[test]
    fn request_body_injects_token() {
        let c = client(Some("secret-token"));
        let body = c
            .request_body(
                "users/notes",
                &UserNotes {
                    user_id: "u1".into(),
                    limit: 10,
                    with_replies: false,
                },
            )
            .unwrap();
        assert_eq!(body["i"], "secret-token");
        assert_eq!(body["userId"], "u1");
    }

    #[test]
    fn request_body_without_token_has_no_credential() {
        let c = client(None);
        let body = c
            .request_body(
                "notes/search",
                &SearchNotes {
                    query: "q".into(),
                    user_id: None,
                    limit: 1,
                },
            )
            .unwrap();
        assert!(body.get("i").is_none());
    }

    #[test]
    fn created_note_is_unwrapped() {
        let body = br#"{
            "createdNote": {
                "id": "9xyz01",
                "createdAt": "2024-05-01T10:00:00.000Z",
                "userId": "u1",
                "user": {"id": "u1", "username": "alice", "host": null},
                "text": "hello",
                "cw": null,
                "visibility": "home",
                "localOnly": false,
                "renoteCount": 0,
                "repliesCount": 0,
                "reactions": {},
                "fileIds": []
            }
        }"#;
        let created: CreatedNote = decode_response("notes/create", 200, body).unwrap();
        assert_eq!(created.created_note.id, "9xyz01");
        assert_eq!(created.created_note.text.as_deref(), Some("hello"));
        assert_eq!(created.created_note.visibility, Visibility::Home);
    }

    #[test]
    fn success_body_decodes_note_list() {
        let body = br#"[{"id": "a1", "userId": "u1", "text": "one"}, {"id": "a2", "userId": "u1", "text": null}]"#;
        let notes: Vec<Note> = decode_response("users/notes", 200, body).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1].id, "a2");
        assert_eq!(notes[1].text, None);
    }

    #[test]
    fn success_status_with_wrong_shape_is_a_json_error() {
        let err = decode_response::<CreatedNote>("notes/create", 200, br#"{"ok": true}"#)
            .unwrap_err();
        assert!(matches!(err, MisskeyError::Json { endpoint: "notes/create", .. }));
    }

    #[test]
    fn error_status_never_decodes_payload() {
        let body = br#"{"error":{"code":"NO_SUCH_USER","message":"No such user."}}"#;
        let err = decode_response::<Vec<Note>>("users/notes", 400, body).unwrap_err();
        assert!(matches!(
            err,
            MisskeyError::Api { status: 400, ref code, .. } if code == "NO_SUCH_USER"
        ));
    }

    #[test]
    fn api_error_decodes_envelope() {
        let body = br#"{"error":{"code":"RATE_LIMIT_EXCEEDED","message":"Rate limit exceeded. Please try again later.","id":"d5826d14"}}"#;
        match api_error("notes/create", 429, body) {
            MisskeyError::Api {
                status,
                code,
                message,
                ..
            } => {
                assert_eq!(status, 429);
                assert_eq!(code, "RATE_LIMIT_EXCEEDED");
                assert!(message.starts_with("Rate limit exceeded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn api_error_falls_back_to_raw_body() {
        let err = api_error("notes/create", 502, b"  Bad Gateway \n");
        assert!(err.to_string().contains("Bad Gateway"));
        assert!(err.to_string().contains("UNKNOWN"));
    }
}
