//! Server-side sessions keyed by a random cookie.
//!
//! The cookie carries only a v4 UUID. Everything else (the signed-in
//! profile, the pending OAuth state and the one-shot flash message) lives in
//! a [`SessionStore`] and is loaded into a [`RequestContext`] per request.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use axum::http::{HeaderMap, header::COOKIE};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

pub const COOKIE_NAME: &str = "learning-on-session";
pub const SESSION_TTL_DAYS: i64 = 30;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("session data is corrupt: {0}")]
    Json(#[from] serde_json::Error),

    #[error("session lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub display_name: String,
    pub email: String,
}

/// The write that reverses the last assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UndoAction {
    Teacher { index: usize, value: String },
    Student { index: usize, city: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub message: String,
    pub undo: Option<UndoAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionData {
    pub user: Option<UserProfile>,
    pub oauth_state: Option<String>,
    pub flash: Option<Flash>,
    /// The only undo this session may still submit. Outlives the flash that
    /// displayed it and is replaced by the next action.
    pub pending_undo: Option<UndoAction>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: Uuid) -> Result<Option<SessionData>, SessionError>;
    async fn save(&self, id: Uuid, data: &SessionData) -> Result<(), SessionError>;
    async fn destroy(&self, id: Uuid) -> Result<(), SessionError>;
}

pub fn expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(SESSION_TTL_DAYS)
}

/// Sessions kept in process memory. Lost on restart.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<Uuid, (SessionData, DateTime<Utc>)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: Uuid) -> Result<Option<SessionData>, SessionError> {
        let sessions = self.sessions.read().map_err(|_| SessionError::Poisoned)?;
        Ok(sessions
            .get(&id)
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(data, _)| data.clone()))
    }

    async fn save(&self, id: Uuid, data: &SessionData) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::Poisoned)?;
        let now = Utc::now();
        sessions.retain(|_, (_, expires_at)| *expires_at > now);
        sessions.insert(id, (data.clone(), expiry_from(now)));
        Ok(())
    }

    async fn destroy(&self, id: Uuid) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::Poisoned)?;
        sessions.remove(&id);
        Ok(())
    }
}

/// Finds the session id in the request's `Cookie` headers.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

pub fn set_cookie(id: Uuid, secure: bool) -> String {
    let mut cookie = format!(
        "{COOKIE_NAME}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        Duration::days(SESSION_TTL_DAYS).num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_cookie(secure: bool) -> String {
    let mut cookie = format!("{COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Session state of one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub id: Uuid,
    pub data: SessionData,
    /// No stored session existed, a cookie must be issued on save.
    pub is_new: bool,
}

impl RequestContext {
    pub async fn load(store: &dyn SessionStore, headers: &HeaderMap) -> Result<Self, SessionError> {
        if let Some(id) = session_id(headers) {
            if let Some(data) = store.load(id).await? {
                return Ok(Self {
                    id,
                    data,
                    is_new: false,
                });
            }
            debug!("Session {id} expired or unknown, starting a new one");
        }

        Ok(Self {
            id: Uuid::new_v4(),
            data: SessionData::default(),
            is_new: true,
        })
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.data.user.as_ref()
    }

    /// Persists the session and returns the `Set-Cookie` value if the
    /// browser does not have it yet.
    pub async fn save(&self, store: &dyn SessionStore, secure: bool) -> Result<Option<String>, SessionError> {
        store.save(self.id, &self.data).await?;
        Ok(self.is_new.then(|| set_cookie(self.id, secure)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn session_id_is_found_among_other_cookies() {
        let id = Uuid::new_v4();
        let found = session_id(&headers(&format!("theme=dark; {COOKIE_NAME}={id}; lang=he")));
        assert_eq!(found, Some(id));
    }

    #[test]
    fn malformed_session_cookie_is_ignored() {
        assert_eq!(session_id(&headers(&format!("{COOKIE_NAME}=not-a-uuid"))), None);
        assert_eq!(session_id(&HeaderMap::new()), None);
    }

    #[test]
    fn cookies_are_http_only_and_lax() {
        let id = Uuid::new_v4();
        let cookie = set_cookie(id, true);
        assert!(cookie.starts_with(&format!("{COOKIE_NAME}={id};")));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.ends_with("; Secure"));
        assert!(!set_cookie(id, false).contains("Secure"));
        assert!(clear_cookie(false).contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn new_context_issues_cookie_once() {
        let store = MemorySessionStore::new();
        let mut context = RequestContext::load(&store, &HeaderMap::new()).await.unwrap();
        assert!(context.is_new);

        context.data.user = Some(UserProfile {
            display_name: "רונית אלון".to_string(),
            email: "ronit@example.com".to_string(),
        });
        let cookie = context.save(&store, false).await.unwrap().unwrap();

        let value = cookie.split(';').next().unwrap();
        let reloaded = RequestContext::load(&store, &headers(value)).await.unwrap();
        assert!(!reloaded.is_new);
        assert_eq!(reloaded.id, context.id);
        assert_eq!(reloaded.user().map(|u| u.email.as_str()), Some("ronit@example.com"));
        assert_eq!(reloaded.save(&store, false).await.unwrap(), None);
    }

    #[tokio::test]
    async fn destroyed_sessions_start_over() {
        let store = MemorySessionStore::new();
        let id = Uuid::new_v4();
        store.save(id, &SessionData::default()).await.unwrap();
        store.destroy(id).await.unwrap();

        let context = RequestContext::load(&store, &headers(&format!("{COOKIE_NAME}={id}")))
            .await
            .unwrap();
        assert!(context.is_new);
        assert_ne!(context.id, id);
    }

    #[test]
    fn sessions_saved_without_pending_undo_still_load() {
        let data: SessionData =
            serde_json::from_str(r#"{"user":null,"oauth_state":"abc","flash":null}"#).unwrap();
        assert_eq!(data.oauth_state.as_deref(), Some("abc"));
        assert_eq!(data.pending_undo, None);
    }

    #[test]
    fn undo_actions_serialize_with_kind_tag() {
        let undo = UndoAction::Student {
            index: 3,
            city: "כפר עזה".to_string(),
            value: String::new(),
        };
        let json = serde_json::to_value(&undo).unwrap();
        assert_eq!(json["kind"], "student");
        assert_eq!(serde_json::from_value::<UndoAction>(json).unwrap(), undo);
    }
}
