//! Signed-in shopper session, passed explicitly into the components that need it

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::RwLock;
use crate::domain::value_objects::UserId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    user_id: UserId,
    display_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    auth_token: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self { user_id: user_id.into(), display_name: None, email: None, phone: None, auth_token: None }
    }

    pub fn with_contact(mut self, display_name: Option<String>, email: Option<String>, phone: Option<String>) -> Self {
        self.display_name = display_name;
        self.email = email;
        self.phone = phone;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self { self.auth_token = Some(token.into()); self }

    pub fn user_id(&self) -> &UserId { &self.user_id }
    pub fn display_name(&self) -> Option<&str> { self.display_name.as_deref() }
    pub fn email(&self) -> Option<&str> { self.email.as_deref() }
    pub fn phone(&self) -> Option<&str> { self.phone.as_deref() }
    pub fn auth_token(&self) -> Option<&str> { self.auth_token.as_deref() }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Stored session is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Where a session survives restarts.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<Session>, SessionError>;
    async fn save(&self, session: &Session) -> Result<(), SessionError>;
    async fn clear(&self) -> Result<(), SessionError>;
}

#[derive(Default)]
pub struct InMemorySessionStore {
    slot: RwLock<Option<Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self) -> Result<Option<Session>, SessionError> { Ok(self.slot.read().await.clone()) }

    async fn save(&self, session: &Session) -> Result<(), SessionError> {
        *self.slot.write().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        self.slot.write().await.take();
        Ok(())
    }
}

/// Keeps the session as a JSON document on disk.
pub struct JsonFileSessionStore {
    path: PathBuf,
}

impl JsonFileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
}

#[async_trait]
impl SessionStore for JsonFileSessionStore {
    async fn load(&self) -> Result<Option<Session>, SessionError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, session: &Session) -> Result<(), SessionError> {
        let bytes = serde_json::to_vec_pretty(session)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
