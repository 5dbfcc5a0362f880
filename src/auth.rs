use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use hmac::{Hmac, Mac};
use redb::ReadableTable;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;

use crate::constants::{ERR_INVALID_EMAIL, ERR_WEAK_PASSWORD, SESSION_TTL_SECS};
use crate::db::{self, tables, Db};
use crate::error::{AppError, Result};
use crate::models::{Role, SessionContext, SessionRecord, UserRecord};

type HmacSha256 = Hmac<Sha256>;

/// Capacity of the auth event broadcast channel
const AUTH_EVENT_CAPACITY: usize = 16;

/// Sign-in / sign-out notification, the registry's passive subscription
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum AuthEvent {
    SignedIn { email: String, role: Role },
    SignedOut { email: String },
}

/// Identity provider: email/password accounts and bearer-token sessions
///
/// Passwords are stored as peppered SHA-256 hashes; sessions are keyed by
/// the hash of the token, never the token itself. The role claim is fixed
/// at sign-up from the configured owner list.
#[derive(Clone)]
pub struct SessionRegistry {
    db: Db,
    secret: String,
    pepper: String,
    owner_emails: Vec<String>,
    events: broadcast::Sender<AuthEvent>,
    nonce: Arc<AtomicU64>,
}

impl SessionRegistry {
    pub fn new(db: Db, secret: String, pepper: String, owner_emails: Vec<String>) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            db,
            secret,
            pepper,
            owner_emails,
            events,
            nonce: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Subscribe to sign-in and sign-out notifications
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Create an account and open a session for it
    ///
    /// The role claim is Owner iff the email is configured as an owner.
    /// Returns the session context and the bearer token.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(SessionContext, String)> {
        if !UserRecord::validate_email(email) {
            return Err(AppError::InvalidInput(ERR_INVALID_EMAIL.to_string()));
        }
        if !UserRecord::validate_password(password) {
            return Err(AppError::InvalidInput(ERR_WEAK_PASSWORD.to_string()));
        }

        let email = email.trim().to_lowercase();
        let role = if self.owner_emails.contains(&email) {
            Role::Owner
        } else {
            Role::Viewer
        };
        let password_hash = apply_pepper(password, &self.pepper);

        let token = self.mint_token(&email);
        let token_key = hash_token(&token);
        let db = self.db.clone();

        let context = tokio::task::spawn_blocking(move || -> Result<SessionContext> {
            let now = Utc::now().timestamp();

            let write_txn = db.begin_write()?;
            {
                let mut users = write_txn.open_table(tables::USERS)?;
                if users.get(email.as_str())?.is_some() {
                    return Err(AppError::AccountAlreadyExists);
                }

                let user = UserRecord {
                    email: email.clone(),
                    password_hash,
                    role,
                    created_at: now,
                };
                let bytes = db::encode(&user)?;
                users.insert(email.as_str(), bytes.as_slice())?;
                drop(users);

                let mut sessions = write_txn.open_table(tables::SESSIONS)?;
                let session = SessionRecord {
                    email: email.clone(),
                    role,
                    created_at: now,
                    expires_at: now + SESSION_TTL_SECS,
                };
                let session_bytes = db::encode(&session)?;
                sessions.insert(token_key.as_str(), session_bytes.as_slice())?;
            }
            write_txn.commit()?;

            tracing::info!("Account created: {}", email);
            Ok(SessionContext { email, role })
        })
        .await??;

        let _ = self.events.send(AuthEvent::SignedIn {
            email: context.email.clone(),
            role: context.role,
        });

        Ok((context, token))
    }

    /// Verify credentials and open a fresh session
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(SessionContext, String)> {
        let email = email.trim().to_lowercase();
        let password_hash = apply_pepper(password, &self.pepper);

        let token = self.mint_token(&email);
        let token_key = hash_token(&token);
        let db = self.db.clone();

        let context = tokio::task::spawn_blocking(move || -> Result<SessionContext> {
            let now = Utc::now().timestamp();

            let write_txn = db.begin_write()?;
            let context;
            {
                let users = write_txn.open_table(tables::USERS)?;
                let user: UserRecord = users
                    .get(email.as_str())?
                    .map(|bytes| db::decode(bytes.value()))
                    .transpose()?
                    .ok_or(AppError::InvalidCredentials)?;
                drop(users);

                if user.password_hash != password_hash {
                    return Err(AppError::InvalidCredentials);
                }

                let mut sessions = write_txn.open_table(tables::SESSIONS)?;
                let session = SessionRecord {
                    email: user.email.clone(),
                    role: user.role,
                    created_at: now,
                    expires_at: now + SESSION_TTL_SECS,
                };
                let session_bytes = db::encode(&session)?;
                sessions.insert(token_key.as_str(), session_bytes.as_slice())?;

                context = SessionContext {
                    email: user.email,
                    role: user.role,
                };
            }
            write_txn.commit()?;

            tracing::info!("Signed in: {}", context.email);
            Ok(context)
        })
        .await??;

        let _ = self.events.send(AuthEvent::SignedIn {
            email: context.email.clone(),
            role: context.role,
        });

        Ok((context, token))
    }

    /// Revoke a session token; revoking an unknown token is a no-op
    pub async fn sign_out(&self, token: &str) -> Result<()> {
        let token_key = hash_token(token);
        let db = self.db.clone();

        let removed = tokio::task::spawn_blocking(move || -> Result<Option<SessionRecord>> {
            let write_txn = db.begin_write()?;
            let removed;
            {
                let mut sessions = write_txn.open_table(tables::SESSIONS)?;
                removed = sessions
                    .remove(token_key.as_str())?
                    .map(|bytes| db::decode(bytes.value()))
                    .transpose()?;
            }
            write_txn.commit()?;
            Ok(removed)
        })
        .await??;

        if let Some(session) = removed {
            tracing::info!("Signed out: {}", session.email);
            let _ = self.events.send(AuthEvent::SignedOut {
                email: session.email,
            });
        }

        Ok(())
    }

    /// Resolve a bearer token to its session context
    ///
    /// Expired sessions are removed on the way out.
    pub async fn resolve(&self, token: &str) -> Result<SessionContext> {
        let token_key = hash_token(token);
        let db = self.db.clone();

        tokio::task::spawn_blocking(move || -> Result<SessionContext> {
            let now = Utc::now().timestamp();

            let read_txn = db.begin_read()?;
            let sessions = read_txn.open_table(tables::SESSIONS)?;
            let session: SessionRecord = sessions
                .get(token_key.as_str())?
                .map(|bytes| db::decode(bytes.value()))
                .transpose()?
                .ok_or(AppError::NotSignedIn)?;
            drop(sessions);
            drop(read_txn);

            if session.is_expired(now) {
                let write_txn = db.begin_write()?;
                {
                    let mut sessions = write_txn.open_table(tables::SESSIONS)?;
                    sessions.remove(token_key.as_str())?;
                }
                write_txn.commit()?;
                return Err(AppError::NotSignedIn);
            }

            Ok(SessionContext {
                email: session.email,
                role: session.role,
            })
        })
        .await?
    }

    /// Mint an opaque bearer token bound to nothing the client can forge
    fn mint_token(&self, email: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);

        let mut mac = match HmacSha256::new_from_slice(self.secret.as_bytes()) {
            Ok(m) => m,
            Err(_) => {
                // HMAC-SHA256 takes keys of any length; degrade to a plain
                // digest rather than failing the sign-in
                tracing::error!("Failed to create HMAC instance");
                let mut hasher = Sha256::new();
                hasher.update(self.secret.as_bytes());
                hasher.update(email.as_bytes());
                hasher.update(&nanos.to_le_bytes());
                hasher.update(&nonce.to_le_bytes());
                return hex::encode(hasher.finalize());
            }
        };
        mac.update(email.as_bytes());
        mac.update(&nanos.to_le_bytes());
        mac.update(&nonce.to_le_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

/// Peppered SHA-256: `hash = SHA256(input + pepper)`, hex encoded
///
/// The pepper lives in the environment, not the database, so a database
/// leak alone does not expose offline-crackable hashes.
pub fn apply_pepper(input: &str, pepper: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hasher.update(pepper.as_bytes());
    hex::encode(hasher.finalize())
}

/// Sessions are stored under the hash of the token, not the token
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
