//! Organizer access control.
//!
//! Management passwords are stored as Argon2 hashes. Verification attempts
//! are throttled per show slug through an [`AttemptLimiter`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use podium_common::{AppError, AppResult, config::AccessConfig};
use podium_db::{entities::show, repositories::ShowRepository};
use tokio::sync::RwLock;

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Throttles repeated failed verifications for a key.
///
/// The in-process [`InMemoryAttemptLimiter`] only limits a single instance;
/// a shared counter can implement this trait without touching callers.
#[async_trait]
pub trait AttemptLimiter: Send + Sync {
    /// Admit an attempt for `key`, or fail with
    /// [`AppError::TooManyRequests`] while it is locked out.
    ///
    /// An admitted attempt counts against the limit until it is settled by
    /// [`record`](Self::record) or [`release`](Self::release).
    async fn check(&self, key: &str) -> AppResult<()>;

    /// Settle an admitted attempt with its outcome. Success clears the key.
    async fn record(&self, key: &str, success: bool);

    /// Settle an admitted attempt that ended without an outcome.
    async fn release(&self, key: &str);
}

#[derive(Debug, Clone, Copy, Default)]
struct AttemptState {
    failures: u32,
    in_flight: u32,
    last_failure: Option<Instant>,
}

impl AttemptState {
    const fn is_idle(&self) -> bool {
        self.failures == 0 && self.in_flight == 0
    }
}

/// Process-local failure counter keyed by show slug.
#[derive(Clone)]
pub struct InMemoryAttemptLimiter {
    max_failures: u32,
    window: Duration,
    states: Arc<RwLock<HashMap<String, AttemptState>>>,
}

impl InMemoryAttemptLimiter {
    /// Create a limiter allowing `max_failures` within `window`.
    #[must_use]
    pub fn new(max_failures: u32, window: Duration) -> Self {
        Self {
            max_failures,
            window,
            states: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a limiter from the access configuration.
    #[must_use]
    pub fn from_config(config: &AccessConfig) -> Self {
        Self::new(
            config.max_failed_attempts,
            Duration::from_secs(config.lockout_minutes * 60),
        )
    }

    async fn check_at(&self, key: &str, now: Instant) -> AppResult<()> {
        let mut states = self.states.write().await;
        let state = states.entry(key.to_string()).or_default();

        if state
            .last_failure
            .is_some_and(|at| now.saturating_duration_since(at) > self.window)
        {
            state.failures = 0;
            state.last_failure = None;
        }

        // Attempts still being verified count as potential failures.
        if state.failures + state.in_flight >= self.max_failures {
            let elapsed = state
                .last_failure
                .map_or(Duration::ZERO, |at| now.saturating_duration_since(at));
            let remaining = self.window.saturating_sub(elapsed);
            return Err(AppError::TooManyRequests {
                retry_after_minutes: remaining.as_secs().div_ceil(60),
            });
        }

        state.in_flight += 1;
        Ok(())
    }

    async fn record_at(&self, key: &str, success: bool, now: Instant) {
        let mut states = self.states.write().await;
        let state = states.entry(key.to_string()).or_default();
        state.in_flight = state.in_flight.saturating_sub(1);

        if success {
            state.failures = 0;
            state.last_failure = None;
        } else {
            state.failures += 1;
            state.last_failure = Some(now);
        }

        if state.is_idle() {
            states.remove(key);
        }
    }

    async fn release_at(&self, key: &str) {
        let mut states = self.states.write().await;
        if let Some(state) = states.get_mut(key) {
            state.in_flight = state.in_flight.saturating_sub(1);
            if state.is_idle() {
                states.remove(key);
            }
        }
    }

    /// Drop entries with no attempt in flight whose window has elapsed.
    pub async fn cleanup(&self) {
        let mut states = self.states.write().await;
        let now = Instant::now();
        states.retain(|_, state| {
            state.in_flight > 0
                || state
                    .last_failure
                    .is_some_and(|at| now.saturating_duration_since(at) <= self.window)
        });
    }

    /// Number of keys currently tracked.
    pub async fn key_count(&self) -> usize {
        self.states.read().await.len()
    }
}

#[async_trait]
impl AttemptLimiter for InMemoryAttemptLimiter {
    async fn check(&self, key: &str) -> AppResult<()> {
        self.check_at(key, Instant::now()).await
    }

    async fn record(&self, key: &str, success: bool) {
        self.record_at(key, success, Instant::now()).await;
    }

    async fn release(&self, key: &str) {
        self.release_at(key).await;
    }
}

/// Guards organizer-only operations behind the show password.
#[derive(Clone)]
pub struct AccessService {
    show_repo: ShowRepository,
    limiter: Arc<dyn AttemptLimiter>,
}

impl AccessService {
    /// Create a new access service.
    #[must_use]
    pub fn new(show_repo: ShowRepository, limiter: Arc<dyn AttemptLimiter>) -> Self {
        Self { show_repo, limiter }
    }

    /// Verify the management password of the show at `slug`.
    ///
    /// A show without a password admits anyone. Unknown slugs count as
    /// failures so they cannot be probed for free.
    pub async fn verify_manage_access(&self, slug: &str, password: &str) -> AppResult<show::Model> {
        if let Err(e) = self.limiter.check(slug).await {
            tracing::warn!(slug = %slug, "Management access locked out");
            return Err(e);
        }

        let result = self.authenticate(slug, password).await;
        match &result {
            Ok(_) => self.limiter.record(slug, true).await,
            Err(AppError::NotFound(_) | AppError::Unauthorized(_)) => {
                self.limiter.record(slug, false).await;
            }
            Err(_) => self.limiter.release(slug).await,
        }
        result
    }

    async fn authenticate(&self, slug: &str, password: &str) -> AppResult<show::Model> {
        let Some(show) = self.show_repo.find_by_slug(slug).await? else {
            return Err(AppError::NotFound(format!("Show not found: {slug}")));
        };

        let valid = match show.password.as_deref() {
            None => true,
            Some(hash) => verify_password(password, hash)?,
        };
        if !valid {
            tracing::warn!(slug = %slug, "Invalid management password");
            return Err(AppError::Unauthorized("Invalid password".to_string()));
        }

        Ok(show)
    }
}
