use anyhow::anyhow;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

use super::{apply_delete_policy, MAX_GENERATION_ATTEMPTS};
use crate::config::DeletePolicy;
use crate::error::{AppError, AppResult};
use crate::models::api_key::{ApiKeyResponse, NewApiKey};
use crate::store::{Conflict, Store, StoreError};

/// Maximum number of unexpired keys a user may hold
pub const MAX_ACTIVE_KEYS: i64 = 3;
/// Lifetime of a key created without an explicit expiration
pub const DEFAULT_KEY_LIFETIME_DAYS: i64 = 7;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const KEY_LETTERS: usize = 5;
const KEY_DIGITS: usize = 5;

/// Generate a 10-character key: five letters and five digits in random order.
///
/// Callers pass `rand::thread_rng()`, which is a CSPRNG; the format is kept
/// short for compatibility with keys already handed out.
pub fn generate_api_key<R: Rng>(rng: &mut R) -> String {
    let mut chars: Vec<u8> = Vec::with_capacity(KEY_LETTERS + KEY_DIGITS);
    chars.extend((0..KEY_LETTERS).map(|_| LETTERS[rng.gen_range(0..LETTERS.len())]));
    chars.extend((0..KEY_DIGITS).map(|_| DIGITS[rng.gen_range(0..DIGITS.len())]));
    chars.shuffle(rng);
    chars.into_iter().map(char::from).collect()
}

/// Parse a requested expiration: RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` (UTC) or
/// `YYYY-MM-DD` (midnight UTC). It must lie strictly after `now`.
pub fn parse_expiration(raw: &str, now: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
    let raw = raw.trim();
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
        .ok_or_else(|| AppError::validation(format!("Invalid expiration date '{}'", raw)))?;

    if parsed <= now {
        return Err(AppError::validation("Expiration must be in the future"));
    }
    Ok(parsed)
}

#[derive(Clone)]
pub struct ApiKeyManager {
    store: Arc<dyn Store>,
    delete_policy: DeletePolicy,
}

impl ApiKeyManager {
    pub fn new(store: Arc<dyn Store>, delete_policy: DeletePolicy) -> Self {
        Self {
            store,
            delete_policy,
        }
    }

    /// All keys of `user_id`, newest first, with expiry computed now
    pub async fn list_keys(&self, user_id: i64) -> AppResult<Vec<ApiKeyResponse>> {
        let now = Utc::now();
        let keys = self.store.list_api_keys(user_id).await?;
        Ok(keys
            .into_iter()
            .map(|key| ApiKeyResponse::at(key, now))
            .collect())
    }

    pub async fn create_key(
        &self,
        user_id: i64,
        expiration: Option<&str>,
        note: Option<String>,
    ) -> AppResult<ApiKeyResponse> {
        let now = Utc::now();
        let expires_at = match expiration.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => parse_expiration(raw, now)?,
            None => now + Duration::days(DEFAULT_KEY_LIFETIME_DAYS),
        };
        let note = note.unwrap_or_default();

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let key = NewApiKey {
                user_id,
                api_key: generate_api_key(&mut rand::thread_rng()),
                created_at: now,
                expires_at,
                note: note.clone(),
            };

            match self
                .store
                .insert_api_key_within_quota(key, MAX_ACTIVE_KEYS, now)
                .await
            {
                Ok(created) => {
                    tracing::info!(user_id, key_id = created.id, %expires_at, "API key created");
                    return Ok(ApiKeyResponse::at(created, now));
                }
                Err(StoreError::AlreadyExists(Conflict::ApiKeyToken)) => {
                    tracing::warn!(user_id, attempt, "API key token collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(anyhow!(
            "could not generate a unique API key after {} attempts",
            MAX_GENERATION_ATTEMPTS
        )
        .into())
    }

    pub async fn delete_key(&self, user_id: i64, key_id: i64) -> AppResult<()> {
        let removed = self.store.delete_api_key(user_id, key_id).await?;
        tracing::info!(user_id, key_id, removed, "API key delete");
        apply_delete_policy(self.delete_policy, removed, "API key")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_generated_key_has_five_letters_and_five_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let key = generate_api_key(&mut rng);
            assert_eq!(key.len(), 10);
            assert_eq!(key.chars().filter(|c| c.is_ascii_alphabetic()).count(), 5);
            assert_eq!(key.chars().filter(|c| c.is_ascii_digit()).count(), 5);
        }
    }

    #[test]
    fn test_generated_keys_are_shuffled() {
        let mut rng = StdRng::seed_from_u64(11);
        let letters_first = (0..200)
            .map(|_| generate_api_key(&mut rng))
            .filter(|key| key.chars().take(5).all(|c| c.is_ascii_alphabetic()))
            .count();
        // 1 in 252 orderings puts every letter first
        assert!(letters_first < 20);
    }

    #[test]
    fn test_parse_expiration_formats() {
        let now = DateTime::parse_from_rfc3339("2030-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let rfc = parse_expiration("2030-02-01T12:30:00+02:00", now).unwrap();
        assert_eq!(rfc.to_rfc3339(), "2030-02-01T10:30:00+00:00");

        let date = parse_expiration("2030-03-15", now).unwrap();
        assert_eq!(date.to_rfc3339(), "2030-03-15T00:00:00+00:00");

        let local = parse_expiration("2030-03-15T08:00", now).unwrap();
        assert_eq!(local.to_rfc3339(), "2030-03-15T08:00:00+00:00");
    }

    #[test]
    fn test_parse_expiration_rejects_garbage_and_past() {
        let now = Utc::now();
        assert!(matches!(
            parse_expiration("next tuesday", now),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            parse_expiration("2001-01-01", now),
            Err(AppError::Validation(_))
        ));
    }
}
