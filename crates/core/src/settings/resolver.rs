//! Read-through resolver for account roles using Moka.

use std::time::Duration;

use granary_shared::types::AccountId;
use moka::sync::Cache;

use super::types::AccountRole;
use crate::error::{KernelError, KernelResult};
use crate::store::Book;

/// Default cache capacity (number of entries).
const DEFAULT_CACHE_CAPACITY: u64 = 64;

/// Default time-to-live for cache entries (10 minutes).
const DEFAULT_TTL_SECS: u64 = 600;

/// Resolves account roles to account ids.
///
/// Cached values are never authoritative: the cache is cleared on every
/// commit, and a unit of work that has written settings reads the book
/// directly.
#[derive(Clone)]
pub struct SettingsResolver {
    cache: Cache<String, String>,
}

impl SettingsResolver {
    /// Creates a resolver with default cache settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a resolver with custom cache configuration.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Resolves a role through the cache.
    pub fn resolve(&self, book: &Book, role: AccountRole) -> KernelResult<AccountId> {
        let key = role.key();
        let raw = match self.cache.get(key) {
            Some(value) => value,
            None => {
                let value = book
                    .setting(key)
                    .map(|s| s.value.clone())
                    .ok_or_else(|| KernelError::not_found("Setting", key))?;
                self.cache.insert(key.to_string(), value.clone());
                value
            }
        };
        Self::parse_account(book, role, &raw)
    }

    /// Resolves a role straight from the book, skipping the cache.
    pub fn resolve_uncached(book: &Book, role: AccountRole) -> KernelResult<AccountId> {
        let key = role.key();
        let raw = book
            .setting(key)
            .ok_or_else(|| KernelError::not_found("Setting", key))?;
        Self::parse_account(book, role, &raw.value)
    }

    /// Drops every cached value.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }

    fn parse_account(book: &Book, role: AccountRole, raw: &str) -> KernelResult<AccountId> {
        let id: AccountId = raw.parse().map_err(|_| {
            KernelError::IntegrityViolation(format!("{role} holds a malformed account id `{raw}`"))
        })?;
        book.account(id)?;
        Ok(id)
    }
}

impl Default for SettingsResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SettingsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsResolver")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}
