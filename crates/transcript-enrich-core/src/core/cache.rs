// transcript-enrich-core/src/core/cache.rs
// ============================================================================
// Module: Translation Cache
// Description: Content-addressed cache of translation outcomes.
// Purpose: Guarantee one fetch per distinct message content for the session.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! The cache maps a bounded content key to either a translation or the
//! "already target language" sentinel. It is append-only for the lifetime of
//! the process: entries are immutable once stored and never evicted, so the
//! render tree can be re-projected from it at any time without refetching.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use thiserror::Error;

use crate::interfaces::Translation;

// ============================================================================
// SECTION: Cache Key
// ============================================================================

/// Bounded content fingerprint identifying a message for caching.
///
/// The key is the normalized, boilerplate-stripped message text truncated to
/// a fixed prefix length, so lookups stay O(1) string compares regardless of
/// message length. Two distinct long messages sharing a prefix collide; that
/// risk is accepted, matching the original system.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds a key from already-normalized text, truncating deterministically
    /// from the start to at most `prefix_chars` characters.
    #[must_use]
    pub fn truncated(normalized: &str, prefix_chars: usize) -> Self {
        Self(normalized.chars().take(prefix_chars).collect())
    }

    /// Returns the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Cache Entry
// ============================================================================

/// One recorded translation outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    /// The provider produced a translation differing from the source text.
    Translated(Translation),
    /// The text is already in the target language, or the fetch failed and
    /// is deliberately not retried this session. Never rendered.
    AlreadyTarget,
}

// ============================================================================
// SECTION: Cache
// ============================================================================

/// Translation cache errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache lock was poisoned by a panicking writer.
    #[error("translation cache lock poisoned")]
    Poisoned,
}

/// Append-only translation cache shared across the engine.
///
/// Single writer (the scanner, behind its in-flight guard), many readers.
/// Entries are immutable once stored, so readers never observe a partially
/// written value.
#[derive(Debug, Default)]
pub struct TranslationCache {
    /// Key-to-outcome map protected by a reader/writer lock.
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl TranslationCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the outcome recorded for `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Poisoned`] when the lock is poisoned.
    pub fn lookup(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let guard = self.entries.read().map_err(|_| CacheError::Poisoned)?;
        Ok(guard.get(key).cloned())
    }

    /// Records an outcome for `key`. The first writer wins: when an entry is
    /// already present it is kept untouched and `false` is returned. A
    /// duplicate store is a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Poisoned`] when the lock is poisoned.
    pub fn store(&self, key: CacheKey, entry: CacheEntry) -> Result<bool, CacheError> {
        let mut guard = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        if guard.contains_key(&key) {
            return Ok(false);
        }
        guard.insert(key, entry);
        Ok(true)
    }

    /// Returns the number of recorded outcomes. Diagnostics only.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Poisoned`] when the lock is poisoned.
    pub fn len(&self) -> Result<usize, CacheError> {
        let guard = self.entries.read().map_err(|_| CacheError::Poisoned)?;
        Ok(guard.len())
    }

    /// Returns whether the cache holds no outcomes yet.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Poisoned`] when the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }
}
