//! The address-ownership registry.
//!
//! One owned struct with an injected storage backend, never bare globals:
//! all four logical mappings live behind a single `tokio::sync::Mutex`, so
//! every check-then-write (mint collision checks, block-list updates) is
//! atomic even when handlers interleave at await points. Successful
//! mutations persist through the backend before returning.

use std::sync::Arc;

use lazy_regex::regex_replace_all;
use rand::rngs::OsRng;
use rand::Rng;
use tokio::sync::Mutex;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::storage::{RegistryState, StorageBackend};

const RANDOM_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Normalizes a user-supplied name into an email local part.
///
/// Lowercases, turns whitespace runs into single dots, drops everything
/// outside `[a-z0-9._-]`, collapses dot runs, trims edge dots and cuts to
/// the maximum length (trimming again in case the cut exposed a dot).
/// Returns an empty string when nothing usable remains.
pub fn sanitize_local_part(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let dotted = regex_replace_all!(r"\s+", &lowered, ".");
    let allowed = regex_replace_all!(r"[^a-z0-9._-]", &dotted, "");
    let collapsed = regex_replace_all!(r"\.{2,}", &allowed, ".");
    let trimmed = collapsed.trim_matches('.');

    let cut: String = trimmed.chars().take(config::mint::MAX_LOCAL_PART_LEN).collect();
    cut.trim_matches('.').to_string()
}

/// Draws a random local part from a cryptographically secure source.
pub fn random_local_part(len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..RANDOM_ALPHABET.len());
            RANDOM_ALPHABET[idx] as char
        })
        .collect()
}

/// The ownership registry. Reads take the lock briefly; mutations hold it
/// across the persistence call so a mint is never half-visible.
pub struct Registry {
    domain: String,
    backend: Arc<dyn StorageBackend>,
    state: Mutex<RegistryState>,
}

impl Registry {
    /// Load persisted state from `backend` and wrap it.
    pub async fn load(backend: Arc<dyn StorageBackend>, domain: impl Into<String>) -> AppResult<Self> {
        let state = backend.load().await?;
        log::info!(
            "Registry loaded from {} backend: {} addresses, {} owners, {} blocked",
            backend.describe(),
            state.owner_of.len(),
            state.addresses_of.len(),
            state.blocked.len()
        );
        Ok(Self {
            domain: domain.into().to_lowercase(),
            backend,
            state: Mutex::new(state),
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    fn make_address(&self, local_part: &str) -> String {
        format!("{}@{}", local_part, self.domain)
    }

    /// Mint a fresh random address for `owner`.
    ///
    /// Draws candidates until one is unowned (or already owned by this
    /// same owner), bounded by `config::mint::MAX_ATTEMPTS`. The keyspace
    /// is 36^10, so hitting the bound means something is deeply wrong and
    /// the caller gets `RegistryExhausted` instead of an infinite loop.
    pub async fn mint_random(&self, owner: i64) -> AppResult<String> {
        let mut state = self.state.lock().await;

        for _ in 0..config::mint::MAX_ATTEMPTS {
            let candidate = self.make_address(&random_local_part(config::mint::RANDOM_LOCAL_PART_LEN));
            if let Some(&existing) = state.owner_of.get(&candidate) {
                if existing != owner {
                    continue;
                }
            }
            register(&mut state, owner, &candidate);
            self.persist(&state).await?;
            return Ok(candidate);
        }

        Err(AppError::RegistryExhausted(config::mint::MAX_ATTEMPTS))
    }

    /// Mint an address with a user-chosen local part.
    ///
    /// Fails with `InvalidName` when sanitization eats the whole input and
    /// with `NameTaken` (no state change) when the address belongs to a
    /// different owner. Re-minting one's own address refreshes
    /// `last_address` without duplicating the list entry.
    pub async fn mint_named(&self, owner: i64, raw_input: &str) -> AppResult<String> {
        let local = sanitize_local_part(raw_input);
        if local.is_empty() {
            return Err(AppError::InvalidName);
        }

        let address = self.make_address(&local);
        let mut state = self.state.lock().await;

        if let Some(&existing) = state.owner_of.get(&address) {
            if existing != owner {
                return Err(AppError::NameTaken);
            }
        }

        register(&mut state, owner, &address);
        self.persist(&state).await?;
        Ok(address)
    }

    /// The most recently minted/selected address for `owner`.
    pub async fn last_address(&self, owner: i64) -> Option<String> {
        self.state.lock().await.last_address_of.get(&owner).cloned()
    }

    /// Every address `owner` holds, in mint order.
    pub async fn addresses(&self, owner: i64) -> Vec<String> {
        self.state
            .lock()
            .await
            .addresses_of
            .get(&owner)
            .cloned()
            .unwrap_or_default()
    }

    /// Resolve an address (case-insensitively) to its owner.
    pub async fn owner_of_address(&self, address: &str) -> Option<i64> {
        let normalized = address.trim().to_lowercase();
        self.state.lock().await.owner_of.get(&normalized).copied()
    }

    pub async fn is_blocked(&self, owner: i64) -> bool {
        self.state.lock().await.blocked.contains(&owner)
    }

    /// Deny service to `owner`. Idempotent.
    pub async fn block(&self, owner: i64) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.blocked.insert(owner) {
            self.persist(&state).await?;
        }
        Ok(())
    }

    /// Restore service to `owner`. Returns false when they were not
    /// blocked in the first place, so callers can report the no-op.
    pub async fn unblock(&self, owner: i64) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let removed = state.blocked.remove(&owner);
        if removed {
            self.persist(&state).await?;
        }
        Ok(removed)
    }

    async fn persist(&self, state: &RegistryState) -> AppResult<()> {
        match self.backend.save(state).await {
            Ok(()) => Ok(()),
            Err(e) if !self.backend.strict_writes() => {
                // In-memory view stays authoritative; durability catches up
                // on the next successful save.
                log::error!("Failed to persist registry ({} backend): {}", self.backend.describe(), e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn register(state: &mut RegistryState, owner: i64, address: &str) {
    state.owner_of.insert(address.to_string(), owner);
    let list = state.addresses_of.entry(owner).or_default();
    if !list.iter().any(|a| a == address) {
        list.push(address.to_string());
    }
    state.last_address_of.insert(owner, address.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use pretty_assertions::assert_eq;

    async fn fresh_registry() -> Registry {
        Registry::load(Arc::new(InMemoryStore::new()), "tmp.example")
            .await
            .unwrap()
    }

    #[test]
    fn sanitize_handles_spaces_and_punctuation() {
        assert_eq!(sanitize_local_part("John Doe!!"), "john.doe");
    }

    #[test]
    fn sanitize_collapses_and_trims_dots() {
        assert_eq!(sanitize_local_part("..a...b.."), "a.b");
        assert_eq!(sanitize_local_part(" spaced   out "), "spaced.out");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for raw in ["John Doe!!", "  WEIRD__name--42  ", "a.b.c", "///", "x"] {
            let once = sanitize_local_part(raw);
            assert_eq!(sanitize_local_part(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn sanitize_rejects_garbage_to_empty() {
        assert_eq!(sanitize_local_part("!!!???"), "");
        assert_eq!(sanitize_local_part("   "), "");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "a".repeat(100);
        assert_eq!(sanitize_local_part(&long).len(), config::mint::MAX_LOCAL_PART_LEN);
    }

    #[test]
    fn random_local_part_has_expected_shape() {
        let part = random_local_part(10);
        assert_eq!(part.len(), 10);
        assert!(part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn mint_named_builds_full_address() {
        let registry = fresh_registry().await;
        let address = registry.mint_named(1, "John Doe!!").await.unwrap();
        assert_eq!(address, "john.doe@tmp.example");
        assert_eq!(registry.owner_of_address("john.doe@tmp.example").await, Some(1));
        assert_eq!(registry.last_address(1).await.as_deref(), Some("john.doe@tmp.example"));
    }

    #[tokio::test]
    async fn mint_named_rejects_empty_sanitization() {
        let registry = fresh_registry().await;
        assert!(matches!(registry.mint_named(1, "!!!").await, Err(AppError::InvalidName)));
        assert!(registry.addresses(1).await.is_empty());
    }

    #[tokio::test]
    async fn remint_same_name_updates_last_without_duplicates() {
        let registry = fresh_registry().await;
        registry.mint_named(1, "jane").await.unwrap();
        registry.mint_random(1).await.unwrap();
        let again = registry.mint_named(1, "jane").await.unwrap();

        let addresses = registry.addresses(1).await;
        assert_eq!(addresses.iter().filter(|a| *a == &again).count(), 1);
        assert_eq!(registry.last_address(1).await, Some(again));
        assert_eq!(addresses.len(), 2);
    }

    #[tokio::test]
    async fn mint_named_never_reassigns_a_taken_address() {
        let registry = fresh_registry().await;
        registry.mint_named(1, "jane").await.unwrap();

        let err = registry.mint_named(2, "jane").await;
        assert!(matches!(err, Err(AppError::NameTaken)));

        // Nothing moved for either owner.
        assert_eq!(registry.owner_of_address("jane@tmp.example").await, Some(1));
        assert!(registry.addresses(2).await.is_empty());
        assert_eq!(registry.last_address(2).await, None);
    }

    #[tokio::test]
    async fn owner_lookup_is_case_insensitive() {
        let registry = fresh_registry().await;
        registry.mint_named(5, "Jane Doe").await.unwrap();
        assert_eq!(registry.owner_of_address("JANE.DOE@TMP.EXAMPLE").await, Some(5));
        assert_eq!(registry.owner_of_address("  jane.doe@tmp.example ").await, Some(5));
    }

    #[tokio::test]
    async fn random_mints_never_cross_owners() {
        let registry = fresh_registry().await;

        for i in 0..10_000u32 {
            let owner = if i % 2 == 0 { 1 } else { 2 };
            let address = registry.mint_random(owner).await.unwrap();
            assert_eq!(registry.owner_of_address(&address).await, Some(owner));
        }

        // Every list entry maps back to exactly its owner.
        for owner in [1, 2] {
            for address in registry.addresses(owner).await {
                assert_eq!(registry.owner_of_address(&address).await, Some(owner));
            }
        }
    }

    #[tokio::test]
    async fn concurrent_mints_of_one_name_pick_a_single_owner() {
        let registry = Arc::new(fresh_registry().await);

        let a = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.mint_named(1, "contested").await })
        };
        let b = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.mint_named(2, "contested").await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1, "exactly one of two racing mints may claim the address");
        assert!(results.iter().any(|r| matches!(r, Err(AppError::NameTaken))));
    }

    #[tokio::test]
    async fn block_and_unblock_report_distinctly() {
        let registry = fresh_registry().await;
        assert!(!registry.is_blocked(9).await);

        registry.block(9).await.unwrap();
        assert!(registry.is_blocked(9).await);

        assert!(registry.unblock(9).await.unwrap());
        assert!(!registry.unblock(9).await.unwrap(), "second unblock is a no-op");
    }
}
