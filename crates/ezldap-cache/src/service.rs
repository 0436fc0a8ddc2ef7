//! Caching directory service
//!
//! Wraps any [`DirectoryService`] with one `moka` cache per operation.
//! Concurrent lookups of the same key share a single load. Failed loads
//! are not cached, so the next call retries.

use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::{debug, instrument};

use ezldap_core::{BaseUser, DirectoryService, LdapServiceError, Ou, OuTreeNode, Result, User};

use crate::config::CacheConfig;

/// Caching facade over a [`DirectoryService`].
///
/// Lookup misses (`None`) are cached like hits. Subtree assembly is passed
/// through uncached.
pub struct CachingDirectoryService<S> {
    inner: S,
    person: Cache<String, Option<User>>,
    person_by_uid: Cache<String, Option<User>>,
    persons_by_ou: Cache<String, Option<Vec<BaseUser>>>,
    uid_search: Cache<(String, u32), Vec<BaseUser>>,
    ou_by_id: Cache<String, Option<Ou>>,
    ou_by_short_code: Cache<String, Option<Ou>>,
    ou_tree_by_user: Cache<String, Option<Vec<String>>>,
    ou_tree_by_ou: Cache<String, Option<Vec<String>>>,
}

fn build<K, V>(config: &CacheConfig) -> Cache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    Cache::builder()
        .max_capacity(config.max_capacity)
        .time_to_live(config.effective_ttl())
        .build()
}

/// Unwrap the shared error handed out by `try_get_with`.
fn unshare(error: Arc<LdapServiceError>) -> LdapServiceError {
    Arc::try_unwrap(error).unwrap_or_else(|shared| (*shared).clone())
}

impl<S: DirectoryService> CachingDirectoryService<S> {
    /// Wrap `inner` with caches built from `config`.
    pub fn new(inner: S, config: CacheConfig) -> Self {
        Self {
            inner,
            person: build(&config),
            person_by_uid: build(&config),
            persons_by_ou: build(&config),
            uid_search: build(&config),
            ou_by_id: build(&config),
            ou_by_short_code: build(&config),
            ou_tree_by_user: build(&config),
            ou_tree_by_ou: build(&config),
        }
    }

    /// The wrapped service.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop every cached entry.
    pub fn invalidate_all(&self) {
        self.person.invalidate_all();
        self.person_by_uid.invalidate_all();
        self.persons_by_ou.invalidate_all();
        self.uid_search.invalidate_all();
        self.ou_by_id.invalidate_all();
        self.ou_by_short_code.invalidate_all();
        self.ou_tree_by_user.invalidate_all();
        self.ou_tree_by_ou.invalidate_all();
        debug!("Directory caches invalidated");
    }
}

#[async_trait]
impl<S: DirectoryService> DirectoryService for CachingDirectoryService<S> {
    #[instrument(skip(self))]
    async fn get_person(&self, object_id: &str) -> Result<Option<User>> {
        self.person
            .try_get_with(object_id.to_owned(), self.inner.get_person(object_id))
            .await
            .map_err(unshare)
    }

    #[instrument(skip(self))]
    async fn get_person_by_uid(&self, uid: &str) -> Result<Option<User>> {
        self.person_by_uid
            .try_get_with(uid.to_owned(), self.inner.get_person_by_uid(uid))
            .await
            .map_err(unshare)
    }

    #[instrument(skip(self))]
    async fn find_persons_by_ou_short_code(&self, ou: &str) -> Result<Option<Vec<BaseUser>>> {
        self.persons_by_ou
            .try_get_with(ou.to_owned(), self.inner.find_persons_by_ou_short_code(ou))
            .await
            .map_err(unshare)
    }

    #[instrument(skip(self))]
    async fn search_by_uid_prefix(&self, phrase: &str, limit: u32) -> Result<Vec<BaseUser>> {
        self.uid_search
            .try_get_with(
                (phrase.to_owned(), limit),
                self.inner.search_by_uid_prefix(phrase, limit),
            )
            .await
            .map_err(unshare)
    }

    #[instrument(skip(self))]
    async fn get_ou_by_id(&self, object_id: &str) -> Result<Option<Ou>> {
        self.ou_by_id
            .try_get_with(object_id.to_owned(), self.inner.get_ou_by_id(object_id))
            .await
            .map_err(unshare)
    }

    #[instrument(skip(self))]
    async fn find_ou_by_short_code(&self, ou: &str) -> Result<Option<Ou>> {
        self.ou_by_short_code
            .try_get_with(ou.to_owned(), self.inner.find_ou_by_short_code(ou))
            .await
            .map_err(unshare)
    }

    #[instrument(skip(self))]
    async fn find_ou_tree_by_user_id(&self, object_id: &str) -> Result<Option<Vec<String>>> {
        self.ou_tree_by_user
            .try_get_with(
                object_id.to_owned(),
                self.inner.find_ou_tree_by_user_id(object_id),
            )
            .await
            .map_err(unshare)
    }

    #[instrument(skip(self))]
    async fn find_ou_tree_by_ou_short_code(&self, ou: &str) -> Result<Option<Vec<String>>> {
        self.ou_tree_by_ou
            .try_get_with(ou.to_owned(), self.inner.find_ou_tree_by_ou_short_code(ou))
            .await
            .map_err(unshare)
    }

    async fn calculate_subtree_with_users(
        &self,
        base: &str,
        modified_since: Option<&str>,
    ) -> Result<Option<OuTreeNode>> {
        self.inner
            .calculate_subtree_with_users(base, modified_since)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unshare_keeps_error() {
        let shared = Arc::new(LdapServiceError::InvalidArgument("too short".into()));
        let _extra = Arc::clone(&shared);
        let error = unshare(shared);
        assert_eq!(error.error_code(), "INVALID_ARGUMENT");
    }
}
