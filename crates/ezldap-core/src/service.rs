//! Resolution engine
//!
//! [`LdapService`] answers person and OU lookups against a
//! [`DirectoryQueryPort`]. Each operation is a short sequence of awaited
//! searches; nothing runs in parallel inside one call.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::dn::{self, DistinguishedName};
use crate::error::{LdapServiceError, Result};
use crate::mapper::{self, attrs, classes};
use crate::model::{BaseUser, Ou, OuSearchResult, User};
use crate::port::{
    search_mapped, DirectoryEntry, DirectoryQueryPort, Filter, Scope, SearchRequest,
};
use crate::tree::OuTreeNode;

/// Upper bound for the result size of wildcard searches.
pub const MAX_SEARCH_RESULTS: u32 = 100;

/// `lhmRankInOu` marker of the head of an OU.
pub const RANK_LEADERSHIP: &str = "01";

/// `lhmRankInOu` marker of the deputy head of an OU.
pub const RANK_DEPUTY: &str = "03";

/// Minimum search phrase length once wildcards are removed.
const MIN_SEARCH_PHRASE_LEN: usize = 3;

const GENERALIZED_TIME_FORMAT: &str = "%Y%m%d%H%M%SZ";

/// Read operations over persons and OUs.
///
/// Lookups that find nothing return `Ok(None)`. Errors are reserved for
/// rejected input and directory failures.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Person by object id.
    async fn get_person(&self, object_id: &str) -> Result<Option<User>>;

    /// Person by login name.
    async fn get_person_by_uid(&self, uid: &str) -> Result<Option<User>>;

    /// Persons whose `ou` matches `ou`, or `None` when no such OU exists.
    async fn find_persons_by_ou_short_code(&self, ou: &str) -> Result<Option<Vec<BaseUser>>>;

    /// Persons whose uid matches `phrase` (with `*` wildcards).
    async fn search_by_uid_prefix(&self, phrase: &str, limit: u32) -> Result<Vec<BaseUser>>;

    /// OU by object id, with leadership.
    async fn get_ou_by_id(&self, object_id: &str) -> Result<Option<Ou>>;

    /// OU by canonical short code, with leadership.
    async fn find_ou_by_short_code(&self, ou: &str) -> Result<Option<Ou>>;

    /// Short codes from the root OU down to the person's OU.
    async fn find_ou_tree_by_user_id(&self, object_id: &str) -> Result<Option<Vec<String>>>;

    /// Short codes from the root OU down to the given OU.
    async fn find_ou_tree_by_ou_short_code(&self, ou: &str) -> Result<Option<Vec<String>>>;

    /// The OU subtree rooted at `base` with its users.
    ///
    /// `modified_since` restricts the attached users to those modified at
    /// or after the given instant. The OU structure is always complete.
    async fn calculate_subtree_with_users(
        &self,
        base: &str,
        modified_since: Option<&str>,
    ) -> Result<Option<OuTreeNode>>;
}

/// Directory resolution engine.
#[derive(Clone)]
pub struct LdapService {
    port: Arc<dyn DirectoryQueryPort>,
    user_search_base: String,
    ou_search_base: String,
}

impl LdapService {
    /// Create an engine searching persons below `user_search_base` and OUs
    /// below `ou_search_base`.
    pub fn new(
        port: Arc<dyn DirectoryQueryPort>,
        user_search_base: impl Into<String>,
        ou_search_base: impl Into<String>,
    ) -> Self {
        Self {
            port,
            user_search_base: user_search_base.into(),
            ou_search_base: ou_search_base.into(),
        }
    }

    /// Search base for persons.
    pub fn user_search_base(&self) -> &str {
        &self.user_search_base
    }

    /// Search base for OUs.
    pub fn ou_search_base(&self) -> &str {
        &self.ou_search_base
    }

    async fn find_single_person(&self, criterion: Filter, key: &str) -> Result<Option<User>> {
        let request = SearchRequest::new(&self.user_search_base, person_filter([criterion]))
            .expect_unique();
        self.search_unique(request, mapper::map_user, "person", key).await
    }

    /// Run a uniqueness-checked search. A second match yields `None`.
    async fn search_unique<R, F>(
        &self,
        request: SearchRequest,
        mapper: F,
        kind: &str,
        key: &str,
    ) -> Result<Option<R>>
    where
        F: Fn(&DirectoryEntry) -> R,
    {
        match search_mapped(self.port.as_ref(), request, mapper).await {
            Ok(results) => Ok(single(results, kind, key)),
            Err(e) if e.is_size_limit_exceeded() => {
                warn!(kind = %kind, key = %key, "ambiguous directory result");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_single_ou(&self, criterion: Filter, key: &str) -> Result<Option<Ou>> {
        let request = SearchRequest::new(
            &self.ou_search_base,
            Filter::and(vec![
                Filter::eq(attrs::OBJECT_CLASS, classes::ORGANIZATIONAL_UNIT),
                criterion,
            ]),
        )
        .expect_unique();
        match self.search_unique(request, mapper::map_ou, "OU", key).await? {
            Some(result) => Ok(Some(self.resolve_managers(result).await?)),
            None => Ok(None),
        }
    }

    /// Attach leadership to an OU.
    ///
    /// Manager attributes take precedence. Without them, persons referencing
    /// the OU with the leadership and deputy rank markers are used.
    async fn resolve_managers(&self, result: OuSearchResult) -> Result<Ou> {
        let (leadership, deputy) = if result.has_manager_reference() {
            let leadership = self
                .lookup_manager(result.manager_uid.as_deref(), attrs::OU_MANAGER)
                .await?;
            let deputy = self
                .lookup_manager(result.second_manager_uid.as_deref(), attrs::OU_SECOND_MANAGER)
                .await?;
            (leadership, deputy)
        } else if let Some(ou_id) = result.object_id.as_deref() {
            let leadership = self.lookup_person_with_rank(ou_id, RANK_LEADERSHIP).await?;
            if leadership.is_none() {
                debug!(ou_id = %ou_id, "No person with leadership rank in OU");
            }
            let deputy = self.lookup_person_with_rank(ou_id, RANK_DEPUTY).await?;
            if deputy.is_none() {
                debug!(ou_id = %ou_id, "No person with deputy rank in OU");
            }
            (leadership, deputy)
        } else {
            debug!("OU has neither manager attributes nor object id, leadership stays empty");
            (None, None)
        };
        Ok(Ou::from_search_result(result, leadership, deputy))
    }

    async fn lookup_manager(&self, uid: Option<&str>, attribute: &str) -> Result<Option<User>> {
        let Some(uid) = uid else {
            return Ok(None);
        };
        debug!(attribute = %attribute, uid = %uid, "Looking up manager");
        let manager = self.get_person_by_uid(uid).await?;
        if manager.is_none() {
            debug!(attribute = %attribute, uid = %uid, "No person found for manager uid");
        }
        Ok(manager)
    }

    async fn lookup_person_with_rank(&self, ou_id: &str, rank: &str) -> Result<Option<User>> {
        let request = SearchRequest::new(
            &self.user_search_base,
            person_filter([
                Filter::present(attrs::OBJECT_ID),
                Filter::eq(attrs::OBJECT_REFERENCE, ou_id),
                Filter::eq(attrs::RANK_IN_OU, rank),
            ]),
        )
        .expect_unique();
        self.search_unique(request, mapper::map_user, "ranked person", ou_id).await
    }

    /// Walk the object path found by `request` and collect the short code
    /// of every OU on the way, root first.
    async fn resolve_ou_tree_path(&self, request: SearchRequest) -> Result<Option<Vec<String>>> {
        let paths = search_mapped(self.port.as_ref(), request, mapper::map_object_path).await?;

        let Some(path) = paths.into_iter().flatten().find_map(|raw| {
            DistinguishedName::parse(&raw)
                .map_err(|e| debug!(path = %raw, error = %e, "Skipping unparsable object path"))
                .ok()
        }) else {
            return Ok(None);
        };

        let mut short_names = Vec::new();
        for depth in 1..=path.len() {
            let level = path.prefix(depth).to_string();
            let request = SearchRequest::new(
                &level,
                Filter::eq(attrs::OBJECT_CLASS, classes::ORGANIZATIONAL_UNIT),
            )
            .with_scope(Scope::Object)
            .with_count_limit(1)
            .with_attributes([attrs::OU_SHORT_NAME]);

            match search_mapped(self.port.as_ref(), request, mapper::map_ou_short_name).await {
                Ok(names) => {
                    short_names.extend(names.into_iter().flatten().map(|n| n.to_uppercase()));
                }
                Err(e) if e.is_name_not_found() => {
                    warn!(level = %level, "OU tree level does not exist, skipping");
                }
                Err(e) => return Err(e.into()),
            }
        }

        if short_names.is_empty() {
            Ok(None)
        } else {
            Ok(Some(short_names))
        }
    }
}

#[async_trait]
impl DirectoryService for LdapService {
    #[instrument(skip(self))]
    async fn get_person(&self, object_id: &str) -> Result<Option<User>> {
        info!("Looking up person by object id");
        self.find_single_person(Filter::eq(attrs::OBJECT_ID, object_id), object_id)
            .await
    }

    #[instrument(skip(self))]
    async fn get_person_by_uid(&self, uid: &str) -> Result<Option<User>> {
        info!("Looking up person by uid");
        self.find_single_person(
            Filter::and(vec![
                Filter::eq(attrs::UID, uid),
                Filter::present(attrs::OBJECT_ID),
            ]),
            uid,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn find_persons_by_ou_short_code(&self, ou: &str) -> Result<Option<Vec<BaseUser>>> {
        info!("Looking up persons by OU short code");
        let ou_request = SearchRequest::new(
            &self.ou_search_base,
            Filter::and(vec![
                Filter::eq(attrs::OBJECT_CLASS, classes::ORGANIZATIONAL_UNIT),
                Filter::eq(attrs::OU_SHORT_NAME, ou),
            ]),
        )
        .with_count_limit(1)
        .with_attributes([attrs::OU_SHORT_NAME]);
        if self.port.search(ou_request).await?.is_empty() {
            debug!("OU does not exist");
            return Ok(None);
        }

        let request = SearchRequest::new(
            &self.user_search_base,
            person_filter([
                Filter::present(attrs::OBJECT_ID),
                Filter::eq(attrs::OU, ou),
            ]),
        );
        let users = search_mapped(self.port.as_ref(), request, mapper::map_base_user).await?;
        debug!(count = users.len(), "Persons found in OU");
        Ok(Some(users))
    }

    #[instrument(skip(self))]
    async fn search_by_uid_prefix(&self, phrase: &str, limit: u32) -> Result<Vec<BaseUser>> {
        info!("Searching persons by uid");
        if phrase.replace('*', "").trim().chars().count() < MIN_SEARCH_PHRASE_LEN {
            return Err(LdapServiceError::InvalidArgument(format!(
                "search phrase must contain at least {MIN_SEARCH_PHRASE_LEN} characters besides '*'"
            )));
        }
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = if limit > MAX_SEARCH_RESULTS {
            warn!(
                requested = limit,
                max = MAX_SEARCH_RESULTS,
                "Search limit too large, clamping"
            );
            MAX_SEARCH_RESULTS
        } else {
            limit
        };

        let request = SearchRequest::new(
            &self.user_search_base,
            person_filter([
                Filter::present(attrs::OBJECT_ID),
                Filter::like(attrs::UID, phrase),
            ]),
        )
        .with_count_limit(limit);
        Ok(search_mapped(self.port.as_ref(), request, mapper::map_base_user).await?)
    }

    #[instrument(skip(self))]
    async fn get_ou_by_id(&self, object_id: &str) -> Result<Option<Ou>> {
        info!("Looking up OU by object id");
        self.find_single_ou(Filter::eq(attrs::OBJECT_ID, object_id), object_id)
            .await
    }

    #[instrument(skip(self))]
    async fn find_ou_by_short_code(&self, ou: &str) -> Result<Option<Ou>> {
        info!("Looking up OU by short code");
        self.find_single_ou(Filter::eq(attrs::OU_SHORT_NAME, ou), ou)
            .await
    }

    #[instrument(skip(self))]
    async fn find_ou_tree_by_user_id(&self, object_id: &str) -> Result<Option<Vec<String>>> {
        info!("Resolving OU tree for person");
        let request =
            SearchRequest::new(&self.user_search_base, Filter::eq(attrs::OBJECT_ID, object_id))
                .with_count_limit(1)
                .with_attributes([attrs::OBJECT_PATH]);
        self.resolve_ou_tree_path(request).await
    }

    #[instrument(skip(self))]
    async fn find_ou_tree_by_ou_short_code(&self, ou: &str) -> Result<Option<Vec<String>>> {
        info!("Resolving OU tree for OU");
        let request = SearchRequest::new(&self.user_search_base, Filter::eq(attrs::COMMON_NAME, ou))
            .with_count_limit(1)
            .with_attributes([attrs::OBJECT_PATH]);
        self.resolve_ou_tree_path(request).await
    }

    #[instrument(skip(self))]
    async fn calculate_subtree_with_users(
        &self,
        base: &str,
        modified_since: Option<&str>,
    ) -> Result<Option<OuTreeNode>> {
        info!("Calculating OU subtree");
        let modified_since = modified_since
            .map(normalize_generalized_time)
            .transpose()?;
        let root_dn = DistinguishedName::parse(base)
            .map_err(|e| LdapServiceError::InvalidArgument(format!("invalid base '{base}': {e}")))?;
        let root_key = root_dn.normalized();

        let ou_request = SearchRequest::new(
            base,
            Filter::eq(attrs::OBJECT_CLASS, classes::ORGANIZATIONAL_UNIT),
        )
        .with_attributes(["*", attrs::MODIFY_TIMESTAMP]);
        let ou_entries = match self.port.search(ou_request).await {
            Ok(entries) => entries,
            Err(e) if e.is_name_not_found() => {
                debug!("Subtree base does not exist");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let mut user_criteria = vec![
            Filter::present(attrs::OBJECT_ID),
            Filter::or(vec![
                Filter::eq(attrs::OBJECT_PATH, base),
                Filter::ends_with(attrs::OBJECT_PATH, format!(",{base}")),
            ]),
        ];
        if let Some(since) = &modified_since {
            user_criteria.push(Filter::gte(attrs::MODIFY_TIMESTAMP, since.as_str()));
        }
        let user_request = SearchRequest::new(&self.user_search_base, person_filter(user_criteria))
            .with_attributes(["*", attrs::MODIFY_TIMESTAMP]);
        let users = search_mapped(self.port.as_ref(), user_request, mapper::map_user).await?;

        let mut users_by_path: HashMap<String, Vec<User>> = HashMap::new();
        for user in users {
            match user.object_path.as_deref() {
                Some(path) => users_by_path.entry(dn::normalize(path)).or_default().push(user),
                None => debug!(uid = ?user.base.uid, "Person without object path skipped"),
            }
        }

        let mut pending = Vec::with_capacity(ou_entries.len());
        let mut nodes: HashMap<String, OuTreeNode> = HashMap::with_capacity(ou_entries.len());
        for entry in &ou_entries {
            let parsed = match DistinguishedName::parse(entry.dn()) {
                Ok(parsed) => parsed,
                Err(e) => {
                    debug!(dn = %entry.dn(), error = %e, "Skipping OU with unparsable DN");
                    continue;
                }
            };
            let key = parsed.normalized();
            let mut node = OuTreeNode::new(entry.dn(), mapper::map_ou(entry));
            node.users = users_by_path.remove(&key).unwrap_or_default();
            if key != root_key {
                pending.push((parsed, key.clone()));
            }
            nodes.insert(key, node);
        }

        if !nodes.contains_key(&root_key) {
            debug!("Subtree base is not an OU");
            return Ok(None);
        }

        // Deepest first, so every node is complete before it moves into its parent.
        pending.sort_by_key(|(parsed, _)| std::cmp::Reverse(parsed.len()));
        for (parsed, key) in pending {
            let Some(node) = nodes.remove(&key) else {
                continue;
            };
            let parent_key = parsed.parent().map(|p| p.normalized()).unwrap_or_default();
            let Some(parent) = nodes.get_mut(&parent_key) else {
                debug!(dn = %node.distinguished_path, "Parent of OU is not part of the subtree, dropping");
                continue;
            };
            let label = node
                .ou
                .ou_short_code
                .clone()
                .or_else(|| parsed.leaf().map(|rdn| rdn.value().to_string()))
                .unwrap_or_default();
            if parent.child_nodes.contains_key(&label) {
                warn!(
                    label = %label,
                    dn = %node.distinguished_path,
                    "Sibling OU label collision, keying child by DN"
                );
                parent
                    .child_nodes
                    .insert(node.distinguished_path.clone(), node);
            } else {
                parent.child_nodes.insert(label, node);
            }
        }

        Ok(nodes.remove(&root_key))
    }
}

/// `objectClass=person ∧ objectClass=lhmPerson ∧ criteria`.
fn person_filter(criteria: impl IntoIterator<Item = Filter>) -> Filter {
    let mut filters = vec![
        Filter::eq(attrs::OBJECT_CLASS, classes::PERSON),
        Filter::eq(attrs::OBJECT_CLASS, classes::LHM_PERSON),
    ];
    filters.extend(criteria);
    Filter::and(filters)
}

/// Exactly one result, or `None`. More than one is logged as ambiguous.
fn single<T>(mut results: Vec<T>, kind: &str, key: &str) -> Option<T> {
    match results.len() {
        0 => None,
        1 => results.pop(),
        n => {
            warn!(kind = %kind, key = %key, count = n, "ambiguous directory result");
            None
        }
    }
}

/// Validate a modification timestamp and bring it into generalized time.
///
/// Accepts LDAP generalized time (`YYYYMMDDHHMMSSZ`, compared textually by
/// the directory) or an RFC 3339 instant, which is converted to UTC.
fn normalize_generalized_time(value: &str) -> Result<String> {
    let trimmed = value.trim();
    let is_generalized = trimmed.len() == 15
        && trimmed.ends_with('Z')
        && trimmed.as_bytes()[..14].iter().all(u8::is_ascii_digit);
    if is_generalized {
        return Ok(trimmed.to_string());
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|instant| {
            instant
                .with_timezone(&Utc)
                .format(GENERALIZED_TIME_FORMAT)
                .to_string()
        })
        .map_err(|_| {
            LdapServiceError::InvalidArgument(format!(
                "'{value}' is neither generalized time (YYYYMMDDHHMMSSZ) nor RFC 3339"
            ))
        })
}
