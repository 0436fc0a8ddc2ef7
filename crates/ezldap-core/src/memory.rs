//! In-memory directory
//!
//! A [`DirectoryQueryPort`] backed by a list of entries, with filter
//! evaluation close to what an LDAP server does for the attribute syntaxes
//! used here: case-insensitive string matching, `*` wildcards and
//! lexicographic ordering for generalized time values. Used by tests and
//! for running the service without a directory.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use crate::dn::DistinguishedName;
use crate::error::{DirectoryError, DirectoryResult};
use crate::mapper::attrs;
use crate::port::{DirectoryEntry, DirectoryQueryPort, Filter, Scope, SearchRequest};

/// Operational attributes that are only returned when requested.
const OPERATIONAL_ATTRIBUTES: &[&str] = &["modifytimestamp"];

struct StoredEntry {
    dn: DistinguishedName,
    entry: DirectoryEntry,
}

/// In-memory implementation of [`DirectoryQueryPort`].
pub struct InMemoryDirectory {
    entries: RwLock<Vec<StoredEntry>>,
    failure: RwLock<Option<DirectoryError>>,
    searches: AtomicUsize,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            failure: RwLock::new(None),
            searches: AtomicUsize::new(0),
        }
    }

    /// Create a directory holding `entries`.
    pub fn with_entries(entries: impl IntoIterator<Item = DirectoryEntry>) -> DirectoryResult<Self> {
        let directory = Self::new();
        for entry in entries {
            directory.add(entry)?;
        }
        Ok(directory)
    }

    /// Add an entry. Entries are returned in insertion order.
    pub fn add(&self, entry: DirectoryEntry) -> DirectoryResult<()> {
        let dn = DistinguishedName::parse(entry.dn()).map_err(|e| {
            DirectoryError::operation_failed(format!("invalid DN '{}': {e}", entry.dn()))
        })?;
        self.write_entries()?.push(StoredEntry { dn, entry });
        Ok(())
    }

    /// Make every following search fail with `error`, or succeed again with
    /// `None`.
    pub fn set_failure(&self, error: Option<DirectoryError>) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = error;
        }
    }

    /// Number of searches executed so far.
    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    fn write_entries(
        &self,
    ) -> DirectoryResult<std::sync::RwLockWriteGuard<'_, Vec<StoredEntry>>> {
        self.entries
            .write()
            .map_err(|_| DirectoryError::operation_failed("directory lock poisoned"))
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DirectoryQueryPort for InMemoryDirectory {
    async fn search(&self, request: SearchRequest) -> DirectoryResult<Vec<DirectoryEntry>> {
        self.searches.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.failure.read().ok().and_then(|f| f.clone()) {
            return Err(error);
        }

        let base = DistinguishedName::parse(&request.base).map_err(|e| {
            DirectoryError::operation_failed(format!("invalid search base '{}': {e}", request.base))
        })?;
        let base_key = base.normalized();

        let entries = self
            .entries
            .read()
            .map_err(|_| DirectoryError::operation_failed("directory lock poisoned"))?;

        if !base.is_empty() && !entries.iter().any(|e| e.dn.normalized() == base_key) {
            return Err(DirectoryError::name_not_found(request.base));
        }

        let limit = request.count_limit.map_or(usize::MAX, |l| l as usize);
        let include_operational = requests_operational(&request.attributes);

        let mut matched = entries
            .iter()
            .filter(|stored| in_scope(&stored.dn, &base, request.scope))
            .filter(|stored| matches(&stored.entry, &request.filter));
        let results: Vec<DirectoryEntry> = matched
            .by_ref()
            .take(limit)
            .map(|stored| project(&stored.entry, include_operational))
            .collect();

        if request.unique && matched.next().is_some() {
            debug!(base = %request.base, limit, "In-memory search exceeded size limit");
            return Err(DirectoryError::SizeLimitExceeded {
                limit: request.count_limit.unwrap_or(u32::MAX),
            });
        }

        debug!(
            base = %request.base,
            scope = %request.scope,
            results = results.len(),
            "In-memory search"
        );
        Ok(results)
    }
}

fn in_scope(dn: &DistinguishedName, base: &DistinguishedName, scope: Scope) -> bool {
    match scope {
        Scope::Object => dn.len() == base.len() && dn.is_within(base),
        Scope::OneLevel => dn.len() == base.len() + 1 && dn.is_within(base),
        Scope::Subtree => dn.is_within(base),
    }
}

fn requests_operational(attributes: &[String]) -> bool {
    attributes.iter().any(|a| {
        a == "+"
            || OPERATIONAL_ATTRIBUTES
                .iter()
                .any(|op| a.eq_ignore_ascii_case(op))
    })
}

fn project(entry: &DirectoryEntry, include_operational: bool) -> DirectoryEntry {
    if include_operational {
        return entry.clone();
    }
    let mut projected = DirectoryEntry::new(entry.dn());
    for name in entry.attribute_names() {
        if OPERATIONAL_ATTRIBUTES.contains(&name) {
            continue;
        }
        for value in entry.values(name) {
            projected.push(name, value.clone());
        }
    }
    projected
}

/// Evaluate a filter against an entry.
pub fn matches(entry: &DirectoryEntry, filter: &Filter) -> bool {
    match filter {
        Filter::Equals { attribute, value } => entry
            .values(attribute)
            .iter()
            .any(|v| v.to_lowercase() == value.to_lowercase()),
        Filter::Like { attribute, pattern } => entry
            .values(attribute)
            .iter()
            .any(|v| wildcard_match(&pattern.to_lowercase(), &v.to_lowercase())),
        Filter::EndsWith { attribute, value } => {
            let suffix = value.to_lowercase();
            entry
                .values(attribute)
                .iter()
                .any(|v| v.to_lowercase().ends_with(&suffix))
        }
        Filter::GreaterOrEqual { attribute, value } => entry
            .values(attribute)
            .iter()
            .any(|v| v.as_str() >= value.as_str()),
        Filter::Present { attribute } => {
            attribute.eq_ignore_ascii_case(attrs::OBJECT_CLASS) || entry.has(attribute)
        }
        Filter::And { filters } => filters.iter().all(|f| matches(entry, f)),
        Filter::Or { filters } => filters.iter().any(|f| matches(entry, f)),
    }
}

fn wildcard_match(pattern: &str, value: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == value;
    }

    let (first, rest) = (parts[0], &parts[1..]);
    let Some(mut remaining) = value.strip_prefix(first) else {
        return false;
    };
    let (last, middle) = rest.split_last().map_or(("", &[][..]), |(l, m)| (*l, m));

    for part in middle {
        if part.is_empty() {
            continue;
        }
        match remaining.find(part) {
            Some(idx) => remaining = &remaining[idx + part.len()..],
            None => return false,
        }
    }
    remaining.len() >= last.len() && remaining.ends_with(last)
}

/// A small directory shaped like the LHM tree, for tests and local runs.
pub mod sample {
    use super::InMemoryDirectory;
    use crate::error::DirectoryResult;
    use crate::port::DirectoryEntry;

    pub const USER_BASE: &str = "o=users,dc=example,dc=org";
    pub const OU_BASE: &str = "o=oubase,dc=example,dc=org";
    pub const RBS_DN: &str = "ou=Referat für Bildung und Sport,o=oubase,dc=example,dc=org";
    pub const ABT_1_DN: &str =
        "ou=Abteilung 1,ou=Referat für Bildung und Sport,o=oubase,dc=example,dc=org";
    pub const ABT_2_DN: &str =
        "ou=Abteilung 2,ou=Referat für Bildung und Sport,o=oubase,dc=example,dc=org";

    const CREATED: &str = "20240101080000Z";

    fn ou_entry(dn: &str, object_id: &str, ou: &str, short_name: &str) -> DirectoryEntry {
        DirectoryEntry::new(dn)
            .with("objectClass", "organizationalUnit")
            .with("objectClass", "lhmOrganizationalUnit")
            .with("lhmObjectId", object_id)
            .with("ou", ou)
            .with("lhmOUShortname", short_name)
            .with("modifyTimestamp", CREATED)
    }

    fn person_entry(
        uid: &str,
        object_id: &str,
        (given, sn): (&str, &str),
        path: &str,
        modified: &str,
    ) -> DirectoryEntry {
        DirectoryEntry::new(format!("uid={uid},{USER_BASE}"))
            .with("objectClass", "inetOrgPerson")
            .with("objectClass", "person")
            .with("objectClass", "lhmPerson")
            .with("uid", uid)
            .with("lhmObjectId", object_id)
            .with("givenName", given)
            .with("sn", sn)
            .with("cn", format!("{given} {sn}"))
            .with("ou", "RBS")
            .with("lhmObjectPath", path)
            .with("mail", format!("{uid}@example.org"))
            .with("modifyTimestamp", modified)
    }

    /// Entries of the sample directory in insertion order.
    pub fn entries() -> Vec<DirectoryEntry> {
        let mut entries = vec![
            DirectoryEntry::new("dc=example,dc=org")
                .with("objectClass", "dcObject")
                .with("dc", "example"),
            DirectoryEntry::new(USER_BASE)
                .with("objectClass", "organization")
                .with("o", "users"),
            ou_entry(OU_BASE, "342", "LHM", "LHM"),
            ou_entry(RBS_DN, "30001", "Referat für Bildung und Sport", "RBS"),
            ou_entry(ABT_1_DN, "30002", "Abteilung 1", "RBS-A-1")
                .with("mail", "rbs.a1@example.org")
                .with("lhmOUManager", "maxi.mustermann")
                .with("lhmOU2ndManager", "petra.mustermann"),
            ou_entry(ABT_2_DN, "30003", "Abteilung 2", "RBS-A-2")
                .with("mail", "rbs.a2@example.org")
                .with("facsimileTelephoneNumber", "123123")
                .with("lhmOUKey", "09707139")
                .with("lhmOULongname", "Referat, Abteilung 2")
                .with("postalCode", "80331")
                .with("street", "Bayerstraße 28%%Eingang B"),
        ];

        entries.push(
            person_entry("maxi.mustermann", "20011", ("Maxi", "Mustermann"), ABT_1_DN, CREATED)
                .with("lhmTitle", "Frau")
                .with("telephoneNumber", "+49 89 233-1")
                .with("l", "München"),
        );
        entries.push(person_entry(
            "petra.mustermann",
            "20012",
            ("Petra", "Mustermann"),
            ABT_1_DN,
            CREATED,
        ));
        entries.push(
            person_entry("peter.lustig", "20013", ("Peter", "Lustig"), RBS_DN, "20240226090000Z")
                .with("lhmObjectReference", "30003")
                .with("lhmRankInOu", "01"),
        );
        entries.push(
            person_entry("petra.lustig", "20014", ("Petra", "Lustig"), ABT_2_DN, CREATED)
                .with("lhmObjectReference", "30003")
                .with("lhmRankInOu", "03"),
        );
        entries.push(person_entry("john.doe", "99999", ("John", "Doe"), ABT_1_DN, CREATED));

        // Person without object id.
        entries.push(
            DirectoryEntry::new(format!("uid=legacy.user,{USER_BASE}"))
                .with("objectClass", "person")
                .with("objectClass", "lhmPerson")
                .with("uid", "legacy.user")
                .with("cn", "Legacy User")
                .with("ou", "RBS")
                .with("lhmObjectPath", ABT_1_DN),
        );
        // Technical account, not an lhmPerson.
        entries.push(
            DirectoryEntry::new(format!("uid=svc.mustermann,{USER_BASE}"))
                .with("objectClass", "person")
                .with("uid", "svc.mustermann")
                .with("lhmObjectId", "20099")
                .with("cn", "Service Mustermann")
                .with("ou", "RBS"),
        );
        // OU mirror entries in the user tree, looked up by cn.
        entries.push(
            DirectoryEntry::new(format!("cn=RBS-A-1,{USER_BASE}"))
                .with("objectClass", "organizationalRole")
                .with("cn", "RBS-A-1")
                .with("lhmObjectPath", ABT_1_DN),
        );
        entries.push(
            DirectoryEntry::new(format!("cn=RBS-A-2,{USER_BASE}"))
                .with("objectClass", "organizationalRole")
                .with("cn", "RBS-A-2")
                .with("lhmObjectPath", ABT_2_DN),
        );
        entries
    }

    /// The sample directory.
    pub fn directory() -> DirectoryResult<InMemoryDirectory> {
        InMemoryDirectory::with_entries(entries())
    }
}
