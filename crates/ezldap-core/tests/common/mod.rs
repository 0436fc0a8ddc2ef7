//! Shared fixtures for ezldap-core integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use ezldap_core::memory::sample;
use ezldap_core::{InMemoryDirectory, LdapService};

pub use sample::{ABT_1_DN, ABT_2_DN, OU_BASE, RBS_DN, USER_BASE};

/// The sample directory together with an engine on top of it.
pub struct TestFixture {
    pub directory: Arc<InMemoryDirectory>,
    pub service: LdapService,
}

impl TestFixture {
    pub fn new() -> Self {
        let directory = Arc::new(sample::directory().expect("sample directory is valid"));
        let service = LdapService::new(directory.clone(), USER_BASE, OU_BASE);
        Self { directory, service }
    }

    /// Fixture over the given entries instead of the sample directory.
    pub fn with_entries(entries: Vec<ezldap_core::DirectoryEntry>) -> Self {
        let directory =
            Arc::new(InMemoryDirectory::with_entries(entries).expect("entries are valid"));
        let service = LdapService::new(directory.clone(), USER_BASE, OU_BASE);
        Self { directory, service }
    }
}

/// Uids of a list of records, sorted.
pub fn sorted_uids<'a, T, I>(records: I) -> Vec<String>
where
    T: AsRef<ezldap_core::BaseUser> + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut uids: Vec<String> = records
        .into_iter()
        .filter_map(|r| r.as_ref().uid.clone())
        .collect();
    uids.sort();
    uids
}
