//! Directory Query Port
//!
//! The abstraction the resolution engine uses to run directory searches.
//! Implementations (the LDAP connector, the in-memory directory) return raw
//! [`DirectoryEntry`] values; turning them into records is the caller's job
//! and happens through [`search_mapped`].

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{DirectoryError, DirectoryResult};

/// Search scope relative to the search base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Only the base entry itself.
    Object,
    /// Direct children of the base entry.
    OneLevel,
    /// The base entry and all of its descendants.
    Subtree,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Object => write!(f, "object"),
            Scope::OneLevel => write!(f, "one_level"),
            Scope::Subtree => write!(f, "subtree"),
        }
    }
}

/// Search filter predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// Match entries where attribute equals value.
    Equals { attribute: String, value: String },

    /// Match entries where attribute matches a pattern using the directory's
    /// native `*` wildcard. The pattern is passed through verbatim.
    Like { attribute: String, pattern: String },

    /// Match entries where attribute ends with value.
    EndsWith { attribute: String, value: String },

    /// Match entries where attribute is greater than or equal to value.
    GreaterOrEqual { attribute: String, value: String },

    /// Match entries where attribute exists (has any value).
    Present { attribute: String },

    /// Logical AND of multiple filters.
    And { filters: Vec<Filter> },

    /// Logical OR of multiple filters.
    Or { filters: Vec<Filter> },
}

impl Filter {
    /// Create an equals filter.
    pub fn eq(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a wildcard filter.
    pub fn like(attribute: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::Like {
            attribute: attribute.into(),
            pattern: pattern.into(),
        }
    }

    /// Create an ends-with filter.
    pub fn ends_with(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::EndsWith {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a greater-or-equal filter.
    pub fn gte(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::GreaterOrEqual {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a present (attribute exists) filter.
    pub fn present(attribute: impl Into<String>) -> Self {
        Filter::Present {
            attribute: attribute.into(),
        }
    }

    /// Create an AND filter.
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And { filters }
    }

    /// Create an OR filter.
    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or { filters }
    }
}

/// A single search against the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Search base (a DN).
    pub base: String,
    /// Filter predicate.
    pub filter: Filter,
    /// Search scope.
    pub scope: Scope,
    /// Maximum number of entries to return. `None` means unconstrained.
    pub count_limit: Option<u32>,
    /// Fail with [`DirectoryError::SizeLimitExceeded`] instead of truncating
    /// when more entries match than `count_limit`.
    pub unique: bool,
    /// Attributes to return. Empty means all user attributes.
    pub attributes: Vec<String>,
}

impl SearchRequest {
    /// Create a subtree search without count limit.
    pub fn new(base: impl Into<String>, filter: Filter) -> Self {
        Self {
            base: base.into(),
            filter,
            scope: Scope::Subtree,
            count_limit: None,
            unique: false,
            attributes: Vec::new(),
        }
    }

    /// Set the scope.
    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the count limit.
    #[must_use]
    pub fn with_count_limit(mut self, limit: u32) -> Self {
        self.count_limit = Some(limit);
        self
    }

    /// Expect at most one match.
    ///
    /// The port searches with a count limit of 1 and reports a second match
    /// as [`DirectoryError::SizeLimitExceeded`].
    #[must_use]
    pub fn expect_unique(mut self) -> Self {
        self.count_limit = Some(1);
        self.unique = true;
        self
    }

    /// Request specific attributes.
    #[must_use]
    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

/// Raw directory entry as returned by a search.
///
/// Attribute names are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    dn: String,
    attrs: HashMap<String, Vec<String>>,
    bin_attrs: HashMap<String, Vec<Vec<u8>>>,
}

impl DirectoryEntry {
    /// Create an entry with no attributes.
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: HashMap::new(),
            bin_attrs: HashMap::new(),
        }
    }

    /// Add a value to a string attribute (builder style).
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// Add a value to a binary attribute (builder style).
    #[must_use]
    pub fn with_binary(mut self, name: &str, value: Vec<u8>) -> Self {
        self.bin_attrs
            .entry(name.to_lowercase())
            .or_default()
            .push(value);
        self
    }

    /// Add a value to a string attribute.
    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        self.attrs
            .entry(name.to_lowercase())
            .or_default()
            .push(value.into());
    }

    /// The entry's distinguished name.
    pub fn dn(&self) -> &str {
        &self.dn
    }

    /// All string values of an attribute (empty if absent).
    pub fn values(&self, name: &str) -> &[String] {
        self.attrs
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the attribute is present, in string or binary form.
    pub fn has(&self, name: &str) -> bool {
        let key = name.to_lowercase();
        self.attrs.get(&key).is_some_and(|v| !v.is_empty())
            || self.bin_attrs.get(&key).is_some_and(|v| !v.is_empty())
    }

    /// Whether the attribute only exists with binary values.
    pub fn is_binary_only(&self, name: &str) -> bool {
        let key = name.to_lowercase();
        !self.attrs.contains_key(&key) && self.bin_attrs.get(&key).is_some_and(|v| !v.is_empty())
    }

    /// Names of all string attributes (lower-cased).
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attrs.keys().map(String::as_str)
    }
}

/// Port through which the engine queries the directory.
///
/// Implementations must be safe for concurrent use by multiple in-flight
/// resolution calls. A search whose base does not exist must fail with
/// [`DirectoryError::NameNotFound`]; a search that simply matches nothing
/// returns an empty vector.
#[async_trait]
pub trait DirectoryQueryPort: Send + Sync {
    /// Execute a search and return the raw entries in directory order.
    async fn search(&self, request: SearchRequest) -> DirectoryResult<Vec<DirectoryEntry>>;
}

/// Execute a search and map every entry with the caller-supplied mapper.
pub async fn search_mapped<R, F>(
    port: &dyn DirectoryQueryPort,
    request: SearchRequest,
    mapper: F,
) -> Result<Vec<R>, DirectoryError>
where
    F: Fn(&DirectoryEntry) -> R,
{
    let entries = port.search(request).await?;
    Ok(entries.iter().map(mapper).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_attribute_names_are_case_insensitive() {
        let entry = DirectoryEntry::new("uid=a,o=users")
            .with("lhmObjectId", "1")
            .with("UID", "a");
        assert_eq!(entry.values("LHMOBJECTID"), ["1".to_string()]);
        assert_eq!(entry.values("uid"), ["a".to_string()]);
        assert!(entry.has("lhmobjectid"));
        assert!(!entry.has("mail"));
    }

    #[test]
    fn test_entry_multi_values_keep_order() {
        let entry = DirectoryEntry::new("cn=x")
            .with("objectClass", "person")
            .with("objectClass", "lhmPerson");
        assert_eq!(entry.values("objectclass").len(), 2);
        assert_eq!(entry.values("objectclass")[0], "person");
    }

    #[test]
    fn test_binary_only_attribute() {
        let entry = DirectoryEntry::new("cn=x").with_binary("jpegPhoto", vec![0xff, 0xd8]);
        assert!(entry.has("jpegPhoto"));
        assert!(entry.is_binary_only("jpegphoto"));
        assert!(entry.values("jpegPhoto").is_empty());
    }

    #[test]
    fn test_search_request_builder() {
        let request = SearchRequest::new("o=users", Filter::present("uid"))
            .with_scope(Scope::Object)
            .with_count_limit(1)
            .with_attributes(["*", "modifyTimestamp"]);
        assert_eq!(request.scope, Scope::Object);
        assert_eq!(request.count_limit, Some(1));
        assert_eq!(request.attributes, vec!["*", "modifyTimestamp"]);
        assert!(!request.unique);

        let request = SearchRequest::new("o=users", Filter::present("uid")).expect_unique();
        assert_eq!(request.count_limit, Some(1));
        assert!(request.unique);
    }

    #[test]
    fn test_filter_serialization() {
        let filter = Filter::and(vec![Filter::eq("uid", "a"), Filter::present("mail")]);
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["type"], "and");
        assert_eq!(json["filters"][0]["type"], "equals");
        assert_eq!(json["filters"][1]["attribute"], "mail");
    }
}
