//! Directory records
//!
//! Immutable value types produced by the attribute mapper. Every field is
//! optional: the directory carries legacy entries with gaps, and an absent
//! attribute is not an error.

use serde::{Deserialize, Serialize};

/// Minimal person record returned by search operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct BaseUser {
    /// Directory-wide identifier (`lhmObjectId`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,

    /// Login name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    /// Salutation (`lhmTitle`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salutation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,

    /// Display name of the person's OU (`ou`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ou_short_code: Option<String>,

    /// Object id of the OU the person is referenced from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_reference: Option<String>,
}

/// Postal or office address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
}

impl Address {
    /// Whether no address field is set.
    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.postal_code.is_none() && self.street.is_none()
    }
}

/// Full person record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    /// Identity fields shared with [`BaseUser`].
    #[serde(flatten)]
    pub base: BaseUser,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ou_long_name: Option<String>,

    /// DN of the OU the person belongs to (`lhmObjectPath`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_path: Option<String>,

    /// Name of the parent organization (`lhmOberOrga`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_org_name: Option<String>,

    /// Short name of the department (`lhmReferatName`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_short_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub functional_title: Option<String>,

    /// Civil service title (`title`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official_title: Option<String>,

    /// Working hours (`lhmWorkHours`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,

    /// Functional mailbox of the OU (`lhmOrgaMail`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_mail: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fax: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,

    /// Academic title (`personalTitle`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_title: Option<String>,

    #[serde(skip_serializing_if = "Address::is_empty")]
    pub postal_address: Address,

    #[serde(skip_serializing_if = "Address::is_empty")]
    pub office_address: Address,

    /// Operational timestamp, only set when it was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modify_timestamp: Option<String>,
}

impl AsRef<BaseUser> for BaseUser {
    fn as_ref(&self) -> &BaseUser {
        self
    }
}

impl AsRef<BaseUser> for User {
    fn as_ref(&self) -> &BaseUser {
        &self.base
    }
}

impl From<User> for BaseUser {
    fn from(user: User) -> Self {
        user.base
    }
}

/// OU record as returned by a search, including manager references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct OuSearchResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,

    /// Display name (`ou`), e.g. "Abteilung 1".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ou_short_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ou_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ou_long_name: Option<String>,

    /// Canonical short code (`lhmOUShortname`), e.g. "RBS-A-1".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ou_short_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fax: Option<String>,

    /// Uid of the manager (`lhmOUManager`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_uid: Option<String>,

    /// Uid of the deputy manager (`lhmOU2ndManager`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_manager_uid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modify_timestamp: Option<String>,
}

impl OuSearchResult {
    /// Whether a manager-attribute reference is set.
    pub fn has_manager_reference(&self) -> bool {
        self.manager_uid.is_some() || self.second_manager_uid.is_some()
    }
}

/// OU record with resolved leadership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct Ou {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ou_short_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ou_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ou_long_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ou_short_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fax: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modify_timestamp: Option<String>,

    /// Primary manager.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leadership: Option<User>,

    /// Deputy manager.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deputy_leadership: Option<User>,
}

impl Ou {
    /// Build an OU from a search result and its resolved leadership.
    pub fn from_search_result(
        result: OuSearchResult,
        leadership: Option<User>,
        deputy_leadership: Option<User>,
    ) -> Self {
        Self {
            object_id: result.object_id,
            ou_short_code: result.ou_short_code,
            ou_key: result.ou_key,
            ou_long_name: result.ou_long_name,
            ou_short_name: result.ou_short_name,
            postal_code: result.postal_code,
            street: result.street,
            mail: result.mail,
            phone: result.phone,
            fax: result.fax,
            modify_timestamp: result.modify_timestamp,
            leadership,
            deputy_leadership,
        }
    }
}
