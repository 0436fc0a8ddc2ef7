//! Attribute mapper
//!
//! Turns raw directory attributes into records. Mapping never fails: an
//! attribute that is absent or cannot be read leaves its field empty.

use tracing::debug;

use crate::error::AttributeError;
use crate::model::{Address, BaseUser, OuSearchResult, User};
use crate::port::DirectoryEntry;

/// Directory attribute names.
pub mod attrs {
    pub const OBJECT_CLASS: &str = "objectClass";
    pub const OBJECT_ID: &str = "lhmObjectId";
    pub const UID: &str = "uid";
    pub const SALUTATION: &str = "lhmTitle";
    pub const GIVEN_NAME: &str = "givenName";
    pub const SURNAME: &str = "sn";
    pub const COMMON_NAME: &str = "cn";
    pub const OU: &str = "ou";
    pub const OBJECT_REFERENCE: &str = "lhmObjectReference";
    pub const RANK_IN_OU: &str = "lhmRankInOu";
    pub const MODIFY_TIMESTAMP: &str = "modifyTimestamp";

    pub const OU_LONG_NAME: &str = "lhmOULongname";
    pub const OBJECT_PATH: &str = "lhmObjectPath";
    pub const PARENT_ORG: &str = "lhmOberOrga";
    pub const DEPARTMENT_NAME: &str = "lhmReferatName";
    pub const FUNCTIONAL_TITLE: &str = "lhmFunctionalTitle";
    pub const TITLE: &str = "title";
    pub const WORK_HOURS: &str = "lhmWorkHours";
    pub const MAIL: &str = "mail";
    pub const ORG_MAIL: &str = "lhmOrgaMail";
    pub const PHONE: &str = "telephoneNumber";
    pub const FAX: &str = "facsimileTelephoneNumber";
    pub const MOBILE: &str = "mobile";
    pub const ROOM: &str = "roomNumber";
    pub const PERSONAL_TITLE: &str = "personalTitle";
    pub const CITY: &str = "l";
    pub const POSTAL_CODE: &str = "postalCode";
    pub const STREET: &str = "street";
    pub const OFFICE_CITY: &str = "lhmOfficeLocalityName";
    pub const OFFICE_POSTAL_CODE: &str = "lhmOfficePostalCode";
    pub const OFFICE_STREET: &str = "lhmOfficeStreetAddress";

    pub const OU_KEY: &str = "lhmOUKey";
    pub const OU_SHORT_NAME: &str = "lhmOUShortname";
    pub const OU_MANAGER: &str = "lhmOUManager";
    pub const OU_SECOND_MANAGER: &str = "lhmOU2ndManager";
}

/// Object class values.
pub mod classes {
    pub const PERSON: &str = "person";
    pub const LHM_PERSON: &str = "lhmPerson";
    pub const ORGANIZATIONAL_UNIT: &str = "lhmOrganizationalUnit";
}

/// Read access to the attributes of one directory entry.
pub trait AttributeSource {
    /// Read the value of `name`. `Ok(None)` means the attribute is absent.
    fn try_get(&self, name: &str) -> Result<Option<String>, AttributeError>;
}

impl AttributeSource for DirectoryEntry {
    fn try_get(&self, name: &str) -> Result<Option<String>, AttributeError> {
        if let Some(first) = self.values(name).first() {
            return Ok(Some(first.clone()));
        }
        if self.is_binary_only(name) {
            return Err(AttributeError::NotUtf8 {
                attribute: name.to_string(),
            });
        }
        Ok(None)
    }
}

/// Read an attribute, treating access failures as absence.
///
/// Each `%%` in the value is replaced by a line break.
pub fn safely_get<S: AttributeSource + ?Sized>(source: &S, name: &str) -> Option<String> {
    match source.try_get(name) {
        Ok(value) => value.map(|v| v.replace("%%", "\n")),
        Err(e) => {
            debug!(attribute = %name, error = %e, "Attribute not readable, treating as absent");
            None
        }
    }
}

/// Map the identity attributes of a person.
pub fn map_base_user<S: AttributeSource + ?Sized>(source: &S) -> BaseUser {
    BaseUser {
        object_id: safely_get(source, attrs::OBJECT_ID),
        uid: safely_get(source, attrs::UID),
        salutation: safely_get(source, attrs::SALUTATION),
        given_name: safely_get(source, attrs::GIVEN_NAME),
        surname: safely_get(source, attrs::SURNAME),
        common_name: safely_get(source, attrs::COMMON_NAME),
        ou_short_code: safely_get(source, attrs::OU),
        object_reference: safely_get(source, attrs::OBJECT_REFERENCE),
    }
}

/// Map a full person record.
pub fn map_user<S: AttributeSource + ?Sized>(source: &S) -> User {
    User {
        base: map_base_user(source),
        ou_long_name: safely_get(source, attrs::OU_LONG_NAME),
        object_path: safely_get(source, attrs::OBJECT_PATH),
        parent_org_name: safely_get(source, attrs::PARENT_ORG),
        department_short_name: safely_get(source, attrs::DEPARTMENT_NAME),
        functional_title: safely_get(source, attrs::FUNCTIONAL_TITLE),
        official_title: safely_get(source, attrs::TITLE),
        availability: safely_get(source, attrs::WORK_HOURS),
        mail: safely_get(source, attrs::MAIL),
        org_mail: safely_get(source, attrs::ORG_MAIL),
        phone: safely_get(source, attrs::PHONE),
        fax: safely_get(source, attrs::FAX),
        mobile: safely_get(source, attrs::MOBILE),
        room: safely_get(source, attrs::ROOM),
        academic_title: safely_get(source, attrs::PERSONAL_TITLE),
        postal_address: Address {
            city: safely_get(source, attrs::CITY),
            postal_code: safely_get(source, attrs::POSTAL_CODE),
            street: safely_get(source, attrs::STREET),
        },
        office_address: Address {
            city: safely_get(source, attrs::OFFICE_CITY),
            postal_code: safely_get(source, attrs::OFFICE_POSTAL_CODE),
            street: safely_get(source, attrs::OFFICE_STREET),
        },
        modify_timestamp: safely_get(source, attrs::MODIFY_TIMESTAMP),
    }
}

/// Map an OU record.
pub fn map_ou<S: AttributeSource + ?Sized>(source: &S) -> OuSearchResult {
    OuSearchResult {
        object_id: safely_get(source, attrs::OBJECT_ID),
        ou_short_code: safely_get(source, attrs::OU),
        ou_key: safely_get(source, attrs::OU_KEY),
        ou_long_name: safely_get(source, attrs::OU_LONG_NAME),
        ou_short_name: safely_get(source, attrs::OU_SHORT_NAME),
        postal_code: safely_get(source, attrs::POSTAL_CODE),
        street: safely_get(source, attrs::STREET),
        mail: safely_get(source, attrs::MAIL),
        phone: safely_get(source, attrs::PHONE),
        fax: safely_get(source, attrs::FAX),
        manager_uid: safely_get(source, attrs::OU_MANAGER),
        second_manager_uid: safely_get(source, attrs::OU_SECOND_MANAGER),
        modify_timestamp: safely_get(source, attrs::MODIFY_TIMESTAMP),
    }
}

/// The object path (`lhmObjectPath`) of a person.
pub fn map_object_path<S: AttributeSource + ?Sized>(source: &S) -> Option<String> {
    safely_get(source, attrs::OBJECT_PATH)
}

/// The canonical short code (`lhmOUShortname`) of an OU.
pub fn map_ou_short_name<S: AttributeSource + ?Sized>(source: &S) -> Option<String> {
    safely_get(source, attrs::OU_SHORT_NAME)
}
