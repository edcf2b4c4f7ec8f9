//! `/people` endpoints.

use futures_core::Stream;
use serde::{Deserialize, Serialize};

use crate::api_child::ApiChild;
use crate::error::SdkError;
use crate::params::QueryParams;
use crate::safe_enum;
use crate::session::RestSession;

safe_enum! {
    pub enum PhoneNumberType {
        Work => "work",
        WorkExtension => "work_extension",
        Mobile => "mobile",
        Fax => "fax",
    }
}

safe_enum! {
    /// Presence as reported by the people API. `"unknown"` comes through as
    /// `Unknown("unknown")`.
    pub enum PeopleStatus {
        Active => "active",
        Call => "call",
        DoNotDisturb => "DoNotDisturb",
        Inactive => "inactive",
        Meeting => "meeting",
        OutOfOffice => "OutOfOffice",
        Pending => "pending",
        Presenting => "presenting",
    }
}

safe_enum! {
    pub enum PersonType {
        Person => "person",
        Bot => "bot",
        AppUser => "appuser",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub number_type: Option<PhoneNumberType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SipAddress {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub sip_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emails: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_numbers: Option<Vec<PhoneNumber>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sip_addresses: Option<Vec<SipAddress>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nick_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub licenses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PeopleStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_pending: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_enabled: Option<bool>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub person_type: Option<PersonType>,
}

/// Filters for [`PeopleApi::list`].
#[derive(Debug, Clone, Default)]
pub struct ListPeople {
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// Comma-separated person ids.
    pub id: Option<String>,
    pub org_id: Option<String>,
    pub roles: Option<String>,
    pub location_id: Option<String>,
    pub calling_data: bool,
    /// Page size requested from the server.
    pub max: Option<u32>,
}

impl ListPeople {
    fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .opt("email", self.email.as_deref())
            .opt("displayName", self.display_name.as_deref())
            .opt("id", self.id.as_deref())
            .opt("orgId", self.org_id.as_deref())
            .opt("roles", self.roles.as_deref())
            .opt("locationId", self.location_id.as_deref())
            .flag("callingData", self.calling_data)
            .opt("max", self.max)
    }
}

#[derive(Clone, Debug)]
pub struct PeopleApi {
    child: ApiChild,
}

impl PeopleApi {
    #[must_use]
    pub fn new(session: RestSession) -> Self {
        Self {
            child: ApiChild::new(session, "people"),
        }
    }

    /// All people matching the filters, across pages.
    pub fn list(
        &self,
        filter: &ListPeople,
    ) -> impl Stream<Item = Result<Person, SdkError>> + Send + use<> {
        self.child.session().follow_pagination(
            &self.child.ep(None),
            Some(filter.to_params()),
            Some("items"),
        )
    }

    /// # Errors
    /// See [`SdkError`].
    pub async fn details(&self, person_id: &str, calling_data: bool) -> Result<Person, SdkError> {
        let params = QueryParams::new().flag("callingData", calling_data);
        self.child
            .session()
            .get_json(&self.child.ep(Some(person_id)), Some(&params))
            .await
    }

    /// The authenticated user.
    ///
    /// # Errors
    /// See [`SdkError`].
    pub async fn me(&self, calling_data: bool) -> Result<Person, SdkError> {
        self.details("me", calling_data).await
    }

    /// # Errors
    /// See [`SdkError`].
    pub async fn create(&self, settings: &Person, calling_data: bool) -> Result<Person, SdkError> {
        let params = QueryParams::new().flag("callingData", calling_data);
        self.child
            .session()
            .post_json(&self.child.ep(None), Some(&params), settings)
            .await
    }

    /// Replaces the person's settings; fields left `None` are not sent.
    ///
    /// # Errors
    /// See [`SdkError`].
    pub async fn update(
        &self,
        person_id: &str,
        settings: &Person,
        calling_data: bool,
        show_all_types: bool,
    ) -> Result<Person, SdkError> {
        let params = QueryParams::new()
            .flag("callingData", calling_data)
            .flag("showAllTypes", show_all_types);
        self.child
            .session()
            .put_json(&self.child.ep(Some(person_id)), Some(&params), settings)
            .await
    }

    /// # Errors
    /// See [`SdkError`].
    pub async fn delete(&self, person_id: &str) -> Result<(), SdkError> {
        self.child
            .session()
            .delete(&self.child.ep(Some(person_id)), None)
            .await?;
        Ok(())
    }
}
