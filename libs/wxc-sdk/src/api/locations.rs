//! `/locations` endpoints.

use futures_core::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api_child::ApiChild;
use crate::error::SdkError;
use crate::params::QueryParams;
use crate::session::RestSession;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announcement_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<LocationAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LocationsApi {
    child: ApiChild,
}

impl LocationsApi {
    #[must_use]
    pub fn new(session: RestSession) -> Self {
        Self {
            child: ApiChild::new(session, "locations"),
        }
    }

    pub fn list(
        &self,
        name: Option<&str>,
        id: Option<&str>,
        org_id: Option<&str>,
        max: Option<u32>,
    ) -> impl Stream<Item = Result<Location, SdkError>> + Send + use<> {
        let params = QueryParams::new()
            .opt("name", name)
            .opt("id", id)
            .opt("orgId", org_id)
            .opt("max", max);
        self.child
            .session()
            .follow_pagination(&self.child.ep(None), Some(params), Some("items"))
    }

    /// # Errors
    /// See [`SdkError`].
    pub async fn details(
        &self,
        location_id: &str,
        org_id: Option<&str>,
    ) -> Result<Location, SdkError> {
        let params = QueryParams::new().opt("orgId", org_id);
        self.child
            .session()
            .get_json(&self.child.ep(Some(location_id)), Some(&params))
            .await
    }

    /// Creates a location and returns its id.
    ///
    /// # Errors
    /// See [`SdkError`]; [`SdkError::Validation`] when the answer carries
    /// no id.
    pub async fn create(
        &self,
        settings: &Location,
        org_id: Option<&str>,
    ) -> Result<String, SdkError> {
        let params = QueryParams::new().opt("orgId", org_id);
        let created: CreatedId = self
            .child
            .session()
            .post_json(&self.child.ep(None), Some(&params), settings)
            .await?;
        Ok(created.id)
    }

    /// # Errors
    /// See [`SdkError`].
    pub async fn update(
        &self,
        location_id: &str,
        settings: &Location,
        org_id: Option<&str>,
    ) -> Result<(), SdkError> {
        let params = QueryParams::new().opt("orgId", org_id);
        let _: Value = self
            .child
            .session()
            .put_json(&self.child.ep(Some(location_id)), Some(&params), settings)
            .await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct CreatedId {
    id: String,
}
