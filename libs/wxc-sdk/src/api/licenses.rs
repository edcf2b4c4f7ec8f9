//! `/licenses` endpoints.

use futures_core::Stream;
use serde::{Deserialize, Serialize};

use crate::api_child::ApiChild;
use crate::error::SdkError;
use crate::params::QueryParams;
use crate::safe_enum;
use crate::session::RestSession;

safe_enum! {
    pub enum SiteType {
        ControlHub => "Control Hub managed site",
        Linked => "Linked site",
        Edu => "Edu site",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_units: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_units: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_by_users: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_by_workspaces: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_type: Option<SiteType>,
}

#[derive(Clone, Debug)]
pub struct LicensesApi {
    child: ApiChild,
}

impl LicensesApi {
    #[must_use]
    pub fn new(session: RestSession) -> Self {
        Self {
            child: ApiChild::new(session, "licenses"),
        }
    }

    pub fn list(
        &self,
        org_id: Option<&str>,
    ) -> impl Stream<Item = Result<License, SdkError>> + Send + use<> {
        let params = QueryParams::new().opt("orgId", org_id);
        self.child
            .session()
            .follow_pagination(&self.child.ep(None), Some(params), Some("items"))
    }

    /// # Errors
    /// See [`SdkError`].
    pub async fn details(&self, license_id: &str) -> Result<License, SdkError> {
        self.child
            .session()
            .get_json(&self.child.ep(Some(license_id)), None)
            .await
    }
}
