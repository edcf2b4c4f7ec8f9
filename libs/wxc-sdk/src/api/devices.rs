//! `/devices` endpoints.

use futures_core::Stream;
use serde::{Deserialize, Serialize};

use crate::api_child::ApiChild;
use crate::error::SdkError;
use crate::params::QueryParams;
use crate::safe_enum;
use crate::session::RestSession;

safe_enum! {
    pub enum ConnectionStatus {
        Connected => "connected",
        Disconnected => "disconnected",
        ConnectedWithIssues => "connected_with_issues",
        OfflineExpired => "offline_expired",
        Activating => "activating",
        OfflineDeepSleep => "offline_deep_sleep",
    }
}

safe_enum! {
    pub enum ActivationState {
        Activating => "activating",
        Activated => "activated",
        Deactivated => "deactivated",
    }
}

safe_enum! {
    pub enum ProductType {
        Phone => "phone",
        RoomDesk => "roomdesk",
        Accessory => "accessory",
        Camera => "camera",
    }
}

/// Activation and connectivity fields shared by device records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceActivationStates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation_state: Option<ActivationState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_status: Option<ConnectionStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    #[serde(flatten)]
    pub states: DeviceActivationStates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<ProductType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_sip_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sip_urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_codes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
}

/// Answer of [`DevicesApi::activation_code`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationCode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_time: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivationCodeRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    workspace_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    person_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

/// Filters for [`DevicesApi::list`].
#[derive(Debug, Clone, Default)]
pub struct ListDevices {
    pub person_id: Option<String>,
    pub workspace_id: Option<String>,
    pub location_id: Option<String>,
    pub display_name: Option<String>,
    pub product: Option<String>,
    pub product_type: Option<ProductType>,
    pub tag: Option<String>,
    pub connection_status: Option<ConnectionStatus>,
    pub serial: Option<String>,
    pub software: Option<String>,
    pub upgrade_channel: Option<String>,
    pub error_code: Option<String>,
    pub capability: Option<String>,
    pub permission: Option<String>,
    pub mac: Option<String>,
    pub org_id: Option<String>,
    pub max: Option<u32>,
}

impl ListDevices {
    fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .opt("personId", self.person_id.as_deref())
            .opt("workspaceId", self.workspace_id.as_deref())
            .opt("locationId", self.location_id.as_deref())
            .opt("displayName", self.display_name.as_deref())
            .opt("product", self.product.as_deref())
            .opt("productType", self.product_type.as_ref())
            .opt("tag", self.tag.as_deref())
            .opt("connectionStatus", self.connection_status.as_ref())
            .opt("serial", self.serial.as_deref())
            .opt("software", self.software.as_deref())
            .opt("upgradeChannel", self.upgrade_channel.as_deref())
            .opt("errorCode", self.error_code.as_deref())
            .opt("capability", self.capability.as_deref())
            .opt("permission", self.permission.as_deref())
            .opt("mac", self.mac.as_deref())
            .opt("orgId", self.org_id.as_deref())
            .opt("max", self.max)
    }
}

#[derive(Clone, Debug)]
pub struct DevicesApi {
    child: ApiChild,
}

impl DevicesApi {
    #[must_use]
    pub fn new(session: RestSession) -> Self {
        Self {
            child: ApiChild::new(session, "devices"),
        }
    }

    pub fn list(
        &self,
        filter: &ListDevices,
    ) -> impl Stream<Item = Result<Device, SdkError>> + Send + use<> {
        self.child.session().follow_pagination(
            &self.child.ep(None),
            Some(filter.to_params()),
            Some("items"),
        )
    }

    /// # Errors
    /// See [`SdkError`].
    pub async fn details(&self, device_id: &str, org_id: Option<&str>) -> Result<Device, SdkError> {
        let params = QueryParams::new().opt("orgId", org_id);
        self.child
            .session()
            .get_json(&self.child.ep(Some(device_id)), Some(&params))
            .await
    }

    /// Activation code for a new device in a workspace or for a person.
    ///
    /// # Errors
    /// See [`SdkError`].
    pub async fn activation_code(
        &self,
        workspace_id: Option<&str>,
        person_id: Option<&str>,
        model: Option<&str>,
        org_id: Option<&str>,
    ) -> Result<ActivationCode, SdkError> {
        let params = QueryParams::new().opt("orgId", org_id);
        let body = ActivationCodeRequest {
            workspace_id,
            person_id,
            model,
        };
        self.child
            .session()
            .post_json(&self.child.ep(Some("activationCode")), Some(&params), &body)
            .await
    }

    /// # Errors
    /// See [`SdkError`].
    pub async fn delete(&self, device_id: &str, org_id: Option<&str>) -> Result<(), SdkError> {
        let params = QueryParams::new().opt("orgId", org_id);
        self.child
            .session()
            .delete(&self.child.ep(Some(device_id)), Some(&params))
            .await?;
        Ok(())
    }
}
