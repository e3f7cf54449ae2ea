//! Organizations: the top-level scope that owns workspaces.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::client::GristClient;
use crate::documents::Document;
use crate::error::Result;
use crate::http::Method;
use crate::omit::{is_false, is_zero};
use crate::request::GristRequest;

/// Organization id: either the numeric id or a domain such as `current`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(pub String);

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrgId {
    fn from(id: &str) -> Self {
        OrgId(id.to_string())
    }
}

impl From<String> for OrgId {
    fn from(id: String) -> Self {
        OrgId(id)
    }
}

impl From<u64> for OrgId {
    fn from(id: u64) -> Self {
        OrgId(id.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Org {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_account: Option<BillingAccount>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_support_workspace: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub public: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<Document>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub org_domain: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub picture: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OwnerOptions>,
    #[serde(default, rename = "ref", skip_serializing_if = "String::is_empty")]
    pub reference: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub locale: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingAccount {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub individual: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub in_good_standing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_options: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Features>,
}

/// Plan limits attached to a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    #[serde(default, skip_serializing_if = "is_false")]
    pub workspaces: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_shares_per_workspace: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_shares_per_doc: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_window: Option<SnapshotWindow>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub base_max_rows_per_document: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub base_max_api_units_per_document_per_day: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub base_max_data_size_per_document: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub base_max_attachments_bytes_per_document: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub grace_period_days: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub base_max_assistant_calls: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotWindow {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub count: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub unit: String,
}

impl GristClient {
    /// All organizations visible to the current token.
    pub fn list_orgs(&self) -> Result<Vec<u8>> {
        self.send(GristRequest::new(Method::Get, "/api/orgs"))
    }

    pub fn get_org(&self, id: &OrgId) -> Result<Vec<u8>> {
        self.send(GristRequest::new(Method::Get, format!("/api/orgs/{id}")))
    }

    /// Workspaces of an organization, each with its documents.
    pub fn get_org_workspaces(&self, id: &OrgId) -> Result<Vec<u8>> {
        self.send(GristRequest::new(
            Method::Get,
            format!("/api/orgs/{id}/workspaces"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn org_id_from_number_and_domain() {
        assert_eq!(OrgId::from(42).to_string(), "42");
        assert_eq!(OrgId::from("current").to_string(), "current");
    }

    #[test]
    fn org_decodes_remote_shape() {
        let raw = r#"{
            "id": 2,
            "name": "Example",
            "domain": "example",
            "host": null,
            "owner": {"id": 1, "name": "Owner", "ref": "abc", "options": {"locale": "en"}},
            "billingAccount": {"id": 3, "inGoodStanding": true, "status": {"x": 1},
                "product": {"id": 4, "name": "team", "features": {"workspaces": true,
                    "snapshotWindow": {"count": 30, "unit": "days"}}}},
            "access": "owners"
        }"#;
        let org: Org = serde_json::from_str(raw).unwrap();
        assert_eq!(org.id, 2);
        assert!(org.host.is_none());
        assert_eq!(org.owner.as_ref().unwrap().reference, "abc");
        let billing = org.billing_account.as_ref().unwrap();
        assert!(billing.in_good_standing);
        assert_eq!(billing.status, Some(serde_json::json!({"x": 1})));
        let features = billing.product.as_ref().unwrap().features.as_ref().unwrap();
        assert_eq!(features.snapshot_window.as_ref().unwrap().count, 30);
    }

    #[test]
    fn empty_org_serializes_to_empty_object() {
        let json = serde_json::to_string(&Org::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
