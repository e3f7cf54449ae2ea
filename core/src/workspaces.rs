//! Workspaces group documents inside an organization.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::GristClient;
use crate::documents::Document;
use crate::error::{Error, Result};
use crate::http::Method;
use crate::omit::is_false;
use crate::orgs::{Org, OrgId, Owner};
use crate::request::GristRequest;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(pub u64);

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for WorkspaceId {
    fn from(id: u64) -> Self {
        WorkspaceId(id)
    }
}

/// Body of a create-workspace request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceName {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<WorkspaceId>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_support_workspace: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<Org>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<Document>,
}

impl GristClient {
    /// Create a workspace named `name` and return its id.
    pub fn create_workspace(&self, org: &OrgId, name: &str) -> Result<WorkspaceId> {
        let payload = WorkspaceName {
            name: name.to_string(),
        };
        let body = self.send_json(Method::Post, format!("/api/orgs/{org}/workspaces"), &payload)?;
        parse_workspace_id(&body)
    }

    pub fn get_workspace(&self, id: WorkspaceId) -> Result<Vec<u8>> {
        self.send(GristRequest::new(Method::Get, format!("/api/workspaces/{id}")))
    }
}

/// The create-workspace response body is a bare integer.
fn parse_workspace_id(body: &[u8]) -> Result<WorkspaceId> {
    let text = String::from_utf8_lossy(body);
    text.trim()
        .parse::<u64>()
        .map(WorkspaceId)
        .map_err(|e| Error::UnexpectedResponse(format!("workspace id {text:?}: {e}")))
}
