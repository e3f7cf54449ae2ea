//! Documents: the workbooks that hold tables.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::GristClient;
use crate::error::{Error, Result};
use crate::http::Method;
use crate::omit::is_zero;
use crate::request::GristRequest;
use crate::workspaces::{Workspace, WorkspaceId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        DocumentId(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        DocumentId(id)
    }
}

/// Body of a create-document request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub name: String,
    pub is_pinned: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trunk_id: Option<serde_json::Value>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<Workspace>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<DocumentAlias>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forks: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAlias {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub org_id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_at: String,
}

impl GristClient {
    /// Create a document in `workspace` and return its id.
    pub fn create_document(
        &self,
        workspace: WorkspaceId,
        name: &str,
        is_pinned: bool,
    ) -> Result<DocumentId> {
        let payload = NewDocument {
            name: name.to_string(),
            is_pinned,
        };
        let path = format!("/api/workspaces/{workspace}/docs");
        let body = self.send_json(Method::Post, path, &payload)?;
        strip_quotes(body)
    }

    pub fn get_document(&self, id: &DocumentId) -> Result<Vec<u8>> {
        self.send(GristRequest::new(Method::Get, format!("/api/docs/{id}")))
    }

    pub fn delete_document(&self, id: &DocumentId) -> Result<Vec<u8>> {
        self.send(GristRequest::new(Method::Delete, format!("/api/docs/{id}")))
    }
}

/// The new id comes back as a JSON string; every `"` is dropped, not only the
/// surrounding pair.
fn strip_quotes(body: Vec<u8>) -> Result<DocumentId> {
    let bytes: Vec<u8> = body.into_iter().filter(|b| *b != b'"').collect();
    String::from_utf8(bytes)
        .map(DocumentId)
        .map_err(|e| Error::UnexpectedResponse(format!("document id is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_surrounding_quotes() {
        assert_eq!(
            strip_quotes(b"\"abc123\"".to_vec()).unwrap(),
            DocumentId::from("abc123")
        );
    }

    #[test]
    fn strips_every_quote() {
        assert_eq!(
            strip_quotes(b"\"a\"b\"".to_vec()).unwrap(),
            DocumentId::from("ab")
        );
    }

    #[test]
    fn new_document_wire_shape() {
        let doc = NewDocument {
            name: "Budget".to_string(),
            is_pinned: false,
        };
        assert_eq!(
            serde_json::to_string(&doc).unwrap(),
            r#"{"name":"Budget","isPinned":false}"#
        );
    }

    #[test]
    fn document_roundtrips_populated_fields() {
        let doc = Document {
            name: "Budget".to_string(),
            created_at: Some("2023-05-01T08:30:00Z".parse().unwrap()),
            id: Some(DocumentId::from("abc")),
            is_pinned: true,
            url_id: Some("budget".to_string()),
            kind: Some(serde_json::json!("tutorial")),
            aliases: vec![DocumentAlias {
                org_id: 1,
                url_id: "b".to_string(),
                doc_id: "abc".to_string(),
                created_at: String::new(),
            }],
            ..Document::default()
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["urlId"], "budget");
        assert_eq!(json["type"], "tutorial");
        assert!(json.get("trunkId").is_none());
        assert!(json.get("workspace").is_none());
        assert!(json["aliases"][0].get("createdAt").is_none());

        let back: Document = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }
}
