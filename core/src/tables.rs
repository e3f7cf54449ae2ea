//! Tables inside a document.
//!
//! The Grist tables endpoint accepts PATCH in its documentation but does not
//! behave as described, so only list and create are exposed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::client::GristClient;
use crate::columns::Column;
use crate::documents::DocumentId;
use crate::error::{Error, Result};
use crate::http::Method;
use crate::request::GristRequest;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(pub String);

impl TableId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TableId {
    fn from(id: &str) -> Self {
        TableId(id.to_string())
    }
}

impl From<String> for TableId {
    fn from(id: String) -> Self {
        TableId(id)
    }
}

/// Wire wrapper: `{"tables": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub fields: TableFields,
}

impl Table {
    pub fn new(id: impl Into<TableId>, columns: Vec<Column>) -> Self {
        Self {
            id: id.into(),
            columns,
            fields: TableFields::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFields {
    #[serde(default)]
    pub table_ref: i64,
    #[serde(default)]
    pub on_demand: bool,
}

impl GristClient {
    pub fn list_tables(&self, document: &DocumentId) -> Result<Vec<u8>> {
        self.send(GristRequest::new(
            Method::Get,
            format!("/api/docs/{document}/tables"),
        ))
    }

    /// Create `tables` in `document`. Every table must declare at least one
    /// column; otherwise nothing is sent.
    pub fn create_tables(&self, document: &DocumentId, tables: &[Table]) -> Result<Vec<u8>> {
        if let Some(table) = tables.iter().find(|t| t.columns.is_empty()) {
            return Err(Error::Validation(format!(
                "columns required to create table {:?}",
                table.id.as_str()
            )));
        }

        #[derive(Serialize)]
        struct Payload<'a> {
            tables: &'a [Table],
        }

        self.send_json(
            Method::Post,
            format!("/api/docs/{document}/tables"),
            &Payload { tables },
        )
    }
}
