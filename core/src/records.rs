//! Records (rows) of a table.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::GristClient;
use crate::documents::DocumentId;
use crate::error::Result;
use crate::filter::Filter;
use crate::http::Method;
use crate::request::GristRequest;
use crate::tables::TableId;

/// Wire wrapper: `{"records": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Records {
    pub records: Vec<Record>,
}

/// One row. `id` is assigned by the server and omitted when creating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            fields: Map::new(),
        }
    }

    /// Set a column value.
    pub fn field(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }
}

impl GristClient {
    pub fn get_records(&self, document: &DocumentId, table: &TableId) -> Result<Vec<u8>> {
        self.send(GristRequest::new(Method::Get, records_path(document, table)))
    }

    /// Fetch records matching `filter`. `None` falls back to the client's
    /// global filter, if any.
    pub fn get_filtered_records(
        &self,
        document: &DocumentId,
        table: &TableId,
        filter: Option<Filter>,
    ) -> Result<Vec<u8>> {
        let request = GristRequest {
            filter,
            ..GristRequest::new(Method::Get, records_path(document, table))
        };
        self.send(request)
    }

    /// Fetch records using the document, table and filter carried by
    /// `request`. Its path and method are overwritten; a missing document or
    /// table leaves an empty path segment, which the server rejects.
    pub fn get_records_with_options(&self, mut request: GristRequest) -> Result<Vec<u8>> {
        request.path = format!(
            "/api/docs/{}/tables/{}/records",
            request
                .document
                .as_ref()
                .map(DocumentId::as_str)
                .unwrap_or_default(),
            request
                .table
                .as_ref()
                .map(TableId::as_str)
                .unwrap_or_default(),
        );
        request.method = Method::Get;
        self.send(request)
    }

    pub fn create_records(
        &self,
        document: &DocumentId,
        table: &TableId,
        records: &[Record],
    ) -> Result<Vec<u8>> {
        self.write_records(Method::Post, document, table, records)
    }

    /// Send an already encoded `{"records": [...]}` body as-is.
    pub fn create_records_raw(
        &self,
        document: &DocumentId,
        table: &TableId,
        body: impl Into<Vec<u8>>,
    ) -> Result<Vec<u8>> {
        let request = GristRequest::new(Method::Post, records_path(document, table)).body(body);
        self.send(request)
    }

    /// Update existing records; each record must carry its `id`.
    pub fn patch_records(
        &self,
        document: &DocumentId,
        table: &TableId,
        records: &[Record],
    ) -> Result<Vec<u8>> {
        self.write_records(Method::Patch, document, table, records)
    }

    fn write_records(
        &self,
        method: Method,
        document: &DocumentId,
        table: &TableId,
        records: &[Record],
    ) -> Result<Vec<u8>> {
        #[derive(Serialize)]
        struct Payload<'a> {
            records: &'a [Record],
        }

        self.send_json(method, records_path(document, table), &Payload { records })
    }
}

fn records_path(document: &DocumentId, table: &TableId) -> String {
    format!("/api/docs/{document}/tables/{table}/records")
}
