//! The request model handed to the dispatcher.

use crate::documents::DocumentId;
use crate::filter::Filter;
use crate::http::Method;
use crate::tables::TableId;

/// One pending call against the Grist API.
///
/// Built either with struct syntax or through the consuming setters below.
/// Each setter replaces exactly one field, so repeating one keeps the last
/// value. Nothing is validated until the request is dispatched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GristRequest {
    pub path: String,
    pub method: Method,
    pub document: Option<DocumentId>,
    pub table: Option<TableId>,
    /// Replaces the client's global filter for this call.
    pub filter: Option<Filter>,
    pub body: Option<Vec<u8>>,
}

impl GristRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            ..Self::default()
        }
    }

    pub fn document(mut self, document: impl Into<DocumentId>) -> Self {
        self.document = Some(document.into());
        self
    }

    pub fn table(mut self, table: impl Into<TableId>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}
