//! Blocking client for the Grist document-database REST API.
//!
//! # Overview
//! Covers organizations, workspaces, documents, tables, columns and records.
//! Every operation is one request/response round trip that returns the raw
//! JSON body; callers decode it into whatever shape they need (the DTOs in
//! this crate mirror the API's JSON).
//!
//! # Design
//! - `GristClient` holds configuration only: base URL, token, optional
//!   global filter and a shared `Transport`.
//! - Endpoints build a `GristRequest` and hand it to `GristClient::send`, the
//!   single dispatch path. Dispatch attaches auth and the filter, executes,
//!   and maps any status other than 200 to `ApiError`.
//! - Resource ids are distinct newtypes so a table id cannot be passed where
//!   a document id is expected.
//! - No retries, caching or pagination.
//!
//! ```no_run
//! use grist_core::{DocumentId, Filter, GristClient, TableId};
//!
//! # fn main() -> grist_core::Result<()> {
//! let client = GristClient::new("https://docs.getgrist.com", "api-key");
//! let body = client.get_filtered_records(
//!     &DocumentId::from("mydoc"),
//!     &TableId::from("People"),
//!     Some(Filter::by_field("id", [1, 2])),
//! )?;
//! let records: grist_core::Records = serde_json::from_slice(&body)?;
//! # let _ = records;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod columns;
pub mod documents;
pub mod error;
pub mod filter;
pub mod http;
mod omit;
pub mod orgs;
pub mod records;
pub mod request;
pub mod tables;
pub mod transport;
pub mod workspaces;

pub use client::{ClientBuilder, GristClient};
pub use columns::{Column, ColumnFields, Columns, FieldType, Recalc};
pub use documents::{Document, DocumentAlias, DocumentId, NewDocument};
pub use error::{ApiError, Error, Result};
pub use filter::Filter;
pub use http::{HttpRequest, HttpResponse, Method};
pub use orgs::{BillingAccount, Features, Org, OrgId, Owner, OwnerOptions, Product, SnapshotWindow};
pub use records::{Record, Records};
pub use request::GristRequest;
pub use tables::{Table, TableFields, TableId, Tables};
pub use transport::{Transport, UreqTransport};
pub use workspaces::{Workspace, WorkspaceId, WorkspaceName};
