//! In-memory stand-in for the Grist REST API.
//!
//! Implements the organization, workspace, document, table, column and record
//! routes the client speaks, behind a bearer-token check. State lives in a
//! single `RwLock`; every router built by `app_with_key` starts from one
//! seeded organization and nothing else.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_API_KEY: &str = "test-key";

/// Records reads answer with the decoded `filter` query in this header, so
/// tests can compare the filter text the server actually received.
pub const FILTER_ECHO_HEADER: &str = "x-grist-filter";

#[derive(Debug, Clone)]
struct OrgEntry {
    id: u64,
    name: String,
    domain: String,
}

#[derive(Debug, Clone)]
struct WorkspaceEntry {
    id: u64,
    org: u64,
    name: String,
}

#[derive(Debug, Clone)]
struct DocEntry {
    id: String,
    name: String,
    is_pinned: bool,
    workspace: u64,
    tables: Vec<TableEntry>,
}

#[derive(Debug, Clone)]
struct TableEntry {
    id: String,
    table_ref: u64,
    columns: Vec<ColumnEntry>,
    rows: Vec<RowEntry>,
    next_row: i64,
}

#[derive(Debug, Clone)]
struct ColumnEntry {
    id: String,
    fields: Map<String, Value>,
}

#[derive(Debug, Clone)]
struct RowEntry {
    id: i64,
    fields: Map<String, Value>,
}

#[derive(Debug)]
struct Store {
    orgs: Vec<OrgEntry>,
    workspaces: Vec<WorkspaceEntry>,
    docs: Vec<DocEntry>,
    next_workspace: u64,
    next_table_ref: u64,
}

impl Store {
    fn seeded() -> Self {
        Self {
            orgs: vec![OrgEntry {
                id: 1,
                name: "Personal".to_string(),
                domain: "docs".to_string(),
            }],
            workspaces: Vec::new(),
            docs: Vec::new(),
            next_workspace: 1,
            next_table_ref: 1,
        }
    }

    /// Orgs are addressed by numeric id, domain, or `current`.
    fn org(&self, key: &str) -> Option<&OrgEntry> {
        if key == "current" {
            return self.orgs.first();
        }
        self.orgs
            .iter()
            .find(|o| o.id.to_string() == key || o.domain == key)
    }

    fn workspace(&self, id: u64) -> Option<&WorkspaceEntry> {
        self.workspaces.iter().find(|w| w.id == id)
    }

    fn doc(&self, id: &str) -> Option<&DocEntry> {
        self.docs.iter().find(|d| d.id == id)
    }

    fn doc_mut(&mut self, id: &str) -> Option<&mut DocEntry> {
        self.docs.iter_mut().find(|d| d.id == id)
    }

    fn docs_in(&self, workspace: u64) -> impl Iterator<Item = &DocEntry> {
        self.docs.iter().filter(move |d| d.workspace == workspace)
    }
}

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    store: Arc<RwLock<Store>>,
}

impl AppState {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: Arc::from(api_key),
            store: Arc::new(RwLock::new(Store::seeded())),
        }
    }
}

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = Result<T, ApiError>;

fn error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "error": message })))
}

fn not_found(what: &str) -> ApiError {
    error(StatusCode::NOT_FOUND, &format!("{what} not found"))
}

pub fn app() -> Router {
    app_with_key(DEFAULT_API_KEY)
}

pub fn app_with_key(api_key: &str) -> Router {
    let state = AppState::new(api_key);
    Router::new()
        .route("/api/orgs", get(list_orgs))
        .route("/api/orgs/{org}", get(get_org))
        .route(
            "/api/orgs/{org}/workspaces",
            get(get_org_workspaces).post(create_workspace),
        )
        .route("/api/workspaces/{ws}", get(get_workspace))
        .route("/api/workspaces/{ws}/docs", post(create_doc))
        .route("/api/docs/{doc}", get(get_doc).delete(delete_doc))
        .route("/api/docs/{doc}/tables", get(list_tables).post(create_tables))
        .route(
            "/api/docs/{doc}/tables/{table}/columns",
            get(get_columns).post(add_columns).patch(patch_columns),
        )
        .route(
            "/api/docs/{doc}/tables/{table}/records",
            get(get_records).post(add_records).patch(patch_records),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_key(api_key)).await
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let expected = format!("Bearer {}", state.api_key);
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if state.api_key.is_empty() || presented != Some(expected.as_str()) {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }
    next.run(request).await
}

// ---------------------------------------------------------------------------
// JSON views
// ---------------------------------------------------------------------------

fn org_json(org: &OrgEntry) -> Value {
    json!({
        "id": org.id,
        "name": org.name,
        "domain": org.domain,
        "host": null,
        "access": "owners",
    })
}

fn doc_json(doc: &DocEntry) -> Value {
    json!({
        "id": doc.id,
        "name": doc.name,
        "isPinned": doc.is_pinned,
        "urlId": null,
        "access": "owners",
    })
}

fn workspace_json(store: &Store, ws: &WorkspaceEntry) -> Value {
    let docs: Vec<Value> = store.docs_in(ws.id).map(doc_json).collect();
    let mut value = json!({
        "id": ws.id,
        "name": ws.name,
        "access": "owners",
        "docs": docs,
    });
    if let Some(org) = store.org(&ws.org.to_string()) {
        value["org"] = org_json(org);
    }
    value
}

fn row_json(row: &RowEntry) -> Value {
    json!({ "id": row.id, "fields": row.fields })
}

// ---------------------------------------------------------------------------
// Orgs and workspaces
// ---------------------------------------------------------------------------

async fn list_orgs(State(state): State<AppState>) -> Json<Vec<Value>> {
    let store = state.store.read().await;
    Json(store.orgs.iter().map(org_json).collect())
}

async fn get_org(State(state): State<AppState>, Path(org): Path<String>) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    store
        .org(&org)
        .map(|o| Json(org_json(o)))
        .ok_or_else(|| not_found("organization"))
}

async fn get_org_workspaces(
    State(state): State<AppState>,
    Path(org): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    let store = state.store.read().await;
    let org = store.org(&org).ok_or_else(|| not_found("organization"))?;
    Ok(Json(
        store
            .workspaces
            .iter()
            .filter(|w| w.org == org.id)
            .map(|w| workspace_json(&store, w))
            .collect(),
    ))
}

#[derive(Deserialize)]
struct NameBody {
    #[serde(default)]
    name: String,
}

async fn create_workspace(
    State(state): State<AppState>,
    Path(org): Path<String>,
    Json(body): Json<NameBody>,
) -> ApiResult<Json<u64>> {
    let mut store = state.store.write().await;
    let org = store.org(&org).ok_or_else(|| not_found("organization"))?.id;
    if body.name.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "workspace name required"));
    }
    let id = store.next_workspace;
    store.next_workspace += 1;
    store.workspaces.push(WorkspaceEntry {
        id,
        org,
        name: body.name,
    });
    Ok(Json(id))
}

async fn get_workspace(
    State(state): State<AppState>,
    Path(ws): Path<u64>,
) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    let ws = store.workspace(ws).ok_or_else(|| not_found("workspace"))?;
    Ok(Json(workspace_json(&store, ws)))
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewDocBody {
    name: String,
    #[serde(default)]
    is_pinned: bool,
}

async fn create_doc(
    State(state): State<AppState>,
    Path(ws): Path<u64>,
    Json(body): Json<NewDocBody>,
) -> ApiResult<Json<String>> {
    let mut store = state.store.write().await;
    if store.workspace(ws).is_none() {
        return Err(not_found("workspace"));
    }
    let id = Uuid::new_v4().simple().to_string();
    store.docs.push(DocEntry {
        id: id.clone(),
        name: body.name,
        is_pinned: body.is_pinned,
        workspace: ws,
        tables: Vec::new(),
    });
    Ok(Json(id))
}

async fn get_doc(State(state): State<AppState>, Path(doc): Path<String>) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    let doc = store.doc(&doc).ok_or_else(|| not_found("document"))?;
    let mut value = doc_json(doc);
    if let Some(ws) = store.workspace(doc.workspace) {
        value["workspace"] = json!({ "id": ws.id, "name": ws.name });
    }
    Ok(Json(value))
}

async fn delete_doc(
    State(state): State<AppState>,
    Path(doc): Path<String>,
) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    let before = store.docs.len();
    store.docs.retain(|d| d.id != doc);
    if store.docs.len() == before {
        return Err(not_found("document"));
    }
    Ok(Json(Value::Null))
}

// ---------------------------------------------------------------------------
// Tables and columns
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ColumnBody {
    id: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
struct NewTableBody {
    id: String,
    #[serde(default)]
    columns: Vec<ColumnBody>,
}

#[derive(Deserialize)]
struct TablesBody {
    tables: Vec<NewTableBody>,
}

#[derive(Deserialize)]
struct ColumnsBody {
    columns: Vec<ColumnBody>,
}

async fn list_tables(
    State(state): State<AppState>,
    Path(doc): Path<String>,
) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    let doc = store.doc(&doc).ok_or_else(|| not_found("document"))?;
    let tables: Vec<Value> = doc
        .tables
        .iter()
        .map(|t| json!({ "id": t.id, "fields": { "tableRef": t.table_ref, "onDemand": false } }))
        .collect();
    Ok(Json(json!({ "tables": tables })))
}

async fn create_tables(
    State(state): State<AppState>,
    Path(doc): Path<String>,
    Json(body): Json<TablesBody>,
) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    let mut next_ref = store.next_table_ref;
    let doc = store.doc_mut(&doc).ok_or_else(|| not_found("document"))?;

    for table in &body.tables {
        if table.columns.is_empty() {
            return Err(error(StatusCode::BAD_REQUEST, "table must have at least one column"));
        }
        if doc.tables.iter().any(|t| t.id == table.id) {
            return Err(error(StatusCode::BAD_REQUEST, "table already exists"));
        }
    }

    let mut created = Vec::with_capacity(body.tables.len());
    for table in body.tables {
        created.push(json!({ "id": table.id }));
        doc.tables.push(TableEntry {
            id: table.id,
            table_ref: next_ref,
            columns: table
                .columns
                .into_iter()
                .map(|c| ColumnEntry {
                    id: c.id,
                    fields: c.fields,
                })
                .collect(),
            rows: Vec::new(),
            next_row: 1,
        });
        next_ref += 1;
    }
    store.next_table_ref = next_ref;
    Ok(Json(json!({ "tables": created })))
}

fn table<'a>(store: &'a Store, doc: &str, table: &str) -> ApiResult<&'a TableEntry> {
    let doc = store.doc(doc).ok_or_else(|| not_found("document"))?;
    doc.tables
        .iter()
        .find(|t| t.id == table)
        .ok_or_else(|| not_found("table"))
}

fn table_mut<'a>(store: &'a mut Store, doc: &str, table: &str) -> ApiResult<&'a mut TableEntry> {
    let doc = store.doc_mut(doc).ok_or_else(|| not_found("document"))?;
    doc.tables
        .iter_mut()
        .find(|t| t.id == table)
        .ok_or_else(|| not_found("table"))
}

async fn get_columns(
    State(state): State<AppState>,
    Path((doc, tid)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    let table = table(&store, &doc, &tid)?;
    let columns: Vec<Value> = table
        .columns
        .iter()
        .map(|c| json!({ "id": c.id, "fields": c.fields }))
        .collect();
    Ok(Json(json!({ "columns": columns })))
}

async fn add_columns(
    State(state): State<AppState>,
    Path((doc, tid)): Path<(String, String)>,
    Json(body): Json<ColumnsBody>,
) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    let table = table_mut(&mut store, &doc, &tid)?;
    if body.columns.iter().any(|c| table.columns.iter().any(|t| t.id == c.id)) {
        return Err(error(StatusCode::BAD_REQUEST, "column already exists"));
    }
    let created: Vec<Value> = body.columns.iter().map(|c| json!({ "id": c.id })).collect();
    table.columns.extend(body.columns.into_iter().map(|c| ColumnEntry {
        id: c.id,
        fields: c.fields,
    }));
    Ok(Json(json!({ "columns": created })))
}

async fn patch_columns(
    State(state): State<AppState>,
    Path((doc, tid)): Path<(String, String)>,
    Json(body): Json<ColumnsBody>,
) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    let table = table_mut(&mut store, &doc, &tid)?;
    for update in body.columns {
        let column = table
            .columns
            .iter_mut()
            .find(|c| c.id == update.id)
            .ok_or_else(|| not_found("column"))?;
        column.fields.extend(update.fields);
    }
    Ok(Json(Value::Null))
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RecordsQuery {
    filter: Option<String>,
}

#[derive(Deserialize)]
struct RecordBody {
    id: Option<i64>,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
struct RecordsBody {
    records: Vec<RecordBody>,
}

/// A row matches when, for every filtered column, its value is one of the
/// allowed values. `id` refers to the row id.
fn matches(row: &RowEntry, filter: &Map<String, Value>) -> bool {
    filter.iter().all(|(column, allowed)| {
        let value = if column == "id" {
            json!(row.id)
        } else {
            row.fields.get(column).cloned().unwrap_or(Value::Null)
        };
        allowed
            .as_array()
            .map(|allowed| allowed.contains(&value))
            .unwrap_or(false)
    })
}

fn parse_filter(raw: &str) -> ApiResult<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) if map.values().all(Value::is_array) => Ok(map),
        _ => Err(error(StatusCode::BAD_REQUEST, "filter must map columns to value lists")),
    }
}

async fn get_records(
    State(state): State<AppState>,
    Path((doc, tid)): Path<(String, String)>,
    Query(query): Query<RecordsQuery>,
) -> ApiResult<Response> {
    let store = state.store.read().await;
    let table = table(&store, &doc, &tid)?;
    let filter = query.filter.as_deref().map(parse_filter).transpose()?;
    let records: Vec<Value> = table
        .rows
        .iter()
        .filter(|row| filter.as_ref().map_or(true, |f| matches(row, f)))
        .map(row_json)
        .collect();

    let mut response = Json(json!({ "records": records })).into_response();
    if let Some(raw) = query.filter.as_deref() {
        // Non-ASCII filters cannot be echoed in a header; they are still applied.
        if let Ok(value) = HeaderValue::from_str(raw) {
            response.headers_mut().insert(FILTER_ECHO_HEADER, value);
        }
    }
    Ok(response)
}

async fn add_records(
    State(state): State<AppState>,
    Path((doc, tid)): Path<(String, String)>,
    Json(body): Json<RecordsBody>,
) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    let table = table_mut(&mut store, &doc, &tid)?;
    let mut created = Vec::with_capacity(body.records.len());
    for record in body.records {
        let id = table.next_row;
        table.next_row += 1;
        table.rows.push(RowEntry {
            id,
            fields: record.fields,
        });
        created.push(json!({ "id": id }));
    }
    Ok(Json(json!({ "records": created })))
}

async fn patch_records(
    State(state): State<AppState>,
    Path((doc, tid)): Path<(String, String)>,
    Json(body): Json<RecordsBody>,
) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    let table = table_mut(&mut store, &doc, &tid)?;
    for update in body.records {
        let id = update
            .id
            .ok_or_else(|| error(StatusCode::BAD_REQUEST, "record id required"))?;
        let row = table
            .rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found("record"))?;
        row.fields.extend(update.fields);
    }
    Ok(Json(Value::Null))
}
