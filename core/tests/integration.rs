//! End-to-end scenarios against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port in a background thread, then
//! drives the client over real HTTP through the default ureq transport.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use grist_core::{
    Column, ColumnFields, Columns, DocumentId, Error, FieldType, Filter, GristClient, GristRequest,
    HttpRequest, HttpResponse, OrgId, Record, Records, Table, TableId, Tables, Transport,
    UreqTransport, Workspace,
};
use mock_server::FILTER_ECHO_HEADER;
use serde_json::Value;

const API_KEY: &str = "integration-key";

/// Start a fresh mock server and return its address.
fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, API_KEY).await
        })
        .unwrap();
    });

    addr
}

fn client(addr: SocketAddr) -> GristClient {
    GristClient::new(&format!("http://{addr}"), API_KEY)
}

/// Real ureq transport that keeps the filter text each response echoes.
struct EchoedFilters {
    inner: UreqTransport,
    seen: Arc<Mutex<Vec<Option<String>>>>,
}

impl Transport for EchoedFilters {
    fn execute(&self, request: HttpRequest) -> grist_core::Result<HttpResponse> {
        let response = self.inner.execute(request)?;
        let echoed = response
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(FILTER_ECHO_HEADER))
            .map(|(_, value)| value.clone());
        self.seen.lock().unwrap().push(echoed);
        Ok(response)
    }
}

/// Create a document with a `Pets` table holding two records.
fn pets_fixture(client: &GristClient) -> (DocumentId, TableId) {
    let ws = client
        .create_workspace(&OrgId::from("current"), "Fixtures")
        .unwrap();
    let doc = client.create_document(ws, "Pets", false).unwrap();
    let table = TableId::from("Pets");

    client
        .create_tables(
            &doc,
            &[Table::new(
                table.clone(),
                vec![Column::new("pet", ColumnFields::new("Pet", FieldType::Text))],
            )],
        )
        .unwrap();
    client
        .create_records(
            &doc,
            &table,
            &[
                Record::new().field("pet", "cat"),
                Record::new().field("pet", "dog"),
            ],
        )
        .unwrap();

    (doc, table)
}

#[test]
fn missing_api_key_gets_401() {
    let addr = start_server();
    let client = GristClient::builder().url(format!("http://{addr}")).build();

    let err = client.list_orgs().unwrap_err();
    match err {
        Error::Api(api) => {
            assert_eq!(api.status, 401);
            assert_eq!(api.details, "Unauthorized");
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[test]
fn filtered_records_return_first_record() {
    let addr = start_server();
    let client = client(addr);
    let (doc, table) = pets_fixture(&client);

    let body = client
        .get_filtered_records(&doc, &table, Some(Filter::raw(r#"{"id":[1]}"#)))
        .unwrap();
    let records: Records = serde_json::from_slice(&body).unwrap();
    assert_eq!(records.records.len(), 1);
    assert_eq!(records.records[0].id, Some(1));
    assert_eq!(records.records[0].fields["pet"], "cat");
}

#[test]
fn request_filter_overrides_global_filter() {
    let addr = start_server();
    let setup = client(addr);
    let (doc, table) = pets_fixture(&setup);

    let client = GristClient::builder()
        .url(format!("http://{addr}"))
        .api_key(API_KEY)
        .global_filter(Filter::by_field("pet", ["cat"]))
        .build();

    let body = client.get_records(&doc, &table).unwrap();
    let records: Records = serde_json::from_slice(&body).unwrap();
    assert_eq!(records.records.len(), 1);
    assert_eq!(records.records[0].fields["pet"], "cat");

    let request = GristRequest::default()
        .document(doc.clone())
        .table(table.clone())
        .filter(Filter::by_field("pet", ["dog"]));
    let body = client.get_records_with_options(request).unwrap();
    let records: Records = serde_json::from_slice(&body).unwrap();
    assert_eq!(records.records.len(), 1);
    assert_eq!(records.records[0].fields["pet"], "dog");
}

#[test]
fn filter_text_reaches_server_unchanged() {
    let addr = start_server();
    let (doc, table) = pets_fixture(&client(addr));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let client = GristClient::builder()
        .url(format!("http://{addr}"))
        .api_key(API_KEY)
        .global_filter(Filter::raw(r#"{"pet":  ["dog"]}"#))
        .transport(EchoedFilters {
            inner: UreqTransport::new(),
            seen: Arc::clone(&seen),
        })
        .build();

    let body = client.get_records(&doc, &table).unwrap();
    let records: Records = serde_json::from_slice(&body).unwrap();
    assert_eq!(records.records[0].fields["pet"], "dog");

    let body = client
        .get_filtered_records(&doc, &table, Some(Filter::raw(r#"{"id": [1]}"#)))
        .unwrap();
    let records: Records = serde_json::from_slice(&body).unwrap();
    assert_eq!(records.records.len(), 1);
    assert_eq!(records.records[0].id, Some(1));

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            Some(r#"{"pet":  ["dog"]}"#.to_string()),
            Some(r#"{"id": [1]}"#.to_string()),
        ]
    );
}

#[test]
fn unknown_document_is_404() {
    let addr = start_server();
    let err = client(addr)
        .get_document(&DocumentId::from("missing"))
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[test]
fn document_lifecycle() {
    let addr = start_server();
    let client = client(addr);

    // Step 1: the seeded org is visible.
    let orgs: Vec<Value> = serde_json::from_slice(&client.list_orgs().unwrap()).unwrap();
    assert_eq!(orgs.len(), 1);
    let org = OrgId::from(orgs[0]["id"].as_u64().unwrap());
    let org_body: Value = serde_json::from_slice(&client.get_org(&org).unwrap()).unwrap();
    assert_eq!(org_body["domain"], "docs");

    // Step 2: create a workspace and a document inside it.
    let ws = client.create_workspace(&org, "Home").unwrap();
    let doc = client.create_document(ws, "Inventory", true).unwrap();
    assert!(!doc.as_str().is_empty());

    let workspace: Workspace =
        serde_json::from_slice(&client.get_workspace(ws).unwrap()).unwrap();
    assert_eq!(workspace.id, Some(ws));
    assert_eq!(workspace.docs.len(), 1);
    assert_eq!(workspace.docs[0].id.as_ref(), Some(&doc));
    assert!(workspace.docs[0].is_pinned);

    let listed: Vec<Workspace> =
        serde_json::from_slice(&client.get_org_workspaces(&org).unwrap()).unwrap();
    assert_eq!(listed.len(), 1);

    // Step 3: tables, with the local column check.
    let err = client
        .create_tables(&doc, &[Table::new("Empty", Vec::new())])
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let items = TableId::from("Items");
    client
        .create_tables(
            &doc,
            &[Table::new(
                items.clone(),
                vec![Column::new("sku", ColumnFields::new("SKU", FieldType::Text))],
            )],
        )
        .unwrap();
    let tables: Tables = serde_json::from_slice(&client.list_tables(&doc).unwrap()).unwrap();
    assert_eq!(tables.tables.len(), 1);
    assert_eq!(tables.tables[0].id, items);

    // Step 4: columns.
    client
        .create_columns(
            &doc,
            &items,
            &[
                Column::new("qty", ColumnFields::new("Qty", FieldType::Int)),
                Column::new(
                    "double",
                    ColumnFields::formula("Double", FieldType::Numeric, "$qty * 2"),
                ),
            ],
        )
        .unwrap();
    client
        .patch_columns(
            &doc,
            &items,
            &[Column::new("qty", ColumnFields::new("Quantity", FieldType::Int))],
        )
        .unwrap();
    let columns: Columns =
        serde_json::from_slice(&client.get_columns(&doc, &items).unwrap()).unwrap();
    assert_eq!(columns.columns.len(), 3);
    assert_eq!(columns.columns[1].fields.label, "Quantity");
    assert!(columns.columns[2].fields.is_formula);

    // Step 5: records, typed and raw.
    client
        .create_records(
            &doc,
            &items,
            &[Record::new().field("sku", "A-1").field("qty", 3)],
        )
        .unwrap();
    client
        .create_records_raw(
            &doc,
            &items,
            br#"{"records":[{"fields":{"sku":"B-2","qty":1}}]}"#.to_vec(),
        )
        .unwrap();
    client
        .patch_records(&doc, &items, &[Record::with_id(2).field("qty", 9)])
        .unwrap();

    let records: Records =
        serde_json::from_slice(&client.get_records(&doc, &items).unwrap()).unwrap();
    assert_eq!(records.records.len(), 2);
    assert_eq!(records.records[1].fields["sku"], "B-2");
    assert_eq!(records.records[1].fields["qty"], 9);

    // Step 6: delete, then the document is gone.
    client.delete_document(&doc).unwrap();
    let err = client.get_document(&doc).unwrap_err();
    assert_eq!(err.status(), Some(404));
}
