//! End-to-end pipeline: uploads → ingest → edit → finalize → document.

use wsdl_facade::assemble::DocumentInfo;
use wsdl_facade::ingest::{self, IngestError, JsonModelLoader, Upload};
use wsdl_facade::registry::SchemaPart;
use wsdl_facade::session::{Session, Stage};

const MODEL_SRC: &str = r#"{
    "types": {
        "OrderRequest": {
            "elements": [
                { "name": "customer", "type": "xs:string" },
                { "name": "lines", "type": "OrderLine", "min_occurs": 0, "max_occurs": "unbounded" }
            ],
            "attributes": [ { "name": "priority", "type": "xs:int" } ]
        },
        "OrderLine": {
            "elements": [
                { "name": "sku", "type": "xs:string" },
                { "name": "quantity", "type": "xs:int" },
                { "name": "bundle", "type": "OrderLine", "min_occurs": 0 }
            ]
        },
        "OrderReceipt": {
            "elements": [
                { "name": "id", "type": "xs:long" },
                { "name": "placed_at", "type": "xs:dateTime" }
            ]
        }
    },
    "operations": [
        {
            "name": "PlaceOrder",
            "service": "OrderService",
            "request": "OrderRequest",
            "response": "OrderReceipt"
        },
        {
            "name": "CancelOrder",
            "service": "OrderService",
            "request": "xs:long",
            "response": "xs:boolean"
        }
    ]
}"#;

fn ingest_sample() -> Session {
    let uploads = vec![Upload::new("orders.json", MODEL_SRC)];
    let model = ingest::ingest(&JsonModelLoader, &uploads, None).expect("sample model loads");
    let mut session = Session::new(DocumentInfo::default());
    session.ingest(&*model).expect("ingest succeeds");
    session
}

#[test]
fn ingest_compiles_the_whole_service() {
    let session = ingest_sample();
    assert_eq!(session.stage(), Stage::Edit);
    assert_eq!(session.registry().len(), 2);

    let place = session.registry().get("PlaceOrder").unwrap();
    let request = place.request.to_value();
    assert_eq!(request["type"], "object");
    assert_eq!(request["properties"]["priority"]["type"], "integer");
    assert_eq!(request["properties"]["customer"]["type"], "string");
    assert_eq!(request["properties"]["lines"]["type"], "array");
    // self-referential line bundles end in a reference marker
    assert_eq!(
        request["properties"]["lines"]["items"]["properties"]["bundle"]["$ref"],
        "#/components/schemas/OrderLine"
    );
    assert_eq!(request["required"], serde_json::json!(["customer"]));

    let response = place.response.to_value();
    assert_eq!(response["properties"]["placed_at"]["format"], "date-time");
}

#[test]
fn full_run_produces_the_expected_document() {
    let mut session = ingest_sample();

    // refine: hide CancelOrder, tighten PlaceOrder's response
    session.set_include("CancelOrder", false).unwrap();
    session
        .edit_schema(
            "PlaceOrder",
            SchemaPart::Response,
            r#"{
                "type": "object",
                "properties": { "id": { "type": "integer" } },
                "required": ["id"]
            }"#,
        )
        .unwrap();

    let document = session.finalize().unwrap();
    let value = document.to_json();

    assert_eq!(value["openapi"], "3.0.0");
    assert_eq!(value["info"]["title"], "Restructured REST API");
    let paths = value["paths"].as_object().unwrap();
    assert_eq!(paths.len(), 1);
    let post = &value["paths"]["/PlaceOrder"]["post"];
    assert_eq!(post["tags"], serde_json::json!(["OrderService"]));
    assert_eq!(
        post["responses"]["200"]["content"]["application/json"]["schema"]["required"],
        serde_json::json!(["id"])
    );
}

#[test]
fn every_compiled_schema_round_trips_through_text() {
    let session = ingest_sample();
    for record in session.registry().iter() {
        for node in [&record.request, &record.response] {
            let reparsed = wsdl_facade::ir::SchemaNode::parse(&node.to_pretty())
                .expect("compiler output parses back");
            assert_eq!(&reparsed, node);
        }
    }
}

#[test]
fn rejected_edit_leaves_the_session_editable_and_intact() {
    let mut session = ingest_sample();
    let before = session.registry().get("PlaceOrder").unwrap().clone();

    let err = session
        .edit_schema("PlaceOrder", SchemaPart::Request, r#"{ "type": "array" }"#)
        .unwrap_err();
    assert!(err.to_string().contains("PlaceOrder"));

    assert_eq!(session.stage(), Stage::Edit);
    assert_eq!(session.registry().get("PlaceOrder").unwrap(), &before);

    // the session still finalizes with the valid pair
    let document = session.finalize().unwrap();
    assert!(document.paths.contains_key("/PlaceOrder"));
    assert!(document.paths.contains_key("/CancelOrder"));
}

#[test]
fn ingest_failure_keeps_the_session_at_ingest() {
    let uploads = vec![Upload::new("orders.json", "definitely not json")];
    let result = ingest::ingest(&JsonModelLoader, &uploads, None);
    assert!(matches!(result, Err(IngestError::Parse(_))));

    // the session was never advanced; a later valid upload still works
    let mut session = Session::new(DocumentInfo::default());
    assert_eq!(session.stage(), Stage::Ingest);
    let uploads = vec![Upload::new("orders.json", MODEL_SRC)];
    let model = ingest::ingest(&JsonModelLoader, &uploads, None).unwrap();
    session.ingest(&*model).unwrap();
    assert_eq!(session.stage(), Stage::Edit);
}

#[test]
fn restart_supports_a_second_full_run() {
    let mut session = ingest_sample();
    session.set_include("PlaceOrder", false).unwrap();
    session.finalize().unwrap();

    session.restart();
    assert_eq!(session.stage(), Stage::Ingest);
    assert!(session.document().is_none());

    let uploads = vec![Upload::new("orders.json", MODEL_SRC)];
    let model = ingest::ingest(&JsonModelLoader, &uploads, None).unwrap();
    session.ingest(&*model).unwrap();
    // the earlier exclusion did not leak into the new run
    let document = session.finalize().unwrap();
    assert!(document.paths.contains_key("/PlaceOrder"));
}
