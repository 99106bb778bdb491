mod common;

use couchdb_rs::Error;
use mockito::Matcher;
use serde_json::json;

#[tokio::test]
async fn test_get_all_documents_with_params() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/db/_all_docs")
        .match_query(Matcher::Exact("include_docs=true&limit=10".into()))
        .with_body(r#"{"total_rows":0,"offset":0,"rows":[]}"#)
        .create_async()
        .await;

    let client = common::connect(&server).await;
    let docs = client
        .get_all_documents("db", &[("include_docs", "true"), ("limit", "10")])
        .await
        .unwrap();

    assert_eq!(docs["rows"], json!([]));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_all_documents_by_keys() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/db/_all_docs")
        .match_query(Matcher::UrlEncoded("include_docs".into(), "true".into()))
        .match_body(Matcher::Json(json!({"keys": ["doc1", "doc2"]})))
        .with_body(r#"{"total_rows":2,"offset":0,"rows":[]}"#)
        .create_async()
        .await;

    let client = common::connect(&server).await;
    client
        .get_all_documents_by_keys("db", &["doc1", "doc2"], &[("include_docs", "true")])
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_bulk_documents_omits_new_edits_by_default() {
    let docs = vec![json!({"_id": "doc1", "title": "one"}), json!({"title": "two"})];

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/db/_bulk_docs")
        .match_body(Matcher::Json(json!({"docs": docs.clone()})))
        .with_status(201)
        .with_body(r#"[{"ok":true,"id":"doc1","rev":"1-abc"},{"ok":true,"id":"gen","rev":"1-def"}]"#)
        .create_async()
        .await;

    let client = common::connect(&server).await;
    let result = client.bulk_documents("db", &docs, true).await.unwrap();

    // The per-document result array comes back untouched.
    assert_eq!(result[0]["id"], "doc1");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_bulk_documents_carries_new_edits_false() {
    let docs = vec![json!({"_id": "doc1", "_rev": "1-abc", "title": "one"})];

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/db/_bulk_docs")
        .match_body(Matcher::Json(json!({"docs": docs.clone(), "new_edits": false})))
        .with_status(201)
        .with_body("[]")
        .create_async()
        .await;

    let client = common::connect(&server).await;
    client.bulk_documents("db", &docs, false).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_bulk_documents_rejection_maps_to_rejected() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/db/_bulk_docs")
        .with_status(417)
        .with_body(r#"{"error":"expectation_failed","reason":"at least one document was rejected"}"#)
        .create_async()
        .await;

    let client = common::connect(&server).await;
    let err = client
        .bulk_documents("db", &[json!({"title": "x"})], true)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Rejected { .. }));
}

#[tokio::test]
async fn test_is_document_exists() {
    let mut server = mockito::Server::new_async().await;
    let _present = server.mock("HEAD", "/db/present").create_async().await;
    let _absent = server
        .mock("HEAD", "/db/absent")
        .with_status(404)
        .create_async()
        .await;

    let client = common::connect(&server).await;

    assert!(client.is_document_exists("db", "present").await.unwrap());
    assert!(!client.is_document_exists("db", "absent").await.unwrap());
}

#[tokio::test]
async fn test_get_document_with_params() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/db/doc1")
        .match_query(Matcher::Exact("revs=true".into()))
        .with_body(r#"{"_id":"doc1","_rev":"2-def","title":"hello"}"#)
        .create_async()
        .await;

    let client = common::connect(&server).await;
    let doc = client
        .get_document("db", "doc1", &[("revs", "true")])
        .await
        .unwrap();

    assert_eq!(doc["_rev"], "2-def");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_create_document_passes_nested_body_through() {
    let doc = json!({
        "title": "hello",
        "meta": {"tags": ["a", "b"], "depth": {"level": 2}}
    });

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/db")
        .match_body(Matcher::Json(doc.clone()))
        .with_status(201)
        .with_body(r#"{"ok":true,"id":"e5bc0d2","rev":"1-abc"}"#)
        .create_async()
        .await;

    let client = common::connect(&server).await;
    let result = client.create_document("db", &doc, &[]).await.unwrap();

    assert_eq!(result["ok"], true);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_document_with_params() {
    let doc = json!({"_id": "doc1", "_rev": "1-abc", "title": "updated"});

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/db/doc1")
        .match_query(Matcher::Exact("batch=ok".into()))
        .match_body(Matcher::Json(doc.clone()))
        .with_status(202)
        .with_body(r#"{"ok":true,"id":"doc1","rev":"2-def"}"#)
        .create_async()
        .await;

    let client = common::connect(&server).await;
    client
        .update_document("db", "doc1", &doc, &[("batch", "ok")])
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_document_revision_mismatch_is_conflict() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("PUT", "/db/doc1")
        .with_status(409)
        .with_body(r#"{"error":"conflict","reason":"Document update conflict."}"#)
        .create_async()
        .await;

    let client = common::connect(&server).await;
    let err = client
        .update_document("db", "doc1", &json!({"title": "stale"}), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Conflict { .. }));
    assert!(err.to_string().contains("Document update conflict."));
}

#[tokio::test]
async fn test_delete_document_sends_rev() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/db/doc1")
        .match_query(Matcher::Exact("rev=1-abc".into()))
        .with_body(r#"{"ok":true,"id":"doc1","rev":"2-def"}"#)
        .create_async()
        .await;

    let client = common::connect(&server).await;
    client.delete_document("db", "doc1", "1-abc", &[]).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_delete_document_appends_rev_to_extra_params() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/db/doc1")
        .match_query(Matcher::Exact("batch=ok&rev=1-abc".into()))
        .with_status(202)
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;

    let client = common::connect(&server).await;
    client
        .delete_document("db", "doc1", "1-abc", &[("batch", "ok")])
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_copy_document_uses_destination_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("COPY", "/db/doc1")
        .match_header("destination", "doc1-copy")
        .match_query(Matcher::Exact("rev=1-abc".into()))
        .with_status(201)
        .with_body(r#"{"ok":true,"id":"doc1-copy","rev":"1-xyz"}"#)
        .create_async()
        .await;

    let client = common::connect(&server).await;
    let result = client
        .copy_document("db", "doc1", "doc1-copy", &[("rev", "1-abc")])
        .await
        .unwrap();

    assert_eq!(result["id"], "doc1-copy");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unsupported_bulk_operations() {
    // No server: these must fail before any network activity.
    let config = couchdb_rs::ClientConfig::new("localhost", 5984, "user", "pass");
    let client = couchdb_rs::Client::connect(config).await.unwrap();

    assert!(matches!(
        client.get_design_documents("db", &[]).await.unwrap_err(),
        Error::NotImplemented
    ));
    assert!(matches!(
        client
            .get_design_documents_by_keys("db", &["_design/a"], &[])
            .await
            .unwrap_err(),
        Error::NotImplemented
    ));
    assert!(matches!(
        client.get_bulk_documents("db", &[], &[]).await.unwrap_err(),
        Error::NotImplemented
    ));
}
