//! Integration tests for request dispatch over both transports.
//!
//! Covers payload placement (query vs body vs multipart), DELETE-as-GET,
//! upload capability checks, error classification, and observers.

mod common;

use std::io::Write;

use serde_json::json;
use url::form_urlencoded;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{assert_signed, client_for, params, RecordingObserver, API_KEY};
use st_api::HttpMethod;
use st_core::config::TransportKind;
use st_core::error::StError;

fn form_pairs(bytes: &[u8]) -> Vec<(String, String)> {
    form_urlencoded::parse(bytes).into_owned().collect()
}

#[tokio::test]
async fn get_sends_signed_query_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/send"))
        .and(query_param("api_key", API_KEY))
        .and(query_param("format", "json"))
        .and(query_param("json", r#"{"send_id":"S1"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"send_id": "S1", "email": "a@b.com"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, TransportKind::Http);
    let resp = client.get_send("S1").await.unwrap();
    assert_eq!(resp.str_field("email"), Some("a@b.com"));
    assert_eq!(resp.info.status, 200);
    assert_eq!(resp.info.method, HttpMethod::Get);
    assert_eq!(resp.info.transport, "http");
    assert!(resp.info.url.contains("api_key="));

    let requests = server.received_requests().await.unwrap();
    let pairs: Vec<(String, String)> = requests[0].url.query_pairs().into_owned().collect();
    assert_signed(&pairs);
}

#[tokio::test]
async fn post_sends_urlencoded_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"send_id": "S2"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, TransportKind::Http);
    let data = params(json!({
        "template": "welcome",
        "email": "a@b.com",
        "vars": {"name": "Ann", "items": [1, 2]}
    }));
    let resp = client.api_post("send", data, &[]).await.unwrap();
    assert_eq!(resp.str_field("send_id"), Some("S2"));

    let requests = server.received_requests().await.unwrap();
    let pairs = form_pairs(&requests[0].body);
    assert_signed(&pairs);
    let json_field = &pairs.iter().find(|(k, _)| k == "json").unwrap().1;
    assert_eq!(
        json_field,
        r#"{"template":"welcome","email":"a@b.com","vars":{"name":"Ann","items":[1,2]}}"#
    );
}

#[tokio::test]
async fn delete_is_sent_as_get_with_override() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/send"))
        .and(header("x-http-method-override", "DELETE"))
        .and(query_param("json", r#"{"send_id":"S3"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(405))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, TransportKind::Http);
    let resp = client.cancel_send("S3").await.unwrap();
    assert_eq!(resp.info.method, HttpMethod::Delete);
    assert_eq!(resp.body["ok"], true);
}

#[tokio::test]
async fn stream_delete_is_sent_as_get_with_override() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/send"))
        .and(header("x-http-method-override", "DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, TransportKind::Stream);
    let resp = client.cancel_send("S3").await.unwrap();
    assert_eq!(resp.info.transport, "stream");
    assert_eq!(resp.body["ok"], true);
}

#[tokio::test]
async fn stream_transport_get_and_post() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blast"))
        .and(query_param("json", r#"{"blast_id":"42"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"blast_id": 42, "status": "sent"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, TransportKind::Stream);

    let blast = client.get_blast("42").await.unwrap();
    assert_eq!(blast.str_field("status"), Some("sent"));
    assert_eq!(blast.info.transport, "stream");

    let user = client
        .api_post("user", params(json!({"id": "a@b.com", "key": "email"})), &[])
        .await
        .unwrap();
    assert_eq!(user.body["ok"], true);

    let requests = server.received_requests().await.unwrap();
    let post = requests.iter().find(|r| r.method.as_str() == "POST").unwrap();
    assert_signed(&form_pairs(&post.body));
}

#[tokio::test]
async fn upload_goes_out_as_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/job"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "J1"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "first@example.com").unwrap();
    writeln!(file, "second@example.com").unwrap();
    let path_str = file.path().to_string_lossy().into_owned();

    let client = client_for(&server, TransportKind::Http);
    let data = params(json!({"job": "import", "list": "main", "file": path_str}));
    let resp = client.api_post("job", data, &["file"]).await.unwrap();
    assert_eq!(resp.str_field("job_id"), Some("J1"));

    let requests = server.received_requests().await.unwrap();
    let request = &requests[0];
    let content_type = request
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("multipart/form-data"));

    let body = String::from_utf8_lossy(&request.body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("second@example.com"));
    assert!(body.contains("name=\"sig\""));
    assert!(body.contains(r#"{"job":"import","list":"main"}"#));
}

#[tokio::test]
async fn missing_upload_file_is_sent_as_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/job"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "J2"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, TransportKind::Stream);
    let data = params(json!({"job": "update", "file": "/no/such/file.csv"}));
    client.api_post("job", data, &["file"]).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let pairs = form_pairs(&requests[0].body);
    let json_field = &pairs.iter().find(|(k, _)| k == "json").unwrap().1;
    assert_eq!(json_field, r#"{"job":"update","file":"/no/such/file.csv"}"#);
}

#[tokio::test]
async fn stream_upload_fails_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let file = tempfile::NamedTempFile::new().unwrap();
    let path_str = file.path().to_string_lossy().into_owned();

    let observer = RecordingObserver::new();
    let client = client_for(&server, TransportKind::Stream).with_observer(observer.clone());
    let err = client
        .api_post("job", params(json!({"job": "import", "file": path_str})), &["file"])
        .await
        .unwrap_err();

    match err {
        StError::UploadCapability { transport, fields } => {
            assert_eq!(transport, "stream");
            assert_eq!(fields, vec!["file".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(observer.lines().is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_2xx_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    for kind in [TransportKind::Http, TransportKind::Stream] {
        let client = client_for(&server, kind);
        let err = client.get_send("S1").await.unwrap_err();
        assert!(err.is_transport(), "{kind}: {err:?}");
        match err {
            StError::HttpStatus { status, body, url } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
                assert!(url.starts_with(&server.uri()));
            }
            other => panic!("{kind}: unexpected error: {other:?}"),
        }
    }
}

#[tokio::test]
async fn empty_body_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    for kind in [TransportKind::Http, TransportKind::Stream] {
        let err = client_for(&server, kind).get_send("S1").await.unwrap_err();
        assert!(matches!(err, StError::EmptyResponse { .. }), "{kind}: {err:?}");
    }
}

#[tokio::test]
async fn invalid_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server, TransportKind::Http).get_send("S1").await.unwrap_err();
    match err {
        StError::Decode { body, .. } => assert_eq!(body, "<html>oops</html>"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn connection_failure_carries_url() {
    // Bind then drop a listener so its port is closed.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let config = st_core::config::ApiConfig::new(API_KEY, "secret", uri.clone());
    for kind in [TransportKind::Http, TransportKind::Stream] {
        let mut config = config.clone();
        config.transport = kind;
        let client = st_api::ApiClient::new(&config).unwrap();
        let err = client.get_send("S1").await.unwrap_err();
        assert!(err.is_transport(), "{kind}: {err:?}");
        assert!(err.url().unwrap().starts_with(&uri));
    }
}

#[tokio::test]
async fn error_envelope_is_returned_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": 99, "errormsg": "Invalid send_id"})),
        )
        .mount(&server)
        .await;

    let resp = client_for(&server, TransportKind::Http).get_send("nope").await.unwrap();
    assert!(resp.is_error());
    assert_eq!(resp.error_code(), Some(99));
    assert_eq!(resp.error_message(), Some("Invalid send_id"));
}

#[tokio::test]
async fn observer_sees_request_and_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": 1})))
        .mount(&server)
        .await;

    let observer = RecordingObserver::new();
    let client = client_for(&server, TransportKind::Http)
        .with_observer(observer.clone())
        .with_event_type("update");
    client.get_send("S1").await.unwrap();

    assert_eq!(
        observer.lines(),
        vec!["request GET update http".to_string(), "response 200".to_string()]
    );
}

#[tokio::test]
async fn custom_headers_and_user_agent_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("user-agent", "Sailthru API Rust Client"))
        .and(header("x-trace", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    for kind in [TransportKind::Http, TransportKind::Stream] {
        let mut config = st_core::config::ApiConfig::new(API_KEY, "secret", server.uri());
        config.transport = kind;
        config.custom_headers.insert("X-Trace".into(), "abc".into());
        let client = st_api::ApiClient::new(&config).unwrap();
        client.api_get("list", params(json!({}))).await.unwrap();
    }
}
