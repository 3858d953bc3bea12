use bucketgate_core::{
    Error, FsStore, Gateway, MemoryStore, Method, Request, RequestBuilder, ServerConfig, Sink,
    SinkFuture, StatusCode, StoreConfig, StoredObject,
};
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const BOUNDARY: &str = "XyZ";

/// Records every put and fails from the `fail_at`-th put on (0-based)
#[derive(Default)]
struct RecordingSink {
    puts: Mutex<Vec<(String, Bytes, Option<String>)>>,
    fail_at: Option<usize>,
}

impl RecordingSink {
    fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Default::default()
        }
    }

    fn keys(&self) -> Vec<String> {
        self.puts.lock().iter().map(|(k, _, _)| k.clone()).collect()
    }
}

impl Sink for RecordingSink {
    fn put<'a>(
        &'a self,
        key: &'a str,
        content: Bytes,
        content_type: Option<&'a str>,
    ) -> SinkFuture<'a, ()> {
        Box::pin(async move {
            let mut puts = self.puts.lock();
            if self.fail_at.is_some_and(|n| puts.len() >= n) {
                return Err(Error::StorageFailure("bucket offline".into()));
            }
            puts.push((key.to_string(), content, content_type.map(str::to_string)));
            Ok(())
        })
    }

    fn get<'a>(&'a self, _key: &'a str) -> SinkFuture<'a, Option<StoredObject>> {
        Box::pin(async { Err(Error::StorageFailure("bucket offline".into())) })
    }
}

fn config() -> ServerConfig {
    ServerConfig::new().store(StoreConfig::Memory)
}

fn gateway_with(sink: Arc<dyn Sink>) -> Gateway {
    Gateway::new(sink, &config())
}

fn multipart_body(parts: &[(Option<&str>, &str)]) -> String {
    let mut body = String::new();
    for (filename, content) in parts {
        body.push_str(&format!("--{BOUNDARY}\r\n"));
        match filename {
            Some(name) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n"
            )),
            None => body.push_str("Content-Disposition: form-data; name=\"note\"\r\n"),
        }
        body.push_str("\r\n");
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

fn multi_upload_request(path: &str, body: impl Into<Bytes>) -> Request {
    RequestBuilder::new(Method::Put, format!("/multiupload/{path}"))
        .header("Content-Type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(body)
        .build()
}

fn upload_request(path: &str, content_type: &str, body: &'static [u8]) -> Request {
    RequestBuilder::new(Method::Put, format!("/upload/{path}"))
        .header("Content-Type", content_type)
        .body(Bytes::from_static(body))
        .build()
}

fn download_request(path: &str) -> Request {
    RequestBuilder::new(Method::Get, format!("/download/{path}")).build()
}

#[tokio::test]
async fn index_says_hello() {
    let gateway = gateway_with(Arc::new(MemoryStore::new()));
    let res = gateway.handle(RequestBuilder::new(Method::Get, "/").build()).await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body_string().unwrap().starts_with("Hello"));
    assert!(res.header("x-request-id").is_some());
}

#[tokio::test]
async fn upload_then_download_round_trips() {
    let store = Arc::new(MemoryStore::new());
    let gateway = gateway_with(store.clone());

    let res = gateway
        .handle(upload_request("docs/2024/report.txt", "text/plain", b"quarterly numbers"))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.body_string().unwrap(),
        "File uploaded to docs/2024/report.txt successfully!"
    );
    assert_eq!(store.keys(), vec!["docs/2024/report.txt"]);

    let res = gateway.handle(download_request("docs/2024/report.txt")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, Bytes::from_static(b"quarterly numbers"));
    assert_eq!(res.content_type(), Some("text/plain"));
    assert_eq!(
        res.header("content-disposition"),
        Some("attachment; filename=report.txt")
    );
}

#[tokio::test]
async fn percent_encoded_paths_are_decoded() {
    let store = Arc::new(MemoryStore::new());
    let gateway = gateway_with(store.clone());

    let res = gateway
        .handle(upload_request("my%20docs/q%231.txt", "text/plain", b"x"))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(store.keys(), vec!["my docs/q#1.txt"]);

    let res = gateway.handle(download_request("my%20docs/q%231.txt")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header("content-disposition"), Some("attachment; filename=q%231.txt"));
}

#[tokio::test]
async fn upload_rejects_empty_body() {
    let store = Arc::new(MemoryStore::new());
    let gateway = gateway_with(store.clone());

    let res = gateway.handle(upload_request("docs/a.txt", "text/plain", b"")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body_string().unwrap(), "No file uploaded");
    assert!(store.is_empty());
}

#[tokio::test]
async fn upload_rejects_missing_filename() {
    let store = Arc::new(MemoryStore::new());
    let gateway = gateway_with(store.clone());

    let res = gateway.handle(upload_request("docs/", "text/plain", b"data")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(store.is_empty());
}

#[tokio::test]
async fn upload_sink_failure_is_500() {
    let sink = Arc::new(RecordingSink::failing_at(0));
    let gateway = gateway_with(sink.clone());

    let res = gateway.handle(upload_request("a.txt", "text/plain", b"data")).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body_string().unwrap(), "Error uploading file");
}

#[tokio::test]
async fn download_missing_object_is_404() {
    let gateway = gateway_with(Arc::new(MemoryStore::new()));

    let res = gateway.handle(download_request("nope/missing.bin")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(res.body_string().unwrap().starts_with("File not found"));
}

#[tokio::test]
async fn download_defaults_content_type() {
    let store = Arc::new(MemoryStore::new());
    store.put("raw.bin", Bytes::from_static(&[0, 1, 2]), None).await.unwrap();
    let gateway = gateway_with(store);

    let res = gateway.handle(download_request("raw.bin")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.content_type(), Some("application/octet-stream"));
    assert_eq!(res.body, Bytes::from_static(&[0, 1, 2]));
}

#[tokio::test]
async fn download_sink_failure_is_500() {
    let gateway = gateway_with(Arc::new(RecordingSink::default()));

    let res = gateway.handle(download_request("a.txt")).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body_string().unwrap(), "Error retrieving file");
}

#[tokio::test]
async fn multi_upload_stores_parts_in_order() {
    let sink = Arc::new(RecordingSink::default());
    let gateway = gateway_with(sink.clone());

    let body = multipart_body(&[
        (Some("one.pdf"), "first"),
        (None, "ignored field"),
        (Some("two.pdf"), "second\r\nline"),
        (Some("three.pdf"), "third"),
    ]);
    let res = gateway.handle(multi_upload_request("batch/7", body)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body_string().unwrap(), "Files uploaded successfully");
    assert_eq!(
        sink.keys(),
        vec!["batch/7/one.pdf", "batch/7/two.pdf", "batch/7/three.pdf"]
    );

    let puts = sink.puts.lock();
    // Content is the raw bytes between the header terminator and the next delimiter.
    assert_eq!(puts[1].1, Bytes::from_static(b"second\r\nline\r\n"));
    assert!(puts
        .iter()
        .all(|(_, _, ct)| ct.as_deref() == Some("application/pdf")));
}

#[tokio::test]
async fn multi_upload_uses_configured_content_type() {
    let store = Arc::new(MemoryStore::new());
    let config = config().multipart_content_type("image/png");
    let gateway = Gateway::new(store.clone(), &config);

    let body = multipart_body(&[(Some("a.png"), "png")]);
    let res = gateway.handle(multi_upload_request("img", body)).await;
    assert_eq!(res.status, StatusCode::OK);

    let object = store.get("img/a.png").await.unwrap().unwrap();
    assert_eq!(object.content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn multi_upload_without_boundary_is_400() {
    let sink = Arc::new(RecordingSink::default());
    let gateway = gateway_with(sink.clone());

    let req = RequestBuilder::new(Method::Put, "/multiupload/batch")
        .header("Content-Type", "multipart/form-data")
        .body(multipart_body(&[(Some("a.pdf"), "a")]))
        .build();
    let res = gateway.handle(req).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body_string().unwrap(), "Could not find the boundary.");
    assert!(sink.keys().is_empty());
}

#[tokio::test]
async fn multi_upload_without_file_parts_succeeds_empty() {
    let sink = Arc::new(RecordingSink::default());
    let gateway = gateway_with(sink.clone());

    let body = multipart_body(&[(None, "just a field")]);
    let res = gateway.handle(multi_upload_request("batch", body)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(sink.keys().is_empty());
}

#[tokio::test]
async fn multi_upload_sink_failure_keeps_earlier_parts() {
    let sink = Arc::new(RecordingSink::failing_at(1));
    let gateway = gateway_with(sink.clone());

    let body = multipart_body(&[(Some("a.pdf"), "a"), (Some("b.pdf"), "b"), (Some("c.pdf"), "c")]);
    let res = gateway.handle(multi_upload_request("batch", body)).await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body_string().unwrap(), "Error uploading file");
    assert_eq!(sink.keys(), vec!["batch/a.pdf"]);
}

#[tokio::test]
async fn multi_upload_drops_unterminated_final_part() {
    let sink = Arc::new(RecordingSink::default());
    let gateway = gateway_with(sink.clone());

    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; filename=\"a.pdf\"\r\n\r\na\r\n\
         --{BOUNDARY}\r\nContent-Disposition: form-data; filename=\"b.pdf\"\r\n\r\ntruncated"
    );
    let res = gateway.handle(multi_upload_request("batch", body)).await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.body_string().unwrap().contains("1 file(s) stored before abort"));
    assert_eq!(sink.keys(), vec!["batch/a.pdf"]);
}

#[tokio::test]
async fn oversized_body_is_413() {
    let store = Arc::new(MemoryStore::new());
    let config = config().max_body_size(8);
    let gateway = Gateway::new(store.clone(), &config);

    let res = gateway
        .handle(upload_request("a.txt", "text/plain", b"far more than eight bytes"))
        .await;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(store.is_empty());
}

#[tokio::test]
async fn unknown_route_is_404() {
    let gateway = gateway_with(Arc::new(MemoryStore::new()));

    let res = gateway.handle(RequestBuilder::new(Method::Post, "/upload/a.txt").build()).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = gateway.handle(RequestBuilder::new(Method::Get, "/elsewhere").build()).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_rejects_empty_path() {
    let store = Arc::new(MemoryStore::new());
    let gateway = gateway_with(store.clone());

    let res = gateway.handle(upload_request("", "text/plain", b"data")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body_string().unwrap().starts_with("Invalid path"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn download_rejects_empty_path() {
    let sink = Arc::new(RecordingSink::default());
    let gateway = gateway_with(sink);

    // The sink would answer 500; the path check must come first.
    let res = gateway.handle(download_request("")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body_string().unwrap(), "Invalid path: empty file path");
}

#[tokio::test]
async fn multi_upload_reports_parts_stored_before_rejected_key() {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let root = std::env::temp_dir().join(format!(
        "bucketgate-rejected-part-{}-{nanos}",
        std::process::id()
    ));
    let store = Arc::new(FsStore::new(&root));
    let gateway = gateway_with(store.clone());

    let body = multipart_body(&[(Some("a.pdf"), "a"), (Some("../b.pdf"), "b")]);
    let res = gateway.handle(multi_upload_request("batch", body)).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.body_string().unwrap(),
        "Invalid path: batch/../b.pdf (1 file(s) stored before abort)"
    );
    assert!(store.get("batch/a.pdf").await.unwrap().is_some());

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn unreadable_body_still_gets_request_id() {
    let gateway = gateway_with(Arc::new(MemoryStore::new()));

    // Chunked body: no content-length for the body limit to check up front
    let head = RequestBuilder::new(Method::Put, "/upload/a.txt")
        .header("X-Request-ID", "req-413")
        .build();
    let res = gateway.reject(head, Error::BodyTooLarge { limit: 8 });

    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.header("x-request-id"), Some("req-413"));
}

#[tokio::test]
async fn declared_oversize_is_caught_by_body_limit() {
    let config = config().max_body_size(8);
    let gateway = Gateway::new(Arc::new(MemoryStore::new()), &config);

    let head = RequestBuilder::new(Method::Put, "/upload/a.txt")
        .header("Content-Length", "20")
        .build();
    let res = gateway.reject(head, Error::BodyTooLarge { limit: 8 });

    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(res.body_string().unwrap().contains("limit 8B"));
    assert!(res.header("x-request-id").is_some());
}

#[tokio::test]
async fn unknown_method_gets_405_with_request_id() {
    let gateway = gateway_with(Arc::new(MemoryStore::new()));

    let (head, ()) = http::Request::builder()
        .method("BREW")
        .uri("/upload/a.txt")
        .body(())
        .unwrap()
        .into_parts();
    let res = gateway.reject_method(&head);

    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.header("x-request-id").map(str::len), Some(16));
}
