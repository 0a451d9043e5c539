//! Round-trip tests of the request pipeline against a loopback HTTP server.
//!
//! The server is a plain `tokio` TCP listener answering one connection with a
//! canned HTTP/1.1 response; each test asserts on the raw request the
//! pipeline produced and on how the response was classified.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use super::request::{ApiRequest, RequestBody};
use super::response::ResponseBody;
use super::{Client, Credentials, Endpoint, Error};

const TEST_KEY_PEM: &str = include_str!("testdata/api_key.pem");

/// Serves exactly one connection, replying with `response` and returning the
/// raw request bytes received.
async fn serve_once(response: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut received = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let read = socket.read(&mut chunk).await.expect("read");
            if read == 0 {
                break;
            }
            received.extend_from_slice(&chunk[..read]);
            if request_complete(&received) {
                break;
            }
        }
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&received).into_owned()
    });

    (format!("http://{addr}"), handle)
}

/// True once the header block and the advertised content-length worth of body
/// have arrived.
fn request_complete(received: &[u8]) -> bool {
    let Some(header_end) = received
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
    else {
        return false;
    };
    let headers = String::from_utf8_lossy(&received[..header_end]);
    let content_length = headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    received.len() >= header_end + 4 + content_length
}

/// Routes `tracing` output (including the debug dumps) to the test harness.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn test_client(base_url: &str) -> Client {
    init_tracing();
    Client::builder()
        .with_region("us-phoenix-1")
        .with_url_template(base_url)
        .with_credentials(
            Credentials::api_key(
                "ocid1.tenancy.oc1..aaaa",
                "ocid1.user.oc1..bbbb",
                "8c:bf:17:7b",
                TEST_KEY_PEM,
            )
            .expect("credentials"),
        )
        .build()
        .expect("client")
}

struct InstanceRequest {
    id: &'static str,
    stream: bool,
}

impl ApiRequest for InstanceRequest {
    fn url(&self, endpoint: &Endpoint) -> Result<Url, Error> {
        endpoint.url(&["instances", self.id], &[])
    }

    fn response_as_stream(&self) -> bool {
        self.stream
    }
}

struct LaunchRequest {
    payload: &'static [u8],
}

impl ApiRequest for LaunchRequest {
    fn url(&self, endpoint: &Endpoint) -> Result<Url, Error> {
        endpoint.url(&["instances"], &[])
    }

    fn body(&self) -> Result<RequestBody, Error> {
        Ok(RequestBody::Bytes(Bytes::from_static(self.payload)))
    }

    fn headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("opc-retry-token"),
            HeaderValue::from_static("token-1"),
        );
        Ok(headers)
    }
}

/// A descriptor whose body marshaling always fails; GET and DELETE must never
/// trigger it.
struct PoisonedBodyRequest;

impl ApiRequest for PoisonedBodyRequest {
    fn url(&self, endpoint: &Endpoint) -> Result<Url, Error> {
        endpoint.url(&["instances"], &[])
    }

    fn body(&self) -> Result<RequestBody, Error> {
        Err(Error::MalformedRequest {
            message: "body marshaling must not run for GET/DELETE".to_string(),
        })
    }
}

#[tokio::test]
async fn test_get_buffers_successful_response() -> anyhow::Result<()> {
    let (base_url, server) = serve_once(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 17\r\nconnection: close\r\n\r\n{\"state\":\"READY\"}",
    )
    .await;
    let client = test_client(&base_url);

    let response = client
        .compute()
        .get(&InstanceRequest {
            id: "ocid1.instance.oc1..xyz",
            stream: false,
        })
        .await?;

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.bytes().expect("buffered body").as_ref(),
        br#"{"state":"READY"}"#
    );
    assert!(matches!(response.body(), ResponseBody::Buffered(_)));

    let received = server.await?;
    assert!(received.starts_with("GET /20160918/instances/ocid1.instance.oc1..xyz HTTP/1.1"));
    assert!(received.contains("authorization: Signature version=\"1\""));
    assert!(received.contains("keyId=\"ocid1.tenancy.oc1..aaaa/ocid1.user.oc1..bbbb/8c:bf:17:7b\""));
    assert!(received.contains("algorithm=\"rsa-sha256\""));
    assert!(received.contains("date: "));
    // no body was marshaled, so no digest header either
    assert!(!received.contains("x-content-sha256"));
    Ok(())
}

#[tokio::test]
async fn test_post_sends_signed_body() -> anyhow::Result<()> {
    let (base_url, server) = serve_once(
        "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}",
    )
    .await;
    let client = test_client(&base_url);

    client
        .compute()
        .execute(
            Method::POST,
            &LaunchRequest {
                payload: br#"{"shape":"VM.Standard2.1"}"#,
            },
        )
        .await?;

    let received = server.await?;
    assert!(received.starts_with("POST /20160918/instances HTTP/1.1"));
    assert!(received.contains("content-type: application/json"));
    assert!(received.contains("content-length: 26"));
    assert!(received.contains("x-content-sha256: "));
    assert!(received.contains("opc-retry-token: token-1"));
    assert!(received.contains(
        "headers=\"date (request-target) host content-length content-type x-content-sha256\""
    ));
    assert!(received.ends_with(r#"{"shape":"VM.Standard2.1"}"#));
    Ok(())
}

#[tokio::test]
async fn test_error_status_yields_api_error() {
    let (base_url, server) = serve_once(
        "HTTP/1.1 404 Not Found\r\ncontent-type: application/json\r\nopc-request-id: req-42\r\ncontent-length: 71\r\nconnection: close\r\n\r\n{\"code\": \"NotAuthorizedOrNotFound\", \"message\": \"instance not found\"}   ",
    )
    .await;
    let client = test_client(&base_url);

    let result = client
        .compute()
        .get(&InstanceRequest {
            id: "ocid1.instance.oc1..missing",
            stream: false,
        })
        .await;

    let Err(Error::Api(error)) = result else {
        panic!("expected an API error");
    };
    assert_eq!(error.status, 404);
    assert_eq!(error.code, "NotAuthorizedOrNotFound");
    assert_eq!(error.message, "instance not found");
    assert_eq!(error.request_id.as_deref(), Some("req-42"));

    server.await.expect("server");
}

#[tokio::test]
async fn test_streaming_response_hands_back_open_stream() -> anyhow::Result<()> {
    let (base_url, server) = serve_once(
        "HTTP/1.1 200 OK\r\ncontent-type: application/octet-stream\r\ncontent-length: 11\r\nconnection: close\r\n\r\nobject data",
    )
    .await;
    let client = test_client(&base_url);

    let response = client
        .object_storage()
        .get(&InstanceRequest {
            id: "ignored",
            stream: true,
        })
        .await?;

    assert!(response.bytes().is_none());
    let stream = response.into_stream().expect("stream");
    let collected = stream.collect().await?;
    assert_eq!(collected.as_ref(), b"object data");

    server.await?;
    Ok(())
}

#[tokio::test]
async fn test_streaming_is_not_honored_for_error_responses() {
    let (base_url, server) = serve_once(
        "HTTP/1.1 409 Conflict\r\ncontent-type: application/json\r\ncontent-length: 57\r\nconnection: close\r\n\r\n{\"code\": \"IncorrectState\", \"message\": \"bucket is locked\"}",
    )
    .await;
    let client = test_client(&base_url);

    let result = client
        .object_storage()
        .get(&InstanceRequest {
            id: "ignored",
            stream: true,
        })
        .await;

    // The error body is buffered and parsed even though streaming was
    // requested; streamed error bodies do not exist.
    let Err(Error::Api(error)) = result else {
        panic!("expected an API error");
    };
    assert_eq!(error.status, 409);
    assert_eq!(error.code, "IncorrectState");
    assert_eq!(error.message, "bucket is locked");

    server.await.expect("server");
}

#[tokio::test]
async fn test_get_and_delete_never_marshal_a_body() {
    let (base_url, server) = serve_once(
        "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}",
    )
    .await;
    let client = test_client(&base_url);

    client
        .compute()
        .get(&PoisonedBodyRequest)
        .await
        .expect("GET must not marshal a body");

    server.await.expect("server");

    let (base_url, server) = serve_once(
        "HTTP/1.1 204 No Content\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
    )
    .await;
    let client = test_client(&base_url);

    client
        .compute()
        .delete(&PoisonedBodyRequest)
        .await
        .expect("DELETE must not marshal a body");

    server.await.expect("server");
}

#[tokio::test]
async fn test_debug_dump_leaves_the_call_unchanged() -> anyhow::Result<()> {
    init_tracing();
    let (base_url, server) = serve_once(
        "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}",
    )
    .await;
    let client = Client::builder()
        .with_region("us-phoenix-1")
        .with_url_template(&base_url)
        .with_credentials(Credentials::api_key(
            "ocid1.tenancy.oc1..aaaa",
            "ocid1.user.oc1..bbbb",
            "8c:bf:17:7b",
            TEST_KEY_PEM,
        )?)
        .with_debug_dump(true)
        .build()?;

    // The dumps are diagnostics only: the wire exchange must be identical.
    let response = client
        .compute()
        .get(&InstanceRequest {
            id: "ocid1.instance.oc1..xyz",
            stream: false,
        })
        .await?;

    assert_eq!(response.status(), 200);
    assert_eq!(response.bytes().expect("buffered body").as_ref(), b"{}");
    server.await?;
    Ok(())
}

#[tokio::test]
async fn test_body_marshal_error_aborts_before_dispatch() {
    // No server at all: a marshal failure must surface before any I/O.
    let client = test_client("http://127.0.0.1:9");

    let result = client
        .compute()
        .execute(Method::POST, &PoisonedBodyRequest)
        .await;

    assert!(matches!(result, Err(Error::MalformedRequest { .. })));
}

#[tokio::test]
async fn test_truncated_body_read_is_a_transport_error() {
    // Advertise more bytes than are sent, then close the connection.
    let (base_url, server) = serve_once(
        "HTTP/1.1 200 OK\r\ncontent-length: 100\r\nconnection: close\r\n\r\nshort",
    )
    .await;
    let client = test_client(&base_url);

    let result = client
        .compute()
        .get(&InstanceRequest {
            id: "ocid1.instance.oc1..xyz",
            stream: false,
        })
        .await;

    assert!(matches!(result, Err(Error::Transport(_))));
    server.await.expect("server");
}

#[tokio::test]
async fn test_connection_refused_is_a_transport_error() {
    // Port 9 (discard) is almost certainly closed on loopback.
    let client = test_client("http://127.0.0.1:9");

    let result = client
        .compute()
        .get(&InstanceRequest {
            id: "ocid1.instance.oc1..xyz",
            stream: false,
        })
        .await;

    assert!(matches!(result, Err(Error::Transport(_))));
}
