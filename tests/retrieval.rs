mod common;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anicine::Error;
use anicine::net::Request;
use anicine::net::retry::{Route, RetryPolicy};
use common::{MockTransport, RecordingSleeper, client, redirect, reply, reply_with_cookie};
use parking_lot::Mutex;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

fn request() -> Request {
    Request::parse("https://www.livechart.me/anime/11728").unwrap()
}

#[tokio::test]
async fn test_forbidden_with_proxy_falls_back_to_direct() {
    let transport = MockTransport::new()
        .with_proxy()
        .script([reply(403, ""), reply(403, ""), reply(200, "ok")]);
    let sleeper = RecordingSleeper::new();

    let mut request = request().with_proxy();
    let body = client(&transport, &sleeper)
        .fetch(&CancellationToken::new(), &mut request)
        .await
        .unwrap();

    assert_eq!(&body[..], b"ok");
    assert_eq!(transport.count(), 3);
    assert_eq!(transport.routes(), vec![Route::Proxied, Route::Direct, Route::Direct]);
    assert_eq!(sleeper.sleeps(), vec![Duration::ZERO, Duration::from_secs(15)]);
}

/// Shared buffer the test subscriber writes formatted events into.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn lines(&self, needle: &str) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .filter(|line| line.contains(needle))
            .map(String::from)
            .collect()
    }
}

#[tokio::test]
async fn test_accepted_response_logs_actual_route() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let transport = MockTransport::new()
        .with_proxy()
        .script([reply(403, ""), reply(403, ""), reply(200, "ok")]);
    let mut request = request().with_proxy();
    client(&transport, &RecordingSleeper::new())
        .fetch(&CancellationToken::new(), &mut request)
        .await
        .unwrap();

    let accepted = logs.lines("accepted response");
    assert_eq!(accepted.len(), 3);
    assert!(accepted[0].contains("proxy=true"));
    assert!(accepted[1].contains("proxy=false"));
    assert!(accepted[2].contains("proxy=false"));
}

#[tokio::test]
async fn test_canceled_before_first_attempt() {
    let transport = MockTransport::new().script([reply(200, "ok")]);
    let sleeper = RecordingSleeper::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = client(&transport, &sleeper).fetch(&cancel, &mut request()).await;

    assert!(matches!(result, Err(Error::Canceled)));
    assert_eq!(transport.count(), 0);
}

#[tokio::test]
async fn test_cancel_during_backoff_stops_retrying() {
    let transport = MockTransport::new().script([reply(429, ""), reply(200, "ok")]);
    let cancel = CancellationToken::new();
    let sleeper = RecordingSleeper::new().cancel_on_sleep(cancel.clone());

    let result = client(&transport, &sleeper).fetch(&cancel, &mut request()).await;

    assert!(matches!(result, Err(Error::Canceled)));
    assert_eq!(transport.count(), 1);
    assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(60)]);
}

#[tokio::test]
async fn test_terminal_failures_are_not_retried() {
    for (status, expected) in [(404, "not found"), (400, "not found"), (412, "bad data"), (428, "bad data")] {
        let transport = MockTransport::new().script([reply(status, ""), reply(200, "ok")]);
        let sleeper = RecordingSleeper::new();

        let error = client(&transport, &sleeper)
            .fetch(&CancellationToken::new(), &mut request())
            .await
            .unwrap_err();

        match expected {
            "not found" => assert!(matches!(error, Error::NotFound(_)), "{status}: {error}"),
            _ => assert!(matches!(error, Error::BadData(_)), "{status}: {error}"),
        }
        assert_eq!(transport.count(), 1);
    }
}

#[tokio::test]
async fn test_redirect_rewrites_request_url() {
    let transport = MockTransport::new().script([redirect(301, "/anime/12001"), reply(200, "moved")]);
    let sleeper = RecordingSleeper::new();

    let mut request = request();
    let body = client(&transport, &sleeper)
        .fetch(&CancellationToken::new(), &mut request)
        .await
        .unwrap();

    assert_eq!(&body[..], b"moved");
    assert_eq!(request.url.as_str(), "https://www.livechart.me/anime/12001");
    assert_eq!(transport.paths(), vec!["/anime/11728", "/anime/12001"]);
    assert!(sleeper.sleeps().is_empty());
}

#[tokio::test]
async fn test_redirect_without_location_is_not_found() {
    let mut missing = redirect(302, "");
    missing.location = None;
    let transport = MockTransport::new().script([missing]);
    let sleeper = RecordingSleeper::new();

    let result = client(&transport, &sleeper)
        .fetch(&CancellationToken::new(), &mut request())
        .await;

    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_empty_success_body_is_no_data() {
    let transport = MockTransport::new().script([reply(200, "")]);
    let sleeper = RecordingSleeper::new();

    let result = client(&transport, &sleeper)
        .fetch(&CancellationToken::new(), &mut request())
        .await;

    assert!(matches!(result, Err(Error::NoData(_))));
    assert_eq!(transport.count(), 1);
}

#[tokio::test]
async fn test_budget_exhaustion_is_no_data() {
    let transport = MockTransport::new().script((0..20).map(|_| reply(503, "")));
    let sleeper = RecordingSleeper::new();

    let result = client(&transport, &sleeper)
        .fetch(&CancellationToken::new(), &mut request())
        .await;

    assert!(matches!(result, Err(Error::NoData(_))));
    assert_eq!(transport.count(), RetryPolicy::default().max_attempts);
    assert!(sleeper.sleeps().is_empty());
}

#[tokio::test]
async fn test_custom_policy_budget() {
    let transport = MockTransport::new().script((0..5).map(|_| reply(403, "")));
    let sleeper = RecordingSleeper::new();
    let policy = RetryPolicy {
        max_attempts: 3,
        forbidden_backoff: Duration::from_millis(5),
        ..Default::default()
    };

    let result = client(&transport, &sleeper)
        .with_policy(policy)
        .fetch(&CancellationToken::new(), &mut request())
        .await;

    assert!(matches!(result, Err(Error::NoData(_))));
    assert_eq!(transport.count(), 3);
    assert_eq!(sleeper.sleeps(), vec![Duration::from_millis(5); 3]);
}

#[tokio::test]
async fn test_rate_limit_backoffs_per_route() {
    let transport = MockTransport::new()
        .with_proxy()
        .script([reply(429, ""), reply(429, ""), reply(200, "ok")]);
    let sleeper = RecordingSleeper::new();

    let mut request = request().with_proxy();
    client(&transport, &sleeper)
        .fetch(&CancellationToken::new(), &mut request)
        .await
        .unwrap();

    assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(15), Duration::from_secs(60)]);
}

#[tokio::test]
async fn test_proxy_request_without_proxy_client_stays_direct() {
    let transport = MockTransport::new().script([reply(403, ""), reply(200, "ok")]);
    let sleeper = RecordingSleeper::new();

    let mut request = request().with_proxy();
    client(&transport, &sleeper)
        .fetch(&CancellationToken::new(), &mut request)
        .await
        .unwrap();

    assert_eq!(transport.routes(), vec![Route::Direct, Route::Direct]);
    assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(15)]);
}

#[tokio::test]
async fn test_transport_error_consumes_an_attempt() {
    let transport = MockTransport::new().fail_once().script([reply(200, "ok")]);
    let sleeper = RecordingSleeper::new();

    let body = client(&transport, &sleeper)
        .fetch(&CancellationToken::new(), &mut request())
        .await
        .unwrap();

    assert_eq!(&body[..], b"ok");
    assert_eq!(transport.count(), 2);
}

#[tokio::test]
async fn test_success_stores_cookies_and_sends_user_agent() {
    let transport = MockTransport::new().script([reply_with_cookie("ok", "session", "abc")]);
    let sleeper = RecordingSleeper::new();

    let mut request = request().with_header("Authority", "www.livechart.me");
    client(&transport, &sleeper)
        .fetch(&CancellationToken::new(), &mut request)
        .await
        .unwrap();

    assert_eq!(request.cookies().len(), 1);
    assert_eq!(request.cookies()[0].name, "session");
    assert_eq!(request.cookies()[0].value, "abc");

    let headers = &transport.calls()[0].headers;
    assert_eq!(headers[0].0, "User-Agent");
    assert_eq!(headers[1], ("Authority".to_string(), "www.livechart.me".to_string()));
}

#[tokio::test]
async fn test_get_json_decodes_body() {
    #[derive(Deserialize)]
    struct Payload {
        id: String,
    }

    let transport = MockTransport::new().script([reply(200, r#"{"id":"0ZpGFaIiR"}"#)]);
    let sleeper = RecordingSleeper::new();

    let payload: Payload = client(&transport, &sleeper)
        .get_json(&CancellationToken::new(), &mut request())
        .await
        .unwrap();

    assert_eq!(payload.id, "0ZpGFaIiR");
}

#[test]
fn test_invalid_url_is_bad_data() {
    assert!(matches!(Request::parse("not a url"), Err(Error::BadData(_))));
}
