//! Request dispatcher resolving inbound requests against the rule store.

use crate::logger::Logger;
use crate::rules::RuleStore;
use crate::types::rule::{Handler, Responder, Rule, StaticResponse};
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::Response;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared per-server state consulted on every request.
///
/// Rules, logger and unknown-request handler can be changed while serving.
/// Requests in flight see whichever state they read first.
#[derive(Default)]
pub struct Dispatcher {
    rules: RwLock<RuleStore>,
    logger: RwLock<Option<Arc<dyn Logger>>>,
    unknown_handler: RwLock<Option<Handler>>,
}

impl Dispatcher {
    pub fn new(rules: RuleStore) -> Self {
        Self {
            rules: RwLock::new(rules),
            ..Self::default()
        }
    }

    /// Append rules in the given order.
    pub fn add_rules(&self, rules: impl IntoIterator<Item = Rule>) {
        write(&self.rules).add_rules(rules);
    }

    pub fn set_logger(&self, logger: Option<Arc<dyn Logger>>) {
        *write(&self.logger) = logger;
    }

    pub fn set_unknown_handler(&self, handler: Option<Handler>) {
        *write(&self.unknown_handler) = handler;
    }

    /// Number of registered rules.
    pub fn rule_count(&self) -> usize {
        read(&self.rules).len()
    }

    /// Answer one request.
    ///
    /// Unmatched requests go to the unknown-request handler, or get an empty
    /// 200 when none is set.
    pub async fn dispatch(&self, req: Request) -> Response {
        let method = req.method().as_str().to_owned();
        let path = decode_path(req.uri().path());
        let raw_query = req.uri().query().unwrap_or_default();

        tracing::debug!(%method, %path, query = raw_query, "dispatching request");

        // Clone out so no lock is held across a handler await.
        let rule = read(&self.rules)
            .find_rule(&method, &path, raw_query)
            .cloned();

        let Some(rule) = rule else {
            self.logf(format_args!("unknown request: {} {}", method, path));
            let handler = read(&self.unknown_handler).clone();
            return match handler {
                Some(handler) => handler.call(req).await,
                None => Response::default(),
            };
        };

        match &rule.response {
            Responder::Delegated(handler) => handler.call(req).await,
            Responder::Static(resp) => {
                let response = static_response(resp);
                self.logf(format_args!("handler : {} {} -> {:?}", method, path, rule));
                response
            }
        }
    }

    fn logf(&self, args: fmt::Arguments<'_>) {
        if let Some(logger) = read(&self.logger).as_ref() {
            logger.logf(args);
        }
    }
}

/// axum entry point; every request is routed here through the fallback.
pub async fn handle(State(dispatcher): State<Arc<Dispatcher>>, req: Request) -> Response {
    dispatcher.dispatch(req).await
}

/// Build the reply for a static rule.
///
/// `Content-Type` is always written, even when empty. Headers or statuses the
/// HTTP layer cannot represent are skipped with a warning. Header names are
/// applied in sorted order, so among names differing only in case the
/// lexicographically last spelling wins.
pub fn static_response(resp: &StaticResponse) -> Response {
    let mut response = Response::new(Body::from(resp.body.clone()));

    let headers = response.headers_mut();
    match HeaderValue::from_str(&resp.content_type) {
        Ok(value) => {
            headers.insert(CONTENT_TYPE, value);
        }
        Err(err) => {
            tracing::warn!(content_type = %resp.content_type, %err, "skipping invalid content type");
        }
    }

    let mut entries: Vec<_> = resp.headers.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (name, values) in entries {
        let Some(value) = values.first() else {
            continue;
        };
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, %value, "skipping invalid header"),
        }
    }

    if resp.status != 0 {
        match StatusCode::from_u16(resp.status) {
            Ok(status) => *response.status_mut() = status,
            Err(err) => tracing::warn!(status = resp.status, %err, "ignoring invalid status"),
        }
    }

    response
}

/// Percent-decode a request path so rules are written in plain form.
///
/// Paths that do not decode to UTF-8 are matched as sent.
pub fn decode_path(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|path| path.into_owned())
        .unwrap_or_else(|_| raw.to_owned())
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::response::IntoResponse;
    use rstest::rstest;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Logger for Recorder {
        fn logf(&self, args: fmt::Arguments<'_>) {
            self.0.lock().unwrap().push(args.to_string());
        }
    }

    fn request(method: &str, uri: &str) -> Request {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("Should build request")
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body");
        String::from_utf8(bytes.to_vec()).expect("Should be utf-8")
    }

    fn dispatcher_with(rules: impl IntoIterator<Item = Rule>) -> Dispatcher {
        let dispatcher = Dispatcher::default();
        dispatcher.add_rules(rules);
        dispatcher
    }

    #[rstest]
    #[case("/hello", "hello, world")]
    #[case("/hello?dummy=1", "hello, world with query string")]
    #[case("/hello?dummy=2", "hello, world")]
    #[tokio::test]
    async fn test_dispatch_static_rule(#[case] uri: &str, #[case] expected: &str) {
        let dispatcher = dispatcher_with([
            Rule::new("GET", "/hello").status(200).body("hello, world"),
            Rule::new("GET", "/hello")
                .query("dummy=1")
                .status(200)
                .body("hello, world with query string"),
        ]);

        let response = dispatcher.dispatch(request("GET", uri)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, expected);
    }

    #[rstest]
    #[case("/hello", "/hello")]
    #[case("/a%20b", "/a b")]
    #[case("/caf%C3%A9", "/café")]
    #[case("/a%2Fb", "/a/b")]
    #[case("/a+b", "/a+b")]
    #[case("/bad%FF", "/bad%FF")]
    fn test_decode_path(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(decode_path(raw), expected);
    }

    #[rstest]
    #[case("/a%20b", "decoded")]
    #[case("/caf%C3%A9", "utf8")]
    #[tokio::test]
    async fn test_dispatch_matches_decoded_path(#[case] uri: &str, #[case] expected: &str) {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = dispatcher_with([
            Rule::new("GET", "/a b").status(201).body("decoded"),
            Rule::new("GET", "/café").status(202).body("utf8"),
        ]);
        dispatcher.set_logger(Some(recorder.clone()));

        let response = dispatcher.dispatch(request("GET", uri)).await;
        assert_ne!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, expected);
        assert!(!recorder.0.lock().unwrap()[0].starts_with("unknown request"));
    }

    #[rstest]
    #[tokio::test]
    async fn test_dispatch_logs_decoded_path() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::default();
        dispatcher.set_logger(Some(recorder.clone()));

        dispatcher.dispatch(request("GET", "/no%20such")).await;
        assert_eq!(
            recorder.0.lock().unwrap().as_slice(),
            ["unknown request: GET /no such"]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_dispatch_unknown_without_handler() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::default();
        dispatcher.set_logger(Some(recorder.clone()));

        let response = dispatcher.dispatch(request("GET", "/sushi")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(body_string(response).await, "");
        assert_eq!(
            recorder.0.lock().unwrap().as_slice(),
            ["unknown request: GET /sushi"]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_dispatch_unknown_with_handler() {
        let dispatcher = Dispatcher::default();
        dispatcher.set_unknown_handler(Some(Handler::new(|_| async {
            (StatusCode::NOT_FOUND, "not found from unknown handler").into_response()
        })));

        let response = dispatcher.dispatch(request("GET", "/sushi")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, "not found from unknown handler");
    }

    #[rstest]
    #[tokio::test]
    async fn test_dispatch_delegated_rule_skips_logger() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = dispatcher_with([Rule::new("GET", "/hello").handler(Handler::new(
            |_| async { (StatusCode::OK, "hello, world from custom handler").into_response() },
        ))]);
        dispatcher.set_logger(Some(recorder.clone()));

        let response = dispatcher.dispatch(request("GET", "/hello")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "hello, world from custom handler");
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_dispatch_static_rule_logs_handler_line() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = dispatcher_with([Rule::new("GET", "/hello").status(200).body("hi")]);
        dispatcher.set_logger(Some(recorder.clone()));

        dispatcher.dispatch(request("GET", "/hello")).await;

        let lines = recorder.0.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("handler : GET /hello -> Rule"));
    }

    #[rstest]
    fn test_static_response_headers() {
        let rule = Rule::new("GET", "/hello")
            .content_type("text/plain")
            .header("X-Custom-Header", "custom header from mock")
            .header("X-Custom-Header", "second value");
        let response = static_response(rule.static_response().expect("Should be static"));

        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(
            response.headers()["x-custom-header"],
            "custom header from mock"
        );
        assert_eq!(response.headers().get_all("x-custom-header").iter().count(), 1);
    }

    #[rstest]
    fn test_static_response_case_colliding_headers() {
        for _ in 0..8 {
            let rule = Rule::new("GET", "/")
                .header("x-a", "lower")
                .header("X-A", "upper")
                .header("X-b", "b");
            let response = static_response(rule.static_response().expect("Should be static"));
            assert_eq!(response.headers()["x-a"], "lower");
            assert_eq!(response.headers().get_all("x-a").iter().count(), 1);
            assert_eq!(response.headers()["x-b"], "b");
        }
    }

    #[rstest]
    fn test_static_response_writes_empty_content_type() {
        let response = static_response(&StaticResponse::default());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "");
    }

    #[rstest]
    #[case(0, StatusCode::OK)]
    #[case(201, StatusCode::CREATED)]
    #[case(404, StatusCode::NOT_FOUND)]
    #[case(503, StatusCode::SERVICE_UNAVAILABLE)]
    #[case(42, StatusCode::OK)]
    fn test_static_response_status(#[case] status: u16, #[case] expected: StatusCode) {
        let response = static_response(&StaticResponse {
            status,
            ..StaticResponse::default()
        });
        assert_eq!(response.status(), expected);
    }

    #[rstest]
    fn test_static_response_skips_invalid_header() {
        let rule = Rule::new("GET", "/")
            .header("bad header", "v")
            .header("X-Ok", "v");
        let response = static_response(rule.static_response().expect("Should be static"));
        assert_eq!(response.headers()["x-ok"], "v");
        assert_eq!(response.headers().len(), 2);
    }

    #[rstest]
    fn test_rule_count() {
        let dispatcher = Dispatcher::new(RuleStore::new());
        dispatcher.add_rules([Rule::new("GET", "/a"), Rule::new("GET", "/a")]);
        assert_eq!(dispatcher.rule_count(), 2);
    }
}
