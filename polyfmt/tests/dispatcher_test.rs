//! Dispatcher validation, routing and boundary mapping, using recording stub
//! executors so no real formatter is involved unless a test says so.

use async_trait::async_trait;
use polyfmt::dispatcher::{Dispatcher, FormatRequest};
use polyfmt::error::{ErrorCategory, FormatError, RequestError};
use polyfmt::executor::StrategyExecutor;
use polyfmt::language::{FormatStrategy, Language, LanguageRegistry};
use polyfmt::outcome::ExecutionOutcome;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

#[derive(Debug)]
struct StubExecutor {
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, FormatStrategy)>>,
    reply: ExecutionOutcome,
}

impl StubExecutor {
    fn replying(reply: ExecutionOutcome) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            reply,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StrategyExecutor for StubExecutor {
    async fn run(&self, code: &str, strategy: &FormatStrategy) -> ExecutionOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((code.to_string(), strategy.clone()));
        self.reply.clone()
    }
}

fn dispatcher_with(library: Arc<StubExecutor>, process: Arc<StubExecutor>) -> Dispatcher {
    Dispatcher::with_executors(
        LanguageRegistry::builtin(),
        library,
        process,
        Duration::from_secs(10),
    )
}

#[tokio::test]
async fn test_blank_fields_rejected_before_any_executor() {
    let library = StubExecutor::replying(ExecutionOutcome::success("x"));
    let process = StubExecutor::replying(ExecutionOutcome::success("x"));
    let dispatcher = dispatcher_with(library.clone(), process.clone());

    let cases = [
        (FormatRequest::new("", "json"), RequestError::EmptyCode),
        (FormatRequest::new(" \n\t", "json"), RequestError::EmptyCode),
        (FormatRequest::new("{}", ""), RequestError::EmptyLanguage),
        (FormatRequest::new("{}", "   "), RequestError::EmptyLanguage),
    ];
    for (request, expected) in cases {
        assert_eq!(dispatcher.dispatch(&request).await.unwrap_err(), expected);
        let err = dispatcher.format(&request).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(
            err.to_string(),
            "Missing required fields: \"code\" and \"language\" are required."
        );
    }
    assert_eq!(library.calls(), 0);
    assert_eq!(process.calls(), 0);
}

#[tokio::test]
async fn test_unsupported_language_runs_nothing() {
    let library = StubExecutor::replying(ExecutionOutcome::success("x"));
    let process = StubExecutor::replying(ExecutionOutcome::success("x"));
    let dispatcher = dispatcher_with(library.clone(), process.clone());

    let err = dispatcher
        .format(&FormatRequest::new("IDENTIFICATION DIVISION.", "cobol"))
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::UnsupportedLanguage);
    assert_eq!(err.category().http_status(), 400);
    assert!(err.to_string().starts_with("Unsupported language: \"cobol\"."));
    assert!(err.to_string().contains("javascript, json, html, css, python, java, c++, xml"));
    assert_eq!(library.calls() + process.calls(), 0);
}

#[tokio::test]
async fn test_routes_by_strategy_family() {
    let library = StubExecutor::replying(ExecutionOutcome::success("lib"));
    let process = StubExecutor::replying(ExecutionOutcome::success("proc"));
    let dispatcher = dispatcher_with(library.clone(), process.clone());

    let outcome = dispatcher
        .dispatch(&FormatRequest::new("x=1", "PY"))
        .await
        .unwrap();
    assert_eq!(outcome, ExecutionOutcome::success("proc"));
    assert_eq!((library.calls(), process.calls()), (0, 1));
    assert_eq!(
        process.seen.lock().unwrap()[0],
        (
            "x=1".to_string(),
            FormatStrategy::external("black", &["-q", "-"])
        )
    );

    let outcome = dispatcher
        .dispatch(&FormatRequest::new("a{}", "scss"))
        .await
        .unwrap();
    assert_eq!(outcome, ExecutionOutcome::success("lib"));
    assert_eq!((library.calls(), process.calls()), (1, 1));
}

#[tokio::test]
async fn test_outcome_passes_through_unchanged() {
    let replies = [
        ExecutionOutcome::validation_failure("Unexpected token (1:7)"),
        ExecutionOutcome::tool_unavailable("No such file or directory (os error 2)"),
        ExecutionOutcome::tool_failure(123, "error: cannot format -: Cannot parse: 1:4\n"),
        ExecutionOutcome::Timeout,
    ];
    for reply in replies {
        let stub = StubExecutor::replying(reply.clone());
        let dispatcher = dispatcher_with(stub.clone(), stub.clone());
        let outcome = dispatcher
            .dispatch(&FormatRequest::new("code", "java"))
            .await
            .unwrap();
        assert_eq!(outcome, reply);
    }
}

#[tokio::test]
async fn test_format_maps_outcomes_to_categories() {
    let cases = [
        (
            ExecutionOutcome::validation_failure("bad"),
            ErrorCategory::Validation,
            400,
        ),
        (
            ExecutionOutcome::tool_unavailable("os error 2"),
            ErrorCategory::ToolUnavailable,
            500,
        ),
        (
            ExecutionOutcome::tool_failure(1, "oops"),
            ErrorCategory::ToolFailure,
            400,
        ),
        (ExecutionOutcome::Timeout, ErrorCategory::Timeout, 504),
    ];
    for (reply, category, status) in cases {
        let stub = StubExecutor::replying(reply);
        let dispatcher = dispatcher_with(stub.clone(), stub);
        let err = dispatcher
            .format(&FormatRequest::new("int main(){}", "cpp"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), category);
        assert_eq!(err.category().http_status(), status);
    }
}

#[tokio::test]
async fn test_error_messages_name_the_command() {
    let stub = StubExecutor::replying(ExecutionOutcome::Timeout);
    let dispatcher = dispatcher_with(stub.clone(), stub);
    let err = dispatcher
        .format(&FormatRequest::new("<a/>", "xml"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        FormatError::Timeout {
            command: "xmllint".to_string(),
            timeout: Duration::from_secs(10)
        }
    );

    let stub = StubExecutor::replying(ExecutionOutcome::tool_unavailable("os error 2"));
    let dispatcher = dispatcher_with(stub.clone(), stub);
    let err = dispatcher
        .format(&FormatRequest::new("class A {}", "java"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to start the formatter process for \"google-java-format\". Is it installed and in your PATH?"
    );
    assert_eq!(err.detail(), Some("os error 2"));
}

#[tokio::test]
async fn test_success_body_counts_characters() {
    let stub = StubExecutor::replying(ExecutionOutcome::success("é = 1\n"));
    let dispatcher = dispatcher_with(stub.clone(), stub);
    let response = dispatcher
        .format(&FormatRequest::new("é=1", "python"))
        .await
        .unwrap();
    assert_eq!(response.language, Language::Python);
    assert_eq!(response.input_chars, 3);
    assert_eq!(response.output_chars, 6);

    let body = serde_json::to_value(&response).unwrap();
    assert_eq!(body["formattedCode"], "é = 1\n");
    assert_eq!(body["language"], "python");
    assert_eq!(body["inputChars"], 3);
    assert_eq!(body["outputChars"], 6);
}

#[tokio::test]
async fn test_real_executors_format_json_end_to_end() {
    let dispatcher = Dispatcher::new();
    let response = dispatcher
        .format(&FormatRequest::new(r#"{"a":1}"#, "JSON"))
        .await
        .unwrap();
    assert_eq!(response.formatted_code, "{\n    \"a\": 1\n}\n");
    assert_eq!(response.language, Language::Json);

    let err = dispatcher
        .format(&FormatRequest::new(r#"{"a":"#, "json"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Syntax validation failed.");
    assert!(err.detail().is_some_and(|d| !d.is_empty()));
}

#[tokio::test]
async fn test_one_dispatcher_serves_concurrent_requests() {
    let dispatcher = Arc::new(Dispatcher::new());
    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                dispatcher
                    .format(&FormatRequest::new(format!("[{i}]"), "json"))
                    .await
            })
        })
        .collect();
    for (i, task) in futures::future::join_all(tasks).await.into_iter().enumerate() {
        let response = task.unwrap().unwrap();
        assert_eq!(response.formatted_code, format!("[\n    {i}\n]\n"));
    }
}
