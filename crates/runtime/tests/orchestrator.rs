mod common;

use std::time::Duration;

use common::{StubConnector, connect};
use mcp::Launchers;
use runtime::{
    ModelError, OrchestrationError, Orchestrator, Reply, RunOptions, ScriptedBackend, Session,
    SessionState, Timeouts, ToolCall, Turn,
};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

fn call(id: &str, name: &str, arguments: Value) -> Reply {
    Reply::ToolCall(ToolCall {
        id: id.into(),
        name: name.into(),
        arguments,
    })
}

fn text(s: &str) -> Reply {
    Reply::Text(s.into())
}

#[tokio::test]
async fn echo_scenario_takes_one_round_trip() {
    let connector = StubConnector::echo();
    let session = connect(&connector).await;
    let backend = ScriptedBackend::new([call("t1", "echo", json!({"text": "hi"})), text("hi")]);
    let orchestrator = Orchestrator::new(backend);

    let transcript = orchestrator
        .run_query_with_transcript(&session, "say hi", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(transcript.answer, "hi");
    assert_eq!(transcript.tool_calls, 1);
    assert_eq!(connector.stats.calls(), 1);
    assert_eq!(transcript.turns.len(), 4);
    assert_eq!(transcript.turns[0], Turn::user("say hi"));
    match &transcript.turns[2] {
        Turn::ToolResult(result) => {
            assert!(result.ok);
            assert_eq!(result.call_id, "t1");
            assert_eq!(result.text, "hi");
        }
        other => panic!("expected tool result, got {other:?}"),
    }
    assert_eq!(transcript.turns[3], Turn::model("hi"));
}

#[tokio::test]
async fn plain_answer_needs_no_tools() {
    let connector = StubConnector::echo();
    let session = connect(&connector).await;
    let orchestrator = Orchestrator::new(ScriptedBackend::new([text("Hello!")]));

    let answer = orchestrator
        .run_query(&session, "hello", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(answer, "Hello!");
    assert_eq!(connector.stats.calls(), 0);
}

#[tokio::test]
async fn backend_sees_the_catalog_and_history() {
    let connector = StubConnector::echo();
    let session = connect(&connector).await;
    let backend = ScriptedBackend::new([call("t1", "echo", json!({"text": "hi"})), text("hi")]);
    let orchestrator = Orchestrator::new(backend);

    orchestrator
        .run_query(&session, "say hi", &CancellationToken::new())
        .await
        .unwrap();

    let requests = orchestrator.backend().requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].tools, ["echo", "fail", "slow"]);
    assert_eq!(requests[0].turns, [Turn::user("say hi")]);
    assert_eq!(requests[1].turns.len(), 3);
}

#[tokio::test]
async fn empty_query_is_forwarded_verbatim() {
    let connector = StubConnector::echo();
    let session = connect(&connector).await;
    let orchestrator = Orchestrator::new(ScriptedBackend::new([text("What would you like?")]));

    let answer = orchestrator
        .run_query(&session, "", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(answer, "What would you like?");
    let requests = orchestrator.backend().requests().await;
    assert_eq!(requests[0].turns, [Turn::user("")]);
}

#[tokio::test]
async fn never_converging_backend_exhausts_budget() {
    let connector = StubConnector::echo();
    let session = connect(&connector).await;
    let backend = ScriptedBackend::repeating(call("loop", "echo", json!({"text": "again"})));
    let options = RunOptions {
        max_tool_calls: 3,
        ..RunOptions::default()
    };
    let orchestrator = Orchestrator::with_options(backend, options);

    let err = orchestrator
        .run_query(&session, "loop forever", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestrationError::BudgetExhausted { limit: 3 }));
    assert!(err.to_string().contains("tool-call budget exhausted"));
    assert_eq!(connector.stats.calls(), 3);
    assert_eq!(orchestrator.backend().calls().await, 4);
    assert_eq!(session.state(), SessionState::Ready);
}

#[tokio::test]
async fn converging_backend_finishes_within_budget() {
    let connector = StubConnector::echo();
    let session = connect(&connector).await;
    let script = (0..7)
        .map(|i| call(&format!("t{i}"), "echo", json!({"text": i.to_string()})))
        .chain([text("done")]);
    let orchestrator = Orchestrator::new(ScriptedBackend::new(script));

    let transcript = orchestrator
        .run_query_with_transcript(&session, "count", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(transcript.answer, "done");
    assert_eq!(transcript.tool_calls, 7);
}

#[tokio::test]
async fn unknown_tool_becomes_tool_failure() {
    let connector = StubConnector::echo();
    let session = connect(&connector).await;
    let backend = ScriptedBackend::new([
        call("t1", "doesNotExist", json!({})),
        text("That tool is not available."),
    ]);
    let orchestrator = Orchestrator::new(backend);

    let transcript = orchestrator
        .run_query_with_transcript(&session, "use a missing tool", &CancellationToken::new())
        .await
        .unwrap();

    match &transcript.turns[2] {
        Turn::ToolResult(result) => {
            assert!(!result.ok);
            assert!(result.text.contains("unknown tool: doesNotExist"));
        }
        other => panic!("expected tool result, got {other:?}"),
    }
    assert_eq!(transcript.answer, "That tool is not available.");
    assert_eq!(connector.stats.calls(), 0);
}

#[tokio::test]
async fn invalid_arguments_become_tool_failure() {
    let connector = StubConnector::echo();
    let session = connect(&connector).await;
    let backend = ScriptedBackend::new([
        call("t1", "echo", json!({"message": "hi"})),
        call("t2", "echo", json!({"text": "hi"})),
        text("hi"),
    ]);
    let orchestrator = Orchestrator::new(backend);

    let transcript = orchestrator
        .run_query_with_transcript(&session, "say hi", &CancellationToken::new())
        .await
        .unwrap();

    let failures: Vec<_> = transcript
        .turns
        .iter()
        .filter_map(|turn| match turn {
            Turn::ToolResult(result) if !result.ok => Some(result.text.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("invalid arguments for echo"));
    assert_eq!(connector.stats.calls(), 1);
}

#[tokio::test]
async fn tool_timeout_is_fed_back_and_loop_continues() {
    let connector = StubConnector::echo();
    let session = connect(&connector).await;
    let backend = ScriptedBackend::new([call("t1", "slow", json!({})), text("It took too long.")]);
    let orchestrator = Orchestrator::new(backend);

    let transcript = orchestrator
        .run_query_with_transcript(&session, "be slow", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(transcript.answer, "It took too long.");
    match &transcript.turns[2] {
        Turn::ToolResult(result) => {
            assert!(!result.ok);
            assert!(result.text.contains("timed out"));
        }
        other => panic!("expected tool result, got {other:?}"),
    }
}

#[tokio::test]
async fn backend_error_aborts_with_cause() {
    let connector = StubConnector::echo();
    let session = connect(&connector).await;
    let backend = ScriptedBackend::new([call("t1", "echo", json!({"text": "hi"}))])
        .then_fail("429 Too Many Requests");
    let orchestrator = Orchestrator::new(backend);

    let err = orchestrator
        .run_query(&session, "say hi", &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        OrchestrationError::Backend(ModelError::Api(message)) => {
            assert!(message.contains("429"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn respond_timeout_aborts_run() {
    let connector = StubConnector::echo();
    let session = connect(&connector).await;
    let backend = ScriptedBackend::default().then_stall(Duration::from_millis(500), text("late"));
    let options = RunOptions {
        respond_timeout: Duration::from_millis(50),
        ..RunOptions::default()
    };
    let orchestrator = Orchestrator::with_options(backend, options);

    let err = orchestrator
        .run_query(&session, "hurry", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::Backend(ModelError::Timeout(_))));
}

#[tokio::test]
async fn cancelled_before_start() {
    let connector = StubConnector::echo();
    let session = connect(&connector).await;
    let orchestrator = Orchestrator::new(ScriptedBackend::new([text("unused")]));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = orchestrator.run_query(&session, "hi", &cancel).await.unwrap_err();
    assert!(matches!(err, OrchestrationError::Cancelled));
    assert_eq!(orchestrator.backend().calls().await, 0);
}

#[tokio::test]
async fn cancel_while_waiting_leaves_session_ready() {
    let connector = StubConnector::echo();
    let session = connect(&connector).await;
    let backend = ScriptedBackend::new([call("t1", "echo", json!({"text": "hi"}))])
        .then_stall(Duration::from_secs(5), text("late"));
    let orchestrator = Orchestrator::new(backend);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = orchestrator.run_query(&session, "say hi", &cancel).await.unwrap_err();
    assert!(matches!(err, OrchestrationError::Cancelled));
    assert_eq!(session.state(), SessionState::Ready);

    let result = session.invoke("echo", serde_json::json!({"text": "still here"})).await.unwrap();
    assert_eq!(result.text, "still here");

    session.close().await;
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn cancel_during_tool_call_returns_promptly() {
    let mut connector = StubConnector::echo();
    connector.slow_delay = Duration::from_secs(5);
    let timeouts = Timeouts {
        connect: Duration::from_secs(2),
        request: Duration::from_secs(10),
    };
    let session = Session::connect("tool.py", &Launchers::default(), &connector, timeouts)
        .await
        .unwrap();
    let orchestrator = Orchestrator::new(ScriptedBackend::new([call("t1", "slow", json!({}))]));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = tokio::time::Instant::now();
    let err = orchestrator.run_query(&session, "be slow", &cancel).await.unwrap_err();
    assert!(matches!(err, OrchestrationError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(connector.stats.calls(), 1);

    // The abandoned call released the session.
    assert_eq!(session.state(), SessionState::Ready);
    let result = session.invoke("echo", json!({"text": "next"})).await.unwrap();
    assert_eq!(result.text, "next");
}

#[tokio::test]
async fn closed_session_is_fatal_to_run() {
    let connector = StubConnector::echo();
    let session = connect(&connector).await;
    session.close().await;
    let orchestrator = Orchestrator::new(ScriptedBackend::new([call("t1", "echo", json!({"text": "hi"}))]));

    let err = orchestrator
        .run_query(&session, "say hi", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestrationError::Session(runtime::SessionError::NotConnected)
    ));
}
