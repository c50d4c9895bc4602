//! The stdio client against a real child process.
//!
//! The fixture is a small python3 tool server. Tests return early when
//! python3 is not installed.

use std::collections::HashMap;
use std::io;
use std::time::Duration;

use mcp::{Error, Server, ServerConfig};
use serde_json::json;

const FIXTURE: &str = r#"
import json, sys, time

def send(obj):
    sys.stdout.write(json.dumps(obj) + "\n")
    sys.stdout.flush()

print("fixture starting")
sys.stdout.flush()

while True:
    line = sys.stdin.readline()
    if not line:
        break
    line = line.strip()
    if not line:
        continue
    try:
        msg = json.loads(line)
    except ValueError:
        send({"jsonrpc": "2.0", "id": None, "error": {"code": -32700, "message": "parse error"}})
        continue
    if "id" not in msg:
        continue
    rid = msg["id"]
    method = msg["method"]
    if method == "initialize":
        send({"jsonrpc": "2.0", "id": rid, "result": {
            "protocolVersion": "2024-11-05",
            "capabilities": {"tools": {}},
            "serverInfo": {"name": "fixture", "version": "0.0.1"}}})
    elif method == "tools/list":
        send({"jsonrpc": "2.0", "method": "notifications/message", "params": {"level": "info"}})
        names = ["echo", "slow", "split", "nap", "exit"]
        send({"jsonrpc": "2.0", "id": rid, "result": {
            "tools": [{"name": n, "inputSchema": {"type": "object"}} for n in names]}})
    elif method == "tools/call":
        name = msg["params"]["name"]
        if name == "exit":
            sys.exit(0)
        reply = json.dumps({"jsonrpc": "2.0", "id": rid, "result": {
            "content": [{"type": "text", "text": "%s-%s" % (name, rid)}]}}) + "\n"
        if name == "slow":
            time.sleep(1.3)
        if name == "nap":
            time.sleep(2.4)
        if name == "split":
            half = len(reply) // 2
            sys.stdout.write(reply[:half])
            sys.stdout.flush()
            time.sleep(1.3)
            reply = reply[half:]
        sys.stdout.write(reply)
        sys.stdout.flush()
"#;

async fn spawn_fixture() -> Option<Server> {
    let config = ServerConfig {
        name: "fixture".to_string(),
        command: "python3".to_string(),
        args: vec!["-u".to_string(), "-c".to_string(), FIXTURE.to_string()],
        env: HashMap::new(),
        timeout: Duration::from_secs(1),
    };
    match Server::spawn(config).await {
        Ok(server) => Some(server),
        Err(Error::Spawn(e)) if e.kind() == io::ErrorKind::NotFound => {
            eprintln!("python3 not found, skipping");
            None
        }
        Err(e) => panic!("failed to spawn fixture: {e}"),
    }
}

async fn ready_fixture() -> Option<Server> {
    let server = spawn_fixture().await?;
    server.initialize().await.unwrap();
    Some(server)
}

async fn echo(server: &Server) -> String {
    server
        .call_tool("echo", Some(json!({})))
        .await
        .unwrap()
        .joined_text()
}

#[tokio::test]
async fn handshake_then_list_skips_noise_and_notifications() {
    let Some(server) = spawn_fixture().await else {
        return;
    };

    assert!(matches!(server.list_tools().await, Err(Error::NotInitialized)));

    let init = server.initialize().await.unwrap();
    assert_eq!(init.server_info.name, "fixture");
    assert_eq!(init.protocol_version, "2024-11-05");
    assert!(server.is_initialized());

    let names: Vec<_> = server
        .list_tools()
        .await
        .unwrap()
        .into_iter()
        .map(|tool| tool.name)
        .collect();
    assert_eq!(names, ["echo", "slow", "split", "nap", "exit"]);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn late_response_is_discarded_by_id() {
    let Some(server) = ready_fixture().await else {
        return;
    };

    let err = server.call_tool("slow", None).await.unwrap_err();
    assert!(matches!(err, Error::Timeout));

    // The slow reply (id 2) arrives first and must not be taken for this one.
    assert_eq!(echo(&server).await, "echo-3");
}

#[tokio::test]
async fn line_split_across_timeout_is_resumed() {
    let Some(server) = ready_fixture().await else {
        return;
    };

    let err = server.call_tool("split", None).await.unwrap_err();
    assert!(matches!(err, Error::Timeout));

    assert_eq!(echo(&server).await, "echo-3");
    assert_eq!(echo(&server).await, "echo-4");
}

#[tokio::test]
async fn abandoned_write_does_not_swallow_next_request() {
    let Some(server) = ready_fixture().await else {
        return;
    };

    // Keep the child from reading stdin for a while.
    let err = server.call_tool("nap", None).await.unwrap_err();
    assert!(matches!(err, Error::Timeout));

    // Larger than a pipe buffer, so the write stalls and is cut off.
    let big = json!({"text": "x".repeat(512 * 1024)});
    let err = server.call_tool("echo", Some(big)).await.unwrap_err();
    assert!(matches!(err, Error::Timeout));

    assert_eq!(echo(&server).await, "echo-4");
}

#[tokio::test]
async fn exited_server_is_reported() {
    let Some(server) = ready_fixture().await else {
        return;
    };

    let err = server.call_tool("exit", None).await.unwrap_err();
    assert!(matches!(err, Error::ServerExited));
}
