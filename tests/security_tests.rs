//! Security tests to verify sandbox isolation.
//!
//! These tests attempt various escape techniques to verify the sandbox
//! properly restricts access to the host and between executions.

use js_sandbox_rs::prelude::*;

/// Helper to create a test sandbox.
fn test_sandbox() -> JsSandbox {
    JsSandbox::new(SandboxConfig::default())
}

/// Test that infinite loops are properly terminated.
#[tokio::test]
async fn test_infinite_loop_timeout() {
    let sandbox = test_sandbox();

    let result = sandbox.execute("while(true){}", 100).await.unwrap();

    assert!(!result.is_success(), "infinite loop should time out");
    let error = result.error.as_deref().unwrap();
    assert!(error.contains("Execution timed out (limit: 100ms)"));
    assert!(error.contains("100ms"));
}

/// Test that a timeout cannot be swallowed by user code.
#[tokio::test]
async fn test_timeout_not_catchable() {
    let sandbox = test_sandbox();

    let result = sandbox
        .execute(
            "try { while (true) {} } catch (e) { console.log('SECURITY_BREACH: caught'); }",
            100,
        )
        .await
        .unwrap();

    assert!(!result.is_success());
    assert!(result
        .output
        .iter()
        .all(|entry| !entry.text.contains("SECURITY_BREACH")));
}

/// Test that a promise chain that never settles still hits the deadline.
#[tokio::test]
async fn test_microtask_loop_timeout() {
    let sandbox = test_sandbox();

    let result = sandbox
        .execute(
            "const spin = () => Promise.resolve().then(spin); spin(); 'scheduled'",
            100,
        )
        .await
        .unwrap();

    assert!(!result.is_success());
    assert_eq!(
        result.error.as_deref(),
        Some("Execution timed out (limit: 100ms)")
    );
}

/// Test memory exhaustion protection.
#[tokio::test]
async fn test_memory_exhaustion_protection() {
    let sandbox = test_sandbox();

    let result = sandbox
        .execute(
            r#"
const hoard = [];
while (true) {
    hoard.push(new Array(1000000).fill(hoard.length));
}
console.log('SECURITY_BREACH: memory exhaustion succeeded');
"#,
            10_000,
        )
        .await
        .unwrap();

    assert!(!result.is_success());
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .contains("Memory limit exceeded (limit: 128MB)"));
}

/// Test that catching the out-of-memory error does not hide the breach.
#[tokio::test]
async fn test_caught_memory_exhaustion_still_fails() {
    let sandbox = test_sandbox();

    let result = sandbox
        .execute(
            r#"
let hoard = [];
try {
    while (true) hoard.push(new Array(1000000).fill(1));
} catch (e) {
    hoard = null;
    'survived: ' + e
}
"#,
            10_000,
        )
        .await
        .unwrap();

    assert!(!result.is_success());
    assert_eq!(
        result.error.as_deref(),
        Some("Memory limit exceeded (limit: 128MB)")
    );
    assert!(result.result_text().is_none());
    assert_eq!(sandbox.ledger().live(), 0);
}

/// Test that exhausting memory with many small objects is a memory fault.
#[tokio::test]
async fn test_small_object_exhaustion() {
    let sandbox = test_sandbox();

    let result = sandbox
        .execute(
            r#"
const big = [];
for (let i = 0; i < 20000000; i++) big.push({ k: 'v' + i });
big.length
"#,
            10_000,
        )
        .await
        .unwrap();

    assert!(!result.is_success());
    assert_eq!(
        result.error.as_deref(),
        Some("Memory limit exceeded (limit: 128MB)")
    );
    assert_eq!(
        result.output.last().unwrap().text,
        "Error: Memory limit exceeded (limit: 128MB)"
    );
}

/// Test that a caught failure from doubling a string is still reported.
#[tokio::test]
async fn test_caught_string_growth_exhaustion() {
    let sandbox = test_sandbox();

    let result = sandbox
        .execute(
            r#"
let s = 'x';
try {
    while (true) { s = s + s; console.log(s.length); }
} catch (e) {}
'done'
"#,
            10_000,
        )
        .await
        .unwrap();

    assert!(!result.is_success());
    assert_eq!(
        result.error.as_deref(),
        Some("Memory limit exceeded (limit: 128MB)")
    );
}

/// Test that timers are unavailable.
#[tokio::test]
async fn test_timers_blocked() {
    let sandbox = test_sandbox();

    let result = sandbox
        .execute(
            r#"
[typeof setTimeout, typeof setInterval, typeof setImmediate].join(',')
"#,
            1_000,
        )
        .await
        .unwrap();

    assert_eq!(result.result_text(), Some("=> undefined,undefined,undefined"));
}

/// Test that network capabilities cannot be restored.
#[tokio::test]
async fn test_network_access_blocked() {
    let sandbox = test_sandbox();

    let result = sandbox
        .execute(
            r#"
fetch = () => 'SECURITY_BREACH';
WebSocket = function () {};
[typeof fetch, typeof XMLHttpRequest, typeof WebSocket, typeof EventSource].join(',')
"#,
            1_000,
        )
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(
        result.result_text(),
        Some("=> undefined,undefined,undefined,undefined")
    );
}

/// Test that host hooks are not reachable by name.
#[tokio::test]
async fn test_bridge_hooks_hidden() {
    let sandbox = test_sandbox();

    let result = sandbox
        .execute(
            "Object.getOwnPropertyNames(globalThis).filter(n => n.startsWith('__sandbox')).length",
            1_000,
        )
        .await
        .unwrap();

    assert_eq!(result.result_text(), Some("=> 0"));
}

/// Test that module loading and host objects are absent.
#[tokio::test]
async fn test_host_objects_absent() {
    let sandbox = test_sandbox();

    let result = sandbox
        .execute(
            "[typeof require, typeof process, typeof std, typeof os].join(',')",
            1_000,
        )
        .await
        .unwrap();

    assert_eq!(
        result.result_text(),
        Some("=> undefined,undefined,undefined,undefined")
    );
}

/// Test eval with malicious code stays in the same sandbox.
#[tokio::test]
async fn test_eval_sandboxed() {
    let sandbox = test_sandbox();

    let result = sandbox
        .execute("eval('typeof fetch') + '/' + new Function('return typeof setTimeout')()", 1_000)
        .await
        .unwrap();

    assert_eq!(result.result_text(), Some("=> undefined/undefined"));
}

/// Test that globals do not leak between executions.
#[tokio::test]
async fn test_no_state_between_sessions() {
    let sandbox = test_sandbox();

    let first = sandbox
        .execute("globalThis.leaked = 'SECURITY_BREACH'; var declared = 1;", 1_000)
        .await
        .unwrap();
    assert!(first.is_success());

    let second = sandbox
        .execute("typeof leaked + ',' + typeof declared", 1_000)
        .await
        .unwrap();
    assert_eq!(second.result_text(), Some("=> undefined,undefined"));
}

/// Test that runaway recursion is an ordinary error, not a host crash.
#[tokio::test]
async fn test_deep_recursion_contained() {
    let sandbox = test_sandbox();

    let result = sandbox
        .execute("function down(n) { return down(n + 1) + 1; } down(0)", 5_000)
        .await
        .unwrap();

    assert!(!result.is_success());
    assert!(!result.error.as_deref().unwrap().is_empty());
}
