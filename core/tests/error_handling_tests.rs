// tests/error_handling_tests.rs
mod common;

use common::*;
use duka_flow::{Flow, FlowContext, FlowControl, FlowError};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_flow_with_flow_error_type() {
  setup_tracing();
  let mut flow = Flow::<TestContext, FlowError>::new("plain", &[("task", false, None)]);
  flow.on("task", |ctx: FlowContext<TestContext>| async move {
    ctx.write().counter = 1;
    Ok::<_, FlowError>(FlowControl::Continue)
  });

  let ctx = FlowContext::new(TestContext::default());
  assert!(flow.run(ctx.clone()).await.is_ok());
  assert_eq!(ctx.read().counter, 1);

  let mut failing = Flow::<TestContext, FlowError>::new("plain_failing", &[("fail_task", false, None)]);
  failing.on("fail_task", |_ctx: FlowContext<TestContext>| async move {
    Err::<FlowControl, _>(FlowError::Internal("intentional".to_string()))
  });
  match failing.run(FlowContext::new(TestContext::default())).await {
    Err(FlowError::Internal(s)) => assert_eq!(s, "intentional"),
    other => panic!("Expected FlowError::Internal, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_anyhow_errors_convert_into_flow_error() {
  setup_tracing();
  let mut flow = Flow::<TestContext, FlowError>::new("anyhow", &[("task", false, None)]);
  flow.on("task", |_ctx: FlowContext<TestContext>| async move {
    Err::<FlowControl, _>(anyhow::anyhow!("store offline"))
  });

  let err = flow.run(FlowContext::new(TestContext::default())).await.unwrap_err();
  assert!(matches!(err, FlowError::Handler { .. }));
  assert!(err.to_string().contains("store offline"));
}
