// tests/flow_execution_tests.rs
mod common;

use common::*;
use flowline::{Flow, FlowContext, FlowError, FlowOutcome, SkipCondition, StepControl};
use serial_test::serial;
use std::sync::Arc;

#[tokio::test]
#[serial]
async fn runs_steps_in_order() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(
    "ordered",
    &[("step1", false, None), ("step2", false, None), ("step3", false, None)],
  );
  flow.on_root("step1", create_simple_handler("step1", " S1"));
  flow.on_root("step2", create_simple_handler("step2", " S2"));
  flow.on_root("step3", create_simple_handler("step3", " S3"));

  let ctx = FlowContext::new(TestContext::default());
  let result = flow.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), FlowOutcome::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.message, " S1 S2 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step2", "step3"]);
}

#[tokio::test]
#[serial]
async fn before_on_after_run_in_phase_order() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new("phased", &[("only", false, None)]);
  flow.after_root("only", create_simple_handler("after", "c"));
  flow.on_root("only", create_simple_handler("on", "b"));
  flow.before_root("only", create_simple_handler("before", "a"));

  let ctx = FlowContext::new(TestContext::default());
  flow.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().message, "abc");
  assert_eq!(ctx.read().steps_executed, vec!["before", "on", "after"]);
}

#[tokio::test]
#[serial]
async fn stop_control_halts_remaining_steps() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(
    "stopping",
    &[("stepA", false, None), ("stopStep", false, None), ("stepC", false, None)],
  );
  flow.on_root("stepA", create_simple_handler("stepA", "A"));
  flow.on_root("stopStep", |ctx: FlowContext<TestContext>| async move {
    ctx.write().steps_executed.push("stopStep".to_string());
    Ok::<_, TestError>(StepControl::Stop)
  });
  flow.on_root("stepC", create_simple_handler("stepC", "C"));

  let ctx = FlowContext::new(TestContext::default());
  let result = flow.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), FlowOutcome::Stopped);
  let guard = ctx.read();
  assert_eq!(guard.counter, 1);
  assert_eq!(guard.steps_executed, vec!["stepA", "stopStep"]);
}

#[tokio::test]
#[serial]
async fn stop_in_before_phase_skips_on_handler() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new("early", &[("guarded", false, None)]);
  flow.before_root("guarded", create_simple_handler("gate", ""));
  flow.on_root("guarded", create_simple_handler("body", "never"));

  let ctx = FlowContext::new(TestContext {
    should_stop_at: Some("gate".to_string()),
    ..Default::default()
  });
  let result = flow.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), FlowOutcome::Stopped);
  assert_eq!(ctx.read().steps_executed, vec!["gate"]);
}

#[tokio::test]
#[serial]
async fn handler_error_aborts_the_run() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(
    "failing",
    &[("good_step", false, None), ("bad_step", false, None), ("another_step", false, None)],
  );
  flow.on_root("good_step", create_simple_handler("good_step", "Good"));
  flow.on_root("bad_step", create_failing_handler("bad_step", "boom"));
  flow.on_root("another_step", create_simple_handler("another_step", "NeverRun"));

  let ctx = FlowContext::new(TestContext::default());
  let result = flow.run(ctx.clone()).await;

  assert_eq!(result.unwrap_err(), TestError::Handler("boom".to_string()));
  assert_eq!(ctx.read().steps_executed, vec!["good_step", "bad_step"]);
}

#[tokio::test]
#[serial]
async fn required_step_without_handlers_is_an_error() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new("incomplete", &[("wired", false, None), ("unwired", false, None)]);
  flow.on_root("wired", create_simple_handler("wired", "w"));

  let ctx = FlowContext::new(TestContext::default());
  let err = flow.run(ctx.clone()).await.unwrap_err();

  let expected = TestError::from(FlowError::HandlerMissing {
    step_name: "unwired".to_string(),
  });
  assert_eq!(err, expected);
  assert_eq!(ctx.read().counter, 1);
}

#[tokio::test]
#[serial]
async fn optional_step_without_handlers_is_skipped() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new("sparse", &[("maybe", true, None), ("always", false, None)]);
  flow.on_root("always", create_simple_handler("always", "x"));

  let ctx = FlowContext::new(TestContext::default());
  assert_eq!(flow.run(ctx.clone()).await.unwrap(), FlowOutcome::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["always"]);
}

#[tokio::test]
#[serial]
async fn optional_step_failure_does_not_abort() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new("tolerant", &[("notify", true, None), ("finish", false, None)]);
  flow.on_root("notify", create_failing_handler("notify", "mail server down"));
  flow.on_root("finish", create_simple_handler("finish", "done"));

  let ctx = FlowContext::new(TestContext::default());
  assert_eq!(flow.run(ctx.clone()).await.unwrap(), FlowOutcome::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["notify", "finish"]);
  assert_eq!(ctx.read().message, "done");
}

#[tokio::test]
#[serial]
async fn skip_condition_is_evaluated_per_run() {
  setup_tracing();
  let skip: SkipCondition<TestContext> = Arc::new(|ctx: FlowContext<TestContext>| ctx.read().skip_optional);
  let mut flow = Flow::<TestContext, TestError>::new("conditional", &[("first", false, None), ("extra", false, Some(skip))]);
  flow.on_root("first", create_simple_handler("first", "1"));
  flow.on_root("extra", create_simple_handler("extra", "2"));

  let skipped = FlowContext::new(TestContext {
    skip_optional: true,
    ..Default::default()
  });
  flow.run(skipped.clone()).await.unwrap();
  assert_eq!(skipped.read().message, "1");

  let full = FlowContext::new(TestContext::default());
  flow.run(full.clone()).await.unwrap();
  assert_eq!(full.read().message, "12");
}

#[tokio::test]
#[serial]
async fn handler_error_type_converts_into_flow_error_type() {
  setup_tracing();
  #[derive(Debug)]
  struct NarrowError;
  impl From<NarrowError> for TestError {
    fn from(_: NarrowError) -> Self {
      TestError::Handler("narrow".to_string())
    }
  }

  let mut flow = Flow::<TestContext, TestError>::new("converting", &[("narrow", false, None)]);
  flow.on_root("narrow", |_ctx: FlowContext<TestContext>| async move { Err::<StepControl, _>(NarrowError) });

  let ctx = FlowContext::new(TestContext::default());
  assert_eq!(flow.run(ctx).await.unwrap_err(), TestError::Handler("narrow".to_string()));
}

#[test]
fn step_editing_keeps_order() {
  let mut flow = Flow::<TestContext, TestError>::new("editable", &[("a", false, None), ("c", false, None)]);
  flow.insert_after_step("a", "b", false, None);
  flow.insert_before_step("a", "start", true, None);
  assert_eq!(flow.step_names(), vec!["start", "a", "b", "c"]);

  flow.on_root("b", create_simple_handler("b", "b"));
  flow.remove_step("b");
  flow.remove_step("does_not_exist");
  assert_eq!(flow.step_names(), vec!["start", "a", "c"]);
}

#[test]
#[should_panic(expected = "not found")]
fn attaching_handler_to_unknown_step_panics() {
  let mut flow = Flow::<TestContext, TestError>::new("strict", &[("a", false, None)]);
  flow.on_root("missing", create_simple_handler("missing", ""));
}

#[test]
#[should_panic(expected = "already exists")]
fn duplicate_step_names_panic() {
  let _ = Flow::<TestContext, TestError>::new("dupes", &[("a", false, None), ("a", true, None)]);
}
