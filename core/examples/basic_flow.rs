// examples/basic_flow.rs

use flowline::{Flow, FlowContext, FlowError, FlowOutcome, FlowRegistry, StepControl};
use tracing::info;

#[derive(Debug, Default)]
struct TallyContext {
  items: Vec<(String, i64)>,
  total: i64,
  discount_applied: bool,
}

#[tokio::main]
async fn main() -> Result<(), FlowError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  let mut flow = Flow::<TallyContext, FlowError>::new(
    "tally",
    &[("sum_items", false, None), ("apply_discount", true, None), ("report", false, None)],
  );

  flow.on_root("sum_items", |ctx: FlowContext<TallyContext>| async move {
    let mut data = ctx.write();
    data.total = data.items.iter().map(|(_, cents)| cents).sum();
    Ok::<_, FlowError>(StepControl::Continue)
  });

  // Optional: a failure here is logged and the flow carries on.
  flow.on_root("apply_discount", |ctx: FlowContext<TallyContext>| async move {
    let mut data = ctx.write();
    if data.total < 1_000 {
      return Err(FlowError::Internal("Total too small for a discount.".to_string()));
    }
    data.total -= data.total / 10;
    data.discount_applied = true;
    Ok(StepControl::Continue)
  });

  flow.on_root("report", |ctx: FlowContext<TallyContext>| async move {
    let data = ctx.read();
    info!(total = data.total, discount = data.discount_applied, "Tally finished.");
    Ok::<_, FlowError>(StepControl::Continue)
  });

  let registry = FlowRegistry::<FlowError>::new();
  registry.register(flow);

  for items in [vec![("cable".to_string(), 500)], vec![("desk".to_string(), 25_000)]] {
    let ctx = FlowContext::new(TallyContext {
      items,
      ..Default::default()
    });
    let outcome = registry.run(ctx.clone()).await?;
    assert_eq!(outcome, FlowOutcome::Completed);
    info!(total = ctx.read().total, "Run complete.");
  }
  Ok(())
}
