// src/flow/execution.rs

//! `Flow::run`: walks the steps in order and drives their handlers.

use crate::context::FlowContext;
use crate::control::{FlowOutcome, StepControl};
use crate::error::FlowError;
use crate::flow::definition::Flow;
use crate::step::StepHandler;
use tracing::{event, info_span, instrument, Instrument, Level};

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Executes every step against `ctx`.
  ///
  /// A handler error aborts the run and is returned as-is, except inside an
  /// optional step, where it is logged and the flow moves on to the next step.
  #[instrument(
    name = "Flow::run",
    skip_all,
    fields(flow = %self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx: FlowContext<TData>) -> Result<FlowOutcome, Err> {
    event!(Level::DEBUG, "Flow execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = info_span!(
        "flow_step",
        step_name = step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      if let Some(skip_if) = &step_def.skip_if {
        if skip_if(ctx.clone()) {
          event!(parent: &step_span, Level::DEBUG, "Step skipped by condition.");
          continue;
        }
      }

      let before = self.before.get(step_name).filter(|v| !v.is_empty());
      let on = self.on.get(step_name).filter(|v| !v.is_empty());
      let after = self.after.get(step_name).filter(|v| !v.is_empty());

      if before.is_none() && on.is_none() && after.is_none() {
        if step_def.optional {
          event!(parent: &step_span, Level::DEBUG, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(parent: &step_span, Level::ERROR, "Required step has no handlers.");
        return Err(Err::from(FlowError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      let step_result = async {
        for (phase, handlers) in [("before", before), ("on", on), ("after", after)] {
          if let Some(handlers) = handlers {
            if run_phase(phase, handlers, &ctx).await? == StepControl::Stop {
              return Ok(StepControl::Stop);
            }
          }
        }
        Ok::<_, Err>(StepControl::Continue)
      }
      .instrument(step_span.clone())
      .await;

      match step_result {
        Ok(StepControl::Continue) => {}
        Ok(StepControl::Stop) => {
          event!(parent: &step_span, Level::INFO, "Flow stopped by handler.");
          return Ok(FlowOutcome::Stopped);
        }
        Err(e) if step_def.optional => {
          event!(parent: &step_span, Level::WARN, error = %e, "Optional step failed, continuing.");
        }
        Err(e) => return Err(e),
      }
    }

    event!(Level::DEBUG, "Flow execution completed.");
    Ok(FlowOutcome::Completed)
  }
}

async fn run_phase<TData, Err>(
  phase: &'static str,
  handlers: &[StepHandler<TData, Err>],
  ctx: &FlowContext<TData>,
) -> Result<StepControl, Err>
where
  TData: 'static + Send + Sync,
  Err: std::fmt::Display,
{
  for (handler_idx, handler_fn) in handlers.iter().enumerate() {
    let handler_span = tracing::debug_span!("handler", phase = phase, handler_index = handler_idx);
    match handler_fn(ctx.clone()).instrument(handler_span).await {
      Ok(StepControl::Continue) => {}
      Ok(StepControl::Stop) => return Ok(StepControl::Stop),
      Err(e) => {
        event!(Level::ERROR, phase = phase, error = %e, "Handler failed.");
        return Err(e);
      }
    }
  }
  Ok(StepControl::Continue)
}
