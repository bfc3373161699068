// duka-flow/src/flow/execution.rs

//! `Flow::run`: executes steps in order against one shared context.

use crate::core::context::FlowContext;
use crate::core::control::{FlowControl, FlowOutcome};
use crate::core::handler::Handler;
use crate::error::FlowError;
use crate::flow::definition::Flow;
use tracing::{event, instrument, span, Instrument, Level};

/// Result of running one phase (before/on/after) of a step.
enum PhaseResult {
  Continue,
  Stopped,
}

async fn run_phase<TData, Err>(
  phase: &'static str,
  handlers: Option<&Vec<Handler<TData, Err>>>,
  ctx: &FlowContext<TData>,
) -> Result<PhaseResult, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + Send + Sync + 'static,
{
  let Some(handlers) = handlers else {
    return Ok(PhaseResult::Continue);
  };
  for (handler_index, handler_fn) in handlers.iter().enumerate() {
    let handler_span = span!(Level::DEBUG, "flow_handler", phase, handler_index);
    match handler_fn(ctx.clone()).instrument(handler_span).await {
      Ok(FlowControl::Continue) => {}
      Ok(FlowControl::Stop) => {
        event!(Level::INFO, phase, "Flow stopped by handler.");
        return Ok(PhaseResult::Stopped);
      }
      Err(e) => {
        event!(Level::ERROR, phase, error = %e, "Handler failed.");
        return Err(e);
      }
    }
  }
  Ok(PhaseResult::Continue)
}

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in order.
  ///
  /// Returns `Ok(Completed)` when all steps ran, `Ok(Stopped)` when a handler
  /// asked to stop, or the first handler error. A non-optional step with no
  /// handlers at all fails with [`FlowError::HandlerMissing`].
  #[instrument(
    name = "Flow::run",
    skip_all,
    fields(flow = %self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx: FlowContext<TData>) -> Result<FlowOutcome, Err> {
    event!(Level::DEBUG, "Flow run starting.");

    for (step_index, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = span!(Level::INFO, "flow_step", step_name, step_index);

      if let Some(skip_if) = &step_def.skip_if {
        if skip_if(ctx.clone()) {
          event!(parent: &step_span, Level::DEBUG, "Step skipped by condition.");
          continue;
        }
      }

      let before = self.before_handlers.get(step_name).filter(|v| !v.is_empty());
      let on = self.on_handlers.get(step_name).filter(|v| !v.is_empty());
      let after = self.after_handlers.get(step_name).filter(|v| !v.is_empty());

      if before.is_none() && on.is_none() && after.is_none() {
        if step_def.optional {
          event!(parent: &step_span, Level::DEBUG, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(parent: &step_span, Level::ERROR, "Non-optional step has no handlers.");
        return Err(Err::from(FlowError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      for (phase, handlers) in [("before", before), ("on", on), ("after", after)] {
        match run_phase(phase, handlers, &ctx).instrument(step_span.clone()).await? {
          PhaseResult::Continue => {}
          PhaseResult::Stopped => return Ok(FlowOutcome::Stopped),
        }
      }
      event!(parent: &step_span, Level::DEBUG, "Step finished.");
    }

    event!(Level::DEBUG, "Flow run completed.");
    Ok(FlowOutcome::Completed)
  }
}
