// duka-flow/src/core/control.rs

/// Returned by a handler to tell the runner what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
  /// Run the remaining handlers of this step, then the next step.
  Continue,
  /// Halt the flow. No further handlers or steps run.
  Stop,
}

/// How a flow run ended when no handler returned an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
  /// Every step that was not skipped ran to the end.
  Completed,
  /// A handler returned [`FlowControl::Stop`].
  Stopped,
}
