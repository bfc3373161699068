// duka-flow/src/flow/definition.rs

//! The `Flow<TData, Err>` struct and its construction.

use crate::core::handler::Handler;
use crate::core::step::{SkipCondition, StepDef};
use crate::error::FlowError;
use std::collections::HashMap;

/// An ordered set of named steps over context data `TData`, whose handlers
/// fail with `Err`.
///
/// `Err` must be constructible from [`FlowError`] so the runner can report its
/// own failures (such as a required step without handlers) in the caller's
/// error type.
pub struct Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<TData>>,

  pub(crate) before_handlers: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) on_handlers: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after_handlers: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a flow from `(name, optional, skip_if)` step definitions.
  pub fn new(name: &str, step_defs: &[(&str, bool, Option<SkipCondition<TData>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(step_name, optional, skip_if)| StepDef {
        name: (*step_name).to_string(),
        optional: *optional,
        skip_if: skip_if.clone(),
      })
      .collect();

    Self {
      name: name.to_string(),
      steps,
      before_handlers: HashMap::new(),
      on_handlers: HashMap::new(),
      after_handlers: HashMap::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Step names in execution order.
  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  /// Panics if `step_name` is not part of this flow. A typo in a step name is
  /// a wiring bug, caught when the flow is assembled at startup.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!(
        "duka-flow setup error: step '{}' not found in flow '{}'.",
        step_name, self.name
      );
    }
  }

  /// Non-panicking lookup for callers that build flows from data.
  pub fn step(&self, step_name: &str) -> Result<&StepDef<TData>, FlowError> {
    self
      .steps
      .iter()
      .find(|s| s.name == step_name)
      .ok_or_else(|| FlowError::StepNotFound {
        step_name: step_name.to_string(),
      })
  }
}
