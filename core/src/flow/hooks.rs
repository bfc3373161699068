// duka-flow/src/flow/hooks.rs

//! Registration of `before`, `on` and `after` handlers.

use crate::core::context::FlowContext;
use crate::core::control::FlowControl;
use crate::core::handler::Handler;
use crate::error::FlowError;
use crate::flow::definition::Flow;
use std::future::Future;

fn boxed<TData, Err, F, UserErr>(
  handler_fn: impl Fn(FlowContext<TData>) -> F + Send + Sync + 'static,
) -> Handler<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: 'static,
  F: Future<Output = Result<FlowControl, UserErr>> + Send + 'static,
  UserErr: Into<Err> + Send + Sync + 'static,
{
  Box::new(move |ctx| {
    let user_fut = handler_fn(ctx);
    Box::pin(async move { user_fut.await.map_err(Into::into) })
  })
}

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Registers a handler that runs before the step's `on` handlers.
  ///
  /// The handler's own error type only needs to convert into the flow's
  /// `Err`.
  pub fn before<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(FlowContext<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<FlowControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    self
      .before_handlers
      .entry(step_name.to_string())
      .or_default()
      .push(boxed(handler_fn));
  }

  /// Registers the main handler of a step. A step may have several; they run
  /// in registration order.
  pub fn on<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(FlowContext<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<FlowControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    self
      .on_handlers
      .entry(step_name.to_string())
      .or_default()
      .push(boxed(handler_fn));
  }

  pub fn after<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(FlowContext<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<FlowControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    self
      .after_handlers
      .entry(step_name.to_string())
      .or_default()
      .push(boxed(handler_fn));
  }
}
