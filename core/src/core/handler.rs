// duka-flow/src/core/handler.rs

use crate::core::context::FlowContext;
use crate::core::control::FlowControl;
use std::future::Future;
use std::pin::Pin;

/// A boxed step handler.
///
/// Handlers take a clone of the run's [`FlowContext`] and resolve to either a
/// [`FlowControl`] or the flow's error type. Lock guards taken inside a
/// handler must be released before the handler awaits.
pub type Handler<TData, Err> = Box<
  dyn Fn(FlowContext<TData>) -> Pin<Box<dyn Future<Output = Result<FlowControl, Err>> + Send>> + Send + Sync,
>;
