// duka-flow/src/registry.rs

//! `FlowRegistry<E>`: flows keyed by their context data type.
//!
//! An HTTP handler builds a `FlowContext<CheckoutCtxData>` and calls
//! `registry.run(ctx)`; the registry finds the flow registered for
//! `CheckoutCtxData` and converts its errors into the application error `E`.

use crate::core::context::FlowContext;
use crate::core::control::FlowOutcome;
use crate::error::FlowError;
use crate::flow::definition::Flow;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, instrument, Level};

#[async_trait]
trait ErasedFlowRunner<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  /// `ctx` must box a `FlowContext<TData>` for the wrapped flow's `TData`.
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<FlowOutcome, AppErr>;

  fn flow_name(&self) -> &str;
}

struct FlowRunner<TData, FlowErr, AppErr>
where
  TData: 'static + Send + Sync,
  FlowErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<FlowErr> + From<FlowError> + Send + Sync + 'static,
{
  flow: Arc<Flow<TData, FlowErr>>,
  _app_err: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<TData, FlowErr, AppErr> ErasedFlowRunner<AppErr> for FlowRunner<TData, FlowErr, AppErr>
where
  TData: 'static + Send + Sync,
  FlowErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<FlowErr> + From<FlowError> + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<FlowOutcome, AppErr> {
    let typed_ctx = match ctx.downcast::<FlowContext<TData>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        let expected_type = std::any::type_name::<FlowContext<TData>>();
        event!(Level::ERROR, expected_type, "Context type mismatch in registry dispatch.");
        return Err(AppErr::from(FlowError::TypeMismatch {
          expected_type: expected_type.to_string(),
        }));
      }
    };
    self.flow.run(typed_ctx).await.map_err(AppErr::from)
  }

  fn flow_name(&self) -> &str {
    self.flow.name()
  }
}

/// Registry of flows. `AppErr` is the error type `run` returns.
pub struct FlowRegistry<AppErr = FlowError>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  flows: RwLock<HashMap<TypeId, Arc<dyn ErasedFlowRunner<AppErr>>>>,
}

impl<AppErr> Default for FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<AppErr> FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      flows: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `flow` for contexts of type `FlowContext<TData>`. A later
  /// registration for the same `TData` replaces the earlier one.
  pub fn register<TData, FlowErr>(&self, flow: Flow<TData, FlowErr>)
  where
    TData: 'static + Send + Sync,
    FlowErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<FlowErr>,
  {
    event!(
      Level::DEBUG,
      flow = flow.name(),
      context_type = %std::any::type_name::<TData>(),
      "Registering flow."
    );
    let runner = FlowRunner::<TData, FlowErr, AppErr> {
      flow: Arc::new(flow),
      _app_err: PhantomData,
    };
    self.flows.write().insert(TypeId::of::<TData>(), Arc::new(runner));
  }

  pub fn is_registered<TData: 'static>(&self) -> bool {
    self.flows.read().contains_key(&TypeId::of::<TData>())
  }

  /// Runs the flow registered for `TData`.
  #[instrument(name = "FlowRegistry::run", skip_all, fields(context_type = %std::any::type_name::<TData>()))]
  pub async fn run<TData>(&self, ctx: FlowContext<TData>) -> Result<FlowOutcome, AppErr>
  where
    TData: 'static + Send + Sync,
  {
    let runner = self.flows.read().get(&TypeId::of::<TData>()).cloned();
    let Some(runner) = runner else {
      let context_type = std::any::type_name::<TData>();
      event!(Level::ERROR, context_type, "No flow registered.");
      return Err(AppErr::from(FlowError::NotRegistered {
        context_type: context_type.to_string(),
      }));
    };

    event!(Level::DEBUG, flow = runner.flow_name(), "Dispatching to flow.");
    runner.run_erased(Box::new(ctx)).await
  }
}
