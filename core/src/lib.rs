// duka-flow/src/lib.rs

//! duka-flow: a small asynchronous step runner for request-scoped workflows.
//!
//! A [`Flow`] is an ordered list of named steps. Each step can carry `before`,
//! `on` and `after` handlers that receive a shared [`FlowContext`] and decide
//! whether the flow continues or stops. Steps can be optional, or skipped by a
//! predicate over the context. A [`FlowRegistry`] dispatches a context to the
//! flow registered for its data type, so HTTP handlers only need to build a
//! context and call `run`.
//!
//! ```text
//!   validate ──▶ create_order ──▶ call_gateway ──▶ ...
//!      │              │                │
//!   before/on/after handlers, each returning Continue | Stop | Err
//! ```

pub mod core;
pub mod error;
pub mod flow;
pub mod registry;

pub use crate::core::context::FlowContext;
pub use crate::core::control::{FlowControl, FlowOutcome};
pub use crate::core::handler::Handler;
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::error::{FlowError, FlowResult};

pub use crate::flow::definition::Flow;

pub use crate::registry::FlowRegistry;
