// src/lib.rs

//! Flowline: a small asynchronous step-pipeline engine.
//!
//! A [`Flow`] is an ordered list of named steps. Each step may carry `before`,
//! `on` and `after` handlers that operate on a shared [`FlowContext`]. Handlers
//! decide whether the flow continues or stops early, and any error they return
//! aborts the run.
//!
//! Features:
//!  - Named steps with before/on/after hooks.
//!  - Asynchronous handlers for I/O-bound operations (database, hashing).
//!  - Optional steps and per-step skip conditions.
//!  - A registry keyed by context type, so a web handler only needs to build a
//!    context and hand it to [`FlowRegistry::run`].

pub mod context;
pub mod control;
pub mod error;
pub mod flow;
pub mod registry;
pub mod step;

pub use crate::context::FlowContext;
pub use crate::control::{FlowOutcome, StepControl};
pub use crate::error::{FlowError, FlowResult};
pub use crate::flow::Flow;
pub use crate::registry::FlowRegistry;
pub use crate::step::{SkipCondition, StepDef, StepHandler};

/*
    Typical usage:
    1. Define a context struct `MyCtx` holding the inputs and the slots the steps fill in.
    2. Build a `Flow<MyCtx, MyError>` with its step names, then attach handlers with
       `.on_root()`, `.before_root()` or `.after_root()`.
    3. Register the flow with a `FlowRegistry<MyError>` at startup.
    4. Per request, wrap a fresh `MyCtx` in `FlowContext::new` and call
       `registry.run(ctx.clone()).await`, then read the results back out of `ctx`.
*/
