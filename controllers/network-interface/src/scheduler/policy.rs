//! Reconcile and error policy functions run by `kube_runtime::Controller`.
//!
//! The controller's scheduler collapses duplicate requests, keeps one pending
//! deadline per key and never runs a key on two workers at once. This module
//! decides what each finished pass asks of it:
//! - success resets the key's failure count
//! - `RequeueAfter` requeues after the fixed delay without counting a failure
//! - Conflict requeues immediately without growing the backoff
//! - any other error requeues after the key's Fibonacci delay

use super::{ObjectKey, Outcome, ReconcileHandler};
use crate::backoff::Retries;
use crate::error::{ControllerError, ErrorClass};
use crate::metrics::Metrics;
use crate::store::StoreError;
use crds::NetworkInterface;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Shared state handed to every reconcile and error policy call.
pub struct Context {
    handler: Arc<dyn ReconcileHandler>,
    retries: Retries,
    metrics: Arc<Metrics>,
}

impl Context {
    pub fn new(handler: Arc<dyn ReconcileHandler>, retries: Retries, metrics: Arc<Metrics>) -> Self {
        Self {
            handler,
            retries,
            metrics,
        }
    }
}

fn result_label(result: &Result<Outcome, ControllerError>) -> &'static str {
    match result {
        Ok(Outcome::Done) => "success",
        Ok(Outcome::RequeueAfter(_)) => "requeue",
        Err(e) if e.class() == ErrorClass::Conflict => "conflict",
        Err(_) => "error",
    }
}

/// Run one pass over the NetworkInterface the controller picked
pub async fn reconcile(nic: Arc<NetworkInterface>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let key = ObjectKey::for_resource(nic.as_ref()).ok_or(StoreError::Unnamed("NetworkInterface"))?;

    let started = Instant::now();
    let result = ctx.handler.reconcile(&key).await;
    ctx.metrics.observe_reconcile(result_label(&result), started.elapsed());

    let outcome = result?;
    ctx.retries.reset(&key);
    ctx.metrics.set_backing_off(ctx.retries.backing_off());
    Ok(outcome.into())
}

/// Decide when a failed pass runs again
pub fn error_policy(nic: Arc<NetworkInterface>, error: &ControllerError, ctx: Arc<Context>) -> Action {
    let Some(key) = ObjectKey::for_resource(nic.as_ref()) else {
        warn!("Reconciliation of unnamed NetworkInterface failed: {}", error);
        return Action::await_change();
    };

    if error.class() == ErrorClass::Conflict {
        debug!("Conflict reconciling {}, retrying: {}", key, error);
        return Action::requeue(Duration::ZERO);
    }

    let delay = ctx.retries.record_failure(&key);
    ctx.metrics.set_backing_off(ctx.retries.backing_off());
    warn!(
        class = ?error.class(),
        retry_in = ?delay,
        "Reconciliation of {} failed: {}", key, error
    );
    Action::requeue(delay)
}
