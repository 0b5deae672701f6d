//! Spatial queries on AR instances

use std::time::Duration;

use super::Bridge;
use crate::backend::Capabilities;
use crate::error::BridgeResult;
use crate::foundation::collections::InstanceId;
use crate::foundation::math::Vec3;
use crate::query::{HitTestOutcome, HitTestQuery, QueryFailure};

impl Bridge {
    /// Probe along a world-space ray
    ///
    /// Fails synchronously with `UnsupportedByBackend`, without invoking
    /// `handler`, on backends without hit testing. Otherwise `handler` runs
    /// exactly once when completions are dispatched.
    pub fn hit_test_ray<F>(
        &mut self,
        id: InstanceId,
        origin: Vec3,
        direction: Vec3,
        handler: F,
    ) -> BridgeResult<()>
    where
        F: FnOnce(HitTestOutcome) + Send + 'static,
    {
        self.hit_test(id, HitTestQuery::Ray { origin, direction }, handler)
    }

    /// Probe through a screen point in surface pixels
    pub fn hit_test_point<F>(
        &mut self,
        id: InstanceId,
        x: f32,
        y: f32,
        handler: F,
    ) -> BridgeResult<()>
    where
        F: FnOnce(HitTestOutcome) + Send + 'static,
    {
        self.hit_test(id, HitTestQuery::Point { x, y }, handler)
    }

    /// Probe along the line of sight to a world-space position
    pub fn hit_test_position<F>(
        &mut self,
        id: InstanceId,
        point: Vec3,
        handler: F,
    ) -> BridgeResult<()>
    where
        F: FnOnce(HitTestOutcome) + Send + 'static,
    {
        self.hit_test(id, HitTestQuery::Position { point }, handler)
    }

    /// Issue any hit-test probe
    ///
    /// A malformed probe is not an error here: it completes through
    /// `handler` with [`QueryFailure::InvalidQuery`].
    pub fn hit_test<F>(
        &mut self,
        id: InstanceId,
        query: HitTestQuery,
        handler: F,
    ) -> BridgeResult<()>
    where
        F: FnOnce(HitTestOutcome) + Send + 'static,
    {
        let operation = query.operation();
        let instance = self.instances.resolve_mut(id)?;
        instance.lifecycle.require_alive(operation)?;
        instance.backend.require(Capabilities::HIT_TEST, operation)?;
        let engine = instance.engine_mut(operation)?;

        let responder = self.queries.issue(id, operation, Box::new(handler));
        match query.validate() {
            Ok(()) => engine.hit_test(query, responder),
            Err(reason) => {
                log::warn!("Rejecting {operation}: {reason}");
                responder.complete(Err(QueryFailure::InvalidQuery(reason)));
            }
        }
        Ok(())
    }

    /// Deliver every completion that has already arrived
    ///
    /// Returns the number of handlers run.
    pub fn dispatch_completions(&mut self) -> usize {
        self.queries.drain(0)
    }

    /// Block for up to `timeout` until a completion arrives, then deliver
    /// everything that has arrived
    ///
    /// Returns immediately when no query is outstanding.
    pub fn wait_for_completions(&mut self, timeout: Duration) -> usize {
        self.queries.wait(timeout)
    }

    /// Queries issued and not yet completed, across all instances
    pub fn pending_queries(&self) -> usize {
        self.queries.pending()
    }

    /// Queries issued by `id` and not yet completed
    pub fn pending_queries_for(&self, id: InstanceId) -> BridgeResult<usize> {
        self.instances.resolve(id)?;
        Ok(self.queries.pending_for(id))
    }
}
