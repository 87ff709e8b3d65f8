//! Path query seam
//!
//! A [`PathService`] belongs to the host environment and hands each agent its
//! own [`PathQuery`] when the agent is created. The controller only ever
//! talks to the query; how routes are searched is the service's business.
//! [`NavMeshService`] is the bundled implementation over a [`NavMesh`].

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::agent::AgentId;
use crate::config::PathfindingParams;
use crate::error::PathFailure;
use crate::navigation::{path_length, NavMesh, NavPoint, Waypoint};

/// Per-agent route computation
#[async_trait]
pub trait PathQuery: Send + Sync {
    /// Compute a route. On success the waypoint list is non-empty and in
    /// traversal order.
    async fn compute(
        &self,
        agent: AgentId,
        start: NavPoint,
        end: NavPoint,
    ) -> Result<Vec<Waypoint>, PathFailure>;

    /// Free any resources held for the agent. Called once, at teardown.
    fn release(&self) {}
}

/// Factory for per-agent path queries
pub trait PathService: Send + Sync {
    /// Create the query owned by one agent
    fn create_query(&self, params: &PathfindingParams) -> Arc<dyn PathQuery>;
}

/// Path service over a shared, mutable navigation mesh
#[derive(Clone, Default)]
pub struct NavMeshService {
    mesh: Arc<RwLock<NavMesh>>,
}

impl NavMeshService {
    /// Create a service over a mesh
    pub fn new(mesh: NavMesh) -> Self {
        Self {
            mesh: Arc::new(RwLock::new(mesh)),
        }
    }

    /// Edit the mesh in place (e.g. block a doorway). Queries made after this
    /// returns see the change.
    pub fn edit<R>(&self, f: impl FnOnce(&mut NavMesh) -> R) -> R {
        f(&mut self.mesh.write())
    }
}

impl PathService for NavMeshService {
    fn create_query(&self, params: &PathfindingParams) -> Arc<dyn PathQuery> {
        Arc::new(NavMeshQuery {
            mesh: Arc::clone(&self.mesh),
            params: *params,
        })
    }
}

/// One agent's query against a [`NavMeshService`] mesh
pub struct NavMeshQuery {
    mesh: Arc<RwLock<NavMesh>>,
    params: PathfindingParams,
}

#[async_trait]
impl PathQuery for NavMeshQuery {
    async fn compute(
        &self,
        agent: AgentId,
        start: NavPoint,
        end: NavPoint,
    ) -> Result<Vec<Waypoint>, PathFailure> {
        let result = self.mesh.read().find_path(start, end, &self.params);
        match &result {
            Ok(waypoints) => log::debug!(
                "{agent}: {} waypoint(s) {start} -> {end}, length {:.2}",
                waypoints.len(),
                path_length(waypoints)
            ),
            Err(failure) => log::debug!("{agent}: path failed: {failure}"),
        }
        result
    }
}
