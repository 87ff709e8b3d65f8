//! Single move-to cycle

use crate::agent::AgentCore;
use crate::cancel::CancelToken;
use crate::config::MoveSettings;
use crate::error::{NavResult, PathFailure};
use crate::events::{DestinationReached, NavigationError};
use crate::navigation::NavPoint;
use crate::walker::WaypointWalker;

/// Runs one compute-then-walk cycle for an agent
pub(crate) struct MoveController<'a> {
    core: &'a AgentCore,
}

impl<'a> MoveController<'a> {
    pub(crate) fn new(core: &'a AgentCore) -> Self {
        Self { core }
    }

    /// Compute a route to `goal` and walk it.
    ///
    /// Returns `Ok(true)` when a route was walked, `Ok(false)` when no route
    /// exists (reported on the error channel unless suppressed) or when
    /// `cancel` fired before the query was invoked.
    /// Once the query has been invoked the cycle always runs to completion.
    pub(crate) async fn move_to(
        &self,
        goal: NavPoint,
        settings: &MoveSettings,
        cancel: &CancelToken,
    ) -> NavResult<bool> {
        let core = self.core;
        // A cancelled cycle never touches the query, which destroy may
        // already have released
        if cancel.is_cancelled() {
            log::debug!("{}: cycle skipped, cancelled", core.id);
            return Ok(false);
        }
        let query = core.query()?;

        // Single flight per agent
        let _flight = core.path_lock.lock().await;
        if cancel.is_cancelled() {
            log::debug!("{}: cycle skipped, cancelled while queued", core.id);
            return Ok(false);
        }

        let start = core.locomotor.current_position();
        let waypoints = match query.compute(core.id, start, goal).await {
            Ok(waypoints) if waypoints.is_empty() => {
                return Ok(self.fail(PathFailure::no_path("query returned no waypoints"), settings));
            }
            Ok(waypoints) => waypoints,
            Err(failure) => return Ok(self.fail(failure, settings)),
        };

        {
            let _motion = core.begin_motion();
            let visualizer = core.services.visualizer.as_deref();
            WaypointWalker::new(core.id, core.locomotor.as_ref())
                .with_visualizer(visualizer)
                .walk(&waypoints, settings);
        }

        let destination = waypoints[waypoints.len() - 1].position;
        log::debug!("{}: issued {} waypoint(s) toward {}", core.id, waypoints.len(), destination);

        core.reached.publish(DestinationReached {
            agent: core.id,
            position: core.locomotor.current_position(),
            destination,
        });

        Ok(true)
    }

    fn fail(&self, failure: PathFailure, settings: &MoveSettings) -> bool {
        let core = self.core;
        if settings.ignore_no_path_error {
            log::debug!("{}: {} (suppressed)", core.id, failure);
            return false;
        }

        log::warn!("{} '{}': {}", core.id, core.name, failure);
        core.services.errors.publish(NavigationError {
            agent: core.id,
            agent_name: core.name.clone(),
            status: failure.status,
            message: failure.message,
        });
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{NavAgent, NavServices};
    use crate::body::{AgentBody, Locomotor};
    use crate::navigation::NavMesh;
    use crate::query::NavMeshService;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct Legs {
        moves: Mutex<Vec<NavPoint>>,
    }

    impl Locomotor for Legs {
        fn move_to(&self, point: NavPoint) {
            self.moves.lock().push(point);
        }

        fn jump(&self) {}

        fn current_position(&self) -> NavPoint {
            NavPoint::new(1.0, 0.0, 1.0)
        }
    }

    struct Walker(Arc<Legs>);

    impl AgentBody for Walker {
        fn name(&self) -> &str {
            "walker"
        }

        fn locomotor(&self) -> Option<Arc<dyn Locomotor>> {
            let legs: Arc<dyn Locomotor> = self.0.clone();
            Some(legs)
        }
    }

    fn agent(legs: &Arc<Legs>) -> NavAgent {
        let service = NavMeshService::new(NavMesh::create_grid(10.0, 10.0, 2.0));
        let services = Arc::new(NavServices::new(Arc::new(service)));
        NavAgent::new(&Walker(legs.clone()), services).unwrap()
    }

    #[tokio::test]
    async fn test_cancelled_cycle_after_destroy_is_quiet() {
        let legs = Arc::new(Legs::default());
        let agent = agent(&legs);
        let (_id, errors) = agent.errors().subscribe_channel();
        agent.destroy().unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let result = MoveController::new(agent.core())
            .move_to(NavPoint::new(7.0, 0.0, 7.0), &MoveSettings::default(), &cancel)
            .await;

        assert!(matches!(result, Ok(false)));
        assert!(legs.moves.lock().is_empty());
        assert_eq!(errors.try_iter().count(), 0);
    }

    #[tokio::test]
    async fn test_uncancelled_cycle_walks() {
        let legs = Arc::new(Legs::default());
        let agent = agent(&legs);

        let goal = NavPoint::new(7.0, 0.0, 7.0);
        let walked = MoveController::new(agent.core())
            .move_to(goal, &MoveSettings::default(), &CancelToken::new())
            .await
            .unwrap();

        assert!(walked);
        assert_eq!(legs.moves.lock().last(), Some(&goal));
    }
}
