//! Waypoint traversal

use crate::agent::AgentId;
use crate::body::Locomotor;
use crate::config::MoveSettings;
use crate::navigation::{Waypoint, WaypointAction};

/// Receives waypoint markers when path visualization is on
pub trait PathVisualizer: Send + Sync {
    /// Show a transient marker for one waypoint
    fn mark(&self, agent: AgentId, waypoint: &Waypoint);
}

/// Drives a locomotor through a route
pub struct WaypointWalker<'a> {
    agent: AgentId,
    locomotor: &'a dyn Locomotor,
    visualizer: Option<&'a dyn PathVisualizer>,
}

impl<'a> WaypointWalker<'a> {
    /// Create a walker for one agent
    pub fn new(agent: AgentId, locomotor: &'a dyn Locomotor) -> Self {
        Self {
            agent,
            locomotor,
            visualizer: None,
        }
    }

    /// Attach a marker sink
    pub fn with_visualizer(mut self, visualizer: Option<&'a dyn PathVisualizer>) -> Self {
        self.visualizer = visualizer;
        self
    }

    /// Issue move commands for every waypoint, in order.
    ///
    /// Commands go out back to back with no arrival barrier. A jump waypoint
    /// issues the jump before its move. Returns the number of waypoints issued.
    pub fn walk(&self, waypoints: &[Waypoint], settings: &MoveSettings) -> usize {
        for waypoint in waypoints {
            if settings.visualize_path {
                if let Some(visualizer) = self.visualizer {
                    visualizer.mark(self.agent, waypoint);
                }
            }

            if waypoint.action == WaypointAction::Jump {
                self.locomotor.jump();
            }
            self.locomotor.move_to(waypoint.position);
        }

        waypoints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::NavPoint;
    use parking_lot::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Command {
        Move(NavPoint),
        Jump,
    }

    #[derive(Default)]
    struct Recorder {
        commands: Mutex<Vec<Command>>,
    }

    impl Locomotor for Recorder {
        fn move_to(&self, point: NavPoint) {
            self.commands.lock().push(Command::Move(point));
        }

        fn jump(&self) {
            self.commands.lock().push(Command::Jump);
        }

        fn current_position(&self) -> NavPoint {
            NavPoint::ORIGIN
        }
    }

    #[derive(Default)]
    struct Markers(Mutex<Vec<NavPoint>>);

    impl PathVisualizer for Markers {
        fn mark(&self, _agent: AgentId, waypoint: &Waypoint) {
            self.0.lock().push(waypoint.position);
        }
    }

    fn route() -> Vec<Waypoint> {
        vec![
            Waypoint::walk(NavPoint::new(0.0, 0.0, 0.0)),
            Waypoint::jump(NavPoint::new(1.0, 1.0, 0.0)),
            Waypoint::walk(NavPoint::new(2.0, 0.0, 0.0)),
        ]
    }

    #[test]
    fn test_walk_order_and_jump() {
        let recorder = Recorder::default();
        let walker = WaypointWalker::new(AgentId(1), &recorder);

        assert_eq!(walker.walk(&route(), &MoveSettings::default()), 3);
        assert_eq!(
            *recorder.commands.lock(),
            vec![
                Command::Move(NavPoint::new(0.0, 0.0, 0.0)),
                Command::Jump,
                Command::Move(NavPoint::new(1.0, 1.0, 0.0)),
                Command::Move(NavPoint::new(2.0, 0.0, 0.0)),
            ]
        );
    }

    #[test]
    fn test_empty_route_is_noop() {
        let recorder = Recorder::default();
        let walker = WaypointWalker::new(AgentId(1), &recorder);

        assert_eq!(walker.walk(&[], &MoveSettings::default()), 0);
        assert!(recorder.commands.lock().is_empty());
    }

    #[test]
    fn test_visualization_is_side_effect_only() {
        let plain = Recorder::default();
        let marked = Recorder::default();
        let markers = Markers::default();

        WaypointWalker::new(AgentId(1), &plain).walk(&route(), &MoveSettings::default());
        WaypointWalker::new(AgentId(1), &marked)
            .with_visualizer(Some(&markers))
            .walk(&route(), &MoveSettings::default().with_visualization());

        assert_eq!(*plain.commands.lock(), *marked.commands.lock());
        assert_eq!(markers.0.lock().len(), 3);
    }

    #[test]
    fn test_no_markers_when_disabled() {
        let recorder = Recorder::default();
        let markers = Markers::default();

        WaypointWalker::new(AgentId(1), &recorder)
            .with_visualizer(Some(&markers))
            .walk(&route(), &MoveSettings::default());

        assert!(markers.0.lock().is_empty());
    }
}
