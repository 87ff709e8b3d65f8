//! Agent body and locomotion seam

use std::sync::Arc;

use crate::navigation::NavPoint;

/// Actuator that physically moves an agent.
///
/// Commands are fire-and-forget: the locomotor queues or executes them on
/// its own schedule and never reports arrival.
pub trait Locomotor: Send + Sync {
    /// Head toward a point
    fn move_to(&self, point: NavPoint);

    /// Enter the jumping state
    fn jump(&self);

    /// Where the agent is now
    fn current_position(&self) -> NavPoint;
}

/// The host-side entity an agent navigates
pub trait AgentBody: Send + Sync {
    /// Display name, used in logs and error events
    fn name(&self) -> &str;

    /// The body's locomotion capability. Bodies without one cannot be
    /// navigated.
    fn locomotor(&self) -> Option<Arc<dyn Locomotor>>;
}
