//! Navigation events
//!
//! Failures go out on a process-wide [`ErrorChannel`] that every agent shares;
//! arrivals go out on each agent's own [`ReachedChannel`].

use std::sync::Arc;
use void_event::EventBus;

use crate::agent::AgentId;
use crate::error::PathStatus;
use crate::navigation::NavPoint;

/// Published when a path computation fails and the caller did not ask for
/// silence
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationError {
    pub agent: AgentId,
    pub agent_name: String,
    pub status: PathStatus,
    pub message: String,
}

/// Published after the last waypoint of a route has been issued
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DestinationReached {
    pub agent: AgentId,
    /// Locomotor position when the last command went out
    pub position: NavPoint,
    /// Final waypoint of the route
    pub destination: NavPoint,
}

/// Shared failure channel
pub type ErrorChannel = EventBus<NavigationError>;

/// Per-agent arrival channel
pub type ReachedChannel = EventBus<DestinationReached>;

/// Create a fresh error channel to share between agents
pub fn error_channel() -> Arc<ErrorChannel> {
    Arc::new(EventBus::new())
}
