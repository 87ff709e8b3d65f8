//! Void Nav - Agent Navigation
//!
//! Drives agents toward points, objects and moving actors.
//!
//! # Features
//!
//! - One-shot move-to with structured failure reporting
//! - Cancellable follow loops that re-aim at moving targets
//! - Shared error channel and per-agent arrival events
//! - Nearest-candidate lookup
//! - Grid nav mesh path service (A*)
//!
//! # Example
//!
//! ```ignore
//! use void_nav::prelude::*;
//!
//! let services = Arc::new(NavServices::new(Arc::new(NavMeshService::new(mesh))));
//! let agent = NavAgent::new(&body, services)?;
//!
//! agent.move_to(NavPoint::new(10.0, 0.0, 4.0), MoveSettings::default()).await?;
//!
//! agent.follow(Target::Actor(player), MoveSettings::quiet())?;
//! // ...
//! agent.stop_following()?;
//! agent.destroy()?;
//! ```

pub mod agent;
pub mod body;
pub mod cancel;
pub mod config;
mod controller;
pub mod error;
pub mod events;
pub mod follow;
pub mod navigation;
pub mod nearest;
pub mod query;
pub mod target;
pub mod walker;

pub mod prelude {
    pub use crate::agent::{AgentId, NavAgent, NavServices};
    pub use crate::body::{AgentBody, Locomotor};
    pub use crate::cancel::CancelToken;
    pub use crate::config::{ComputationSettings, MoveSettings, NavConfig, PathfindingParams};
    pub use crate::error::{NavError, NavResult, PathFailure, PathStatus};
    pub use crate::events::{DestinationReached, ErrorChannel, NavigationError, ReachedChannel};
    pub use crate::follow::{FollowHandle, FollowState};
    pub use crate::navigation::{NavMesh, NavPoint, Waypoint, WaypointAction};
    pub use crate::nearest::{get_nearest, Locate};
    pub use crate::query::{NavMeshService, PathQuery, PathService};
    pub use crate::target::{Actor, Target, World, WorldObject};
    pub use crate::walker::{PathVisualizer, WaypointWalker};
}

pub use prelude::*;
