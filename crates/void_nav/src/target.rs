//! Navigation targets
//!
//! A [`Target`] is anything an agent can be sent toward. Fixed points resolve
//! to themselves, static objects are read once, and actors are re-read on
//! every follow cycle because they move (and may not have spawned yet).

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::error::{NavError, NavResult};
use crate::navigation::NavPoint;

/// Something in the world with a position
pub trait WorldObject: Send + Sync {
    /// Display name
    fn name(&self) -> &str;

    /// Current position, or None if the object has no physical presence
    fn position(&self) -> Option<NavPoint>;
}

/// A moving entity that may not exist yet
#[async_trait]
pub trait Actor: WorldObject {
    /// Resolves once the actor has a body in the world. Returns immediately
    /// if it already has one.
    async fn spawned(&self);
}

/// Host world queries
pub trait World: Send + Sync {
    /// Default candidate set for nearest-actor lookups
    fn actors(&self) -> Vec<Arc<dyn Actor>>;
}

/// Where to navigate
#[derive(Clone)]
pub enum Target {
    /// A fixed point
    Point(NavPoint),
    /// A stationary object, resolved once
    Object(Arc<dyn WorldObject>),
    /// A moving actor, resolved on every cycle
    Actor(Arc<dyn Actor>),
}

impl Target {
    /// Whether the target must be re-resolved every cycle
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Target::Actor(_))
    }

    /// Current position without waiting. `None` for an actor that has not
    /// spawned or an object with no position.
    pub fn current_position(&self) -> Option<NavPoint> {
        match self {
            Target::Point(point) => Some(*point),
            Target::Object(object) => object.position(),
            Target::Actor(actor) => actor.position(),
        }
    }

    /// Resolve to a point, waiting for an unspawned actor to appear.
    ///
    /// Fails with [`NavError::InvalidArgument`] for non-finite points and for
    /// objects that have no position.
    pub async fn resolve(&self) -> NavResult<NavPoint> {
        let point = match self {
            Target::Point(point) => *point,
            Target::Object(object) => object.position().ok_or_else(|| {
                NavError::InvalidArgument(format!("object '{}' has no position", object.name()))
            })?,
            Target::Actor(actor) => loop {
                if let Some(point) = actor.position() {
                    break point;
                }
                log::debug!("Waiting for actor '{}' to spawn", actor.name());
                actor.spawned().await;
            },
        };

        if !point.is_finite() {
            return Err(NavError::InvalidArgument(format!("{self:?} resolved to {point}")));
        }
        Ok(point)
    }

    /// Freeze a static target into a fixed point. Actors stay dynamic.
    pub fn pin(self) -> NavResult<Target> {
        if self.is_dynamic() {
            return Ok(self);
        }
        match self.current_position() {
            Some(point) if point.is_finite() => Ok(Target::Point(point)),
            _ => Err(NavError::InvalidArgument(format!("{self:?} has no usable position"))),
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Point(point) => write!(f, "Point{point}"),
            Target::Object(object) => write!(f, "Object({})", object.name()),
            Target::Actor(actor) => write!(f, "Actor({})", actor.name()),
        }
    }
}

impl From<NavPoint> for Target {
    fn from(point: NavPoint) -> Self {
        Target::Point(point)
    }
}

impl From<Arc<dyn WorldObject>> for Target {
    fn from(object: Arc<dyn WorldObject>) -> Self {
        Target::Object(object)
    }
}

impl From<Arc<dyn Actor>> for Target {
    fn from(actor: Arc<dyn Actor>) -> Self {
        Target::Actor(actor)
    }
}
