//! Navigation agents
//!
//! [`NavAgent`] is the public handle: it owns one path query, at most one
//! follow loop and its own arrival channel. Everything an agent shares with
//! other agents lives in [`NavServices`], built once by the host.

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;

use crate::body::{AgentBody, Locomotor};
use crate::cancel::CancelToken;
use crate::config::{ComputationSettings, MoveSettings, NavConfig, PathfindingParams};
use crate::controller::MoveController;
use crate::error::{NavError, NavResult};
use crate::events::{error_channel, ErrorChannel, ReachedChannel};
use crate::follow::{ActiveFollow, FollowHandle, FollowLoop, FollowState};
use crate::navigation::NavPoint;
use crate::nearest::get_nearest;
use crate::query::{PathQuery, PathService};
use crate::target::{Actor, Target, World};
use crate::walker::PathVisualizer;

/// Agent identifier, unique within one [`NavServices`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

/// Host collaborators shared by every agent
pub struct NavServices {
    /// Creates each agent's path query
    pub path_service: Arc<dyn PathService>,
    /// Process-wide failure channel
    pub errors: Arc<ErrorChannel>,
    /// Default candidates for nearest-actor lookups
    pub world: Option<Arc<dyn World>>,
    /// Marker sink for `visualize_path`
    pub visualizer: Option<Arc<dyn PathVisualizer>>,
    next_agent_id: AtomicU64,
}

impl NavServices {
    /// Create services with a fresh error channel
    pub fn new(path_service: Arc<dyn PathService>) -> Self {
        Self {
            path_service,
            errors: error_channel(),
            world: None,
            visualizer: None,
            next_agent_id: AtomicU64::new(1),
        }
    }

    /// Share an existing error channel
    pub fn with_error_channel(mut self, errors: Arc<ErrorChannel>) -> Self {
        self.errors = errors;
        self
    }

    /// Set the world used for default nearest lookups
    pub fn with_world(mut self, world: Arc<dyn World>) -> Self {
        self.world = Some(world);
        self
    }

    /// Set the waypoint marker sink
    pub fn with_visualizer(mut self, visualizer: Arc<dyn PathVisualizer>) -> Self {
        self.visualizer = Some(visualizer);
        self
    }

    /// Nearest actor from the world's default collection
    pub fn nearest_actor(
        &self,
        position: &NavPoint,
        predicate: Option<&dyn Fn(&Arc<dyn Actor>) -> bool>,
    ) -> Option<Arc<dyn Actor>> {
        let world = self.world.as_ref()?;
        get_nearest(position, world.actors(), predicate)
    }

    fn next_id(&self) -> AgentId {
        AgentId(self.next_agent_id.fetch_add(1, Ordering::Relaxed))
    }
}

/// Shared agent state, owned by every handle clone
pub(crate) struct AgentCore {
    pub(crate) id: AgentId,
    pub(crate) name: String,
    pub(crate) locomotor: Arc<dyn Locomotor>,
    pub(crate) services: Arc<NavServices>,
    pub(crate) computation: ComputationSettings,
    pub(crate) reached: ReachedChannel,
    /// Serializes query-and-walk cycles
    pub(crate) path_lock: tokio::sync::Mutex<()>,
    query: RwLock<Option<Arc<dyn PathQuery>>>,
    follow: Mutex<Option<ActiveFollow>>,
    walking: AtomicUsize,
    destroyed: AtomicBool,
}

impl AgentCore {
    /// The agent's query, or an error once it has been released
    pub(crate) fn query(&self) -> NavResult<Arc<dyn PathQuery>> {
        self.query
            .read()
            .clone()
            .ok_or_else(|| self.use_after_destroy())
    }

    /// Mark the agent as walking for the guard's lifetime
    pub(crate) fn begin_motion(&self) -> MotionGuard<'_> {
        self.walking.fetch_add(1, Ordering::AcqRel);
        MotionGuard { core: self }
    }

    fn is_moving(&self) -> bool {
        if self.walking.load(Ordering::Acquire) > 0 {
            return true;
        }
        self.follow
            .lock()
            .as_ref()
            .is_some_and(|active| active.handle.is_active() && active.handle.state() == FollowState::Running)
    }

    fn ensure_alive(&self) -> NavResult<()> {
        if self.destroyed.load(Ordering::Acquire) {
            return Err(self.use_after_destroy());
        }
        Ok(())
    }

    fn use_after_destroy(&self) -> NavError {
        log::error!("{} '{}' used after destroy", self.id, self.name);
        NavError::UseAfterDestroy(self.name.clone())
    }
}

impl Drop for AgentCore {
    fn drop(&mut self) {
        // Last handle gone: a still-running follow loop must not outlive it
        if let Some(active) = self.follow.get_mut().take() {
            active.handle.cancel();
        }
    }
}

pub(crate) struct MotionGuard<'a> {
    core: &'a AgentCore,
}

impl Drop for MotionGuard<'_> {
    fn drop(&mut self) {
        self.core.walking.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Handle to a navigated agent.
///
/// Clones share the same agent. Calls on one agent are serialized: only one
/// path query is in flight at a time, and starting a follow loop cancels the
/// one already running.
#[derive(Clone)]
pub struct NavAgent {
    core: Arc<AgentCore>,
}

impl NavAgent {
    /// Create an agent with default parameters
    pub fn new(body: &dyn AgentBody, services: Arc<NavServices>) -> NavResult<Self> {
        Self::with_settings(body, services, PathfindingParams::default(), ComputationSettings::default())
    }

    /// Create an agent from a config document
    pub fn from_config(
        body: &dyn AgentBody,
        services: Arc<NavServices>,
        config: &NavConfig,
    ) -> NavResult<Self> {
        Self::with_settings(body, services, config.pathfinding, config.computation)
    }

    /// Create an agent.
    ///
    /// Fails with [`NavError::InvalidArgument`] if the body cannot move.
    pub fn with_settings(
        body: &dyn AgentBody,
        services: Arc<NavServices>,
        params: PathfindingParams,
        computation: ComputationSettings,
    ) -> NavResult<Self> {
        let locomotor = body.locomotor().ok_or_else(|| {
            NavError::InvalidArgument(format!("'{}' has no locomotor", body.name()))
        })?;

        let query = services.path_service.create_query(&params);
        let id = services.next_id();
        log::info!("{} created for '{}'", id, body.name());

        let core = AgentCore {
            id,
            name: body.name().to_string(),
            locomotor,
            services,
            computation,
            reached: ReachedChannel::new(),
            path_lock: tokio::sync::Mutex::new(()),
            query: RwLock::new(Some(query)),
            follow: Mutex::new(None),
            walking: AtomicUsize::new(0),
            destroyed: AtomicBool::new(false),
        };

        Ok(Self { core: Arc::new(core) })
    }

    #[cfg(test)]
    pub(crate) fn core(&self) -> &AgentCore {
        &self.core
    }

    /// Agent identifier
    pub fn id(&self) -> AgentId {
        self.core.id
    }

    /// Body name
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Computation settings in effect
    pub fn computation_settings(&self) -> ComputationSettings {
        self.core.computation
    }

    /// True while a route is being walked or a follow loop is cycling
    pub fn is_moving(&self) -> bool {
        self.core.is_moving()
    }

    /// Whether [`destroy`](Self::destroy) has been called
    pub fn is_destroyed(&self) -> bool {
        self.core.destroyed.load(Ordering::Acquire)
    }

    /// This agent's arrival channel
    pub fn reached(&self) -> NavResult<&ReachedChannel> {
        self.core.ensure_alive()?;
        Ok(&self.core.reached)
    }

    /// The shared failure channel
    pub fn errors(&self) -> &Arc<ErrorChannel> {
        &self.core.services.errors
    }

    /// Navigate once toward `place`.
    ///
    /// Returns `Ok(true)` when a route was found and walked, `Ok(false)` when
    /// none exists. Invalid places fail immediately.
    pub async fn move_to(&self, place: impl Into<Target>, settings: MoveSettings) -> NavResult<bool> {
        self.core.ensure_alive()?;
        let goal = place.into().resolve().await?;
        MoveController::new(&self.core)
            .move_to(goal, &settings, &CancelToken::new())
            .await
    }

    /// Start following `target`, replacing any follow loop already running.
    ///
    /// Returns as soon as the loop is spawned; the first cycle runs in the
    /// background. Must be called from within a tokio runtime.
    pub fn follow(&self, target: impl Into<Target>, settings: MoveSettings) -> NavResult<FollowHandle> {
        self.core.ensure_alive()?;
        let target = target.into().pin()?;
        let runtime = Handle::try_current().map_err(|_| NavError::NoRuntime)?;

        let mut slot = self.core.follow.lock();
        if let Some(previous) = slot.take() {
            if previous.handle.is_active() {
                log::info!("{}: replacing active follow loop", self.core.id);
            }
            previous.handle.cancel();
        }

        log::info!("{}: follow {:?}", self.core.id, target);
        let active = FollowLoop::new(&self.core, target, settings).spawn(&runtime);
        let handle = active.handle.clone();
        *slot = Some(active);

        Ok(handle)
    }

    /// The current follow loop, if one is active
    pub fn follow_handle(&self) -> Option<FollowHandle> {
        self.core
            .follow
            .lock()
            .as_ref()
            .filter(|active| active.handle.is_active())
            .map(|active| active.handle.clone())
    }

    /// Stop the active follow loop.
    ///
    /// Returns the agent's resulting `is_moving`. Fails with
    /// [`NavError::NotFollowing`] when no loop is active.
    pub fn stop_following(&self) -> NavResult<bool> {
        self.core.ensure_alive()?;

        let active = self.core.follow.lock().take();
        match active {
            Some(active) if active.handle.is_active() => {
                active.handle.cancel();
                log::info!("{}: stopped following", self.core.id);
                Ok(self.is_moving())
            }
            _ => Err(NavError::NotFollowing),
        }
    }

    /// Tear the agent down.
    ///
    /// Cancels any follow loop without waiting for it, releases the path
    /// query and drops all arrival subscribers. Every later call on any clone
    /// of this handle fails with [`NavError::UseAfterDestroy`].
    pub fn destroy(&self) -> NavResult<()> {
        if self.core.destroyed.swap(true, Ordering::AcqRel) {
            return Err(self.core.use_after_destroy());
        }

        if let Some(active) = self.core.follow.lock().take() {
            active.handle.cancel();
        }
        if let Some(query) = self.core.query.write().take() {
            query.release();
        }
        self.core.reached.clear();

        log::info!("{} '{}' destroyed", self.core.id, self.core.name);
        Ok(())
    }
}

impl fmt::Debug for NavAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavAgent")
            .field("id", &self.core.id)
            .field("name", &self.core.name)
            .field("moving", &self.is_moving())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
