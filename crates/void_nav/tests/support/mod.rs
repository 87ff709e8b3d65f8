//! Mock collaborators shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

use void_nav::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Move(NavPoint),
    Jump,
}

/// Locomotor that records commands and teleports to each move target
#[derive(Default)]
pub struct RecordingLocomotor {
    pub commands: Mutex<Vec<Command>>,
    pub position: Mutex<NavPoint>,
}

impl RecordingLocomotor {
    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().clone()
    }

    pub fn command_count(&self) -> usize {
        self.commands.lock().len()
    }
}

impl Locomotor for RecordingLocomotor {
    fn move_to(&self, point: NavPoint) {
        self.commands.lock().push(Command::Move(point));
        *self.position.lock() = point;
    }

    fn jump(&self) {
        self.commands.lock().push(Command::Jump);
    }

    fn current_position(&self) -> NavPoint {
        *self.position.lock()
    }
}

pub struct MockBody {
    pub name: String,
    pub locomotor: Option<Arc<RecordingLocomotor>>,
}

impl MockBody {
    pub fn humanoid(name: &str) -> Self {
        Self {
            name: name.to_string(),
            locomotor: Some(Arc::new(RecordingLocomotor::default())),
        }
    }

    pub fn prop(name: &str) -> Self {
        Self {
            name: name.to_string(),
            locomotor: None,
        }
    }

    pub fn legs(&self) -> Arc<RecordingLocomotor> {
        self.locomotor.clone().expect("humanoid body")
    }
}

impl AgentBody for MockBody {
    fn name(&self) -> &str {
        &self.name
    }

    fn locomotor(&self) -> Option<Arc<dyn Locomotor>> {
        self.locomotor
            .clone()
            .map(|legs| legs as Arc<dyn Locomotor>)
    }
}

/// Shared script for every query a [`ScriptedService`] hands out
pub struct Script {
    /// Every (start, end) the queries were asked for
    pub calls: Mutex<Vec<(NavPoint, NavPoint)>>,
    /// When set, every query fails with `NoPath`
    pub unreachable: AtomicBool,
    /// When set, queries wait for a permit before answering
    pub gated: AtomicBool,
    pub gate: Semaphore,
    pub created: AtomicUsize,
    pub released: AtomicUsize,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            unreachable: AtomicBool::new(false),
            gated: AtomicBool::new(false),
            gate: Semaphore::new(0),
            created: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        }
    }
}

impl Script {
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn goals(&self) -> Vec<NavPoint> {
        self.calls.lock().iter().map(|(_, end)| *end).collect()
    }
}

/// Path service whose routes are start -> jump over midpoint -> goal
#[derive(Clone, Default)]
pub struct ScriptedService {
    pub script: Arc<Script>,
}

impl ScriptedService {
    pub fn route(start: NavPoint, end: NavPoint) -> Vec<Waypoint> {
        let mid = NavPoint::new((start.x + end.x) / 2.0, 1.0, (start.z + end.z) / 2.0);
        vec![Waypoint::walk(start), Waypoint::jump(mid), Waypoint::walk(end)]
    }
}

impl PathService for ScriptedService {
    fn create_query(&self, _params: &PathfindingParams) -> Arc<dyn PathQuery> {
        self.script.created.fetch_add(1, Ordering::SeqCst);
        Arc::new(ScriptedQuery {
            script: Arc::clone(&self.script),
        })
    }
}

pub struct ScriptedQuery {
    script: Arc<Script>,
}

#[async_trait]
impl PathQuery for ScriptedQuery {
    async fn compute(
        &self,
        _agent: AgentId,
        start: NavPoint,
        end: NavPoint,
    ) -> Result<Vec<Waypoint>, PathFailure> {
        self.script.calls.lock().push((start, end));

        if self.script.gated.load(Ordering::SeqCst) {
            if let Ok(permit) = self.script.gate.acquire().await {
                permit.forget();
            }
        }

        if self.script.unreachable.load(Ordering::SeqCst) {
            return Err(PathFailure::no_path(format!("nothing connects {start} and {end}")));
        }
        Ok(ScriptedService::route(start, end))
    }

    fn release(&self) {
        self.script.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Actor that can be moved, despawned and spawned from the test
pub struct MockActor {
    pub name: String,
    pub position: Mutex<Option<NavPoint>>,
    spawn: Notify,
}

impl MockActor {
    pub fn spawned(name: &str, at: NavPoint) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            position: Mutex::new(Some(at)),
            spawn: Notify::new(),
        })
    }

    pub fn unspawned(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            position: Mutex::new(None),
            spawn: Notify::new(),
        })
    }

    pub fn place(&self, at: NavPoint) {
        *self.position.lock() = Some(at);
        self.spawn.notify_waiters();
    }
}

impl WorldObject for MockActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> Option<NavPoint> {
        *self.position.lock()
    }
}

#[async_trait]
impl Actor for MockActor {
    async fn spawned(&self) {
        let notified = self.spawn.notified();
        tokio::pin!(notified);
        // Register before checking so a spawn in between is not missed
        notified.as_mut().enable();
        let present = self.position.lock().is_some();
        if !present {
            notified.await;
        }
    }
}

pub struct StaticProp {
    pub name: String,
    pub position: Option<NavPoint>,
}

impl WorldObject for StaticProp {
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> Option<NavPoint> {
        self.position
    }
}

/// Records every waypoint marker
#[derive(Default)]
pub struct MarkerLog(pub Mutex<Vec<(AgentId, Waypoint)>>);

impl PathVisualizer for MarkerLog {
    fn mark(&self, agent: AgentId, waypoint: &Waypoint) {
        self.0.lock().push((agent, *waypoint));
    }
}

pub struct MockWorld {
    pub actors: Vec<Arc<dyn Actor>>,
}

impl World for MockWorld {
    fn actors(&self) -> Vec<Arc<dyn Actor>> {
        self.actors.clone()
    }
}

pub fn services(service: &ScriptedService) -> NavServices {
    NavServices::new(Arc::new(service.clone()))
}

pub fn quick_computation() -> ComputationSettings {
    ComputationSettings {
        time_between_compute_ms: 10,
    }
}
