//! Nav playground
//!
//! Spawns one agent on a walled grid, sends it somewhere reachable and
//! somewhere that is not, then has it chase a circling runner for a while.
//!
//! Usage: `nav_playground [nav.toml]`
//! Set `RUST_LOG=debug` to see every cycle.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use void_nav::prelude::*;

const GRID_SIZE: f32 = 20.0;
const WALL_COLUMN: usize = 10;

/// Teleports to every commanded point
struct SimulatedLegs {
    position: Mutex<NavPoint>,
}

impl Locomotor for SimulatedLegs {
    fn move_to(&self, point: NavPoint) {
        log::trace!("legs -> {point}");
        *self.position.lock() = point;
    }

    fn jump(&self) {
        log::trace!("legs jump");
    }

    fn current_position(&self) -> NavPoint {
        *self.position.lock()
    }
}

struct Body {
    name: String,
    legs: Arc<SimulatedLegs>,
}

impl AgentBody for Body {
    fn name(&self) -> &str {
        &self.name
    }

    fn locomotor(&self) -> Option<Arc<dyn Locomotor>> {
        let legs: Arc<dyn Locomotor> = self.legs.clone();
        Some(legs)
    }
}

/// Actor driven by a background task
struct Runner {
    position: Mutex<Option<NavPoint>>,
    spawn: Notify,
}

impl WorldObject for Runner {
    fn name(&self) -> &str {
        "runner"
    }

    fn position(&self) -> Option<NavPoint> {
        *self.position.lock()
    }
}

#[async_trait]
impl Actor for Runner {
    async fn spawned(&self) {
        let notified = self.spawn.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        let present = self.position.lock().is_some();
        if !present {
            notified.await;
        }
    }
}

/// The playground's only actor
struct Field {
    runner: Arc<Runner>,
}

impl World for Field {
    fn actors(&self) -> Vec<Arc<dyn Actor>> {
        let runner: Arc<dyn Actor> = self.runner.clone();
        vec![runner]
    }
}

struct LogMarkers;

impl PathVisualizer for LogMarkers {
    fn mark(&self, agent: AgentId, waypoint: &Waypoint) {
        log::info!("{agent} marker {:?} at {}", waypoint.action, waypoint.position);
    }
}

fn build_mesh() -> NavMesh {
    let mut mesh = NavMesh::create_grid(GRID_SIZE, GRID_SIZE, 1.0);
    let cols = GRID_SIZE as usize;
    for row in 0..cols {
        mesh.set_walkable(row * cols + WALL_COLUMN, false);
    }
    // A ledge the agent has to hop onto
    mesh.set_jump(5 * cols + 5, true);
    mesh
}

async fn run(config: NavConfig) -> NavResult<()> {
    let runner = Arc::new(Runner {
        position: Mutex::new(None),
        spawn: Notify::new(),
    });
    let mesh_service = Arc::new(NavMeshService::new(build_mesh()));
    let services = Arc::new(
        NavServices::new(mesh_service.clone())
            .with_world(Arc::new(Field {
                runner: runner.clone(),
            }))
            .with_visualizer(Arc::new(LogMarkers)),
    );

    services.errors.subscribe(|event: &NavigationError| {
        log::warn!("[errors] {} ({}): {}", event.agent_name, event.status, event.message);
    });

    let body = Body {
        name: "scout".to_string(),
        legs: Arc::new(SimulatedLegs {
            position: Mutex::new(NavPoint::new(1.5, 0.0, 1.5)),
        }),
    };
    let agent = NavAgent::from_config(&body, services.clone(), &config)?;
    let (_id, arrivals) = agent.reached()?.subscribe_channel();

    // Reachable, with markers
    let settings = config.movement.with_visualization();
    let arrived = agent.move_to(NavPoint::new(8.5, 0.0, 9.5), settings).await?;
    log::info!("left side: arrived={arrived}");

    // Behind the wall
    let arrived = agent
        .move_to(NavPoint::new(15.5, 0.0, 9.5), MoveSettings::default())
        .await?;
    log::info!("right side: arrived={arrived}");

    // Open a door and chase the runner
    mesh_service.edit(|mesh| mesh.set_walkable(10 * GRID_SIZE as usize + WALL_COLUMN, true));

    let handle = agent.follow(Target::Actor(runner.clone()), MoveSettings::quiet())?;

    let mover = runner.clone();
    let circling = tokio::spawn(async move {
        for step in 0..40u32 {
            let angle = step as f32 * 0.3;
            let point = NavPoint::new(14.5 + 3.0 * angle.cos(), 0.0, 10.5 + 3.0 * angle.sin());
            *mover.position.lock() = Some(point);
            mover.spawn.notify_waiters();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    });

    circling.await.ok();
    log::info!("following: moving={} cycles={}", agent.is_moving(), handle.cycles());

    let still_moving = agent.stop_following()?;
    handle.finished().await;
    log::info!("stopped: moving={still_moving} state={:?}", handle.state());

    log::info!("arrivals received: {}", arrivals.try_iter().count());
    log::info!("error channel: {:?}", services.errors.stats());
    if let Some(actor) = services.nearest_actor(&body.legs.current_position(), None) {
        log::info!("nearest actor: {} at {:?}", actor.name(), actor.position());
    }

    agent.destroy()?;
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => match NavConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => NavConfig::default(),
    };

    if let Err(e) = run(config).await {
        log::error!("Playground failed: {}", e);
        std::process::exit(1);
    }
}
