//! Navigation primitives and the grid navigation mesh

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

use crate::config::PathfindingParams;
use crate::error::{PathFailure, PathStatus};

/// A point in world space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl NavPoint {
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a new nav point
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Distance to another point
    pub fn distance_to(&self, other: &NavPoint) -> f32 {
        self.distance_squared_to(other).sqrt()
    }

    /// Squared distance (faster for comparisons)
    pub fn distance_squared_to(&self, other: &NavPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// True when every coordinate is finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl fmt::Display for NavPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// What the agent does to reach a waypoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointAction {
    #[default]
    Walk,
    Jump,
}

/// One stop on a computed route
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub position: NavPoint,
    pub action: WaypointAction,
}

impl Waypoint {
    /// Walk to a point
    pub fn walk(position: NavPoint) -> Self {
        Self {
            position,
            action: WaypointAction::Walk,
        }
    }

    /// Jump, then move to a point
    pub fn jump(position: NavPoint) -> Self {
        Self {
            position,
            action: WaypointAction::Jump,
        }
    }
}

/// Total length of a waypoint sequence
pub fn path_length(waypoints: &[Waypoint]) -> f32 {
    waypoints
        .windows(2)
        .map(|pair| pair[0].position.distance_to(&pair[1].position))
        .sum()
}

/// A polygon in the navigation mesh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavPolygon {
    /// Vertex indices
    pub vertices: Vec<usize>,
    /// Center point
    pub center: NavPoint,
    /// Neighboring polygon indices
    pub neighbors: Vec<usize>,
    /// Area cost multiplier (higher = harder to traverse)
    pub cost: f32,
    /// Whether this polygon is walkable
    pub walkable: bool,
    /// Whether entering this polygon requires a jump
    pub jump: bool,
    /// Vertical clearance above the polygon
    pub clearance: f32,
}

impl NavPolygon {
    /// Create a new polygon
    pub fn new(vertices: Vec<usize>, center: NavPoint) -> Self {
        Self {
            vertices,
            center,
            neighbors: Vec::new(),
            cost: 1.0,
            walkable: true,
            jump: false,
            clearance: f32::INFINITY,
        }
    }

    /// Whether an agent with these parameters may stand here
    pub fn passable(&self, params: &PathfindingParams) -> bool {
        self.walkable
            && self.clearance >= params.agent_height
            && (!self.jump || params.agent_can_jump)
    }
}

/// Navigation mesh for pathfinding
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavMesh {
    /// Vertices of the mesh
    pub vertices: Vec<NavPoint>,
    /// Polygons of the mesh
    pub polygons: Vec<NavPolygon>,
    /// Grid cell size for spatial queries
    cell_size: f32,
    /// Spatial hash for quick polygon lookup
    #[serde(skip)]
    spatial_hash: HashMap<(i32, i32), Vec<usize>>,
}

impl NavMesh {
    /// Create a new empty nav mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            polygons: Vec::new(),
            cell_size: 5.0,
            spatial_hash: HashMap::new(),
        }
    }

    /// Create a flat grid nav mesh on the XZ plane.
    ///
    /// A non-positive or non-finite `cell_size`, or a non-finite or negative
    /// extent, yields an empty mesh.
    pub fn create_grid(width: f32, depth: f32, cell_size: f32) -> Self {
        let extent_ok = |v: f32| v.is_finite() && v >= 0.0;
        if !(cell_size.is_finite() && cell_size > 0.0) || !extent_ok(width) || !extent_ok(depth) {
            log::warn!("Refusing {width} x {depth} grid with cell size {cell_size}");
            return Self::new();
        }

        let mut mesh = Self::new();
        mesh.cell_size = cell_size;

        let cols = (width / cell_size).ceil() as usize;
        let rows = (depth / cell_size).ceil() as usize;

        for row in 0..=rows {
            for col in 0..=cols {
                let x = col as f32 * cell_size;
                let z = row as f32 * cell_size;
                mesh.vertices.push(NavPoint::new(x, 0.0, z));
            }
        }

        let stride = cols + 1;
        for row in 0..rows {
            for col in 0..cols {
                let base = row * stride + col;
                let vertices = vec![base, base + 1, base + stride + 1, base + stride];
                let center = NavPoint::new(
                    (col as f32 + 0.5) * cell_size,
                    0.0,
                    (row as f32 + 0.5) * cell_size,
                );
                mesh.polygons.push(NavPolygon::new(vertices, center));
            }
        }

        // 4-connected neighbors
        for row in 0..rows {
            for col in 0..cols {
                let idx = row * cols + col;
                let mut neighbors = Vec::with_capacity(4);
                if col > 0 {
                    neighbors.push(idx - 1);
                }
                if col + 1 < cols {
                    neighbors.push(idx + 1);
                }
                if row > 0 {
                    neighbors.push(idx - cols);
                }
                if row + 1 < rows {
                    neighbors.push(idx + cols);
                }
                mesh.polygons[idx].neighbors = neighbors;
            }
        }

        mesh.rebuild_spatial_hash();
        mesh
    }

    /// Rebuild spatial hash for queries
    pub fn rebuild_spatial_hash(&mut self) {
        self.spatial_hash.clear();
        for (idx, poly) in self.polygons.iter().enumerate() {
            let cell = self.cell_of(&poly.center);
            self.spatial_hash.entry(cell).or_default().push(idx);
        }
    }

    fn cell_of(&self, point: &NavPoint) -> (i32, i32) {
        (
            (point.x / self.cell_size).floor() as i32,
            (point.z / self.cell_size).floor() as i32,
        )
    }

    /// Find the polygon nearest to a point, if the point is on the mesh
    pub fn find_polygon(&self, point: &NavPoint) -> Option<usize> {
        let (cell_x, cell_z) = self.cell_of(point);

        let mut best: Option<(usize, f32)> = None;
        for dx in -1..=1 {
            for dz in -1..=1 {
                let Some(indices) = self.spatial_hash.get(&(cell_x + dx, cell_z + dz)) else {
                    continue;
                };
                for &idx in indices {
                    let d = point.distance_squared_to(&self.polygons[idx].center);
                    if self.point_in_polygon(point, idx) && best.map_or(true, |(_, b)| d < b) {
                        best = Some((idx, d));
                    }
                }
            }
        }

        best.map(|(idx, _)| idx)
    }

    /// Simple containment check based on center distance
    fn point_in_polygon(&self, point: &NavPoint, polygon_idx: usize) -> bool {
        let poly = &self.polygons[polygon_idx];
        point.distance_to(&poly.center) < self.cell_size
    }

    /// Find a route between two points using A*.
    ///
    /// The route starts at `start`, passes through the center of every
    /// polygon after the first, and ends at `end`. Entering a jump polygon
    /// yields a [`WaypointAction::Jump`] waypoint.
    pub fn find_path(
        &self,
        start: NavPoint,
        end: NavPoint,
        params: &PathfindingParams,
    ) -> Result<Vec<Waypoint>, PathFailure> {
        if !start.is_finite() || !end.is_finite() {
            return Err(PathFailure::new(PathStatus::Invalid, "non-finite query point"));
        }

        let start_poly = self
            .find_polygon(&start)
            .filter(|&idx| self.polygons[idx].passable(params))
            .ok_or_else(|| {
                PathFailure::new(PathStatus::StartUnreachable, format!("start {start} is off the mesh"))
            })?;
        let end_poly = self
            .find_polygon(&end)
            .filter(|&idx| self.polygons[idx].passable(params))
            .ok_or_else(|| {
                PathFailure::new(PathStatus::GoalUnreachable, format!("goal {end} is off the mesh"))
            })?;

        if start_poly == end_poly {
            return Ok(vec![Waypoint::walk(start), Waypoint::walk(end)]);
        }

        let path_indices = self
            .astar(start_poly, end_poly, params)
            .ok_or_else(|| PathFailure::no_path(format!("no route from {start} to {end}")))?;

        let mut waypoints = Vec::with_capacity(path_indices.len() + 1);
        waypoints.push(Waypoint::walk(start));
        for &idx in &path_indices[1..] {
            let poly = &self.polygons[idx];
            waypoints.push(if poly.jump {
                Waypoint::jump(poly.center)
            } else {
                Waypoint::walk(poly.center)
            });
        }
        waypoints.push(Waypoint::walk(end));

        Ok(waypoints)
    }

    /// A* over polygon adjacency; returns polygon indices from `start` to `goal`
    fn astar(&self, start: usize, goal: usize, params: &PathfindingParams) -> Option<Vec<usize>> {
        let count = self.polygons.len();
        let goal_center = self.polygons[goal].center;
        let heuristic = |idx: usize| self.polygons[idx].center.distance_to(&goal_center);

        let mut best_cost = vec![f32::INFINITY; count];
        let mut parent: Vec<Option<usize>> = vec![None; count];
        let mut settled = vec![false; count];
        let mut frontier = BinaryHeap::new();

        best_cost[start] = 0.0;
        frontier.push(Frontier {
            estimate: heuristic(start),
            polygon: start,
        });

        while let Some(Frontier { polygon, .. }) = frontier.pop() {
            if polygon == goal {
                let mut route: Vec<usize> =
                    std::iter::successors(Some(goal), |&idx| parent[idx]).collect();
                route.reverse();
                return Some(route);
            }
            if std::mem::replace(&mut settled[polygon], true) {
                continue;
            }

            let here = &self.polygons[polygon];
            for &next in &here.neighbors {
                let there = &self.polygons[next];
                if settled[next] || !there.passable(params) {
                    continue;
                }

                let cost = best_cost[polygon] + here.center.distance_to(&there.center) * there.cost;
                if cost < best_cost[next] {
                    best_cost[next] = cost;
                    parent[next] = Some(polygon);
                    frontier.push(Frontier {
                        estimate: cost + heuristic(next),
                        polygon: next,
                    });
                }
            }
        }

        None
    }

    /// Mark a polygon as walkable or blocked
    pub fn set_walkable(&mut self, polygon_idx: usize, walkable: bool) {
        if let Some(poly) = self.polygons.get_mut(polygon_idx) {
            poly.walkable = walkable;
        }
    }

    /// Mark a polygon as requiring a jump to enter
    pub fn set_jump(&mut self, polygon_idx: usize, jump: bool) {
        if let Some(poly) = self.polygons.get_mut(polygon_idx) {
            poly.jump = jump;
        }
    }

    /// Set vertical clearance for a polygon
    pub fn set_clearance(&mut self, polygon_idx: usize, clearance: f32) {
        if let Some(poly) = self.polygons.get_mut(polygon_idx) {
            poly.clearance = clearance;
        }
    }

    /// Set cost for a polygon
    pub fn set_cost(&mut self, polygon_idx: usize, cost: f32) {
        if let Some(poly) = self.polygons.get_mut(polygon_idx) {
            poly.cost = cost;
        }
    }
}

/// Open-set entry; the lowest estimate pops first
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frontier {
    estimate: f32,
    polygon: usize,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| self.polygon.cmp(&other.polygon))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
