// Ring layout for the revealed prerequisite graph.
//
// Goals:
// - Deterministic: no randomness, ids sorted before any indexing
// - Root fixed at the anchor, every other node on the ring of its depth
// - Siblings clustered around their parent's angle, clusters kept apart
// - No overlapping cards once a run has finished
// - Runnable in small per-frame chunks and cancelable
//
// Submodules:
// - adjacency: prerequisite adjacency and BFS depths
// - radial_placement: ring angles and cluster packing
// - relaxation: pull toward ring targets, collision separation, clamping
// - spatial_grid: broad phase for collision separation
// - task: cancelable, frame-chunked relaxation run

use serde::{Deserialize, Serialize};

use crate::catalog::CourseId;
use crate::graph::state::GraphState;

pub mod adjacency;
pub mod radial_placement;
pub mod relaxation;
pub mod spatial_grid;
pub mod task;

use adjacency::{Adjacency, DepthMap};
use radial_placement::assign_angles;
use relaxation::Body;
use task::LayoutRun;

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The point at `radius` from `center` in direction `angle` (radians, y down).
    pub fn polar(center: Point, radius: f64, angle: f64) -> Self {
        Self { x: center.x + radius * angle.cos(), y: center.y + radius * angle.sin() }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct SizeF {
    pub w: f64,
    pub h: f64,
}

/// Axis-aligned box, `x`/`y` is the top-left corner.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct RectF {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl RectF {
    pub fn around(center: Point, size: SizeF) -> RectF {
        RectF { x: center.x - size.w / 2.0, y: center.y - size.h / 2.0, w: size.w, h: size.h }
    }

    pub fn right(&self) -> f64 { self.x + self.w }
    pub fn bottom(&self) -> f64 { self.y + self.h }

    /// Touching edges do not count.
    pub fn overlaps(&self, other: &RectF) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn inflate(&self, pad: f64) -> RectF {
        RectF { x: self.x - pad, y: self.y - pad, w: self.w + 2.0 * pad, h: self.h + 2.0 * pad }
    }
}

pub const ROOT_SIZE: SizeF = SizeF { w: 320.0, h: 140.0 };
pub const NODE_SIZE: SizeF = SizeF { w: 300.0, h: 120.0 };
/// Collision boxes are never shorter than this.
pub const MIN_BOX_HEIGHT: f64 = 100.0;

pub fn card_size(is_root: bool) -> SizeF {
    if is_root { ROOT_SIZE } else { NODE_SIZE }
}

pub fn collision_size(card: SizeF) -> SizeF {
    SizeF { w: card.w, h: card.h.max(MIN_BOX_HEIGHT) }
}

/// Tunables. Every field has a default, so a partial JSON object is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutSettings {
    /// Radius of ring 0.
    pub ring_base: f64,
    /// Radius added per depth.
    pub ring_step: f64,
    /// Relaxation iterations per run.
    pub iterations: usize,
    pub iters_per_frame: usize,
    pub pull_alpha: f64,
    pub ring_spring: f64,
    /// Gap kept between collision boxes.
    pub sep_padding: f64,
    pub clamp_pad: f64,
    /// Arc length kept free between sibling clusters.
    pub ring_spacing_pad: f64,
    pub pin_clicked: bool,
    /// Spread relaxation over frames instead of finishing it immediately.
    pub animate: bool,
    pub use_parent_anchors: bool,
    pub show_min_grade: bool,
    pub show_rings: bool,
    pub ring_count: usize,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            ring_base: 50.0,
            ring_step: 350.0,
            iterations: 32,
            iters_per_frame: 2,
            pull_alpha: 0.40,
            ring_spring: 0.15,
            sep_padding: 16.0,
            clamp_pad: 24.0,
            ring_spacing_pad: 16.0,
            pin_clicked: false,
            animate: true,
            use_parent_anchors: true,
            show_min_grade: false,
            show_rings: false,
            ring_count: 4,
        }
    }
}

impl LayoutSettings {
    pub fn ring_radius(&self, ring: usize) -> f64 {
        self.ring_base + ring as f64 * self.ring_step
    }

    /// Radii for the renderer to draw, empty unless `show_rings` is set.
    pub fn ring_guides(&self) -> Vec<f64> {
        if !self.show_rings {
            return Vec::new();
        }
        (1..=self.ring_count).map(|d| self.ring_radius(d)).collect()
    }
}

/// What the layout needs to know about one present node.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: CourseId,
    /// BFS depth from the root, `None` when unreachable.
    pub depth: Option<usize>,
    pub size: SizeF,
    pub position: Point,
    /// Pinned or hover-pinned position. Such nodes never move.
    pub fixed: Option<Point>,
    /// Candidate anchors in preference order: primary parent first, then every
    /// present node that lists this one as a direct prerequisite, sorted by id.
    pub parents: Vec<CourseId>,
}

impl LayoutNode {
    pub fn ring(&self) -> usize {
        self.depth.unwrap_or(0)
    }
}

/// Collect layout inputs for every node of the snapshot, sorted by id.
pub fn layout_nodes(state: &GraphState, adjacency: &Adjacency, depths: &DepthMap) -> Vec<LayoutNode> {
    state
        .nodes
        .values()
        .map(|node| {
            let is_root = state.root.as_deref() == Some(node.id.as_str());
            let mut parents: Vec<CourseId> = node
                .primary_parent
                .iter()
                .filter(|p| state.nodes.contains_key(p.as_str()))
                .cloned()
                .collect();
            let others: Vec<CourseId> = state
                .nodes
                .keys()
                .filter(|p| adjacency.is_prereq(p, &node.id) && !parents.contains(p))
                .cloned()
                .collect();
            parents.extend(others);
            LayoutNode {
                id: node.id.clone(),
                depth: if is_root { Some(0) } else { depths.get(&node.id).copied() },
                size: card_size(is_root),
                position: node.position,
                fixed: node.fixed_position(),
                parents,
            }
        })
        .collect()
}

/// Bound on each coordinate's distance from the anchor.
///
/// Two rings past the outermost one, or more when the cards cannot fit in that square:
/// the outermost radius plus twice the side of a square holding every padded collision box.
pub fn world_bound(nodes: &[LayoutNode], settings: &LayoutSettings) -> f64 {
    let max_depth = nodes.iter().map(LayoutNode::ring).max().unwrap_or(0);
    let pad = settings.sep_padding;
    let area: f64 = nodes
        .iter()
        .map(|node| {
            let size = collision_size(node.size);
            (size.w + pad) * (size.h + pad)
        })
        .sum();
    let crowded = settings.ring_radius(max_depth) + 2.0 * area.sqrt();
    settings.ring_radius(max_depth + 2).max(crowded) + settings.clamp_pad
}

/// Compute ring targets and start a relaxation run from the current positions.
pub fn plan_layout(
    state: &GraphState,
    adjacency: &Adjacency,
    depths: &DepthMap,
    settings: &LayoutSettings,
    anchor: Point,
) -> LayoutRun {
    let nodes = layout_nodes(state, adjacency, depths);
    let root = state.root.clone().unwrap_or_default();
    let angles = assign_angles(&nodes, &root, settings);

    let bodies: Vec<Body> = nodes
        .iter()
        .map(|node| {
            let radius = settings.ring_radius(node.ring());
            let target = match (node.fixed, angles.get(&node.id)) {
                (Some(fixed), _) => fixed,
                (None, Some(&angle)) => Point::polar(anchor, radius, angle),
                (None, None) => anchor,
            };
            Body {
                id: node.id.clone(),
                center: node.fixed.unwrap_or(node.position),
                target,
                radius,
                size: collision_size(node.size),
                pinned: node.fixed.is_some(),
            }
        })
        .collect();

    log::debug!("layout planned for {} nodes", bodies.len());
    LayoutRun::new(bodies, angles, settings.clone(), anchor, world_bound(&nodes, settings))
}
