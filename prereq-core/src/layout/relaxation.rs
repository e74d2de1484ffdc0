// Iterative relaxation toward ring targets.
//
// One iteration:
// 1. Pull every free body toward its polar target (damped by pull_alpha)
// 2. Spring its distance from the anchor back toward its ring radius (ring_spring)
// 3. Separate overlapping collision boxes along the axis of least overlap
// 4. Clamp to the world bound
//
// Pinned bodies skip 1, 2 and 4 but stay in 3 as immovable obstacles.

use super::spatial_grid::SpatialGrid;
use super::{LayoutSettings, Point, RectF, SizeF};
use crate::catalog::CourseId;

/// Separation sub-passes per iteration.
pub const SEPARATION_PASSES: usize = 24;
/// Upper bound on sub-passes for the final settle.
pub const SETTLE_PASSES: usize = SEPARATION_PASSES * 20;
/// Separate-then-clamp rounds in the final settle.
const SETTLE_ROUNDS: usize = 4;
/// Extra push so separated boxes end up strictly apart.
const EPS: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: CourseId,
    pub center: Point,
    pub target: Point,
    /// Ring radius the body belongs on.
    pub radius: f64,
    /// Collision box.
    pub size: SizeF,
    pub pinned: bool,
}

impl Body {
    /// Collision box grown by half the padding on every side.
    fn padded_rect(&self, padding: f64) -> RectF {
        RectF::around(self.center, self.size).inflate(padding / 2.0)
    }
}

#[derive(Debug, Clone)]
pub struct Relaxation<'a> {
    pub anchor: Point,
    pub settings: &'a LayoutSettings,
    /// Max distance of any coordinate from the anchor.
    pub bound: f64,
}

impl Relaxation<'_> {
    pub fn step(&self, bodies: &mut [Body]) {
        let alpha = self.settings.pull_alpha;
        let spring = self.settings.ring_spring;

        for body in bodies.iter_mut().filter(|b| !b.pinned) {
            body.center.x += (body.target.x - body.center.x) * alpha;
            body.center.y += (body.target.y - body.center.y) * alpha;

            let d = body.center.distance(&self.anchor);
            if d > EPS {
                let scale = (d + (body.radius - d) * spring) / d;
                body.center.x = self.anchor.x + (body.center.x - self.anchor.x) * scale;
                body.center.y = self.anchor.y + (body.center.y - self.anchor.y) * scale;
            }
        }

        separate(bodies, self.settings.sep_padding, SEPARATION_PASSES);
        self.clamp(bodies);
    }

    /// Separation and clamping only, until clean or out of rounds.
    ///
    /// Returns whether no collision boxes overlap after the last clamp.
    pub fn settle(&self, bodies: &mut [Body]) -> bool {
        let mut clean = false;
        for _ in 0..SETTLE_ROUNDS {
            let separated = separate(bodies, self.settings.sep_padding, SETTLE_PASSES);
            self.clamp(bodies);
            clean = overlapping_pairs(bodies).is_empty();
            if separated && clean {
                break;
            }
        }
        clean
    }

    fn clamp(&self, bodies: &mut [Body]) {
        let (ax, ay, b) = (self.anchor.x, self.anchor.y, self.bound);
        for body in bodies.iter_mut().filter(|b| !b.pinned) {
            body.center.x = body.center.x.clamp(ax - b, ax + b);
            body.center.y = body.center.y.clamp(ay - b, ay + b);
        }
    }
}

/// Push apart boxes closer than `padding`, up to `max_passes` sweeps.
///
/// Returns `true` once a sweep finds nothing to resolve. Overlaps between two pinned
/// bodies cannot be resolved and are ignored.
pub fn separate(bodies: &mut [Body], padding: f64, max_passes: usize) -> bool {
    let cell = bodies
        .iter()
        .map(|b| b.size.w.max(b.size.h) + padding)
        .fold(1.0, f64::max);

    for _ in 0..max_passes {
        let mut grid = SpatialGrid::new(cell);
        for (i, body) in bodies.iter().enumerate() {
            grid.insert(i, &body.padded_rect(padding));
        }

        let mut moved = false;
        for i in 0..bodies.len() {
            let query = bodies[i].padded_rect(padding);
            for j in grid.query(&query).into_iter().filter(|&j| j > i) {
                moved |= resolve_pair(bodies, i, j, padding);
            }
        }
        if !moved {
            return true;
        }
    }
    false
}

/// Separate one pair along the axis of least overlap. Returns whether anything moved.
fn resolve_pair(bodies: &mut [Body], i: usize, j: usize, padding: f64) -> bool {
    let (a, b) = (&bodies[i], &bodies[j]);
    if a.pinned && b.pinned {
        return false;
    }

    let dx = b.center.x - a.center.x;
    let dy = b.center.y - a.center.y;
    let overlap_x = (a.size.w + b.size.w) / 2.0 + padding - dx.abs();
    let overlap_y = (a.size.h + b.size.h) / 2.0 + padding - dy.abs();
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return false;
    }

    let (share_a, share_b) = match (a.pinned, b.pinned) {
        (true, _) => (0.0, 1.0),
        (_, true) => (1.0, 0.0),
        _ => (0.5, 0.5),
    };
    let dir = |d: f64| if d < 0.0 { -1.0 } else { 1.0 };

    if overlap_x <= overlap_y {
        let push = (overlap_x + EPS) * dir(dx);
        bodies[i].center.x -= push * share_a;
        bodies[j].center.x += push * share_b;
    } else {
        let push = (overlap_y + EPS) * dir(dy);
        bodies[i].center.y -= push * share_a;
        bodies[j].center.y += push * share_b;
    }
    true
}

/// Pairs whose raw collision boxes overlap, excluding pinned-with-pinned.
pub fn overlapping_pairs(bodies: &[Body]) -> Vec<(CourseId, CourseId)> {
    let mut pairs = Vec::new();
    for (i, a) in bodies.iter().enumerate() {
        for b in &bodies[i + 1..] {
            if a.pinned && b.pinned {
                continue;
            }
            if RectF::around(a.center, a.size).overlaps(&RectF::around(b.center, b.size)) {
                pairs.push((a.id.clone(), b.id.clone()));
            }
        }
    }
    pairs
}
