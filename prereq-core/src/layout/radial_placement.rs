// Ring angle assignment ("orbital" placement).
//
// Every non-root node sits on the ring of its depth. Per ring:
// 1. Depth <= 1 (or parent anchoring off): even spacing, angle(i) = -PI + 2PI*i/k over sorted ids
// 2. Deeper rings: siblings are clustered around their parent's angle, each cluster as wide as
//    the summed angular width of its cards
// 3. Clusters are sorted by center, pushed apart along the unwrapped circle until neighbours keep
//    a minimum gap, then wrapped back into (-PI, PI]
//
// Properties:
// - Deterministic (ids sorted before indexing, ties broken by cluster key)
// - Rings are processed inside-out so a parent's angle is known before its children are packed

use std::collections::BTreeMap;
use std::f64::consts::{PI, TAU};

use super::{LayoutNode, LayoutSettings};
use crate::catalog::CourseId;

/// Angles for every non-root node.
pub type AngleMap = BTreeMap<CourseId, f64>;

/// Wrap into `(-PI, PI]`.
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { PI } else { wrapped }
}

/// `-PI + 2PI*i/k`.
pub fn even_angle(i: usize, k: usize) -> f64 {
    -PI + TAU * i as f64 / k.max(1) as f64
}

/// A run of siblings placed side by side on one ring.
#[derive(Debug, Clone)]
struct Cluster {
    /// Parent id, or the member's own id for a singleton.
    key: CourseId,
    center: f64,
    /// Members sorted by id, with their angular widths.
    members: Vec<(CourseId, f64)>,
    start: f64,
}

impl Cluster {
    fn width(&self) -> f64 {
        self.members.iter().map(|(_, w)| w).sum()
    }

    fn end(&self) -> f64 {
        self.start + self.width()
    }
}

pub fn assign_angles(nodes: &[LayoutNode], root: &str, settings: &LayoutSettings) -> AngleMap {
    let mut rings: BTreeMap<usize, Vec<&LayoutNode>> = BTreeMap::new();
    for node in nodes.iter().filter(|n| n.id != root) {
        rings.entry(node.ring()).or_default().push(node);
    }

    let mut angles = AngleMap::new();
    for (ring, mut members) in rings {
        members.sort_by(|a, b| a.id.cmp(&b.id));

        if ring <= 1 || !settings.use_parent_anchors {
            let k = members.len();
            for (i, node) in members.iter().enumerate() {
                angles.insert(node.id.clone(), even_angle(i, k));
            }
            continue;
        }

        let placed = pack_ring(&members, &angles, settings.ring_radius(ring), settings);
        angles.extend(placed);
    }
    angles
}

/// Pack one ring of depth >= 2 into parent clusters.
fn pack_ring(
    members: &[&LayoutNode],
    placed: &AngleMap,
    radius: f64,
    settings: &LayoutSettings,
) -> Vec<(CourseId, f64)> {
    let radius = radius.max(1.0);
    let node_width = |node: &LayoutNode| (node.size.w + settings.sep_padding) / radius;

    let mut by_parent: BTreeMap<CourseId, Vec<&LayoutNode>> = BTreeMap::new();
    let mut orphans: Vec<&LayoutNode> = Vec::new();
    for &node in members {
        match node.parents.iter().find(|p| placed.contains_key(p.as_str())) {
            Some(parent) => by_parent.entry(parent.clone()).or_default().push(node),
            None => orphans.push(node),
        }
    }

    let mut clusters: Vec<Cluster> = by_parent
        .into_iter()
        .map(|(parent, children)| Cluster {
            center: placed[&parent],
            key: parent,
            members: children.iter().map(|&n| (n.id.clone(), node_width(n))).collect(),
            start: 0.0,
        })
        .collect();
    let orphan_count = orphans.len();
    clusters.extend(orphans.iter().enumerate().map(|(i, &node)| Cluster {
        key: node.id.clone(),
        center: even_angle(i, orphan_count),
        members: vec![(node.id.clone(), node_width(node))],
        start: 0.0,
    }));

    let mut gap = settings.ring_spacing_pad / radius;
    let needed: f64 = clusters.iter().map(|c| c.width() + gap).sum();
    if needed > TAU {
        let scale = TAU / needed;
        gap *= scale;
        for cluster in &mut clusters {
            for (_, w) in &mut cluster.members {
                *w *= scale;
            }
        }
    }

    separate_clusters(&mut clusters, gap);

    let mut out = Vec::new();
    for cluster in &clusters {
        let mut cursor = cluster.start;
        for (id, w) in &cluster.members {
            out.push((id.clone(), wrap_angle(cursor + w / 2.0)));
            cursor += w;
        }
    }
    out
}

/// Sort by center, push apart forwards, then fix the wrap-around seam backwards.
fn separate_clusters(clusters: &mut [Cluster], gap: f64) {
    clusters.sort_by(|a, b| a.center.total_cmp(&b.center).then_with(|| a.key.cmp(&b.key)));
    for cluster in clusters.iter_mut() {
        cluster.start = cluster.center - cluster.width() / 2.0;
    }

    for i in 1..clusters.len() {
        let min_start = clusters[i - 1].end() + gap;
        if clusters[i].start < min_start {
            clusters[i].start = min_start;
        }
    }

    // The last cluster must end a gap before the first one starts again one turn later.
    let Some(first_start) = clusters.first().map(|c| c.start) else { return };
    let mut limit = first_start + TAU - gap;
    for i in (1..clusters.len()).rev() {
        if clusters[i].end() <= limit {
            break;
        }
        clusters[i].start = limit - clusters[i].width();
        limit = clusters[i].start - gap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{NODE_SIZE, Point};
    use pretty_assertions::assert_eq;

    fn node(id: &str, depth: usize, parents: &[&str]) -> LayoutNode {
        LayoutNode {
            id: id.to_string(),
            depth: Some(depth),
            size: NODE_SIZE,
            position: Point::default(),
            fixed: None,
            parents: parents.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn circular_distance(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(TAU);
        d.min(TAU - d)
    }

    #[test]
    fn test_wrap_angle() {
        assert_eq!(wrap_angle(-PI), PI);
        assert_eq!(wrap_angle(PI), PI);
        assert!((wrap_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((wrap_angle(0.25) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_depth_one_is_evenly_spaced_by_id() {
        let nodes = vec![node("R", 0, &[]), node("C", 1, &["R"]), node("A", 1, &["R"]), node("B", 1, &["R"])];
        let angles = assign_angles(&nodes, "R", &LayoutSettings::default());

        assert!(!angles.contains_key("R"));
        assert_eq!(angles["A"], -PI);
        assert!((angles["B"] - (-PI + TAU / 3.0)).abs() < 1e-12);
        assert!((angles["C"] - (-PI + 2.0 * TAU / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_children_cluster_around_parent() {
        let nodes = vec![
            node("R", 0, &[]),
            node("P", 1, &["R"]),
            node("Q", 1, &["R"]),
            node("P1", 2, &["P"]),
            node("P2", 2, &["P"]),
            node("Q1", 2, &["Q"]),
        ];
        let settings = LayoutSettings::default();
        let angles = assign_angles(&nodes, "R", &settings);

        // P sits at -PI, so its cluster straddles the wrap-around seam.
        let width = (NODE_SIZE.w + settings.sep_padding) / settings.ring_radius(2);
        assert!((circular_distance(angles["P1"], angles["P"]) - width / 2.0).abs() < 1e-9, "{:?}", angles);
        assert!((circular_distance(angles["P2"], angles["P"]) - width / 2.0).abs() < 1e-9);
        assert!((circular_distance(angles["P1"], angles["P2"]) - width).abs() < 1e-9);
        assert!(circular_distance(angles["Q1"], angles["Q"]) < 1e-9);
    }

    #[test]
    fn test_overlapping_clusters_are_pushed_apart() {
        let mut nodes = vec![node("R", 0, &[]), node("A", 1, &["R"]), node("B", 1, &["R"])];
        for i in 0..4 {
            nodes.push(node(&format!("A{}", i), 2, &["A"]));
            nodes.push(node(&format!("B{}", i), 2, &["B"]));
        }
        let settings = LayoutSettings { ring_step: 100.0, ..LayoutSettings::default() };
        let angles = assign_angles(&nodes, "R", &settings);

        let radius = settings.ring_radius(2);
        let width = (NODE_SIZE.w + settings.sep_padding) / radius;
        let ring: Vec<f64> = angles
            .iter()
            .filter(|(id, _)| id.len() == 2)
            .map(|(_, a)| *a)
            .collect();
        assert_eq!(ring.len(), 8);
        for (i, a) in ring.iter().enumerate() {
            for b in &ring[i + 1..] {
                // Scaled widths still never overlap.
                assert!(circular_distance(*a, *b) > width * (TAU / (8.0 * width + 2.0 * settings.ring_spacing_pad / radius)) - 1e-9);
                assert!(*a > -PI && *a <= PI);
            }
        }
    }

    #[test]
    fn test_orphans_and_fallback_parents() {
        let nodes = vec![
            node("R", 0, &[]),
            node("A", 1, &["R"]),
            // Primary parent gone, first present parent used.
            node("X", 2, &["GONE", "A"]),
            node("Y", 2, &[]),
        ];
        let angles = assign_angles(&nodes, "R", &LayoutSettings::default());
        assert_eq!(angles.len(), 3);
        assert!(angles.contains_key("Y"));
        assert!(circular_distance(angles["X"], angles["A"]) < 0.5);
    }

    #[test]
    fn test_assignment_is_deterministic() {
        let nodes = vec![
            node("R", 0, &[]),
            node("B", 1, &["R"]),
            node("A", 1, &["R"]),
            node("B1", 2, &["B"]),
            node("A1", 2, &["A", "B"]),
            node("U", 7, &[]),
        ];
        let settings = LayoutSettings::default();
        let first = assign_angles(&nodes, "R", &settings);
        let mut reversed = nodes.clone();
        reversed.reverse();
        assert_eq!(first, assign_angles(&reversed, "R", &settings));
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn test_without_parent_anchors_every_ring_is_even() {
        let nodes = vec![node("R", 0, &[]), node("A", 1, &["R"]), node("A1", 2, &["A"]), node("A2", 2, &["A"])];
        let settings = LayoutSettings { use_parent_anchors: false, ..LayoutSettings::default() };
        let angles = assign_angles(&nodes, "R", &settings);
        assert_eq!(angles["A1"], -PI);
        assert!((angles["A2"] - 0.0).abs() < 1e-12);
    }
}
