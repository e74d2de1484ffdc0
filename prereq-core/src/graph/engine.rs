//! `PrereqGraph`: one independent graph view with its own catalog, root, snapshot and layout.
//!
//! Lifecycle: [`PrereqGraph::initialize`] with a catalog, [`PrereqGraph::set_root`], then user
//! operations. Every operation runs to completion synchronously; only layout relaxation is
//! spread over [`PrereqGraph::frame`] calls.

use std::rc::Rc;

use crate::catalog::{Catalog, CourseId};
use crate::layout::adjacency::{Adjacency, DepthMap};
use crate::layout::radial_placement::AngleMap;
use crate::layout::task::{FrameOutcome, LayoutRun};
use crate::layout::{LayoutSettings, Point, plan_layout};

use super::state::{EdgeKey, GraphState, OpContext};

/// What a layout run depends on. Highlights and free positions are not part of it.
#[derive(Debug, Clone, PartialEq)]
struct LayoutKey {
    nodes: Vec<(CourseId, Option<CourseId>, Option<Point>)>,
    edges: Vec<EdgeKey>,
}

impl LayoutKey {
    fn of(state: &GraphState) -> Self {
        Self {
            nodes: state
                .nodes
                .values()
                .map(|n| (n.id.clone(), n.primary_parent.clone(), n.fixed_position()))
                .collect(),
            edges: state.edges.keys().cloned().collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct PrereqGraph {
    catalog: Catalog,
    adjacency: Adjacency,
    depths: DepthMap,
    settings: LayoutSettings,
    anchor: Point,
    /// Milliseconds, supplied by the host.
    now: f64,
    state: Rc<GraphState>,
    layout: Option<LayoutRun>,
    layout_key: Option<LayoutKey>,
}

impl PrereqGraph {
    pub fn new(settings: LayoutSettings) -> Self {
        Self { settings, ..Self::default() }
    }

    pub fn with_catalog(catalog: Catalog, settings: LayoutSettings) -> Self {
        let mut graph = Self::new(settings);
        graph.initialize(catalog);
        graph
    }

    /// Replace the catalog. Clears the root and all graph state.
    pub fn initialize(&mut self, catalog: Catalog) {
        self.adjacency = Adjacency::from_catalog(&catalog);
        self.catalog = catalog;
        log::info!(
            "graph initialised with {} courses, {} prerequisite links",
            self.catalog.len(),
            self.adjacency.edge_count()
        );
        self.depths.clear();
        self.replace_state(GraphState::default());
    }

    /// Reset to a lone root and rebuild depths.
    pub fn set_root(&mut self, root: &str) {
        self.depths = self.adjacency.depths_from(root);
        log::info!("root set to {}, {} courses reachable", root, self.depths.len());
        self.replace_state(GraphState::rooted(root, self.anchor));
    }

    pub fn open(&mut self, parent: &str, course: &str) {
        let next = self.state.opened(parent, course, &self.ctx());
        self.apply(next);
    }

    pub fn close(&mut self, course: &str) {
        let next = self.state.closed(course, &self.ctx());
        self.apply(next);
    }

    /// Close `course` if it is open, otherwise open it under `parent`.
    pub fn click(&mut self, parent: &str, course: &str) {
        if self.state.is_persisted(course) && !self.state.is_root(course) {
            self.close(course);
        } else {
            self.open(parent, course);
        }
    }

    pub fn hover_in(&mut self, parent: &str, course: &str) {
        let next = self.state.hovered_in(parent, course);
        self.apply(next);
    }

    pub fn hover_out(&mut self, parent: &str, course: &str) {
        let next = self.state.hovered_out(parent, course);
        self.apply(next);
    }

    /// Move the clock forward, expiring open highlights.
    pub fn advance_clock(&mut self, now_ms: f64) {
        self.now = self.now.max(now_ms);
        let next = self.state.expire_highlights(self.now);
        self.apply(next);
    }

    /// Move the viewport centre. The root is re-pinned there.
    pub fn set_anchor(&mut self, anchor: Point) {
        self.anchor = anchor;
        let next = self.state.with_anchor(anchor);
        self.apply(next);
    }

    /// Replace settings and restart layout.
    pub fn set_settings(&mut self, settings: LayoutSettings) {
        self.settings = settings;
        self.restart_layout();
    }

    /// Advance the running layout by one frame and publish its positions.
    pub fn frame(&mut self) -> FrameOutcome {
        let Some(run) = self.layout.as_mut() else { return FrameOutcome::Finished };
        let was_finished = run.is_finished();
        let outcome = run.frame();
        if outcome != FrameOutcome::Cancelled && !was_finished {
            let positions = run.positions();
            self.state = Rc::new(self.state.with_positions(&positions));
        }
        outcome
    }

    pub fn run_layout_to_completion(&mut self) -> FrameOutcome {
        loop {
            match self.frame() {
                FrameOutcome::Running => continue,
                outcome => return outcome,
            }
        }
    }

    pub fn is_layout_running(&self) -> bool {
        self.layout.as_ref().is_some_and(|run| !run.is_finished() && !run.token().is_cancelled())
    }

    /// Current snapshot. Cheap to clone and never mutated in place.
    pub fn state(&self) -> Rc<GraphState> {
        Rc::clone(&self.state)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    pub fn depths(&self) -> &DepthMap {
        &self.depths
    }

    /// Depth from the root, 0 for unreachable ids.
    pub fn depth_of(&self, id: &str) -> usize {
        self.depths.get(id).copied().unwrap_or(0)
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    /// Ring angles of the latest layout run.
    pub fn angles(&self) -> Option<&AngleMap> {
        self.layout.as_ref().map(LayoutRun::angles)
    }

    pub fn layout_run(&self) -> Option<&LayoutRun> {
        self.layout.as_ref()
    }

    fn ctx(&self) -> OpContext<'_> {
        OpContext { adjacency: &self.adjacency, now: self.now, pin_clicked: self.settings.pin_clicked }
    }

    /// Reconcile, publish, and restart layout if anything layout depends on changed.
    fn apply(&mut self, next: GraphState) {
        let next = next.reconciled(&self.adjacency);
        if next == *self.state {
            return;
        }
        let key = LayoutKey::of(&next);
        self.state = Rc::new(next);
        if self.layout_key.as_ref() != Some(&key) {
            self.restart_layout();
        }
    }

    fn replace_state(&mut self, state: GraphState) {
        self.state = Rc::new(state);
        self.restart_layout();
    }

    fn restart_layout(&mut self) {
        if let Some(previous) = self.layout.take() {
            if !previous.is_finished() {
                log::debug!("cancelling layout after {} iterations", previous.iterations_done());
            }
            previous.cancel();
        }

        self.layout_key = Some(LayoutKey::of(&self.state));
        if self.state.nodes.is_empty() {
            return;
        }

        let mut run = plan_layout(&self.state, &self.adjacency, &self.depths, &self.settings, self.anchor);
        if !self.settings.animate {
            run.run_to_completion();
            self.state = Rc::new(self.state.with_positions(&run.positions()));
        }
        self.layout = Some(run);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::fixture;
    use crate::layout::{RectF, collision_size, layout_nodes};
    use pretty_assertions::assert_eq;

    const ECON_201_PREREQS: [&str; 8] = [
        "ECON 103", "ECON 105", "ECON 113", "ECON 115", "MATH 150", "MATH 151", "MATH 154", "MATH 157",
    ];

    fn still() -> LayoutSettings {
        LayoutSettings { animate: false, ..LayoutSettings::default() }
    }

    fn econ_201(settings: LayoutSettings) -> PrereqGraph {
        let mut graph = PrereqGraph::with_catalog(fixture(), settings);
        graph.set_root("ECON 201");
        graph
    }

    fn overlaps(graph: &PrereqGraph) -> Vec<(String, String)> {
        let state = graph.state();
        let nodes = layout_nodes(&state, graph.adjacency(), graph.depths());
        let mut found = Vec::new();
        for (i, a) in nodes.iter().enumerate() {
            for b in &nodes[i + 1..] {
                if a.fixed.is_some() && b.fixed.is_some() {
                    continue;
                }
                let ra = RectF::around(a.position, collision_size(a.size));
                let rb = RectF::around(b.position, collision_size(b.size));
                if ra.overlaps(&rb) {
                    found.push((a.id.clone(), b.id.clone()));
                }
            }
        }
        found
    }

    #[test]
    fn test_set_root_resets_everything() {
        let mut graph = econ_201(still());
        graph.click("ECON 201", "ECON 103");
        graph.set_root("ECON 305");

        let state = graph.state();
        assert_eq!(state.nodes.keys().collect::<Vec<_>>(), vec!["ECON 305"]);
        assert!(state.edges.is_empty() && state.reopen_memory.is_empty());
        assert_eq!(graph.depth_of("ECON 201"), 1);
        assert_eq!(graph.depth_of("NOT A COURSE"), 0);
    }

    #[test]
    fn test_click_toggles() {
        let mut graph = econ_201(still());
        graph.click("ECON 201", "ECON 103");
        assert!(graph.state().is_persisted("ECON 103"));
        assert!(graph.state().edges.keys().all(|(s, _)| s != "ECON 103"));

        graph.click("ECON 201", "ECON 103");
        assert!(!graph.state().nodes.contains_key("ECON 103"));

        // Clicking the root never closes it.
        graph.click("ECON 201", "ECON 201");
        assert!(graph.state().nodes.contains_key("ECON 201"));
    }

    #[test]
    fn test_snapshots_are_replaced_not_mutated() {
        let mut graph = econ_201(still());
        let before = graph.state();
        graph.open("ECON 201", "MATH 150");
        assert_eq!(before.nodes.len(), 1);
        assert_eq!(graph.state().nodes.len(), 2);
    }

    #[test]
    fn test_highlight_expires_with_clock() {
        let mut graph = econ_201(still());
        graph.advance_clock(1_000.0);
        graph.open("ECON 201", "ECON 105");

        graph.advance_clock(1_599.0);
        assert!(graph.state().nodes["ECON 105"].highlight);
        graph.advance_clock(1_600.0);
        assert!(!graph.state().nodes["ECON 105"].highlight);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let build = || {
            let mut graph = econ_201(still());
            for id in ECON_201_PREREQS.iter().rev() {
                graph.open("ECON 201", id);
            }
            graph.open("MATH 150", "MATH 100");
            graph.open("MATH 154", "MATH 110");
            graph
        };
        let first = build();
        let second = build();

        let angles = first.angles().cloned().unwrap_or_default();
        assert_eq!(angles.len(), 10);
        assert_eq!(Some(&angles), second.angles());
        assert_eq!(angles["ECON 103"], -std::f64::consts::PI);
        assert_eq!(first.state().nodes, second.state().nodes);
    }

    #[test]
    fn test_converged_layout_has_no_overlaps() {
        let mut graph = econ_201(still());
        for id in ECON_201_PREREQS {
            graph.open("ECON 201", id);
        }
        graph.open("MATH 150", "MATH 100");
        graph.open("MATH 151", "MATH 100");
        graph.open("MATH 154", "MATH 110");

        assert!(!graph.is_layout_running());
        assert_eq!(overlaps(&graph), Vec::<(String, String)>::new());

        let state = graph.state();
        assert_eq!(state.nodes["ECON 201"].position, graph.anchor());
    }

    #[test]
    fn test_wide_ring_converges_without_overlaps() {
        use crate::catalog::{CourseRecord, Logic, RequirementNode};

        let siblings: Vec<String> = (1..=60).map(|n| format!("C {}", n)).collect();
        let choices = siblings.iter().map(|id| RequirementNode::course(id)).collect();
        let mut records = vec![CourseRecord::new("R", "1", "Root", Some(RequirementNode::group(Logic::OneOf, choices)))];
        records.extend((1..=60).map(|n| CourseRecord::new("C", &n.to_string(), "Choice", None)));

        let mut graph = PrereqGraph::with_catalog(Catalog::from_records(records), still());
        graph.set_root("R 1");
        for id in &siblings {
            graph.open("R 1", id);
        }

        assert_eq!(graph.state().nodes.len(), 61);
        assert!(!graph.is_layout_running());
        assert_eq!(overlaps(&graph), Vec::<(String, String)>::new());
    }

    #[test]
    fn test_animated_layout_runs_per_frame_and_restarts() {
        let mut graph = econ_201(LayoutSettings::default());
        graph.open("ECON 201", "ECON 103");
        assert!(graph.is_layout_running());

        let first = graph.layout_run().map(LayoutRun::token);
        assert_eq!(graph.frame(), FrameOutcome::Running);

        graph.open("ECON 201", "ECON 105");
        assert!(first.is_some_and(|t| t.is_cancelled()));
        assert!(graph.is_layout_running());

        assert_eq!(graph.run_layout_to_completion(), FrameOutcome::Finished);
        assert!(!graph.is_layout_running());
        assert_eq!(overlaps(&graph), Vec::<(String, String)>::new());
    }

    #[test]
    fn test_highlight_changes_do_not_restart_layout() {
        let mut graph = econ_201(LayoutSettings::default());
        graph.open("ECON 201", "ECON 103");
        graph.frame();
        let token = graph.layout_run().map(LayoutRun::token);
        graph.advance_clock(10_000.0);
        assert!(token.is_some_and(|t| !t.is_cancelled()));
    }

    #[test]
    fn test_hovered_parent_stays_put() {
        let mut graph = econ_201(still());
        graph.open("ECON 201", "MATH 150");
        let parked = graph.state().nodes["MATH 150"].position;

        graph.hover_in("MATH 150", "MATH 100");
        let state = graph.state();
        assert_eq!(state.nodes["MATH 150"].position, parked);
        assert!(!state.nodes["MATH 100"].persisted);
        assert_eq!(state.edge("MATH 150", "MATH 100").map(|e| e.ephemeral), Some(true));

        graph.hover_out("MATH 150", "MATH 100");
        assert!(!graph.state().nodes.contains_key("MATH 100"));
        assert!(graph.state().nodes["MATH 150"].hover_pin.is_none());
    }

    #[test]
    fn test_anchor_moves_root() {
        let mut graph = econ_201(still());
        graph.set_anchor(Point::new(400.0, 300.0));
        assert_eq!(graph.state().nodes["ECON 201"].position, Point::new(400.0, 300.0));

        graph.open("ECON 201", "ECON 103");
        let leaf = graph.state().nodes["ECON 103"].position;
        // Only leaf on ring 1 sits at angle -PI from the anchor.
        assert!((leaf.y - 300.0).abs() < 1.0);
        assert!(leaf.x < 400.0);
    }
}
