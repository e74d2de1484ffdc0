//! Immutable snapshot of the revealed graph and the transitions between snapshots.
//!
//! Every operation takes `&self` and returns a new [`GraphState`]; the engine swaps the whole
//! snapshot in one step, so the layout and the renderer never see a half-applied change.
//! Operations on missing nodes return an unchanged copy.
//!
//! Edges point from a course to one of its prerequisites (`source` needs `target`).

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::catalog::CourseId;
use crate::layout::Point;
use crate::layout::adjacency::Adjacency;

/// How long an opened node stays highlighted.
pub const HIGHLIGHT_MS: f64 = 600.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: CourseId,
    /// Opened by the user, as opposed to a hover preview.
    pub persisted: bool,
    /// First parent this node was revealed through. Anchors its layout cluster.
    pub primary_parent: Option<CourseId>,
    pub position: Point,
    pub pin: Option<Point>,
    /// Held in place while one of its children is being previewed.
    pub hover_pin: Option<Point>,
    pub highlight: bool,
    /// Clock time at which `highlight` clears; `None` keeps it until hover-out.
    pub highlight_until: Option<f64>,
}

impl GraphNode {
    fn new(id: &str, persisted: bool, parent: Option<&str>, position: Point) -> Self {
        Self {
            id: id.to_string(),
            persisted,
            primary_parent: parent.map(str::to_string),
            position,
            pin: None,
            hover_pin: None,
            highlight: false,
            highlight_until: None,
        }
    }

    /// Where layout must keep this node, if anywhere.
    pub fn fixed_position(&self) -> Option<Point> {
        self.pin.or(self.hover_pin)
    }

    pub fn is_pinned(&self) -> bool {
        self.fixed_position().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub source: CourseId,
    pub target: CourseId,
    pub ephemeral: bool,
}

pub type EdgeKey = (CourseId, CourseId);

/// Inputs every transition may consult.
#[derive(Debug, Clone, Copy)]
pub struct OpContext<'a> {
    pub adjacency: &'a Adjacency,
    /// Engine clock, milliseconds.
    pub now: f64,
    pub pin_clicked: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphState {
    pub root: Option<CourseId>,
    pub nodes: BTreeMap<CourseId, GraphNode>,
    /// At most one edge per ordered pair.
    pub edges: BTreeMap<EdgeKey, GraphEdge>,
    /// Closed course -> direct children removed solely because of that close.
    pub reopen_memory: BTreeMap<CourseId, BTreeSet<CourseId>>,
}

impl GraphState {
    /// A single pinned, persisted root at `anchor`.
    pub fn rooted(root: &str, anchor: Point) -> GraphState {
        let mut node = GraphNode::new(root, true, None, anchor);
        node.pin = Some(anchor);
        GraphState {
            root: Some(root.to_string()),
            nodes: BTreeMap::from([(root.to_string(), node)]),
            ..GraphState::default()
        }
    }

    pub fn is_root(&self, id: &str) -> bool {
        self.root.as_deref() == Some(id)
    }

    pub fn is_persisted(&self, id: &str) -> bool {
        self.nodes.get(id).is_some_and(|n| n.persisted)
    }

    pub fn edge(&self, source: &str, target: &str) -> Option<&GraphEdge> {
        self.edges.get(&(source.to_string(), target.to_string()))
    }

    fn position_of(&self, id: &str) -> Point {
        self.nodes.get(id).map(|n| n.position).unwrap_or_default()
    }

    fn set_edge(&mut self, source: &str, target: &str, ephemeral: bool) {
        self.edges.insert(
            (source.to_string(), target.to_string()),
            GraphEdge { source: source.to_string(), target: target.to_string(), ephemeral },
        );
    }

    /// Persist `course` under `parent`, or upgrade its preview node, then restore any subtree
    /// remembered from an earlier close.
    pub fn opened(&self, parent: &str, course: &str, ctx: &OpContext) -> GraphState {
        let mut next = self.clone();
        if !self.nodes.contains_key(parent) {
            log::debug!("open {} ignored, parent {} is not present", course, parent);
            return next;
        }

        let spawn = self.position_of(parent);
        let node = next
            .nodes
            .entry(course.to_string())
            .or_insert_with(|| GraphNode::new(course, false, Some(parent), spawn));
        if !node.persisted {
            node.persisted = true;
            node.primary_parent = Some(parent.to_string());
            if ctx.pin_clicked {
                node.pin = Some(node.position);
            }
        }
        node.highlight = true;
        node.highlight_until = Some(ctx.now + HIGHLIGHT_MS);

        if parent != course {
            next.set_edge(parent, course, false);
        }
        let restored = next.reopen_subtree(course);
        log::debug!("opened {} under {}, restored {} remembered nodes", course, parent, restored);
        next
    }

    /// Breadth-first restore of remembered children, consuming each memory entry it visits.
    fn reopen_subtree(&mut self, course: &str) -> usize {
        let mut restored = 0;
        let mut queue = VecDeque::from([course.to_string()]);
        while let Some(id) = queue.pop_front() {
            let Some(children) = self.reopen_memory.remove(&id) else { continue };
            let spawn = self.position_of(&id);
            for child in children {
                let node = self
                    .nodes
                    .entry(child.clone())
                    .or_insert_with(|| GraphNode::new(&child, true, Some(id.as_str()), spawn));
                if !node.persisted {
                    node.persisted = true;
                    node.primary_parent = Some(id.clone());
                }
                self.set_edge(&id, &child, false);
                restored += 1;
                queue.push_back(child);
            }
        }
        restored
    }

    /// Remove `course` and every descendant left without a persisted parent.
    pub fn closed(&self, course: &str, ctx: &OpContext) -> GraphState {
        let mut next = self.clone();
        if self.is_root(course) || !self.is_persisted(course) {
            log::debug!("close {} ignored, not an open non-root node", course);
            return next;
        }

        let mut removal: BTreeSet<CourseId> = BTreeSet::from([course.to_string()]);
        let mut direct: BTreeSet<CourseId> = BTreeSet::new();
        let mut queue = VecDeque::from([course.to_string()]);

        while let Some(id) = queue.pop_front() {
            for child in ctx.adjacency.get_prereqs(&id) {
                if removal.contains(child) || !self.is_persisted(child) || self.is_root(child) {
                    continue;
                }
                let live_parents = self
                    .nodes
                    .values()
                    .filter(|p| p.persisted && !removal.contains(&p.id))
                    .filter(|p| ctx.adjacency.is_prereq(&p.id, child))
                    .count();
                if live_parents == 0 {
                    removal.insert(child.clone());
                    queue.push_back(child.clone());
                    if id == course {
                        direct.insert(child.clone());
                    }
                }
            }
        }

        // Previews hanging off a removed node go with it.
        let orphaned_previews: Vec<CourseId> = self
            .nodes
            .values()
            .filter(|n| !n.persisted)
            .filter(|n| n.primary_parent.as_ref().is_some_and(|p| removal.contains(p)))
            .map(|n| n.id.clone())
            .collect();
        removal.extend(orphaned_previews);

        next.nodes.retain(|id, _| !removal.contains(id));
        next.edges.retain(|(s, t), _| !removal.contains(s) && !removal.contains(t));
        if !direct.is_empty() {
            next.reopen_memory.insert(course.to_string(), direct);
        }
        log::debug!("closed {}, removed {} nodes", course, removal.len());
        next
    }

    /// Preview `course` under `parent` without persisting it.
    pub fn hovered_in(&self, parent: &str, course: &str) -> GraphState {
        let mut next = self.clone();
        let Some(spawn) = self.nodes.get(parent).map(|n| n.position) else { return next };
        if let Some(parent_node) = next.nodes.get_mut(parent) {
            parent_node.hover_pin = Some(spawn);
        }

        match next.nodes.get_mut(course) {
            Some(node) => {
                node.highlight = true;
                node.highlight_until = None;
            }
            None => {
                let mut node = GraphNode::new(course, false, Some(parent), spawn);
                node.highlight = true;
                next.nodes.insert(course.to_string(), node);
                next.set_edge(parent, course, true);
            }
        }
        next
    }

    /// End a preview. A node persisted during the hover is kept.
    pub fn hovered_out(&self, parent: &str, course: &str) -> GraphState {
        let mut next = self.clone();
        if let Some(parent_node) = next.nodes.get_mut(parent) {
            parent_node.hover_pin = None;
        }

        let key = (parent.to_string(), course.to_string());
        if next.edges.get(&key).is_some_and(|e| e.ephemeral) {
            next.edges.remove(&key);
        }

        match next.nodes.get(course).map(|n| n.persisted) {
            Some(false) => {
                next.nodes.remove(course);
                next.edges.retain(|(s, t), _| s != course && t != course);
            }
            Some(true) => {
                if let Some(node) = next.nodes.get_mut(course) {
                    node.highlight = false;
                    node.highlight_until = None;
                }
            }
            None => {}
        }
        next
    }

    /// Ensure a persistent edge between every pair of persisted, prerequisite-related nodes and
    /// drop edges whose endpoints are gone. Idempotent.
    pub fn reconciled(&self, adjacency: &Adjacency) -> GraphState {
        let mut next = self.clone();
        next.edges
            .retain(|(s, t), _| self.nodes.contains_key(s) && self.nodes.contains_key(t));

        for parent in self.nodes.values().filter(|n| n.persisted) {
            for child in adjacency.get_prereqs(&parent.id) {
                if child != &parent.id && self.is_persisted(child) {
                    next.set_edge(&parent.id, child, false);
                }
            }
        }
        next
    }

    /// Clear open highlights whose time is up.
    pub fn expire_highlights(&self, now: f64) -> GraphState {
        let mut next = self.clone();
        for node in next.nodes.values_mut() {
            if node.highlight_until.is_some_and(|until| until <= now) {
                node.highlight = false;
                node.highlight_until = None;
            }
        }
        next
    }

    /// Copy layout positions onto free nodes.
    pub fn with_positions(&self, positions: &BTreeMap<CourseId, Point>) -> GraphState {
        let mut next = self.clone();
        for (id, node) in next.nodes.iter_mut() {
            if node.is_pinned() {
                continue;
            }
            if let Some(p) = positions.get(id) {
                node.position = *p;
            }
        }
        next
    }

    /// Move the root pin to a new anchor.
    pub fn with_anchor(&self, anchor: Point) -> GraphState {
        let mut next = self.clone();
        if let Some(root) = self.root.as_deref().and_then(|r| next.nodes.get_mut(r)) {
            root.position = anchor;
            root.pin = Some(anchor);
        }
        next
    }
}
