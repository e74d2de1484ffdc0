// Alternative-group extraction.
//
// Flattens a requirement tree into rows of direct prerequisite courses:
// - rows are implicitly ALL_OF (every row must be satisfied)
// - items within a row are alternatives (any one satisfies the row)
//
// ONE_OF groups whose children are ALL_OF combinations collapse into a single flat row.
// This loses "A or (B and C)" but it is what adjacency and layout are built on.

use std::collections::BTreeSet;

use serde::Serialize;

use super::Catalog;
use super::types::{CourseId, CourseRef, Logic, RequirementNode};

/// One candidate course inside a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseReq {
    pub id: CourseId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency_allowed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub or_equivalent: Option<bool>,
}

impl From<&CourseRef> for CourseReq {
    fn from(course: &CourseRef) -> Self {
        Self {
            id: course.id.clone(),
            min_grade: course.min_grade.clone(),
            concurrency_allowed: course.concurrency_allowed,
            or_equivalent: course.or_equivalent,
        }
    }
}

impl CourseReq {
    /// Fill metadata this item lacks from a duplicate of the same course.
    fn absorb(&mut self, other: CourseReq) {
        if self.min_grade.is_none() {
            self.min_grade = other.min_grade;
        }
        if self.concurrency_allowed.is_none() {
            self.concurrency_allowed = other.concurrency_allowed;
        }
        if self.or_equivalent.is_none() {
            self.or_equivalent = other.or_equivalent;
        }
    }
}

/// Rows of alternatives, ALL_OF across rows.
pub type AlternativeGroups = Vec<Vec<CourseReq>>;

/// Rows for a course in the catalog. Unknown courses and `null` trees yield no rows.
pub fn extract_alternative_groups(catalog: &Catalog, course_id: &str) -> AlternativeGroups {
    groups_for_tree(catalog.requirements(course_id))
}

pub fn groups_for_tree(tree: Option<&RequirementNode>) -> AlternativeGroups {
    match tree {
        Some(node) => walk(node).into_iter().map(dedupe_row).collect(),
        None => Vec::new(),
    }
}

/// Union of every id across every row.
pub fn list_direct_prerequisite_ids(catalog: &Catalog, course_id: &str) -> BTreeSet<CourseId> {
    extract_alternative_groups(catalog, course_id)
        .into_iter()
        .flatten()
        .map(|req| req.id)
        .collect()
}

fn walk(node: &RequirementNode) -> AlternativeGroups {
    match node {
        RequirementNode::Course(course) => vec![vec![CourseReq::from(course)]],
        RequirementNode::Group { logic: Logic::OneOf, children } => {
            let items: Vec<CourseReq> = children.iter().flat_map(walk).flatten().collect();
            if items.is_empty() {
                Vec::new()
            } else {
                vec![union_row(items)]
            }
        }
        // TWO_OF only matters for display; for edges it behaves like ALL_OF.
        RequirementNode::Group { logic: Logic::AllOf | Logic::TwoOf, children } => {
            children.iter().flat_map(walk).collect()
        }
        RequirementNode::CreditCount(_)
        | RequirementNode::CourseCount(_)
        | RequirementNode::Program { .. }
        | RequirementNode::Gpa { .. }
        | RequirementNode::Note { .. }
        | RequirementNode::Other { .. }
        | RequirementNode::Permission { .. }
        | RequirementNode::Unknown { .. } => Vec::new(),
    }
}

/// First-seen wins, missing metadata is filled from later duplicates. Sorted by id.
fn union_row(items: Vec<CourseReq>) -> Vec<CourseReq> {
    let mut row: Vec<CourseReq> = Vec::with_capacity(items.len());
    for item in items {
        match row.iter_mut().find(|kept| kept.id == item.id) {
            Some(kept) => kept.absorb(item),
            None => row.push(item),
        }
    }
    row.sort_by(|a, b| a.id.cmp(&b.id));
    row
}

/// Keeps one entry per id, preferring one that carries a minimum grade.
fn dedupe_row(items: Vec<CourseReq>) -> Vec<CourseReq> {
    let mut row: Vec<CourseReq> = Vec::with_capacity(items.len());
    for item in items {
        match row.iter_mut().find(|kept| kept.id == item.id) {
            Some(kept) if kept.min_grade.is_none() && item.min_grade.is_some() => *kept = item,
            Some(_) => {}
            None => row.push(item),
        }
    }
    row
}
