//! Display-only walk over a requirement tree, used for the contents of a course card.
//!
//! Unlike the group extractor this keeps the tree shape and the non-course leaves.

use serde::Serialize;

use super::Catalog;
use super::types::{CountReq, CourseRef, Logic, RequirementNode};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayNode {
    Course {
        id: String,
        label: String,
        /// Whether the course is currently revealed in the graph.
        present: bool,
    },
    Group {
        logic: Logic,
        join: &'static str,
        /// Every child is a course pill, so the group fits on one line.
        inline: bool,
        children: Vec<DisplayNode>,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    /// Unknown to the catalog.
    Missing,
    /// Known, with a `null` tree.
    None,
    Listed,
}

impl CardStatus {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            CardStatus::Missing => Some("No prerequisite data found."),
            CardStatus::None => Some("No prerequisites."),
            CardStatus::Listed => None,
        }
    }
}

pub fn card_status(catalog: &Catalog, course_id: &str) -> CardStatus {
    match catalog.get(course_id) {
        None => CardStatus::Missing,
        Some(record) if record.requirements.is_none() => CardStatus::None,
        Some(_) => CardStatus::Listed,
    }
}

/// Returns `None` when nothing displayable remains (empty groups, unknown tags).
pub fn describe(
    tree: &RequirementNode,
    present: &dyn Fn(&str) -> bool,
    show_min_grade: bool,
) -> Option<DisplayNode> {
    match tree {
        RequirementNode::Group { logic, children } => {
            let children: Vec<DisplayNode> = children
                .iter()
                .filter_map(|child| describe(child, present, show_min_grade))
                .collect();
            if children.is_empty() {
                return None;
            }
            let inline = children.iter().all(|c| matches!(c, DisplayNode::Course { .. }));
            let join = match logic {
                Logic::OneOf => "or",
                Logic::AllOf | Logic::TwoOf => "and",
            };
            Some(DisplayNode::Group { logic: *logic, join, inline, children })
        }
        RequirementNode::Course(course) => Some(course_pill(course, present, show_min_grade)),
        RequirementNode::CreditCount(req) => Some(text(format!(
            "{} credits{}",
            format_amount(req.amount),
            scope_suffix(req)
        ))),
        RequirementNode::CourseCount(req) => Some(text(format!(
            "{} course(s){}",
            format_amount(req.amount),
            scope_suffix(req)
        ))),
        RequirementNode::Program { program } => Some(text(format!("Admission to {}", program))),
        RequirementNode::Gpa { min_cgpa, min_udgpa } => {
            let parts: Vec<String> = [("CGPA", min_cgpa), ("UDGPA", min_udgpa)]
                .into_iter()
                .filter_map(|(name, value)| value.as_ref().map(|v| format!("minimum {} of {}", name, v)))
                .collect();
            (!parts.is_empty()).then(|| text(capitalise(&parts.join(" and "))))
        }
        RequirementNode::Note { text: body }
        | RequirementNode::Other { text: body }
        | RequirementNode::Permission { text: body } => {
            (!body.is_empty()).then(|| text(body.clone()))
        }
        RequirementNode::Unknown { .. } => None,
    }
}

fn course_pill(course: &CourseRef, present: &dyn Fn(&str) -> bool, show_min_grade: bool) -> DisplayNode {
    let label = match (&course.min_grade, show_min_grade) {
        (Some(grade), true) => format!("{} ({})", course.id, grade),
        _ => course.id.clone(),
    };
    DisplayNode::Course { id: course.id.clone(), label, present: present(&course.id) }
}

fn text(text: String) -> DisplayNode {
    DisplayNode::Text { text }
}

fn scope_suffix(req: &CountReq) -> String {
    let scope: Vec<&str> = [req.department.as_deref(), req.level.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    let mut suffix = if scope.is_empty() { String::new() } else { format!(" from {}", scope.join(" ")) };
    if let Some(grade) = &req.min_grade {
        suffix.push_str(&format!(" with a minimum grade of {}", grade));
    }
    suffix
}

fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 { format!("{}", amount as i64) } else { format!("{}", amount) }
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::fixture;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_card_status() {
        let catalog = fixture();
        assert_eq!(card_status(&catalog, "NOPE 1"), CardStatus::Missing);
        assert_eq!(card_status(&catalog, "ECON 103"), CardStatus::None);
        assert_eq!(card_status(&catalog, "ECON 201"), CardStatus::Listed);
        assert_eq!(CardStatus::Missing.message(), Some("No prerequisite data found."));
        assert_eq!(CardStatus::None.message(), Some("No prerequisites."));
    }

    #[test]
    fn test_min_grade_labels_and_presence() {
        let revealed = ["ECON 201", "ECON 103"];
        let present = |id: &str| revealed.iter().any(|r| *r == id);
        let tree = RequirementNode::group(
            Logic::OneOf,
            vec![
                RequirementNode::Course(CourseRef::new("ECON 103").with_min_grade("C-")),
                RequirementNode::course("ECON 113"),
            ],
        );

        let shown = describe(&tree, &present, true).unwrap();
        assert_eq!(
            shown,
            DisplayNode::Group {
                logic: Logic::OneOf,
                join: "or",
                inline: true,
                children: vec![
                    DisplayNode::Course { id: "ECON 103".into(), label: "ECON 103 (C-)".into(), present: true },
                    DisplayNode::Course { id: "ECON 113".into(), label: "ECON 113".into(), present: false },
                ],
            }
        );

        match describe(&tree, &present, false).unwrap() {
            DisplayNode::Group { children, .. } => match &children[0] {
                DisplayNode::Course { label, .. } => assert_eq!(label, "ECON 103"),
                other => panic!("expected course, got {:?}", other),
            },
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn test_text_leaves_and_pruning() {
        let never = |_: &str| false;
        let tree = RequirementNode::group(
            Logic::TwoOf,
            vec![
                RequirementNode::CreditCount(CountReq {
                    amount: 45.0,
                    department: Some("ECON".into()),
                    ..CountReq::default()
                }),
                RequirementNode::CourseCount(CountReq {
                    amount: 2.0,
                    department: Some("MATH".into()),
                    level: Some("300".into()),
                    ..CountReq::default()
                }),
                RequirementNode::Gpa { min_cgpa: Some("2.5".into()), min_udgpa: None },
                RequirementNode::group(Logic::AllOf, vec![RequirementNode::Unknown { tag: "x".into() }]),
            ],
        );

        let texts: Vec<String> = match describe(&tree, &never, false).unwrap() {
            DisplayNode::Group { logic, join, inline, children } => {
                assert_eq!((logic, join, inline), (Logic::TwoOf, "and", false));
                children
                    .into_iter()
                    .map(|c| match c {
                        DisplayNode::Text { text } => text,
                        other => panic!("expected text, got {:?}", other),
                    })
                    .collect()
            }
            other => panic!("expected group, got {:?}", other),
        };
        assert_eq!(
            texts,
            vec![
                "45 credits from ECON".to_string(),
                "2 course(s) from MATH 300".to_string(),
                "Minimum CGPA of 2.5".to_string(),
            ]
        );
    }

    #[test]
    fn test_serialised_shape() {
        let node = DisplayNode::Course { id: "A 1".into(), label: "A 1".into(), present: false };
        assert_eq!(
            serde_json::to_string(&node).unwrap(),
            r#"{"kind":"course","id":"A 1","label":"A 1","present":false}"#
        );
    }
}
