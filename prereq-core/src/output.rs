//! Output types for the renderer.
//!
//! These structs are serialized to JSON on every state change. The renderer draws them
//! verbatim and holds no graph logic of its own.

use serde::Serialize;

use crate::catalog::{AlternativeGroups, CardStatus, DisplayNode, card_status, describe, extract_alternative_groups};
use crate::graph::PrereqGraph;
use crate::layout::card_size;

/// A course card ready to draw.
#[derive(Debug, Clone, Serialize)]
pub struct NodeOutput {
    pub id: String,
    pub title: Option<String>,
    /// Card centre.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub depth: usize,
    pub persisted: bool,
    pub highlight: bool,
    pub pinned: bool,
    pub primary_parent: Option<String>,
    pub status: CardStatus,
    /// Placeholder text for cards without a requirement list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<DisplayNode>,
    /// Direct prerequisites, one row per requirement to satisfy.
    pub groups: AlternativeGroups,
}

/// An edge from a course to one of its prerequisites.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeOutput {
    pub source: String,
    pub target: String,
    pub ephemeral: bool,
    /// The target was revealed through this source.
    pub primary: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub message: String,
}

/// The combined output sent to the renderer.
#[derive(Debug, Clone, Serialize, Default)]
pub struct GraphOutput {
    pub root: Option<String>,
    pub nodes: Vec<NodeOutput>,
    pub edges: Vec<EdgeOutput>,
    /// Ring guide radii, only when ring guides are enabled.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rings: Vec<f64>,
    pub layout_running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl GraphOutput {
    pub fn from_graph(graph: &PrereqGraph) -> Self {
        let state = graph.state();
        let catalog = graph.catalog();
        let show_min_grade = graph.settings().show_min_grade;
        let present = |id: &str| state.nodes.contains_key(id);

        let nodes = state
            .nodes
            .values()
            .map(|node| {
                let size = card_size(state.is_root(&node.id));
                let status = card_status(catalog, &node.id);
                NodeOutput {
                    id: node.id.clone(),
                    title: catalog.title(&node.id).map(str::to_string),
                    x: node.position.x,
                    y: node.position.y,
                    width: size.w,
                    height: size.h,
                    depth: graph.depth_of(&node.id),
                    persisted: node.persisted,
                    highlight: node.highlight,
                    pinned: node.is_pinned(),
                    primary_parent: node.primary_parent.clone(),
                    status,
                    message: status.message(),
                    requirements: catalog
                        .requirements(&node.id)
                        .and_then(|tree| describe(tree, &present, show_min_grade)),
                    groups: extract_alternative_groups(catalog, &node.id),
                }
            })
            .collect();

        let edges = state
            .edges
            .values()
            .map(|edge| EdgeOutput {
                source: edge.source.clone(),
                target: edge.target.clone(),
                ephemeral: edge.ephemeral,
                primary: state
                    .nodes
                    .get(&edge.target)
                    .and_then(|n| n.primary_parent.as_deref())
                    == Some(edge.source.as_str()),
            })
            .collect();

        GraphOutput {
            root: state.root.clone(),
            nodes,
            edges,
            rings: graph.settings().ring_guides(),
            layout_running: graph.is_layout_running(),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        GraphOutput { error: Some(ErrorInfo { message: message.into() }), ..GraphOutput::default() }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            log::error!("failed to serialise graph output: {}", e);
            r#"{"nodes":[],"edges":[],"error":{"message":"serialisation failed"}}"#.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::fixture;
    use crate::layout::LayoutSettings;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn snapshot(settings: LayoutSettings) -> Value {
        let mut graph = PrereqGraph::with_catalog(fixture(), settings);
        graph.set_root("ECON 201");
        graph.open("ECON 201", "ECON 103");
        graph.hover_in("ECON 201", "ECON 999");
        serde_json::from_str(&GraphOutput::from_graph(&graph).to_json()).unwrap()
    }

    #[test]
    fn test_snapshot_shape() {
        let out = snapshot(LayoutSettings { animate: false, ..LayoutSettings::default() });

        assert_eq!(out["root"], json!("ECON 201"));
        assert_eq!(out["layout_running"], json!(false));
        assert!(out.get("rings").is_none());
        assert!(out.get("error").is_none());

        let nodes = out["nodes"].as_array().unwrap();
        let ids: Vec<&str> = nodes.iter().map(|n| n["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["ECON 103", "ECON 201", "ECON 999"]);

        let root = &nodes[1];
        assert_eq!(root["width"], json!(320.0));
        assert_eq!(root["pinned"], json!(true));
        assert_eq!(root["status"], json!("listed"));
        assert_eq!(root["groups"].as_array().unwrap().len(), 3);
        assert_eq!(root["requirements"]["join"], json!("and"));

        let leaf = &nodes[0];
        assert_eq!(leaf["status"], json!("none"));
        assert_eq!(leaf["message"], json!("No prerequisites."));
        assert_eq!(leaf["depth"], json!(1));
        assert_eq!(leaf["title"], json!("Principles of Microeconomics"));

        let missing = &nodes[2];
        assert_eq!(missing["status"], json!("missing"));
        assert_eq!(missing["message"], json!("No prerequisite data found."));
        assert_eq!(missing["persisted"], json!(false));

        assert_eq!(
            out["edges"],
            json!([
                {"source": "ECON 201", "target": "ECON 103", "ephemeral": false, "primary": true},
                {"source": "ECON 201", "target": "ECON 999", "ephemeral": true, "primary": true},
            ])
        );
    }

    #[test]
    fn test_rings_and_min_grades_follow_settings() {
        let out = snapshot(LayoutSettings {
            animate: false,
            show_rings: true,
            ring_count: 2,
            show_min_grade: true,
            ..LayoutSettings::default()
        });
        assert_eq!(out["rings"], json!([400.0, 750.0]));

        let first_row = &out["nodes"][1]["requirements"]["children"][0]["children"];
        assert_eq!(first_row[0]["label"], json!("ECON 103 (C-)"));
        assert_eq!(first_row[0]["present"], json!(true));
        // In the catalog but not revealed.
        assert_eq!(first_row[1]["id"], json!("ECON 113"));
        assert_eq!(first_row[1]["present"], json!(false));
    }

    #[test]
    fn test_error_output() {
        let out: Value = serde_json::from_str(&GraphOutput::error("bad export").to_json()).unwrap();
        assert_eq!(out["error"]["message"], json!("bad export"));
        assert_eq!(out["nodes"], json!([]));
    }
}
