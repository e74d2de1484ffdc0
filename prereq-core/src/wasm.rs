//! WASM bindings for the prereq-core library.
//!
//! A JavaScript front end owns one [`CourseGraph`] per graph view. Every method returns the
//! full [`GraphOutput`] as a JSON string so the renderer can redraw from it directly.

use log::Level;
use wasm_bindgen::prelude::*;

use crate::catalog::{Catalog, extract_alternative_groups};
use crate::graph::PrereqGraph;
use crate::layout::{LayoutSettings, Point};
use crate::layout::task::FrameOutcome;
use crate::output::GraphOutput;

fn init_logging() {
    let _ = console_log::init_with_level(Level::Debug);
    console_error_panic_hook::set_once();
}

/// Milliseconds from `performance.now()`, or 0 outside a browser window.
fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

fn parse_settings(json: &str) -> LayoutSettings {
    if json.trim().is_empty() {
        return LayoutSettings::default();
    }
    serde_json::from_str(json).unwrap_or_else(|e| {
        log::warn!("ignoring invalid layout settings: {}", e);
        LayoutSettings::default()
    })
}

#[wasm_bindgen]
pub struct CourseGraph {
    graph: PrereqGraph,
    /// Set when the course export could not be loaded.
    load_error: Option<String>,
}

impl CourseGraph {
    fn output(&self) -> String {
        match &self.load_error {
            Some(message) => GraphOutput::error(message.clone()).to_json(),
            None => GraphOutput::from_graph(&self.graph).to_json(),
        }
    }
}

#[wasm_bindgen]
impl CourseGraph {
    /// `courses_json` is the data-source export; `settings_json` may be empty or partial.
    #[wasm_bindgen(constructor)]
    pub fn new(courses_json: &str, settings_json: &str) -> CourseGraph {
        init_logging();
        let settings = parse_settings(settings_json);
        match Catalog::from_json(courses_json) {
            Ok(catalog) => CourseGraph { graph: PrereqGraph::with_catalog(catalog, settings), load_error: None },
            Err(e) => {
                log::error!("failed to load courses: {}", e);
                CourseGraph { graph: PrereqGraph::new(settings), load_error: Some(e.to_string()) }
            }
        }
    }

    pub fn snapshot(&self) -> String {
        self.output()
    }

    pub fn set_root(&mut self, course_id: &str) -> String {
        self.graph.advance_clock(now_ms());
        self.graph.set_root(course_id);
        self.output()
    }

    /// Toggle `course_id` under `parent_id`.
    pub fn click(&mut self, parent_id: &str, course_id: &str) -> String {
        self.graph.advance_clock(now_ms());
        self.graph.click(parent_id, course_id);
        self.output()
    }

    pub fn open(&mut self, parent_id: &str, course_id: &str) -> String {
        self.graph.advance_clock(now_ms());
        self.graph.open(parent_id, course_id);
        self.output()
    }

    pub fn close(&mut self, course_id: &str) -> String {
        self.graph.advance_clock(now_ms());
        self.graph.close(course_id);
        self.output()
    }

    pub fn hover_in(&mut self, parent_id: &str, course_id: &str) -> String {
        self.graph.hover_in(parent_id, course_id);
        self.output()
    }

    pub fn hover_out(&mut self, parent_id: &str, course_id: &str) -> String {
        self.graph.hover_out(parent_id, course_id);
        self.output()
    }

    /// Call once per animation frame while `layout_running` is true.
    pub fn frame(&mut self) -> String {
        self.graph.advance_clock(now_ms());
        if self.graph.frame() == FrameOutcome::Cancelled {
            log::debug!("frame requested for a cancelled layout");
        }
        self.output()
    }

    pub fn update_settings(&mut self, settings_json: &str) -> String {
        self.graph.set_settings(parse_settings(settings_json));
        self.output()
    }

    /// Viewport centre in world coordinates.
    pub fn set_anchor(&mut self, x: f64, y: f64) -> String {
        self.graph.set_anchor(Point::new(x, y));
        self.output()
    }

    /// Alternative groups of one course, as a JSON array of rows.
    pub fn prerequisite_groups(&self, course_id: &str) -> String {
        let groups = extract_alternative_groups(self.graph.catalog(), course_id);
        serde_json::to_string(&groups).unwrap_or_else(|_| "[]".to_string())
    }
}
