//! Frame-chunked, cancelable relaxation run.
//!
//! A run owns its bodies and a [`CancelToken`]. The host calls [`LayoutRun::frame`] once per
//! animation frame; each call performs `iters_per_frame` relaxation iterations. Starting a new
//! run must cancel the previous token so two runs never interleave.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;

use super::radial_placement::AngleMap;
use super::relaxation::{Body, Relaxation, overlapping_pairs};
use super::{LayoutSettings, Point};
use crate::catalog::CourseId;

/// Shared stop flag. Single-threaded, so a `Cell` is enough.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameOutcome {
    /// More frames needed.
    Running,
    Finished,
    Cancelled,
}

#[derive(Debug)]
pub struct LayoutRun {
    bodies: Vec<Body>,
    angles: AngleMap,
    settings: LayoutSettings,
    anchor: Point,
    bound: f64,
    iterations_done: usize,
    finished: bool,
    token: CancelToken,
}

impl LayoutRun {
    pub fn new(bodies: Vec<Body>, angles: AngleMap, settings: LayoutSettings, anchor: Point, bound: f64) -> Self {
        Self {
            bodies,
            angles,
            settings,
            anchor,
            bound,
            iterations_done: 0,
            finished: false,
            token: CancelToken::new(),
        }
    }

    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn iterations_done(&self) -> usize {
        self.iterations_done
    }

    /// Advance by one frame's worth of iterations.
    pub fn frame(&mut self) -> FrameOutcome {
        if self.token.is_cancelled() {
            return FrameOutcome::Cancelled;
        }
        if self.finished {
            return FrameOutcome::Finished;
        }

        let relax = Relaxation { anchor: self.anchor, settings: &self.settings, bound: self.bound };
        let batch = self.settings.iters_per_frame.max(1);
        for _ in 0..batch {
            if self.iterations_done >= self.settings.iterations {
                break;
            }
            relax.step(&mut self.bodies);
            self.iterations_done += 1;
        }

        if self.iterations_done < self.settings.iterations {
            return FrameOutcome::Running;
        }

        if !relax.settle(&mut self.bodies) {
            log::warn!(
                "layout settled with {} overlapping pairs",
                overlapping_pairs(&self.bodies).len()
            );
        }
        self.finished = true;
        log::debug!("layout finished after {} iterations", self.iterations_done);
        FrameOutcome::Finished
    }

    /// Run every remaining frame now. Used when animation is off.
    pub fn run_to_completion(&mut self) -> FrameOutcome {
        loop {
            match self.frame() {
                FrameOutcome::Running => continue,
                outcome => return outcome,
            }
        }
    }

    pub fn positions(&self) -> BTreeMap<CourseId, Point> {
        self.bodies.iter().map(|b| (b.id.clone(), b.center)).collect()
    }

    pub fn angles(&self) -> &AngleMap {
        &self.angles
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }
}
