// Spatial hash grid for collision candidate lookup.
//
// Instead of checking every pair of cards on each separation pass, boxes are bucketed into
// square cells and only boxes sharing a cell are compared.

use std::collections::{BTreeSet, HashMap};

use super::RectF;

/// Grid of body indices bucketed by the cells their boxes touch.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl SpatialGrid {
    /// Cell size should be roughly the size of the largest box.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: if cell_size.is_finite() && cell_size >= 1.0 { cell_size } else { 1.0 },
            cells: HashMap::new(),
        }
    }

    fn cell_range(&self, rect: &RectF) -> Vec<(i64, i64)> {
        let cell = |v: f64| (v / self.cell_size).floor() as i64;
        let (min_x, max_x) = (cell(rect.x), cell(rect.right()));
        let (min_y, max_y) = (cell(rect.y), cell(rect.bottom()));

        let mut cells = Vec::new();
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                cells.push((cx, cy));
            }
        }
        cells
    }

    pub fn insert(&mut self, index: usize, rect: &RectF) {
        for cell in self.cell_range(rect) {
            self.cells.entry(cell).or_default().push(index);
        }
    }

    /// Indices whose cells intersect the query, in ascending order.
    /// May include false positives; callers do the exact overlap check.
    pub fn query(&self, rect: &RectF) -> BTreeSet<usize> {
        self.cell_range(rect)
            .iter()
            .filter_map(|cell| self.cells.get(cell))
            .flatten()
            .copied()
            .collect()
    }
}
