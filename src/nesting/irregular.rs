//! First-fit grid scan with exact outline collision tests.

use super::{clamp_zones, PackItem, Packer, Placement, ScanCursor, ScanStep};
use crate::config::{NestingSettings, DEFAULT_GRID_STEP, EPS};
use crate::geometry::{outlines_clear, Outline};
use crate::model::BoundingBox;

/// Candidate grid for one rotated item.
struct Grid {
    x0: f64,
    y0: f64,
    columns: usize,
    rows: usize,
}

/// Packs rotated part outlines by scanning grid positions bottom row first,
/// left to right, and taking the first collision-free one.
pub struct IrregularPacker {
    width: f64,
    height: f64,
    margin_left: f64,
    margin_right: f64,
    margin_top: f64,
    margin_bottom: f64,
    step: f64,
    gap: f64,
    placed: Vec<Outline>,
    obstacles: Vec<Outline>,
}

impl IrregularPacker {
    pub fn new(width: f64, height: f64, settings: &NestingSettings) -> Self {
        let obstacles = clamp_zones(settings, width)
            .iter()
            .map(|z| Outline::rectangle(z.min_x, z.min_y, z.width(), z.height()))
            .collect();
        Self {
            width,
            height,
            margin_left: settings.margin_left,
            margin_right: settings.margin_right,
            margin_top: settings.margin_top,
            margin_bottom: settings.margin_bottom,
            step: if settings.grid_step > EPS {
                settings.grid_step
            } else {
                DEFAULT_GRID_STEP
            },
            gap: settings.max_spacing(),
            placed: Vec::new(),
            obstacles,
        }
    }

    /// Outlines placed so far, in sheet coordinates.
    pub fn placed(&self) -> &[Outline] {
        &self.placed
    }

    fn grid(&self, w: f64, h: f64) -> Option<Grid> {
        let x_span = self.width - self.margin_right - w - self.margin_left;
        let y_span = self.height - self.margin_top - h - self.margin_bottom;
        if x_span < -EPS || y_span < -EPS {
            return None;
        }
        Some(Grid {
            x0: self.margin_left,
            y0: self.margin_bottom,
            columns: (x_span.max(0.0) / self.step + EPS).floor() as usize + 1,
            rows: (y_span.max(0.0) / self.step + EPS).floor() as usize + 1,
        })
    }

    fn collides(&self, candidate: &Outline) -> bool {
        self.obstacles.iter().any(|o| !outlines_clear(o, candidate, 0.0))
            || self.placed.iter().any(|p| !outlines_clear(p, candidate, self.gap))
    }
}

impl Packer for IrregularPacker {
    fn scan(&self, item: &PackItem, cursor: &mut ScanCursor, budget: &mut usize) -> ScanStep {
        while let Some(&rotation) = item.rotations.get(cursor.rotation) {
            let shape = item.outline.rotated(rotation);
            let extents = shape.bounding_box();
            let (w, h) = (extents.width(), extents.height());

            if let Some(grid) = self.grid(w, h) {
                let total = grid.columns * grid.rows;
                while cursor.candidate < total {
                    if *budget == 0 {
                        return ScanStep::Pending;
                    }
                    *budget -= 1;

                    let k = cursor.candidate;
                    cursor.candidate += 1;
                    let x = grid.x0 + (k % grid.columns) as f64 * self.step;
                    let y = grid.y0 + (k / grid.columns) as f64 * self.step;
                    // Part origin that puts the rotated extents at (x, y)
                    let (origin_x, origin_y) = if extents.is_empty() {
                        (x, y)
                    } else {
                        (x - extents.min_x, y - extents.min_y)
                    };

                    if !self.collides(&shape.translated(origin_x, origin_y)) {
                        return ScanStep::Found(Placement {
                            x: origin_x,
                            y: origin_y,
                            rotation,
                            extents: BoundingBox::new(x, y, x + w, y + h),
                        });
                    }
                }
            }

            cursor.rotation += 1;
            cursor.candidate = 0;
        }
        ScanStep::Exhausted
    }

    fn place_item(&mut self, item: &PackItem, placement: &Placement) {
        self.placed.push(
            item.outline
                .rotated(placement.rotation)
                .translated(placement.x, placement.y),
        );
    }
}
