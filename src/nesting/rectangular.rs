//! Free-rectangle packing on rotated bounding extents.

use super::{clamp_zones, PackItem, Packer, Placement, ScanCursor, ScanStep};
use crate::config::{float_cmp, NestingSettings, EPS, MIN_FREE_RECT};
use crate::model::BoundingBox;

/// An unoccupied axis-aligned area of the sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FreeRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    fn from_bbox(b: &BoundingBox) -> Self {
        Self::new(b.min_x, b.min_y, b.width(), b.height())
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, other: &FreeRect) -> bool {
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.right() <= self.right() + EPS
            && other.top() <= self.top() + EPS
    }

    pub fn overlaps(&self, other: &FreeRect) -> bool {
        self.x < other.right() - EPS
            && other.x < self.right() - EPS
            && self.y < other.top() - EPS
            && other.y < self.top() - EPS
    }
}

/// Maximal free-rectangle packer with best-short-side scoring.
///
/// Spacing is added on the left and bottom of an item unless the free
/// rectangle starts on the sheet's origin side.
pub struct RectPacker {
    free: Vec<FreeRect>,
    origin_x: f64,
    origin_y: f64,
    spacing_x: f64,
    spacing_y: f64,
}

impl RectPacker {
    pub fn new(width: f64, height: f64, settings: &NestingSettings) -> Self {
        let usable = FreeRect::new(
            settings.margin_left,
            settings.margin_bottom,
            width - settings.margin_left - settings.margin_right,
            height - settings.margin_bottom - settings.margin_top,
        );
        let mut packer = Self {
            free: if usable.width > EPS && usable.height > EPS {
                vec![usable]
            } else {
                Vec::new()
            },
            origin_x: settings.margin_left,
            origin_y: settings.margin_bottom,
            spacing_x: settings.spacing_x,
            spacing_y: settings.spacing_y,
        };
        for zone in clamp_zones(settings, width) {
            packer.subtract(&FreeRect::from_bbox(&zone));
        }
        packer
    }

    pub fn free_rects(&self) -> &[FreeRect] {
        &self.free
    }

    /// Remove `used` from every free rectangle it overlaps.
    fn subtract(&mut self, used: &FreeRect) {
        let mut next = Vec::with_capacity(self.free.len() + 4);
        for f in &self.free {
            if !f.overlaps(used) {
                next.push(*f);
                continue;
            }
            let pieces = [
                FreeRect::new(f.x, f.y, used.x - f.x, f.height),
                FreeRect::new(used.right(), f.y, f.right() - used.right(), f.height),
                FreeRect::new(f.x, f.y, f.width, used.y - f.y),
                FreeRect::new(f.x, used.top(), f.width, f.top() - used.top()),
            ];
            next.extend(
                pieces
                    .into_iter()
                    .filter(|r| r.width > MIN_FREE_RECT && r.height > MIN_FREE_RECT),
            );
        }

        // Drop rectangles contained in another one (first copy of duplicates wins)
        let mut keep = vec![true; next.len()];
        for i in 0..next.len() {
            for j in 0..next.len() {
                if i != j && keep[j] && next[j].contains(&next[i]) && (next[i] != next[j] || j < i) {
                    keep[i] = false;
                    break;
                }
            }
        }
        self.free = next
            .into_iter()
            .zip(keep)
            .filter_map(|(r, k)| k.then_some(r))
            .collect();
    }
}

impl Packer for RectPacker {
    fn scan(&self, item: &PackItem, _cursor: &mut ScanCursor, budget: &mut usize) -> ScanStep {
        let shapes: Vec<(f64, BoundingBox)> = item
            .rotations
            .iter()
            .map(|&r| (r, item.outline.rotated(r).bounding_box()))
            .collect();

        let mut best: Option<(f64, Placement)> = None;
        for f in &self.free {
            let pad_x = if float_cmp::approx_eq(f.x, self.origin_x) { 0.0 } else { self.spacing_x };
            let pad_y = if float_cmp::approx_eq(f.y, self.origin_y) { 0.0 } else { self.spacing_y };

            for (rotation, extents) in &shapes {
                let eff_w = extents.width() + pad_x;
                let eff_h = extents.height() + pad_y;
                if eff_w > f.width + EPS || eff_h > f.height + EPS {
                    continue;
                }
                let score = (f.width - eff_w).min(f.height - eff_h);
                if best.as_ref().is_some_and(|(s, _)| score >= *s) {
                    continue;
                }

                let (x, y) = (f.x + pad_x, f.y + pad_y);
                let (min_x, min_y) = if extents.is_empty() {
                    (0.0, 0.0)
                } else {
                    (extents.min_x, extents.min_y)
                };
                best = Some((
                    score,
                    Placement {
                        x: x - min_x,
                        y: y - min_y,
                        rotation: *rotation,
                        // Claimed area includes the padding
                        extents: BoundingBox::new(f.x, f.y, f.x + eff_w, f.y + eff_h),
                    },
                ));
            }
        }
        *budget = budget.saturating_sub(self.free.len().max(1));

        match best {
            Some((_, placement)) => ScanStep::Found(placement),
            None => ScanStep::Exhausted,
        }
    }

    fn place_item(&mut self, _item: &PackItem, placement: &Placement) {
        self.subtract(&FreeRect::from_bbox(&placement.extents));
    }
}
