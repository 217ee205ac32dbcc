//! Nesting engine: packs scheduled part instances onto stock sheets.
//!
//! Packing is exposed as an iterator of progress snapshots ([`NestRun`]).
//! Each step does a bounded amount of work, so a caller can observe partial
//! results and stop early by dropping the iterator.

mod irregular;
mod rectangular;
mod stock;

pub use irregular::IrregularPacker;
pub use rectangular::{FreeRect, RectPacker};
pub use stock::StockSupply;

use crate::config::{angle, NestingSettings, PackerKind, SheetStrategy, EPS};
use crate::error::{CamError, Result};
use crate::geometry::Outline;
use crate::model::{
    find_part, BoundingBox, NestResultSheet, NestingConstraints, Part, PartGeometry, PlacedPart, ScheduledPart,
    SheetStock,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info, warn};

/// One part instance waiting to be packed.
#[derive(Debug, Clone)]
pub struct PackItem {
    pub part_id: String,
    /// Schedule entry the item was expanded from.
    pub group: usize,
    /// Instance number within its schedule entry.
    pub instance: u32,
    /// Outer contour in part coordinates.
    pub outline: Outline,
    /// Rotations in trial order.
    pub rotations: Vec<f64>,
    /// Unrotated bounding-extent area.
    pub area: f64,
}

impl PackItem {
    pub fn new(
        part_id: impl Into<String>,
        group: usize,
        instance: u32,
        geometry: &PartGeometry,
        constraints: &NestingConstraints,
    ) -> Self {
        Self::with_outline(part_id, group, instance, Outline::from_geometry(geometry), geometry, constraints)
    }

    fn with_outline(
        part_id: impl Into<String>,
        group: usize,
        instance: u32,
        outline: Outline,
        geometry: &PartGeometry,
        constraints: &NestingConstraints,
    ) -> Self {
        Self {
            part_id: part_id.into(),
            group,
            instance,
            outline,
            rotations: constraints.trial_rotations(),
            area: geometry.width() * geometry.height(),
        }
    }
}

/// Expand a schedule into pack items, largest first.
///
/// The sort is stable, so equal areas keep schedule order.
pub fn build_queue(parts: &[Part], schedule: &[ScheduledPart]) -> Result<Vec<PackItem>> {
    if schedule.is_empty() {
        return Err(CamError::EmptySchedule);
    }

    let mut outlines: HashMap<&str, Outline> = HashMap::new();
    let mut queue = Vec::new();
    for (group, entry) in schedule.iter().enumerate() {
        let part = find_part(parts, &entry.part_id).ok_or_else(|| CamError::UnknownPart {
            part_id: entry.part_id.clone(),
        })?;
        if entry.quantity == 0 {
            debug!(part = %part.id, "Skipping schedule entry with zero quantity");
            continue;
        }
        let constraints = entry.constraints.as_ref().unwrap_or(&part.constraints);
        let outline = outlines
            .entry(part.id.as_str())
            .or_insert_with(|| Outline::from_geometry(&part.geometry))
            .clone();
        for instance in 0..entry.quantity {
            queue.push(PackItem::with_outline(
                &part.id,
                group,
                instance,
                outline.clone(),
                &part.geometry,
                constraints,
            ));
        }
    }

    queue.sort_by(|a, b| b.area.total_cmp(&a.area));
    Ok(queue)
}

/// Reserved areas around the clamps along the bottom sheet edge.
pub fn clamp_zones(settings: &NestingSettings, sheet_width: f64) -> Vec<BoundingBox> {
    if settings.clamp_zone_width <= EPS || settings.clamp_zone_height <= EPS {
        return Vec::new();
    }
    settings
        .clamp_positions
        .iter()
        .map(|&c| {
            BoundingBox::new(
                (c - settings.clamp_zone_width).max(0.0),
                0.0,
                (c + settings.clamp_zone_width).min(sheet_width),
                settings.clamp_zone_height,
            )
        })
        .filter(|z| z.width() > EPS)
        .collect()
}

/// Where an item lands on a sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Part origin on the sheet.
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    /// Region claimed on the sheet.
    pub extents: BoundingBox,
}

/// Resume point of a position search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanCursor {
    /// Index into `PackItem::rotations`.
    pub rotation: usize,
    /// Next candidate position for that rotation.
    pub candidate: usize,
}

/// Outcome of one bounded search step.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanStep {
    Found(Placement),
    /// No position exists on this sheet.
    Exhausted,
    /// Budget spent; call again with the same cursor.
    Pending,
}

/// A packing strategy for one sheet.
pub trait Packer {
    /// Continue a position search, examining at most `budget` candidates.
    fn scan(&self, item: &PackItem, cursor: &mut ScanCursor, budget: &mut usize) -> ScanStep;

    /// Run a search to completion.
    fn find_position(&self, item: &PackItem) -> Option<Placement> {
        let mut cursor = ScanCursor::default();
        loop {
            let mut budget = usize::MAX;
            match self.scan(item, &mut cursor, &mut budget) {
                ScanStep::Found(placement) => return Some(placement),
                ScanStep::Exhausted => return None,
                ScanStep::Pending => continue,
            }
        }
    }

    /// Commit a placement returned by a search.
    fn place_item(&mut self, item: &PackItem, placement: &Placement);
}

/// Create the configured packer for an empty sheet.
pub fn new_packer(width: f64, height: f64, settings: &NestingSettings) -> Box<dyn Packer> {
    match settings.packer {
        PackerKind::Irregular => Box::new(IrregularPacker::new(width, height, settings)),
        PackerKind::Rectangular => Box::new(RectPacker::new(width, height, settings)),
    }
}

/// An item the run gave up on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnplacedItem {
    pub part_id: String,
    pub instance: u32,
    pub reason: String,
}

/// Snapshot yielded after every step of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestProgress {
    /// Sheets completed so far.
    pub sheets: Vec<NestResultSheet>,
    /// Share of queued items placed or dropped, 0-100.
    pub percent: f64,
    pub status: String,
    pub unplaced: Vec<UnplacedItem>,
    /// Set on the last snapshot only.
    pub done: bool,
}

/// Final result of a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NestOutcome {
    pub sheets: Vec<NestResultSheet>,
    pub unplaced: Vec<UnplacedItem>,
}

impl NestOutcome {
    /// Physical sheets used, counting repeats.
    pub fn sheet_count(&self) -> u32 {
        self.sheets.iter().map(|s| s.quantity).sum()
    }
}

/// Sheet being filled.
struct OpenSheet {
    stock_index: usize,
    packer: Box<dyn Packer>,
    parts: Vec<PlacedPart>,
    used_area: f64,
    /// Queue position of the item being tried.
    item: usize,
    cursor: ScanCursor,
    /// Schedule groups that already failed on this sheet.
    failed: HashSet<usize>,
}

/// Head item being test-fitted against candidate stock entries.
struct SheetTrial {
    candidates: Vec<usize>,
    /// Position in `candidates` being tried.
    next: usize,
    packer: Box<dyn Packer>,
    cursor: ScanCursor,
}

enum RunState {
    SelectSheet,
    Trial(SheetTrial),
    Packing(OpenSheet),
    Finished,
}

/// Resumable nesting run.
pub struct NestRun<'a> {
    settings: &'a NestingSettings,
    supply: StockSupply<'a>,
    queue: VecDeque<PackItem>,
    total: usize,
    sheets: Vec<NestResultSheet>,
    unplaced: Vec<UnplacedItem>,
    state: Option<RunState>,
}

impl<'a> NestRun<'a> {
    /// Build the item queue and prepare a run.
    pub fn new(
        parts: &[Part],
        schedule: &[ScheduledPart],
        stock: &'a [SheetStock],
        settings: &'a NestingSettings,
    ) -> Result<Self> {
        let queue: VecDeque<PackItem> = build_queue(parts, schedule)?.into();
        info!(items = queue.len(), stock = stock.len(), "Starting nesting run");
        Ok(Self {
            settings,
            supply: StockSupply::new(stock),
            total: queue.len(),
            queue,
            sheets: Vec::new(),
            unplaced: Vec::new(),
            state: Some(RunState::SelectSheet),
        })
    }

    /// Drain the run and return its result.
    pub fn finish(mut self) -> NestOutcome {
        while self.next().is_some() {}
        NestOutcome {
            sheets: self.sheets,
            unplaced: self.unplaced,
        }
    }

    fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.total - self.queue.len()) as f64 * 100.0 / self.total as f64
        }
    }

    fn sheet_number(&self) -> u32 {
        self.sheets.iter().map(|s| s.quantity).sum::<u32>() + 1
    }

    fn drop_head(&mut self, reason: &str) -> String {
        match self.queue.pop_front() {
            Some(item) => {
                warn!(part = %item.part_id, instance = item.instance, "Dropping item: {}", reason);
                let status = format!("Dropped {}: {}", item.part_id, reason);
                self.unplaced.push(UnplacedItem {
                    part_id: item.part_id,
                    instance: item.instance,
                    reason: reason.to_string(),
                });
                status
            }
            None => String::new(),
        }
    }

    fn select_sheet(&mut self) -> (RunState, String) {
        if self.queue.is_empty() {
            return (RunState::Finished, "All items placed".to_string());
        }

        let candidates = self.supply.candidates(self.settings.sheet_strategy);
        if candidates.is_empty() {
            warn!(remaining = self.queue.len(), "Stock exhausted");
            while !self.queue.is_empty() {
                self.drop_head("no stock available");
            }
            return (RunState::Finished, "Stock exhausted".to_string());
        }

        match self.settings.sheet_strategy {
            SheetStrategy::BestFit => match self.supply.get(candidates[0]) {
                Some(stock) => {
                    let packer = new_packer(stock.width, stock.height, self.settings);
                    self.open_sheet(candidates[0], packer)
                }
                None => (RunState::SelectSheet, self.drop_head("fits no available stock")),
            },
            SheetStrategy::SmallestFirst | SheetStrategy::ListedOrder => self.trial_from(candidates, 0),
        }
    }

    /// Start test-fitting the head item on `candidates[next]`.
    fn trial_from(&mut self, candidates: Vec<usize>, next: usize) -> (RunState, String) {
        let Some(stock) = candidates.get(next).and_then(|&idx| self.supply.get(idx)) else {
            let status = self.drop_head("fits no available stock");
            return (RunState::SelectSheet, status);
        };
        let trial = SheetTrial {
            packer: new_packer(stock.width, stock.height, self.settings),
            candidates,
            next,
            cursor: ScanCursor::default(),
        };
        (RunState::Trial(trial), format!("Checking stock {}", stock.id))
    }

    /// Continue a trial fit within the step budget.
    fn trial_step(&mut self, mut trial: SheetTrial) -> (RunState, String) {
        let Some(head) = self.queue.front() else {
            return (RunState::Finished, "All items placed".to_string());
        };
        let mut budget = self.settings.max_candidates_per_step.max(1);
        match trial.packer.scan(head, &mut trial.cursor, &mut budget) {
            ScanStep::Found(_) => {
                let idx = trial.candidates[trial.next];
                self.open_sheet(idx, trial.packer)
            }
            ScanStep::Exhausted => self.trial_from(trial.candidates, trial.next + 1),
            ScanStep::Pending => {
                let id = self
                    .supply
                    .get(trial.candidates[trial.next])
                    .map_or("", |s| s.id.as_str());
                let status = format!("Checking stock {}", id);
                (RunState::Trial(trial), status)
            }
        }
    }

    /// Open a sheet of a stock entry with an empty packer.
    fn open_sheet(&mut self, stock_index: usize, packer: Box<dyn Packer>) -> (RunState, String) {
        let Some(stock) = self.supply.get(stock_index) else {
            return (RunState::SelectSheet, self.drop_head("fits no available stock"));
        };
        let number = self.sheet_number();
        debug!(sheet = number, stock = %stock.id, "Opening sheet");
        let open = OpenSheet {
            stock_index,
            packer,
            parts: Vec::new(),
            used_area: 0.0,
            item: 0,
            cursor: ScanCursor::default(),
            failed: HashSet::new(),
        };
        (RunState::Packing(open), format!("Packing sheet {} ({})", number, stock.id))
    }

    fn pack_step(&mut self, mut open: OpenSheet) -> (RunState, String) {
        let mut budget = self.settings.max_candidates_per_step.max(1);
        loop {
            let Some(item) = self.queue.get(open.item) else {
                return self.close_sheet(open);
            };
            let group = item.group;
            if open.failed.contains(&group) {
                open.item += 1;
                open.cursor = ScanCursor::default();
                continue;
            }

            match open.packer.scan(item, &mut open.cursor, &mut budget) {
                ScanStep::Found(placement) => {
                    let Some(item) = self.queue.remove(open.item) else {
                        return self.close_sheet(open);
                    };
                    open.packer.place_item(&item, &placement);
                    debug!(
                        part = %item.part_id,
                        x = placement.x,
                        y = placement.y,
                        rotation = placement.rotation,
                        "Placed item"
                    );
                    open.parts.push(PlacedPart {
                        part_id: item.part_id.clone(),
                        instance_id: open.parts.len() as u32,
                        x: placement.x,
                        y: placement.y,
                        rotation: angle::normalize_degrees(placement.rotation),
                    });
                    open.used_area += item.area;
                    open.cursor = ScanCursor::default();
                    let status = format!("Placed {} on sheet {}", item.part_id, self.sheet_number());
                    return (RunState::Packing(open), status);
                }
                ScanStep::Exhausted => {
                    open.failed.insert(group);
                    open.item += 1;
                    open.cursor = ScanCursor::default();
                }
                ScanStep::Pending => {
                    let status = format!("Searching position on sheet {}", self.sheet_number());
                    return (RunState::Packing(open), status);
                }
            }
        }
    }

    fn close_sheet(&mut self, open: OpenSheet) -> (RunState, String) {
        let Some(stock) = self.supply.get(open.stock_index) else {
            return (RunState::SelectSheet, String::new());
        };
        if open.parts.is_empty() {
            // Only possible without a fit check: the head item cannot go on this stock
            let status = self.drop_head("does not fit the selected stock");
            return (RunState::SelectSheet, status);
        }

        let number = self.sheet_number();
        self.supply.consume(open.stock_index);
        let sheet_area = stock.area();
        let used = if sheet_area > 0.0 {
            open.used_area / sheet_area * 100.0
        } else {
            0.0
        };
        let sheet = NestResultSheet {
            stock_id: stock.id.clone(),
            width: stock.width,
            height: stock.height,
            material: stock.material.clone(),
            thickness: stock.thickness,
            parts: open.parts,
            used_area_percent: used,
            scrap_percent: 100.0 - used,
            quantity: 1,
        };
        info!(
            sheet = number,
            stock = %sheet.stock_id,
            parts = sheet.parts.len(),
            used_percent = used,
            "Sheet complete"
        );

        match self.sheets.last_mut() {
            Some(last) if last.same_layout(&sheet) => last.quantity += 1,
            _ => self.sheets.push(sheet),
        }
        (RunState::SelectSheet, format!("Sheet {} complete", number))
    }

    fn snapshot(&self, status: String, done: bool) -> NestProgress {
        NestProgress {
            sheets: self.sheets.clone(),
            percent: self.percent(),
            status,
            unplaced: self.unplaced.clone(),
            done,
        }
    }
}

impl Iterator for NestRun<'_> {
    type Item = NestProgress;

    fn next(&mut self) -> Option<NestProgress> {
        let (state, status) = match self.state.take()? {
            RunState::SelectSheet => self.select_sheet(),
            RunState::Trial(trial) => self.trial_step(trial),
            RunState::Packing(open) => self.pack_step(open),
            RunState::Finished => return None,
        };
        let done = matches!(state, RunState::Finished);
        if done {
            info!(
                sheets = self.sheets.len(),
                unplaced = self.unplaced.len(),
                "Nesting run finished"
            );
        } else {
            self.state = Some(state);
        }
        Some(self.snapshot(status, done))
    }
}

/// Nest a schedule to completion.
pub fn nest(
    parts: &[Part],
    schedule: &[ScheduledPart],
    stock: &[SheetStock],
    settings: &NestingSettings,
) -> Result<NestOutcome> {
    Ok(NestRun::new(parts, schedule, stock, settings)?.finish())
}
