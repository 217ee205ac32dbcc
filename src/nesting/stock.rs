//! Stock sheet supply with per-run usage accounting.

use crate::config::SheetStrategy;
use crate::model::SheetStock;

/// Tracks how many sheets of each stock entry a run has consumed.
///
/// The stock table itself is never modified.
#[derive(Debug, Clone)]
pub struct StockSupply<'a> {
    stock: &'a [SheetStock],
    used: Vec<u32>,
}

impl<'a> StockSupply<'a> {
    pub fn new(stock: &'a [SheetStock]) -> Self {
        Self {
            stock,
            used: vec![0; stock.len()],
        }
    }

    pub fn get(&self, index: usize) -> Option<&'a SheetStock> {
        self.stock.get(index)
    }

    /// Sheets consumed from an entry so far.
    pub fn used(&self, index: usize) -> u32 {
        self.used.get(index).copied().unwrap_or(0)
    }

    /// Sheets still on hand for an entry.
    pub fn remaining(&self, index: usize) -> u32 {
        self.stock
            .get(index)
            .map_or(0, |s| s.quantity.saturating_sub(self.used(index)))
    }

    pub fn is_available(&self, index: usize) -> bool {
        self.stock.get(index).is_some_and(|s| s.eligible) && self.remaining(index) > 0
    }

    /// Available entries in the order the strategy tries them.
    pub fn candidates(&self, strategy: SheetStrategy) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.stock.len()).filter(|&i| self.is_available(i)).collect();
        if strategy == SheetStrategy::SmallestFirst {
            // Stable: equal areas keep listed order
            indices.sort_by(|&a, &b| self.stock[a].area().total_cmp(&self.stock[b].area()));
        }
        indices
    }

    /// Record one sheet taken from an entry.
    pub fn consume(&mut self, index: usize) {
        if let Some(count) = self.used.get_mut(index) {
            *count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock() -> Vec<SheetStock> {
        vec![
            SheetStock::new("LARGE", 2000.0, 1000.0, 2),
            SheetStock::new("SMALL", 1000.0, 500.0, 1),
            SheetStock {
                eligible: false,
                ..SheetStock::new("TINY", 500.0, 250.0, 5)
            },
        ]
    }

    #[test]
    fn test_candidate_order_by_strategy() {
        let stock = stock();
        let supply = StockSupply::new(&stock);
        assert_eq!(supply.candidates(SheetStrategy::SmallestFirst), vec![1, 0]);
        assert_eq!(supply.candidates(SheetStrategy::ListedOrder), vec![0, 1]);
        assert_eq!(supply.candidates(SheetStrategy::BestFit), vec![0, 1]);
    }

    #[test]
    fn test_consumption_is_local() {
        let stock = stock();
        let mut supply = StockSupply::new(&stock);
        supply.consume(1);
        assert!(!supply.is_available(1));
        assert_eq!(supply.candidates(SheetStrategy::SmallestFirst), vec![0]);
        supply.consume(0);
        supply.consume(0);
        assert!(supply.candidates(SheetStrategy::ListedOrder).is_empty());
        // The table itself is untouched
        assert_eq!(stock[0].quantity, 2);
        assert_eq!(supply.remaining(0), 0);
    }
}
