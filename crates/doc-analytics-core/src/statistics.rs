//! Advisory aggregate statistics.
//!
//! A failed refresh keeps the previous snapshot; statistics are never
//! required for the rest of the workspace to function.

use crate::error::Result;
use crate::models::Statistics;
use crate::sequence::{SequenceGate, Settled, Ticket};

/// Share of `count` in `total`, in percent. A zero total is treated as one,
/// so an empty library yields 0% rather than a division error.
pub fn percentage(count: u64, total: u64) -> f64 {
    count as f64 / total.max(1) as f64 * 100.0
}

/// One row of the classification breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionRow {
    pub label: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default)]
pub struct StatisticsView {
    current: Option<Statistics>,
    gate: SequenceGate,
}

impl StatisticsView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest applied snapshot; `None` before the first successful refresh.
    pub fn current(&self) -> Option<&Statistics> {
        self.current.as_ref()
    }

    pub fn begin_refresh(&mut self) -> Ticket {
        self.gate.issue()
    }

    pub fn settle_refresh(&mut self, ticket: Ticket, result: Result<Statistics>) -> Result<Settled> {
        self.gate.settle(ticket, result, |stats| self.current = Some(stats))
    }

    pub fn percentage(&self, count: u64) -> f64 {
        percentage(count, self.current.as_ref().map_or(0, |s| s.total_documents))
    }

    /// Classification counts, largest first; ties ordered by label.
    pub fn distribution(&self) -> Vec<DistributionRow> {
        let Some(stats) = self.current.as_ref() else {
            return Vec::new();
        };
        let mut rows: Vec<DistributionRow> = stats
            .classification_distribution
            .iter()
            .map(|(label, &count)| DistributionRow {
                label: label.clone(),
                count,
                percentage: percentage(count, stats.total_documents),
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
        rows
    }
}
