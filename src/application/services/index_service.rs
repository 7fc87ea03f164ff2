/// Price Index Service
///
/// Applies [`IndexCommand`]s to any [`PriceLevelIndex`] and turns each into an
/// [`IndexOutput`], recording metrics as it goes. Commands are serde-tagged
/// on `op`, so a replay file reads like:
///
/// ```json
/// [
///   {"op": "insert", "side": "bid", "price": 3000150},
///   {"op": "nearest", "side": "bid", "price": 3000100, "direction": "above"},
///   {"op": "summary"}
/// ]
/// ```
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::error::PriceIndexError;
use crate::domain::orderbook::{BookSummary, PriceLevelIndex};
use crate::domain::price_index::{Direction, Side};
use crate::shared::metrics::METRICS;

/// Commands the service accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum IndexCommand {
    Insert { side: Side, price: u64 },
    Remove { side: Side, price: u64 },
    Nearest { side: Side, price: u64, direction: Direction },
    Crosses { side: Side, price: u64 },
    Best { side: Side },
    Levels { side: Side, limit: usize },
    Summary,
}

impl IndexCommand {
    /// Metric label
    pub fn op(&self) -> &'static str {
        match self {
            IndexCommand::Insert { .. } => "insert",
            IndexCommand::Remove { .. } => "remove",
            IndexCommand::Nearest { .. } => "nearest",
            IndexCommand::Crosses { .. } => "crosses",
            IndexCommand::Best { .. } => "best",
            IndexCommand::Levels { .. } => "levels",
            IndexCommand::Summary => "summary",
        }
    }
}

/// Results the service produces, one per command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum IndexOutput {
    /// Insert/remove outcome; `changed` is false for a no-op
    Transition { side: Side, price: u64, changed: bool },
    Price { side: Side, price: Option<u64> },
    Crosses { side: Side, price: u64, crosses: bool },
    Levels { side: Side, prices: Vec<u64> },
    Summary { summary: BookSummary },
    Rejected { op: String, error: String },
}

pub struct PriceIndexService<I: PriceLevelIndex> {
    index: I,
    applied: u64,
    rejected: u64,
}

impl<I: PriceLevelIndex> PriceIndexService<I> {
    pub fn new(index: I) -> Self {
        Self {
            index,
            applied: 0,
            rejected: 0,
        }
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn into_inner(self) -> I {
        self.index
    }

    /// Commands applied successfully
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// Commands rejected with an error
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Applies one command
    pub fn apply(&mut self, command: IndexCommand) -> Result<IndexOutput, PriceIndexError> {
        let op = command.op();
        METRICS.commands_total.with_label_values(&[op]).inc();
        let timer = METRICS.command_duration.with_label_values(&[op]).start_timer();

        let result = self.dispatch(command);
        timer.observe_duration();

        match &result {
            Ok(_) => self.applied += 1,
            Err(err) => {
                self.rejected += 1;
                if let Some(reason) = err.rejection_reason() {
                    METRICS.rejected_prices_total.with_label_values(&[reason]).inc();
                }
                warn!(op, error = %err, "command rejected");
            }
        }
        result
    }

    /// Applies every command in order, turning failures into
    /// [`IndexOutput::Rejected`]
    pub fn run(&mut self, commands: impl IntoIterator<Item = IndexCommand>) -> Vec<IndexOutput> {
        commands
            .into_iter()
            .map(|command| {
                let op = command.op();
                self.apply(command).unwrap_or_else(|err| IndexOutput::Rejected {
                    op: op.to_string(),
                    error: err.to_string(),
                })
            })
            .collect()
    }

    fn dispatch(&mut self, command: IndexCommand) -> Result<IndexOutput, PriceIndexError> {
        match command {
            IndexCommand::Insert { side, price } => {
                let changed = self.index.insert_level(side, price)?;
                self.record_transition(side, "insert", price, changed);
                Ok(IndexOutput::Transition { side, price, changed })
            }
            IndexCommand::Remove { side, price } => {
                let changed = self.index.remove_level(side, price)?;
                self.record_transition(side, "remove", price, changed);
                Ok(IndexOutput::Transition { side, price, changed })
            }
            IndexCommand::Nearest { side, price, direction } => {
                let found = self.index.nearest_price(side, price, direction)?;
                let outcome = if found.is_some() { "found" } else { "none" };
                METRICS
                    .nearest_searches_total
                    .with_label_values(&[direction.as_str(), outcome])
                    .inc();
                Ok(IndexOutput::Price { side, price: found })
            }
            IndexCommand::Crosses { side, price } => Ok(IndexOutput::Crosses {
                side,
                price,
                crosses: self.index.crosses_book(side, price),
            }),
            IndexCommand::Best { side } => Ok(IndexOutput::Price {
                side,
                price: self.index.best(side),
            }),
            IndexCommand::Levels { side, limit } => Ok(IndexOutput::Levels {
                side,
                prices: self.index.levels(side, limit).to_vec(),
            }),
            IndexCommand::Summary => Ok(IndexOutput::Summary {
                summary: self.index.summary(),
            }),
        }
    }

    fn record_transition(&self, side: Side, kind: &str, price: u64, changed: bool) {
        let labels = [side.as_str(), kind];
        if changed {
            METRICS.level_transitions_total.with_label_values(&labels).inc();
        } else {
            METRICS.noop_transitions_total.with_label_values(&labels).inc();
            warn!(side = side.as_str(), kind, price, "level transition was a no-op");
        }
        let active = self.index.active_levels(side);
        METRICS
            .active_levels
            .with_label_values(&[side.as_str()])
            .set(active as f64);
        debug!(side = side.as_str(), kind, price, changed, active, "level transition");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::orderbook::{BookConfig, PriceBook};

    fn service() -> PriceIndexService<PriceBook> {
        PriceIndexService::new(PriceBook::new(BookConfig::new(3_000_000, 2)).unwrap())
    }

    #[test]
    fn test_apply_insert_and_query() {
        let mut service = service();
        let out = service
            .apply(IndexCommand::Insert { side: Side::Bid, price: 3_000_150 })
            .unwrap();
        assert_eq!(
            out,
            IndexOutput::Transition { side: Side::Bid, price: 3_000_150, changed: true }
        );

        let out = service
            .apply(IndexCommand::Nearest {
                side: Side::Bid,
                price: 3_000_100,
                direction: Direction::Above,
            })
            .unwrap();
        assert_eq!(out, IndexOutput::Price { side: Side::Bid, price: Some(3_000_150) });

        let out = service
            .apply(IndexCommand::Crosses { side: Side::Ask, price: 3_000_150 })
            .unwrap();
        assert_eq!(
            out,
            IndexOutput::Crosses { side: Side::Ask, price: 3_000_150, crosses: true }
        );
        assert_eq!(service.applied(), 3);
    }

    #[test]
    fn test_duplicate_insert_reports_unchanged() {
        let mut service = service();
        let insert = IndexCommand::Insert { side: Side::Ask, price: 3_000_001 };
        service.apply(insert.clone()).unwrap();
        let out = service.apply(insert).unwrap();
        assert_eq!(
            out,
            IndexOutput::Transition { side: Side::Ask, price: 3_000_001, changed: false }
        );
        assert_eq!(service.index().active_levels(Side::Ask), 1);
    }

    #[test]
    fn test_run_turns_errors_into_rejections() {
        let mut service = service();
        let outputs = service.run(vec![
            IndexCommand::Insert { side: Side::Bid, price: 0 },
            IndexCommand::Insert { side: Side::Bid, price: 3_000_010 },
            IndexCommand::Best { side: Side::Bid },
        ]);

        assert_eq!(
            outputs[0],
            IndexOutput::Rejected {
                op: "insert".to_string(),
                error: "OutOfDomainPrice(0, 3000000, 14390624)".to_string(),
            }
        );
        assert_eq!(outputs[2], IndexOutput::Price { side: Side::Bid, price: Some(3_000_010) });
        assert_eq!((service.applied(), service.rejected()), (2, 1));
    }

    #[test]
    fn test_rejections_counted_by_reason() {
        let counter = |reason: &str| {
            METRICS.rejected_prices_total.with_label_values(&[reason]).get()
        };
        let (below, above) = (counter("below_min"), counter("above_max"));

        let mut service = service();
        service.run(vec![
            IndexCommand::Remove { side: Side::Ask, price: 2_999_999 },
            IndexCommand::Insert { side: Side::Bid, price: 14_390_625 },
            IndexCommand::Nearest {
                side: Side::Bid,
                price: u64::MAX,
                direction: Direction::Below,
            },
        ]);

        // the registry is global, other tests may add to it
        assert!(counter("below_min") >= below + 1.0);
        assert!(counter("above_max") >= above + 2.0);
    }

    #[test]
    fn test_levels_and_summary() {
        let mut service = service();
        service.run(vec![
            IndexCommand::Insert { side: Side::Ask, price: 3_000_300 },
            IndexCommand::Insert { side: Side::Ask, price: 3_000_200 },
            IndexCommand::Insert { side: Side::Bid, price: 3_000_100 },
        ]);

        let out = service.apply(IndexCommand::Levels { side: Side::Ask, limit: 5 }).unwrap();
        assert_eq!(
            out,
            IndexOutput::Levels { side: Side::Ask, prices: vec![3_000_200, 3_000_300] }
        );

        match service.apply(IndexCommand::Summary).unwrap() {
            IndexOutput::Summary { summary } => {
                assert_eq!(summary.max_bid, Some(3_000_100));
                assert_eq!(summary.min_ask, Some(3_000_200));
                assert_eq!(summary.ask_levels, 2);
            }
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_command_json_format() {
        let json = r#"[
            {"op": "insert", "side": "bid", "price": 3000150},
            {"op": "nearest", "side": "ask", "price": 3000000, "direction": "below"},
            {"op": "levels", "side": "bid", "limit": 3},
            {"op": "summary"}
        ]"#;
        let commands: Vec<IndexCommand> = serde_json::from_str(json).unwrap();
        assert_eq!(commands.len(), 4);
        assert_eq!(commands[0], IndexCommand::Insert { side: Side::Bid, price: 3_000_150 });
        assert_eq!(commands[3], IndexCommand::Summary);

        let out = IndexOutput::Price { side: Side::Ask, price: None };
        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"{"result":"price","side":"ask","price":null}"#
        );
    }
}
