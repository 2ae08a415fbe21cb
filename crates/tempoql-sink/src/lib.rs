//! Data-sink boundary.
//!
//! The physical plans produced from transformed ASTs eventually hand result
//! blocks to a sink. The contract is small: put a block, ask for the next
//! block's length, take a block, query the sink's state. Three states steer
//! the scheduler: `CapacityEnough` (keep producing), `CapacityFull` (stop
//! producing until the consumer drains), `NeedSchedule` (the consumer
//! outran the producer; re-queue it when data arrives). Destruction is drop.

use std::collections::VecDeque;

use tempoql_error::{Result, TempoError};
use tracing::debug;

/// Scheduler-visible state of a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkStatus {
    CapacityEnough,
    CapacityFull,
    NeedSchedule,
}

/// Capacity bounds of a sink.
#[derive(Debug, Clone, Copy)]
pub struct SinkConfig {
    /// Hard cap on blocks held at once.
    pub max_blocks: usize,
    /// Per-query cap; producing past this reports `CapacityFull`.
    pub max_blocks_per_query: usize,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            max_blocks: 1024,
            max_blocks_per_query: 128,
        }
    }
}

/// One materialized result block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlock {
    pub num_rows: usize,
    pub payload: Vec<u8>,
}

/// Sink contract between the executor and its consumer.
pub trait DataSink {
    /// Hand a block to the sink. Fails when the sink is at its hard cap.
    fn put(&mut self, block: DataBlock) -> Result<()>;

    /// Byte length of the block the next [`DataSink::take`] returns.
    fn next_len(&self) -> Option<usize>;

    /// Take the oldest block, or `None` when the sink is empty.
    fn take(&mut self) -> Option<DataBlock>;

    /// Current scheduler-visible state.
    fn status(&self) -> SinkStatus;
}

/// Bounded in-memory sink.
#[derive(Debug)]
pub struct BufferedSink {
    config: SinkConfig,
    blocks: VecDeque<DataBlock>,
    /// Set when a consumer drained the sink empty; cleared by the next put.
    starved: bool,
}

impl BufferedSink {
    #[must_use]
    pub fn new(config: SinkConfig) -> Self {
        Self {
            config,
            blocks: VecDeque::new(),
            starved: false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl DataSink for BufferedSink {
    fn put(&mut self, block: DataBlock) -> Result<()> {
        if self.blocks.len() >= self.config.max_blocks {
            return Err(TempoError::SinkAtCapacity {
                held: self.blocks.len(),
                limit: self.config.max_blocks,
            });
        }
        self.blocks.push_back(block);
        if self.starved {
            debug!("sink refilled after starvation, consumer needs rescheduling");
            self.starved = false;
        }
        Ok(())
    }

    fn next_len(&self) -> Option<usize> {
        self.blocks.front().map(|block| block.payload.len())
    }

    fn take(&mut self) -> Option<DataBlock> {
        let block = self.blocks.pop_front();
        if block.is_some() && self.blocks.is_empty() {
            self.starved = true;
        }
        block
    }

    fn status(&self) -> SinkStatus {
        if self.starved && self.blocks.is_empty() {
            SinkStatus::NeedSchedule
        } else if self.blocks.len() >= self.config.max_blocks_per_query {
            SinkStatus::CapacityFull
        } else {
            SinkStatus::CapacityEnough
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(bytes: &[u8]) -> DataBlock {
        DataBlock {
            num_rows: 1,
            payload: bytes.to_vec(),
        }
    }

    fn small_sink() -> BufferedSink {
        BufferedSink::new(SinkConfig {
            max_blocks: 4,
            max_blocks_per_query: 2,
        })
    }

    #[test]
    fn test_put_take_is_fifo() {
        let mut sink = small_sink();
        sink.put(block(b"one")).expect("put");
        sink.put(block(b"two")).expect("put");
        assert_eq!(sink.next_len(), Some(3));
        assert_eq!(sink.take(), Some(block(b"one")));
        assert_eq!(sink.take(), Some(block(b"two")));
        assert_eq!(sink.take(), None);
    }

    #[test]
    fn test_status_reports_capacity_full_at_query_bound() {
        let mut sink = small_sink();
        assert_eq!(sink.status(), SinkStatus::CapacityEnough);
        sink.put(block(b"a")).expect("put");
        assert_eq!(sink.status(), SinkStatus::CapacityEnough);
        sink.put(block(b"b")).expect("put");
        assert_eq!(sink.status(), SinkStatus::CapacityFull);
    }

    #[test]
    fn test_hard_cap_rejects_put() {
        let mut sink = small_sink();
        for _ in 0..4 {
            sink.put(block(b"x")).expect("put");
        }
        assert!(matches!(
            sink.put(block(b"overflow")),
            Err(TempoError::SinkAtCapacity { held: 4, limit: 4 })
        ));
    }

    #[test]
    fn test_drained_sink_needs_scheduling_until_next_put() {
        let mut sink = small_sink();
        sink.put(block(b"only")).expect("put");
        let _block = sink.take().expect("take");
        assert_eq!(sink.status(), SinkStatus::NeedSchedule);

        sink.put(block(b"more")).expect("put");
        assert_eq!(sink.status(), SinkStatus::CapacityEnough);
    }
}
