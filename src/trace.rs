//! Per-tick trace recording and replay.
//!
//! A [`Trace`] is the list of input/output bundles a transactor saw, one
//! record per tick. Traces are stored as JSON lines (one record per line,
//! `\n` terminated) so they can be diffed and replayed.
//!
//! Because the transactor is deterministic, replaying a trace's inputs into
//! a fresh transactor must reproduce its outputs exactly;
//! [`Trace::replay`] reports the first tick where it does not.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::transactor::{Inputs, Outputs, PacketTransactor};

/// One tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub tick: u64,
    pub inputs: Inputs,
    pub outputs: Outputs,
}

/// Ordered tick records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    records: Vec<TraceRecord>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn push(&mut self, record: TraceRecord) {
        self.records.push(record);
    }

    #[inline]
    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write every record as one JSON line, then flush.
    pub fn write_json_lines<W: Write>(&self, mut writer: W) -> Result<()> {
        for record in &self.records {
            let line = serde_json::to_string(record)?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Parse JSON lines. Blank lines are skipped.
    pub fn read_json_lines<R: BufRead>(reader: R) -> Result<Self> {
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(Self { records })
    }

    /// Tick of the first record that differs from `other`.
    ///
    /// When one trace is a prefix of the other, the first extra record's
    /// tick is returned.
    pub fn first_divergence(&self, other: &Trace) -> Option<u64> {
        let common = self.records.len().min(other.records.len());
        if let Some(index) = (0..common).find(|&i| self.records[i] != other.records[i]) {
            return Some(self.records[index].tick);
        }

        self.records
            .get(common)
            .or_else(|| other.records.get(common))
            .map(|record| record.tick)
    }

    /// Feed the recorded inputs to `transactor` and compare outputs.
    ///
    /// Returns the tick of the first mismatch, or `None` if every output
    /// was reproduced.
    pub fn replay(&self, transactor: &mut PacketTransactor) -> Option<u64> {
        for record in &self.records {
            let outputs = transactor.step(&record.inputs);
            if outputs != record.outputs {
                tracing::debug!(
                    "Replay diverged at tick {}: expected {:?}, got {:?}",
                    record.tick,
                    record.outputs,
                    outputs
                );
                return Some(record.tick);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tick: u64, word: u32) -> TraceRecord {
        let inputs = Inputs {
            inbound_word: word,
            ..Default::default()
        };
        TraceRecord {
            tick,
            inputs,
            outputs: Outputs {
                next_expected_id: 1,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_json_lines_round_trip() {
        let mut trace = Trace::new();
        trace.push(record(0, 5));
        trace.push(record(1, 6));

        let mut buf = Vec::new();
        trace.write_json_lines(&mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with('\n'));

        let parsed = Trace::read_json_lines(buf.as_slice()).unwrap();
        assert_eq!(parsed, trace);
    }

    #[test]
    fn test_read_skips_blank_lines() {
        let mut buf = Vec::new();
        let mut trace = Trace::new();
        trace.push(record(0, 1));
        trace.write_json_lines(&mut buf).unwrap();
        buf.extend_from_slice(b"\n  \n");

        assert_eq!(Trace::read_json_lines(buf.as_slice()).unwrap().len(), 1);
    }

    #[test]
    fn test_read_rejects_garbage() {
        assert!(Trace::read_json_lines(&b"not json\n"[..]).is_err());
    }

    #[test]
    fn test_first_divergence() {
        let mut a = Trace::new();
        let mut b = Trace::new();
        a.push(record(0, 1));
        b.push(record(0, 1));
        assert_eq!(a.first_divergence(&b), None);

        a.push(record(1, 2));
        b.push(record(1, 3));
        assert_eq!(a.first_divergence(&b), Some(1));
    }

    #[test]
    fn test_first_divergence_prefix() {
        let mut a = Trace::new();
        let mut b = Trace::new();
        a.push(record(0, 1));
        b.push(record(0, 1));
        b.push(record(1, 1));
        assert_eq!(a.first_divergence(&b), Some(1));
        assert_eq!(b.first_divergence(&a), Some(1));
    }

    #[test]
    fn test_replay_idle_ticks() {
        let mut trace = Trace::new();
        trace.push(record(0, 0));
        trace.push(record(1, 0));
        assert_eq!(trace.replay(&mut PacketTransactor::new()), None);

        let mut bad = trace.clone();
        bad.push(TraceRecord {
            outputs: Outputs {
                read_address: 9,
                ..record(2, 0).outputs
            },
            ..record(2, 0)
        });
        assert_eq!(bad.replay(&mut PacketTransactor::new()), Some(2));
    }
}
