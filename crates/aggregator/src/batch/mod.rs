//! Batch planning: splits a large input set into bounded groups for
//! payload-limited sources.
//!
//! Planning is deterministic: group membership is a pure function of input
//! order and the configured caps, so re-running over identical inputs
//! reproduces the same grouping.

use tracing::warn;

/// Anything the payload-packing variant can weigh.
pub trait Payload {
    fn payload_size(&self) -> u64;
}

impl Payload for u64 {
    fn payload_size(&self) -> u64 {
        *self
    }
}

/// Result of payload-based packing. Groups are ordered, disjoint, non-empty
/// and cover every input exactly once; inputs whose own size exceeds the cap
/// are isolated into single-item groups and additionally listed in
/// `oversized` so callers can surface them; an oversized input is never
/// silently dropped.
#[derive(Debug, Clone)]
pub struct BatchPlan<'a, T> {
    pub groups: Vec<Vec<&'a T>>,
    pub oversized: Vec<&'a T>,
}

#[derive(Debug, Clone)]
pub struct BatchPlanner {
    max_group_size: usize,
    max_group_payload: u64,
}

impl Default for BatchPlanner {
    fn default() -> Self {
        Self {
            max_group_size: 10,
            max_group_payload: 200_000,
        }
    }
}

impl BatchPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_group_size(mut self, max: usize) -> Self {
        self.max_group_size = max.max(1);
        self
    }

    pub fn with_max_group_payload(mut self, max: u64) -> Self {
        self.max_group_payload = max.max(1);
        self
    }

    /// Splits inputs into contiguous groups of at most `max_group_size`
    /// items. A set that fits the cap comes back as a single group; the last
    /// group may be smaller; non-empty input never produces zero groups.
    pub fn plan_by_count<'a, T>(&self, inputs: &'a [T]) -> Vec<&'a [T]> {
        if inputs.is_empty() {
            return Vec::new();
        }
        inputs.chunks(self.max_group_size).collect()
    }

    /// Packs inputs into groups whose cumulative payload stays under
    /// `max_group_payload`; the count cap applies as well. An input alone
    /// above the payload cap becomes its own single-item group and is
    /// flagged in the plan's `oversized` list.
    pub fn plan_by_payload<'a, T: Payload>(&self, inputs: &'a [T]) -> BatchPlan<'a, T> {
        let mut groups: Vec<Vec<&'a T>> = Vec::new();
        let mut oversized: Vec<&'a T> = Vec::new();
        let mut current: Vec<&'a T> = Vec::new();
        let mut current_payload: u64 = 0;

        for input in inputs {
            let size = input.payload_size();

            if size > self.max_group_payload {
                warn!(
                    size,
                    cap = self.max_group_payload,
                    "input exceeds the batch payload cap; isolating it"
                );
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                    current_payload = 0;
                }
                groups.push(vec![input]);
                oversized.push(input);
                continue;
            }

            let over_payload = current_payload + size > self.max_group_payload;
            let over_count = current.len() >= self.max_group_size;
            if !current.is_empty() && (over_payload || over_count) {
                groups.push(std::mem::take(&mut current));
                current_payload = 0;
            }

            current.push(input);
            current_payload += size;
        }

        if !current.is_empty() {
            groups.push(current);
        }

        BatchPlan { groups, oversized }
    }
}
