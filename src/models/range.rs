// Scan ranges: one labelled subnet per location

use serde::{Deserialize, Serialize};

use crate::error::RangeSetError;

/// A named network segment to scan. Identity is `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeDescriptor {
    pub label: String,
    pub subnet_spec: String,
}

impl RangeDescriptor {
    pub fn new(label: impl Into<String>, subnet_spec: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            subnet_spec: subnet_spec.into(),
        }
    }
}

/// Ordered set of ranges keyed by label. Labels are unique and non-empty; subnets non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSet {
    ranges: Vec<RangeDescriptor>,
}

impl RangeSet {
    pub fn from_descriptors(ranges: Vec<RangeDescriptor>) -> Result<Self, RangeSetError> {
        let mut set = Self::default();
        for range in ranges {
            set.insert(range)?;
        }
        Ok(set)
    }

    /// Appends a range; rejects an empty label or subnet, and a label already present.
    pub fn insert(&mut self, range: RangeDescriptor) -> Result<(), RangeSetError> {
        if range.label.is_empty() {
            return Err(RangeSetError::EmptyLabel);
        }
        if range.subnet_spec.trim().is_empty() {
            return Err(RangeSetError::EmptySubnet(range.label));
        }
        if self.get(&range.label).is_some() {
            return Err(RangeSetError::DuplicateLabel(range.label));
        }
        self.ranges.push(range);
        Ok(())
    }

    /// Removes the range with this label. Returns false if no such range exists.
    pub fn remove(&mut self, label: &str) -> bool {
        let before = self.ranges.len();
        self.ranges.retain(|r| r.label != label);
        self.ranges.len() != before
    }

    pub fn get(&self, label: &str) -> Option<&RangeDescriptor> {
        self.ranges.iter().find(|r| r.label == label)
    }

    pub fn descriptors(&self) -> &[RangeDescriptor] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
