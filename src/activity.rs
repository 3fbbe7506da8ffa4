//! Activity classification.
//!
//! An edge is *active* when its diff is large relative to its layer's range
//! in the same epoch: `diff / (max_diff - min_diff)` above 0.9 is high
//! activity, above 0.6 is medium. Both thresholds are strict.
//!
//! Edge activity is then attributed to the two nodes the edge touches, so
//! that nodes light up together with their busiest edges.

use crate::scene::Color;
use crate::weight_diff::{DiffRecord, RangeRecord};
use serde::{Deserialize, Serialize};

/// Normalized diff above which an edge is highly active.
pub const HIGH_ACTIVITY_THRESHOLD: f64 = 0.9;

/// Normalized diff above which an edge is moderately active.
pub const MEDIUM_ACTIVITY_THRESHOLD: f64 = 0.6;

/// Edge color for high activity
pub const EDGE_HIGH: Color = Color::rgb(255, 0, 0);
/// Edge color for medium activity
pub const EDGE_MEDIUM: Color = Color::rgb(255, 153, 153);
/// Edge color without activity
pub const EDGE_NEUTRAL: Color = Color::rgb(211, 211, 211);

/// Node fill for high activity
pub const NODE_HIGH: Color = Color::rgba(255, 0, 0, 0.35);
/// Node fill for medium activity
pub const NODE_MEDIUM: Color = Color::rgba(255, 0, 0, 0.175);
/// Node fill without activity
pub const NODE_IDLE: Color = Color::rgba(255, 0, 0, 0.0);

/// Discrete change intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Medium,
    High,
}

impl ActivityLevel {
    /// Numeric intensity: 1.0 for high, 0.5 for medium.
    pub fn value(self) -> f64 {
        match self {
            ActivityLevel::High => 1.0,
            ActivityLevel::Medium => 0.5,
        }
    }

    /// Classify a normalized diff.
    pub fn from_percentage(pct: f64) -> Option<Self> {
        if pct > HIGH_ACTIVITY_THRESHOLD {
            Some(ActivityLevel::High)
        } else if pct > MEDIUM_ACTIVITY_THRESHOLD {
            Some(ActivityLevel::Medium)
        } else {
            None
        }
    }
}

/// An active edge, as seen by node coloring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub layer: usize,
    pub source: usize,
    pub target: usize,
    pub activity: ActivityLevel,
}

/// `diff / (max_diff - min_diff)`.
///
/// An undefined diff or an empty range yields 0, which never classifies as
/// active.
pub fn diff_percentage(diff: Option<f64>, range: &RangeRecord) -> f64 {
    let Some(diff) = diff else {
        return 0.0;
    };
    let span = range.span();
    if span == 0.0 {
        0.0
    } else {
        diff / span
    }
}

/// Activity level of an edge within its layer's range.
pub fn classify(record: &DiffRecord, range: &RangeRecord) -> Option<ActivityLevel> {
    ActivityLevel::from_percentage(diff_percentage(record.diff, range))
}

/// Edge color for an activity level.
pub fn edge_color(level: Option<ActivityLevel>) -> Color {
    match level {
        Some(ActivityLevel::High) => EDGE_HIGH,
        Some(ActivityLevel::Medium) => EDGE_MEDIUM,
        None => EDGE_NEUTRAL,
    }
}

/// Node fill for an activity level.
pub fn node_color(level: Option<ActivityLevel>) -> Color {
    match level {
        Some(ActivityLevel::High) => NODE_HIGH,
        Some(ActivityLevel::Medium) => NODE_MEDIUM,
        None => NODE_IDLE,
    }
}

/// Activity attributed to node `(layer, unit)`.
///
/// A node matches an active edge leaving it (`edge.layer == layer`,
/// `edge.source == unit`) or entering it (`edge.layer == layer - 1`,
/// `edge.target == unit`). The first matching record wins.
pub fn node_activity(layer: usize, unit: usize, activities: &[ActivityRecord]) -> Option<ActivityLevel> {
    activities
        .iter()
        .find(|a| {
            (a.layer == layer && a.source == unit)
                || (layer > 0 && a.layer == layer - 1 && a.target == unit)
        })
        .map(|a| a.activity)
}

/// Classifies one epoch's edges and accumulates its activity records.
#[derive(Debug, Clone, Default)]
pub struct ActivityClassifier {
    activities: Vec<ActivityRecord>,
}

impl ActivityClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `record` against its layer range, recording any activity.
    pub fn observe(&mut self, record: &DiffRecord, range: Option<&RangeRecord>) -> Option<ActivityLevel> {
        let level = range.and_then(|r| classify(record, r));
        if let Some(activity) = level {
            self.activities.push(ActivityRecord {
                layer: record.layer,
                source: record.source,
                target: record.target,
                activity,
            });
        }
        level
    }

    /// Classify a whole epoch, replacing previously accumulated records.
    pub fn classify_epoch(&mut self, records: &[DiffRecord], ranges: &[RangeRecord]) -> &[ActivityRecord] {
        self.clear();
        for record in records {
            self.observe(record, range_for(ranges, record.layer));
        }
        &self.activities
    }

    pub fn activities(&self) -> &[ActivityRecord] {
        &self.activities
    }

    /// Hand over the accumulated records.
    pub fn take(&mut self) -> Vec<ActivityRecord> {
        std::mem::take(&mut self.activities)
    }

    pub fn clear(&mut self) {
        self.activities.clear();
    }
}

/// Range record of `layer`, if present.
pub fn range_for(ranges: &[RangeRecord], layer: usize) -> Option<&RangeRecord> {
    ranges
        .get(layer)
        .filter(|r| r.layer_index == layer)
        .or_else(|| ranges.iter().find(|r| r.layer_index == layer))
}
