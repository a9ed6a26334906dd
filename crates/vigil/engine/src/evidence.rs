//! Incremental evidence aggregation
//!
//! Fragments arrive one at a time, in any order, possibly duplicated.
//! Each one carries a (pipeline, sensor, value) triple. The aggregator
//! stores the latest value per slot and keeps a derived joint value per
//! pipeline current: the product over that pipeline's sensor values, so
//! a pipeline with a single fragment of `0.04` has joint value `0.04`
//! and the empty product is `1.0`.

use tracing::debug;
use vigil_types::{Candidate, FragmentNote, JointMetricConfig};

/// How far evidence collection has progressed against the expected set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completeness {
    /// Fewer fragments than expected
    Incomplete,
    /// Exactly one fragment per (pipeline, sensor) slot
    Complete,
    /// More fragments than slots, an upstream anomaly
    Excess,
}

/// Store one fragment and refresh the owning pipeline's joint value.
///
/// A repeated (pipeline, sensor) slot overwrites the previous value; the
/// joint value is recomputed either way. Returns whether the stored value
/// changed.
pub fn record_fragment(candidate: &mut Candidate, fragment: &FragmentNote) -> bool {
    let slot = candidate
        .fragments
        .entry(fragment.pipeline.clone())
        .or_default();
    let previous = slot.insert(fragment.sensor.clone(), fragment.value);
    let changed = previous != Some(fragment.value);

    let joint = recompute_joint(candidate, &fragment.pipeline);
    debug!(
        id = %candidate.id,
        pipeline = %fragment.pipeline,
        sensor = %fragment.sensor,
        value = fragment.value,
        joint,
        "evidence fragment recorded"
    );
    if changed {
        candidate.touch();
    }
    changed
}

/// Recompute and store the joint value for one pipeline: the product of
/// its per-sensor values.
pub fn recompute_joint(candidate: &mut Candidate, pipeline: &str) -> f64 {
    let joint = candidate
        .fragments
        .get(pipeline)
        .map(|sensors| sensors.values().product())
        .unwrap_or(1.0);
    candidate.joint_values.insert(pipeline.to_string(), joint);
    joint
}

/// Number of fragments recorded so far, across all pipelines.
pub fn fragment_count(candidate: &Candidate) -> usize {
    candidate.fragments.values().map(|s| s.len()).sum()
}

/// Number of fragments a complete evidence set contains: one per
/// configured pipeline per candidate sensor.
pub fn expected_count(cfg: &JointMetricConfig, candidate: &Candidate) -> usize {
    cfg.pipelines.len() * candidate.sensors.len()
}

/// Classify the current fragment count against the expected one.
pub fn completeness(cfg: &JointMetricConfig, candidate: &Candidate) -> Completeness {
    let have = fragment_count(candidate);
    let want = expected_count(cfg, candidate);
    match have.cmp(&want) {
        std::cmp::Ordering::Less => Completeness::Incomplete,
        std::cmp::Ordering::Equal => Completeness::Complete,
        std::cmp::Ordering::Greater => Completeness::Excess,
    }
}

/// The minimum joint value over the configured pipelines that have
/// reported at least one fragment. `None` until any fragment arrives.
pub fn min_joint(cfg: &JointMetricConfig, candidate: &Candidate) -> Option<f64> {
    cfg.pipelines
        .iter()
        .filter_map(|p| candidate.joint_values.get(p).copied())
        .fold(None, |acc, v| {
            Some(match acc {
                Some(m) if m <= v => m,
                _ => v,
            })
        })
}
