//! End-to-end fixture tests for the tracker.
//!
//! Each fixture is a recorded sequence of frames with the identities,
//! counts and track sets expected after every reconciliation.
//!
//! Run with: cargo test fixture

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use rose_tracker::{Detection, TrackId, Tracker, TrackerConfig};

// ============================================================================
// Fixture JSON Schema
// ============================================================================

#[derive(Debug, Deserialize)]
struct Fixture {
    tracker_config: TrackerConfig,
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct Step {
    time: f64,
    inputs: Inputs,
    outputs: Outputs,
}

#[derive(Debug, Deserialize)]
struct Inputs {
    detections: Vec<Detection>,
}

#[derive(Debug, Deserialize)]
struct Outputs {
    /// Ids in returned (confidence-sorted) order.
    ids: Vec<TrackId>,
    count: usize,
    active: Vec<TrackId>,
    inactive: Vec<TrackId>,
}

// ============================================================================
// Test Helpers
// ============================================================================

fn find_testdata_dir() -> PathBuf {
    // Try various locations relative to where tests run
    let candidates = [
        PathBuf::from("testdata/fixtures"),
        PathBuf::from("../testdata/fixtures"),
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/fixtures"),
    ];

    for candidate in &candidates {
        if candidate.exists() {
            return candidate.clone();
        }
    }
    panic!("Could not find testdata/fixtures directory");
}

fn load_fixture(scenario: &str) -> Fixture {
    let testdata_dir = find_testdata_dir();
    let path = testdata_dir.join(format!("fixture_{}.json", scenario));

    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture file {:?}: {}", path, e));

    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture file {:?}: {}", path, e))
}

fn compare_step(step_idx: usize, step: &Step, tracker: &Tracker, ids: &[TrackId], count: usize) -> Result<(), String> {
    let expected = &step.outputs;

    if expected.ids != ids {
        return Err(format!(
            "FIRST DIVERGENCE at step {} (t={}):\n  Expected ids: {:?}\n  Actual ids: {:?}",
            step_idx, step.time, expected.ids, ids
        ));
    }

    if expected.count != count {
        return Err(format!(
            "Step {} (t={}): count mismatch: expected {}, got {}",
            step_idx, step.time, expected.count, count
        ));
    }

    let active: Vec<TrackId> = tracker.registry().active().map(|t| t.id).collect();
    if expected.active != active {
        return Err(format!(
            "Step {} (t={}): active set mismatch: expected {:?}, got {:?}",
            step_idx, step.time, expected.active, active
        ));
    }

    let inactive: Vec<TrackId> = tracker.registry().inactive().map(|t| t.id).collect();
    if expected.inactive != inactive {
        return Err(format!(
            "Step {} (t={}): inactive set mismatch: expected {:?}, got {:?}",
            step_idx, step.time, expected.inactive, inactive
        ));
    }

    Ok(())
}

// ============================================================================
// Fixture Test Runner
// ============================================================================

fn run_fixture_test(scenario: &str) {
    let fixture = load_fixture(scenario);
    let mut tracker = Tracker::new(fixture.tracker_config).expect("Failed to create tracker");

    for (step_idx, step) in fixture.steps.iter().enumerate() {
        let result = tracker.reconcile(step.inputs.detections.clone(), step.time);
        let ids: Vec<TrackId> = result
            .detections
            .iter()
            .map(|det| det.id.expect("every returned detection carries an id"))
            .collect();

        if let Err(msg) = compare_step(step_idx, step, &tracker, &ids, result.count) {
            panic!("{}", msg);
        }
    }

    println!(
        "Fixture test '{}' passed: {} steps verified",
        scenario,
        fixture.steps.len()
    );
}

// ============================================================================
// Test Cases
// ============================================================================

#[test]
fn test_fixture_small() {
    run_fixture_test("small");
}

#[test]
fn test_fixture_two_objects() {
    run_fixture_test("two_objects");
}
