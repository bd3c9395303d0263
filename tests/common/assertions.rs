//! Assertion helpers for pipeline tests

use asset_courier::{Event, PublicationState, StateStore};
use std::path::Path;
use tokio::sync::broadcast;

/// Drain every event already queued on `rx`
pub fn drain_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Assert the state file records `location` as published
pub fn assert_published(state_file: &Path, location: &str) {
    let state = StateStore::new(state_file)
        .load()
        .expect("state file should be readable");
    assert_eq!(state, Some(PublicationState::new(location)));
}

/// Assert no state file has been written
pub fn assert_no_state(state_file: &Path) {
    assert!(
        !state_file.exists(),
        "state file {} should not exist",
        state_file.display()
    );
}
