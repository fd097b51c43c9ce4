//! Test utilities & fixtures.
//! Every fixture opens a fresh sled world in its own temp dir.

use mushgrid::config::WorldConfig;
use mushgrid::mush::{MushProcessor, MushStore, MushStoreBuilder};
use mushgrid::session::SessionHub;
use tempfile::TempDir;

/// A seeded store (Limbo at the origin) in a temp dir. Keep the `TempDir` alive.
#[allow(dead_code)]
pub fn seeded_store() -> (TempDir, MushStore) {
    let tmp = TempDir::new().expect("tempdir");
    let store = MushStoreBuilder::new(tmp.path().join("world"))
        .open()
        .expect("open store");
    (tmp, store)
}

/// A hub over a fresh world with default world settings.
#[allow(dead_code)]
pub fn hub() -> (TempDir, SessionHub) {
    hub_with(WorldConfig::default())
}

/// A hub over a fresh world with custom world settings.
#[allow(dead_code)]
pub fn hub_with(world: WorldConfig) -> (TempDir, SessionHub) {
    let (tmp, store) = seeded_store();
    let processor = MushProcessor::new(store, world);
    (tmp, SessionHub::new(processor, "Welcome to the test world."))
}

/// Connect `name` and return their session key.
#[allow(dead_code)]
pub fn join(hub: &mut SessionHub, name: &str) -> String {
    let (username, _greeting) = hub.connect(name).expect("connect");
    username
}

/// Send several lines, returning the reply to the last one.
#[allow(dead_code)]
pub fn send_all(hub: &mut SessionHub, username: &str, lines: &[&str]) -> String {
    let mut last = String::new();
    for line in lines {
        last = hub.handle_input(username, line);
    }
    last
}
