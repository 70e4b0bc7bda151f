use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;

use qgs_normalize::{
    on_document_saved, start, stop, ConnectionId, NormalizeError, Outcome, PathLocks,
    ProjectFile, ProjectHost, SavedCallback, SkipReason, WriteOptions,
};
use tempfile::TempDir;

/// Stand-in for the host application: one current project and a signal.
#[derive(Default)]
struct FakeHost {
    project: Mutex<Option<ProjectFile>>,
    callbacks: Mutex<HashMap<ConnectionId, SavedCallback>>,
    next_id: Mutex<u64>,
}

impl FakeHost {
    fn with_project(project: ProjectFile) -> Arc<Self> {
        let host = FakeHost::default();
        *host.project.lock().unwrap() = Some(project);
        Arc::new(host)
    }

    /// Fires "project saved" and collects each callback's result.
    fn save(&self) -> Vec<Result<Outcome, NormalizeError>> {
        let callbacks: Vec<SavedCallback> = self.callbacks.lock().unwrap().values().cloned().collect();
        callbacks.iter().map(|callback| callback()).collect()
    }

    fn connections(&self) -> usize {
        self.callbacks.lock().unwrap().len()
    }
}

impl ProjectHost for FakeHost {
    fn active_project(&self) -> Option<ProjectFile> {
        self.project.lock().unwrap().clone()
    }

    fn connect_saved(&self, callback: SavedCallback) -> ConnectionId {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let id = ConnectionId(*next);
        self.callbacks.lock().unwrap().insert(id, callback);
        id
    }

    fn disconnect_saved(&self, connection: ConnectionId) {
        self.callbacks.lock().unwrap().remove(&connection);
    }
}

const PROJECT: &str = r#"<qgis saveUser="alice"><snapping-settings><individual-layer-settings><s id="b"/><s id="a"/></individual-layer-settings></snapping-settings></qgis>"#;
const CANONICAL: &str = r#"<qgis><snapping-settings><individual-layer-settings><s id="a"></s><s id="b"></s></individual-layer-settings></snapping-settings></qgis>"#;

fn temp_project() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("project.qgs");
    fs::write(&path, PROJECT).unwrap();
    (dir, path)
}

#[test]
fn save_event_normalizes_the_active_project() {
    let (_dir, path) = temp_project();
    let host = FakeHost::with_project(ProjectFile::local(&path));

    let subscription = start(host.clone(), WriteOptions::default());
    assert!(subscription.is_active());
    assert_eq!(host.connections(), 1);

    let results = host.save();
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Ok(Outcome::Rewritten { .. })));
    assert_eq!(fs::read_to_string(&path).unwrap(), CANONICAL);

    stop(subscription);
    assert_eq!(host.connections(), 0);
}

#[test]
fn stop_is_idempotent_and_drop_disconnects() {
    let (_dir, path) = temp_project();
    let host = FakeHost::with_project(ProjectFile::local(&path));

    let mut subscription = start(host.clone(), WriteOptions::default());
    subscription.stop();
    subscription.stop();
    assert!(!subscription.is_active());
    assert_eq!(host.connections(), 0);

    {
        let _scoped = start(host.clone(), WriteOptions::default());
        assert_eq!(host.connections(), 1);
    }
    assert_eq!(host.connections(), 0);
}

#[test]
fn saves_after_stop_do_nothing() {
    let (_dir, path) = temp_project();
    let host = FakeHost::with_project(ProjectFile::local(&path));

    stop(start(host.clone(), WriteOptions::default()));
    assert!(host.save().is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap(), PROJECT);
}

#[test]
fn parse_errors_reach_the_host() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.qgs");
    fs::write(&path, "<qgis>").unwrap();
    let host = FakeHost::with_project(ProjectFile::local(&path));

    let _subscription = start(host.clone(), WriteOptions::default());
    let results = host.save();
    assert!(matches!(results[0], Err(NormalizeError::Parse(_))));
    assert_eq!(fs::read_to_string(&path).unwrap(), "<qgis>");
}

#[test]
fn no_active_project_is_skipped() {
    let host = FakeHost::default();
    let outcome = on_document_saved(&host, &PathLocks::new(), &WriteOptions::default()).unwrap();
    assert_eq!(
        outcome,
        Outcome::Skipped {
            reason: SkipReason::NoProject
        }
    );
}

#[test]
fn zipped_active_project_is_skipped() {
    let (_dir, path) = temp_project();
    let host = FakeHost::with_project(ProjectFile {
        path: path.clone(),
        zipped: true,
        local: true,
    });

    let outcome = on_document_saved(&*host, &PathLocks::new(), &WriteOptions::default()).unwrap();
    assert!(matches!(outcome, Outcome::Skipped { reason: SkipReason::Zipped }));
    assert_eq!(fs::read_to_string(&path).unwrap(), PROJECT);
}

#[test]
fn concurrent_saves_of_one_file_serialize() {
    let (_dir, path) = temp_project();
    let host = FakeHost::with_project(ProjectFile::local(&path));
    let locks = Arc::new(PathLocks::new());
    let options = WriteOptions { sync: false };

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let host = Arc::clone(&host);
            let locks = Arc::clone(&locks);
            let options = options.clone();
            thread::spawn(move || on_document_saved(&*host, &locks, &options))
        })
        .collect();

    let mut rewritten = 0;
    for handle in handles {
        match handle.join().unwrap().unwrap() {
            Outcome::Rewritten { .. } => rewritten += 1,
            Outcome::Unchanged { .. } => {}
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(rewritten, 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), CANONICAL);
    assert!(locks.is_empty());
}
