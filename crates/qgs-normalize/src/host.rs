//! Wiring between a host application and the normalizer.
//!
//! The host owns the "current project" and the "project saved" signal. This
//! module only asks it for the active project and registers one callback.

use std::sync::{Arc, Weak};

use tracing::debug;

use crate::errors::NormalizeError;
use crate::locks::PathLocks;
use crate::project::normalize_project;
use crate::project::ProjectFile;
use crate::report::{Outcome, SkipReason};
use crate::writer::WriteOptions;

/// Callback the host invokes after each successful save. Errors are
/// returned to the host, which decides how to surface them.
pub type SavedCallback = Arc<dyn Fn() -> Result<Outcome, NormalizeError> + Send + Sync>;

/// Handle for a registered [`SavedCallback`], issued by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

/// What the normalizer needs from the host application.
pub trait ProjectHost: Send + Sync {
    /// The currently open project, or `None` if there is none.
    fn active_project(&self) -> Option<ProjectFile>;

    /// Registers `callback` for "project saved" notifications.
    fn connect_saved(&self, callback: SavedCallback) -> ConnectionId;

    /// Removes a registration made by [`ProjectHost::connect_saved`].
    fn disconnect_saved(&self, connection: ConnectionId);
}

/// Handles one "project saved" notification.
///
/// Resolves the host's active project and normalizes it while holding that
/// file's lock in `locks`.
pub fn on_document_saved(
    host: &dyn ProjectHost,
    locks: &PathLocks,
    options: &WriteOptions,
) -> Result<Outcome, NormalizeError> {
    let Some(project) = host.active_project() else {
        debug!("save notification without an active project");
        return Ok(Outcome::Skipped {
            reason: SkipReason::NoProject,
        });
    };
    locks.with_lock(&project.path, || normalize_project(&project, options))
}

/// A live registration with a host. Dropping it disconnects.
pub struct Subscription {
    host: Arc<dyn ProjectHost>,
    connection: Option<ConnectionId>,
}

impl Subscription {
    /// Disconnects from the host. Calling it again does nothing.
    pub fn stop(&mut self) {
        if let Some(connection) = self.connection.take() {
            self.host.disconnect_saved(connection);
            debug!(?connection, "disconnected from project saves");
        }
    }

    /// Whether the callback is still registered.
    pub fn is_active(&self) -> bool {
        self.connection.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

/// Subscribes the normalizer to the host's save notifications.
///
/// The registered callback holds the host weakly, so a host that keeps its
/// callbacks does not keep itself alive through them.
pub fn start(host: Arc<dyn ProjectHost>, options: WriteOptions) -> Subscription {
    let weak: Weak<dyn ProjectHost> = Arc::downgrade(&host);
    let locks = PathLocks::new();
    let callback: SavedCallback = Arc::new(move || match weak.upgrade() {
        Some(host) => on_document_saved(host.as_ref(), &locks, &options),
        None => Ok(Outcome::Skipped {
            reason: SkipReason::NoProject,
        }),
    });

    let connection = host.connect_saved(callback);
    debug!(?connection, "connected to project saves");
    Subscription {
        host,
        connection: Some(connection),
    }
}

/// Ends a subscription created by [`start`].
pub fn stop(mut subscription: Subscription) {
    subscription.stop();
}
