//! Lifecycle events emitted around each phase execution

use crate::error::MigrationError;
use crate::phase::MigrationPhase;
use crate::run::MigrationRun;

/// Observer notified around each phase execution.
///
/// Observers are invoked synchronously, in registration order. All methods
/// default to no-ops.
pub trait MigrationObserver: Send + Sync {
    /// Fired before the phase callback runs
    fn started(&self, _version: &str, _phase: MigrationPhase) {}

    /// Fired after the phase callback and ledger write both completed
    fn succeeded(&self, _version: &str, _phase: MigrationPhase, _run: &MigrationRun) {}

    /// Fired when the phase callback or the ledger write failed; the error
    /// is still propagated to the caller afterwards
    fn failed(&self, _version: &str, _phase: MigrationPhase, _error: &MigrationError) {}
}
