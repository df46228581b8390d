//! Version identifiers for migration units

use chrono::Utc;

/// Produces the version identifier for the next generated migration.
///
/// Versions must be unique within the prepared set and sort
/// lexicographically in creation order.
pub trait VersionProvider: Send + Sync {
    fn next_version(&self) -> String;
}

/// Default provider: current UTC time as a fixed-width `YYYYMMDDHHMMSS`
/// string, which sorts chronologically.
#[derive(Debug, Default)]
pub struct TimestampVersionProvider;

impl VersionProvider for TimestampVersionProvider {
    fn next_version(&self) -> String {
        Utc::now().format("%Y%m%d%H%M%S").to_string()
    }
}
