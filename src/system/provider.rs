use crate::error::Result;

use super::process::ProcessInfo;
use super::snapshot::Snapshot;

/// Source of system metrics handed to the sampler and the ranker.
pub trait MetricsProvider {
    /// Captures one system-wide snapshot.
    fn capture(&mut self) -> Result<Snapshot>;

    /// Lists every currently visible process.
    fn processes(&mut self) -> Result<Vec<ProcessInfo>>;
}

impl<P: MetricsProvider + ?Sized> MetricsProvider for &mut P {
    fn capture(&mut self) -> Result<Snapshot> {
        (**self).capture()
    }

    fn processes(&mut self) -> Result<Vec<ProcessInfo>> {
        (**self).processes()
    }
}
