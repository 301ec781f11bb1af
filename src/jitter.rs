//! Random startup delay, so scheduled clients don't hit the service in lockstep.

use rand::Rng;
use std::time::Duration;

/// Pick a delay uniformly from `[0, max)` using the thread-local CSPRNG.
pub fn random_delay(max: Duration) -> Duration {
    let bound = u64::try_from(max.as_nanos()).unwrap_or(u64::MAX);
    if bound == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(rand::rng().random_range(0..bound))
}

/// Sleep for a random duration below `max`.
pub async fn wait(max: Duration) {
    let delay = random_delay(max);
    tracing::info!("Waiting for {:?} of {:?}", delay, max);
    tokio::time::sleep(delay).await;
}
