use std::sync::Weak;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::manager::{Inner, KeyManager};

/// Background refresh loop.
///
/// Holds only a weak reference so that dropping the last `KeyManager`
/// ends the loop. The first tick fires one full period after start. Each
/// tick runs on its own task so a slow request does not shift the cadence;
/// `background_tick` drops ticks that would overlap.
pub(crate) async fn run(inner: Weak<Inner>, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let manager = KeyManager::from_inner(inner);
        tokio::spawn(async move { manager.background_tick().await });
    }
}
