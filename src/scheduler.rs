use crate::{config::ProcessorConfig, database::source::EventSource, processor::run_pass, store::SnapshotStore};
use std::future::Future;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerSummary {
    pub passes: usize,
    pub failures: usize
}

/// Runs a pass every `config.update_interval` until `shutdown` resolves.
///
/// Passes never overlap: a pass that outlasts the interval delays the next
/// tick. The first pass starts immediately. A failed pass is logged and the
/// next tick runs as usual. Shutdown is only observed between passes.
pub async fn run<Src, St>(
    source: &Src,
    store: &St,
    config: &ProcessorConfig,
    shutdown: impl Future<Output = ()>
) -> SchedulerSummary
where
    Src: EventSource,
    St: SnapshotStore
{
    let mut ticker = interval(config.update_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut summary = SchedulerSummary::default();
    info!("Scheduling a pass every {:?}", config.update_interval);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping after {} passes", summary.passes);
                break;
            }
            _ = ticker.tick() => {
                summary.passes += 1;

                if let Err(e) = run_pass(source, store, config).await {
                    summary.failures += 1;
                    error!("Pass failed: {}", e);
                }
            }
        }
    }

    summary
}
