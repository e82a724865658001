//! Fetch scheduler
//!
//! Cycles the station worklist at a fixed cadence, one reconciliation per
//! tick, wrapping around. Strictly sequential: the cadence is rate-limit
//! courtesy toward the upstream services, not a throughput ceiling.

use std::sync::Arc;
use std::time::Duration;

use slog::{info, Logger};
use time::OffsetDateTime;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::fusion::FusionEngine;
use crate::state::FusionState;

pub struct Scheduler {
    logger: Logger,
    engine: FusionEngine,
    state: Arc<FusionState>,
    delay: Duration,
}

impl Scheduler {
    pub fn new(
        logger: Logger,
        engine: FusionEngine,
        state: Arc<FusionState>,
        delay: Duration,
    ) -> Scheduler {
        Scheduler {
            logger,
            engine,
            state,
            delay,
        }
    }

    /// Run until cancelled. Network fetches happen outside the state lock;
    /// only the commit of a winning observation takes it.
    pub async fn run(self, cancel: CancellationToken) {
        let worklist = self.state.worklist().await;
        if worklist.is_empty() {
            info!(self.logger, "no stations to poll");
            return;
        }
        info!(
            self.logger,
            "polling {} stations every {:?}",
            worklist.len(),
            self.delay
        );

        let mut ticker = interval(self.delay);
        let mut index = 0usize;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(self.logger, "scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let (station_id, kind) = &worklist[index % worklist.len()];
                    index = index.wrapping_add(1);

                    let now = OffsetDateTime::now_utc();
                    if let Some(obs) = self.engine.reconcile(station_id, *kind, now).await {
                        self.state.commit(station_id, obs, now).await;
                    }
                }
            }
        }
    }
}
