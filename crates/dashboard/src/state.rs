//! Shared dashboard state
//!
//! One coarse lock over the whole station table. The polling side holds it
//! only to commit a reconciled observation; the render side holds it only
//! to clone a consistent snapshot. Neither ever holds it across a network
//! call, so a frame may mix polling cycles across stations but never sees
//! a single station mid-update.

use std::collections::BTreeMap;
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::{watch, Mutex};

use crate::observation::NormalizedObservation;
use crate::stations::{Station, StationKind};

pub struct FusionState {
    table: Mutex<BTreeMap<String, Station>>,
    changed: watch::Sender<u64>,
}

impl FusionState {
    /// Build the shared state plus the change-notification receiver the
    /// render loop listens on.
    pub fn new(stations: Vec<Station>) -> (Arc<FusionState>, watch::Receiver<u64>) {
        let table = stations
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect::<BTreeMap<_, _>>();
        let (changed, receiver) = watch::channel(0);
        (
            Arc::new(FusionState {
                table: Mutex::new(table),
                changed,
            }),
            receiver,
        )
    }

    /// Fixed, sorted fetch order for the scheduler
    pub async fn worklist(&self) -> Vec<(String, StationKind)> {
        let table = self.table.lock().await;
        table
            .values()
            .map(|s| (s.id.clone(), s.kind))
            .collect()
    }

    /// Commit a winning observation for one station
    pub async fn commit(&self, station_id: &str, obs: NormalizedObservation, now: OffsetDateTime) {
        {
            let mut table = self.table.lock().await;
            if let Some(station) = table.get_mut(station_id) {
                station.commit(obs, now);
            }
        }
        self.changed.send_modify(|n| *n += 1);
    }

    /// Clone a consistent snapshot for rendering
    pub async fn snapshot(&self) -> Vec<Station> {
        let table = self.table.lock().await;
        table.values().cloned().collect()
    }
}
