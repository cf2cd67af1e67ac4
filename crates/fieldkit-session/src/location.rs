use fieldkit_core::{Position, Proximity};
use fieldkit_storage::KvStore;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::session::FieldSession;

/// One message from the location sensor.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    Fix(Position),
    Error(String),
}

impl<K: KvStore> FieldSession<K> {
    /// Follows the sensor until the sender side closes, recomputing
    /// proximity after every fix. Returns the number of fixes applied.
    pub async fn run_location_stream<F>(
        &mut self,
        mut events: mpsc::Receiver<LocationEvent>,
        mut on_fix: F,
    ) -> usize
    where
        F: FnMut(&Position, Proximity),
    {
        let mut fixes = 0usize;
        while let Some(event) = events.recv().await {
            match event {
                LocationEvent::Fix(position) => {
                    let proximity = self.update_position(position);
                    fixes += 1;
                    debug!(
                        event = "location_fix",
                        lat = position.lat,
                        lon = position.lon,
                        accuracy_m = position.accuracy_m
                    );
                    on_fix(&position, proximity);
                }
                LocationEvent::Error(message) => self.location_error(&message),
            }
        }
        info!(event = "location_stream_closed", fixes);
        fixes
    }
}
