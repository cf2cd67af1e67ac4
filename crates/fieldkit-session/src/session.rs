use chrono::{DateTime, NaiveDate, Utc};
use fieldkit_core::{
    export_file_name, proximity, render_csv, walking_directions_url, ChecklistItem,
    ExportOutcome, ExportSink, Observation, ObservationDraft, Position, Progress, Proximity,
    SamplingPlan, SamplingPoint, EQUIPMENT_CHECKLIST,
};
use fieldkit_storage::{ChecklistStore, KvStore, ObservationStore, SampleTracker};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::sync::RemoteSync;
use crate::SessionError;

/// What the point panel shows after a selection.
#[derive(Debug, Clone, PartialEq)]
pub struct PointStatus {
    pub point: SamplingPoint,
    pub observation: Option<Observation>,
    pub sample_taken: bool,
    pub proximity: Proximity,
}

impl PointStatus {
    pub fn is_recorded(&self) -> bool {
        self.observation.is_some()
    }

    pub fn summary(&self) -> Option<String> {
        self.observation.as_ref().map(Observation::summary)
    }
}

/// Owns all application state for one field session: plan, stores,
/// selection, last known position and the optional sync adapter.
pub struct FieldSession<K> {
    plan: SamplingPlan,
    observations: ObservationStore<K>,
    samples: SampleTracker<K>,
    checklist: ChecklistStore<K>,
    sync: Option<RemoteSync>,
    pending_sync: Vec<JoinHandle<()>>,
    selected: Option<u32>,
    position: Option<Position>,
}

impl<K: KvStore + Clone> FieldSession<K> {
    pub fn open(plan: SamplingPlan, kv: K, sync: Option<RemoteSync>) -> Result<Self, SessionError> {
        plan.validate()?;
        let observations = ObservationStore::load(kv.clone())?;
        let samples = SampleTracker::load(kv.clone())?;
        let checklist = ChecklistStore::load(kv)?;
        info!(
            event = "session_opened",
            plan = %plan.name,
            points = plan.len(),
            observations = observations.len(),
            sync = sync.is_some()
        );
        Ok(Self {
            plan,
            observations,
            samples,
            checklist,
            sync,
            pending_sync: Vec::new(),
            selected: None,
            position: None,
        })
    }
}

impl<K: KvStore> FieldSession<K> {
    pub fn plan(&self) -> &SamplingPlan {
        &self.plan
    }

    pub fn sync_enabled(&self) -> bool {
        self.sync.is_some()
    }

    fn point(&self, number: u32) -> Result<&SamplingPoint, SessionError> {
        self.plan
            .point(number)
            .ok_or(SessionError::UnknownPoint(number))
    }

    pub fn select_point(&mut self, number: u32) -> Result<PointStatus, SessionError> {
        self.point(number)?;
        self.selected = Some(number);
        debug!(event = "point_selected", point = number);
        self.point_status(number)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_point(&self) -> Option<&SamplingPoint> {
        self.selected.and_then(|number| self.plan.point(number))
    }

    pub fn point_status(&self, number: u32) -> Result<PointStatus, SessionError> {
        let point = self.point(number)?;
        Ok(PointStatus {
            point: point.clone(),
            observation: self.observations.find_by_point(number).cloned(),
            sample_taken: self.samples.is_taken(number),
            proximity: proximity::evaluate(self.position.as_ref(), Some(point)),
        })
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Stores the fix and returns the proximity to the selected point.
    pub fn update_position(&mut self, position: Position) -> Proximity {
        self.position = Some(position);
        self.proximity()
    }

    /// Sensor errors are not fatal; the last fix stays valid.
    pub fn location_error(&self, message: &str) {
        warn!(
            event = "location_error",
            error = message,
            has_fix = self.position.is_some()
        );
    }

    pub fn proximity(&self) -> Proximity {
        proximity::evaluate(self.position.as_ref(), self.selected_point())
    }

    pub fn record_observation(
        &mut self,
        number: u32,
        draft: ObservationDraft,
    ) -> Result<Observation, SessionError> {
        self.record_observation_at(number, draft, Utc::now())
    }

    /// Persists the observation, then hands a copy to the sync adapter
    /// without waiting for it.
    pub fn record_observation_at(
        &mut self,
        number: u32,
        draft: ObservationDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Observation, SessionError> {
        let observation = Observation::new(self.point(number)?, draft, created_at);
        self.observations.upsert(observation.clone())?;
        info!(event = "observation_recorded", point = number, id = %observation.id);

        if let Some(sync) = &self.sync {
            self.pending_sync.retain(|handle| !handle.is_finished());
            if let Some(handle) = sync.publish(observation.clone()) {
                self.pending_sync.push(handle);
            }
        }
        Ok(observation)
    }

    pub fn record_selected(
        &mut self,
        draft: ObservationDraft,
    ) -> Result<Observation, SessionError> {
        let number = self.selected.ok_or(SessionError::NothingSelected)?;
        self.record_observation(number, draft)
    }

    pub fn observation(&self, number: u32) -> Option<&Observation> {
        self.observations.find_by_point(number)
    }

    /// Display listing, ascending by point number.
    pub fn observations(&self) -> Vec<Observation> {
        self.observations.sorted_by_point()
    }

    pub fn mark_sample_taken(&mut self, number: u32) -> Result<(), SessionError> {
        self.point(number)?;
        self.samples.mark_taken(number)?;
        info!(event = "sample_taken", point = number);
        Ok(())
    }

    pub fn is_sample_taken(&self, number: u32) -> bool {
        self.samples.is_taken(number)
    }

    /// Exports in stored order; callers wanting point order sort first.
    pub fn export<S: ExportSink + ?Sized>(
        &self,
        sink: &mut S,
        date: NaiveDate,
    ) -> Result<ExportOutcome, SessionError> {
        let Some(csv) = render_csv(self.observations.list_all()) else {
            info!(event = "export_skipped", reason = "empty");
            return Ok(ExportOutcome::NothingToExport);
        };
        let file_name = export_file_name(date);
        sink.deliver(&file_name, &csv)
            .map_err(|source| SessionError::Export {
                file_name: file_name.clone(),
                source,
            })?;
        let rows = self.observations.len();
        info!(event = "exported", file = %file_name, rows);
        Ok(ExportOutcome::Exported { file_name, rows })
    }

    /// Removes every observation. Sample flags and the checklist are kept.
    pub fn clear_observations(&mut self) -> Result<(), SessionError> {
        self.observations.clear()?;
        info!(event = "observations_cleared");
        Ok(())
    }

    pub fn progress(&self) -> Progress {
        Progress::compute(
            &self.plan,
            |number| self.observations.has_observation(number),
            |number| self.samples.is_taken(number),
        )
    }

    pub fn navigation_url(&self, number: u32) -> Result<String, SessionError> {
        Ok(walking_directions_url(self.point(number)?.location()))
    }

    pub fn checklist(&self) -> Vec<ChecklistItem> {
        self.checklist.items()
    }

    pub fn set_checklist_item(&mut self, index: usize, checked: bool) -> Result<(), SessionError> {
        if index >= EQUIPMENT_CHECKLIST.len() {
            return Err(SessionError::UnknownChecklistItem(index));
        }
        self.checklist.set(index, checked)?;
        Ok(())
    }

    /// Waits for in-flight sync submissions. Only for shutdown.
    pub async fn drain_sync(&mut self) {
        for handle in self.pending_sync.drain(..) {
            if let Err(err) = handle.await {
                warn!(event = "sync_task_aborted", error = %err);
            }
        }
    }
}
