//! Session controller: the engine plus everything that runs beside it.
//!
//! After every operation the tick driver and the wake lock are brought in
//! line with the engine: a running countdown has exactly one live ticker
//! for its current run, a paused one has none.

use chrono::Utc;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::{QueueError, ReportError, WakeLockError};
use crate::events::{Event, NoticeLevel};
use crate::integrations::{report_notice, SessionReport};
use crate::queue::{CategoryChoice, SequenceKey, Selection, TaskChoice, TaskQueue};
use crate::settings::{Settings, DEFAULT_WORK_MINUTES};
use crate::timer::{SessionPhase, Tick, TickDriver, TimerEngine, TimerSnapshot};
use crate::wake::{NoWakeLock, WakeLock};

pub struct FocusController<W: WakeLock = NoWakeLock> {
    engine: TimerEngine,
    queue: TaskQueue,
    selection: Selection,
    driver: TickDriver,
    wake: W,
    wake_held: bool,
    visible: bool,
}

impl<W: WakeLock> FocusController<W> {
    /// Must be called inside a Tokio runtime; ticks arrive on the returned
    /// receiver and are fed back through [`Self::on_tick`].
    pub fn new(settings: Settings, wake: W) -> (Self, UnboundedReceiver<Tick>) {
        let (driver, ticks) = TickDriver::new();
        (Self::with_driver(settings, wake, driver), ticks)
    }

    pub fn with_driver(settings: Settings, wake: W, driver: TickDriver) -> Self {
        Self {
            engine: TimerEngine::new(settings),
            queue: TaskQueue::new(),
            selection: Selection::default(),
            driver,
            wake,
            wake_held: false,
            visible: true,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn wake_lock(&self) -> &W {
        &self.wake
    }

    pub fn wake_held(&self) -> bool {
        self.wake_held
    }

    pub fn ticker_live(&self) -> bool {
        self.driver.is_live()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.engine.snapshot()
    }

    /// `"Running: {name}"` for the active (or else selected) task.
    pub fn current_task_label(&self) -> String {
        let name = self
            .queue
            .active()
            .map(|t| t.name.as_str())
            .or_else(|| self.selection.task_name());
        match name {
            Some(name) => format!("Running: {name}"),
            None => "Ready to Focus".to_string(),
        }
    }

    pub fn next_task_label(&self) -> Option<String> {
        self.queue
            .next_after_active()
            .map(|t| format!("Up Next: {}", t.name))
    }

    // ── Timer ────────────────────────────────────────────────────────

    pub fn toggle_main_action(&mut self) -> Vec<Event> {
        let events = self.engine.toggle_main_action();
        self.finish(events)
    }

    /// The caller sends the returned report, if any, and passes the result
    /// to [`Self::report_outcome`].
    pub fn toggle_long_break_or_reset(&mut self) -> (Vec<Event>, Option<SessionReport>) {
        let action = self
            .engine
            .toggle_long_break_or_reset(self.selection.task_id());
        (self.finish(action.events), action.report)
    }

    pub fn start(&mut self) -> Vec<Event> {
        let events = self.engine.start();
        self.finish(events)
    }

    pub fn pause(&mut self) -> Vec<Event> {
        let events = self.engine.pause().into_iter().collect();
        self.finish(events)
    }

    pub fn reset(&mut self) -> Vec<Event> {
        let events = self.engine.reset();
        self.finish(events)
    }

    pub fn enter_phase_named(&mut self, name: &str, reset_gross_work: bool) -> Vec<Event> {
        let events = self.engine.enter_phase_named(name, reset_gross_work);
        self.finish(events)
    }

    /// Refresh settings without touching the countdown.
    pub fn replace_settings(&mut self, settings: Settings) {
        self.engine.replace_settings(settings);
    }

    /// Refresh settings and, while paused, re-size the current phase.
    pub fn apply_settings(&mut self, settings: Settings) -> Vec<Event> {
        let events = self.engine.apply_settings(settings);
        self.finish(events)
    }

    /// Feed one tick from the driver. Stale ticks and ticks that arrive
    /// while paused are dropped.
    pub fn on_tick(&mut self, tick: Tick) -> Vec<Event> {
        if !self.driver.is_current(&tick) || !self.engine.is_running() {
            tracing::debug!(generation = tick.generation, "dropping stale tick");
            return Vec::new();
        }
        let events = self.engine.tick().into_iter().collect();
        self.finish(events)
    }

    /// Notification for a finished report. Timer state is untouched.
    pub fn report_outcome(&self, result: &Result<(), ReportError>) -> Event {
        if let Err(e) = result {
            tracing::error!(error = %e, "Error sending data to LifeUp");
        }
        report_notice(result)
    }

    // ── Selection ────────────────────────────────────────────────────

    pub fn select_category(&mut self, category: Option<CategoryChoice>) {
        self.selection.select_category(category);
    }

    pub fn select_task(&mut self, task: Option<TaskChoice>) {
        self.selection.select_task(task);
    }

    // ── Queue ────────────────────────────────────────────────────────

    /// Queue the current selection with the configured work length.
    pub fn enqueue_selected(&mut self) -> Vec<Event> {
        let minutes = self.engine.settings().work_minutes;
        match self.queue.enqueue(
            self.selection.category.as_ref(),
            self.selection.task.as_ref(),
            minutes,
        ) {
            Some(_) => vec![self.queue_changed()],
            None => Vec::new(),
        }
    }

    pub fn remove_task(&mut self, key: SequenceKey) -> Result<Vec<Event>, QueueError> {
        self.queue.remove(key)?;
        Ok(vec![self.queue_changed()])
    }

    pub fn reorder_tasks(&mut self, order: &[SequenceKey]) -> Result<Vec<Event>, QueueError> {
        self.queue.reorder(order)?;
        Ok(vec![self.queue_changed()])
    }

    pub fn move_task(&mut self, from: usize, to: usize) -> Result<Vec<Event>, QueueError> {
        self.queue.move_entry(from, to)?;
        Ok(vec![self.queue_changed()])
    }

    pub fn shuffle_tasks(&mut self) -> Vec<Event> {
        self.queue.shuffle();
        vec![self.queue_changed()]
    }

    /// Change a queued task's length. Applies to the next Work entry of the
    /// active task, never to a countdown in progress.
    pub fn set_task_duration(
        &mut self,
        key: SequenceKey,
        minutes: i64,
    ) -> Result<Vec<Event>, QueueError> {
        let accepted = self.queue.set_duration(key, minutes)?;
        let mut events = Vec::new();
        if i64::from(accepted) != minutes {
            events.push(Event::notice(
                NoticeLevel::Warning,
                format!("Invalid duration {minutes}. Reverted to {DEFAULT_WORK_MINUTES} minutes."),
            ));
        }
        if self.queue.active_key() == Some(key) {
            self.engine.set_task_minutes(Some(accepted));
        }
        events.push(self.queue_changed());
        Ok(events)
    }

    /// Bind a queued task and start a fresh Work phase sized to it.
    pub fn start_task(&mut self, key: SequenceKey) -> Result<Vec<Event>, QueueError> {
        let task = self.queue.bind_active(key)?.clone();
        tracing::info!(task_id = %task.id, minutes = task.planned_minutes, "starting queued task");

        self.engine.set_task_minutes(Some(task.planned_minutes));
        self.selection.select_category(Some(CategoryChoice {
            id: task.category_id.clone(),
            name: task.category_name.clone(),
            color: Some(task.color.clone()),
            kind: None,
        }));
        self.selection.select_task(Some(TaskChoice {
            id: task.id.clone(),
            name: task.name.clone(),
        }));

        let mut events = vec![Event::TaskBound {
            key,
            task_id: task.id,
            name: task.name,
            planned_minutes: task.planned_minutes,
            at: Utc::now(),
        }];
        events.extend(self.engine.enter_phase(SessionPhase::Work, true));
        events.extend(self.engine.start());
        events.push(self.queue_changed());
        Ok(self.finish(events))
    }

    /// Start whatever [`TaskQueue::next_after_active`] points at.
    pub fn start_next_task(&mut self) -> Result<Vec<Event>, QueueError> {
        match self.queue.next_after_active().map(|t| t.sequence_key) {
            Some(key) => self.start_task(key),
            None => Ok(vec![Event::notice(NoticeLevel::Info, "No next task in queue.")]),
        }
    }

    // ── Host lifecycle ───────────────────────────────────────────────

    /// The page was hidden or shown again.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if visible {
            if self.engine.is_running() {
                self.acquire_wake();
            }
        } else {
            self.release_wake();
        }
    }

    /// Stop ticking and let go of the wake lock.
    pub fn shutdown(&mut self) {
        self.driver.stop();
        self.release_wake();
    }

    // ── Internals ────────────────────────────────────────────────────

    fn queue_changed(&self) -> Event {
        Event::QueueChanged {
            len: self.queue.len(),
            at: Utc::now(),
        }
    }

    /// Align driver and wake lock with the engine, then append a snapshot.
    fn finish(&mut self, mut events: Vec<Event>) -> Vec<Event> {
        if self.engine.is_running() {
            let epoch = self.engine.run_epoch();
            if self.driver.generation() != Some(epoch) {
                self.driver.start(epoch);
            }
            self.acquire_wake();
        } else {
            self.driver.stop();
            self.release_wake();
        }
        events.push(self.engine.snapshot_event());
        events
    }

    fn acquire_wake(&mut self) {
        if self.wake_held || !self.visible {
            return;
        }
        match self.wake.request() {
            Ok(()) => {
                self.wake_held = true;
                tracing::debug!("wake lock acquired");
            }
            Err(WakeLockError::Unsupported) => {
                tracing::debug!("wake lock not supported");
            }
            Err(e) => {
                tracing::warn!(error = %e, "wake lock request failed");
            }
        }
    }

    fn release_wake(&mut self) {
        if self.wake_held {
            self.wake.release();
            self.wake_held = false;
            tracing::debug!("wake lock released");
        }
    }
}

impl<W: WakeLock> Drop for FocusController<W> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct RecordingWake {
        requests: u32,
        releases: u32,
        refuse: bool,
    }

    impl WakeLock for RecordingWake {
        fn request(&mut self) -> Result<(), WakeLockError> {
            self.requests += 1;
            if self.refuse {
                Err(WakeLockError::Refused("battery saver".into()))
            } else {
                Ok(())
            }
        }

        fn release(&mut self) {
            self.releases += 1;
        }
    }

    fn category() -> CategoryChoice {
        CategoryChoice {
            id: "1".into(),
            name: "Study".into(),
            color: None,
            kind: Some(0),
        }
    }

    fn queue_task(ctl: &mut FocusController<RecordingWake>, id: &str, name: &str) -> SequenceKey {
        ctl.select_category(Some(category()));
        ctl.select_task(Some(TaskChoice {
            id: id.into(),
            name: name.into(),
        }));
        let events = ctl.enqueue_selected();
        assert!(matches!(events.as_slice(), [Event::QueueChanged { .. }]));
        ctl.queue().iter().last().map(|t| t.sequence_key).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn main_action_starts_ticker_and_wake_lock() {
        let (mut ctl, mut ticks) = FocusController::new(Settings::default(), RecordingWake::default());
        assert!(!ctl.ticker_live());

        let events = ctl.toggle_main_action();
        assert!(matches!(events.last(), Some(Event::StateSnapshot { .. })));
        assert!(ctl.ticker_live());
        assert!(ctl.wake_held());
        assert_eq!(ctl.wake_lock().requests, 1);

        let tick = ticks.recv().await.unwrap();
        ctl.on_tick(tick);
        assert_eq!(ctl.snapshot().remaining_secs, 1499);

        ctl.pause();
        assert!(!ctl.ticker_live());
        assert!(!ctl.wake_held());
        assert_eq!(ctl.wake_lock().releases, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_ticks_are_dropped() {
        let (mut ctl, _ticks) = FocusController::new(Settings::default(), NoWakeLock);
        ctl.toggle_main_action();
        let stale = Tick {
            generation: ctl.engine().run_epoch() + 10,
        };
        assert!(ctl.on_tick(stale).is_empty());

        ctl.pause();
        let current = Tick {
            generation: ctl.engine().run_epoch(),
        };
        assert!(ctl.on_tick(current).is_empty());
        assert_eq!(ctl.snapshot().remaining_secs, 1500);
    }

    #[tokio::test(start_paused = true)]
    async fn phase_change_restarts_ticker_generation() {
        let (mut ctl, _ticks) = FocusController::new(Settings::default(), NoWakeLock);
        ctl.toggle_main_action();
        let first = ctl.engine().run_epoch();
        for _ in 0..600 {
            ctl.on_tick(Tick { generation: first });
        }
        ctl.toggle_main_action();
        assert_eq!(ctl.engine().phase(), SessionPhase::Break);
        assert!(ctl.ticker_live());
        assert!(ctl.on_tick(Tick { generation: first }).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn break_expiry_stops_ticker_and_releases_wake() {
        let (mut ctl, _ticks) = FocusController::new(Settings::default(), RecordingWake::default());
        ctl.toggle_main_action();
        let work = ctl.engine().run_epoch();
        for _ in 0..6 {
            ctl.on_tick(Tick { generation: work });
        }
        ctl.toggle_main_action();
        let brk = ctl.engine().run_epoch();
        assert_eq!(ctl.snapshot().duration_secs, 2);

        ctl.on_tick(Tick { generation: brk });
        ctl.on_tick(Tick { generation: brk });
        let events = ctl.on_tick(Tick { generation: brk });
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::PhaseExpired { .. })));
        assert!(!ctl.ticker_live());
        assert!(!ctl.wake_held());
    }

    #[tokio::test(start_paused = true)]
    async fn hidden_page_releases_and_reacquires() {
        let (mut ctl, _ticks) = FocusController::new(Settings::default(), RecordingWake::default());
        ctl.toggle_main_action();
        ctl.set_visible(false);
        assert!(!ctl.wake_held());
        assert!(ctl.ticker_live());

        ctl.set_visible(true);
        assert!(ctl.wake_held());
        assert_eq!(ctl.wake_lock().requests, 2);

        ctl.shutdown();
        assert!(!ctl.ticker_live());
        assert!(!ctl.wake_held());
    }

    #[tokio::test(start_paused = true)]
    async fn refused_wake_lock_does_not_block_timer() {
        let wake = RecordingWake {
            refuse: true,
            ..RecordingWake::default()
        };
        let (mut ctl, _ticks) = FocusController::new(Settings::default(), wake);
        ctl.toggle_main_action();
        assert!(ctl.engine().is_running());
        assert!(!ctl.wake_held());
    }

    #[tokio::test(start_paused = true)]
    async fn start_task_binds_selection_and_sizes_work() {
        let (mut ctl, _ticks) = FocusController::new(Settings::default(), RecordingWake::default());
        let a = queue_task(&mut ctl, "10", "Read");
        let b = queue_task(&mut ctl, "11", "Write");
        ctl.set_task_duration(b, 40).unwrap();

        let events = ctl.start_task(b).unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            Event::TaskBound { planned_minutes: 40, .. }
        )));
        assert!(ctl.engine().is_running());
        assert_eq!(ctl.snapshot().duration_secs, 2400);
        assert_eq!(ctl.selection().task_id(), Some("11"));
        assert_eq!(ctl.current_task_label(), "Running: Write");
        assert_eq!(ctl.next_task_label().as_deref(), Some("Up Next: Read"));

        ctl.start_next_task().unwrap();
        assert_eq!(ctl.queue().active_key(), Some(a));
        assert_eq!(ctl.snapshot().duration_secs, 1500);
        assert_eq!(ctl.queue().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn next_after_removed_active_task_does_nothing() {
        let (mut ctl, _ticks) = FocusController::new(Settings::default(), RecordingWake::default());
        queue_task(&mut ctl, "10", "Read");
        let b = queue_task(&mut ctl, "11", "Write");
        queue_task(&mut ctl, "12", "Edit");
        ctl.start_task(b).unwrap();
        ctl.remove_task(b).unwrap();

        assert!(ctl.next_task_label().is_none());
        let events = ctl.start_next_task().unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            Event::Notification { message, .. } if message == "No next task in queue."
        )));
        assert_eq!(ctl.queue().active_key(), Some(b));
    }

    #[tokio::test(start_paused = true)]
    async fn editing_active_duration_waits_for_next_work_entry() {
        let (mut ctl, _ticks) = FocusController::new(Settings::default(), NoWakeLock);
        ctl.select_category(Some(category()));
        ctl.select_task(Some(TaskChoice {
            id: "5".into(),
            name: "Plan".into(),
        }));
        ctl.enqueue_selected();
        let key = ctl.queue().key_at(0).unwrap();
        ctl.start_task(key).unwrap();

        let events = ctl.set_task_duration(key, 0).unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            Event::Notification { level: NoticeLevel::Warning, .. }
        )));
        assert_eq!(ctl.snapshot().duration_secs, 1500);

        ctl.set_task_duration(key, 10).unwrap();
        assert_eq!(ctl.snapshot().duration_secs, 1500);
        ctl.reset();
        assert_eq!(ctl.snapshot().duration_secs, 600);
    }

    #[tokio::test(start_paused = true)]
    async fn long_break_report_uses_selected_task() {
        let (mut ctl, _ticks) = FocusController::new(Settings::default(), NoWakeLock);
        ctl.select_category(Some(category()));
        ctl.select_task(Some(TaskChoice {
            id: "42".into(),
            name: "Essay".into(),
        }));
        ctl.toggle_main_action();
        let epoch = ctl.engine().run_epoch();
        for _ in 0..45 {
            ctl.on_tick(Tick { generation: epoch });
        }

        let (_, report) = ctl.toggle_long_break_or_reset();
        assert_eq!(report, Some(SessionReport::new("42", 45)));
        assert_eq!(ctl.engine().phase(), SessionPhase::LongBreak);
        assert!(ctl.ticker_live());

        let outcome = ctl.report_outcome(&Err(ReportError::Status(502)));
        assert!(matches!(
            outcome,
            Event::Notification { level: NoticeLevel::Error, ref message, .. }
                if message == "Failed to log to LifeUp: 502"
        ));
        assert_eq!(ctl.engine().phase(), SessionPhase::LongBreak);
        assert!(ctl.engine().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn enqueue_without_task_is_ignored() {
        let (mut ctl, _ticks) = FocusController::new(Settings::default(), NoWakeLock);
        ctl.select_category(Some(category()));
        assert!(ctl.enqueue_selected().is_empty());
        assert!(ctl.queue().is_empty());
        assert_eq!(ctl.current_task_label(), "Ready to Focus");
        assert!(ctl.next_task_label().is_none());
    }
}
