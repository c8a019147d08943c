//! The scan loop: a two-state controller driven by host timers.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::annotator::Annotation;
use crate::{
    annotate, clear_all, collect_row_group, locate, parse_timestamp, resolve_frame,
    DeadlineError, FrameHost, PageElement, RowAddress, ScanConfig, ScanTarget,
};

/// Source of the current local wall-clock time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Tick,
    AutoStop,
}

/// Cooperative timers owned by the host.
///
/// The host is expected to call [`ScanController::tick`] every time a tick
/// timer fires and [`ScanController::auto_stop`] when the auto-stop timer
/// fires. Cancelling prevents future callbacks only.
pub trait Timers {
    type Handle;

    fn schedule_tick(&mut self, every: Duration) -> Result<Self::Handle, DeadlineError>;
    fn schedule_auto_stop(&mut self, after: Duration) -> Result<Self::Handle, DeadlineError>;
    fn cancel(&mut self, handle: Self::Handle);
}

/// Deduplication key: a row position together with the text it showed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowIdentity {
    pub row: u32,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanStatus {
    pub is_active: bool,
    pub processed_rows: usize,
}

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Rows that resolved to a cell with text.
    pub resolved: usize,
    /// Rows annotated during this tick.
    pub highlighted: usize,
}

struct ScanState<D, T> {
    active: bool,
    target: Option<ScanTarget<D>>,
    tick_timer: Option<T>,
    auto_stop_timer: Option<T>,
    processed: HashSet<RowIdentity>,
}

impl<D, T> Default for ScanState<D, T> {
    fn default() -> Self {
        Self {
            active: false,
            target: None,
            tick_timer: None,
            auto_stop_timer: None,
            processed: HashSet::new(),
        }
    }
}

/// Owns the scan state of one page activation. `start`, `stop` and `clear`
/// are its only mutators; timer callbacks re-check `active` on entry.
pub struct ScanController<H: FrameHost, T: Timers, C: Clock = SystemClock> {
    config: ScanConfig,
    addresses: Vec<RowAddress>,
    host: H,
    timers: T,
    clock: C,
    state: ScanState<H::Document, T::Handle>,
}

impl<H: FrameHost, T: Timers, C: Clock> ScanController<H, T, C> {
    pub fn new(config: ScanConfig, host: H, timers: T, clock: C) -> Result<Self, DeadlineError> {
        let addresses = config.address_template()?.expand();
        Ok(Self {
            config,
            addresses,
            host,
            timers,
            clock,
            state: ScanState::default(),
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn target(&self) -> Option<&ScanTarget<H::Document>> {
        self.state.target.as_ref()
    }

    pub fn status(&self) -> ScanStatus {
        ScanStatus {
            is_active: self.state.active,
            processed_rows: self.state.processed.len(),
        }
    }

    /// Activates the loop. Returns `Ok(false)` when it was already running.
    pub fn start(&mut self) -> Result<bool, DeadlineError> {
        if self.state.active {
            return Ok(false);
        }

        let target = resolve_frame(&self.host, &self.config.frame_name)
            .ok_or(DeadlineError::NoDocument)?;

        let tick_timer = self.timers.schedule_tick(self.config.tick_interval())?;
        let auto_stop_timer = match self
            .timers
            .schedule_auto_stop(self.config.auto_stop_after())
        {
            Ok(handle) => handle,
            Err(err) => {
                self.timers.cancel(tick_timer);
                return Err(err);
            }
        };

        self.state.target = Some(target);
        self.state.tick_timer = Some(tick_timer);
        self.state.auto_stop_timer = Some(auto_stop_timer);
        self.state.processed.clear();
        self.state.active = true;

        log::info!(
            "deadline scanner started on rows {}..={}",
            self.config.first_row,
            self.config.last_row
        );
        Ok(true)
    }

    /// Deactivates the loop. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(handle) = self.state.tick_timer.take() {
            self.timers.cancel(handle);
        }
        if let Some(handle) = self.state.auto_stop_timer.take() {
            self.timers.cancel(handle);
        }
        if self.state.active {
            log::info!("deadline scanner stopped");
        }
        self.state.active = false;
    }

    /// Called by the host when the auto-stop timer fires.
    pub fn auto_stop(&mut self) {
        // Already fired. Must not be cancelled from inside its own callback.
        self.state.auto_stop_timer = None;
        if self.state.active {
            log::info!(
                "deadline scanner auto-stopped after {}s",
                self.config.auto_stop_after().as_secs()
            );
        }
        self.stop();
    }

    /// Removes every annotation and forgets which rows were processed.
    /// Does not change whether the loop is active. When the document cannot
    /// be queried nothing is forgotten.
    pub fn clear(&mut self) -> Result<usize, DeadlineError> {
        let Some(target) = &self.state.target else {
            log::debug!("nothing to clear, no scan target resolved yet");
            return Ok(0);
        };
        let cleared = clear_all(target.document())?;
        self.state.processed.clear();
        log::info!("cleared {cleared} highlighted cells");
        Ok(cleared)
    }

    /// One pass over the whole address range.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if !self.state.active {
            return report;
        }
        let Some(target) = &self.state.target else {
            return report;
        };
        let document = target.document();

        for address in &self.addresses {
            let Some(cell) = locate(document, address) else {
                continue;
            };
            let Some(text) = cell
                .text_content()
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
            else {
                continue;
            };
            report.resolved += 1;

            let identity = RowIdentity {
                row: address.row,
                text,
            };
            if self.state.processed.contains(&identity) {
                continue;
            }

            let Some(deadline) = parse_timestamp(&identity.text) else {
                log::debug!("could not parse deadline {:?} in row {}", identity.text, address.row);
                continue;
            };

            let now = self.clock.now();
            let annotation = Annotation::new(&deadline, now, &self.config.palette);
            log::debug!(
                "row {}: deadline {} is {}",
                address.row,
                deadline.instant(),
                annotation.urgency.label()
            );
            annotate(
                &collect_row_group(&cell, self.config.row_width),
                &annotation,
            );

            self.state.processed.insert(identity);
            report.highlighted += 1;
        }

        if report.resolved > 0 {
            log::debug!(
                "tick processed {} rows, highlighted {} deadlines",
                report.resolved,
                report.highlighted
            );
        }
        report
    }
}
