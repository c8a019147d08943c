//! In-memory host: a table page, a frame hierarchy, manual timers and a
//! settable clock. Backs the CLI and the test-suite.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
    AddressTemplate, ChildFrame, Clock, DeadlineError, DocumentAddressResolver, FrameHost,
    PageElement, RowAddress, TimerKind, Timers,
};

/// One table row: cells in column order, the deadline cell last.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableRow {
    pub row: u32,
    pub cells: Vec<String>,
}

/// A table as stored in JSON fixtures.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableFixture {
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Default)]
struct CellState {
    text: String,
    styles: BTreeMap<String, String>,
    title: String,
    classes: BTreeSet<String>,
}

#[derive(Debug)]
struct RowCells {
    cells: Vec<RefCell<CellState>>,
}

#[derive(Debug, Default)]
struct PageState {
    rows: RefCell<BTreeMap<String, Rc<RowCells>>>,
    failing: RefCell<BTreeSet<String>>,
    detached: Cell<bool>,
    mutations: Cell<usize>,
}

/// A document holding one table. Rows are keyed by the address the template
/// produces for them, so only addresses from that template resolve.
#[derive(Debug, Clone)]
pub struct MemoryPage {
    template: AddressTemplate,
    state: Rc<PageState>,
}

impl MemoryPage {
    pub fn new(template: AddressTemplate) -> Self {
        Self {
            template,
            state: Rc::new(PageState::default()),
        }
    }

    pub fn from_fixture(template: AddressTemplate, fixture: &TableFixture) -> Self {
        let page = Self::new(template);
        for row in &fixture.rows {
            page.insert_row(row.row, row.cells.iter().map(String::as_str));
        }
        page
    }

    /// Adds or replaces a row. The last cell is the one the address points at.
    pub fn insert_row<'a>(&self, row: u32, cells: impl IntoIterator<Item = &'a str>) {
        let cells = cells
            .into_iter()
            .map(|text| {
                RefCell::new(CellState {
                    text: text.to_string(),
                    ..CellState::default()
                })
            })
            .collect::<Vec<_>>();
        if cells.is_empty() {
            return;
        }
        let path = self.template.address_for(row).path;
        self.state
            .rows
            .borrow_mut()
            .insert(path, Rc::new(RowCells { cells }));
    }

    pub fn remove_row(&self, row: u32) {
        let path = self.template.address_for(row).path;
        self.state.rows.borrow_mut().remove(&path);
    }

    /// Replaces the text of the deadline cell, keeping its presentation.
    pub fn set_deadline_text(&self, row: u32, text: &str) {
        if let Some(cell) = self.deadline_cell(row) {
            cell.with_state_mut(|state| state.text = text.to_string());
        }
    }

    /// Makes resolving `row` fail as if the evaluation threw.
    pub fn fail_row(&self, row: u32) {
        let path = self.template.address_for(row).path;
        self.state.failing.borrow_mut().insert(path);
    }

    /// Makes every query on this document fail.
    pub fn detach(&self) {
        self.state.detached.set(true);
    }

    /// Number of presentation writes performed on this page so far.
    pub fn mutations(&self) -> usize {
        self.state.mutations.get()
    }

    pub fn deadline_cell(&self, row: u32) -> Option<MemoryElement> {
        self.row_cells(row).pop()
    }

    /// Cells of `row` in column order.
    pub fn row_cells(&self, row: u32) -> Vec<MemoryElement> {
        let path = self.template.address_for(row).path;
        let Some(row) = self.state.rows.borrow().get(&path).cloned() else {
            return Vec::new();
        };
        (0..row.cells.len())
            .map(|column| MemoryElement {
                page: Rc::clone(&self.state),
                row: Rc::clone(&row),
                column,
            })
            .collect()
    }

    fn ensure_attached(&self) -> Result<(), DeadlineError> {
        if self.state.detached.get() {
            return Err(DeadlineError::Host("document is detached".to_string()));
        }
        Ok(())
    }
}

impl DocumentAddressResolver for MemoryPage {
    type Element = MemoryElement;

    fn resolve(&self, address: &RowAddress) -> Result<Option<MemoryElement>, DeadlineError> {
        self.ensure_attached()?;
        if self.state.failing.borrow().contains(&address.path) {
            return Err(DeadlineError::Host(format!(
                "evaluation of {} failed",
                address.path
            )));
        }
        let Some(row) = self.state.rows.borrow().get(&address.path).cloned() else {
            return Ok(None);
        };
        let column = row.cells.len() - 1;
        Ok(Some(MemoryElement {
            page: Rc::clone(&self.state),
            row,
            column,
        }))
    }

    fn find_marked(&self, class: &str) -> Result<Vec<MemoryElement>, DeadlineError> {
        self.ensure_attached()?;
        let rows = self.state.rows.borrow();
        let mut marked = Vec::new();
        for row in rows.values() {
            for (column, cell) in row.cells.iter().enumerate() {
                if cell.borrow().classes.contains(class) {
                    marked.push(MemoryElement {
                        page: Rc::clone(&self.state),
                        row: Rc::clone(row),
                        column,
                    });
                }
            }
        }
        Ok(marked)
    }
}

/// A cell of a [`MemoryPage`].
#[derive(Debug, Clone)]
pub struct MemoryElement {
    page: Rc<PageState>,
    row: Rc<RowCells>,
    column: usize,
}

impl MemoryElement {
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn text(&self) -> String {
        self.row.cells[self.column].borrow().text.clone()
    }

    pub fn title(&self) -> String {
        self.row.cells[self.column].borrow().title.clone()
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.row.cells[self.column]
            .borrow()
            .styles
            .get(property)
            .cloned()
    }

    pub fn styles(&self) -> BTreeMap<String, String> {
        self.row.cells[self.column].borrow().styles.clone()
    }

    /// Classes in sorted order.
    pub fn classes(&self) -> Vec<String> {
        self.row.cells[self.column]
            .borrow()
            .classes
            .iter()
            .cloned()
            .collect()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.row.cells[self.column].borrow().classes.contains(class)
    }

    fn with_state_mut(&self, apply: impl FnOnce(&mut CellState)) {
        apply(&mut self.row.cells[self.column].borrow_mut());
    }

    fn mutate(&self, apply: impl FnOnce(&mut CellState)) -> Result<(), DeadlineError> {
        self.page.mutations.set(self.page.mutations.get() + 1);
        self.with_state_mut(apply);
        Ok(())
    }
}

impl PartialEq for MemoryElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.row, &other.row) && self.column == other.column
    }
}

impl PageElement for MemoryElement {
    fn text_content(&self) -> Option<String> {
        Some(self.text())
    }

    fn previous_element_sibling(&self) -> Option<Self> {
        let column = self.column.checked_sub(1)?;
        Some(Self {
            page: Rc::clone(&self.page),
            row: Rc::clone(&self.row),
            column,
        })
    }

    fn set_style(&self, property: &str, value: &str) -> Result<(), DeadlineError> {
        self.mutate(|state| {
            state.styles.insert(property.to_string(), value.to_string());
        })
    }

    fn remove_style(&self, property: &str) -> Result<(), DeadlineError> {
        self.mutate(|state| {
            state.styles.remove(property);
        })
    }

    fn set_title(&self, title: &str) -> Result<(), DeadlineError> {
        self.mutate(|state| state.title = title.to_string())
    }

    fn add_class(&self, class: &str) -> Result<(), DeadlineError> {
        self.mutate(|state| {
            state.classes.insert(class.to_string());
        })
    }

    fn remove_class(&self, class: &str) -> Result<(), DeadlineError> {
        self.mutate(|state| {
            state.classes.remove(class);
        })
    }
}

#[derive(Debug, Clone)]
struct MemoryFrame {
    name: String,
    page: Option<MemoryPage>,
    cross_origin: bool,
}

/// A top-level window with child frames.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    top: Option<MemoryPage>,
    frames: Vec<MemoryFrame>,
    named_lookup: bool,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// A window whose frames can be looked up by name.
    pub fn new() -> Self {
        Self {
            top: None,
            frames: Vec::new(),
            named_lookup: true,
        }
    }

    pub fn with_top(mut self, page: MemoryPage) -> Self {
        self.top = Some(page);
        self
    }

    pub fn with_frame(mut self, name: &str, page: MemoryPage) -> Self {
        self.frames.push(MemoryFrame {
            name: name.to_string(),
            page: Some(page),
            cross_origin: false,
        });
        self
    }

    /// A frame whose name and document cannot be read.
    pub fn with_cross_origin_frame(mut self, name: &str) -> Self {
        self.frames.push(MemoryFrame {
            name: name.to_string(),
            page: None,
            cross_origin: true,
        });
        self
    }

    /// Forces frame resolution to walk the child frames.
    pub fn without_named_lookup(mut self) -> Self {
        self.named_lookup = false;
        self
    }
}

impl FrameHost for MemoryHost {
    type Document = MemoryPage;

    fn named_frame(&self, name: &str) -> Result<Option<MemoryPage>, DeadlineError> {
        if !self.named_lookup {
            return Ok(None);
        }
        Ok(self
            .frames
            .iter()
            .find(|frame| !frame.cross_origin && frame.name == name)
            .and_then(|frame| frame.page.clone()))
    }

    fn child_frame_count(&self) -> usize {
        self.frames.len()
    }

    fn child_frame(&self, index: usize) -> Result<ChildFrame<MemoryPage>, DeadlineError> {
        let frame = self
            .frames
            .get(index)
            .ok_or_else(|| DeadlineError::Host(format!("no child frame at {index}")))?;
        if frame.cross_origin {
            return Err(DeadlineError::AccessDenied(format!(
                "frame {index} is cross-origin"
            )));
        }
        Ok(ChildFrame {
            name: frame.name.clone(),
            document: frame.page.clone(),
        })
    }

    fn top_document(&self) -> Option<MemoryPage> {
        self.top.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualTimer {
    pub id: u32,
    pub kind: TimerKind,
}

/// Records what was scheduled; nothing fires on its own. Callers drive
/// [`crate::ScanController::tick`] and [`crate::ScanController::auto_stop`]
/// themselves.
#[derive(Debug, Default)]
pub struct ManualTimers {
    next_id: u32,
    armed: BTreeMap<u32, (TimerKind, Duration)>,
    cancelled: Vec<ManualTimer>,
    fail_next: bool,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next scheduling call fail.
    pub fn fail_next(&mut self) {
        self.fail_next = true;
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.armed.values().any(|(armed, _)| *armed == kind)
    }

    pub fn period(&self, kind: TimerKind) -> Option<Duration> {
        self.armed
            .values()
            .find(|(armed, _)| *armed == kind)
            .map(|(_, period)| *period)
    }

    pub fn cancelled(&self) -> &[ManualTimer] {
        &self.cancelled
    }

    fn arm(&mut self, kind: TimerKind, period: Duration) -> Result<ManualTimer, DeadlineError> {
        if std::mem::take(&mut self.fail_next) {
            return Err(DeadlineError::Timer(format!("could not schedule {kind:?}")));
        }
        self.next_id += 1;
        self.armed.insert(self.next_id, (kind, period));
        Ok(ManualTimer {
            id: self.next_id,
            kind,
        })
    }
}

impl Timers for ManualTimers {
    type Handle = ManualTimer;

    fn schedule_tick(&mut self, every: Duration) -> Result<ManualTimer, DeadlineError> {
        self.arm(TimerKind::Tick, every)
    }

    fn schedule_auto_stop(&mut self, after: Duration) -> Result<ManualTimer, DeadlineError> {
        self.arm(TimerKind::AutoStop, after)
    }

    fn cancel(&mut self, handle: ManualTimer) {
        self.armed.remove(&handle.id);
        self.cancelled.push(handle);
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        self.now.set(now);
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}
