#![allow(dead_code)]

use std::fs;

use chrono::{NaiveDate, NaiveDateTime};
use deadline_core::memory::{FixedClock, ManualTimers, MemoryHost, MemoryPage, TableFixture};
use deadline_core::{ScanConfig, ScanController};

pub const FRAME: &str = "myframe";
pub const TEMPLATE: &str = "/html/body/table/tbody/tr[{number}]/td[12]";

pub type TestController = ScanController<MemoryHost, ManualTimers, FixedClock>;

pub fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

pub fn load_fixture(name: &str) -> TableFixture {
    let raw = fs::read_to_string(fixture_path(name)).expect("fixture is readable");
    serde_json::from_str(&raw).expect("fixture is valid JSON")
}

pub fn at(day: u32, month: u32, year: i32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .expect("valid test instant")
}

pub fn config(first_row: u32, last_row: u32) -> ScanConfig {
    ScanConfig {
        address_template: TEMPLATE.to_string(),
        first_row,
        last_row,
        ..ScanConfig::default()
    }
}

pub fn empty_page(config: &ScanConfig) -> MemoryPage {
    MemoryPage::new(config.address_template().expect("valid template"))
}

/// A row of `width` filler cells followed by the deadline cell.
pub fn insert_row(page: &MemoryPage, row: u32, width: usize, deadline: &str) {
    let filler = (0..width).map(|column| format!("r{row}c{column}")).collect::<Vec<_>>();
    page.insert_row(
        row,
        filler
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(deadline)),
    );
}

pub fn controller(config: ScanConfig, page: &MemoryPage, now: NaiveDateTime) -> TestController {
    let host = MemoryHost::new().with_frame(FRAME, page.clone());
    ScanController::new(config, host, ManualTimers::new(), FixedClock::new(now))
        .expect("valid controller")
}
