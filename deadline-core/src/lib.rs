//! Core logic for scanning a placement-portal table, classifying deadline
//! timestamps by urgency and annotating the rows that carry them.
//!
//! The crate knows nothing about browsers. Everything that touches a real
//! page goes through the traits in [`locator`], [`scan`] and [`protocol`];
//! [`memory`] provides an in-memory host for the CLI and for tests.

pub mod address;
pub mod annotator;
pub mod classifier;
pub mod config;
pub mod locator;
pub mod memory;
pub mod protocol;
pub mod scan;

pub use address::{expand_addresses, AddressTemplate, RowAddress, ROW_PLACEHOLDER};
pub use annotator::{annotate, clear_all, collect_row_group, HIGHLIGHT_CLASS};
pub use classifier::{
    classify, format_remaining, parse_timestamp, DeadlineStatus, ParsedDeadline, Urgency,
};
pub use config::{ScanConfig, StatusPalette};
pub use locator::{
    locate, resolve_frame, ChildFrame, DocumentAddressResolver, FrameHost, PageElement,
    ScanTarget,
};
pub use protocol::{NoOverlay, Overlay, Request, Response};
pub use scan::{
    Clock, RowIdentity, ScanController, ScanStatus, SystemClock, TickReport, TimerKind, Timers,
};

/// Errors raised by the scanner and by the host adapters it drives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeadlineError {
    #[error("address template must contain exactly one `{placeholder}` placeholder: {template}")]
    InvalidTemplate {
        template: String,
        placeholder: &'static str,
    },
    #[error("row range is empty: start {start} is after end {end}")]
    InvalidRange { start: u32, end: u32 },
    #[error("no document is reachable from the current window")]
    NoDocument,
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("host error: {0}")]
    Host(String),
    #[error("timer error: {0}")]
    Timer(String),
}
