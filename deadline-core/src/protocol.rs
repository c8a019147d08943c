//! Request/response protocol spoken with the control surface.

use serde::{Deserialize, Serialize};

use crate::{Clock, DeadlineError, FrameHost, ScanController, Timers};

/// Requests accepted from the popup or the on-page widget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Request {
    Start,
    Stop,
    Clear,
    Status,
    Ping,
    ToggleLegend,
}

/// Replies; the shape depends on the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Response {
    Ping {
        success: bool,
        message: String,
        #[serde(rename = "isActive")]
        is_active: bool,
    },
    Status {
        #[serde(rename = "isActive")]
        is_active: bool,
        #[serde(rename = "processedRows")]
        processed_rows: usize,
    },
    Legend {
        success: bool,
        visible: bool,
    },
    Ack {
        success: bool,
        message: String,
    },
}

impl Response {
    pub fn ok(message: impl Into<String>) -> Self {
        Response::Ack {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Response::Ack {
            success: false,
            message: message.into(),
        }
    }

    /// Reply to a tag that is not part of [`Request`].
    pub fn unknown_action() -> Self {
        Self::failure("Unknown action")
    }

    pub fn is_success(&self) -> bool {
        match self {
            Response::Ping { success, .. }
            | Response::Legend { success, .. }
            | Response::Ack { success, .. } => *success,
            Response::Status { .. } => true,
        }
    }
}

/// The floating legend shown on top of the page.
pub trait Overlay {
    /// Flips visibility and returns whether the legend is now shown.
    fn toggle(&mut self) -> Result<bool, DeadlineError>;
}

/// Used where no legend is mounted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOverlay;

impl Overlay for NoOverlay {
    fn toggle(&mut self) -> Result<bool, DeadlineError> {
        Err(DeadlineError::Host("no legend is mounted".to_string()))
    }
}

impl<H: FrameHost, T: Timers, C: Clock> ScanController<H, T, C> {
    /// Applies one request and builds its reply. Never fails: errors are
    /// reported through the response.
    pub fn handle(&mut self, request: Request, overlay: &mut dyn Overlay) -> Response {
        match request {
            Request::Start => match self.start() {
                Ok(true) => Response::ok("Scanner started"),
                Ok(false) => Response::failure("Scanner already running"),
                Err(err) => {
                    log::error!("failed to start scanner: {err}");
                    Response::failure(format!("Failed to start scanner: {err}"))
                }
            },
            Request::Stop => {
                self.stop();
                Response::ok("Scanner stopped")
            }
            Request::Clear => {
                if let Err(err) = self.clear() {
                    log::error!("failed to clear highlights: {err}");
                }
                Response::ok("Highlights cleared")
            }
            Request::Status => {
                let status = self.status();
                Response::Status {
                    is_active: status.is_active,
                    processed_rows: status.processed_rows,
                }
            }
            Request::Ping => Response::Ping {
                success: true,
                message: "Content script is active".to_string(),
                is_active: self.is_active(),
            },
            Request::ToggleLegend => match overlay.toggle() {
                Ok(visible) => Response::Legend {
                    success: true,
                    visible,
                },
                Err(err) => {
                    log::warn!("legend toggle failed: {err}");
                    Response::Legend {
                        success: false,
                        visible: false,
                    }
                }
            },
        }
    }
}
