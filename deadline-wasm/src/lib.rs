//! Content-script bridge: wires the scanner to the browser page and exposes
//! the request handler to the extension's JavaScript glue.

mod console;
mod dom;
mod timers;

use deadline_core::{ScanConfig, StatusPalette};
use serde::Deserialize;

/// Partial configuration coming from JavaScript; missing fields keep their
/// defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
struct JsScanConfig {
    #[serde(default)]
    frame_name: Option<String>,
    #[serde(default)]
    address_template: Option<String>,
    #[serde(default)]
    first_row: Option<u32>,
    #[serde(default)]
    last_row: Option<u32>,
    #[serde(default)]
    tick_interval_ms: Option<u64>,
    #[serde(default)]
    auto_stop_ms: Option<u64>,
    #[serde(default)]
    palette: Option<StatusPalette>,
    #[serde(default)]
    row_width: Option<usize>,
    #[serde(default)]
    page_markers: Option<Vec<String>>,
    #[serde(default)]
    start_delay_ms: Option<u64>,
    #[serde(default)]
    log_level: Option<String>,
}

impl From<JsScanConfig> for ScanConfig {
    fn from(cfg: JsScanConfig) -> Self {
        let base = ScanConfig::default();
        ScanConfig {
            frame_name: cfg.frame_name.unwrap_or(base.frame_name),
            address_template: cfg.address_template.unwrap_or(base.address_template),
            first_row: cfg.first_row.unwrap_or(base.first_row),
            last_row: cfg.last_row.unwrap_or(base.last_row),
            tick_interval_ms: cfg.tick_interval_ms.unwrap_or(base.tick_interval_ms),
            auto_stop_ms: cfg.auto_stop_ms.unwrap_or(base.auto_stop_ms),
            palette: cfg.palette.unwrap_or(base.palette),
            row_width: cfg.row_width.unwrap_or(base.row_width),
            page_markers: cfg.page_markers.unwrap_or(base.page_markers),
            start_delay_ms: cfg.start_delay_ms.unwrap_or(base.start_delay_ms),
        }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn log_level(name: Option<&str>) -> log::LevelFilter {
    name.and_then(|name| name.parse().ok())
        .unwrap_or(log::LevelFilter::Info)
}

/// What `bootstrap` does with an activation that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
enum BootstrapStep {
    /// An earlier bootstrap already configured this page.
    Skip,
    /// A request started the scanner first; keep it running as is.
    Adopt,
    /// Created by a request and never started; rebuild with the caller's config.
    Rebuild,
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn bootstrap_step(bootstrapped: bool, is_active: bool) -> BootstrapStep {
    match (bootstrapped, is_active) {
        (true, _) => BootstrapStep::Skip,
        (false, true) => BootstrapStep::Adopt,
        (false, false) => BootstrapStep::Rebuild,
    }
}

#[cfg(target_arch = "wasm32")]
mod page {
    use std::cell::{OnceCell, RefCell};
    use std::rc::{Rc, Weak};
    use std::time::Duration;

    use deadline_core::{Request, Response, ScanConfig, ScanController, SystemClock};
    use deadline_ui::LegendOverlay;
    use serde_wasm_bindgen::{from_value, to_value};
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    use crate::dom::WebFrameHost;
    use crate::timers::WebTimers;
    use crate::{bootstrap_step, console, log_level, BootstrapStep, JsScanConfig};

    type Scanner = ScanController<WebFrameHost, WebTimers, SystemClock>;

    /// Everything one page activation owns.
    struct Activation {
        scanner: Rc<RefCell<Scanner>>,
        legend: LegendOverlay,
        /// Set once `bootstrap` has applied its config to this activation.
        bootstrapped: bool,
    }

    thread_local! {
        static ACTIVATION: RefCell<Option<Activation>> = const { RefCell::new(None) };
    }

    fn with_scanner(slot: &OnceCell<Weak<RefCell<Scanner>>>, apply: impl FnOnce(&mut Scanner)) {
        let Some(scanner) = slot.get().and_then(Weak::upgrade) else {
            return;
        };
        match scanner.try_borrow_mut() {
            Ok(mut scanner) => apply(&mut scanner),
            Err(_) => log::warn!("scanner is busy, skipping timer callback"),
        };
    }

    fn activate(config: ScanConfig, bootstrapped: bool) -> Result<Activation, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

        let slot: Rc<OnceCell<Weak<RefCell<Scanner>>>> = Rc::new(OnceCell::new());
        let on_tick: Rc<dyn Fn()> = {
            let slot = Rc::clone(&slot);
            Rc::new(move || {
                with_scanner(&slot, |scanner| {
                    scanner.tick();
                })
            })
        };
        let on_auto_stop: Rc<dyn Fn()> = {
            let slot = Rc::clone(&slot);
            Rc::new(move || with_scanner(&slot, Scanner::auto_stop))
        };

        let legend = LegendOverlay::new(config.palette.clone());
        let timers = WebTimers::new(window.clone(), on_tick, on_auto_stop);
        let scanner = ScanController::new(config, WebFrameHost::new(window), timers, SystemClock)
            .map_err(|err| JsValue::from_str(&format!("invalid scanner config: {err}")))?;
        let scanner = Rc::new(RefCell::new(scanner));
        // Freshly created, nothing else can have filled it.
        let _ = slot.set(Rc::downgrade(&scanner));

        Ok(Activation {
            scanner,
            legend,
            bootstrapped,
        })
    }

    /// Applies the bootstrap config to this page. Returns `false` when a
    /// previous bootstrap already did, or when a request started the scanner
    /// first; an activation created by a request and never started is
    /// rebuilt with `config`.
    fn bootstrap_activation(config: ScanConfig) -> Result<bool, JsValue> {
        ACTIVATION.with(|cell| {
            let mut slot = cell.borrow_mut();
            let Some(activation) = slot.as_mut() else {
                *slot = Some(activate(config, true)?);
                return Ok(true);
            };
            let is_active = activation.scanner.borrow().is_active();
            match bootstrap_step(activation.bootstrapped, is_active) {
                BootstrapStep::Skip => Ok(false),
                BootstrapStep::Adopt => {
                    activation.bootstrapped = true;
                    Ok(false)
                }
                BootstrapStep::Rebuild => {
                    let mut fresh = activate(config, true)?;
                    // Keep the legend the user may already have opened.
                    std::mem::swap(&mut fresh.legend, &mut activation.legend);
                    *activation = fresh;
                    Ok(true)
                }
            }
        })
    }

    /// Activation with default settings for requests that arrive before
    /// `bootstrap`.
    fn ensure_activation() -> Result<(), JsValue> {
        ACTIVATION.with(|cell| {
            let mut slot = cell.borrow_mut();
            if slot.is_none() {
                console::ensure_installed();
                *slot = Some(activate(ScanConfig::default(), false)?);
            }
            Ok(())
        })
    }

    fn schedule_start(delay: Duration) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let start = Closure::once_into_js(|| {
            ACTIVATION.with(|cell| {
                let activation = cell.borrow();
                let Some(activation) = activation.as_ref() else {
                    return;
                };
                let result = activation.scanner.borrow_mut().start();
                match result {
                    Ok(true) => log::info!("on target page, scanner activated"),
                    Ok(false) => log::debug!("scanner was already running"),
                    Err(err) => log::error!("automatic start failed: {err}"),
                }
            })
        });
        window.set_timeout_with_callback_and_timeout_and_arguments_0(
            start.unchecked_ref(),
            i32::try_from(delay.as_millis()).unwrap_or(i32::MAX),
        )?;
        Ok(())
    }

    /// Entry point of the content script. Activates the scanner on target
    /// pages after the configured delay; repeated calls are ignored.
    #[wasm_bindgen]
    pub fn bootstrap(config: Option<JsValue>) -> Result<bool, JsValue> {
        console_error_panic_hook::set_once();

        let js_config = match config {
            Some(value) if !value.is_undefined() && !value.is_null() => {
                from_value::<JsScanConfig>(value)
                    .map_err(|err| JsValue::from_str(&format!("cannot read config: {err}")))?
            }
            _ => JsScanConfig::default(),
        };
        console::init(log_level(js_config.log_level.as_deref()));
        let config = ScanConfig::from(js_config);

        let href = web_sys::window()
            .ok_or_else(|| JsValue::from_str("no window"))?
            .location()
            .href()?;
        let delay = config.start_delay();
        let on_target_page = config.matches_page(&href);

        if !bootstrap_activation(config)? {
            log::debug!("content script already initialised");
            return Ok(false);
        }
        if on_target_page {
            log::info!("on target page, starting in {}ms", delay.as_millis());
            schedule_start(delay)?;
        } else {
            log::info!("not a target page, waiting for a start request");
        }
        Ok(on_target_page)
    }

    /// Handles one `{action: ...}` request from the popup or the widget.
    #[wasm_bindgen]
    pub fn handle_request(request: JsValue) -> Result<JsValue, JsValue> {
        let response = match from_value::<Request>(request) {
            Ok(request) => dispatch(request),
            Err(err) => {
                log::debug!("rejected request: {err}");
                Response::unknown_action()
            }
        };
        to_value(&response).map_err(|err| JsValue::from_str(&format!("cannot encode reply: {err}")))
    }

    fn dispatch(request: Request) -> Response {
        if let Err(err) = ensure_activation() {
            return Response::failure(format!("content script unavailable: {err:?}"));
        }
        ACTIVATION.with(|cell| {
            let mut activation = cell.borrow_mut();
            let Some(Activation {
                scanner, legend, ..
            }) = activation.as_mut()
            else {
                return Response::failure("content script unavailable");
            };
            let response = match scanner.try_borrow_mut() {
                Ok(mut scanner) => scanner.handle(request, legend),
                Err(_) => Response::failure("scanner is busy"),
            };
            response
        })
    }
}

#[cfg(target_arch = "wasm32")]
pub use page::{bootstrap, handle_request};

#[cfg(not(target_arch = "wasm32"))]
pub fn bootstrap(_: Option<wasm_bindgen::JsValue>) -> Result<bool, wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "deadline-wasm only supports the wasm32 target",
    ))
}

#[cfg(not(target_arch = "wasm32"))]
pub fn handle_request(
    _: wasm_bindgen::JsValue,
) -> Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "deadline-wasm only supports the wasm32 target",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_js_config_keeps_defaults() {
        let js = JsScanConfig {
            last_row: Some(40),
            tick_interval_ms: Some(500),
            ..JsScanConfig::default()
        };
        let config = ScanConfig::from(js);
        let defaults = ScanConfig::default();

        assert_eq!(config.last_row, 40);
        assert_eq!(config.tick_interval_ms, 500);
        assert_eq!(config.first_row, defaults.first_row);
        assert_eq!(config.frame_name, defaults.frame_name);
        assert_eq!(config.palette, defaults.palette);
    }

    #[test]
    fn bootstrap_takes_over_activation_created_by_a_request() {
        assert_eq!(bootstrap_step(false, false), BootstrapStep::Rebuild);
        assert_eq!(bootstrap_step(false, true), BootstrapStep::Adopt);
        assert_eq!(bootstrap_step(true, false), BootstrapStep::Skip);
        assert_eq!(bootstrap_step(true, true), BootstrapStep::Skip);
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        assert_eq!(log_level(Some("debug")), log::LevelFilter::Debug);
        assert_eq!(log_level(Some("chatty")), log::LevelFilter::Info);
        assert_eq!(log_level(None), log::LevelFilter::Info);
    }
}
