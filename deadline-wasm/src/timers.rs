#![cfg(target_arch = "wasm32")]

use std::rc::Rc;
use std::time::Duration;

use deadline_core::{DeadlineError, TimerKind, Timers};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::Window;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebTimer {
    kind: TimerKind,
    id: i32,
}

struct Armed {
    id: i32,
    _callback: Closure<dyn FnMut()>,
}

/// `setInterval` / `setTimeout` backed timers. Callbacks stay alive until the
/// timer is cancelled or replaced; a fired auto-stop callback is only dropped
/// when the next one is scheduled, never from inside itself.
pub struct WebTimers {
    window: Window,
    on_tick: Rc<dyn Fn()>,
    on_auto_stop: Rc<dyn Fn()>,
    tick: Option<Armed>,
    auto_stop: Option<Armed>,
}

impl WebTimers {
    pub fn new(window: Window, on_tick: Rc<dyn Fn()>, on_auto_stop: Rc<dyn Fn()>) -> Self {
        Self {
            window,
            on_tick,
            on_auto_stop,
            tick: None,
            auto_stop: None,
        }
    }
}

fn millis(duration: Duration) -> i32 {
    i32::try_from(duration.as_millis()).unwrap_or(i32::MAX)
}

fn timer_error(err: wasm_bindgen::JsValue) -> DeadlineError {
    DeadlineError::Timer(format!("{err:?}"))
}

impl Timers for WebTimers {
    type Handle = WebTimer;

    fn schedule_tick(&mut self, every: Duration) -> Result<WebTimer, DeadlineError> {
        let on_tick = Rc::clone(&self.on_tick);
        let callback = Closure::<dyn FnMut()>::new(move || on_tick());
        let id = self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                millis(every),
            )
            .map_err(timer_error)?;
        if let Some(previous) = self.tick.replace(Armed {
            id,
            _callback: callback,
        }) {
            self.window.clear_interval_with_handle(previous.id);
        }
        Ok(WebTimer {
            kind: TimerKind::Tick,
            id,
        })
    }

    fn schedule_auto_stop(&mut self, after: Duration) -> Result<WebTimer, DeadlineError> {
        let on_auto_stop = Rc::clone(&self.on_auto_stop);
        let callback = Closure::<dyn FnMut()>::new(move || on_auto_stop());
        let id = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                millis(after),
            )
            .map_err(timer_error)?;
        if let Some(previous) = self.auto_stop.replace(Armed {
            id,
            _callback: callback,
        }) {
            self.window.clear_timeout_with_handle(previous.id);
        }
        Ok(WebTimer {
            kind: TimerKind::AutoStop,
            id,
        })
    }

    fn cancel(&mut self, handle: WebTimer) {
        match handle.kind {
            TimerKind::Tick => {
                self.window.clear_interval_with_handle(handle.id);
                if self.tick.as_ref().is_some_and(|armed| armed.id == handle.id) {
                    self.tick = None;
                }
            }
            TimerKind::AutoStop => {
                self.window.clear_timeout_with_handle(handle.id);
                if self
                    .auto_stop
                    .as_ref()
                    .is_some_and(|armed| armed.id == handle.id)
                {
                    self.auto_stop = None;
                }
            }
        }
    }
}
