//! Floating legend shown on top of the scanned page.

#[cfg(target_arch = "wasm32")]
mod styles;

#[cfg(target_arch = "wasm32")]
mod wasm_ui {
    use crate::styles;
    use deadline_core::{DeadlineError, Overlay, StatusPalette, Urgency};
    use serde_wasm_bindgen::from_value;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{Document, Element, HtmlElement, Window};
    use yew::events::{MouseEvent, PointerEvent};
    use yew::prelude::*;

    const LEGEND_ROOT_ID: &str = "deadline-legend-root";

    #[derive(Properties, PartialEq)]
    pub struct LegendProps {
        pub palette: StatusPalette,
        #[prop_or_default]
        pub on_close: Option<Callback<()>>,
    }

    #[function_component(Legend)]
    fn legend(props: &LegendProps) -> Html {
        use_effect_with((), |_| {
            if let Some(document) = web_sys::window().and_then(|window| window.document()) {
                if let Err(err) = styles::ensure_styles(&document) {
                    log::error!("cannot install legend styles: {err:?}");
                }
            }
            || ()
        });

        let root = use_node_ref();
        let position = use_state(|| None::<(i32, i32)>);
        // Pointer offset inside the widget while a drag is in progress.
        let grab = use_mut_ref(|| None::<(i32, i32)>);
        let dragging = use_state(|| false);

        let on_pointer_down = {
            let root = root.clone();
            let grab = grab.clone();
            let dragging = dragging.clone();
            Callback::from(move |event: PointerEvent| {
                let Some(widget) = root.cast::<HtmlElement>() else {
                    return;
                };
                *grab.borrow_mut() = Some((
                    event.client_x() - widget.offset_left(),
                    event.client_y() - widget.offset_top(),
                ));
                if let Err(err) = widget.set_pointer_capture(event.pointer_id()) {
                    log::debug!("pointer capture refused: {err:?}");
                }
                dragging.set(true);
            })
        };

        let on_pointer_move = {
            let grab = grab.clone();
            let position = position.clone();
            Callback::from(move |event: PointerEvent| {
                if let Some((dx, dy)) = *grab.borrow() {
                    position.set(Some((
                        (event.client_x() - dx).max(0),
                        (event.client_y() - dy).max(0),
                    )));
                }
            })
        };

        let on_pointer_up = {
            let grab = grab.clone();
            let dragging = dragging.clone();
            Callback::from(move |_: PointerEvent| {
                grab.borrow_mut().take();
                dragging.set(false);
            })
        };

        let on_close = props.on_close.clone().map(|on_close| {
            Callback::from(move |event: MouseEvent| {
                event.stop_propagation();
                on_close.emit(());
            })
        });

        let placement =
            (*position).map(|(left, top)| format!("left: {left}px; top: {top}px; right: auto;"));

        html! {
            <aside
                ref={root}
                class={classes!("deadline-legend", (*dragging).then_some("is-dragging"))}
                style={placement}
                onpointermove={on_pointer_move}
                onpointerup={on_pointer_up.clone()}
                onpointercancel={on_pointer_up}
                aria-label="Deadline colour legend"
            >
                <header class="deadline-legend-header" onpointerdown={on_pointer_down}>
                    <h2>{"Deadline legend"}</h2>
                    {
                        match on_close {
                            Some(onclick) => html! {
                                <button type="button" class="deadline-legend-close" {onclick} aria-label="Hide legend">{"×"}</button>
                            },
                            None => html! {},
                        }
                    }
                </header>
                <ul>
                    { for [Urgency::Overdue, Urgency::Warning, Urgency::Upcoming]
                        .into_iter()
                        .map(|urgency| render_item(urgency, &props.palette)) }
                </ul>
            </aside>
        }
    }

    fn render_item(urgency: Urgency, palette: &StatusPalette) -> Html {
        let (color, hint) = match urgency {
            Urgency::Overdue => (&palette.overdue, "deadline has passed"),
            Urgency::Warning => (&palette.warning, "due within 24 hours"),
            Urgency::Upcoming => (&palette.upcoming, "more than 24 hours left"),
        };
        html! {
            <li class="deadline-legend-item" data-status={urgency.label()}>
                <span class="deadline-legend-swatch" style={format!("background-color: {color};")}></span>
                <span>{ urgency.message() }</span>
                <span class="deadline-legend-hint">{ hint }</span>
            </li>
        }
    }

    fn document() -> Result<Document, JsValue> {
        let window: Window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        window
            .document()
            .ok_or_else(|| JsValue::from_str("document is not accessible"))
    }

    fn js_error(err: JsValue) -> DeadlineError {
        DeadlineError::Host(format!("{err:?}"))
    }

    /// Legend pinned to the top-level page; created on first toggle.
    pub struct LegendOverlay {
        palette: StatusPalette,
        container: Option<HtmlElement>,
    }

    impl LegendOverlay {
        pub fn new(palette: StatusPalette) -> Self {
            Self {
                palette,
                container: None,
            }
        }

        fn mount(&mut self) -> Result<(), JsValue> {
            let document = document()?;
            let body = document
                .body()
                .ok_or_else(|| JsValue::from_str("document has no <body>"))?;

            let container: HtmlElement = document.create_element("div")?.dyn_into()?;
            container.set_id(LEGEND_ROOT_ID);
            body.append_child(&container)?;

            let hide = container.clone();
            let on_close = Callback::from(move |_: ()| hide.set_hidden(true));

            yew::Renderer::<Legend>::with_root_and_props(
                container.clone().into(),
                LegendProps {
                    palette: self.palette.clone(),
                    on_close: Some(on_close),
                },
            )
            .render();

            self.container = Some(container);
            Ok(())
        }
    }

    impl Overlay for LegendOverlay {
        fn toggle(&mut self) -> Result<bool, DeadlineError> {
            match &self.container {
                None => {
                    self.mount().map_err(js_error)?;
                    Ok(true)
                }
                Some(container) => {
                    let show = container.hidden();
                    container.set_hidden(!show);
                    Ok(show)
                }
            }
        }
    }

    /// Renders a static legend into the element matched by `selector`.
    #[wasm_bindgen]
    pub fn mount_legend(selector: &str, palette: JsValue) -> Result<(), JsValue> {
        let target: Element = document()?
            .query_selector(selector)
            .map_err(|err| JsValue::from_str(&format!("invalid selector: {err:?}")))?
            .ok_or_else(|| JsValue::from_str("no element matches the selector"))?;

        let palette = if palette.is_undefined() || palette.is_null() {
            StatusPalette::default()
        } else {
            from_value(palette)?
        };

        yew::Renderer::<Legend>::with_root_and_props(
            target,
            LegendProps {
                palette,
                on_close: None,
            },
        )
        .render();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_ui::{mount_legend, LegendOverlay};

#[cfg(not(target_arch = "wasm32"))]
pub use native::{mount_legend, LegendOverlay};

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use deadline_core::{DeadlineError, Overlay, StatusPalette};

    const WASM_ONLY: &str = "deadline-ui only supports the wasm32 target";

    pub struct LegendOverlay;

    impl LegendOverlay {
        pub fn new(_: StatusPalette) -> Self {
            Self
        }
    }

    impl Overlay for LegendOverlay {
        fn toggle(&mut self) -> Result<bool, DeadlineError> {
            Err(DeadlineError::Host(WASM_ONLY.to_string()))
        }
    }

    pub fn mount_legend(_: &str, _: wasm_bindgen::JsValue) -> Result<(), wasm_bindgen::JsValue> {
        Err(wasm_bindgen::JsValue::from_str(WASM_ONLY))
    }
}
