/// Popup UI for the Visited Highlighter extension

use crate::bridge::{ChromeRuntime, ChromeStore, ChromeTabs, SystemClock};
use crate::surface::{FilterForm, SettingsSurface, Status};
use crate::ui::components::{ColorField, DateTimeField, TextField, ToggleField};
use patternfly_yew::prelude::*;
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

type ChromeSurface = SettingsSurface<ChromeStore, ChromeRuntime, ChromeTabs, SystemClock>;

/// Latest value a datetime-local input should accept
fn now_for_input() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M").to_string()
}

#[function_component(Popup)]
pub fn popup() -> Html {
    let surface = use_state(|| Rc::new(ChromeSurface::new(ChromeStore, ChromeRuntime, ChromeTabs, SystemClock)));
    let form = use_state(FilterForm::default);
    let status = use_state(|| Status::Idle);
    let loaded = use_state(|| false);

    // Load saved settings, then re-apply them so the page is current
    {
        let surface = (*surface).clone();
        let form = form.clone();
        let status = status.clone();
        let loaded = loaded.clone();

        use_effect_with((), move |_| {
            spawn_local(async move {
                let saved = surface.load().await;
                form.set(saved.clone());
                loaded.set(true);

                status.set(Status::Fetching);
                let result = surface.refresh_on_open(&saved).await;
                status.set(Status::from(result));
            });
            || ()
        });
    }

    let on_toggle = {
        let surface = (*surface).clone();
        let form = form.clone();
        let status = status.clone();

        Callback::from(move |enabled: bool| {
            let mut next = (*form).clone();
            next.enabled = enabled;
            form.set(next);

            let surface = surface.clone();
            let status = status.clone();
            spawn_local(async move {
                if let Err(e) = surface.set_enabled(enabled).await {
                    status.set(Status::Failed(e));
                }
            });
        })
    };

    let on_color = {
        let surface = (*surface).clone();
        let form = form.clone();
        let status = status.clone();

        Callback::from(move |color: String| {
            let mut next = (*form).clone();
            next.color = color.clone();
            form.set(next);

            let surface = surface.clone();
            let status = status.clone();
            spawn_local(async move {
                if let Err(e) = surface.set_color(&color).await {
                    status.set(Status::Failed(e));
                }
            });
        })
    };

    let on_field = |update: fn(&mut FilterForm, String)| {
        let form = form.clone();
        Callback::from(move |value: String| {
            let mut next = (*form).clone();
            update(&mut next, value);
            form.set(next);
        })
    };

    let on_apply = {
        let surface = (*surface).clone();
        let form = form.clone();
        let status = status.clone();

        Callback::from(move |_: MouseEvent| {
            let current = (*form).clone();
            let surface = surface.clone();
            let status = status.clone();

            status.set(Status::Fetching);
            spawn_local(async move {
                let result = surface.apply_filter(&current).await;
                status.set(Status::from(result));
            });
        })
    };

    let is_busy = matches!(*status, Status::Fetching);
    // Edits before the saved form arrives would be overwritten by it
    let is_loading = !*loaded;

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"Link Highlighting"}</h1>

            <ToggleField label="Enable highlighting" checked={form.enabled} disabled={is_loading} ontoggle={on_toggle} />

            <ColorField label="Highlight color:" value={form.color.clone()} disabled={is_loading} onchange={on_color} />

            <hr class="divider" />

            <TextField
                label="Domain (e.g. *.crm.com):"
                value={form.domain_filter.clone()}
                placeholder="*.crm.com"
                disabled={is_loading}
                onchange={on_field(|form, value| form.domain_filter = value)}
            />
            <DateTimeField
                label="From:"
                value={form.start.clone()}
                max={now_for_input()}
                disabled={is_loading}
                onchange={on_field(|form, value| form.start = value)}
            />
            <DateTimeField
                label="To:"
                value={form.end.clone()}
                max={now_for_input()}
                disabled={is_loading}
                onchange={on_field(|form, value| form.end = value)}
            />

            <Button onclick={on_apply} disabled={is_busy || is_loading} variant={ButtonVariant::Primary} block={true}>
                {"Refresh links"}
            </Button>

            // Status display
            {match &*status {
                Status::Fetching => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{(*status).to_string()}</p>
                    </div>
                },
                Status::Failed(_) => html! {
                    <div class="message-top-margin">
                        <Alert r#type={AlertType::Danger} title={(*status).to_string()} inline={true}>
                        </Alert>
                    </div>
                },
                Status::Found(_) => html! {
                    <p class="message-text">{(*status).to_string()}</p>
                },
                Status::Idle => html! {}
            }}

            <p class="footer-popup">
                {"Visited Highlighter v0.1.0"}
            </p>
        </div>
    }
}
