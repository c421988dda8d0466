/// Reusable form fields for the settings popup

use web_sys::HtmlInputElement;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct FieldProps {
    pub label: AttrValue,
    pub value: AttrValue,
    pub onchange: Callback<String>,
    #[prop_or_default]
    pub placeholder: Option<AttrValue>,
    #[prop_or_default]
    pub max: Option<AttrValue>,
    #[prop_or_default]
    pub disabled: bool,
}

fn input_value(onchange: &Callback<String>) -> Callback<InputEvent> {
    let onchange = onchange.clone();
    Callback::from(move |e: InputEvent| {
        if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
            onchange.emit(input.value());
        }
    })
}

#[function_component(TextField)]
pub fn text_field(props: &FieldProps) -> Html {
    html! {
        <label class="field">
            <span class="field-label">{props.label.clone()}</span>
            <input
                type="text"
                class="field-input"
                value={props.value.clone()}
                placeholder={props.placeholder.clone()}
                disabled={props.disabled}
                oninput={input_value(&props.onchange)}
            />
        </label>
    }
}

#[function_component(DateTimeField)]
pub fn date_time_field(props: &FieldProps) -> Html {
    html! {
        <label class="field">
            <span class="field-label">{props.label.clone()}</span>
            <input
                type="datetime-local"
                class="field-input"
                value={props.value.clone()}
                max={props.max.clone()}
                disabled={props.disabled}
                oninput={input_value(&props.onchange)}
            />
        </label>
    }
}

#[function_component(ColorField)]
pub fn color_field(props: &FieldProps) -> Html {
    html! {
        <label class="field">
            <span class="field-label">{props.label.clone()}</span>
            <div class="color-row">
                <input
                    type="color"
                    class="color-swatch"
                    value={props.value.clone()}
                    disabled={props.disabled}
                    oninput={input_value(&props.onchange)}
                />
                <span class="color-value">{props.value.clone()}</span>
            </div>
        </label>
    }
}

#[derive(Properties, PartialEq)]
pub struct ToggleProps {
    pub label: AttrValue,
    pub checked: bool,
    #[prop_or_default]
    pub disabled: bool,
    pub ontoggle: Callback<bool>,
}

#[function_component(ToggleField)]
pub fn toggle_field(props: &ToggleProps) -> Html {
    let onchange = {
        let ontoggle = props.ontoggle.clone();
        Callback::from(move |e: Event| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                ontoggle.emit(input.checked());
            }
        })
    };

    html! {
        <label class="toggle">
            <input type="checkbox" checked={props.checked} disabled={props.disabled} {onchange} />
            <span class="toggle-label">{props.label.clone()}</span>
        </label>
    }
}
