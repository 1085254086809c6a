use super::super::{Model, Msg};
use super::utils::{debounce, extract_files};
use wasm_bindgen::JsCast;
use web_sys::{DragEvent, HtmlInputElement};
use yew::prelude::*;

pub fn render_upload_section(model: &Model, ctx: &Context<Model>) -> Html {
    html! {
        <div class="upload-section">
            {
                if model.workflow.image.is_some() {
                    render_selected_image(model, ctx)
                } else {
                    render_file_input_area(model, ctx)
                }
            }
        </div>
    }
}

fn file_input_callback(ctx: &Context<Model>) -> Callback<Event> {
    ctx.link().callback(|e: Event| {
        let input: HtmlInputElement = e.target_unchecked_into();
        let files = input.files().as_ref().map(extract_files).unwrap_or_default();

        input.set_value("");
        Msg::FilesAdded(files)
    })
}

fn click_element(id: &'static str) -> Callback<()> {
    Callback::from(move |_| {
        let element = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.get_element_by_id(id));

        if let Some(input) = element {
            if let Ok(html_input) = input.dyn_into::<web_sys::HtmlElement>() {
                html_input.click();
            }
        }
    })
}

fn render_file_input_area(model: &Model, ctx: &Context<Model>) -> Html {
    let link = ctx.link();

    let handle_drag_over = link.callback(|e: DragEvent| {
        e.prevent_default();
        Msg::SetDragging(true)
    });

    let handle_drag_leave = link.callback(|e: DragEvent| {
        e.prevent_default();
        Msg::SetDragging(false)
    });

    let handle_drop = link.callback(Msg::HandleDrop);
    let trigger_file_input = click_element("file-input");
    let trigger_camera_input = click_element("camera-input");

    html! {
        <>
            <input
                type="file"
                id="file-input"
                accept="image/*"
                style="display: none;"
                onchange={file_input_callback(ctx)}
            />
            <input
                type="file"
                id="camera-input"
                accept="image/*"
                capture="environment"
                style="display: none;"
                onchange={file_input_callback(ctx)}
            />

            <div
                id="drop-zone"
                class={classes!("upload-area", model.is_dragging.then_some("drag-over"))}
                ondragover={handle_drag_over}
                ondragleave={handle_drag_leave}
                ondrop={handle_drop}
            >
                <div class="upload-placeholder">
                    <i class="fa-solid fa-cloud-arrow-up"></i>
                    <p>{"Drag & drop a plant photo here, or paste one"}</p>
                    <p class="file-types">{"Supported formats: JPG, PNG, WEBP, GIF"}</p>
                </div>
                <div class="button-container">
                    <button
                        id="upload-button"
                        class="analyze-btn"
                        disabled={model.reading_file}
                        onclick={debounce(300, {
                            let trigger = trigger_file_input.clone();
                            move || trigger.emit(())
                        })}
                    >
                        <i class="fa-solid fa-upload"></i>{" Choose File"}
                    </button>
                    <button
                        id="camera-button"
                        class="analyze-btn"
                        disabled={model.reading_file}
                        onclick={debounce(300, {
                            let trigger = trigger_camera_input.clone();
                            move || trigger.emit(())
                        })}
                    >
                        <i class="fa-solid fa-camera"></i>{" Take Photo"}
                    </button>
                </div>
            </div>
        </>
    }
}

fn render_selected_image(model: &Model, ctx: &Context<Model>) -> Html {
    let Some(image) = &model.workflow.image else {
        return html! {};
    };
    let link = ctx.link().clone();
    let analyzing = model.workflow.analyzing;

    html! {
        <div id="preview-container">
            <div class="preview-frame">
                <img
                    id="actual-image-preview"
                    src={image.display_url().to_string()}
                    alt={image.payload().file_name().to_string()}
                />
                {
                    if !analyzing {
                        html! {
                            <button
                                class="remove-btn"
                                title="Remove this image"
                                onclick={link.callback(|_| Msg::Reset)}
                            >
                                <i class="fa-solid fa-times"></i>
                            </button>
                        }
                    } else {
                        html! {}
                    }
                }
            </div>
            {
                if !model.workflow.has_results() {
                    html! {
                        <div class="button-container">
                            <button
                                class="analyze-btn"
                                disabled={analyzing}
                                onclick={debounce(300, {
                                    let link = link.clone();
                                    move || link.send_message(Msg::Analyze)
                                })}
                            >
                                { render_analyze_button_content(analyzing) }
                            </button>
                        </div>
                    }
                } else {
                    html! {}
                }
            }
        </div>
    }
}

fn render_analyze_button_content(analyzing: bool) -> Html {
    if analyzing {
        html! { <><i class="fa-solid fa-spinner fa-spin"></i>{" Analyzing Image..."}</> }
    } else {
        html! { <><i class="fa-solid fa-brain"></i>{" Analyze Plant Disease"}</> }
    }
}
