use super::super::{Model, Msg};
use super::utils::{bar_width, bounding_box_style, confidence_tier, format_percent};
use shared::Prediction;
use yew::prelude::*;

pub fn render_results(model: &Model, ctx: &Context<Model>) -> Html {
    let predictions = &model.workflow.predictions;
    let Some(image) = &model.workflow.image else {
        return html! {};
    };
    let Some(primary) = predictions.primary() else {
        return html! {};
    };

    html! {
        <div class="results-container">
            {
                if let Some(bbox) = &primary.bounding_box {
                    html! {
                        <div class="detection-overlay">
                            <h2><i class="fa-solid fa-wave-square"></i>{" Detection Results"}</h2>
                            <div class="overlay-frame">
                                <img src={image.display_url().to_string()} alt="Analysis result" />
                                <div class="bounding-box" style={bounding_box_style(bbox)}>
                                    <span class="bounding-box-label">{ &primary.disease_name }</span>
                                </div>
                            </div>
                        </div>
                    }
                } else {
                    html! {}
                }
            }
            <div class="detailed-results">
                <h3>{ format!("Detected Issues ({})", predictions.len()) }</h3>
                <div class="result-bars">
                    { for predictions.iter().enumerate().map(|(i, p)| render_prediction(i, p)) }
                </div>
            </div>
            <div class="button-container">
                <button class="analyze-btn" onclick={ctx.link().callback(|_| Msg::Reset)}>
                    {"Analyze New Image"}
                </button>
            </div>
        </div>
    }
}

fn render_prediction(index: usize, prediction: &Prediction) -> Html {
    let tier = confidence_tier(prediction.confidence);

    html! {
        <div class={classes!("result-item", (index == 0).then_some("primary"))} key={index.to_string()}>
            <div class="result-label">
                <i class={tier.icon()}></i>
                {" "}{ &prediction.disease_name }
                {
                    if index == 0 {
                        html! { <span class="badge">{"Most likely"}</span> }
                    } else {
                        html! {}
                    }
                }
            </div>
            <div class="result-bar-container">
                <div class={classes!("result-bar", tier.css_class())} style={bar_width(prediction.confidence)}></div>
            </div>
            <div class={classes!("result-value", tier.css_class())}>
                { format_percent(prediction.confidence) }
            </div>
        </div>
    }
}
