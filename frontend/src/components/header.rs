use yew::prelude::*;

/// Renders the application header
pub fn render_header() -> Html {
    html! {
        <header class="app-header">
            <h1><i class="fa-solid fa-leaf"></i> {" Plant Disease Detector"}</h1>
            <p class="subtitle">
                {"Upload a photo of your plant to detect diseases and get treatment advice"}
            </p>
        </header>
    }
}

pub fn render_how_it_works() -> Html {
    let steps = [
        (
            "fa-solid fa-camera",
            "Upload & Analyze",
            "Upload a photo from your device or take one with your camera.",
        ),
        (
            "fa-solid fa-brain",
            "AI Detection",
            "Diseases are identified with confidence scores and their location on the leaf.",
        ),
        (
            "fa-solid fa-book-open",
            "Expert Guidance",
            "Read about symptoms, causes and proven treatments for the top match.",
        ),
    ];

    html! {
        <section class="how-it-works">
            <h2>{"How It Works"}</h2>
            <div class="steps">
                { for steps.iter().map(|(icon, title, text)| html! {
                    <div class="step-card">
                        <i class={*icon}></i>
                        <h3>{ *title }</h3>
                        <p>{ *text }</p>
                    </div>
                })}
            </div>
        </section>
    }
}
