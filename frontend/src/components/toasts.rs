use super::super::{Model, Msg};
use frontend::workflow::NotificationSeverity;
use yew::prelude::*;

pub fn render_toasts(model: &Model, ctx: &Context<Model>) -> Html {
    if model.toasts.is_empty() {
        return html! {};
    }

    html! {
        <div class="toast-stack">
            { for model.toasts.iter().map(|toast| {
                let id = toast.id;
                let class = match toast.notification.severity {
                    NotificationSeverity::Info => "toast",
                    NotificationSeverity::Destructive => "toast toast-destructive",
                };
                html! {
                    <div class={class} key={id.to_string()} role="status">
                        <div class="toast-body">
                            <strong>{ &toast.notification.title }</strong>
                            <p>{ &toast.notification.message }</p>
                        </div>
                        <button
                            class="toast-close"
                            title="Dismiss"
                            onclick={ctx.link().callback(move |_| Msg::DismissToast(id))}
                        >
                            <i class="fa-solid fa-xmark"></i>
                        </button>
                    </div>
                }
            })}
        </div>
    }
}
