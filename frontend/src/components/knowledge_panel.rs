use super::super::Model;
use super::utils::severity_class;
use shared::KnowledgeRecord;
use yew::prelude::*;

pub fn render_knowledge_panel(model: &Model) -> Html {
    if model.workflow.loading_knowledge {
        return html! {
            <div class="knowledge-panel loading">
                <div class="skeleton skeleton-title"></div>
                { for (0..3).map(|_| html! {
                    <div class="skeleton-group">
                        <div class="skeleton skeleton-heading"></div>
                        <div class="skeleton skeleton-line"></div>
                        <div class="skeleton skeleton-line short"></div>
                    </div>
                })}
            </div>
        };
    }

    match &model.workflow.knowledge {
        Some(record) => render_record(record),
        None => html! {
            <div class="knowledge-panel empty">
                <i class="fa-solid fa-book-open fa-2x"></i>
                <p>{"No detailed information is available for this result."}</p>
            </div>
        },
    }
}

fn render_record(record: &KnowledgeRecord) -> Html {
    html! {
        <div class="knowledge-panel">
            <div class="knowledge-header">
                <h2><i class="fa-solid fa-circle-info"></i>{" Disease Information"}</h2>
                {
                    if let Some(severity) = record.severity {
                        html! {
                            <span class={classes!("badge", severity_class(severity))}>
                                { format!("{} Severity", severity.as_ref().to_uppercase()) }
                            </span>
                        }
                    } else {
                        html! {}
                    }
                }
            </div>
            <h3>{ &record.disease_name }</h3>
            {
                if let Some(description) = &record.description {
                    html! { <p class="description">{ description }</p> }
                } else {
                    html! {}
                }
            }
            { render_section("Symptoms", "fa-solid fa-stethoscope", &record.symptoms) }
            { render_section("Causes", "fa-solid fa-bug", &record.causes) }
            { render_section("Treatment", "fa-solid fa-pills", &record.treatments) }
            {
                match &record.prevention {
                    Some(prevention) if !prevention.is_empty() => {
                        render_section("Prevention", "fa-solid fa-shield-halved", prevention)
                    }
                    _ => html! {},
                }
            }
        </div>
    }
}

fn render_section(title: &str, icon: &'static str, items: &[String]) -> Html {
    html! {
        <section class="knowledge-section">
            <h4><i class={icon}></i>{ format!(" {}", title) }</h4>
            <ul>
                { for items.iter().map(|item| html! { <li>{ item }</li> }) }
            </ul>
        </section>
    }
}
