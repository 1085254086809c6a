mod components;

use components::header::{render_header, render_how_it_works};
use components::knowledge_panel::render_knowledge_panel;
use components::results::render_results;
use components::toasts::render_toasts;
use components::upload_section::render_upload_section;
use components::utils::extract_files;
use frontend::api::{HttpKnowledgeClient, HttpPredictionClient};
use frontend::config::ApiConfig;
use frontend::workflow::{
    ImagePayload, ImageRefManager, Notification, Notifier, ObjectUrlAllocator,
    WorkflowController, WorkflowState,
};
use gloo_events::EventListener;
use gloo_file::File as GlooFile;
use gloo_timers::callback::Timeout;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{ClipboardEvent, DragEvent};
use yew::prelude::*;

struct Toast {
    id: u64,
    notification: Notification,
}

// Yew msg components
enum Msg {
    // Image selection
    FilesAdded(Vec<GlooFile>),
    PayloadRead(ImagePayload),
    ReadFailed(String),

    // Workflow
    Analyze,
    Reset,
    WorkflowChanged(WorkflowState),

    // Notifications
    Notify(Notification),
    DismissToast(u64),

    // Input events
    SetDragging(bool),
    HandleDrop(DragEvent),
    HandlePaste(ClipboardEvent),
}

/// Routes controller notifications into the component as toasts.
struct ToastNotifier(Callback<Notification>);

impl Notifier for ToastNotifier {
    fn notify(&self, notification: Notification) {
        self.0.emit(notification);
    }
}

// Main component
struct Model {
    controller: Rc<WorkflowController>,
    workflow: WorkflowState,
    toasts: Vec<Toast>,
    toast_timeouts: HashMap<u64, Timeout>,
    next_toast_id: u64,
    toast_duration_ms: u32,
    is_dragging: bool,
    reading_file: bool,
    paste_listener: Option<EventListener>,
}

impl Component for Model {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let config = ApiConfig::from_build_env();
        log::info!("Using API base '{}'", config.base_url);

        let controller = Rc::new(WorkflowController::new(
            ImageRefManager::new(Rc::new(ObjectUrlAllocator::default())),
            Rc::new(HttpPredictionClient::new(&config.base_url)),
            Rc::new(HttpKnowledgeClient::new(&config.base_url)),
            Rc::new(ToastNotifier(ctx.link().callback(Msg::Notify))),
        ));

        let on_change = ctx.link().callback(Msg::WorkflowChanged);
        controller.subscribe(move |state| on_change.emit(state.clone()));

        let paste_listener = web_sys::window().map(|window| {
            let link = ctx.link().clone();
            EventListener::new(&window, "paste", move |event| {
                if let Some(clipboard_event) = event.dyn_ref::<ClipboardEvent>() {
                    link.send_message(Msg::HandlePaste(clipboard_event.clone()));
                }
            })
        });

        Self {
            workflow: controller.state(),
            controller,
            toasts: Vec::new(),
            toast_timeouts: HashMap::new(),
            next_toast_id: 0,
            toast_duration_ms: config.toast_duration_ms,
            is_dragging: false,
            reading_file: false,
            paste_listener,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            // Image selection
            Msg::FilesAdded(files) => self.handle_files_added(ctx, files),
            Msg::PayloadRead(payload) => self.handle_payload_read(payload),
            Msg::ReadFailed(reason) => {
                self.reading_file = false;
                log::error!("Failed to read selected file: {}", reason);
                self.push_toast(
                    ctx,
                    Notification::destructive("Could not read file", "Please try another image."),
                );
                true
            }

            // Workflow
            Msg::Analyze => {
                let controller = self.controller.clone();
                spawn_local(async move { controller.analyze().await });
                false
            }
            Msg::Reset => {
                self.controller.reset();
                false
            }
            Msg::WorkflowChanged(state) => {
                self.workflow = state;
                true
            }

            // Notifications
            Msg::Notify(notification) => self.push_toast(ctx, notification),
            Msg::DismissToast(id) => {
                self.toast_timeouts.remove(&id);
                let before = self.toasts.len();
                self.toasts.retain(|toast| toast.id != id);
                self.toasts.len() != before
            }

            // Input events
            Msg::SetDragging(is_dragging) => {
                self.is_dragging = is_dragging;
                true
            }
            Msg::HandleDrop(event) => self.handle_drop(ctx, event),
            Msg::HandlePaste(event) => self.handle_paste(ctx, event),
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container">
                { render_header() }

                <main class="main-content">
                    { render_upload_section(self, ctx) }
                    {
                        if self.workflow.has_results() {
                            html! {
                                <div class="results-grid">
                                    { render_results(self, ctx) }
                                    { render_knowledge_panel(self) }
                                </div>
                            }
                        } else {
                            html! {}
                        }
                    }
                    {
                        if self.workflow.image.is_none() {
                            render_how_it_works()
                        } else {
                            html! {}
                        }
                    }
                </main>

                { render_toasts(self, ctx) }

                <footer class="app-footer">
                    <p>{"Plant Disease Detector | Rust + WASM"}</p>
                </footer>
            </div>
        }
    }
}

// Handler methods
impl Model {
    fn handle_files_added(&mut self, ctx: &Context<Self>, files: Vec<GlooFile>) -> bool {
        if files.len() > 1 {
            log::warn!("{} files supplied, analysing only the first", files.len());
        }
        let Some(file) = files.into_iter().next() else {
            return false;
        };

        self.reading_file = true;
        let link = ctx.link().clone();
        spawn_local(async move {
            match gloo_file::futures::read_as_bytes(&file).await {
                Ok(bytes) => link.send_message(Msg::PayloadRead(ImagePayload::new(
                    file.name(),
                    file.raw_mime_type(),
                    bytes,
                ))),
                Err(e) => link.send_message(Msg::ReadFailed(format!("{:?}", e))),
            }
        });

        true
    }

    fn handle_payload_read(&mut self, payload: ImagePayload) -> bool {
        self.reading_file = false;
        if let Err(err) = self.controller.select_image(payload) {
            log::warn!("Image rejected: {}", err);
        }
        true
    }

    fn push_toast(&mut self, ctx: &Context<Self>, notification: Notification) -> bool {
        let id = self.next_toast_id;
        self.next_toast_id += 1;

        let link = ctx.link().clone();
        let timeout = Timeout::new(self.toast_duration_ms, move || {
            link.send_message(Msg::DismissToast(id));
        });
        self.toast_timeouts.insert(id, timeout);
        self.toasts.push(Toast { id, notification });
        true
    }

    fn handle_drop(&mut self, ctx: &Context<Self>, event: DragEvent) -> bool {
        event.prevent_default();
        self.is_dragging = false;

        if let Some(file_list) = event.data_transfer().and_then(|dt| dt.files()) {
            self.handle_files_added(ctx, extract_files(&file_list));
        }

        true
    }

    fn handle_paste(&mut self, ctx: &Context<Self>, event: ClipboardEvent) -> bool {
        if let Some(file_list) = event.clipboard_data().and_then(|dt| dt.files()) {
            let files = extract_files(&file_list);
            if !files.is_empty() {
                event.prevent_default();
                return self.handle_files_added(ctx, files);
            }
        }
        false
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("App starting...");
    yew::Renderer::<Model>::new().render();
}
