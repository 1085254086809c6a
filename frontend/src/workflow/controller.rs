use std::cell::{Cell, RefCell};
use std::rc::Rc;

use shared::PredictionSet;

use super::{
    ImageHandle, ImageId, ImagePayload, ImageRefManager, Notification, Notifier, WorkflowError,
    WorkflowState,
};
use crate::api::{ClientError, KnowledgeService, PredictionService};

pub type SubscriptionId = u64;

type Listener = Rc<dyn Fn(&WorkflowState)>;

/// Identifies one analysis cycle. Results carrying an older cycle are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cycle {
    generation: u64,
    image: ImageId,
}

struct Inner {
    state: WorkflowState,
    generation: u64,
}

/// Drives select → predict → knowledge lookup for a single active image.
///
/// The controller is the only writer of [`WorkflowState`]. Every change is pushed to the
/// subscribers as a snapshot. All work runs on one thread; `analyze` suspends on the remote
/// calls, and `select_image` or `reset` may run meanwhile. When they do, the in-flight cycle
/// is superseded and whatever it returns later is discarded.
pub struct WorkflowController {
    images: ImageRefManager,
    predictions: Rc<dyn PredictionService>,
    knowledge: Rc<dyn KnowledgeService>,
    notifier: Rc<dyn Notifier>,
    inner: RefCell<Inner>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_subscription: Cell<SubscriptionId>,
}

impl WorkflowController {
    pub fn new(
        images: ImageRefManager,
        predictions: Rc<dyn PredictionService>,
        knowledge: Rc<dyn KnowledgeService>,
        notifier: Rc<dyn Notifier>,
    ) -> Self {
        Self {
            images,
            predictions,
            knowledge,
            notifier,
            inner: RefCell::new(Inner {
                state: WorkflowState::default(),
                generation: 0,
            }),
            listeners: RefCell::new(Vec::new()),
            next_subscription: Cell::new(0),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.inner.borrow().state.clone()
    }

    pub fn subscribe(&self, listener: impl Fn(&WorkflowState) + 'static) -> SubscriptionId {
        let id = self.next_subscription.get();
        self.next_subscription.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.borrow_mut().retain(|(sid, _)| *sid != id);
    }

    /// Installs a new image and drops all results from the previous one.
    ///
    /// Non-image payloads are rejected before any state changes.
    pub fn select_image(&self, payload: ImagePayload) -> Result<(), WorkflowError> {
        let handle = match self.images.select(payload) {
            Ok(handle) => handle,
            Err(err) => {
                self.notifier.notify(Notification::destructive(
                    "Unsupported file",
                    "Please choose an image file (JPG, PNG, WEBP, GIF).",
                ));
                return Err(err);
            }
        };

        log::info!("Selected image {}", handle.payload().file_name());
        let previous = self.mutate(|inner| {
            inner.generation += 1;
            let previous = inner.state.image.replace(handle);
            inner.state.predictions = PredictionSet::default();
            inner.state.knowledge = None;
            inner.state.analyzing = false;
            inner.state.loading_knowledge = false;
            previous
        });
        if let Some(previous) = previous {
            self.images.release(&previous);
        }

        self.publish();
        Ok(())
    }

    /// Runs one analysis cycle for the active image.
    ///
    /// Failures end up as notifications; nothing is returned to the caller. A call made while
    /// an analysis is already in flight is ignored.
    pub async fn analyze(&self) {
        let started = self.mutate(|inner| {
            let Some(image) = inner.state.image.clone() else {
                return Err(WorkflowError::NoImageSelected);
            };
            if inner.state.analyzing {
                return Ok(None);
            }

            inner.generation += 1;
            inner.state.predictions = PredictionSet::default();
            inner.state.knowledge = None;
            inner.state.loading_knowledge = false;
            inner.state.analyzing = true;

            let cycle = Cycle {
                generation: inner.generation,
                image: image.id(),
            };
            Ok(Some((cycle, image)))
        });

        let (cycle, image) = match started {
            Ok(Some(started)) => started,
            Ok(None) => {
                log::debug!("Analysis already in progress, ignoring request");
                return;
            }
            Err(err) => {
                log::warn!("{}", err);
                self.notifier.notify(Notification::destructive(
                    "No image selected",
                    "Please select an image first",
                ));
                return;
            }
        };
        self.publish();

        let file_name = image.payload().file_name();
        log::info!("Submitting {} for analysis", file_name);
        let outcome = self.predictions.predict(image.payload()).await;

        if !self.is_current(cycle) {
            log::debug!("Discarding stale prediction for {}", file_name);
            return;
        }

        match outcome {
            Ok(predictions) => {
                let count = predictions.len();
                let primary = predictions.primary().map(|p| p.disease_name.clone());

                self.mutate(|inner| {
                    inner.state.predictions = predictions;
                    inner.state.analyzing = false;
                });
                self.publish();
                self.notifier.notify(Notification::info(
                    "Analysis complete",
                    format!("Detected {} potential issue(s)", count),
                ));

                if let Some(disease_name) = primary {
                    self.analyze_knowledge(cycle, disease_name).await;
                }
            }
            Err(err) => {
                log::error!("Analysis error for {}: {}", file_name, err);
                self.mutate(|inner| inner.state.analyzing = false);
                self.publish();
                self.notifier.notify(Notification::destructive(
                    "Analysis failed",
                    "Unable to analyze the image. Please try again.",
                ));
            }
        }
    }

    async fn analyze_knowledge(&self, cycle: Cycle, disease_name: String) {
        self.mutate(|inner| inner.state.loading_knowledge = true);
        self.publish();

        let outcome = self.knowledge.lookup(&disease_name).await;

        if !self.is_current(cycle) {
            log::debug!("Discarding stale knowledge record for {}", disease_name);
            return;
        }

        let record = match outcome {
            Ok(record) => Some(record),
            Err(ClientError::NotFound) => {
                log::warn!("No knowledge base entry for {}", disease_name);
                None
            }
            Err(err) => {
                log::error!("Knowledge base error for {}: {}", disease_name, err);
                None
            }
        };
        let missing = record.is_none();

        self.mutate(|inner| {
            inner.state.knowledge = record;
            inner.state.loading_knowledge = false;
        });
        self.publish();

        if missing {
            self.notifier.notify(Notification::destructive(
                "Knowledge base unavailable",
                "Could not load detailed information for this disease.",
            ));
        }
    }

    /// Back to `Idle`: releases the image and clears every result and flag.
    pub fn reset(&self) {
        let previous = self.mutate(|inner| {
            inner.generation += 1;
            std::mem::take(&mut inner.state).image
        });
        if let Some(previous) = previous {
            self.images.release(&previous);
        }

        self.publish();
    }

    fn is_current(&self, cycle: Cycle) -> bool {
        let inner = self.inner.borrow();
        inner.generation == cycle.generation
            && inner.state.image.as_ref().map(ImageHandle::id) == Some(cycle.image)
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }

    fn publish(&self) {
        let snapshot = self.state();
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener(&snapshot);
        }
    }
}

impl Drop for WorkflowController {
    fn drop(&mut self) {
        if let Some(image) = self.inner.get_mut().state.image.take() {
            self.images.release(&image);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use shared::{BoundingBox, KnowledgeRecord, Prediction, Severity};

    use super::*;
    use crate::workflow::NotificationSeverity;
    use crate::workflow::image_ref::testing::{CountingAllocator, png};

    type Reply<T> = oneshot::Receiver<Result<T, ClientError>>;

    /// Answers calls in order; each answer is either ready or released later by the test.
    struct Script<T> {
        replies: RefCell<VecDeque<Reply<T>>>,
        calls: RefCell<Vec<String>>,
    }

    impl<T> Default for Script<T> {
        fn default() -> Self {
            Self {
                replies: RefCell::new(VecDeque::new()),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl<T> Script<T> {
        fn reply(&self, result: Result<T, ClientError>) {
            let tx = self.defer();
            if tx.send(result).is_err() {
                panic!("scripted reply receiver dropped");
            }
        }

        fn defer(&self) -> oneshot::Sender<Result<T, ClientError>> {
            let (tx, rx) = oneshot::channel();
            self.replies.borrow_mut().push_back(rx);
            tx
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        async fn answer(&self, call: &str) -> Result<T, ClientError> {
            self.calls.borrow_mut().push(call.to_string());
            let reply = self
                .replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected call: {call}"));
            reply
                .await
                .unwrap_or_else(|_| Err(ClientError::Network("reply dropped".into())))
        }
    }

    #[async_trait(?Send)]
    impl PredictionService for Script<PredictionSet> {
        async fn predict(&self, image: &ImagePayload) -> Result<PredictionSet, ClientError> {
            self.answer(image.file_name()).await
        }
    }

    #[async_trait(?Send)]
    impl KnowledgeService for Script<KnowledgeRecord> {
        async fn lookup(&self, disease_name: &str) -> Result<KnowledgeRecord, ClientError> {
            self.answer(disease_name).await
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        seen: RefCell<Vec<Notification>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            self.seen.borrow_mut().push(notification);
        }
    }

    impl RecordingNotifier {
        fn all(&self) -> Vec<Notification> {
            self.seen.borrow().clone()
        }

        fn titles(&self) -> Vec<String> {
            self.seen.borrow().iter().map(|n| n.title.clone()).collect()
        }
    }

    struct Harness {
        controller: WorkflowController,
        allocator: Rc<CountingAllocator>,
        predictions: Rc<Script<PredictionSet>>,
        knowledge: Rc<Script<KnowledgeRecord>>,
        notifier: Rc<RecordingNotifier>,
    }

    fn harness() -> Harness {
        let allocator = Rc::new(CountingAllocator::default());
        let predictions = Rc::new(Script::<PredictionSet>::default());
        let knowledge = Rc::new(Script::<KnowledgeRecord>::default());
        let notifier = Rc::new(RecordingNotifier::default());

        let controller = WorkflowController::new(
            ImageRefManager::new(allocator.clone()),
            predictions.clone(),
            knowledge.clone(),
            notifier.clone(),
        );

        Harness {
            controller,
            allocator,
            predictions,
            knowledge,
            notifier,
        }
    }

    fn prediction(name: &str, confidence: f32) -> Prediction {
        Prediction {
            disease_name: name.to_string(),
            confidence,
            bounding_box: None,
        }
    }

    fn set(predictions: Vec<Prediction>) -> PredictionSet {
        predictions.into()
    }

    fn record(name: &str, severity: Option<Severity>) -> KnowledgeRecord {
        KnowledgeRecord {
            disease_name: name.to_string(),
            symptoms: vec!["white spots".into()],
            causes: vec!["fungus".into()],
            treatments: vec!["fungicide".into()],
            prevention: None,
            severity,
            description: None,
        }
    }

    #[test]
    fn select_then_reset_returns_to_idle_baseline() {
        let h = harness();

        h.controller.select_image(png("leaf.png")).unwrap();
        assert_eq!(h.allocator.outstanding(), 1);

        h.controller.reset();

        assert!(h.controller.state().is_idle());
        assert_eq!(h.allocator.outstanding(), 0);
        assert!(h.notifier.all().is_empty());
    }

    #[test]
    fn reset_twice_matches_reset_once() {
        let h = harness();
        h.predictions.reply(Ok(set(vec![prediction("Rust", 0.7)])));
        h.knowledge.reply(Ok(record("Rust", None)));
        h.controller.select_image(png("leaf.png")).unwrap();
        block_on(h.controller.analyze());

        h.controller.reset();
        let once = h.controller.state();
        h.controller.reset();

        assert_eq!(h.controller.state(), once);
        assert!(once.is_idle());
        assert_eq!(h.allocator.outstanding(), 0);
    }

    #[test]
    fn selecting_again_releases_previous_image() {
        let h = harness();

        h.controller.select_image(png("a.png")).unwrap();
        h.controller.select_image(png("b.png")).unwrap();
        h.controller.select_image(png("c.png")).unwrap();

        assert_eq!(h.allocator.outstanding(), 1);
        let state = h.controller.state();
        assert_eq!(state.image.unwrap().payload().file_name(), "c.png");
    }

    #[test]
    fn non_image_is_rejected_without_touching_state() {
        let h = harness();
        h.predictions.reply(Ok(set(vec![prediction("Rust", 0.7)])));
        h.knowledge.reply(Ok(record("Rust", Some(Severity::Low))));
        h.controller.select_image(png("leaf.png")).unwrap();
        block_on(h.controller.analyze());
        let before = h.controller.state();

        let err = h
            .controller
            .select_image(ImagePayload::new("notes.txt", "text/plain", vec![b'x']))
            .unwrap_err();

        assert_eq!(err, WorkflowError::InvalidMediaType("text/plain".into()));
        assert_eq!(h.controller.state(), before);
        assert_eq!(h.allocator.outstanding(), 1);
        let last = h.notifier.all().pop().unwrap();
        assert_eq!(last.title, "Unsupported file");
        assert_eq!(last.severity, NotificationSeverity::Destructive);
    }

    #[test]
    fn analyze_without_image_reports_and_issues_nothing() {
        let h = harness();

        block_on(h.controller.analyze());

        assert!(h.predictions.calls().is_empty());
        assert!(h.controller.state().is_idle());
        let notices = h.notifier.all();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "No image selected");
        assert_eq!(notices[0].severity, NotificationSeverity::Destructive);
    }

    #[test]
    fn powdery_mildew_cycle_completes() {
        let h = harness();
        h.predictions.reply(Ok(set(vec![Prediction {
            disease_name: "Powdery Mildew".into(),
            confidence: 0.87,
            bounding_box: Some(BoundingBox {
                x: 10.0,
                y: 15.0,
                width: 30.0,
                height: 25.0,
            }),
        }])));
        h.knowledge
            .reply(Ok(record("Powdery Mildew", Some(Severity::Medium))));

        h.controller.select_image(png("leaf.png")).unwrap();
        block_on(h.controller.analyze());

        let state = h.controller.state();
        assert_eq!(state.predictions.len(), 1);
        assert_eq!(
            state.knowledge.as_ref().and_then(|k| k.severity),
            Some(Severity::Medium)
        );
        assert!(!state.analyzing);
        assert!(!state.loading_knowledge);
        assert_eq!(state.phase(), crate::workflow::WorkflowPhase::Analyzed);
        assert_eq!(h.predictions.calls(), ["leaf.png"]);
        assert_eq!(h.knowledge.calls(), ["Powdery Mildew"]);
        assert_eq!(
            h.notifier.all(),
            [Notification::info(
                "Analysis complete",
                "Detected 1 potential issue(s)"
            )]
        );
    }

    #[test]
    fn knowledge_is_looked_up_for_top_entry_only() {
        let h = harness();
        h.predictions.reply(Ok(set(vec![
            prediction("Late Blight", 0.93),
            prediction("Early Blight", 0.05),
            prediction("Leaf Mold", 0.02),
        ])));
        h.knowledge.reply(Ok(record("Late Blight", Some(Severity::High))));

        h.controller.select_image(png("tomato.jpg")).unwrap();
        block_on(h.controller.analyze());

        assert_eq!(h.knowledge.calls(), ["Late Blight"]);
        assert_eq!(h.controller.state().predictions.len(), 3);
    }

    #[test]
    fn first_entry_wins_even_when_unsorted() {
        let h = harness();
        h.predictions.reply(Ok(set(vec![
            prediction("Leaf Spot", 0.2),
            prediction("Rust", 0.9),
            prediction("Odd", 1.4),
        ])));
        h.knowledge.reply(Ok(record("Leaf Spot", None)));

        h.controller.select_image(png("leaf.png")).unwrap();
        block_on(h.controller.analyze());

        let state = h.controller.state();
        assert_eq!(h.knowledge.calls(), ["Leaf Spot"]);
        assert_eq!(state.predictions[2].confidence, 1.4);
    }

    #[test]
    fn empty_result_skips_knowledge_lookup() {
        let h = harness();
        h.predictions.reply(Ok(PredictionSet::default()));

        h.controller.select_image(png("healthy.png")).unwrap();
        block_on(h.controller.analyze());

        let state = h.controller.state();
        assert!(h.knowledge.calls().is_empty());
        assert!(state.predictions.is_empty());
        assert!(state.knowledge.is_none());
        assert!(!state.analyzing);
        assert!(!state.loading_knowledge);
        assert_eq!(
            h.notifier.all(),
            [Notification::info(
                "Analysis complete",
                "Detected 0 potential issue(s)"
            )]
        );
    }

    #[test]
    fn prediction_failure_clears_flag_and_notifies() {
        let h = harness();
        h.predictions.reply(Err(ClientError::Service {
            status: 500,
            body: "Internal Server Error".into(),
        }));

        h.controller.select_image(png("leaf.png")).unwrap();
        block_on(h.controller.analyze());

        let state = h.controller.state();
        assert!(state.predictions.is_empty());
        assert!(state.knowledge.is_none());
        assert!(!state.analyzing);
        assert!(h.knowledge.calls().is_empty());

        let notices = h.notifier.all();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Analysis failed");
        assert_eq!(notices[0].severity, NotificationSeverity::Destructive);
        assert!(!notices[0].message.contains("500"));
    }

    #[test]
    fn knowledge_not_found_keeps_predictions_and_drops_old_record() {
        let h = harness();
        h.controller.select_image(png("potato.png")).unwrap();

        h.predictions
            .reply(Ok(set(vec![prediction("Powdery Mildew", 0.8)])));
        h.knowledge
            .reply(Ok(record("Powdery Mildew", Some(Severity::Medium))));
        block_on(h.controller.analyze());
        assert!(h.controller.state().knowledge.is_some());

        h.predictions.reply(Ok(set(vec![prediction("Late Blight", 0.9)])));
        h.knowledge.reply(Err(ClientError::NotFound));
        block_on(h.controller.analyze());

        let state = h.controller.state();
        assert!(state.knowledge.is_none());
        assert!(!state.loading_knowledge);
        assert_eq!(state.predictions.len(), 1);
        assert_eq!(state.predictions[0].disease_name, "Late Blight");
        assert_eq!(h.knowledge.calls(), ["Powdery Mildew", "Late Blight"]);
        assert_eq!(
            h.notifier.titles().last().map(String::as_str),
            Some("Knowledge base unavailable")
        );
    }

    #[test]
    fn knowledge_failure_does_not_block_next_analysis() {
        let h = harness();
        h.controller.select_image(png("leaf.png")).unwrap();

        h.predictions.reply(Ok(set(vec![prediction("Rust", 0.6)])));
        h.knowledge
            .reply(Err(ClientError::Network("connection reset".into())));
        block_on(h.controller.analyze());

        h.predictions.reply(Ok(set(vec![prediction("Rust", 0.6)])));
        h.knowledge.reply(Ok(record("Rust", Some(Severity::Low))));
        block_on(h.controller.analyze());

        let state = h.controller.state();
        assert_eq!(h.predictions.calls().len(), 2);
        assert_eq!(
            state.knowledge.and_then(|k| k.severity),
            Some(Severity::Low)
        );
    }

    #[test]
    fn stale_prediction_is_discarded_after_reselect() {
        let h = harness();
        let pending = h.predictions.defer();
        h.controller.select_image(png("a.png")).unwrap();

        block_on(async {
            futures::join!(h.controller.analyze(), async {
                assert!(h.controller.state().analyzing);
                h.controller.select_image(png("b.png")).unwrap();
                pending
                    .send(Ok(set(vec![prediction("Rust", 0.9)])))
                    .unwrap();
            });
        });

        let state = h.controller.state();
        assert_eq!(state.image.as_ref().unwrap().payload().file_name(), "b.png");
        assert!(state.predictions.is_empty());
        assert!(state.knowledge.is_none());
        assert!(!state.analyzing);
        assert!(h.knowledge.calls().is_empty());
        assert!(h.notifier.all().is_empty());
        assert_eq!(h.allocator.outstanding(), 1);

        h.predictions.reply(Ok(PredictionSet::default()));
        block_on(h.controller.analyze());
        assert_eq!(h.predictions.calls(), ["a.png", "b.png"]);
    }

    #[test]
    fn stale_knowledge_is_discarded_after_reselect() {
        let h = harness();
        h.predictions.reply(Ok(set(vec![prediction("Rust", 0.9)])));
        let pending = h.knowledge.defer();
        h.controller.select_image(png("a.png")).unwrap();

        block_on(async {
            futures::join!(h.controller.analyze(), async {
                assert!(h.controller.state().loading_knowledge);
                h.controller.select_image(png("b.png")).unwrap();
                pending.send(Ok(record("Rust", None))).unwrap();
            });
        });

        let state = h.controller.state();
        assert!(state.knowledge.is_none());
        assert!(state.predictions.is_empty());
        assert!(!state.loading_knowledge);
        assert_eq!(state.phase(), crate::workflow::WorkflowPhase::ImageSelected);
        assert_eq!(h.notifier.titles(), ["Analysis complete"]);
    }

    #[test]
    fn reset_during_analysis_discards_result() {
        let h = harness();
        let pending = h.predictions.defer();
        h.controller.select_image(png("a.png")).unwrap();

        block_on(async {
            futures::join!(h.controller.analyze(), async {
                h.controller.reset();
                pending
                    .send(Err(ClientError::Network("timed out".into())))
                    .unwrap();
            });
        });

        assert!(h.controller.state().is_idle());
        assert!(h.notifier.all().is_empty());
        assert_eq!(h.allocator.outstanding(), 0);
    }

    #[test]
    fn second_analyze_while_in_flight_is_ignored() {
        let h = harness();
        let pending = h.predictions.defer();
        h.knowledge.reply(Ok(record("Rust", None)));
        h.controller.select_image(png("a.png")).unwrap();

        block_on(async {
            futures::join!(h.controller.analyze(), async {
                h.controller.analyze().await;
                pending
                    .send(Ok(set(vec![prediction("Rust", 0.9)])))
                    .unwrap();
            });
        });

        assert_eq!(h.predictions.calls(), ["a.png"]);
        assert_eq!(h.controller.state().predictions.len(), 1);
    }

    #[test]
    fn subscribers_never_see_both_flags_set() {
        let h = harness();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        h.controller.subscribe(move |state| {
            sink.borrow_mut()
                .push((state.analyzing, state.loading_knowledge));
        });
        h.predictions.reply(Ok(set(vec![prediction("Rust", 0.9)])));
        h.knowledge.reply(Ok(record("Rust", None)));

        h.controller.select_image(png("a.png")).unwrap();
        block_on(h.controller.analyze());

        assert_eq!(
            *seen.borrow(),
            [
                (false, false),
                (true, false),
                (false, false),
                (false, true),
                (false, false)
            ]
        );
    }

    #[test]
    fn unsubscribed_listener_stops_receiving() {
        let h = harness();
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let id = h.controller.subscribe(move |_| counter.set(counter.get() + 1));

        h.controller.select_image(png("a.png")).unwrap();
        h.controller.unsubscribe(id);
        h.controller.reset();

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn dropping_controller_releases_active_image() {
        let h = harness();
        h.controller.select_image(png("a.png")).unwrap();
        let allocator = h.allocator.clone();

        drop(h);

        assert_eq!(allocator.outstanding(), 0);
    }
}
