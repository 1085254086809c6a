//! Image selection, analysis and knowledge lookup, independent of any renderer.

mod controller;
mod error;
mod image_ref;
mod notify;
mod state;

pub use controller::{SubscriptionId, WorkflowController};
pub use error::WorkflowError;
pub use image_ref::{
    ImageHandle, ImageId, ImagePayload, ImageRefManager, ObjectUrlAllocator, PreviewAllocator,
};
pub use notify::{Notification, NotificationSeverity, Notifier};
pub use state::{WorkflowPhase, WorkflowState};
