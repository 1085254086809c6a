use gloo_file::File as GlooFile;
use gloo_timers::callback::Timeout;
use shared::{BoundingBox, Severity};
use std::cell::RefCell;
use std::rc::Rc;
use web_sys::FileList;
use yew::prelude::*;

// Debounce function to limit button events
pub fn debounce<F>(duration: i32, callback: F) -> Callback<MouseEvent>
where
    F: Fn() + Clone + 'static,
{
    let timeout = Rc::new(RefCell::new(None::<Timeout>));
    let timeout_clone = Rc::clone(&timeout);

    Callback::from(move |_| {
        let mut timeout_ref = timeout_clone.borrow_mut();

        if let Some(old_timeout) = timeout_ref.take() {
            old_timeout.cancel();
        }

        let inner_callback = callback.clone();
        let new_timeout = Timeout::new(duration as u32, move || {
            inner_callback();
        });

        *timeout_ref = Some(new_timeout);
    })
}

/// Files from an input or drop. Media type checks happen when the image is selected.
pub fn extract_files(file_list: &FileList) -> Vec<GlooFile> {
    (0..file_list.length())
        .filter_map(|i| file_list.item(i))
        .map(GlooFile::from)
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn css_class(self) -> &'static str {
        match self {
            ConfidenceTier::High => "confidence-high",
            ConfidenceTier::Medium => "confidence-medium",
            ConfidenceTier::Low => "confidence-low",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            ConfidenceTier::High => "fa-solid fa-circle-check",
            _ => "fa-solid fa-triangle-exclamation",
        }
    }
}

pub fn confidence_tier(confidence: f32) -> ConfidenceTier {
    if confidence >= 0.8 {
        ConfidenceTier::High
    } else if confidence >= 0.6 {
        ConfidenceTier::Medium
    } else {
        ConfidenceTier::Low
    }
}

pub fn format_percent(confidence: f32) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// Width for a confidence bar. Only the bar is clamped; the label shows the raw value.
pub fn bar_width(confidence: f32) -> String {
    format!("width: {:.1}%", (confidence * 100.0).clamp(0.0, 100.0))
}

pub fn bounding_box_style(bbox: &BoundingBox) -> String {
    format!(
        "left: {}%; top: {}%; width: {}%; height: {}%;",
        bbox.x, bbox.y, bbox.width, bbox.height
    )
}

pub fn severity_class(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "severity-high",
        Severity::Medium => "severity-medium",
        Severity::Low => "severity-low",
    }
}
