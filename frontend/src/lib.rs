//! Plant disease analysis: the workflow core and its HTTP clients.
//!
//! The Yew app in `main.rs` renders [`workflow::WorkflowState`] and forwards user input to
//! [`workflow::WorkflowController`].

pub mod api;
pub mod config;
pub mod workflow;
