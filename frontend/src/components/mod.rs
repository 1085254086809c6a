pub mod header;
pub mod knowledge_panel;
pub mod results;
pub mod toasts;
pub mod upload_section;
pub mod utils;
