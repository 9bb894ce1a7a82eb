//! The concrete agents behind the chat workflows.

pub mod content_recall;
pub mod duck_style;
pub mod listener;
pub mod therapy_tips;

pub use content_recall::ContentRecallAgent;
pub use duck_style::DuckStyleAgent;
pub use listener::ListenerAgent;
pub use therapy_tips::TherapyTipsAgent;
