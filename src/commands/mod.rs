pub mod analyze;
pub mod http;
pub mod pipeline;
pub mod settings;
