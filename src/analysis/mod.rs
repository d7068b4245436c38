pub mod history;
pub mod metrics;
pub mod narrative;
pub mod scoring;
pub mod signals;
pub mod structure;
