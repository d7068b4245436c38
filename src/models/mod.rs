pub mod analysis;
pub mod insight;
pub mod repo;
pub mod score;
pub mod snapshot;
pub mod task;
