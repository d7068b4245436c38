pub mod cache;
pub mod json_map;
pub mod tasks;
