pub mod block;
pub mod compose;
pub mod config;
