pub mod batch;
pub mod checkers;
pub mod dedup;
pub mod jobs;
pub mod notification;
pub mod scheduler;
