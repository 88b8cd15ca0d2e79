pub mod coordinator;
pub mod lifecycle;
pub mod queue;
pub mod ranking;
pub mod worker;
