pub mod poller;
pub mod progress;
