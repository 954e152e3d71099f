pub mod busy;
pub mod controller;

pub use busy::{BusyFlag, BusyGuard};
pub use controller::{Dequeued, JobQueue, JobReceiver, QueueError};
