pub mod correlation;
pub mod dispatcher;
pub mod inbound;
pub mod stats;
pub mod task;
