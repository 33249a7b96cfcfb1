// Worker boundary: the task/reply link and a reference HTTP chunk worker.

pub mod channel;
pub mod http_fetcher;
pub mod traits;
pub mod worker;
