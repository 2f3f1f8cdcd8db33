pub mod handlers;
pub mod matcher;
pub mod pipeline;
pub mod router;
pub mod worker;
