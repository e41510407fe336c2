pub mod retry;

pub use retry::RetryPolicy;
pub use tokio_util::sync::CancellationToken;
