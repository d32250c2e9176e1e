//! Utility modules supporting tracker operations.
//!
//! - [`HttpClient`]: shared reqwest client for JSON POSTs with timeouts and a crate user agent
//! - [`RetryConfig`]: configuration for retry logic with exponential backoff
//! - [`with_retry`]: execute an operation with automatic retry on transient errors
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use linear_mcp::tracker::TrackerError;
//! use linear_mcp::utils::{with_retry, RetryConfig};
//!
//! # async fn fetch_data() -> Result<String, TrackerError> { Ok("data".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), TrackerError> {
//! let config = RetryConfig::with_retries(3);
//! let data = with_retry(config, || fetch_data()).await?;
//! # Ok(())
//! # }
//! ```

mod http;
mod retry;

pub use http::HttpClient;
pub use retry::{with_retry, RetryConfig, TransientError};
