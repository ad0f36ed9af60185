//! Request optimizer for the Courier HTTP layer
//!
//! Reduces redundant network traffic:
//!
//! - [`RequestOptimizer::deduplicate`] shares one in-flight request among
//!   callers using the same key
//! - [`RequestOptimizer::batch`] groups requests under a batch id and runs
//!   them together when the batch fills or its window elapses
//! - [`Debouncer`] and [`Throttler`] rate-limit call sites
//!
//! [`RequestOptimizer::clear`] rejects everything still pending with a
//! cancellation error, e.g. on logout.

pub mod batch;
pub mod optimizer;
pub mod timing;

use courier_core::ApiError;
use std::future::Future;
use std::pin::Pin;

/// Type-erased request future.
pub type BoxedRequest<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;

pub use batch::BatchOptions;
pub use optimizer::RequestOptimizer;
pub use timing::{Debouncer, Throttler};
