//! Bounded, closeable FIFO queues for producer/consumer pipelines.
//!
//! The central type is [`BoundedQueue`]: a fixed-capacity queue that any number
//! of threads can push to and pop from, with an explicit closed state that lets
//! producers signal end-of-stream without losing buffered data.
//!
//! ```
//! use sluice::{BoundedQueue, PopError, PushError};
//!
//! let queue = BoundedQueue::with_label(2, "ingest")?;
//! queue.push("a").unwrap();
//! queue.push("b").unwrap();
//! assert_eq!(queue.try_push("c"), Err(PushError::Full("c")));
//!
//! queue.close();
//! assert_eq!(queue.try_pop(), Ok("a"));
//! assert_eq!(queue.try_pop(), Ok("b"));
//! assert_eq!(queue.try_pop(), Err(PopError::Closed));
//! # Ok::<(), sluice::ConfigError>(())
//! ```

pub mod config;
pub mod endpoint;
pub mod error;
mod ring;
pub mod status;
pub mod sync;
mod trace;

pub use trace::init_tracing;

#[doc(inline)]
pub use config::QueueConfig;
#[doc(inline)]
pub use endpoint::{QueueBack, QueueFront};
#[doc(inline)]
pub use error::{ConfigError, QueueClosed};
#[doc(inline)]
pub use status::{Outcome, PopError, PushError, QueueStatus};
#[doc(inline)]
pub use sync::bounded::{BoundedQueue, Timeout};
