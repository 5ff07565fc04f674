//! Blocking queues for communication between threads of one process.
//!
//! This module provides [`BoundedQueue`](bounded::BoundedQueue), a closeable FIFO
//! built on a mutex and two condition variables.

pub mod bounded;
mod monitor;
