//! Global allocator.
//!
//! Every step allocates a fresh output buffer, and RSA key handling churns
//! through many short-lived big integers; mimalloc handles both patterns
//! better than the system allocator.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
