//! Session store adapters: process-local map and Redis cache.

mod memory;
mod redis;

pub use memory::MemorySessionStore;
pub use redis::RedisSessionStore;
