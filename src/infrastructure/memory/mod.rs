//! Memory Layer - In-Memory State Management
//!
//! 进程内的故事锁表，串行化同一故事的章节顺序写操作

mod story_locks;

pub use story_locks::InMemoryStoryLocks;
