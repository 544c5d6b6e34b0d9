//! In-Memory Story Locks
//!
//! 每个故事一把异步互斥锁，首次使用时创建；最后一个持有者释放后回收。

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::application::ports::{StoryGuard, StoryLockPort};

/// 内存故事锁表
pub struct InMemoryStoryLocks {
    /// story_id -> 锁
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl InMemoryStoryLocks {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemoryStoryLocks {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoryLockPort for InMemoryStoryLocks {
    async fn acquire(&self, story_id: Uuid) -> StoryGuard {
        // 先克隆出 Arc 再等待，不能在持有 DashMap 分片锁时 await
        let lock = self
            .locks
            .entry(story_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = lock.lock_owned().await;

        let locks = self.locks.clone();
        StoryGuard::new(guard).on_release(move || {
            // 只剩锁表自己引用时说明没有持有者也没有等待者；
            // remove_if 与 acquire 的克隆在同一分片锁下进行
            locks.remove_if(&story_id, |_, lock| Arc::strong_count(lock) == 1);
        })
    }

    fn forget(&self, story_id: Uuid) {
        if self.locks.remove(&story_id).is_some() {
            tracing::debug!(story_id = %story_id, "Story lock released");
        }
    }

    fn len(&self) -> usize {
        self.locks.len()
    }
}
