//! Story Lock Port
//!
//! 同一故事的章节顺序写操作串行执行，不同故事互不影响。

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

/// 持有期间独占该故事的顺序写
///
/// drop 时先解锁，再执行登记的释放回调（锁表据此回收空闲条目）。
pub struct StoryGuard {
    guard: Option<OwnedMutexGuard<()>>,
    on_release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl StoryGuard {
    pub fn new(guard: OwnedMutexGuard<()>) -> Self {
        Self {
            guard: Some(guard),
            on_release: None,
        }
    }

    pub fn on_release(mut self, f: impl FnOnce() + Send + Sync + 'static) -> Self {
        self.on_release = Some(Box::new(f));
        self
    }
}

impl Drop for StoryGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        if let Some(f) = self.on_release.take() {
            f();
        }
    }
}

impl std::fmt::Debug for StoryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryGuard")
            .field("held", &self.guard.is_some())
            .finish()
    }
}

#[async_trait]
pub trait StoryLockPort: Send + Sync {
    /// 获取故事锁（等待直到可用）
    async fn acquire(&self, story_id: Uuid) -> StoryGuard;

    /// 故事被删除后释放其锁条目
    fn forget(&self, story_id: Uuid);

    /// 当前登记的锁数量
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
