//! Event Publisher Implementation
//!
//! 故事事件推送：全局广播 + 按故事订阅

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 100;

/// WebSocket 事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum WsEvent {
    /// 章节加入目录
    ChapterAdded {
        story_id: Uuid,
        chapter_id: Uuid,
        order: i64,
    },
    /// 章节位置变化
    ChapterMoved {
        story_id: Uuid,
        chapter_id: Uuid,
        from: i64,
        to: i64,
    },
    /// 章节从目录移除
    ChapterRemoved {
        story_id: Uuid,
        chapter_id: Uuid,
        order: i64,
    },
    /// 故事删除
    StoryDeleted { story_id: Uuid },
}

impl WsEvent {
    pub fn story_id(&self) -> Uuid {
        match self {
            WsEvent::ChapterAdded { story_id, .. }
            | WsEvent::ChapterMoved { story_id, .. }
            | WsEvent::ChapterRemoved { story_id, .. }
            | WsEvent::StoryDeleted { story_id } => *story_id,
        }
    }
}

/// 事件发布器
pub struct EventPublisher {
    /// story_id -> broadcast sender（只推该故事的事件）
    story_channels: DashMap<Uuid, broadcast::Sender<WsEvent>>,
    /// 全部故事事件
    global_channel: broadcast::Sender<WsEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            story_channels: DashMap::new(),
            global_channel: global_tx,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅全局事件
    pub fn subscribe_global(&self) -> broadcast::Receiver<WsEvent> {
        self.global_channel.subscribe()
    }

    /// 订阅某个故事的事件（通道不存在时创建）
    pub fn subscribe_story(&self, story_id: Uuid) -> broadcast::Receiver<WsEvent> {
        self.story_channels
            .entry(story_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// 当前有通道的故事数
    pub fn story_channel_count(&self) -> usize {
        self.story_channels.len()
    }

    pub fn publish_chapter_added(&self, story_id: Uuid, chapter_id: Uuid, order: i64) {
        self.publish(WsEvent::ChapterAdded {
            story_id,
            chapter_id,
            order,
        });
    }

    pub fn publish_chapter_moved(&self, story_id: Uuid, chapter_id: Uuid, from: i64, to: i64) {
        self.publish(WsEvent::ChapterMoved {
            story_id,
            chapter_id,
            from,
            to,
        });
    }

    pub fn publish_chapter_removed(&self, story_id: Uuid, chapter_id: Uuid, order: i64) {
        self.publish(WsEvent::ChapterRemoved {
            story_id,
            chapter_id,
            order,
        });
    }

    /// 发布故事删除事件，随后关闭该故事的通道
    pub fn publish_story_deleted(&self, story_id: Uuid) {
        self.publish(WsEvent::StoryDeleted { story_id });
        self.story_channels.remove(&story_id);
    }

    fn publish(&self, event: WsEvent) {
        let story_id = event.story_id();

        if let Some(sender) = self.story_channels.get(&story_id) {
            if sender.send(event.clone()).is_err() {
                tracing::debug!(
                    story_id = %story_id,
                    "Story channel has no receivers"
                );
            }
        }

        if let Err(e) = self.global_channel.send(event) {
            tracing::debug!(
                story_id = %story_id,
                error = %e,
                "Failed to publish event (no receivers)"
            );
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let story_id = Uuid::nil();
        let chapter_id = Uuid::nil();
        let json = serde_json::to_value(WsEvent::ChapterMoved {
            story_id,
            chapter_id,
            from: 0,
            to: 2,
        })
        .unwrap();

        assert_eq!(json["event"], "ChapterMoved");
        assert_eq!(json["data"]["from"], 0);
        assert_eq!(json["data"]["to"], 2);
    }

    #[tokio::test]
    async fn test_story_channel_only_gets_its_story() {
        let publisher = EventPublisher::new();
        let cats = Uuid::new_v4();
        let dogs = Uuid::new_v4();
        let mut cats_rx = publisher.subscribe_story(cats);
        let mut global_rx = publisher.subscribe_global();

        publisher.publish_chapter_added(dogs, Uuid::new_v4(), 0);
        publisher.publish_chapter_removed(cats, Uuid::new_v4(), 3);

        let event = cats_rx.recv().await.unwrap();
        assert!(matches!(event, WsEvent::ChapterRemoved { order: 3, .. }));
        assert!(cats_rx.try_recv().is_err());

        assert_eq!(global_rx.recv().await.unwrap().story_id(), dogs);
        assert_eq!(global_rx.recv().await.unwrap().story_id(), cats);
    }

    #[tokio::test]
    async fn test_story_deleted_closes_channel() {
        let publisher = EventPublisher::new();
        let story = Uuid::new_v4();
        let mut rx = publisher.subscribe_story(story);
        assert_eq!(publisher.story_channel_count(), 1);

        publisher.publish_story_deleted(story);

        assert!(matches!(rx.recv().await.unwrap(), WsEvent::StoryDeleted { .. }));
        assert!(rx.recv().await.is_err());
        assert_eq!(publisher.story_channel_count(), 0);
    }

    #[test]
    fn test_publish_without_receivers_is_silent() {
        let publisher = EventPublisher::new();
        publisher.publish_story_deleted(Uuid::new_v4());
    }
}
