//! Talebook - 小说发布后端
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Story Context: 故事、章节与章节顺序
//! - Taxonomy Context: 分类树与标签
//! - Account Context: 角色与权限
//!
//! 应用层 (application/):
//! - Ports: 端口定义（Repositories, OrderingStore, StoryLocks）
//! - Ordering: 章节顺序引擎，保证每个故事的章节序号连续
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: JSON API + WebSocket
//! - Memory: 按故事加锁
//! - Persistence: SQLite 存储
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
