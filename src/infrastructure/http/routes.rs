//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                   GET   健康检查
//! - /api/user/register          POST  注册
//! - /api/user/me                GET   当前用户
//! - /api/user/role              POST  修改角色（管理员）
//! - /api/user/authors           POST  搜索作者
//! - /api/user/saved             GET   收藏列表
//! - /api/user/save              POST  收藏故事
//! - /api/user/unsave            POST  取消收藏
//! - /api/story/create           POST  创建故事
//! - /api/story/update           POST  更新故事
//! - /api/story/delete           POST  删除故事
//! - /api/story/get              POST  故事详情
//! - /api/story/list             GET   已发布的故事
//! - /api/story/featured         GET   推荐故事
//! - /api/story/mine             POST  我的故事
//! - /api/story/all              POST  全部故事（管理员）
//! - /api/story/by_category      POST  分类下的故事
//! - /api/story/by_tag           POST  标签下的故事
//! - /api/story/by_author        POST  作者的故事
//! - /api/story/search           POST  搜索故事
//! - /api/story/check_author     POST  是否为作者
//! - /api/chapter/create         POST  创建章节（插入目录）
//! - /api/chapter/update         POST  修改章节
//! - /api/chapter/move           POST  移动章节
//! - /api/chapter/delete         POST  删除章节
//! - /api/chapter/get            POST  章节详情
//! - /api/chapter/toc            POST  故事目录
//! - /api/category/list          GET   分类列表
//! - /api/category/get           POST  分类详情
//! - /api/category/create        POST  创建分类
//! - /api/category/update        POST  更新分类
//! - /api/tag/list               GET   标签列表（?q= 搜索）
//! - /api/tag/add                POST  添加标签
//! - /api/comment/list           POST  故事评论
//! - /api/comment/create         POST  发表评论
//! - /api/comment/delete         POST  删除评论
//! - /api/comment/mine           GET   我的评论
//! - /api/comment/all            GET   全部评论（管理员）
//! - /ws/story/{id}              WS    单个故事的目录事件
//! - /ws/events                  WS    全局事件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/story/:story_id", get(handlers::story_websocket_handler))
        .route("/ws/events", get(handlers::global_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/user", user_routes())
        .nest("/story", story_routes())
        .nest("/chapter", chapter_routes())
        .nest("/category", category_routes())
        .nest("/tag", tag_routes())
        .nest("/comment", comment_routes())
}

/// User 路由
fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(handlers::register_user))
        .route("/me", get(handlers::get_me))
        .route("/role", post(handlers::change_user_role))
        .route("/authors", post(handlers::search_authors))
        .route("/saved", get(handlers::list_saved_stories))
        .route("/save", post(handlers::save_story))
        .route("/unsave", post(handlers::unsave_story))
}

/// Story 路由
fn story_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(handlers::create_story))
        .route("/update", post(handlers::update_story))
        .route("/delete", post(handlers::delete_story))
        .route("/get", post(handlers::get_story))
        .route("/list", get(handlers::list_published))
        .route("/featured", get(handlers::list_featured))
        .route("/mine", post(handlers::list_mine))
        .route("/all", post(handlers::list_all))
        .route("/by_category", post(handlers::list_by_category))
        .route("/by_tag", post(handlers::list_by_tag))
        .route("/by_author", post(handlers::list_by_author))
        .route("/search", post(handlers::search_stories))
        .route("/check_author", post(handlers::check_author))
}

/// Chapter 路由
fn chapter_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(handlers::create_chapter))
        .route("/update", post(handlers::update_chapter))
        .route("/move", post(handlers::move_chapter))
        .route("/delete", post(handlers::delete_chapter))
        .route("/get", post(handlers::get_chapter))
        .route("/toc", post(handlers::table_of_contents))
}

/// Category 路由
fn category_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", get(handlers::list_categories))
        .route("/get", post(handlers::get_category))
        .route("/create", post(handlers::create_category))
        .route("/update", post(handlers::update_category))
}

/// Tag 路由
fn tag_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", get(handlers::list_tags))
        .route("/add", post(handlers::add_tag))
}

/// Comment 路由
fn comment_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", post(handlers::list_story_comments))
        .route("/create", post(handlers::create_comment))
        .route("/delete", post(handlers::delete_comment))
        .route("/mine", get(handlers::list_my_comments))
        .route("/all", get(handlers::list_all_comments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;
    use uuid::Uuid;

    use crate::application::ChapterOrderingEngine;
    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::http::auth::USER_ID_HEADER;
    use crate::infrastructure::http::state::Repositories;
    use crate::infrastructure::memory::InMemoryStoryLocks;
    use crate::infrastructure::persistence::sqlite::test_support::setup_pool;
    use crate::infrastructure::persistence::sqlite::{
        SqliteCategoryRepository, SqliteChapterRepository, SqliteCommentRepository,
        SqliteOrderingStore, SqliteStoryRepository, SqliteTagRepository, SqliteUserRepository,
    };

    async fn test_app() -> Router {
        let pool = setup_pool().await;
        let repos = Repositories {
            users: Arc::new(SqliteUserRepository::new(pool.clone())),
            stories: Arc::new(SqliteStoryRepository::new(pool.clone())),
            chapters: Arc::new(SqliteChapterRepository::new(pool.clone())),
            categories: Arc::new(SqliteCategoryRepository::new(pool.clone())),
            tags: Arc::new(SqliteTagRepository::new(pool.clone())),
            comments: Arc::new(SqliteCommentRepository::new(pool.clone())),
        };
        let locks = InMemoryStoryLocks::new().arc();
        let engine = Arc::new(ChapterOrderingEngine::new(
            Arc::new(SqliteOrderingStore::new(pool)),
            locks.clone(),
        ));
        let state = AppState::new(repos, engine, locks, EventPublisher::new().arc());

        create_routes().with_state(Arc::new(state))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        user: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user.to_string());
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn post(app: &Router, uri: &str, user: Option<Uuid>, body: Value) -> (StatusCode, Value) {
        send(app, Method::POST, uri, user, Some(body)).await
    }

    async fn register(app: &Router, username: &str, role: &str) -> Uuid {
        let (status, body) = post(
            app,
            "/api/user/register",
            None,
            json!({ "username": username, "role": role }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap()
    }

    async fn create_story(app: &Router, user: Uuid, title: &str) -> Uuid {
        let (status, body) = post(app, "/api/story/create", Some(user), json!({ "title": title })).await;
        assert_eq!(status, StatusCode::CREATED);
        Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap()
    }

    async fn create_chapter(
        app: &Router,
        user: Uuid,
        story_id: Uuid,
        title: &str,
        position: Option<i64>,
    ) -> (StatusCode, Value) {
        post(
            app,
            "/api/chapter/create",
            Some(user),
            json!({ "story_id": story_id, "title": title, "body": "text", "position": position }),
        )
        .await
    }

    async fn toc_titles(app: &Router, story_id: Uuid) -> Vec<(String, i64)> {
        let (status, body) = post(app, "/api/chapter/toc", None, json!({ "story_id": story_id })).await;
        assert_eq!(status, StatusCode::OK);
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| {
                (
                    c["title"].as_str().unwrap().to_string(),
                    c["order"].as_i64().unwrap(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_ping() {
        let app = test_app().await;
        let (status, body) = send(&app, Method::GET, "/api/ping", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_missing_or_unknown_caller_is_unauthorized() {
        let app = test_app().await;

        let (status, body) = post(&app, "/api/story/create", None, json!({ "title": "T" })).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errno"], 401);

        let (status, _) = post(
            &app,
            "/api/story/create",
            Some(Uuid::new_v4()),
            json!({ "title": "T" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_chapter_ordering_over_http() {
        let app = test_app().await;
        let author = register(&app, "writer", "author").await;
        let story = create_story(&app, author, "Tale").await;

        let (status, a) = create_chapter(&app, author, story, "A", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(a["errno"], 0);
        assert_eq!(a["data"]["order"], 0);
        create_chapter(&app, author, story, "B", None).await;
        let (_, c) = create_chapter(&app, author, story, "C", Some(1)).await;
        assert_eq!(c["data"]["order"], 1);

        assert_eq!(
            toc_titles(&app, story).await,
            vec![("A".to_string(), 0), ("C".to_string(), 1), ("B".to_string(), 2)]
        );

        let (status, body) = post(
            &app,
            "/api/chapter/move",
            Some(author),
            json!({ "story_id": story, "chapter_id": a["data"]["id"], "position": 99 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["from"], 0);
        assert_eq!(body["data"]["to"], 2);

        let (status, _) = post(
            &app,
            "/api/chapter/delete",
            Some(author),
            json!({ "story_id": story, "chapter_id": c["data"]["id"] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(
            toc_titles(&app, story).await,
            vec![("B".to_string(), 0), ("A".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_chapter_error_statuses() {
        let app = test_app().await;
        let author = register(&app, "writer", "author").await;
        let other = register(&app, "rival", "author").await;
        let story = create_story(&app, author, "Tale").await;
        let other_story = create_story(&app, other, "Other").await;
        let (_, a) = create_chapter(&app, author, story, "A", None).await;

        // 非作者：403，且不会触达顺序引擎
        let (status, body) = create_chapter(&app, other, story, "X", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["errno"], 403);

        let (status, _) = create_chapter(&app, author, Uuid::new_v4(), "X", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = create_chapter(&app, author, story, "X", Some(-1)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // 章节不属于该故事
        let (status, _) = post(
            &app,
            "/api/chapter/move",
            Some(other),
            json!({ "story_id": other_story, "chapter_id": a["data"]["id"], "position": 0 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post(
            &app,
            "/api/chapter/delete",
            Some(author),
            json!({ "story_id": story, "chapter_id": Uuid::new_v4() }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        assert_eq!(toc_titles(&app, story).await, vec![("A".to_string(), 0)]);
    }

    #[tokio::test]
    async fn test_story_detail_and_comments() {
        let app = test_app().await;
        let author = register(&app, "writer", "author").await;
        let reader = register(&app, "reader", "reader").await;
        let story = create_story(&app, author, "Tale").await;
        create_chapter(&app, author, story, "One", None).await;

        let (status, _) = post(&app, "/api/story/create", Some(reader), json!({ "title": "No" })).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = post(
            &app,
            "/api/comment/create",
            Some(reader),
            json!({ "story_id": story, "body": "Nice" }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = post(&app, "/api/story/get", None, json!({ "id": story })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "Tale");
        assert_eq!(body["data"]["slug"], "tale");
        assert_eq!(body["data"]["chapters"][0]["title"], "One");
        assert_eq!(body["data"]["comments"][0]["body"], "Nice");

        let (status, _) = send(&app, Method::GET, "/api/comment/all", Some(reader), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
