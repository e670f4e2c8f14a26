//! Admin API 路由配置
//!
//! 所有 `/api` 路由都需要 Bearer token；固定路径必须注册在 `/{id}` 之前。

use actix_web::{HttpRequest, error, http::StatusCode, web};

use super::dashboard::{dashboard_stats, invalidate_cache, recent_activity, teacher_contributions};
use super::helpers::error_response;
use super::links::{bulk_delete_links, delete_link, link_filter_options, list_links, update_link};
use super::notes::{bulk_delete_notes, delete_note, list_notes, note_filter_options, update_note};
use super::subjects::{
    create_subject, delete_subject, list_subjects, semester_options, update_subject,
};
use super::trends::{daily_active_users, device_users, top_pages, top_users, user_sessions};
use super::users::{
    bulk_delete_users, delete_user, import_users, list_users, register_user, update_user,
};
use crate::api::middleware::AdminAuth;

fn bad_request(message: String) -> error::Error {
    let response = error_response(StatusCode::BAD_REQUEST, &message);
    error::InternalError::from_response(message, response).into()
}

/// 查询串解析失败时返回 `{"error": ...}`
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req: &HttpRequest| bad_request(format!("Invalid query: {}", err)))
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req: &HttpRequest| bad_request(format!("Invalid body: {}", err)))
}

/// 分析趋势路由 `/trends`
pub fn trends_routes() -> actix_web::Scope {
    web::scope("/trends")
        .route("/daily-active-users", web::get().to(daily_active_users))
        .route("/device-users", web::get().to(device_users))
        .route("/top-pages", web::get().to(top_pages))
        .route("/top-users", web::get().to(top_users))
        .route("/user-sessions/{user_id}", web::get().to(user_sessions))
}

/// 用户路由 `/users`
pub fn users_routes() -> actix_web::Scope {
    web::scope("/users")
        .route("", web::get().to(list_users))
        .route("/bulk-delete", web::post().to(bulk_delete_users))
        .route("/import", web::post().to(import_users))
        .route("/{id}", web::put().to(update_user))
        .route("/{id}", web::delete().to(delete_user))
}

/// 笔记路由 `/notes`
pub fn notes_routes() -> actix_web::Scope {
    web::scope("/notes")
        .route("", web::get().to(list_notes))
        .route("/filter-options", web::get().to(note_filter_options))
        .route("/bulk-delete", web::post().to(bulk_delete_notes))
        .route("/{id}", web::put().to(update_note))
        .route("/{id}", web::delete().to(delete_note))
}

/// 链接路由 `/links`，单条操作需要 `?type=youtube|form`
pub fn links_routes() -> actix_web::Scope {
    web::scope("/links")
        .route("", web::get().to(list_links))
        .route("/filter-options", web::get().to(link_filter_options))
        .route("/bulk-delete", web::post().to(bulk_delete_links))
        .route("/{id}", web::put().to(update_link))
        .route("/{id}", web::delete().to(delete_link))
}

/// 学科路由 `/subjects`
pub fn subjects_routes() -> actix_web::Scope {
    web::scope("/subjects")
        .route("", web::get().to(list_subjects))
        .route("", web::post().to(create_subject))
        .route("/semesters", web::get().to(semester_options))
        .route("/{id}", web::put().to(update_subject))
        .route("/{id}", web::delete().to(delete_subject))
}

/// `/admin` 下的全部路由
pub fn admin_routes() -> actix_web::Scope {
    web::scope("/admin")
        .service(trends_routes())
        .route("/user-sessions/{user_id}", web::get().to(user_sessions))
        .route(
            "/stats/teacher-contributions",
            web::get().to(teacher_contributions),
        )
        .route("/dashboard/stats", web::get().to(dashboard_stats))
        .route("/dashboard/recent-activity", web::get().to(recent_activity))
        .route("/cache/invalidate", web::post().to(invalidate_cache))
        .service(users_routes())
        .service(notes_routes())
        .service(links_routes())
        .service(subjects_routes())
}

/// 注册 `/api` 作用域（带 Bearer 认证），用于 `App::configure`
pub fn api_config(admin_token: String) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.service(
            web::scope("/api")
                .wrap(AdminAuth::new(&admin_token))
                .app_data(query_config())
                .app_data(json_config())
                .route("/register", web::post().to(register_user))
                .service(admin_routes()),
        );
    }
}
