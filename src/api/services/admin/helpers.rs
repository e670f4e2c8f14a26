//! Admin API 帮助函数

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::errors::{AdminError, Result};

use super::types::ErrorBody;

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(status: StatusCode, data: &T) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(data)
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, &data)
}

pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::CREATED, &data)
}

/// 构建错误响应 `{"error": message}`
pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    json_response(
        status,
        &ErrorBody {
            error: message.to_string(),
        },
    )
}

/// 从 AdminError 构建错误响应，并按类型记录日志
pub fn error_from_admin(err: &AdminError) -> HttpResponse {
    let status = err.http_status();
    if err.is_upstream() {
        error!("Admin API: upstream failure {}: {}", err.code(), err.message());
    } else if status.is_server_error() {
        error!("Admin API: {}", err);
    } else if status == StatusCode::NOT_FOUND {
        info!("Admin API: {}", err.message());
    } else {
        warn!("Admin API: rejected request: {}", err.message());
    }
    error_response(status, err.message())
}

/// 统一 Result → HttpResponse 转换
pub fn api_result<T: Serialize>(result: Result<T>) -> HttpResponse {
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_admin(&e),
    }
}

/// 批量请求大小检查
pub fn check_batch_size(len: usize, max: usize) -> Result<()> {
    if len == 0 {
        return Err(AdminError::validation("Nothing selected"));
    }
    if len > max {
        return Err(AdminError::validation(format!(
            "Batch size {} exceeds maximum {}",
            len, max
        )));
    }
    Ok(())
}
