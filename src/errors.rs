use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum AdminError {
    Config(String),
    Validation(String),
    NotFound(String),
    Conflict(String),
    DatabaseService(String),
    AnalyticsService(String),
    FunctionExecution(String),
    FileStorage(String),
    Revalidation(String),
    Serialization(String),
    PasswordHash(String),
    Csv(String),
}

impl AdminError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            AdminError::Config(_) => "E001",
            AdminError::Validation(_) => "E002",
            AdminError::NotFound(_) => "E003",
            AdminError::Conflict(_) => "E004",
            AdminError::DatabaseService(_) => "E005",
            AdminError::AnalyticsService(_) => "E006",
            AdminError::FunctionExecution(_) => "E007",
            AdminError::FileStorage(_) => "E008",
            AdminError::Serialization(_) => "E009",
            AdminError::PasswordHash(_) => "E010",
            AdminError::Csv(_) => "E011",
            AdminError::Revalidation(_) => "E012",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            AdminError::Config(_) => "Configuration Error",
            AdminError::Validation(_) => "Validation Error",
            AdminError::NotFound(_) => "Resource Not Found",
            AdminError::Conflict(_) => "Resource Conflict",
            AdminError::DatabaseService(_) => "Database Service Error",
            AdminError::AnalyticsService(_) => "Analytics Service Error",
            AdminError::FunctionExecution(_) => "Function Execution Error",
            AdminError::FileStorage(_) => "File Storage Error",
            AdminError::Serialization(_) => "Serialization Error",
            AdminError::PasswordHash(_) => "Password Hash Error",
            AdminError::Csv(_) => "CSV Error",
            AdminError::Revalidation(_) => "Revalidation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            AdminError::Config(msg)
            | AdminError::Validation(msg)
            | AdminError::NotFound(msg)
            | AdminError::Conflict(msg)
            | AdminError::DatabaseService(msg)
            | AdminError::AnalyticsService(msg)
            | AdminError::FunctionExecution(msg)
            | AdminError::FileStorage(msg)
            | AdminError::Revalidation(msg)
            | AdminError::Serialization(msg)
            | AdminError::PasswordHash(msg)
            | AdminError::Csv(msg) => msg,
        }
    }

    /// HTTP 状态码映射
    pub fn http_status(&self) -> StatusCode {
        match self {
            AdminError::Validation(_) | AdminError::Csv(_) => StatusCode::BAD_REQUEST,
            AdminError::NotFound(_) => StatusCode::NOT_FOUND,
            AdminError::Conflict(_) => StatusCode::CONFLICT,
            AdminError::DatabaseService(_)
            | AdminError::AnalyticsService(_)
            | AdminError::FunctionExecution(_)
            | AdminError::FileStorage(_)
            | AdminError::Revalidation(_) => StatusCode::BAD_GATEWAY,
            AdminError::Config(_) | AdminError::Serialization(_) | AdminError::PasswordHash(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the failure came from one of the external managed services
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AdminError::DatabaseService(_)
                | AdminError::AnalyticsService(_)
                | AdminError::FunctionExecution(_)
                | AdminError::FileStorage(_)
                | AdminError::Revalidation(_)
        )
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for AdminError {}

// 便捷的构造函数
impl AdminError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        AdminError::Config(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        AdminError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        AdminError::NotFound(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        AdminError::Conflict(msg.into())
    }

    pub fn database_service<T: Into<String>>(msg: T) -> Self {
        AdminError::DatabaseService(msg.into())
    }

    pub fn analytics_service<T: Into<String>>(msg: T) -> Self {
        AdminError::AnalyticsService(msg.into())
    }

    pub fn function_execution<T: Into<String>>(msg: T) -> Self {
        AdminError::FunctionExecution(msg.into())
    }

    pub fn file_storage<T: Into<String>>(msg: T) -> Self {
        AdminError::FileStorage(msg.into())
    }

    pub fn revalidation<T: Into<String>>(msg: T) -> Self {
        AdminError::Revalidation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        AdminError::Serialization(msg.into())
    }

    pub fn password_hash<T: Into<String>>(msg: T) -> Self {
        AdminError::PasswordHash(msg.into())
    }

    pub fn csv<T: Into<String>>(msg: T) -> Self {
        AdminError::Csv(msg.into())
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        AdminError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for AdminError {
    fn from(err: csv::Error) -> Self {
        AdminError::Csv(err.to_string())
    }
}

impl From<std::io::Error> for AdminError {
    fn from(err: std::io::Error) -> Self {
        AdminError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;
