//! 输入校验
//!
//! 每个校验函数返回字段级错误信息，`FieldErrors` 把多个字段的错误合并成一个
//! `AdminError::Validation`，校验失败时不会发起任何外部调用。

use url::Url;

use crate::errors::{AdminError, Result};

pub const PRN_LENGTH: usize = 10;
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// 危险协议列表
const DANGEROUS_PROTOCOLS: &[&str] = &["javascript:", "data:", "file:", "vbscript:", "blob:"];

pub fn validate_prn(prn: &str) -> std::result::Result<(), String> {
    if prn.len() == PRN_LENGTH && prn.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(format!("PRN must be exactly {} digits", PRN_LENGTH))
    }
}

pub fn validate_email(email: &str) -> std::result::Result<(), String> {
    let invalid = || "Invalid email address".to_string();
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_password(password: &str, min_len: usize) -> std::result::Result<(), String> {
    if password.chars().count() >= min_len {
        Ok(())
    } else if min_len <= 1 {
        Err("Password is required".to_string())
    } else {
        Err(format!("Password must be at least {} characters", min_len))
    }
}

pub fn require(value: &str, message: &str) -> std::result::Result<(), String> {
    if value.trim().is_empty() {
        Err(message.to_string())
    } else {
        Ok(())
    }
}

/// 只允许 http:// 和 https:// 链接
pub fn validate_link_url(url: &str) -> std::result::Result<(), String> {
    let url = url.trim();
    if url.is_empty() {
        return Err("URL cannot be empty".to_string());
    }

    let lower = url.to_lowercase();
    if DANGEROUS_PROTOCOLS.iter().any(|p| lower.starts_with(p)) {
        return Err("This URL protocol is not allowed".to_string());
    }
    if !lower.starts_with("http://") && !lower.starts_with("https://") {
        return Err("URL must start with http:// or https://".to_string());
    }

    Url::parse(url).map_err(|e| format!("Invalid URL format: {}", e))?;
    Ok(())
}

/// 收集字段错误
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, field: &str, result: std::result::Result<(), String>) {
        if let Err(msg) = result {
            self.errors.push(format!("{}: {}", field, msg));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.errors
    }

    pub fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AdminError::validation(self.errors.join("; ")))
        }
    }
}
