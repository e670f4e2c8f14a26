//! CSV 导入导出
//!
//! 导入格式为带表头的 `prnNo,name,email,password,role`，按列位置读取；
//! 所有行先校验，任何一行不合法都会拒绝整个文件。导出供 CLI 使用。

use std::io::Write;

use chrono::Utc;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::Serialize;

use crate::errors::{AdminError, Result};
use crate::services::NewUser;
use crate::storage::models::{Subject, User};

/// CSV 中只要求密码非空
const CSV_MIN_PASSWORD_LENGTH: usize = 1;

/// 解析并校验用户 CSV
pub fn parse_user_csv(content: &str) -> Result<Vec<NewUser>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut users = Vec::new();
    let mut errors = Vec::new();

    for (row_idx, record) in reader.records().enumerate() {
        let row_num = row_idx + 2; // 1-based，跳过表头
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                errors.push(format!("Row {}: {}", row_num, e));
                continue;
            }
        };
        let cell = |i: usize| record.get(i).unwrap_or_default().to_string();
        let user = NewUser {
            prn_no: cell(0),
            name: cell(1),
            email: cell(2),
            password: cell(3),
            role: cell(4),
        };

        let field_errors = user.field_errors(CSV_MIN_PASSWORD_LENGTH);
        if field_errors.is_empty() {
            users.push(user);
        } else {
            errors.push(format!("Row {}: {}", row_num, field_errors.messages().join(", ")));
        }
    }

    if !errors.is_empty() {
        return Err(AdminError::validation(format!(
            "Validation failed for {} rows. Please fix them and re-upload. Errors: {}",
            errors.len(),
            errors.join("; ")
        )));
    }
    if users.is_empty() {
        return Err(AdminError::validation(
            "CSV file is empty or contains only a header.",
        ));
    }
    Ok(users)
}

/// 用户导出行（不含密码）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvUserRow<'a> {
    pub id: &'a str,
    pub prn_no: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub role: &'a str,
    pub created_at: &'a str,
}

impl<'a> From<&'a User> for CsvUserRow<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: &user.id,
            prn_no: &user.prn_no,
            name: &user.name,
            email: &user.email,
            role: user.role.as_ref(),
            created_at: &user.created_at,
        }
    }
}

/// 学科导出行，单元用 `|` 连接
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvSubjectRow<'a> {
    pub subject_id: &'a str,
    pub name: &'a str,
    pub abbreviation: &'a str,
    pub code: &'a str,
    pub semester: &'a str,
    pub unit: String,
}

impl<'a> From<&'a Subject> for CsvSubjectRow<'a> {
    fn from(subject: &'a Subject) -> Self {
        Self {
            subject_id: &subject.subject_id,
            name: &subject.name,
            abbreviation: &subject.abbreviation,
            code: &subject.code,
            semester: &subject.semester,
            unit: subject.unit.join("|"),
        }
    }
}

fn write_rows<W, R, I>(rows: I, writer: W) -> Result<()>
where
    W: Write,
    R: Serialize,
    I: IntoIterator<Item = R>,
{
    let mut csv_writer = WriterBuilder::new().from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer
        .flush()
        .map_err(|e| AdminError::csv(format!("Failed to flush CSV: {}", e)))
}

pub fn write_users_csv<W: Write>(users: &[&User], writer: W) -> Result<()> {
    write_rows(users.iter().map(|u| CsvUserRow::from(*u)), writer)
}

pub fn write_subjects_csv<W: Write>(subjects: &[&Subject], writer: W) -> Result<()> {
    write_rows(subjects.iter().map(|s| CsvSubjectRow::from(*s)), writer)
}

/// 默认导出文件名（带时间戳）
pub fn generate_export_filename(kind: &str) -> String {
    format!("{}_export_{}.csv", kind, Utc::now().format("%Y%m%d_%H%M%S"))
}
