//! 统一错误处理
//!
//! Handlers return [`AppResult`]; the error body is the shared
//! [`ApiResponse`] envelope with a numeric [`ErrorCode`]. Layer errors of
//! this crate convert into [`AppError`] here.
//!
//! # 使用示例
//!
//! ```ignore
//! Err(AppError::new(ErrorCode::RegistrationNotFound).with_detail("id", id))
//! ```

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

use crate::catalog::CatalogError;
use crate::scheduling::SchedulingError;
use crate::storage::StorageError;

/// 将存储错误转换为错误码
pub fn classify_storage_error(e: &StorageError) -> ErrorCode {
    // 先按枚举变体精确匹配
    match e {
        StorageError::Serialization(_) => return ErrorCode::InternalError,
        StorageError::RegistrationNotFound(_) => return ErrorCode::RegistrationNotFound,
        StorageError::SessionNotFound(_) => return ErrorCode::SessionNotFound,
        StorageError::VersionConflict { .. } => return ErrorCode::RegistrationVersionConflict,
        _ => {}
    }

    // redb 错误通过字符串匹配分类
    let err_str = e.to_string().to_lowercase();

    // 磁盘空间不足
    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc") {
        return ErrorCode::StorageFull;
    }

    // 数据损坏
    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return ErrorCode::StorageCorrupted;
    }

    // 默认：系统繁忙（redb 的 Database/Transaction/Table/Storage/Commit 错误）
    ErrorCode::SystemBusy
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        let code = classify_storage_error(&e);
        if code.category() == ErrorCategory::System {
            tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
        }
        AppError::with_message(code, e.to_string())
    }
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Storage(e) => e.into(),
            CatalogError::Unavailable(msg) => {
                tracing::warn!(error = %msg, "Catalog unavailable");
                AppError::with_message(ErrorCode::NetworkError, msg)
            }
        }
    }
}

impl From<SchedulingError> for AppError {
    fn from(e: SchedulingError) -> Self {
        let message = e.to_string();
        match e {
            SchedulingError::EmptySelection => AppError::with_message(ErrorCode::EmptySelection, message),
            SchedulingError::CountMismatch { expected, got } => {
                AppError::with_message(ErrorCode::SessionCountMismatch, message)
                    .with_detail("expected", expected)
                    .with_detail("got", got)
            }
            SchedulingError::DuplicateSession(id) => {
                AppError::with_message(ErrorCode::ValidationFailed, message).with_detail("sessionId", id)
            }
            SchedulingError::SessionNotFound(id) => {
                AppError::with_message(ErrorCode::SessionNotFound, message).with_detail("sessionId", id)
            }
            SchedulingError::NotEligible { session_id, .. } => {
                AppError::with_message(ErrorCode::SessionNotEligible, message)
                    .with_detail("sessionId", session_id)
            }
            SchedulingError::Conflict(conflicts) => {
                let conflicts = serde_json::to_value(&conflicts).unwrap_or_default();
                AppError::schedule_conflict(message, conflicts)
            }
            SchedulingError::Storage(e) => e.into(),
            SchedulingError::Catalog(e) => e.into(),
        }
    }
}
