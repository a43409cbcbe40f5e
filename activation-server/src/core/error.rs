use thiserror::Error;

use crate::catalog::SeedError;
use crate::storage::StorageError;

/// 启动/运行期错误 (请求级错误见 [`crate::utils::AppError`])
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),

    #[error("目录种子错误: {0}")]
    Seed(#[from] SeedError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
