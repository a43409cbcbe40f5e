//! Activation Server - 健身套餐激活工作流服务
//!
//! # 架构概述
//!
//! 购买套餐后，购买人 (owner) 与可选的同伴 (partner) 依次完成：
//! 选择门店 → 选择教练 → 提交每周课表 → 完成激活。
//!
//! - **课程时段** (`scheduling::slots`): 固定的每日时段
//! - **课程登记** (`scheduling::registry`): 可预约判断、名额占用
//! - **教练匹配** (`scheduling::matcher`): 按偏好时段筛选教练
//! - **课表生成** (`scheduling::builder`): 校验并原子提交课表
//! - **升级折算** (`proration`): 剩余价值与升级差价
//! - **工作流** (`workflow`): 按角色的状态机
//!
//! # 模块结构
//!
//! ```text
//! activation-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── api/           # HTTP 路由和处理器
//! ├── catalog/       # 门店/教练/套餐目录与种子导入
//! ├── scheduling/    # 时段、课程登记、教练匹配、课表生成
//! ├── workflow/      # 激活状态机
//! ├── storage.rs     # redb 存储
//! └── utils/         # 错误映射、日志、时区、分页、校验
//! ```

pub mod api;
pub mod catalog;
pub mod checkout;
pub mod clock;
pub mod core;
pub mod payments;
pub mod proration;
pub mod scheduling;
pub mod storage;
pub mod utils;
pub mod workflow;

// Re-export 公共类型
pub use crate::core::{Config, Server, ServerState};
pub use storage::ActivationStorage;
pub use utils::{AppError, AppResult};
pub use workflow::{ActivationSignal, WorkflowService};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境: 加载 .env、创建工作目录、初始化日志
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    init_logger_with_file(
        Some(&config.log_level),
        config.is_production(),
        config.log_dir.as_deref(),
    );
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    ___        __  _            __  _
   /   | _____/ /_(_)   ______ _/ /_(_)___  ____
  / /| |/ ___/ __/ / | / / __ `/ __/ / __ \/ __ \
 / ___ / /__/ /_/ /| |/ / /_/ / /_/ / /_/ / / / /
/_/  |_\___/\__/_/ |___/\__,_/\__/_/\____/_/ /_/
    "#
    );
}
