//! 服务器状态
//!
//! [`ServerState`] 持有所有共享服务，克隆成本很低 (内部均为 `Arc`)。

use std::sync::Arc;

use crate::catalog::{Catalog, CatalogSeed, StoreCatalog};
use crate::checkout::CheckoutService;
use crate::clock::{SharedClock, SystemClock};
use crate::core::{Config, Result};
use crate::payments::PaymentIntake;
use crate::scheduling::SessionRegistry;
use crate::storage::ActivationStorage;
use crate::workflow::WorkflowService;

/// 服务器状态 - 持有所有服务的共享引用
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 服务器配置 |
/// | storage | redb 存储 (注册/课程/预约/目录镜像) |
/// | catalog | 门店、教练、套餐目录 |
/// | clock | 时钟 (测试可注入固定时间) |
/// | workflow | 激活工作流 |
/// | checkout | 升级报价 |
/// | payments | 支付完成记录导入 |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub storage: ActivationStorage,
    pub catalog: Arc<dyn Catalog>,
    pub clock: SharedClock,
    pub workflow: Arc<WorkflowService>,
    pub checkout: Arc<CheckoutService>,
    pub payments: Arc<PaymentIntake>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 1. 创建工作目录结构
    /// 2. 打开 redb 数据库
    /// 3. 导入目录种子 (如果配置了 CATALOG_SEED_PATH)
    /// 4. 组装各服务
    pub async fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let db_path = config.database_path();
        let storage = ActivationStorage::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Database opened");

        if let Some(seed_path) = &config.catalog_seed_path {
            let report = CatalogSeed::from_file(seed_path)?.apply(&storage)?;
            tracing::info!(
                path = %seed_path,
                branches = report.branches,
                trainers = report.trainers,
                packages = report.packages,
                sessions = report.sessions,
                skipped_sessions = report.skipped_sessions,
                "Catalog seed applied"
            );
        }

        Ok(Self::with_storage(
            config.clone(),
            storage,
            Arc::new(SystemClock),
        ))
    }

    /// 用现成的存储和时钟组装状态 (测试使用内存数据库和手动时钟)
    pub fn with_storage(config: Config, storage: ActivationStorage, clock: SharedClock) -> Self {
        let catalog: Arc<dyn Catalog> = Arc::new(StoreCatalog::new(storage.clone()));
        let registry = SessionRegistry::new(
            storage.clone(),
            clock.clone(),
            config.timezone,
            config.starting_soon(),
        );

        let workflow = WorkflowService::new(storage.clone(), catalog.clone(), registry);
        let checkout = CheckoutService::new(
            storage.clone(),
            catalog.clone(),
            clock.clone(),
            config.timezone,
        );
        let payments = PaymentIntake::new(storage.clone(), catalog.clone(), clock.clone());

        Self {
            config,
            storage,
            catalog,
            clock,
            workflow: Arc::new(workflow),
            checkout: Arc::new(checkout),
            payments: Arc::new(payments),
        }
    }
}
