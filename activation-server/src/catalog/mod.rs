//! Catalog access
//!
//! Branches, trainers and packages are owned by the platform's catalog
//! service. The workflow only reads them through [`Catalog`]; the default
//! implementation serves the redb mirror filled by [`seed`].

pub mod seed;
mod store;

pub use seed::{CatalogSeed, SeedError, SeedReport};
pub use store::StoreCatalog;

use async_trait::async_trait;
use shared::models::{Branch, Package, Trainer};
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Remote catalog could not be reached
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[async_trait]
pub trait Catalog: Send + Sync + std::fmt::Debug {
    async fn branch(&self, id: &str) -> CatalogResult<Option<Branch>>;

    /// Active branches ordered by id
    async fn active_branches(&self) -> CatalogResult<Vec<Branch>>;

    async fn trainer(&self, id: &str) -> CatalogResult<Option<Trainer>>;

    /// Active trainers operating at the branch, ordered by id
    async fn trainers_at_branch(&self, branch_id: &str) -> CatalogResult<Vec<Trainer>>;

    async fn package(&self, id: &str) -> CatalogResult<Option<Package>>;
}
