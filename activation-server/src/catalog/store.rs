use async_trait::async_trait;
use shared::models::{Branch, Package, Trainer};

use super::{Catalog, CatalogResult};
use crate::storage::ActivationStorage;

/// Catalog served from the local redb mirror
#[derive(Debug, Clone)]
pub struct StoreCatalog {
    storage: ActivationStorage,
}

impl StoreCatalog {
    pub fn new(storage: ActivationStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Catalog for StoreCatalog {
    async fn branch(&self, id: &str) -> CatalogResult<Option<Branch>> {
        Ok(self.storage.get_branch(id)?)
    }

    async fn active_branches(&self) -> CatalogResult<Vec<Branch>> {
        let mut branches: Vec<Branch> = self
            .storage
            .list_branches()?
            .into_iter()
            .filter(|b| b.active)
            .collect();
        branches.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(branches)
    }

    async fn trainer(&self, id: &str) -> CatalogResult<Option<Trainer>> {
        Ok(self.storage.get_trainer(id)?)
    }

    async fn trainers_at_branch(&self, branch_id: &str) -> CatalogResult<Vec<Trainer>> {
        let mut trainers: Vec<Trainer> = self
            .storage
            .list_trainers()?
            .into_iter()
            .filter(|t| t.works_at(branch_id))
            .collect();
        trainers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(trainers)
    }

    async fn package(&self, id: &str) -> CatalogResult<Option<Package>> {
        Ok(self.storage.get_package(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trainer(id: &str, branches: &[&str], active: bool) -> Trainer {
        Trainer {
            id: id.into(),
            name: id.to_uppercase(),
            branch_ids: branches.iter().map(|b| b.to_string()).collect(),
            active,
        }
    }

    #[tokio::test]
    async fn test_trainers_at_branch_filters_and_orders() {
        let storage = ActivationStorage::open_in_memory().unwrap();
        storage.put_trainer(&trainer("t-3", &["b-1"], true)).unwrap();
        storage.put_trainer(&trainer("t-1", &["b-1", "b-2"], true)).unwrap();
        storage.put_trainer(&trainer("t-2", &["b-2"], true)).unwrap();
        storage.put_trainer(&trainer("t-4", &["b-1"], false)).unwrap();

        let catalog = StoreCatalog::new(storage);
        let ids: Vec<String> = catalog
            .trainers_at_branch("b-1")
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["t-1", "t-3"]);
    }

    #[tokio::test]
    async fn test_active_branches() {
        let storage = ActivationStorage::open_in_memory().unwrap();
        for (id, active) in [("b-2", true), ("b-1", true), ("b-3", false)] {
            storage
                .put_branch(&Branch {
                    id: id.into(),
                    name: id.into(),
                    address: None,
                    active,
                })
                .unwrap();
        }

        let catalog = StoreCatalog::new(storage);
        let ids: Vec<String> = catalog
            .active_branches()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec!["b-1", "b-2"]);
        assert!(catalog.branch("b-3").await.unwrap().is_some());
        assert!(catalog.branch("b-9").await.unwrap().is_none());
    }
}
