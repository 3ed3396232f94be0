use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::persistence::RepositoryError;
use super::model::{Menu, OptionCategory, Store, User};

/// Read-only access to users, stores, menus and menu options.
///
/// The catalog is owned by another service; the order engine only resolves
/// ids through this trait.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Users that are not soft-deleted
    async fn find_active_user(&self, user_id: Uuid) -> Result<Option<User>, RepositoryError>;

    /// Any store, including permanently closed ones
    async fn find_store(&self, store_id: Uuid) -> Result<Option<Store>, RepositoryError>;

    /// Stores that are not soft-deleted; permanently closed stores included
    async fn find_active_store(&self, store_id: Uuid) -> Result<Option<Store>, RepositoryError> {
        Ok(self.find_store(store_id).await?.filter(|s| !s.deleted))
    }

    /// Menus that are not soft-deleted
    async fn find_active_menu(&self, menu_id: Uuid) -> Result<Option<Menu>, RepositoryError>;

    /// Option categories of a menu, each with its items
    async fn find_option_categories(&self, menu_id: Uuid) -> Result<Vec<OptionCategory>, RepositoryError>;
}

#[derive(Default)]
struct CatalogTables {
    users: HashMap<Uuid, User>,
    stores: HashMap<Uuid, Store>,
    menus: HashMap<Uuid, Menu>,
    option_categories: Vec<OptionCategory>,
}

/// In-memory catalog used for local runs and tests.
#[derive(Default, Clone)]
pub struct InMemoryCatalog {
    tables: Arc<RwLock<CatalogTables>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.tables.write().await.users.insert(user.id, user);
    }

    pub async fn insert_store(&self, store: Store) {
        self.tables.write().await.stores.insert(store.id, store);
    }

    pub async fn insert_menu(&self, menu: Menu) {
        self.tables.write().await.menus.insert(menu.id, menu);
    }

    pub async fn insert_option_category(&self, category: OptionCategory) {
        let mut tables = self.tables.write().await;
        tables.option_categories.retain(|c| c.id != category.id);
        tables.option_categories.push(category);
    }
}

#[async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn find_active_user(&self, user_id: Uuid) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&user_id).filter(|u| !u.deleted).cloned())
    }

    async fn find_store(&self, store_id: Uuid) -> Result<Option<Store>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.stores.get(&store_id).cloned())
    }

    async fn find_active_menu(&self, menu_id: Uuid) -> Result<Option<Menu>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.menus.get(&menu_id).filter(|m| !m.deleted).cloned())
    }

    async fn find_option_categories(&self, menu_id: Uuid) -> Result<Vec<OptionCategory>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .option_categories
            .iter()
            .filter(|c| c.menu_id == menu_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use crate::domain::catalog::{BusinessHours, StoreStatus, UserRole};

    #[tokio::test]
    async fn test_deleted_rows_are_not_active() {
        let catalog = InMemoryCatalog::new();

        let mut user = User::new("Mina", "mina@example.com", UserRole::Customer);
        user.deleted = true;
        catalog.insert_user(user.clone()).await;

        let menu = Menu {
            id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            name: "Tteokbokki".to_string(),
            price: 6_000,
            deleted: true,
        };
        catalog.insert_menu(menu.clone()).await;

        assert!(catalog.find_active_user(user.id).await.unwrap().is_none());
        assert!(catalog.find_active_menu(menu.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_active_store_excludes_deleted_only() {
        let catalog = InMemoryCatalog::new();
        let store = |status, deleted| Store {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Kimbap Heaven".to_string(),
            hours: BusinessHours::new(NaiveTime::MIN, NaiveTime::MIN),
            minimum_order_price: 10_000,
            status,
            deleted,
        };

        let closed = store(StoreStatus::PermanentlyClosed, false);
        let deleted = store(StoreStatus::Open, true);
        catalog.insert_store(closed.clone()).await;
        catalog.insert_store(deleted.clone()).await;

        assert_eq!(catalog.find_active_store(closed.id).await.unwrap(), Some(closed));
        assert!(catalog.find_active_store(deleted.id).await.unwrap().is_none());
        assert!(catalog.find_store(deleted.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_option_categories_are_scoped_to_menu() {
        let catalog = InMemoryCatalog::new();
        let menu_id = Uuid::new_v4();

        for target in [menu_id, Uuid::new_v4()] {
            catalog.insert_option_category(OptionCategory {
                id: Uuid::new_v4(),
                menu_id: target,
                name: "Size".to_string(),
                required: true,
                multiple: false,
                max_options: None,
                items: vec![],
            }).await;
        }

        let categories = catalog.find_option_categories(menu_id).await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].menu_id, menu_id);
    }
}
