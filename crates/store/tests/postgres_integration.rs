//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use futures_util::future::join_all;
use sqlx::PgPool;
use store::{
    CartLineItem, CartStore, InventoryStore, Money, NewProduct, NewUser, PostgresStore, Product,
    ProductStore, StoreError, User, UserId, UserStore,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_store_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE cart_items, carts, products, users")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

async fn create_product(store: &PostgresStore, name: &str, inventory: u32) -> Product {
    store
        .create_product(NewProduct {
            name: name.to_string(),
            description: format!("{name} description"),
            price: Money::from_cents(1000),
            inventory,
        })
        .await
        .unwrap()
}

async fn create_user(store: &PostgresStore, username: &str) -> User {
    store
        .create_user(NewUser {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            is_admin: false,
        })
        .await
        .unwrap()
}

async fn inventory_of(store: &PostgresStore, product: &Product) -> u32 {
    store
        .find_product(product.id)
        .await
        .unwrap()
        .unwrap()
        .inventory
}

#[tokio::test]
async fn reserve_is_conditional() {
    let store = get_test_store().await;
    let product = create_product(&store, "Widget", 5).await;

    store.reserve(product.id, 3).await.unwrap();
    assert_eq!(inventory_of(&store, &product).await, 2);

    let err = store.reserve(product.id, 3).await.unwrap_err();
    assert!(matches!(err, StoreError::InsufficientInventory { .. }));
    assert_eq!(inventory_of(&store, &product).await, 2);
}

#[tokio::test]
async fn concurrent_reservations_never_go_negative() {
    let store = get_test_store().await;
    let product = create_product(&store, "Widget", 7).await;
    let product_id = product.id;

    let attempts = (0..20).map(|_| {
        let store = store.clone();
        tokio::spawn(async move { store.reserve(product_id, 1).await })
    });
    let succeeded = join_all(attempts)
        .await
        .into_iter()
        .filter(|r| matches!(r, Ok(Ok(()))))
        .count();

    assert_eq!(succeeded, 7);
    assert_eq!(inventory_of(&store, &product).await, 0);
}

#[tokio::test]
async fn release_credits_inventory() {
    let store = get_test_store().await;
    let product = create_product(&store, "Widget", 2).await;

    store.reserve(product.id, 2).await.unwrap();
    store.release(product.id, 2).await.unwrap();
    assert_eq!(inventory_of(&store, &product).await, 2);
}

#[tokio::test]
async fn cart_round_trip_preserves_order() {
    let store = get_test_store().await;
    let user = create_user(&store, "alice").await;
    let a = create_product(&store, "Alpha", 5).await;
    let b = create_product(&store, "Beta", 5).await;

    assert!(store.get_by_user(user.id).await.unwrap().is_none());

    let mut cart = store.find_by_user(user.id).await.unwrap();
    assert!(cart.is_empty());

    cart.items.push(CartLineItem::snapshot(&b, 1));
    cart.items.push(CartLineItem::snapshot(&a, 3));
    store.save(&cart).await.unwrap();

    let loaded = store.get_by_user(user.id).await.unwrap().unwrap();
    assert_eq!(loaded, cart);
    assert_eq!(loaded.items[0].product_id, b.id);
    assert_eq!(loaded.total().map(|t| t.cents()), Some(4000));
}

#[tokio::test]
async fn clear_empties_but_keeps_cart() {
    let store = get_test_store().await;
    let user = create_user(&store, "bob").await;
    let product = create_product(&store, "Widget", 5).await;

    let mut cart = store.find_by_user(user.id).await.unwrap();
    cart.items.push(CartLineItem::snapshot(&product, 2));
    store.save(&cart).await.unwrap();

    store.clear(user.id).await.unwrap();

    let cart = store.get_by_user(user.id).await.unwrap().unwrap();
    assert!(cart.is_empty());
}

#[tokio::test]
async fn list_products_matches_query_case_insensitively() {
    let store = get_test_store().await;
    create_product(&store, "Blue Widget", 1).await;
    create_product(&store, "Red Gadget", 1).await;

    assert_eq!(store.list_products(None).await.unwrap().len(), 2);

    let found = store.list_products(Some("widget")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Blue Widget");

    assert!(store.list_products(Some("%")).await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_username_maps_to_duplicate() {
    let store = get_test_store().await;
    let user = create_user(&store, "carol").await;

    let result = store
        .create_user(NewUser {
            username: "carol".to_string(),
            password_hash: "other".to_string(),
            is_admin: true,
        })
        .await;
    assert!(matches!(result, Err(StoreError::Duplicate(_))));

    let loaded = store.find_user_by_username("carol").await.unwrap().unwrap();
    assert_eq!(loaded.id, user.id);
    assert!(store.find_user(UserId::new()).await.unwrap().is_none());
}
