//! Integration tests for checkout driven through the cart service.

use std::sync::Arc;
use std::time::Duration;

use checkout::{
    CheckoutConfig, CheckoutError, CheckoutOrchestrator, InMemoryPaymentGateway, PaymentGateway,
};
use common::{Money, NewProduct, Product, UserId};
use domain::{AddToCart, CartService, CatalogService, UserLocks};
use futures_util::future::join_all;
use store::{CartStore, InMemoryStore};

type TestOrchestrator = CheckoutOrchestrator<InMemoryStore, Arc<dyn PaymentGateway>>;

struct TestHarness {
    store: InMemoryStore,
    gateway: InMemoryPaymentGateway,
    carts: CartService<InMemoryStore>,
    catalog: CatalogService<InMemoryStore>,
    orchestrator: Arc<TestOrchestrator>,
}

impl TestHarness {
    fn new() -> Self {
        let store = InMemoryStore::new();
        let gateway = InMemoryPaymentGateway::new();
        let locks = UserLocks::new();

        let shared: Arc<dyn PaymentGateway> = Arc::new(gateway.clone());
        let orchestrator = CheckoutOrchestrator::new(
            store.clone(),
            shared,
            locks.clone(),
            CheckoutConfig::default(),
        );

        Self {
            carts: CartService::new(store.clone(), locks),
            catalog: CatalogService::new(store.clone()),
            orchestrator: Arc::new(orchestrator),
            store,
            gateway,
        }
    }

    async fn product(&self, name: &str, cents: i64, inventory: u32) -> Product {
        self.catalog
            .create_product(NewProduct {
                name: name.to_string(),
                description: String::new(),
                price: Money::from_cents(cents),
                inventory,
            })
            .await
            .unwrap()
    }

    async fn add(&self, user_id: UserId, product: &Product, quantity: u32) {
        self.carts
            .add_to_cart(AddToCart::new(user_id, product.id, quantity))
            .await
            .unwrap();
    }
}

mod scenarios {
    use super::*;

    #[tokio::test]
    async fn three_of_five_succeeds() {
        let h = TestHarness::new();
        let a = h.product("Product A", 1000, 5).await;
        let user_id = UserId::new();
        h.add(user_id, &a, 3).await;

        let result = h.orchestrator.checkout(user_id).await.unwrap();

        assert_eq!(result.total.cents(), 3000);
        assert_eq!(h.store.inventory(a.id).await, Some(2));
        assert!(h.carts.view_cart(user_id).await.unwrap().is_empty());
        assert_eq!(h.gateway.call_count(), 1);
        assert_eq!(h.gateway.calls()[0].amount.cents(), 3000);
    }

    #[tokio::test]
    async fn three_of_two_fails_without_side_effects() {
        let h = TestHarness::new();
        let a = h.product("Product A", 1000, 5).await;
        let user_id = UserId::new();
        h.add(user_id, &a, 3).await;

        // Stock drops below the cart's demand after the add.
        let other = UserId::new();
        h.add(other, &a, 3).await;
        h.orchestrator.checkout(other).await.unwrap();
        assert_eq!(h.store.inventory(a.id).await, Some(2));
        let calls_before = h.gateway.call_count();

        let before = h.carts.view_cart(user_id).await.unwrap();
        let result = h.orchestrator.checkout(user_id).await;

        assert!(matches!(
            result,
            Err(CheckoutError::InsufficientInventory { .. })
        ));
        assert_eq!(h.gateway.call_count(), calls_before);
        assert_eq!(h.store.inventory(a.id).await, Some(2));
        assert_eq!(h.carts.view_cart(user_id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn cart_is_reusable_after_checkout() {
        let h = TestHarness::new();
        let a = h.product("Product A", 1000, 10).await;
        let user_id = UserId::new();

        h.add(user_id, &a, 2).await;
        h.orchestrator.checkout(user_id).await.unwrap();
        h.add(user_id, &a, 1).await;
        let second = h.orchestrator.checkout(user_id).await.unwrap();

        assert_eq!(second.total.cents(), 1000);
        assert_eq!(h.store.inventory(a.id).await, Some(7));
        assert_eq!(h.store.cart_count().await, 1);
    }
}

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn competing_users_never_oversell() {
        let h = TestHarness::new();
        let a = h.product("Limited", 500, 10).await;

        let users: Vec<UserId> = (0..12).map(|_| UserId::new()).collect();
        for user_id in &users {
            h.add(*user_id, &a, 2).await;
        }

        let runs = users.iter().map(|user_id| {
            let orchestrator = Arc::clone(&h.orchestrator);
            let user_id = *user_id;
            tokio::spawn(async move { orchestrator.checkout(user_id).await })
        });
        let results: Vec<_> = join_all(runs)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        let short = results
            .iter()
            .filter(|r| matches!(r, Err(CheckoutError::InsufficientInventory { .. })))
            .count();

        assert_eq!(succeeded, 5);
        assert_eq!(short, 7);
        assert_eq!(h.store.inventory(a.id).await, Some(0));
        assert_eq!(h.gateway.call_count(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn failed_checkouts_return_partial_reservations() {
        let h = TestHarness::new();
        let plenty = h.product("Plenty", 100, 100).await;
        let scarce = h.product("Scarce", 100, 3).await;

        let users: Vec<UserId> = (0..8).map(|_| UserId::new()).collect();
        for user_id in &users {
            h.add(*user_id, &plenty, 4).await;
            h.add(*user_id, &scarce, 1).await;
        }

        let runs = users.iter().map(|user_id| {
            let orchestrator = Arc::clone(&h.orchestrator);
            let user_id = *user_id;
            tokio::spawn(async move { orchestrator.checkout(user_id).await })
        });
        let succeeded = join_all(runs)
            .await
            .into_iter()
            .filter(|joined| matches!(joined, Ok(Ok(_))))
            .count() as u32;

        assert_eq!(succeeded, 3);
        assert_eq!(h.store.inventory(scarce.id).await, Some(0));
        assert_eq!(h.store.inventory(plenty.id).await, Some(100 - 4 * succeeded));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_user_checks_out_once() {
        let h = TestHarness::new();
        let a = h.product("Product A", 1000, 10).await;
        let user_id = UserId::new();
        h.add(user_id, &a, 2).await;
        h.gateway.set_delay(Some(Duration::from_millis(50)));

        let first = {
            let orchestrator = Arc::clone(&h.orchestrator);
            tokio::spawn(async move { orchestrator.checkout(user_id).await })
        };
        let second = {
            let orchestrator = Arc::clone(&h.orchestrator);
            tokio::spawn(async move { orchestrator.checkout(user_id).await })
        };
        let (first, second) = (first.await.unwrap(), second.await.unwrap());

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            outcomes
                .iter()
                .any(|r| matches!(r, Err(CheckoutError::CartEmpty)))
        );
        assert_eq!(h.gateway.call_count(), 1);
        assert_eq!(h.store.inventory(a.id).await, Some(8));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cart_add_waits_for_inflight_checkout() {
        let h = TestHarness::new();
        let a = h.product("Product A", 1000, 10).await;
        let b = h.product("Product B", 300, 10).await;
        let user_id = UserId::new();
        h.add(user_id, &a, 1).await;
        h.gateway.set_delay(Some(Duration::from_millis(100)));

        let checkout = {
            let orchestrator = Arc::clone(&h.orchestrator);
            tokio::spawn(async move { orchestrator.checkout(user_id).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        h.add(user_id, &b, 1).await;

        let result = checkout.await.unwrap().unwrap();

        // The add landed after the clear, so it survives and was not charged.
        assert_eq!(result.total.cents(), 1000);
        let cart = h.store.get_by_user(user_id).await.unwrap().unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].product_id, b.id);
    }
}
