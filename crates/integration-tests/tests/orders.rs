//! Order repository tests: the order-tree composite write, stock deduction,
//! and the sub-order status queries.

use marketplace_core::{
    ErrorKind, OrderCustomerId, OrderShopStatus, ProductId, ShopId, ShopItem, UserId,
};
use marketplace_integration_tests::{TestStore, order, product, shop_item, stores};

/// Stock `quantity` units of a new product in `shop_id`.
async fn stock(store: &TestStore, shop_id: &ShopId, quantity: i64) -> ShopItem {
    let p = product("phone", 12_000);
    let item = shop_item(shop_id, &p.id, quantity);
    store
        .repos
        .shops
        .create_shop_item(&item, &p)
        .await
        .expect("stock product")
}

async fn quantity_of(store: &TestStore, item: &ShopItem) -> i64 {
    store
        .repos
        .shops
        .get_shop_item_by_id(&item.id)
        .await
        .expect("shop item")
        .quantity
}

// ============================================================================
// Placing Orders
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_order_round_trip() {
    for store in stores().await {
        let backend = store.backend;
        let (shop_a, shop_b) = (ShopId::generate(), ShopId::generate());
        let phone = stock(&store, &shop_a, 5).await;
        let laptop = stock(&store, &shop_b, 5).await;
        let case = stock(&store, &shop_b, 5).await;

        let placed = order(
            &UserId::generate(),
            vec![
                (shop_a, vec![(phone.product_id.clone(), 1)]),
                (
                    shop_b,
                    vec![(laptop.product_id.clone(), 1), (case.product_id.clone(), 2)],
                ),
            ],
        );

        let created = store
            .repos
            .orders
            .create_order_customer(&placed)
            .await
            .expect("create order");
        assert_eq!(created, placed, "{backend}");

        let fetched = store
            .repos
            .orders
            .get_order_customer_by_id(&placed.id)
            .await
            .expect("get order");
        assert_eq!(fetched, placed, "{backend}");
    }
}

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_order_deducts_stock() {
    for store in stores().await {
        let backend = store.backend;
        let shop_id = ShopId::generate();
        let phone = stock(&store, &shop_id, 5).await;

        let placed = order(
            &UserId::generate(),
            vec![(shop_id, vec![(phone.product_id.clone(), 1)])],
        );
        store
            .repos
            .orders
            .create_order_customer(&placed)
            .await
            .expect("create order");

        assert_eq!(quantity_of(&store, &phone).await, 4, "{backend}");
    }
}

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_order_may_take_all_stock() {
    for store in stores().await {
        let backend = store.backend;
        let shop_id = ShopId::generate();
        let phone = stock(&store, &shop_id, 3).await;

        let placed = order(
            &UserId::generate(),
            vec![(shop_id, vec![(phone.product_id.clone(), 3)])],
        );
        store
            .repos
            .orders
            .create_order_customer(&placed)
            .await
            .expect("create order");

        assert_eq!(quantity_of(&store, &phone).await, 0, "{backend}");
    }
}

// ============================================================================
// Atomicity
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_duplicate_line_rolls_back_whole_order() {
    for store in stores().await {
        let backend = store.backend;
        let shop_id = ShopId::generate();
        let phone = stock(&store, &shop_id, 5).await;

        // Two lines for the same product in one sub-order break the
        // (order_shop_id, product_id) uniqueness on the second insert.
        let placed = order(
            &UserId::generate(),
            vec![(
                shop_id.clone(),
                vec![(phone.product_id.clone(), 1), (phone.product_id.clone(), 1)],
            )],
        );
        let err = store
            .repos
            .orders
            .create_order_customer(&placed)
            .await
            .expect_err("duplicate line");
        assert_eq!(err.kind(), ErrorKind::Duplicate, "{backend}");

        let header = store
            .repos
            .orders
            .get_order_customer_by_id(&placed.id)
            .await;
        assert_eq!(
            header.expect_err("header rolled back").kind(),
            ErrorKind::NotExist,
            "{backend}"
        );
        let sub_orders = store
            .repos
            .orders
            .get_order_shops_by_shop_id(&shop_id)
            .await
            .expect("sub-orders");
        assert!(sub_orders.is_empty(), "{backend}");
        assert_eq!(quantity_of(&store, &phone).await, 5, "{backend}");
    }
}

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_overselling_is_rejected() {
    for store in stores().await {
        let backend = store.backend;
        let shop_id = ShopId::generate();
        let phone = stock(&store, &shop_id, 5).await;
        let laptop = stock(&store, &shop_id, 1).await;

        let placed = order(
            &UserId::generate(),
            vec![(
                shop_id,
                vec![(phone.product_id.clone(), 2), (laptop.product_id.clone(), 2)],
            )],
        );
        let err = store
            .repos
            .orders
            .create_order_customer(&placed)
            .await
            .expect_err("not enough laptops");
        assert_eq!(err.kind(), ErrorKind::InsufficientStock, "{backend}");

        assert_eq!(quantity_of(&store, &phone).await, 5, "{backend}");
        assert_eq!(quantity_of(&store, &laptop).await, 1, "{backend}");
        let header = store
            .repos
            .orders
            .get_order_customer_by_id(&placed.id)
            .await;
        assert_eq!(
            header.expect_err("header rolled back").kind(),
            ErrorKind::NotExist,
            "{backend}"
        );
    }
}

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_unstocked_product_fails_order() {
    for store in stores().await {
        let backend = store.backend;
        let placed = order(
            &UserId::generate(),
            vec![(ShopId::generate(), vec![(ProductId::generate(), 1)])],
        );
        let err = store
            .repos
            .orders
            .create_order_customer(&placed)
            .await
            .expect_err("no stock row");
        assert_eq!(err.kind(), ErrorKind::NotExist, "{backend}");

        let header = store
            .repos
            .orders
            .get_order_customer_by_id(&placed.id)
            .await;
        assert!(header.is_err(), "{backend}");
    }
}

// ============================================================================
// Queries & Updates
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_orders_by_customer() {
    for store in stores().await {
        let backend = store.backend;
        let customer = UserId::generate();
        let shop_id = ShopId::generate();
        let phone = stock(&store, &shop_id, 10).await;

        let mut placed = vec![
            order(&customer, vec![(shop_id.clone(), vec![(phone.product_id.clone(), 1)])]),
            order(&customer, vec![(shop_id.clone(), vec![(phone.product_id.clone(), 2)])]),
        ];
        for o in &placed {
            store
                .repos
                .orders
                .create_order_customer(o)
                .await
                .expect("create order");
        }
        placed.sort_by(|a, b| a.id.cmp(&b.id));

        let found = store
            .repos
            .orders
            .get_order_customers_by_customer_id(&customer)
            .await
            .expect("by customer");
        assert_eq!(found, placed, "{backend}");
        assert_eq!(quantity_of(&store, &phone).await, 7, "{backend}");
    }
}

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_notified_flag_and_status_update() {
    for store in stores().await {
        let backend = store.backend;
        let shop_id = ShopId::generate();
        let phone = stock(&store, &shop_id, 5).await;
        let placed = order(
            &UserId::generate(),
            vec![(shop_id.clone(), vec![(phone.product_id.clone(), 1)])],
        );
        store
            .repos
            .orders
            .create_order_customer(&placed)
            .await
            .expect("create order");

        let pending = store
            .repos
            .orders
            .get_unnotified_order_shops()
            .await
            .expect("unnotified");
        assert_eq!(pending, placed.order_shops, "{backend}");

        let mut sub_order = pending.first().cloned().expect("one sub-order");
        sub_order.notified = true;
        sub_order.status = OrderShopStatus::Ready;
        let updated = store
            .repos
            .orders
            .update_order_shop(&sub_order)
            .await
            .expect("update sub-order");
        assert_eq!(updated, sub_order, "{backend}");

        let pending = store
            .repos
            .orders
            .get_unnotified_order_shops()
            .await
            .expect("unnotified");
        assert!(pending.is_empty(), "{backend}");

        let by_shop = store
            .repos
            .orders
            .get_order_shops_by_shop_id(&shop_id)
            .await
            .expect("by shop");
        assert_eq!(by_shop, vec![sub_order.clone()], "{backend}");

        let by_id = store
            .repos
            .orders
            .get_order_shop_by_id(&sub_order.id)
            .await
            .expect("by id");
        assert_eq!(by_id.status, OrderShopStatus::Ready, "{backend}");
    }
}

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_payment_status() {
    for store in stores().await {
        let backend = store.backend;
        let shop_id = ShopId::generate();
        let phone = stock(&store, &shop_id, 5).await;
        let placed = order(
            &UserId::generate(),
            vec![(shop_id, vec![(phone.product_id.clone(), 1)])],
        );
        store
            .repos
            .orders
            .create_order_customer(&placed)
            .await
            .expect("create order");

        store
            .repos
            .orders
            .update_payment_status(&placed.id)
            .await
            .expect("mark paid");
        let fetched = store
            .repos
            .orders
            .get_order_customer_by_id(&placed.id)
            .await
            .expect("get order");
        assert!(fetched.payed, "{backend}");

        let err = store
            .repos
            .orders
            .update_payment_status(&OrderCustomerId::generate())
            .await
            .expect_err("unknown order");
        assert_eq!(err.kind(), ErrorKind::NotExist, "{backend}");
    }
}
