//! Product repository tests.

use marketplace_core::{ErrorKind, ProductCategory};
use marketplace_integration_tests::{product, stores};

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_product_crud() {
    for store in stores().await {
        let backend = store.backend;
        let products = &store.repos.products;
        let phone = product("phone", 12_000);

        assert_eq!(
            products.create(&phone).await.expect("create"),
            phone,
            "{backend}"
        );

        let mut changed = phone.clone();
        changed.name = "smartphone".to_owned();
        changed.price = 11_500;
        changed.category = ProductCategory::Books;
        changed.photo_url = String::new();
        assert_eq!(
            products.update(&changed).await.expect("update"),
            changed,
            "{backend}"
        );
        assert_eq!(
            products.get_by_id(&phone.id).await.expect("get"),
            changed,
            "{backend}"
        );

        products.delete(&phone.id).await.expect("delete");
        let err = products.get_by_id(&phone.id).await.expect_err("deleted");
        assert_eq!(err.kind(), ErrorKind::NotExist, "{backend}");
    }
}

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_duplicate_id_is_duplicate() {
    for store in stores().await {
        let backend = store.backend;
        let phone = product("phone", 12_000);
        store.repos.products.create(&phone).await.expect("create");

        let err = store
            .repos
            .products
            .create(&phone)
            .await
            .expect_err("same id");
        assert_eq!(err.kind(), ErrorKind::Duplicate, "{backend}");
    }
}

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_two_products_paginate() {
    for store in stores().await {
        let backend = store.backend;
        let mut seeded = vec![product("phone", 12_000), product("laptop", 90_000)];
        for p in &seeded {
            store.repos.products.create(p).await.expect("create");
        }
        seeded.sort_by(|a, b| a.id.cmp(&b.id));

        let page = store.repos.products.get(2, 0).await.expect("first page");
        assert_eq!(page, seeded, "{backend}");

        let again = store
            .repos
            .products
            .get(2, 0)
            .await
            .expect("first page again");
        assert_eq!(again, page, "{backend}");

        let past_end = store.repos.products.get(2, 2).await.expect("second page");
        assert!(past_end.is_empty(), "{backend}");
    }
}

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_degenerate_page_bounds() {
    for store in stores().await {
        let backend = store.backend;
        let phone = product("phone", 12_000);
        store.repos.products.create(&phone).await.expect("create");

        assert!(
            store
                .repos
                .products
                .get(0, 0)
                .await
                .expect("zero limit")
                .is_empty(),
            "{backend}"
        );
        assert!(
            store
                .repos
                .products
                .get(-1, 0)
                .await
                .expect("negative limit")
                .is_empty(),
            "{backend}"
        );

        let clamped = store
            .repos
            .products
            .get(10, -5)
            .await
            .expect("negative offset");
        assert_eq!(clamped, vec![phone], "{backend}");
    }
}
