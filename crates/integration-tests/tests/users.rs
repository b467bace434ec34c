//! User repository tests, including the user-with-cart composite write.
//!
//! Run with `TEST_POSTGRES_URL` and/or `TEST_MONGO_URL` set; see the crate
//! docs.

use marketplace_core::{ErrorKind, UserId, UserRole};
use marketplace_integration_tests::{stores, user};

// ============================================================================
// Create & Read
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_create_returns_stored_user() {
    for store in stores().await {
        let backend = store.backend;
        let users = &store.repos.users;
        let ivan = user("ivan@mail.ru");

        let created = users.create(&ivan).await.expect("create user");
        assert_eq!(created, ivan, "{backend}");

        let fetched = users.get_by_id(&ivan.id).await.expect("get user");
        assert_eq!(fetched, ivan, "{backend}");

        let by_email = users
            .get_by_email("ivan@mail.ru")
            .await
            .expect("get by email");
        assert_eq!(by_email.id, ivan.id, "{backend}");
    }
}

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_create_user_creates_empty_cart() {
    for store in stores().await {
        let backend = store.backend;
        let ivan = user("cart-owner@mail.ru");
        store.repos.users.create(&ivan).await.expect("create user");

        let fetched = store
            .repos
            .users
            .get_by_id(&ivan.id)
            .await
            .expect("get user");
        let cart = store
            .repos
            .carts
            .get_cart_by_id(&fetched.cart_id)
            .await
            .expect("get cart");

        assert_eq!(cart.id, ivan.cart_id, "{backend}");
        assert_eq!(cart.price, 0, "{backend}");
        assert!(cart.items.is_empty(), "{backend}");
    }
}

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_user_without_phone() {
    for store in stores().await {
        let backend = store.backend;
        let mut anna = user("anna@mail.ru");
        anna.phone = None;

        let created = store.repos.users.create(&anna).await.expect("create user");
        assert_eq!(created.phone, None, "{backend}");
    }
}

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_missing_user_is_not_exist() {
    for store in stores().await {
        let backend = store.backend;
        let err = store
            .repos
            .users
            .get_by_id(&UserId::generate())
            .await
            .expect_err("unknown id");
        assert_eq!(err.kind(), ErrorKind::NotExist, "{backend}");

        let err = store
            .repos
            .users
            .get_by_email("nobody@mail.ru")
            .await
            .expect_err("unknown email");
        assert_eq!(err.kind(), ErrorKind::NotExist, "{backend}");
    }
}

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_non_uuid_id() {
    for store in stores().await {
        let err = store
            .repos
            .users
            .get_by_id(&UserId::new("not-a-uuid"))
            .await
            .expect_err("non-uuid id");

        // The relational store types ids as UUID; the document store keys by text.
        let expected = match store.backend {
            "postgres" => ErrorKind::InvalidId,
            _ => ErrorKind::NotExist,
        };
        assert_eq!(err.kind(), expected, "{}", store.backend);
    }
}

// ============================================================================
// Uniqueness & Atomicity
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_duplicate_email_keeps_no_cart() {
    for store in stores().await {
        let backend = store.backend;
        let first = user("taken@mail.ru");
        let second = user("taken@mail.ru");
        store.repos.users.create(&first).await.expect("first user");

        let err = store
            .repos
            .users
            .create(&second)
            .await
            .expect_err("duplicate email");
        assert_eq!(err.kind(), ErrorKind::Duplicate, "{backend}");

        let cart = store.repos.carts.get_cart_by_id(&second.cart_id).await;
        assert_eq!(
            cart.expect_err("cart rolled back").kind(),
            ErrorKind::NotExist,
            "{backend}"
        );
        let user = store.repos.users.get_by_id(&second.id).await;
        assert_eq!(
            user.expect_err("user not kept").kind(),
            ErrorKind::NotExist,
            "{backend}"
        );
    }
}

// ============================================================================
// Update, Delete & Pagination
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_update_replaces_every_field() {
    for store in stores().await {
        let backend = store.backend;
        let ivan = user("before@mail.ru");
        store.repos.users.create(&ivan).await.expect("create user");

        let mut changed = ivan.clone();
        changed.name = "Petr".to_owned();
        changed.surname = "Petrov".to_owned();
        changed.phone = None;
        changed.email = "after@mail.ru".to_owned();
        changed.password = "54321".to_owned();
        changed.role = UserRole::Seller;

        let updated = store
            .repos
            .users
            .update(&changed)
            .await
            .expect("update user");
        assert_eq!(updated, changed, "{backend}");

        let fetched = store
            .repos
            .users
            .get_by_id(&ivan.id)
            .await
            .expect("get user");
        assert_eq!(fetched, changed, "{backend}");
    }
}

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_delete_then_get_is_not_exist() {
    for store in stores().await {
        let backend = store.backend;
        let ivan = user("gone@mail.ru");
        store.repos.users.create(&ivan).await.expect("create user");

        store
            .repos
            .users
            .delete(&ivan.id)
            .await
            .expect("delete user");
        let err = store
            .repos
            .users
            .get_by_id(&ivan.id)
            .await
            .expect_err("deleted");
        assert_eq!(err.kind(), ErrorKind::NotExist, "{backend}");

        // Deleting again is not an error.
        store
            .repos
            .users
            .delete(&ivan.id)
            .await
            .expect("delete twice");
    }
}

#[tokio::test]
#[ignore = "Requires TEST_POSTGRES_URL and/or TEST_MONGO_URL"]
async fn test_get_pages_in_id_order() {
    for store in stores().await {
        let backend = store.backend;
        let mut seeded = vec![user("a@mail.ru"), user("b@mail.ru"), user("c@mail.ru")];
        for u in &seeded {
            store.repos.users.create(u).await.expect("create user");
        }
        seeded.sort_by(|a, b| a.id.cmp(&b.id));

        let first = store.repos.users.get(2, 0).await.expect("first page");
        let second = store.repos.users.get(2, 2).await.expect("second page");
        let ids: Vec<_> = first.iter().chain(&second).map(|u| u.id.clone()).collect();
        let expected: Vec<_> = seeded.iter().map(|u| u.id.clone()).collect();

        assert_eq!(first.len(), 2, "{backend}");
        assert_eq!(ids, expected, "{backend}");
    }
}
