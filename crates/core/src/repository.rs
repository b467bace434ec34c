//! Repository contracts, one trait per aggregate.
//!
//! Each trait has a relational and a document implementation in
//! `marketplace-repository`; callers hold them as `Arc<dyn Trait>` and never
//! see which backend is behind it.
//!
//! Common rules:
//! - `create_*` and `update_*` re-read the aggregate after the write and
//!   return what the store holds, not the caller's input.
//! - `update_*` is a full replace of the parent record. Nested children are
//!   not touched.
//! - Deleting an absent record is not an error.
//! - Paginated reads are ordered by identifier.
//! - Dropping a returned future cancels the call; an unfinished atomic unit is
//!   rolled back by the backend.
//!
//! Failures are reported as [`RepositoryError`](crate::RepositoryError). Any
//! method taking an identifier may fail with `InvalidId` on the relational
//! backend when the identifier is not a UUID; the document backend reports
//! such a lookup as `NotExist`. Any read may fail with `DataCorruption` when
//! a stored enum literal or date cannot be decoded.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{
    Cart, CartItem, OrderCustomer, OrderShop, Product, Shop, ShopItem, User, Withdraw,
};
use crate::types::{
    CartId, CartItemId, OrderCustomerId, OrderShopId, ProductId, ShopId, ShopItemId, UserId,
    WithdrawId,
};

/// Users and their one-to-one carts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// A page of users ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailed` if the query fails.
    async fn get(&self, limit: i64, offset: i64) -> Result<Vec<User>>;

    /// # Errors
    ///
    /// Returns `NotExist` if no user has this id.
    async fn get_by_id(&self, id: &UserId) -> Result<User>;

    /// # Errors
    ///
    /// Returns `NotExist` if no user has this email.
    async fn get_by_email(&self, email: &str) -> Result<User>;

    /// Insert an empty cart (`price = 0`) under `user.cart_id`, then the user.
    /// Both records are written in one atomic unit.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if the email, the user id or the cart id is taken.
    /// Returns `PersistenceFailed` if either insert fails for another reason,
    /// and `TransactionError` if the atomic unit cannot be opened or
    /// committed. In every case neither record is kept.
    async fn create(&self, user: &User) -> Result<User>;

    /// # Errors
    ///
    /// Returns `Duplicate` if the new email belongs to another user,
    /// `UpdateFailed` if the write fails, and `NotExist` if the user is gone.
    async fn update(&self, user: &User) -> Result<User>;

    /// Remove the user record. The cart is left in place.
    ///
    /// # Errors
    ///
    /// Returns `DeleteFailed` if the delete fails.
    async fn delete(&self, id: &UserId) -> Result<()>;
}

/// Carts and their product lines.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// The cart with all of its items.
    ///
    /// # Errors
    ///
    /// Returns `NotExist` if no cart has this id.
    async fn get_cart_by_id(&self, id: &CartId) -> Result<Cart>;

    /// Persist the cart's `price`. Items are managed through the item methods.
    ///
    /// # Errors
    ///
    /// Returns `UpdateFailed` if the write fails, `NotExist` if the cart is gone.
    async fn update_cart(&self, cart: &Cart) -> Result<Cart>;

    /// Delete every item of the cart.
    ///
    /// # Errors
    ///
    /// Returns `DeleteFailed` if the delete fails.
    async fn clear_cart(&self, id: &CartId) -> Result<()>;

    /// # Errors
    ///
    /// Returns `NotExist` if no item has this id.
    async fn get_cart_item_by_id(&self, id: &CartItemId) -> Result<CartItem>;

    /// # Errors
    ///
    /// Returns `Duplicate` when the cart already holds the product.
    async fn create_cart_item(&self, item: &CartItem) -> Result<CartItem>;

    /// # Errors
    ///
    /// Returns `UpdateFailed` if the write fails, `NotExist` if the item is gone.
    async fn update_cart_item(&self, item: &CartItem) -> Result<CartItem>;

    /// # Errors
    ///
    /// Returns `DeleteFailed` if the delete fails.
    async fn delete_cart_item(&self, id: &CartItemId) -> Result<()>;
}

/// Catalogue products.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `PersistenceFailed` if the query fails.
    async fn get(&self, limit: i64, offset: i64) -> Result<Vec<Product>>;

    /// # Errors
    ///
    /// Returns `NotExist` if no product has this id.
    async fn get_by_id(&self, id: &ProductId) -> Result<Product>;

    /// # Errors
    ///
    /// Returns `Duplicate` if the id is taken, `PersistenceFailed` otherwise.
    async fn create(&self, product: &Product) -> Result<Product>;

    /// # Errors
    ///
    /// Returns `UpdateFailed` if the write fails, `NotExist` if the product is gone.
    async fn update(&self, product: &Product) -> Result<Product>;

    /// # Errors
    ///
    /// Returns `DeleteFailed` if the delete fails.
    async fn delete(&self, id: &ProductId) -> Result<()>;
}

/// Shops and the stock they carry.
///
/// Every method fails with `PersistenceFailed`, `UpdateFailed` or
/// `DeleteFailed` when the backend rejects the read or write.
#[async_trait]
pub trait ShopRepository: Send + Sync {
    /// # Errors
    ///
    /// See the trait docs.
    async fn get_shops(&self, limit: i64, offset: i64) -> Result<Vec<Shop>>;

    /// The shop with every item it stocks.
    ///
    /// # Errors
    ///
    /// Returns `NotExist` if no shop has this id.
    async fn get_shop_by_id(&self, id: &ShopId) -> Result<Shop>;

    /// # Errors
    ///
    /// See the trait docs.
    async fn get_shops_by_seller_id(&self, seller_id: &UserId) -> Result<Vec<Shop>>;

    /// # Errors
    ///
    /// Returns `Duplicate` if the id is taken.
    async fn create_shop(&self, shop: &Shop) -> Result<Shop>;

    /// # Errors
    ///
    /// Returns `NotExist` if the shop is gone.
    async fn update_shop(&self, shop: &Shop) -> Result<Shop>;

    /// # Errors
    ///
    /// See the trait docs.
    async fn delete_shop(&self, id: &ShopId) -> Result<()>;

    /// # Errors
    ///
    /// See the trait docs.
    async fn get_shop_items(&self, limit: i64, offset: i64) -> Result<Vec<ShopItem>>;

    /// # Errors
    ///
    /// Returns `NotExist` if no item has this id.
    async fn get_shop_item_by_id(&self, id: &ShopItemId) -> Result<ShopItem>;

    /// The first item, by id, stocking the product.
    ///
    /// # Errors
    ///
    /// Returns `NotExist` if no shop stocks the product.
    async fn get_shop_item_by_product_id(&self, product_id: &ProductId) -> Result<ShopItem>;

    /// Insert `product`, then `item` referencing it, in one atomic unit.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if the product id or item id is taken, or the shop
    /// already stocks the product. Returns `PersistenceFailed` if an insert
    /// fails for another reason and `TransactionError` if the atomic unit
    /// cannot be opened or committed. On any failure the product is not kept.
    async fn create_shop_item(&self, item: &ShopItem, product: &Product) -> Result<ShopItem>;

    /// # Errors
    ///
    /// Returns `NotExist` if the item is gone.
    async fn update_shop_item(&self, item: &ShopItem) -> Result<ShopItem>;

    /// # Errors
    ///
    /// See the trait docs.
    async fn delete_shop_item(&self, id: &ShopItemId) -> Result<()>;
}

/// Customer orders and their per-shop sub-orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `PersistenceFailed` if a query fails.
    async fn get_order_customers_by_customer_id(
        &self,
        customer_id: &UserId,
    ) -> Result<Vec<OrderCustomer>>;

    /// The full order tree: header, sub-orders and their lines.
    ///
    /// # Errors
    ///
    /// Returns `NotExist` if no order has this id.
    async fn get_order_customer_by_id(&self, id: &OrderCustomerId) -> Result<OrderCustomer>;

    /// # Errors
    ///
    /// Returns `NotExist` if no sub-order has this id.
    async fn get_order_shop_by_id(&self, id: &OrderShopId) -> Result<OrderShop>;

    /// Sub-orders whose shop has not been notified yet.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailed` if a query fails.
    async fn get_unnotified_order_shops(&self) -> Result<Vec<OrderShop>>;

    /// # Errors
    ///
    /// Returns `PersistenceFailed` if a query fails.
    async fn get_order_shops_by_shop_id(&self, shop_id: &ShopId) -> Result<Vec<OrderShop>>;

    /// Place an order.
    ///
    /// Writes the header, every sub-order and every line in one atomic unit.
    /// For each line the shop item stocking that product is decremented by
    /// the ordered quantity.
    ///
    /// # Errors
    ///
    /// On any failure nothing is persisted and no stock is taken.
    ///
    /// - `InsufficientStock` if any shop item would go below zero.
    /// - `NotExist` if no shop stocks a line's product.
    /// - `Duplicate` if an id is taken or a sub-order has two lines for the
    ///   same product.
    /// - `PersistenceFailed` or `UpdateFailed` if an insert or the stock
    ///   update fails for another reason.
    /// - `TransactionError` if the atomic unit cannot be opened or committed.
    async fn create_order_customer(&self, order: &OrderCustomer) -> Result<OrderCustomer>;

    /// Persist a sub-order's `status` and `notified` flag.
    ///
    /// # Errors
    ///
    /// Returns `UpdateFailed` if the write fails, `NotExist` if the sub-order
    /// is gone.
    async fn update_order_shop(&self, order_shop: &OrderShop) -> Result<OrderShop>;

    /// Mark the order as paid.
    ///
    /// # Errors
    ///
    /// Returns `NotExist` if no order has this id, `UpdateFailed` if the
    /// write fails.
    async fn update_payment_status(&self, id: &OrderCustomerId) -> Result<()>;
}

/// Shop payout requests.
#[async_trait]
pub trait WithdrawRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `PersistenceFailed` if the query fails.
    async fn get(&self, limit: i64, offset: i64) -> Result<Vec<Withdraw>>;

    /// # Errors
    ///
    /// Returns `NotExist` if no withdrawal has this id.
    async fn get_by_id(&self, id: &WithdrawId) -> Result<Withdraw>;

    /// # Errors
    ///
    /// Returns `PersistenceFailed` if the query fails.
    async fn get_by_shop_id(&self, shop_id: &ShopId) -> Result<Vec<Withdraw>>;

    /// # Errors
    ///
    /// Returns `Duplicate` if the id is taken, `PersistenceFailed` otherwise.
    async fn create(&self, withdraw: &Withdraw) -> Result<Withdraw>;

    /// # Errors
    ///
    /// Returns `UpdateFailed` if the write fails, `NotExist` if the withdrawal
    /// is gone.
    async fn update(&self, withdraw: &Withdraw) -> Result<Withdraw>;

    /// # Errors
    ///
    /// Returns `DeleteFailed` if the delete fails.
    async fn delete(&self, id: &WithdrawId) -> Result<()>;
}
