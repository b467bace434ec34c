//! Shop repository for `MongoDB`.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::{Client, ClientSession, Collection, Database};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use marketplace_core::{
    Product, ProductId, RepositoryError, Result, Shop, ShopId, ShopItem, ShopItemId,
    ShopRepository, UserId,
};

use super::error::{mongo_error, not_found};
use super::product::ProductRecord;
use super::{PRODUCT, SHOP, SHOP_PRODUCT, begin, ensure_indexes_for, finish};
use crate::page::Page;
use crate::translate::Operation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ShopRecord {
    #[serde(rename = "_id")]
    id: String,
    seller_id: String,
    name: String,
    description: String,
    requisites: String,
    email: String,
}

impl From<&Shop> for ShopRecord {
    fn from(shop: &Shop) -> Self {
        Self {
            id: shop.id.as_str().to_owned(),
            seller_id: shop.seller_id.as_str().to_owned(),
            name: shop.name.clone(),
            description: shop.description.clone(),
            requisites: shop.requisites.clone(),
            email: shop.email.clone(),
        }
    }
}

impl ShopRecord {
    fn into_shop(self, items: Vec<ShopItem>) -> Shop {
        Shop {
            id: ShopId::new(self.id),
            seller_id: UserId::new(self.seller_id),
            name: self.name,
            description: self.description,
            requisites: self.requisites,
            email: self.email,
            items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct ShopItemRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub shop_id: String,
    pub product_id: String,
    pub quantity: i64,
}

impl From<&ShopItem> for ShopItemRecord {
    fn from(item: &ShopItem) -> Self {
        Self {
            id: item.id.as_str().to_owned(),
            shop_id: item.shop_id.as_str().to_owned(),
            product_id: item.product_id.as_str().to_owned(),
            quantity: item.quantity,
        }
    }
}

impl From<ShopItemRecord> for ShopItem {
    fn from(record: ShopItemRecord) -> Self {
        Self {
            id: ShopItemId::new(record.id),
            shop_id: ShopId::new(record.shop_id),
            product_id: ProductId::new(record.product_id),
            quantity: record.quantity,
        }
    }
}

/// Shops backed by the `shop` and `shop_product` collections.
#[derive(Debug, Clone)]
pub struct MongoShopRepository {
    client: Client,
    shops: Collection<ShopRecord>,
    items: Collection<ShopItemRecord>,
    products: Collection<ProductRecord>,
}

impl MongoShopRepository {
    /// Bind to `db` and ensure the unique `(shop_id, product_id)` index.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the index cannot be created.
    pub async fn new(db: &Database) -> mongodb::error::Result<Self> {
        ensure_indexes_for(db, &[SHOP_PRODUCT]).await?;
        Ok(Self {
            client: db.client().clone(),
            shops: db.collection(SHOP),
            items: db.collection(SHOP_PRODUCT),
            products: db.collection(PRODUCT),
        })
    }

    async fn find_items(&self, filter: Document, page: Option<Page>) -> Result<Vec<ShopItem>> {
        let mut find = self.items.find(filter).sort(doc! { "_id": 1 });
        if let Some(page) = page {
            find = find.skip(page.skip()).limit(page.limit);
        }
        let records: Vec<ShopItemRecord> = find
            .await
            .map_err(mongo_error(Operation::Read))?
            .try_collect()
            .await
            .map_err(mongo_error(Operation::Read))?;

        Ok(records.into_iter().map(ShopItem::from).collect())
    }

    async fn find_shops(&self, filter: Document, page: Option<Page>) -> Result<Vec<Shop>> {
        let mut find = self.shops.find(filter).sort(doc! { "_id": 1 });
        if let Some(page) = page {
            find = find.skip(page.skip()).limit(page.limit);
        }
        let records: Vec<ShopRecord> = find
            .await
            .map_err(mongo_error(Operation::Read))?
            .try_collect()
            .await
            .map_err(mongo_error(Operation::Read))?;

        let mut shops = Vec::with_capacity(records.len());
        for record in records {
            let items = self
                .find_items(doc! { "shop_id": record.id.as_str() }, None)
                .await?;
            shops.push(record.into_shop(items));
        }
        Ok(shops)
    }

    async fn insert_item_with_product(
        &self,
        session: &mut ClientSession,
        item: &ShopItemRecord,
        product: &ProductRecord,
    ) -> Result<()> {
        self.products
            .insert_one(product)
            .session(&mut *session)
            .await
            .map_err(mongo_error(Operation::Insert))?;
        debug!(product_id = %product.id, "product inserted");

        self.items
            .insert_one(item)
            .session(&mut *session)
            .await
            .map_err(mongo_error(Operation::Insert))?;
        debug!(shop_item_id = %item.id, "shop item inserted");

        Ok(())
    }
}

#[async_trait]
impl ShopRepository for MongoShopRepository {
    #[instrument(skip(self))]
    async fn get_shops(&self, limit: i64, offset: i64) -> Result<Vec<Shop>> {
        let Some(page) = Page::new(limit, offset) else {
            return Ok(Vec::new());
        };
        self.find_shops(doc! {}, Some(page)).await
    }

    #[instrument(skip(self), fields(shop_id = %id))]
    async fn get_shop_by_id(&self, id: &ShopId) -> Result<Shop> {
        let record = self
            .shops
            .find_one(doc! { "_id": id.as_str() })
            .await
            .map_err(mongo_error(Operation::Read))?
            .ok_or_else(|| not_found("shop", id))?;

        let items = self
            .find_items(doc! { "shop_id": id.as_str() }, None)
            .await?;
        Ok(record.into_shop(items))
    }

    #[instrument(skip(self), fields(seller_id = %seller_id))]
    async fn get_shops_by_seller_id(&self, seller_id: &UserId) -> Result<Vec<Shop>> {
        self.find_shops(doc! { "seller_id": seller_id.as_str() }, None)
            .await
    }

    #[instrument(skip(self, shop), fields(shop_id = %shop.id, seller_id = %shop.seller_id))]
    async fn create_shop(&self, shop: &Shop) -> Result<Shop> {
        self.shops
            .insert_one(ShopRecord::from(shop))
            .await
            .map_err(mongo_error(Operation::Insert))?;

        self.get_shop_by_id(&shop.id).await
    }

    #[instrument(skip(self, shop), fields(shop_id = %shop.id))]
    async fn update_shop(&self, shop: &Shop) -> Result<Shop> {
        self.shops
            .replace_one(doc! { "_id": shop.id.as_str() }, ShopRecord::from(shop))
            .await
            .map_err(mongo_error(Operation::Update))?;

        self.get_shop_by_id(&shop.id).await
    }

    #[instrument(skip(self), fields(shop_id = %id))]
    async fn delete_shop(&self, id: &ShopId) -> Result<()> {
        self.shops
            .delete_one(doc! { "_id": id.as_str() })
            .await
            .map_err(mongo_error(Operation::Delete))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_shop_items(&self, limit: i64, offset: i64) -> Result<Vec<ShopItem>> {
        let Some(page) = Page::new(limit, offset) else {
            return Ok(Vec::new());
        };
        self.find_items(doc! {}, Some(page)).await
    }

    #[instrument(skip(self), fields(shop_item_id = %id))]
    async fn get_shop_item_by_id(&self, id: &ShopItemId) -> Result<ShopItem> {
        let record = self
            .items
            .find_one(doc! { "_id": id.as_str() })
            .await
            .map_err(mongo_error(Operation::Read))?
            .ok_or_else(|| not_found("shop item", id))?;
        Ok(record.into())
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn get_shop_item_by_product_id(&self, product_id: &ProductId) -> Result<ShopItem> {
        let record = self
            .items
            .find_one(doc! { "product_id": product_id.as_str() })
            .sort(doc! { "_id": 1 })
            .await
            .map_err(mongo_error(Operation::Read))?
            .ok_or_else(|| {
                RepositoryError::NotExist(format!("no shop item stocks product {product_id}"))
            })?;
        Ok(record.into())
    }

    #[instrument(
        skip(self, item, product),
        fields(shop_item_id = %item.id, shop_id = %item.shop_id, product_id = %product.id)
    )]
    async fn create_shop_item(&self, item: &ShopItem, product: &Product) -> Result<ShopItem> {
        let item_record = ShopItemRecord::from(item);
        let product_record = ProductRecord::from(product);

        let mut session = begin(&self.client).await?;
        let outcome = self
            .insert_item_with_product(&mut session, &item_record, &product_record)
            .await;
        finish(session, outcome, "shop item creation").await?;

        self.get_shop_item_by_id(&item.id).await
    }

    #[instrument(skip(self, item), fields(shop_item_id = %item.id))]
    async fn update_shop_item(&self, item: &ShopItem) -> Result<ShopItem> {
        self.items
            .replace_one(doc! { "_id": item.id.as_str() }, ShopItemRecord::from(item))
            .await
            .map_err(mongo_error(Operation::Update))?;

        self.get_shop_item_by_id(&item.id).await
    }

    #[instrument(skip(self), fields(shop_item_id = %id))]
    async fn delete_shop_item(&self, id: &ShopItemId) -> Result<()> {
        self.items
            .delete_one(doc! { "_id": id.as_str() })
            .await
            .map_err(mongo_error(Operation::Delete))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mongodb::bson;

    use super::*;

    #[test]
    fn test_shop_record_round_trip() {
        let shop = Shop {
            id: ShopId::new("30e18bc1-4354-4937-9a3b-03cf0b7027b1"),
            seller_id: UserId::new("30e18bc1-4354-4937-9a3b-03cf0b7027cc"),
            name: "Book corner".to_owned(),
            description: "Used books".to_owned(),
            requisites: "40702810900000000002".to_owned(),
            email: "books@mail.ru".to_owned(),
            items: Vec::new(),
        };
        let document = bson::to_document(&ShopRecord::from(&shop)).unwrap();
        assert!(!document.contains_key("items"));

        let record: ShopRecord = bson::from_document(document).unwrap();
        assert_eq!(record.into_shop(Vec::new()), shop);
    }

    #[test]
    fn test_shop_item_record_round_trip() {
        let item = ShopItem {
            id: ShopItemId::new("si-1"),
            shop_id: ShopId::new("shop-1"),
            product_id: ProductId::new("product-1"),
            quantity: 5,
        };
        let record = ShopItemRecord::from(&item);
        assert_eq!(record.id, "si-1");
        assert_eq!(ShopItem::from(record), item);
    }
}
