#![allow(dead_code)]

use storefront_core::{CustomerDetails, Money, NewProduct, Product, StoreConfig, Storefront};
use tempfile::TempDir;

/// A storefront over a database file in a throwaway directory.
pub struct TestShop {
    pub shop: Storefront,
    _dir: TempDir,
}

pub async fn open_shop() -> TestShop {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite:{}", dir.path().join("shop.db").display());
    let shop = Storefront::open(StoreConfig::default().with_database_url(url)).await.expect("open store");
    TestShop { shop, _dir: dir }
}

pub async fn add_product(shop: &Storefront, name: &str, cents: i64, stock: i64) -> Product {
    let products = shop.database().products();
    let id = products.insert(NewProduct::new(name, Money::from_cents(cents)).stock(stock)).await.expect("insert product");
    products.find_by_id(id).await.expect("read product").expect("product exists")
}

pub async fn stock_of(shop: &Storefront, product_id: i64) -> i64 {
    shop.database().products().find_by_id(product_id).await.unwrap().unwrap().stock
}

pub fn buyer(name: &str) -> CustomerDetails {
    CustomerDetails::new(name, format!("{}@example.com", name.to_lowercase().replace(' ', ".")), Some("+57 300 123 4567".into()))
}
