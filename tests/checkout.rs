mod common;

use common::{add_product, buyer, open_shop, stock_of};
use std::collections::HashSet;
use storefront_core::{CartSession, CheckoutError, Money, OrderStatus};

#[tokio::test]
async fn test_successful_checkout_reserves_stock_and_empties_cart() {
    let t = open_shop().await;
    let session = CartSession::default();
    let a = add_product(&t.shop, "Arduino Uno", 1000, 5).await;
    t.shop.add_to_cart(&session, a.id, 2).await.unwrap();

    let order = t.shop.checkout(&session, buyer("Ana Maria")).await.unwrap();

    assert_eq!(stock_of(&t.shop, a.id).await, 3);
    assert_eq!(order.total, Money::from_cents(2000));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.customer_email, "ana.maria@example.com");
    assert!(t.shop.database().cart(&session).summary().await.unwrap().is_empty());

    let stored = t.shop.database().orders().find_by_number(order.order_number.as_str()).await.unwrap().unwrap();
    assert_eq!(stored.id, order.id);
}

#[tokio::test]
async fn test_insufficient_stock_changes_nothing() {
    let t = open_shop().await;
    let session = CartSession::default();
    let b = add_product(&t.shop, "Raspberry Pi", 5500, 2).await;
    t.shop.add_to_cart(&session, b.id, 2).await.unwrap();
    // Someone else bought one after it went into the cart.
    t.shop.database().products().set_stock(b.id, 1).await.unwrap();

    let err = t.shop.checkout(&session, buyer("Luis")).await.unwrap_err();

    match err {
        CheckoutError::InsufficientStock { product_id, requested, available } => {
            assert_eq!((product_id, requested, available), (b.id, 2, 1));
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
    assert_eq!(stock_of(&t.shop, b.id).await, 1);
    let cart = t.shop.database().cart(&session).list_with_product_info().await.unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!((cart[0].line.product_id, cart[0].line.quantity), (b.id, 2));
    assert_eq!(t.shop.database().orders().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_empty_cart_creates_no_order() {
    let t = open_shop().await;
    let err = t.shop.checkout(&CartSession::default(), buyer("Ana")).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(err.to_string(), "Your cart is empty");
    assert_eq!(t.shop.database().orders().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_failure_on_later_line_rolls_back_earlier_decrements() {
    let t = open_shop().await;
    let session = CartSession::default();
    let first = add_product(&t.shop, "Breadboard", 800, 5).await;
    let second = add_product(&t.shop, "Oscilloscope", 90000, 3).await;
    t.shop.add_to_cart(&session, first.id, 2).await.unwrap();
    t.shop.add_to_cart(&session, second.id, 3).await.unwrap();
    t.shop.database().products().set_stock(second.id, 1).await.unwrap();

    let err = t.shop.checkout(&session, buyer("Ana")).await.unwrap_err();

    assert!(matches!(err, CheckoutError::InsufficientStock { product_id, .. } if product_id == second.id));
    assert_eq!(stock_of(&t.shop, first.id).await, 5);
    assert_eq!(stock_of(&t.shop, second.id).await, 1);
    assert_eq!(t.shop.database().cart(&session).total_quantity().await.unwrap(), 5);
}

#[tokio::test]
async fn test_order_keeps_checkout_time_prices() {
    let t = open_shop().await;
    let session = CartSession::default();
    let p = add_product(&t.shop, "Multimeter", 4599, 10).await;
    t.shop.add_to_cart(&session, p.id, 3).await.unwrap();
    let order = t.shop.checkout(&session, buyer("Ana")).await.unwrap();

    let mut repriced = t.shop.database().products().find_by_id(p.id).await.unwrap().unwrap();
    repriced.price = Money::from_cents(9999);
    t.shop.database().products().update(&repriced).await.unwrap();

    let orders = t.shop.database().orders();
    let lines = orders.lines_with_product(order.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].product_name, "Multimeter");
    assert_eq!(lines[0].line.unit_price, Money::from_cents(4599));
    assert_eq!(lines[0].line.subtotal, Money::from_cents(13797));
    let stored = orders.find_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(stored.total, lines.iter().map(|l| l.line.subtotal).sum::<Money>());
}

#[tokio::test]
async fn test_sessions_have_separate_carts() {
    let t = open_shop().await;
    let (ana, luis) = (CartSession::generate(), CartSession::generate());
    let p = add_product(&t.shop, "Soldering iron", 3000, 10).await;
    t.shop.add_to_cart(&ana, p.id, 1).await.unwrap();
    t.shop.add_to_cart(&luis, p.id, 4).await.unwrap();

    t.shop.checkout(&ana, buyer("Ana")).await.unwrap();

    assert!(t.shop.database().cart(&ana).summary().await.unwrap().is_empty());
    assert_eq!(t.shop.database().cart(&luis).total_quantity().await.unwrap(), 4);
    assert_eq!(stock_of(&t.shop, p.id).await, 9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checkouts_for_last_unit() {
    let t = open_shop().await;
    let c = add_product(&t.shop, "Last LCD", 2000, 1).await;
    let (s1, s2) = (CartSession::generate(), CartSession::generate());
    t.shop.add_to_cart(&s1, c.id, 1).await.unwrap();
    t.shop.add_to_cart(&s2, c.id, 1).await.unwrap();

    let (shop1, shop2) = (t.shop.clone(), t.shop.clone());
    let h1 = tokio::spawn(async move { shop1.checkout(&s1, buyer("Ana")).await });
    let h2 = tokio::spawn(async move { shop2.checkout(&s2, buyer("Luis")).await });
    let results = [h1.await.unwrap(), h2.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(matches!(failure, CheckoutError::InsufficientStock { product_id, available: 0, .. } if *product_id == c.id));
    assert_eq!(stock_of(&t.shop, c.id).await, 0);
    assert_eq!(t.shop.database().orders().count().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_checkouts_never_oversell() {
    let t = open_shop().await;
    let p = add_product(&t.shop, "ESP32", 1200, 5).await;

    let mut handles = Vec::new();
    for i in 0..12 {
        let session = CartSession::named(format!("buyer-{i}"));
        t.shop.add_to_cart(&session, p.id, 1).await.unwrap();
        let shop = t.shop.clone();
        handles.push(tokio::spawn(async move { shop.checkout(&session, buyer("Ana")).await }));
    }

    let mut placed = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(order) => placed.push(order),
            Err(CheckoutError::InsufficientStock { .. }) => {}
            Err(other) => panic!("unexpected failure: {other:?}"),
        }
    }

    assert_eq!(placed.len(), 5);
    assert_eq!(stock_of(&t.shop, p.id).await, 0);
    let numbers: HashSet<_> = placed.iter().map(|o| o.order_number.clone()).collect();
    assert_eq!(numbers.len(), placed.len());
    assert_eq!(t.shop.database().orders().count_today().await.unwrap(), 5);
}
