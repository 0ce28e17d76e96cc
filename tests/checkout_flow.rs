//! End-to-end shopping flow against an in-memory store and a virtual clock.

use std::sync::Arc;

use jiff::SignedDuration;
use rusty_money::{Money, iso};
use testresult::TestResult;

use storefront::{
    cart::NewCartItem,
    catalog::{Catalog, Customization, DiamondCarat, DiamondType, GoldCarat},
    clock::{Clock, ManualClock},
    events::{Notification, RecordingObserver, StorefrontEvent},
    orders::OrderStatus,
    prices::Price,
    session::{CheckoutError, SessionSettings, Storefront},
    store::MemoryStore,
};

struct Shop {
    store: MemoryStore,
    clock: ManualClock,
    observer: RecordingObserver,
    session: Storefront,
}

fn shop() -> TestResult<Shop> {
    let store = MemoryStore::new();
    let clock = ManualClock::new("2025-05-10T14:00:00Z".parse()?);
    let observer = RecordingObserver::new();

    let session = Storefront::open(
        Arc::new(store.clone()),
        Arc::new(clock.clone()),
        Arc::new(observer.clone()),
        SessionSettings {
            seed_demo_orders: false,
            rng_seed: Some(7),
            ..SessionSettings::default()
        },
    );

    Ok(Shop {
        store,
        clock,
        observer,
        session,
    })
}

#[test]
fn customized_watch_goes_from_cart_to_delivery() -> TestResult {
    let Shop {
        store: _store,
        clock,
        observer,
        mut session,
    } = shop()?;

    let catalog = Catalog::builtin()?;
    let submariner = catalog.get("rolex-submariner").ok_or("missing submariner")?;
    let seamaster = catalog.get("omega-seamaster").ok_or("missing seamaster")?;

    let customization = Customization {
        gold_carat: GoldCarat::K18,
        diamond_type: DiamondType::Real,
        diamond_carat: DiamondCarat::One,
    };

    session
        .cart_mut()
        .add_item(submariner.to_cart_item(1, &customization))?;
    session
        .cart_mut()
        .add_item(seamaster.to_cart_item(2, &Customization::default()))?;

    // 12,500 + 2,500 + 8,000 + 12,000, plus 2 x 6,500
    assert_eq!(
        session.cart().total(),
        Money::from_minor(4_800_000, iso::USD)
    );
    assert_eq!(session.cart().item_count(), 3);

    let order = session.checkout()?;

    assert_eq!(order.id, "ORD-001");
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.total, Price::from_major(48_000));
    assert!(order.tracking_number.starts_with("TLX"));
    assert!(session.cart().is_empty());

    observer.clear();

    let mut seen = Vec::new();

    for minutes in [2, 3, 5] {
        clock.advance(SignedDuration::from_mins(minutes));
        assert_eq!(session.tick(), 1, "one transition due after {minutes} more minutes");

        let status = session
            .orders()
            .get("ORD-001")
            .map(|order| order.status)
            .ok_or("order vanished")?;

        seen.push(status);
    }

    assert_eq!(
        seen,
        vec![
            OrderStatus::Processing,
            OrderStatus::InTransit,
            OrderStatus::Delivered
        ]
    );

    let delivered = session.orders().get("ORD-001").ok_or("order vanished")?;

    assert_eq!(delivered.delivered_date, Some(clock.now()));
    assert_eq!(delivered.status_history.len(), 4);
    assert_eq!(
        observer.notifications(),
        vec![
            Notification::info("Order ORD-001 status updated to: Processing"),
            Notification::info("Order ORD-001 status updated to: In Transit"),
            Notification::info("Order ORD-001 status updated to: Delivered"),
        ]
    );

    Ok(())
}

#[test]
fn later_orders_get_increasing_ids_newest_first() -> TestResult {
    let Shop { mut session, .. } = shop()?;

    for id in ["a", "b", "c"] {
        session
            .cart_mut()
            .add_item(NewCartItem::new(id, 1_000.0).name(id))?;
        session.checkout()?;
    }

    let ids: Vec<&str> = session
        .orders()
        .all()
        .iter()
        .map(|order| order.id.as_str())
        .collect();

    assert_eq!(ids, vec!["ORD-003", "ORD-002", "ORD-001"]);
    assert_eq!(
        session.account_summary().total_spent,
        Money::from_minor(300_000, iso::USD)
    );

    Ok(())
}

#[test]
fn reorder_of_unknown_order_changes_nothing() -> TestResult {
    let Shop {
        observer,
        mut session,
        ..
    } = shop()?;

    observer.clear();

    assert_eq!(
        session.reorder("ORD-999"),
        Err(CheckoutError::UnknownOrder("ORD-999".to_string()))
    );
    assert!(session.cart().is_empty());
    assert!(observer.events().is_empty());

    Ok(())
}

#[test]
fn reorder_merges_into_existing_cart_lines() -> TestResult {
    let Shop {
        observer,
        mut session,
        ..
    } = shop()?;

    let catalog = Catalog::builtin()?;
    let daytona = catalog.get("rolex-daytona").ok_or("missing daytona")?;

    session
        .cart_mut()
        .add_item(daytona.to_cart_item(1, &Customization::default()))?;
    let order = session.checkout()?;

    session
        .cart_mut()
        .add_item(daytona.to_cart_item(1, &Customization::default()))?;

    observer.clear();

    assert_eq!(session.reorder(&order.id)?, 1);
    assert_eq!(
        session.cart().get("rolex-daytona").map(|line| line.qty),
        Some(2)
    );
    assert!(
        observer
            .events()
            .contains(&StorefrontEvent::Notified(Notification::success(
                "1 item(s) added to cart!"
            )))
    );

    Ok(())
}

#[test]
fn session_state_is_shared_through_the_store() -> TestResult {
    let Shop {
        store,
        clock,
        mut session,
        ..
    } = shop()?;

    let catalog = Catalog::builtin()?;
    let nautilus = catalog
        .get("patek-philippe-nautilus")
        .ok_or("missing nautilus")?;

    session.favorites_mut().toggle(nautilus.to_favorite());
    session
        .cart_mut()
        .add_item(nautilus.to_cart_item(1, &Customization::default()))?;

    let reopened = Storefront::open(
        Arc::new(store),
        Arc::new(clock),
        Arc::new(RecordingObserver::new()),
        SessionSettings {
            seed_demo_orders: false,
            ..SessionSettings::default()
        },
    );

    assert!(reopened.favorites().contains("patek-philippe-nautilus"));
    assert_eq!(reopened.cart().lines(), session.cart().lines());

    let summary = reopened.account_summary();

    assert_eq!(summary.favorites, 1);
    assert_eq!(summary.cart_items, 1);
    assert_eq!(summary.orders, 0);

    Ok(())
}
