//! Order workflow and ledgers against both store adapters.
//!
//! Every scenario is a generic function over `Store`, run once on SQLite
//! (temporary database file) and once on the in-memory store.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use chrono::Duration;
use rust_decimal::Decimal;

use instrument_store::application::dto::{OrderLineRequestDto, PlaceOrderDto};
use instrument_store::application::services::price_ledger;
use instrument_store::{
    Caller, ErrorCode, InstrumentId, ManageCatalogUseCase, Money, OrderId, OrderStatus,
    OrderWorkflowUseCase, QueryOrdersUseCase, Role, ServiceError, Store, StoreTx, Timestamp,
    UserId,
};

use common::{ADMIN, CUSTOMER, FLUTE, GUITAR, populate, stock};

fn order(lines: &[(&str, i64)]) -> PlaceOrderDto {
    PlaceOrderDto {
        lines: lines
            .iter()
            .map(|(id, quantity)| OrderLineRequestDto {
                instrument_id: (*id).to_string(),
                quantity: *quantity,
            })
            .collect(),
    }
}

async fn place_cancel_and_delete<S: Store>(store: Arc<S>) {
    populate(store.as_ref()).await;
    let workflow = OrderWorkflowUseCase::new(Arc::clone(&store));
    let customer = UserId::new(CUSTOMER);

    let placed = workflow
        .create_order(&customer, order(&[(GUITAR, 2), (FLUTE, 1)]))
        .await
        .unwrap();
    assert_eq!(stock(store.as_ref(), GUITAR).await, 8);
    assert_eq!(stock(store.as_ref(), FLUTE).await, 3);
    assert_eq!(placed.total, Money::from_cents(24_000));

    let id = OrderId::new(&placed.id);
    workflow.set_status(&id, "CONFIRMED").await.unwrap();
    let cancelled = workflow.set_status(&id, OrderStatus::CANCELLED).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::CANCELLED);
    let labels: Vec<_> = cancelled.history.iter().map(|e| e.status.as_str()).collect();
    assert_eq!(labels, vec!["CANCELLED", "CONFIRMED", "PENDING"]);
    assert_eq!(stock(store.as_ref(), GUITAR).await, 10);
    assert_eq!(stock(store.as_ref(), FLUTE).await, 4);

    let err = workflow.delete_order(&id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Validation);

    let pending = workflow
        .create_order(&customer, order(&[(FLUTE, 4)]))
        .await
        .unwrap();
    assert_eq!(stock(store.as_ref(), FLUTE).await, 0);
    workflow
        .delete_order(&OrderId::new(&pending.id))
        .await
        .unwrap();
    assert_eq!(stock(store.as_ref(), FLUTE).await, 4);

    let mut tx = store.read().await.unwrap();
    assert!(tx.order(&OrderId::new(&pending.id)).await.unwrap().is_none());
    assert!(tx.order(&id).await.unwrap().is_some());
}

async fn failed_order_leaves_no_trace<S: Store>(store: Arc<S>) {
    populate(store.as_ref()).await;
    let workflow = OrderWorkflowUseCase::new(Arc::clone(&store));

    let err = workflow
        .create_order(&UserId::new(CUSTOMER), order(&[(GUITAR, 3), (FLUTE, 5)]))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ServiceError::InsufficientStock {
            instrument: "Flauta Dulce".to_string(),
            available: 4,
        }
    );
    assert_eq!(stock(store.as_ref(), GUITAR).await, 10);
    assert_eq!(stock(store.as_ref(), FLUTE).await, 4);
    let mut tx = store.read().await.unwrap();
    assert!(tx.orders(None).await.unwrap().is_empty());
}

async fn concurrent_orders_never_oversell<S: Store>(store: Arc<S>) {
    populate(store.as_ref()).await;
    let workflow = Arc::new(OrderWorkflowUseCase::new(Arc::clone(&store)));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let workflow = Arc::clone(&workflow);
            tokio::spawn(async move {
                workflow
                    .create_order(&UserId::new(CUSTOMER), order(&[(GUITAR, 3)]))
                    .await
            })
        })
        .collect();

    let mut granted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => granted += 1,
            Err(err) => assert_eq!(err.code(), ErrorCode::InsufficientStock),
        }
    }

    assert_eq!(granted, 3);
    assert_eq!(stock(store.as_ref(), GUITAR).await, 1);
    let mut tx = store.read().await.unwrap();
    assert_eq!(tx.orders(None).await.unwrap().len(), 3);
}

async fn price_history_is_append_only<S: Store>(store: Arc<S>) {
    populate(store.as_ref()).await;
    let guitar = InstrumentId::new(GUITAR);
    let base = Timestamp::now();
    let later = Timestamp::new(base.as_datetime() + Duration::seconds(10));
    let earlier = Timestamp::new(base.as_datetime() - Duration::seconds(3600));

    let mut tx = store.begin().await.unwrap();
    price_ledger::record_price_at(&mut tx, &guitar, Decimal::new(120, 0), later)
        .await
        .unwrap();
    price_ledger::record_price_at(&mut tx, &guitar, Decimal::new(130, 0), later)
        .await
        .unwrap();
    price_ledger::record_price_at(&mut tx, &guitar, Decimal::new(90, 0), earlier)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.read().await.unwrap();
    assert_eq!(
        price_ledger::current_price(&mut tx, &guitar).await.unwrap(),
        Money::from_cents(13_000)
    );
    let prices: Vec<_> = price_ledger::price_history(&mut tx, &guitar)
        .await
        .unwrap()
        .iter()
        .map(|entry| entry.price())
        .collect();
    assert_eq!(
        prices,
        vec![
            Money::from_cents(13_000),
            Money::from_cents(12_000),
            Money::from_cents(10_000),
            Money::from_cents(9_000),
        ]
    );
    drop(tx);

    let mut tx = store.begin().await.unwrap();
    let zero = price_ledger::record_price(&mut tx, &guitar, Decimal::ZERO).await;
    let ghost = price_ledger::record_price(&mut tx, &InstrumentId::new("ghost"), Decimal::ONE).await;
    assert_eq!(zero.unwrap_err().code(), ErrorCode::Validation);
    assert_eq!(ghost.unwrap_err().code(), ErrorCode::Validation);
}

async fn frozen_unit_price_survives_repricing<S: Store>(store: Arc<S>) {
    populate(store.as_ref()).await;
    let workflow = OrderWorkflowUseCase::new(Arc::clone(&store));
    let catalog = ManageCatalogUseCase::new(Arc::clone(&store));

    let placed = workflow
        .create_order(&UserId::new(CUSTOMER), order(&[(GUITAR, 2)]))
        .await
        .unwrap();
    catalog
        .record_price(&InstrumentId::new(GUITAR), Decimal::new(500, 0))
        .await
        .unwrap();

    let mut tx = store.read().await.unwrap();
    let reloaded = tx.order(&OrderId::new(&placed.id)).await.unwrap().unwrap();
    assert_eq!(reloaded.lines()[0].unit_price(), Money::from_cents(10_000));
    assert_eq!(reloaded.total(), Money::from_cents(20_000));
}

async fn ordered_instrument_cannot_be_deleted<S: Store>(store: Arc<S>) {
    populate(store.as_ref()).await;
    let workflow = OrderWorkflowUseCase::new(Arc::clone(&store));
    let catalog = ManageCatalogUseCase::new(Arc::clone(&store));
    workflow
        .create_order(&UserId::new(CUSTOMER), order(&[(GUITAR, 1)]))
        .await
        .unwrap();

    let err = catalog.delete(&InstrumentId::new(GUITAR)).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Validation);

    catalog.delete(&InstrumentId::new(FLUTE)).await.unwrap();
    let mut tx = store.read().await.unwrap();
    assert!(tx.price_history(&InstrumentId::new(FLUTE)).await.unwrap().is_empty());
}

async fn order_reads_back_as_placed<S: Store>(store: Arc<S>) {
    populate(store.as_ref()).await;
    let workflow = OrderWorkflowUseCase::new(Arc::clone(&store));
    let queries = QueryOrdersUseCase::new(Arc::clone(&store));
    let admin = Caller::new(UserId::new(ADMIN), Role::Admin);

    let placed = workflow
        .create_order(&UserId::new(CUSTOMER), order(&[(GUITAR, 1)]))
        .await
        .unwrap();
    let confirmed = workflow
        .set_status(&OrderId::new(&placed.id), "CONFIRMED")
        .await
        .unwrap();

    let reloaded = queries.get(&admin, &OrderId::new(&placed.id)).await.unwrap();
    assert_eq!(reloaded.created_at, placed.created_at);
    assert_eq!(reloaded.history, confirmed.history);
    assert_eq!(reloaded, confirmed);
}

async fn replenish_past_maximum_is_rejected<S: Store>(store: Arc<S>) {
    populate(store.as_ref()).await;
    let catalog = ManageCatalogUseCase::new(Arc::clone(&store));
    let guitar = InstrumentId::new(GUITAR);

    let err = catalog
        .replenish(&guitar, i64::from(u32::MAX))
        .await
        .unwrap_err();
    assert_eq!(err, ServiceError::validation("Stock would exceed the maximum"));
    assert_eq!(stock(store.as_ref(), GUITAR).await, 10);

    let topped = catalog
        .replenish(&guitar, i64::from(u32::MAX - 10))
        .await
        .unwrap();
    assert_eq!(topped.stock, u32::MAX);
    assert_eq!(stock(store.as_ref(), GUITAR).await, u32::MAX);
}

macro_rules! on_both_stores {
    ($($scenario:ident),* $(,)?) => {
        mod sqlite {
            use super::*;
            $(
                #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
                async fn $scenario() {
                    let (store, _dir) = common::sqlite_store().await;
                    super::$scenario(Arc::new(store)).await;
                }
            )*
        }

        mod memory {
            use super::*;
            $(
                #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
                async fn $scenario() {
                    super::$scenario(Arc::new(common::memory_store())).await;
                }
            )*
        }
    };
}

on_both_stores!(
    place_cancel_and_delete,
    failed_order_leaves_no_trace,
    concurrent_orders_never_oversell,
    price_history_is_append_only,
    frozen_unit_price_survives_repricing,
    ordered_instrument_cannot_be_deleted,
    order_reads_back_as_placed,
    replenish_past_maximum_is_rejected,
);
