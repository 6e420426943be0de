use std::sync::Arc;

use orders_hex::application::order_service::OrderService;
use orders_hex::application::payment_service::PaymentService;
use orders_hex::application::reconciliation::{Outcome, PaymentReconciler};
use orders_hex::errors::AppError;
use orders_payments::event::EventEnvelope;
use orders_payments::fake::FakeGateway;
use orders_repo::memory::InMemoryRepo;
use orders_types::domain::order::{ItemSize, NewItem, NewOrder, Order, OrderStatus, PaymentStatus};
use orders_types::domain::payment::PaymentIntentRequest;
use orders_types::ports::order_repository::OrderRepository;

fn bouquet_order() -> NewOrder {
    NewOrder {
        items: vec![NewItem {
            main_colours: vec!["red".into(), "pink".into()],
            size: ItemSize::M,
            comments: Some("Please include roses".into()),
        }],
        buyer_full_name: "Eve".into(),
        buyer_email: "eve@example.com".into(),
        buyer_phone: "555-0142".into(),
        delivery_address: "9 Tulip Row".into(),
    }
}

// End-to-end service flow against the in-memory adapter.
#[tokio::test]
async fn order_payment_and_fulfilment_flow() {
    let repo = Arc::new(InMemoryRepo::new());
    let gateway = Arc::new(FakeGateway::new("whsec_flow"));
    let orders = OrderService::new(repo.clone());
    let payments = PaymentService::new(repo.clone(), gateway.clone());
    let reconciler = PaymentReconciler::new(orders.lifecycle().clone(), gateway.clone());

    let order = orders.create_order(bouquet_order()).await.unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Incomplete);
    assert_eq!(order.order_status, OrderStatus::NotStarted);
    assert_eq!(order.items[0].main_colours, vec!["red", "pink"]);

    let handle = payments
        .create_payment_intent(PaymentIntentRequest {
            order_id: order.order_id,
            amount: 5000,
            currency: "usd".into(),
        })
        .await
        .unwrap();
    assert!(!handle.client_secret.is_empty());
    // Issuing a handle does not pay the order.
    assert_eq!(
        orders.get_order(order.order_id).await.unwrap().payment_status,
        PaymentStatus::Incomplete
    );

    let envelope = EventEnvelope::payment_intent(
        "evt_flow",
        "payment_intent.succeeded",
        Some(&order.order_id.to_string()),
    );
    let (body, header) = gateway.sign_event(&envelope);
    let outcome = reconciler.handle_event(&body, Some(&header)).await.unwrap();
    assert_eq!(outcome, Outcome::PaymentCompleted { order_id: order.order_id });

    let paid = orders.get_order(order.order_id).await.unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Completed);
    assert_eq!(paid.order_status, OrderStatus::NotStarted);

    let again = payments
        .create_payment_intent(PaymentIntentRequest {
            order_id: order.order_id,
            amount: 5000,
            currency: "usd".into(),
        })
        .await;
    assert!(matches!(again, Err(AppError::AlreadyPaid(_))));

    orders
        .update_order_status(order.order_id, OrderStatus::InProgress)
        .await
        .unwrap();
    let done = orders
        .update_order_status(order.order_id, OrderStatus::Completed)
        .await
        .unwrap();
    assert_eq!(done.payment_status, PaymentStatus::Completed);
    assert_eq!(done.order_status, OrderStatus::Completed);

    let list = orders.list_orders().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].order_id, order.order_id);
}

#[tokio::test]
async fn colliding_order_id_is_rejected_and_original_kept() {
    let repo = Arc::new(InMemoryRepo::new());
    let orders = OrderService::new(repo.clone());
    let first = orders.create_order(bouquet_order()).await.unwrap();

    let mut clash = Order::new(NewOrder {
        buyer_full_name: "Mallory".into(),
        ..bouquet_order()
    })
    .unwrap();
    clash.order_id = first.order_id;
    let err = repo.create(clash).await.map_err(AppError::from).unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists(_)));

    let stored = orders.get_order(first.order_id).await.unwrap();
    assert_eq!(stored, first);
}
