///  To run :
///  cargo r --example client_example
use std::sync::Arc;

use orders_client::OrdersClient;
use orders_hex::inbound::http::{HttpServer, HttpServerConfig};
use orders_payments::event::EventEnvelope;
use orders_payments::fake::FakeGateway;
use orders_repo::build_repo;
use orders_types::domain::order::{ItemSize, NewItem, NewOrder, OrderStatus, PaymentStatus};
use orders_types::domain::payment::PaymentIntentRequest;
use tempfile::tempdir;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    // Temp file-backed SQLite DB so the example leaves nothing behind.
    let tmp = tempdir()?;
    let db_url = format!("sqlite://{}", tmp.path().join("orders.db").display());
    let repo = Arc::new(build_repo(Some(&db_url)).await?);
    let gateway = Arc::new(FakeGateway::new("whsec_example"));

    let server = HttpServer::new(
        repo.clone(),
        gateway.clone(),
        HttpServerConfig::new(port.to_string(), "example-admin"),
    )
    .await?;
    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let client = OrdersClient::builder(&addr)?
        .with_admin_key("example-admin")
        .build()?;

    let created = client
        .create_order(&NewOrder {
            items: vec![NewItem {
                main_colours: vec!["red".into(), "pink".into()],
                size: ItemSize::M,
                comments: Some("Please include roses".into()),
            }],
            buyer_full_name: "Example Buyer".into(),
            buyer_email: "buyer@example.com".into(),
            buyer_phone: "+1-555-0100".into(),
            delivery_address: "1 Example Way".into(),
        })
        .await?;
    let id = created.order_id.to_string();
    println!("Created order id={id}");

    let intent = client
        .create_payment_intent(&PaymentIntentRequest {
            order_id: created.order_id,
            amount: 5000,
            currency: "usd".into(),
        })
        .await?;
    println!("Payment intent {} issued", intent.payment_intent_id);

    // Stand in for the processor delivering its webhook.
    let envelope = EventEnvelope::payment_intent("evt_example", "payment_intent.succeeded", Some(&id));
    let (body, signature) = gateway.sign_event(&envelope);
    let res = reqwest::Client::new()
        .post(format!("{addr}payments/webhook"))
        .header("stripe-signature", signature)
        .body(body)
        .send()
        .await?;
    println!("Webhook acknowledged with {}", res.status());

    let fetched = client.get_order(&id).await?;
    assert_eq!(fetched.payment_status, PaymentStatus::Completed);

    let updated = client.update_order_status(&id, OrderStatus::InProgress).await?;
    println!("Order {} is now {}", updated.order_id, updated.order_status);

    handle.abort();
    repo.close().await;
    Ok(())
}
