//! Drives a real server over TCP through `orderdesk-client`'s `RestStore`.

use std::sync::Arc;

use orderdesk_api::{run_with_listener, ApiConfig, AppState};
use orderdesk_client::{ClientError, OrderStore, RestStore, SessionContext};
use orderdesk_core::{ClientInput, Money, PaymentAllocation, ProductInput, TransactionStatus, VendorInput};
use orderdesk_db::{Database, DbConfig};
use tokio::sync::oneshot;

struct Server {
    base_url: String,
    stop: Option<oneshot::Sender<()>>,
}

impl Drop for Server {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

async fn spawn_server() -> Server {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    db.vendors()
        .insert(&VendorInput {
            id: Some("V002".to_string()),
            name: "Ana Gomez".to_string(),
            route: None,
        })
        .await
        .unwrap();

    let config = ApiConfig {
        jwt_secret: "rest-client-secret".to_string(),
        ..ApiConfig::default()
    };
    let state = Arc::new(AppState::new(db, config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (stop, stopped) = oneshot::channel::<()>();
    tokio::spawn(async move {
        run_with_listener(state, listener, async move {
            let _ = stopped.await;
        })
        .await
        .unwrap();
    });

    Server {
        base_url: format!("http://{addr}/"),
        stop: Some(stop),
    }
}

#[tokio::test]
async fn order_flow_over_http() {
    let server = spawn_server().await;
    let mut ctx = SessionContext::new(RestStore::new(&server.base_url).unwrap());

    let err = ctx.store().list_vendors().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)));

    ctx.login("V002", "Ana Gomez").await.unwrap();
    assert_eq!(ctx.vendor().unwrap().id, "V002");

    let product = ctx
        .store()
        .create_product(&ProductInput {
            code: "REF-12".to_string(),
            name: "Refresco 12 oz".to_string(),
            price_cents: 2_500,
            tax_rate_bps: 1_800,
            stock: 100,
            category: Some("Bebidas".to_string()),
        })
        .await
        .unwrap();
    let client = ctx
        .store()
        .create_client(&ClientInput {
            name: "Supermercado Central".to_string(),
            rnc: None,
            address: None,
            phone: None,
            credit_cents: 0,
        })
        .await
        .unwrap();

    ctx.start_order(&client.id).unwrap();
    ctx.add_product(&product, 4).unwrap();
    let local = ctx.draft_totals().unwrap();

    let invoice = ctx.submit_draft().await.unwrap();
    assert_eq!(invoice.transaction.total(), local.total);
    assert_eq!(invoice.transaction.total(), Money::from_cents(11_800));
    assert!(ctx.draft().is_empty());

    let too_much = PaymentAllocation::from_cents(20_000, 0, 0, 0);
    let err = ctx.pay(&invoice.transaction.id, too_much, None).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));

    let exact = PaymentAllocation::from_cents(10_000, 1_800, 0, 0);
    assert!(ctx.preview_payment(&invoice.transaction, &exact).valid);
    ctx.pay(&invoice.transaction.id, exact, Some("Pago completo".to_string()))
        .await
        .unwrap();

    let paid = ctx.store().get_transaction(&invoice.transaction.id).await.unwrap();
    assert_eq!(paid.transaction.status, TransactionStatus::Paid);
    assert_eq!(paid.references.len(), 1);

    ctx.logout().await.unwrap();
    assert!(!ctx.is_logged_in());
    assert!(ctx.store().token().await.is_none());
}

#[tokio::test]
async fn stale_token_is_rejected_after_logout() {
    let server = spawn_server().await;
    let store = RestStore::new(&server.base_url).unwrap();

    let mut ctx = SessionContext::new(RestStore::new(&server.base_url).unwrap());
    ctx.login("V002", "ana gomez").await.unwrap();
    let token = ctx.store().token().await.unwrap();
    ctx.logout().await.unwrap();

    store.set_token(token).await;
    let err = store.get_settings().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)));
}
