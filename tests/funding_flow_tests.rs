//! End-to-end wallet funding: client orchestrator against a live server.
//!
//! The server runs on an ephemeral port with mock persistence and a mock
//! gateway; the widget is scripted to simulate the customer paying.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::net::TcpListener;

use farmeely_api::api::create_router;
use farmeely_api::app::AppState;
use farmeely_api::client::{
    ClientConfig, ClientError, FundingEntry, FundingOrchestrator, FundingOutcome,
    HttpFundingBackend, NotificationHub, NotificationKind, PaymentWidget, QueryCache,
    SessionContext, WALLET_BALANCE_QUERY, WidgetOutcome, WidgetRequest,
};
use farmeely_api::test_utils::{MockDatabaseClient, MockPaymentGateway, test_user};

const USER_TOKEN: &str = "tok_user_1";

/// Widget that "pays" by registering a successful transaction with the mock gateway
struct PayingWidget {
    gateway: Arc<MockPaymentGateway>,
    status: &'static str,
}

#[async_trait]
impl PaymentWidget for PayingWidget {
    async fn open(&self, request: WidgetRequest) -> WidgetOutcome {
        self.gateway.set_transaction(
            &request.reference,
            request.amount_minor,
            self.status,
            Some(json!({"user_id": "user_1"})),
        );
        WidgetOutcome::Completed {
            reference: request.reference,
        }
    }
}

struct ClosingWidget;

#[async_trait]
impl PaymentWidget for ClosingWidget {
    async fn open(&self, _request: WidgetRequest) -> WidgetOutcome {
        WidgetOutcome::Closed
    }
}

struct Server {
    base_url: String,
    db: Arc<MockDatabaseClient>,
    gateway: Arc<MockPaymentGateway>,
}

async fn spawn_server() -> Server {
    let db = Arc::new(MockDatabaseClient::new());
    db.seed_session(USER_TOKEN, test_user("user_1"));
    let gateway = Arc::new(MockPaymentGateway::new());
    let state = Arc::new(AppState::new(
        Arc::clone(&db) as _,
        Arc::clone(&gateway) as _,
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });

    Server {
        base_url: format!("http://{}", addr),
        db,
        gateway,
    }
}

async fn orchestrator(
    server: &Server,
    widget: Arc<dyn PaymentWidget>,
    hub: NotificationHub,
    queries: Arc<QueryCache>,
) -> FundingOrchestrator {
    let session = Arc::new(SessionContext::new(hub.clone()));
    session.login(test_user("user_1"), USER_TOKEN).await;

    let config = ClientConfig::new(&server.base_url).with_public_key("pk_test_e2e");
    let backend = Arc::new(HttpFundingBackend::new(&server.base_url).unwrap());
    FundingOrchestrator::new(config, backend, widget, session, queries, hub)
}

#[tokio::test]
async fn test_dashboard_funding_credits_wallet() {
    let server = spawn_server().await;
    let hub = NotificationHub::default();
    let mut notes = hub.subscribe();
    let queries = Arc::new(QueryCache::new());
    let widget = Arc::new(PayingWidget {
        gateway: Arc::clone(&server.gateway),
        status: "success",
    });
    let orchestrator = orchestrator(&server, widget, hub, Arc::clone(&queries)).await;

    let outcome = orchestrator
        .fund_wallet(1500.0, FundingEntry::Dashboard)
        .await
        .unwrap();

    let FundingOutcome::Credited(receipt) = outcome else {
        panic!("expected a credited outcome");
    };
    assert!(receipt.reference.starts_with("wallet_funding_"));
    assert_eq!(receipt.amount, 1500.0);
    assert!(!receipt.already_credited);
    assert_eq!(server.db.wallet_balance("user_1"), 150_000);
    assert_eq!(queries.generation(WALLET_BALANCE_QUERY), 1);

    let intents = server.gateway.initialized_intents();
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].amount, 150_000);
    assert_eq!(intents[0].metadata, Some(json!({"user_id": "user_1"})));

    let note = notes.recv().await.unwrap();
    assert_eq!(note.kind, NotificationKind::Success);

    // The redirect page landing on the same reference does not credit again
    let again = orchestrator
        .resume_from_callback(&receipt.reference)
        .await
        .unwrap();
    assert!(again.already_credited);
    assert_eq!(server.db.wallet_balance("user_1"), 150_000);
    assert_eq!(server.db.transaction_count(), 1);
}

#[tokio::test]
async fn test_minimum_amount_funds_and_invalidates_balance_once() {
    let server = spawn_server().await;
    let hub = NotificationHub::default();
    let mut notes = hub.subscribe();
    let queries = Arc::new(QueryCache::new());
    let widget = Arc::new(PayingWidget {
        gateway: Arc::clone(&server.gateway),
        status: "success",
    });
    let orchestrator = orchestrator(&server, widget, hub, Arc::clone(&queries)).await;

    let outcome = orchestrator
        .fund_wallet(100.0, FundingEntry::Dashboard)
        .await
        .unwrap();

    let FundingOutcome::Credited(receipt) = outcome else {
        panic!("expected a credited outcome");
    };
    assert_eq!(receipt.amount, 100.0);
    assert!(!receipt.already_credited);

    let intents = server.gateway.initialized_intents();
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].amount, 10_000);
    assert_eq!(server.gateway.verify_calls(), 1);
    assert_eq!(server.db.wallet_balance("user_1"), 10_000);
    assert_eq!(queries.generation(WALLET_BALANCE_QUERY), 1);
    assert_eq!(notes.recv().await.unwrap().kind, NotificationKind::Success);
    assert!(!orchestrator.is_processing());
}

#[tokio::test]
async fn test_unsuccessful_payment_is_not_credited() {
    let server = spawn_server().await;
    let hub = NotificationHub::default();
    let mut notes = hub.subscribe();
    let queries = Arc::new(QueryCache::new());
    let widget = Arc::new(PayingWidget {
        gateway: Arc::clone(&server.gateway),
        status: "failed",
    });
    let orchestrator = orchestrator(&server, widget, hub, Arc::clone(&queries)).await;

    let err = orchestrator
        .fund_wallet(500.0, FundingEntry::Redirect)
        .await
        .unwrap_err();

    match err {
        ClientError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Payment verification failed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(server.db.wallet_balance("user_1"), 0);
    assert_eq!(queries.generation(WALLET_BALANCE_QUERY), 0);
    assert_eq!(notes.recv().await.unwrap().kind, NotificationKind::Error);
    assert!(!orchestrator.is_processing());
}

#[tokio::test]
async fn test_closed_widget_leaves_wallet_untouched() {
    let server = spawn_server().await;
    let queries = Arc::new(QueryCache::new());
    let orchestrator = orchestrator(
        &server,
        Arc::new(ClosingWidget),
        NotificationHub::default(),
        Arc::clone(&queries),
    )
    .await;

    let outcome = orchestrator
        .fund_wallet(500.0, FundingEntry::Dashboard)
        .await
        .unwrap();

    assert!(matches!(outcome, FundingOutcome::Cancelled));
    assert_eq!(server.gateway.verify_calls(), 0);
    assert_eq!(server.db.wallet_balance("user_1"), 0);
    assert_eq!(queries.generation(WALLET_BALANCE_QUERY), 0);
}
