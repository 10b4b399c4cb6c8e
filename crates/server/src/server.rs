use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{account, admin, funds, products, records, referrals};
use ledger::{AccrualPolicy, Engine, account as accounts};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
    pub accrual_policy: AccrualPolicy,
}

/// Basic-Auth middleware: phone + password against the accounts table.
///
/// Blocked accounts fail authentication outright; the resolved account model
/// is stored in request extensions for the handlers.
async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let account: Option<accounts::Model> = accounts::Entity::find()
        .filter(accounts::Column::Phone.eq(auth_header.username()))
        .filter(accounts::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(account) = account else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    if account.blocked {
        return Err(StatusCode::UNAUTHORIZED);
    }

    request.extensions_mut().insert(account);
    Ok(next.run(request).await)
}

/// Second gate for the admin surface: the authenticated account must carry
/// the admin flag.
async fn require_admin(request: Request, next: Next) -> Result<Response, StatusCode> {
    let is_admin = request
        .extensions()
        .get::<accounts::Model>()
        .is_some_and(|account| account.is_admin);

    if !is_admin {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    let admin_routes = Router::new()
        .route("/admin/accounts", get(admin::list_accounts))
        .route("/admin/accounts/{id}/block", post(admin::set_blocked))
        .route("/admin/referrals", get(admin::list_pending_referrals))
        .route("/admin/referrals/{id}/approve", post(admin::approve_referral))
        .route("/admin/referrals/{id}/reject", post(admin::reject_referral))
        .route_layer(middleware::from_fn(require_admin));

    let user_routes = Router::new()
        .route("/account", get(account::get))
        .route("/deposit", post(funds::deposit_new))
        .route("/withdraw", post(funds::withdraw_new))
        .route("/products", get(products::list))
        .route("/purchase", post(products::purchase_new))
        .route("/sell", post(products::sell_new))
        .route("/records", get(records::list))
        .route("/records/export", get(records::export_csv))
        .route("/referrals", get(referrals::summary));

    let protected = user_routes
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/register", post(account::register))
        .merge(protected)
        .with_state(state)
}

/// The full router, also usable in-process without a listener.
pub fn app(engine: Engine, db: DatabaseConnection, accrual_policy: AccrualPolicy) -> Router {
    router(ServerState {
        engine: Arc::new(engine),
        db,
        accrual_policy,
    })
}

pub async fn run(engine: Engine, db: DatabaseConnection, accrual_policy: AccrualPolicy) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, accrual_policy, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    accrual_policy: AccrualPolicy,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
        accrual_policy,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    accrual_policy: AccrualPolicy,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, accrual_policy, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
