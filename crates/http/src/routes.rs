//! Route table for the HTTP interface.

use crate::handlers::block::{current_block_handler, get_block_field_handler, get_block_handler};
use crate::handlers::chain::{
    hash_list_handler, height_handler, time_handler, tx_anchor_handler, wallet_list_handler,
};
use crate::handlers::info::info_handler;
use crate::handlers::peers::{peers_handler, post_peers_handler};
use crate::handlers::price::{price_for_wallet_handler, price_handler};
use crate::handlers::services::{get_services_handler, post_services_handler};
use crate::handlers::tx::{
    get_tx_field_handler, get_tx_handler, pending_txs_handler, serve_tx_data,
};
use crate::handlers::wallet::{
    balance_handler, deposits_from_handler, deposits_handler, last_tx_handler, txs_from_handler,
    txs_handler,
};
use crate::reply::text;
use crate::state::ApiState;
use crate::{admission, arql, ingest, internal, peer_meta, timeout};
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use axum::Router;
use weavenode_types::Hash;

/// Build the full router with all middleware attached.
///
/// Middleware, outermost first: default response headers, the deadline
/// supervisor, peer accounting, CORS preflight interception.
pub fn create_router(state: ApiState) -> Router {
    let handler_timeout = state.handler_timeout;
    Router::new()
        .route("/", get(info_handler))
        .route("/info", get(info_handler))
        .route("/time", get(time_handler))
        .route("/height", get(height_handler))
        .route("/hash_list", get(hash_list_handler))
        .route("/wallet_list", get(wallet_list_handler))
        .route("/tx_anchor", get(tx_anchor_handler))
        .route("/peers", get(peers_handler).post(post_peers_handler))
        .route("/tx", post(admission::post_tx_handler))
        .route("/tx/pending", get(pending_txs_handler))
        .route("/tx/{hash}", get(get_tx_handler))
        .route("/tx/{hash}/{field}", get(get_tx_field_handler))
        .route("/block", post(ingest::post_block_handler))
        .route("/block/current", get(current_block_handler))
        .route("/block/{kind}/{id}", get(get_block_handler))
        .route("/block/{kind}/{id}/{field}", get(get_block_field_handler))
        .route("/arql", post(arql::arql_handler))
        .route("/wallet", post(internal::post_wallet_handler))
        .route("/unsigned_tx", post(internal::post_unsigned_tx_handler))
        .route("/wallet/{addr}/balance", get(balance_handler))
        .route("/wallet/{addr}/last_tx", get(last_tx_handler))
        .route("/wallet/{addr}/txs", get(txs_handler))
        .route("/wallet/{addr}/txs/{earliest}", get(txs_from_handler))
        .route("/wallet/{addr}/deposits", get(deposits_handler))
        .route(
            "/wallet/{addr}/deposits/{earliest}",
            get(deposits_from_handler),
        )
        .route("/price/{bytes}", get(price_handler))
        .route("/price/{bytes}/{addr}", get(price_for_wallet_handler))
        .route("/services", get(get_services_handler).post(post_services_handler))
        .route("/api/ipfs/{*path}", any(ipfs_handler))
        .fallback(fallback_handler)
        .layer(middleware::from_fn(cors_preflight))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            peer_meta::track_peer,
        ))
        .layer(middleware::from_fn(move |req: Request, next: Next| {
            timeout::supervise_within(handler_timeout, req, next)
        }))
        .layer(middleware::from_fn(set_default_headers))
        .with_state(state)
}

/// Paths whose CORS preflight advertises POST alongside GET.
fn preflight_allows_post(path: &str) -> bool {
    matches!(path, "/block" | "/tx" | "/arql") || path.starts_with("/peer")
}

/// Answer CORS preflights before routing; every other method proceeds.
async fn cors_preflight(req: Request, next: Next) -> Response {
    if req.method() != Method::OPTIONS {
        return next.run(req).await;
    }
    let methods = if preflight_allows_post(req.uri().path()) {
        "GET, POST, OPTIONS"
    } else {
        "GET, OPTIONS"
    };
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_METHODS, methods),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
        "OK",
    )
        .into_response()
}

/// Merge the default header set into every response that did not set it.
async fn set_default_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    if !headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN) {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
    }
    response
}

/// Delegate `/api/ipfs/*` to the external IPFS adapter.
async fn ipfs_handler(State(state): State<ApiState>, req: Request) -> Response {
    let method = req.method().as_str().to_owned();
    let path = req.uri().path().to_owned();
    let body = match crate::body::read_complete_body(req.into_body()).await {
        Ok(bytes) => bytes,
        Err(crate::body::BodyError::TooLarge) => {
            return text(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large.")
        }
        Err(_) => return text(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read body."),
    };
    let (status, reply_body) = state.ipfs.handle(&method, &path, &body);
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, reply_body).into_response()
}

/// Anything the table does not know: the single-segment data shorthand
/// `GET /{hash}.{ext}`, else a uniform 400.
async fn fallback_handler(State(state): State<ApiState>, req: Request) -> Response {
    if matches!(*req.method(), Method::GET | Method::HEAD) {
        let path = req.uri().path().trim_start_matches('/');
        if !path.contains('/') {
            if let Some((id, ext)) = path.split_once('.') {
                return match Hash::from_base64url(id) {
                    Ok(id) => serve_tx_data(&state, &id, Some(ext)).await,
                    Err(_) => text(StatusCode::BAD_REQUEST, "Invalid hash."),
                };
            }
        }
    }
    text(StatusCode::BAD_REQUEST, "Request type not found.")
}
