//! The ARQL gateway: gated evaluation of tag-search queries.

use crate::body::{read_complete_body, BodyError};
use crate::reply::{json, text};
use crate::state::ApiState;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::warn;
use weavenode_chain::TxSearch;
use weavenode_types::constants::ARQL_ACQUIRE_TIMEOUT;
use weavenode_types::Hash;

/// A logical query over indexed transaction tags.
///
/// `and`/`or` are set-theoretic over id sets; `equals` is a tag-index
/// lookup with string name and value.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum ArqlExpr {
    And {
        expr1: Box<ArqlExpr>,
        expr2: Box<ArqlExpr>,
    },
    Or {
        expr1: Box<ArqlExpr>,
        expr2: Box<ArqlExpr>,
    },
    Equals {
        expr1: String,
        expr2: String,
    },
}

fn eval(expr: &ArqlExpr, search: &dyn TxSearch) -> HashSet<Hash> {
    match expr {
        ArqlExpr::And { expr1, expr2 } => {
            let left = eval(expr1, search);
            let right = eval(expr2, search);
            left.intersection(&right).copied().collect()
        }
        ArqlExpr::Or { expr1, expr2 } => {
            let mut left = eval(expr1, search);
            left.extend(eval(expr2, search));
            left
        }
        ArqlExpr::Equals { expr1, expr2 } => search
            .entries(expr1.as_bytes(), expr2.as_bytes())
            .into_iter()
            .collect(),
    }
}

/// Handler for `POST /arql`.
///
/// A semaphore bounds concurrent search load; a request that cannot get
/// a permit within the wait budget is turned away rather than queued
/// indefinitely.
pub async fn arql_handler(State(state): State<ApiState>, req: Request) -> Response {
    let _permit = match tokio::time::timeout(
        ARQL_ACQUIRE_TIMEOUT,
        state.arql_gate.clone().acquire_owned(),
    )
    .await
    {
        Ok(Ok(permit)) => permit,
        _ => return text(StatusCode::SERVICE_UNAVAILABLE, "ARQL unavailable."),
    };

    let bytes = match read_complete_body(req.into_body()).await {
        Ok(bytes) => bytes,
        Err(BodyError::TooLarge) => {
            return text(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large.")
        }
        Err(err) => {
            warn!(%err, "body read failed");
            return text(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read body.");
        }
    };
    let expr: ArqlExpr = match serde_json::from_slice(&bytes) {
        Ok(expr) => expr,
        Err(err) => {
            warn!(%err, "invalid arql query");
            return text(StatusCode::BAD_REQUEST, "Invalid query.");
        }
    };

    let ids: Vec<Hash> = eval(&expr, state.search.as_ref()).into_iter().collect();
    let ordered = state.search.sort_txids(ids);
    json(StatusCode::OK, ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{body_json, body_string, post_json, TestEnv};
    use serde_json::json;
    use tower::ServiceExt;
    use weavenode_types::Tag;

    fn indexed_env() -> TestEnv {
        let env = TestEnv::new();
        let t1 = Hash::digest(b"t1");
        let t2 = Hash::digest(b"t2");
        let t3 = Hash::digest(b"t3");
        env.search.index(t1, vec![Tag::new(b"name", b"v")]);
        env.search
            .index(t2, vec![Tag::new(b"name", b"v"), Tag::new(b"app", b"mail")]);
        env.search.index(t3, vec![Tag::new(b"app", b"mail")]);
        env
    }

    #[tokio::test]
    async fn test_equals_newest_first() {
        let env = indexed_env();
        let (t1, t2) = (Hash::digest(b"t1"), Hash::digest(b"t2"));
        let query = json!({"op": "equals", "expr1": "name", "expr2": "v"});
        let response = env.router().oneshot(post_json("/arql", &query)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let ids: Vec<String> = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(ids, vec![t2.to_base64url(), t1.to_base64url()]);
    }

    #[tokio::test]
    async fn test_and_intersects() {
        let env = indexed_env();
        let t2 = Hash::digest(b"t2");
        let query = json!({
            "op": "and",
            "expr1": {"op": "equals", "expr1": "name", "expr2": "v"},
            "expr2": {"op": "equals", "expr1": "app", "expr2": "mail"},
        });
        let response = env.router().oneshot(post_json("/arql", &query)).await.unwrap();
        let ids: Vec<String> = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(ids, vec![t2.to_base64url()]);
    }

    #[tokio::test]
    async fn test_or_unions_and_dedups() {
        let env = indexed_env();
        let query = json!({
            "op": "or",
            "expr1": {"op": "equals", "expr1": "name", "expr2": "v"},
            "expr2": {"op": "equals", "expr1": "app", "expr2": "mail"},
        });
        let response = env.router().oneshot(post_json("/arql", &query)).await.unwrap();
        let ids: Vec<String> = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_query_is_400() {
        let env = TestEnv::new();
        let query = json!({"op": "between", "expr1": "a", "expr2": "b"});
        let response = env.router().oneshot(post_json("/arql", &query)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Invalid query.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_gate_turns_requests_away() {
        let env = indexed_env();
        // drain every permit so the handler has to wait out the budget
        let gate = env.state.arql_gate.clone();
        let permits = gate
            .acquire_many_owned(weavenode_types::constants::ARQL_CONCURRENCY as u32)
            .await
            .unwrap();
        let query = json!({"op": "equals", "expr1": "name", "expr2": "v"});
        let response = env.router().oneshot(post_json("/arql", &query)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_string(response).await, "ARQL unavailable.");
        drop(permits);
    }
}
