//! Block ingestion: the `POST /block` pipeline.
//!
//! An ordered sequence of stages, each either short-circuiting with a
//! terminal response or passing context along. Cheap lookups and
//! anti-DoS gates run first, the proof of work runs before any block
//! reconstruction, and the data segment only counts as "seen" once its
//! PoW held up - otherwise a bogus block sharing a segment hash could
//! inoculate the node against the real one.

use crate::body::{read_complete_body, BodyError};
use crate::reply::text;
use crate::state::ApiState;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Extension;
use bytes::Bytes;
use serde::Deserialize;
use tracing::warn;
use weavenode_chain::min_difficulty;
use weavenode_types::constants::{BAD_POW_BAN_TIME, STORE_BLOCKS_BEHIND_CURRENT};
use weavenode_types::{Base64, BlockShadow, Hash, Peer, RecallHint};

/// Wire shape of a gossiped block.
#[derive(Debug, Deserialize)]
struct PostBlockBody {
    new_block: BlockShadow,
    recall_block: Hash,
    #[serde(default)]
    recall_size: u64,
    block_data_segment: Option<Base64>,
    #[serde(default)]
    key: Base64,
    #[serde(default)]
    nonce: Base64,
}

/// Handler for `POST /block`.
pub async fn post_block_handler(
    State(state): State<ApiState>,
    Extension(peer): Extension<Peer>,
    req: Request,
) -> Response {
    match ingest(&state, peer, req).await {
        Ok(response) | Err(response) => response,
    }
}

async fn ingest(state: &ApiState, peer: Peer, req: Request) -> Result<Response, Response> {
    check_blacklist(state, &peer)?;
    let body = parse_body(read_body(req).await?)?;
    let bds = require_data_segment(&body)?;
    let bds_hash = Hash::digest(bds.as_slice());
    check_data_segment_fresh(state, &bds_hash)?;
    claim_indep_hash(state, &body.new_block)?;
    let height = require_joined(state)?;
    check_height_window(&body.new_block, height)?;
    check_min_difficulty(&body.new_block)?;
    check_pow(state, &peer, &body.new_block, bds, &bds_hash)?;
    check_timestamp(state, &body.new_block)?;
    dispatch(state, peer, body, bds_hash);
    Ok(text(StatusCode::OK, "OK"))
}

fn check_blacklist(state: &ApiState, peer: &Peer) -> Result<(), Response> {
    if state.blacklist.is_banned(peer) {
        return Err(text(
            StatusCode::FORBIDDEN,
            "IP address blocked due to previous request.",
        ));
    }
    Ok(())
}

async fn read_body(req: Request) -> Result<Bytes, Response> {
    match read_complete_body(req.into_body()).await {
        Ok(bytes) => Ok(bytes),
        Err(BodyError::TooLarge) => Err(text(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body too large.",
        )),
        Err(err) => {
            warn!(%err, "body read failed");
            Err(text(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read body."))
        }
    }
}

fn parse_body(bytes: Bytes) -> Result<PostBlockBody, Response> {
    serde_json::from_slice(&bytes).map_err(|err| {
        warn!(%err, "malformed block json");
        text(StatusCode::BAD_REQUEST, "Invalid block.")
    })
}

fn require_data_segment(body: &PostBlockBody) -> Result<&Base64, Response> {
    match &body.block_data_segment {
        Some(bds) if !bds.is_empty() => Ok(bds),
        _ => {
            warn!(
                indep_hash = %body.new_block.indep_hash,
                "block posted without data segment"
            );
            Err(text(StatusCode::BAD_REQUEST, "block_data_segment missing."))
        }
    }
}

fn check_data_segment_fresh(state: &ApiState, bds_hash: &Hash) -> Result<(), Response> {
    if state.ignored.contains(bds_hash) {
        return Err(text(
            StatusCode::ALREADY_REPORTED,
            "Block Data Segment already processed.",
        ));
    }
    Ok(())
}

/// Claim the independent hash; the earlier contains-and-insert wins and
/// the loser reports 208.
fn claim_indep_hash(state: &ApiState, shadow: &BlockShadow) -> Result<(), Response> {
    if !state.ignored.insert(shadow.indep_hash) {
        return Err(text(
            StatusCode::ALREADY_REPORTED,
            "Block already processed.",
        ));
    }
    Ok(())
}

fn require_joined(state: &ApiState) -> Result<u64, Response> {
    state
        .node
        .height()
        .ok_or_else(|| text(StatusCode::SERVICE_UNAVAILABLE, "Not joined."))
}

fn check_height_window(shadow: &BlockShadow, current: u64) -> Result<(), Response> {
    if shadow.height + STORE_BLOCKS_BEHIND_CURRENT < current {
        return Err(text(StatusCode::BAD_REQUEST, "Height is too far behind"));
    }
    if shadow.height > current + STORE_BLOCKS_BEHIND_CURRENT {
        return Err(text(StatusCode::BAD_REQUEST, "Height is too far ahead"));
    }
    Ok(())
}

/// Silent rejection; wrong-network traffic trips this constantly.
fn check_min_difficulty(shadow: &BlockShadow) -> Result<(), Response> {
    if shadow.diff < min_difficulty(shadow.height) {
        return Err(text(StatusCode::BAD_REQUEST, "Difficulty too low"));
    }
    Ok(())
}

/// First cryptographic cost in the pipeline. Failure bans the peer; the
/// data segment is marked seen only on success.
fn check_pow(
    state: &ApiState,
    peer: &Peer,
    shadow: &BlockShadow,
    bds: &Base64,
    bds_hash: &Hash,
) -> Result<(), Response> {
    if !state
        .pow
        .validate(bds.as_slice(), shadow.nonce.as_slice(), shadow.diff, shadow.height)
    {
        warn!(%peer, indep_hash = %shadow.indep_hash, "invalid block PoW, banning peer");
        state.blacklist.ban(*peer, BAD_POW_BAN_TIME);
        return Err(text(StatusCode::BAD_REQUEST, "Invalid Block Proof of Work"));
    }
    state.ignored.insert(*bds_hash);
    Ok(())
}

fn check_timestamp(state: &ApiState, shadow: &BlockShadow) -> Result<(), Response> {
    if !state.builder.verify_timestamp(shadow) {
        warn!(
            indep_hash = %shadow.indep_hash,
            block_time = shadow.timestamp,
            "block timestamp outside acceptable window"
        );
        return Err(text(StatusCode::BAD_REQUEST, "Invalid timestamp."));
    }
    Ok(())
}

/// Reply 200 immediately; reconstruction and the bridge hand-off happen
/// in a detached task.
fn dispatch(state: &ApiState, peer: Peer, body: PostBlockBody, bds_hash: Hash) {
    let state = state.clone();
    tokio::spawn(async move {
        match state
            .builder
            .generate_block_from_shadow(&body.new_block, body.recall_size)
        {
            Ok(block) => {
                let recall = RecallHint {
                    indep_hash: body.recall_block,
                    size: body.recall_size,
                    key: body.key,
                    nonce: body.nonce,
                };
                state.bridge.add_block(peer, block, bds_hash, recall);
            }
            Err(err) => {
                warn!(indep_hash = %body.new_block.indep_hash, %err, "block reconstruction failed");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use crate::testutil::{
        body_string, post_block_request, post_json, sample_post_block, TestEnv,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;
    use weavenode_types::constants::STORE_BLOCKS_BEHIND_CURRENT;

    #[tokio::test]
    async fn test_accepted_block_reaches_bridge() {
        let env = TestEnv::joined(10);
        let body = sample_post_block(10);
        let response = env.router().oneshot(post_json("/block", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK");

        // the hand-off is asynchronous
        for _ in 0..100 {
            if env.bridge.dispatched_block_count() > 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(env.bridge.dispatched_block_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_data_segment() {
        let env = TestEnv::joined(10);
        let mut body = sample_post_block(10);
        body.as_object_mut().unwrap().remove("block_data_segment");
        let response = env.router().oneshot(post_json("/block", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "block_data_segment missing.");
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let env = TestEnv::joined(10);
        let response = env
            .router()
            .oneshot(crate::testutil::request_with_body(
                axum::http::Method::POST,
                "/block",
                b"[]".to_vec(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Invalid block.");
    }

    #[tokio::test]
    async fn test_double_post_is_208() {
        let env = TestEnv::joined(10);
        let body = sample_post_block(10);
        let first = env.router().oneshot(post_json("/block", &body)).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = env.router().oneshot(post_json("/block", &body)).await.unwrap();
        assert_eq!(second.status(), StatusCode::ALREADY_REPORTED);
        // deduplicated on the data segment, which was marked seen after
        // the PoW held up
        assert_eq!(
            body_string(second).await,
            "Block Data Segment already processed."
        );
    }

    #[tokio::test]
    async fn test_same_indep_hash_different_segment_is_208() {
        let env = TestEnv::joined(10);
        let body = sample_post_block(10);
        let first = env.router().oneshot(post_json("/block", &body)).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let mut replay = body.clone();
        replay["block_data_segment"] = json!("ZGlmZmVyZW50LXNlZ21lbnQ");
        let second = env.router().oneshot(post_json("/block", &replay)).await.unwrap();
        assert_eq!(second.status(), StatusCode::ALREADY_REPORTED);
        assert_eq!(body_string(second).await, "Block already processed.");
    }

    #[tokio::test]
    async fn test_not_joined_is_503() {
        let env = TestEnv::new();
        let body = sample_post_block(0);
        let response = env.router().oneshot(post_json("/block", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_string(response).await, "Not joined.");
    }

    #[tokio::test]
    async fn test_height_window() {
        let current = 200;
        let env = TestEnv::joined(current);

        let behind = sample_post_block(current - STORE_BLOCKS_BEHIND_CURRENT - 1);
        let response = env.router().oneshot(post_json("/block", &behind)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Height is too far behind");

        let ahead = sample_post_block(current + STORE_BLOCKS_BEHIND_CURRENT + 1);
        let response = env.router().oneshot(post_json("/block", &ahead)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Height is too far ahead");
    }

    #[tokio::test]
    async fn test_low_difficulty() {
        let env = TestEnv::joined(10);
        let mut body = sample_post_block(10);
        body["new_block"]["diff"] = json!(0);
        let response = env.router().oneshot(post_json("/block", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Difficulty too low");
    }

    #[tokio::test]
    async fn test_bad_pow_bans_peer() {
        let env = TestEnv::joined(10);
        env.pow.set_valid(false);
        let body = sample_post_block(10);
        let response = env
            .router()
            .oneshot(post_block_request(&body, [1, 2, 3, 4]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Invalid Block Proof of Work");

        // the same peer is now refused outright, valid PoW or not
        env.pow.set_valid(true);
        let retry = sample_post_block(11);
        let response = env
            .router()
            .oneshot(post_block_request(&retry, [1, 2, 3, 4]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // other peers are unaffected
        let other = sample_post_block(12);
        let response = env
            .router()
            .oneshot(post_block_request(&other, [5, 6, 7, 8]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bad_pow_does_not_burn_the_segment() {
        // a bogus block must not inoculate the node against the real one
        let env = TestEnv::joined(10);
        env.pow.set_valid(false);
        let body = sample_post_block(10);
        let response = env
            .router()
            .oneshot(post_block_request(&body, [1, 2, 3, 4]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // the honest peer retries the same segment under a new hash
        env.pow.set_valid(true);
        let mut honest = body.clone();
        honest["new_block"]["indep_hash"] =
            json!(weavenode_types::Hash::digest(b"honest-block").to_base64url());
        let response = env
            .router()
            .oneshot(post_block_request(&honest, [5, 6, 7, 8]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bad_timestamp() {
        let env = TestEnv::joined(10);
        let mut body = sample_post_block(10);
        body["new_block"]["timestamp"] = json!(1); // 1970
        let response = env.router().oneshot(post_json("/block", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Invalid timestamp.");
    }
}
