//! Local JSON-RPC test validator.
//!
//! Serves the part of the Solana JSON-RPC API that solflow uses on top of a
//! [`LocalCluster`], so [`HttpRpc`](solflow_rpc::HttpRpc) can be exercised
//! end to end without a public network.
//!
//! Supported methods: `getBalance`, `requestAirdrop`, `getLatestBlockhash`,
//! `getBlockHeight`, `sendTransaction` and `getSignatureStatuses`.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use solflow_core::{Address, Signature, Transaction};
use solflow_rpc::{codes, LocalCluster, Rpc, RpcError};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Deserialize)]
struct Request {
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

/// Build the JSON-RPC router for `cluster`.
pub fn router(cluster: Arc<LocalCluster>) -> Router {
    Router::new().route("/", post(handle)).with_state(cluster)
}

/// Serve `cluster` on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, cluster: Arc<LocalCluster>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "test validator listening");
    }
    axum::serve(listener, router(cluster)).await
}

async fn handle(State(cluster): State<Arc<LocalCluster>>, body: String) -> Json<Value> {
    let raw: Value = match serde_json::from_str(&body) {
        Ok(raw) => raw,
        Err(e) => return Json(error_response(Value::Null, codes::PARSE_ERROR, format!("Parse error: {e}"))),
    };
    let request: Request = match serde_json::from_value(raw) {
        Ok(request) => request,
        Err(e) => {
            return Json(error_response(
                Value::Null,
                codes::INVALID_REQUEST,
                format!("Invalid request: {e}"),
            ))
        }
    };

    tracing::debug!(method = %request.method, "rpc call");
    let response = match dispatch(&cluster, &request.method, &request.params).await {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": request.id, "result": result }),
        Err(err) => {
            let (code, message) = error_parts(err);
            tracing::debug!(method = %request.method, code, %message, "rpc error");
            error_response(request.id, code, message)
        }
    };
    Json(response)
}

async fn dispatch(cluster: &LocalCluster, method: &str, params: &Value) -> Result<Value, RpcError> {
    match method {
        "getBalance" => {
            let address = address_param(params, 0)?;
            let lamports = cluster.get_balance(&address).await?;
            Ok(with_context(cluster, json!(lamports)))
        }
        "requestAirdrop" => {
            let address = address_param(params, 0)?;
            let lamports = param(params, 1)?
                .as_u64()
                .ok_or_else(|| invalid_params("lamports must be an unsigned integer"))?;
            let signature = cluster.request_airdrop(&address, lamports).await?;
            Ok(json!(signature.to_base58()))
        }
        "getLatestBlockhash" => {
            let checkpoint = cluster.get_latest_checkpoint().await?;
            Ok(with_context(cluster, json!(checkpoint)))
        }
        "getBlockHeight" => Ok(json!(cluster.get_block_height().await?)),
        "sendTransaction" => {
            let encoded = str_param(params, 0)?;
            let encoding = params
                .get(1)
                .and_then(|config| config.get("encoding"))
                .and_then(Value::as_str)
                .unwrap_or("base58");
            let tx = decode_transaction(encoded, encoding)?;
            let signature = cluster.send_transaction(&tx).await?;
            Ok(json!(signature.to_base58()))
        }
        "getSignatureStatuses" => {
            let requested = param(params, 0)?
                .as_array()
                .ok_or_else(|| invalid_params("expected an array of signatures"))?;
            let mut statuses = Vec::with_capacity(requested.len());
            for item in requested {
                let encoded = item
                    .as_str()
                    .ok_or_else(|| invalid_params("signature must be a string"))?;
                let signature = Signature::from_base58(encoded)
                    .map_err(|_| invalid_params(format!("Invalid param: {encoded}")))?;
                statuses.push(cluster.get_signature_status(&signature).await?);
            }
            Ok(with_context(cluster, json!(statuses)))
        }
        other => Err(RpcError::rpc(
            codes::METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        )),
    }
}

fn with_context(cluster: &LocalCluster, value: Value) -> Value {
    json!({ "context": { "slot": cluster.slot() }, "value": value })
}

fn error_response(id: Value, code: i64, message: String) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}

fn error_parts(err: RpcError) -> (i64, String) {
    match err {
        RpcError::Rpc { code, message } => (code, message),
        other => (codes::INTERNAL_ERROR, other.to_string()),
    }
}

fn invalid_params(message: impl Into<String>) -> RpcError {
    RpcError::rpc(codes::INVALID_PARAMS, message)
}

fn param(params: &Value, index: usize) -> Result<&Value, RpcError> {
    params
        .get(index)
        .ok_or_else(|| invalid_params(format!("missing parameter {index}")))
}

fn str_param(params: &Value, index: usize) -> Result<&str, RpcError> {
    param(params, index)?
        .as_str()
        .ok_or_else(|| invalid_params(format!("parameter {index} must be a string")))
}

fn address_param(params: &Value, index: usize) -> Result<Address, RpcError> {
    let encoded = str_param(params, index)?;
    Address::from_base58(encoded).map_err(|_| invalid_params(format!("Invalid param: {encoded}")))
}

fn decode_transaction(encoded: &str, encoding: &str) -> Result<Transaction, RpcError> {
    let decoded = match encoding {
        "base64" => Transaction::from_base64(encoded),
        "base58" => {
            let bytes = bs58::decode(encoded)
                .into_vec()
                .map_err(|e| invalid_params(format!("invalid base58: {e}")))?;
            Transaction::deserialize(&bytes)
        }
        other => return Err(invalid_params(format!("unsupported encoding: {other}"))),
    };
    decoded.map_err(|e| invalid_params(format!("failed to deserialize transaction: {e}")))
}
