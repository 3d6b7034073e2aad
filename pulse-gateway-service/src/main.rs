use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use pulse_chain::{AssetLedger, MemoryAssetLedger, ModeBands, PulseError, PulseRegistry};
use pulse_host_bridge::{
    BridgeError, InitializeRequest, PulseOrchestrator, TransitionRequest,
};

type HttpBody = Full<Bytes>;

/// Chain-wide entropy seed of this deployment; the analog of the deployed
/// program identity in the derivation.
const CHAIN_SEED: &[u8] = b"pulse-gateway-dev";

#[derive(Clone)]
struct AppState {
    registry: Arc<Mutex<PulseRegistry>>,
    ledger: Arc<Mutex<MemoryAssetLedger>>,
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response<HttpBody> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Full::from(Bytes::from(body)))
        .unwrap()
}

fn error_response(status: StatusCode, message: String) -> Response<HttpBody> {
    let body = serde_json::to_vec(&serde_json::json!({ "error": message })).unwrap();
    json_response(status, body)
}

fn status_for(err: &BridgeError) -> StatusCode {
    match err {
        BridgeError::Core(PulseError::NotFound(_)) => StatusCode::NOT_FOUND,
        BridgeError::Core(PulseError::Unauthorized { .. }) => StatusCode::FORBIDDEN,
        BridgeError::Core(PulseError::AlreadyInitialized(_)) => StatusCode::CONFLICT,
        BridgeError::Core(PulseError::Entropy(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn query_param(uri: &Uri, key: &str) -> Option<String> {
    uri.query()?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| v.to_string())
    })
}

async fn handle_request(
    state: AppState,
    req: Request<hyper::body::Incoming>,
) -> Result<Response<HttpBody>, Infallible> {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = uri.path().to_string();

    if method == Method::POST && path == "/pulse/initialize" {
        let body_bytes = req
            .into_body()
            .collect()
            .await
            .map(|b| b.to_bytes())
            .unwrap_or_default();
        let parsed: Result<InitializeRequest, _> = serde_json::from_slice(&body_bytes);
        let init = match parsed {
            Ok(v) => v,
            Err(e) => {
                return Ok(error_response(
                    StatusCode::BAD_REQUEST,
                    format!("invalid JSON: {e}"),
                ))
            }
        };

        let mut registry = state.registry.lock().unwrap();
        let mut ledger = state.ledger.lock().unwrap();
        let mut orchestrator = PulseOrchestrator::new(&mut registry, &mut *ledger, CHAIN_SEED);

        match orchestrator.handle_initialize(&init) {
            Ok(report) => Ok(json_response(
                StatusCode::OK,
                serde_json::to_vec(&report).unwrap(),
            )),
            Err(e) => Ok(error_response(status_for(&e), e.to_string())),
        }
    } else if method == Method::POST && path == "/pulse/transition" {
        let body_bytes = req
            .into_body()
            .collect()
            .await
            .map(|b| b.to_bytes())
            .unwrap_or_default();
        let parsed: Result<TransitionRequest, _> = serde_json::from_slice(&body_bytes);
        let transition = match parsed {
            Ok(v) => v,
            Err(e) => {
                return Ok(error_response(
                    StatusCode::BAD_REQUEST,
                    format!("invalid JSON: {e}"),
                ))
            }
        };

        let mut registry = state.registry.lock().unwrap();
        let mut ledger = state.ledger.lock().unwrap();
        let mut orchestrator = PulseOrchestrator::new(&mut registry, &mut *ledger, CHAIN_SEED);

        match orchestrator.handle_transition(&transition) {
            Ok(report) => Ok(json_response(
                StatusCode::OK,
                serde_json::to_vec(&report).unwrap(),
            )),
            Err(e) => Ok(error_response(status_for(&e), e.to_string())),
        }
    } else if method == Method::GET && path == "/pulse/record" {
        let id = match query_param(&uri, "id") {
            Some(id) => id,
            None => {
                return Ok(error_response(
                    StatusCode::BAD_REQUEST,
                    "missing query parameter: id".to_string(),
                ))
            }
        };
        let registry = state.registry.lock().unwrap();
        match registry.record(&id) {
            Some(record) => Ok(json_response(
                StatusCode::OK,
                serde_json::to_vec(record).unwrap(),
            )),
            None => Ok(error_response(
                StatusCode::NOT_FOUND,
                format!("record not found: {id}"),
            )),
        }
    } else if method == Method::GET && path == "/pulse/balance" {
        let account = match query_param(&uri, "account") {
            Some(a) => a,
            None => {
                return Ok(error_response(
                    StatusCode::BAD_REQUEST,
                    "missing query parameter: account".to_string(),
                ))
            }
        };
        let ledger = state.ledger.lock().unwrap();
        match ledger.balance_of(&account) {
            Some(balance) => Ok(json_response(
                StatusCode::OK,
                serde_json::to_vec(&serde_json::json!({
                    "account": account,
                    "balance": balance,
                }))
                .unwrap(),
            )),
            None => Ok(error_response(
                StatusCode::NOT_FOUND,
                format!("no balance for: {account}"),
            )),
        }
    } else if method == Method::GET && path == "/health" {
        Ok(json_response(
            StatusCode::OK,
            b"{\"status\":\"ok\"}".to_vec(),
        ))
    } else {
        Ok(error_response(
            StatusCode::NOT_FOUND,
            "not found".to_string(),
        ))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState {
        registry: Arc::new(Mutex::new(PulseRegistry::new(ModeBands::default()))),
        ledger: Arc::new(Mutex::new(MemoryAssetLedger::new())),
    };

    let addr: SocketAddr = "127.0.0.1:8091".parse()?;
    let listener = TcpListener::bind(addr).await?;
    println!("pulse-gateway-service listening on http://{addr}");

    loop {
        let (stream, _) = listener.accept().await?;
        let state_clone = state.clone();

        tokio::spawn(async move {
            if let Err(e) = http1::Builder::new()
                .serve_connection(
                    TokioIo::new(stream),
                    service_fn(move |req| handle_request(state_clone.clone(), req)),
                )
                .await
            {
                eprintln!("connection error: {e:?}");
            }
        });
    }
}
