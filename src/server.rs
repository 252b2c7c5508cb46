//! ==============================================================================
//! server.rs - http surface of the hub
//! ==============================================================================
//!
//! purpose:
//!     routes device and browser traffic onto the node store:
//!     - POST /pir_event   ingestion, guarded by the X-API-Key shared secret
//!     - GET  /nodes.json  sorted list of nodes that have reported
//!     - GET  /live.json   latest state for one node (or the first one)
//!     - GET  /            embedded dashboard page polling the two json routes
//!
//! error surface:
//!     the only failure a caller ever sees is 403 on a bad api key. malformed
//!     bodies are defaulted, unknown nodes and an empty store answer with the
//!     absent sentinel {"last_update": 0, "data": {}}.
//!
//! relationships:
//!     - used by: main.rs (builds the router, binds the listener)
//!     - uses: store.rs (NodeStore), domain.rs (MotionEvent, NodeData)
//!
//! ==============================================================================

use axum::{
    Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::domain::{MotionEvent, NodeData};
use crate::store::NodeStore;

const API_KEY_HEADER: &str = "x-api-key";

/// everything a handler needs, cloned per request
#[derive(Clone)]
pub struct AppContext {
    pub store: NodeStore,
    pub api_key: String,
}

/// build the router; main binds it, tests drive it with `oneshot`
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/pir_event", post(pir_event_handler))
        .route("/nodes.json", get(nodes_handler))
        .route("/live.json", get(live_handler))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

// ==============================================================================
// ingestion
// ==============================================================================

/// POST /pir_event - accept one device event
///
/// auth first: a wrong or missing key rejects before the body is even looked
/// at, so a rejected call never creates a record. after that nothing fails:
/// an unparseable body decodes like an empty object and defaults apply.
async fn pir_event_handler(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let supplied = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if supplied != ctx.api_key {
        warn!("rejected /pir_event: bad api key");
        return (StatusCode::FORBIDDEN, "Forbidden");
    }

    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let event = MotionEvent::from_json(&payload);
    info!(node = %event.node, state = %event.state, "event accepted");

    ctx.store.upsert(&event).await;
    (StatusCode::OK, "OK")
}

// ==============================================================================
// queries
// ==============================================================================

#[derive(Serialize)]
struct NodesResponse {
    nodes: Vec<String>,
}

/// GET /nodes.json - every node that has ever reported, sorted
async fn nodes_handler(State(ctx): State<AppContext>) -> Json<NodesResponse> {
    Json(NodesResponse {
        nodes: ctx.store.node_ids().await,
    })
}

#[derive(Deserialize)]
struct LiveParams {
    node: Option<String>,
}

#[derive(Serialize)]
struct LiveResponse {
    last_update: u64,
    data: Value,
}

impl LiveResponse {
    /// the well-known placeholder for nodes with no recorded state
    fn absent() -> Self {
        Self {
            last_update: 0,
            data: Value::Object(serde_json::Map::new()),
        }
    }
}

/// GET /live.json?node=<id> - latest state for one node
///
/// no node parameter (or an empty one) selects the first node, matching the
/// dashboard's default dropdown entry. unknown nodes are not an error.
async fn live_handler(
    State(ctx): State<AppContext>,
    Query(params): Query<LiveParams>,
) -> Json<LiveResponse> {
    let node = match params.node.filter(|n| !n.is_empty()) {
        Some(node) => node,
        None => match ctx.store.first_node_id().await {
            Some(node) => node,
            None => return Json(LiveResponse::absent()),
        },
    };

    let response = match ctx.store.get(&node).await {
        Some(rec) => LiveResponse {
            last_update: rec.last_update,
            // NodeData -> Value cannot fail, but stay panic-free anyway
            data: serde_json::to_value(NodeData::from(&rec))
                .unwrap_or_else(|_| Value::Object(serde_json::Map::new())),
        },
        None => LiveResponse::absent(),
    };
    Json(response)
}

// ==============================================================================
// dashboard page
// ==============================================================================

/// GET / - static page, only talks to /nodes.json and /live.json
async fn dashboard_handler() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

const DASHBOARD_HTML: &str = r#"<!doctype html>
<html>
<head>
  <meta name='viewport' content='width=device-width, initial-scale=1'>
  <title>PIR Hub Dashboard</title>
  <style>
    body{font-family:sans-serif;margin:18px;max-width:700px}
    .card{border:1px solid #ddd;border-radius:8px;padding:12px;margin:10px 0}
    select,button{font-size:16px;padding:6px}
  </style>
</head>
<body>
  <h2>PIR Hub Dashboard</h2>

  <div class="card">
    <label for="nodeSel"><b>Node:</b></label>
    <select id="nodeSel"></select>
    <button onclick="loadNodes()">Reload nodes</button>
  </div>

  <div id="root" class="card">Loading...</div>

<script>
async function getJSON(p){ const r = await fetch(p); return await r.json(); }

async function loadNodes(){
  const j = await getJSON('/nodes.json');
  const sel = document.getElementById('nodeSel');
  const prev = sel.value;
  sel.innerHTML = '';
  (j.nodes||[]).forEach(n=>{
    const o=document.createElement('option'); o.value=n; o.textContent=n; sel.appendChild(o);
  });
  if (j.nodes && j.nodes.length>0){
    sel.value = (prev && j.nodes.includes(prev)) ? prev : j.nodes[0];
  }
}

async function refresh(){
  const node = document.getElementById('nodeSel').value;
  if(!node){ document.getElementById('root').textContent='No nodes yet. Waiting for device data...'; return; }
  const j = await getJSON('/live.json?node='+encodeURIComponent(node));
  const d = j.data || {};
  const age = Math.max(0, Math.round(Date.now()/1000 - (j.last_update||0)));
  document.getElementById('root').innerHTML =
    `<div><b>Node:</b> ${node}</div>
     <div><b>State:</b> ${d.state||'-'}</div>
     <div><b>Time:</b> ${d.time||'-'}</div>
     <div><b>Counts:</b> PIR ${d.pirHits||0}, VIB ${d.vibHits||0}</div>
     <div><b>Last update:</b> ${age}s ago</div>`;
}

(async()=>{
  await loadNodes();
  setInterval(refresh, 1000);
  setInterval(loadNodes, 10000);
  refresh();
})();
</script>
</body>
</html>
"#;
