//! Websocket stream of registry facts.
//!
//! A new connection is sent the [`REPLAY_LIMIT`] most recent facts in
//! chronological order, then live updates as merges discover them. The
//! broadcast subscription is taken *before* the replay query, so a fact
//! published while the replay is in flight is delivered rather than lost
//! (it may then arrive twice, which clients already have to tolerate since
//! replay overlaps whatever they saw on a previous connection).

use crate::state::AppState;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use packrat_bus::REPLAY_LIMIT;
use packrat_registry::RegistryRecord;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

pub async fn updates(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| listener(socket, state))
}

async fn listener(mut socket: WebSocket, state: AppState) {
    let mut live = state.bus.subscribe();
    let replay = match state.registry.recent(REPLAY_LIMIT).await {
        Ok(records) => records,
        Err(error) => {
            warn!(%error, "replay query failed, starting listener live-only");
            Vec::new()
        },
    };
    // recent() is newest-first; replay goes out oldest-first.
    for record in replay.into_iter().rev() {
        if socket.send(Message::Text(encode(&record).into())).await.is_err() {
            return;
        }
    }
    debug!("listener connected");
    loop {
        tokio::select! {
            update = live.recv() => match update {
                Ok(record) => {
                    if socket.send(Message::Text(encode(&record).into())).await.is_err() {
                        return;
                    }
                },
                // Skipped messages are recoverable from /api/registered;
                // keep the connection.
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "listener lagged"),
                Err(RecvError::Closed) => return,
            },
            inbound = socket.recv() => match inbound {
                // Inbound frames are accepted and discarded.
                Some(Ok(_)) => {},
                Some(Err(_)) | None => return,
            },
        }
    }
}

fn encode(record: &RegistryRecord) -> String {
    serde_json::json!({
        "item_model_update": [
            record.item_name,
            record.model_num,
            record.pack_hash,
            record.updated_on.unix_timestamp(),
        ],
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::router;
    use futures::{SinkExt, StreamExt};
    use packrat_bus::Bus;
    use packrat_cache::DiskCache;
    use packrat_merge::Merger;
    use packrat_registry::{Database, Repository};
    use packrat_remote::{MockHost, VersionNames};
    use packrat_resolver::Resolver;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use time::UtcDateTime;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    /// Serve the full router on an ephemeral local port and hand back the
    /// handles a listener test needs.
    async fn serve() -> (tempfile::TempDir, Repository, Bus, String) {
        let host: packrat_remote::HostHandle = Arc::new(MockHost::default());
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path().join("cache")).unwrap();
        let names = VersionNames::new(cache.clone(), "http://127.0.0.1:9/versions", WEEK).unwrap();
        let db = Database::connect_in_memory().await.unwrap();
        let registry = Repository::from(&db);
        let bus = Bus::new();
        let merger = Merger::new(host.clone(), cache.clone(), registry.clone(), bus.clone(), WEEK);
        let resolver = Arc::new(Resolver::new(host.clone(), cache, WEEK, WEEK));
        let state =
            AppState { resolver, names, host, merger, registry: registry.clone(), bus: bus.clone() };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        (dir, registry, bus, format!("ws://{addr}/api/updates"))
    }

    fn fact(item: &str, model: i64, at: i64) -> RegistryRecord {
        RegistryRecord::new(item, model, "hash", UtcDateTime::from_unix_timestamp(at).unwrap())
    }

    fn update(message: &tungstenite::Message) -> Value {
        let value: Value = serde_json::from_str(message.to_text().unwrap()).unwrap();
        value["item_model_update"].clone()
    }

    #[test]
    fn test_encode_shape() {
        let record =
            RegistryRecord::new("bow", 7, "abc123", UtcDateTime::from_unix_timestamp(1_600_000_000).unwrap());
        assert_eq!(
            encode(&record),
            r#"{"item_model_update":["bow",7,"abc123",1600000000]}"#,
        );
    }

    #[tokio::test]
    async fn test_listener_replays_recent_facts_then_streams_live() {
        let (_dir, registry, bus, url) = serve().await;
        // More history than the replay window holds.
        for i in 0..20 {
            registry.record(&fact(&format!("item_{i}"), i, 1000 + i)).await.unwrap();
        }
        let (mut socket, _) = connect_async(&url).await.unwrap();
        let mut replayed = Vec::new();
        for _ in 0..REPLAY_LIMIT {
            let message = socket.next().await.unwrap().unwrap();
            replayed.push(update(&message)[1].as_i64().unwrap());
        }
        // Only the most recent facts, oldest first.
        assert_eq!(replayed, (4..20).collect::<Vec<i64>>());
        // Replay done, live updates follow.
        bus.publish(fact("fresh", 99, 2000));
        let message = socket.next().await.unwrap().unwrap();
        assert_eq!(update(&message), serde_json::json!(["fresh", 99, "hash", 2000]));
        socket.close(None).await.unwrap();
    }

    #[tokio::test]
    async fn test_inbound_messages_are_accepted_and_ignored() {
        let (_dir, registry, bus, url) = serve().await;
        // One seeded fact so the replay doubles as a connection barrier.
        registry.record(&fact("seed", 1, 1000)).await.unwrap();
        let (mut socket, _) = connect_async(&url).await.unwrap();
        let message = socket.next().await.unwrap().unwrap();
        assert_eq!(update(&message)[0], "seed");
        socket.send(tungstenite::Message::text("hello?")).await.unwrap();
        // The stream keeps flowing; nothing is echoed back.
        bus.publish(fact("after", 2, 2000));
        let message = socket.next().await.unwrap().unwrap();
        assert_eq!(update(&message)[0], "after");
        socket.close(None).await.unwrap();
    }
}
