//! Preview bridge between the editor page and the embedded game frame.
//!
//! The host posts `{type: "update-game-graph", data, timestamp}` into the
//! frame. The frame runs a two-state machine: the first update initializes
//! the game, every later one tears it down and rebuilds it in place (hot
//! update). There is no acknowledgement channel; lost or reordered messages
//! are not recovered.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::graph::Graph;
use crate::nodes::js_string;

/// `type` field of a graph update message.
pub const UPDATE_MESSAGE: &str = "update-game-graph";

/// How long the host waits for the preview frame to load.
pub const IFRAME_TIMEOUT_MS: u64 = 10_000;

/// Host → frame payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewMessage {
    #[serde(rename = "type")]
    pub kind: String,
    /// Serialized graph.
    pub data: Value,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Compiled program for `data`, when the host compiled it already.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewState {
    #[default]
    Uninitialized,
    Initialized,
}

/// What the frame should do with an incoming message.
#[derive(Debug)]
pub enum PreviewAction {
    /// First graph: boot the game.
    Initialize(Graph),
    /// Later graph: destroy the running game and rebuild from this one.
    HotUpdate(Graph),
    /// Not a graph update; the reason is for logging only.
    Ignored(String),
}

/// Frame-side receiver state.
#[derive(Debug, Default)]
pub struct PreviewReceiver {
    state: PreviewState,
    updates: usize,
    last_timestamp: Option<i64>,
}

impl PreviewMessage {
    pub fn new(data: Value, timestamp: i64) -> Self {
        Self {
            kind: UPDATE_MESSAGE.to_string(),
            data,
            timestamp,
            code: None,
        }
    }

    /// Update message stamped with the current time.
    pub fn now(data: Value) -> Self {
        Self::new(data, chrono::Utc::now().timestamp_millis())
    }

    pub fn with_code(mut self, code: String) -> Self {
        self.code = Some(code);
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl PreviewReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PreviewState {
        self.state
    }

    /// Graph updates accepted so far.
    pub fn updates(&self) -> usize {
        self.updates
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.last_timestamp
    }

    /// Feed one raw `postMessage` payload. Foreign messages are ignored; a
    /// graph update whose data does not parse is an error and leaves the
    /// state unchanged.
    pub fn receive(&mut self, payload: &Value) -> Result<PreviewAction> {
        let kind = payload.get("type").and_then(Value::as_str);
        if kind != Some(UPDATE_MESSAGE) {
            let reason = match kind {
                Some(other) => format!("message type '{other}'"),
                None => "message without a type".to_string(),
            };
            tracing::trace!(%reason, "preview ignored message");
            return Ok(PreviewAction::Ignored(reason));
        }

        let message: PreviewMessage = serde_json::from_value(payload.clone())?;
        let graph = Graph::from_value(message.data)?;
        self.updates += 1;
        self.last_timestamp = Some(message.timestamp);

        Ok(match self.state {
            PreviewState::Uninitialized => {
                self.state = PreviewState::Initialized;
                tracing::debug!(nodes = graph.node_count(), "preview initialized");
                PreviewAction::Initialize(graph)
            }
            PreviewState::Initialized => {
                tracing::debug!(nodes = graph.node_count(), "preview hot update");
                PreviewAction::HotUpdate(graph)
            }
        })
    }

    /// Back to the uninitialized state, e.g. after the frame reloads.
    pub fn reset(&mut self) {
        self.state = PreviewState::Uninitialized;
    }
}

/// Host-page script defining `createPreviewBridge(iframe)`.
///
/// `bridge.ready` resolves once the frame has loaded and rejects after
/// [`IFRAME_TIMEOUT_MS`]. `bridge.send(graph, code)` posts an update.
pub fn bridge_js() -> String {
    format!(
        r#"function createPreviewBridge(iframe) {{
  const ready = new Promise((resolve, reject) => {{
    let settled = false;
    const timer = setTimeout(() => {{
      if (settled) return;
      settled = true;
      reject(new Error('preview frame did not load within {timeout} ms'));
    }}, {timeout});
    const done = () => {{
      if (settled) return;
      settled = true;
      clearTimeout(timer);
      resolve(iframe.contentWindow);
    }};
    if (iframe.contentDocument && iframe.contentDocument.readyState === 'complete'
        && iframe.contentWindow.location.href !== 'about:blank') {{
      done();
    }} else {{
      iframe.addEventListener('load', done, {{ once: true }});
    }}
  }});
  return {{
    ready,
    send(graph, code) {{
      return ready.then((win) => {{
        const message = {{ type: {kind}, data: graph, timestamp: Date.now() }};
        if (code !== undefined) message.code = code;
        win.postMessage(message, '*');
        return message.timestamp;
      }});
    }},
  }};
}}
"#,
        timeout = IFRAME_TIMEOUT_MS,
        kind = js_string(UPDATE_MESSAGE),
    )
}

/// Frame-side listener mirroring [`PreviewReceiver`]. Expects `bootGame(code)`
/// and `teardownGame()` from the runtime shell.
pub fn receiver_js() -> String {
    format!(
        r#"(function () {{
  let initialized = false;
  window.addEventListener('message', (event) => {{
    const msg = event.data;
    if (!msg || msg.type !== {kind}) return;
    if (typeof msg.code !== 'string') {{
      console.warn('[nodegame] preview update without compiled code ignored');
      return;
    }}
    try {{
      if (initialized) teardownGame();
      bootGame(msg.code);
      initialized = true;
    }} catch (e) {{
      console.error('[nodegame] preview update failed', e);
    }}
  }});
}})();
"#,
        kind = js_string(UPDATE_MESSAGE),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(nodes: usize, timestamp: i64) -> Value {
        let nodes: Vec<Value> = (1..=nodes).map(|id| json!({"id": id, "type": "game/text"})).collect();
        json!({"type": UPDATE_MESSAGE, "data": {"nodes": nodes}, "timestamp": timestamp})
    }

    #[test]
    fn first_update_initializes_then_hot_updates() {
        let mut rx = PreviewReceiver::new();
        assert_eq!(rx.state(), PreviewState::Uninitialized);

        match rx.receive(&update(1, 10)).unwrap() {
            PreviewAction::Initialize(graph) => assert_eq!(graph.node_count(), 1),
            other => panic!("expected initialize, got {other:?}"),
        }
        assert_eq!(rx.state(), PreviewState::Initialized);

        match rx.receive(&update(3, 20)).unwrap() {
            PreviewAction::HotUpdate(graph) => assert_eq!(graph.node_count(), 3),
            other => panic!("expected hot update, got {other:?}"),
        }
        assert_eq!(rx.updates(), 2);
        assert_eq!(rx.last_timestamp(), Some(20));
    }

    #[test]
    fn foreign_messages_are_ignored() {
        let mut rx = PreviewReceiver::new();
        assert!(matches!(
            rx.receive(&json!({"type": "resize", "width": 3})).unwrap(),
            PreviewAction::Ignored(_)
        ));
        assert!(matches!(rx.receive(&json!("ping")).unwrap(), PreviewAction::Ignored(_)));
        assert_eq!(rx.state(), PreviewState::Uninitialized);
    }

    #[test]
    fn bad_graph_keeps_state() {
        let mut rx = PreviewReceiver::new();
        let bad = json!({"type": UPDATE_MESSAGE, "data": {"nodes": [], "links": [[1, 9, 0, 8, 0, null]]}, "timestamp": 1});
        assert!(rx.receive(&bad).is_err());
        assert_eq!(rx.state(), PreviewState::Uninitialized);
        assert_eq!(rx.updates(), 0);
    }

    #[test]
    fn reset_returns_to_initialize() {
        let mut rx = PreviewReceiver::new();
        rx.receive(&update(1, 1)).unwrap();
        rx.reset();
        assert!(matches!(rx.receive(&update(1, 2)).unwrap(), PreviewAction::Initialize(_)));
    }

    #[test]
    fn message_wire_shape() {
        let msg = PreviewMessage::new(json!({"nodes": []}), 42);
        let v: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(v, json!({"type": "update-game-graph", "data": {"nodes": []}, "timestamp": 42}));
        let with_code = msg.with_code("x()".into());
        assert_eq!(serde_json::to_value(&with_code).unwrap()["code"], "x()");
    }

    #[test]
    fn bridge_script_times_out_after_ten_seconds() {
        let js = bridge_js();
        assert!(js.contains("}, 10000);"));
        assert!(js.contains(r#"type: "update-game-graph""#));
        assert!(receiver_js().contains(r#"msg.type !== "update-game-graph""#));
    }
}
