use crate::layers::LayerTable;
use crate::preview;
use crate::runtime::html_escape;

/// Milliseconds between `/update.json` polls.
const POLL_INTERVAL_MS: u32 = 700;

pub(super) fn build_host_page(title: &str, layers: &LayerTable) -> String {
    let bridge = preview::bridge_js();
    let layer_rules = layers.injection_js();
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>nodegame dev: {title}</title>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  html, body {{ width: 100%; height: 100%; background: #0A0A0A; color: #A0A0A0;
    font-family: 'JetBrains Mono', monospace; overflow: hidden; }}
  .status {{
    position: relative; height: 32px; display: flex; align-items: center; gap: 12px; padding: 0 12px;
    font-size: 12px; border-bottom: 1px solid #222; background: #111;
  }}
  .status .graph {{ color: #D4AF37; }}
  .status .state.ok {{ color: #4ADE80; }}
  .status .state.err {{ color: #EF4444; }}
  .warnings {{ font-size: 11px; color: #FBBF24; background: #1A1608; }}
  .warnings li {{ list-style: none; padding: 4px 12px; border-bottom: 1px solid #2A2410; }}
  .error {{
    position: relative; display: none; font-size: 12px; color: #EF4444; white-space: pre-wrap;
    padding: 12px; background: #141414; border-left: 3px solid #EF4444;
  }}
  #preview {{ position: relative; width: 100%; height: calc(100% - 32px); border: 0; background: #000; }}
</style>
</head>
<body>
<div class="status z-editor-toolbar">
  <span>nodegame dev</span>
  <span class="graph">{title}</span>
  <span class="state" id="state">connecting...</span>
  <span id="revision"></span>
</div>
<ul class="warnings" id="warnings"></ul>
<div class="error z-notifications" id="error"></div>
<iframe id="preview" class="z-editor-preview" src="/preview.html"></iframe>
<script>
{layer_rules}
{bridge}
(function () {{
  const bridge = createPreviewBridge(document.getElementById('preview'));
  const stateEl = document.getElementById('state');
  const errorEl = document.getElementById('error');
  const warningsEl = document.getElementById('warnings');
  let revision = -1;

  function setState(text, ok) {{
    stateEl.textContent = text;
    stateEl.className = 'state ' + (ok ? 'ok' : 'err');
  }}

  function showWarnings(list) {{
    warningsEl.innerHTML = '';
    for (const w of list || []) {{
      const li = document.createElement('li');
      li.textContent = w;
      warningsEl.appendChild(li);
    }}
  }}

  bridge.ready.catch((e) => setState(e.message, false));

  async function poll() {{
    try {{
      const res = await fetch('/update.json', {{ cache: 'no-store' }});
      const u = await res.json();
      if (u.revision !== revision) {{
        revision = u.revision;
        document.getElementById('revision').textContent = 'rev ' + revision;
        showWarnings(u.warnings);
        if (u.error) {{
          errorEl.textContent = u.error;
          errorEl.style.display = 'block';
          setState('compile error', false);
        }} else if (u.message) {{
          errorEl.style.display = 'none';
          await bridge.send(u.message.data, u.message.code);
          setState('live', true);
        }}
      }}
    }} catch (e) {{
      setState('server unreachable', false);
    }}
    setTimeout(poll, {poll});
  }}
  poll();
}})();
</script>
</body>
</html>"##,
        title = html_escape(title),
        layer_rules = layer_rules,
        bridge = bridge,
        poll = POLL_INTERVAL_MS,
    )
}

pub(super) fn build_error_page(title: &str, error: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>nodegame dev: error</title>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  html, body {{ width: 100%; height: 100%; background: #0A0A0A; color: #A0A0A0;
    font-family: 'JetBrains Mono', monospace; }}
  .error-container {{
    max-width: 640px; margin: 80px auto; padding: 32px;
    border: 1px solid #3F1818; border-radius: 8px;
    background: rgba(239,68,68,0.04);
  }}
  .error-header {{
    display: flex; align-items: center; gap: 10px; margin-bottom: 20px;
    font-size: 13px; color: #EF4444;
  }}
  .error-header .graph {{ color: #D4AF37; }}
  .error-message {{
    font-size: 12px; color: #EF4444; line-height: 1.7;
    white-space: pre-wrap; word-break: break-word;
    padding: 16px; background: #141414; border-radius: 4px;
    border-left: 3px solid #EF4444;
  }}
  .pulse {{
    margin-top: 24px; font-size: 11px; color: #666;
    display: flex; align-items: center; gap: 8px;
  }}
  .pulse-dot {{
    width: 6px; height: 6px; border-radius: 50%; background: #EF4444;
    animation: pulse 2s ease-in-out infinite;
  }}
  @keyframes pulse {{
    0%, 100% {{ opacity: 0.3; }}
    50% {{ opacity: 1; }}
  }}
</style>
</head>
<body>
<div class="error-container">
  <div class="error-header">
    <span>nodegame dev</span>
    <span class="graph">{title}</span>
    <span>build error</span>
  </div>
  <div class="error-message">{error}</div>
  <div class="pulse">
    <div class="pulse-dot"></div>
    waiting for fix...
  </div>
</div>
</body>
</html>"##,
        title = html_escape(title),
        error = html_escape(error),
    )
}
