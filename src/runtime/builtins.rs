//! Sources of the stock runtime modules registered by
//! [`ModuleRegistry::with_defaults`](crate::modules::ModuleRegistry::with_defaults).
//!
//! Each file calls `NodeGame.define(className, Class)`. Instances get the
//! shared context in their constructor and may expose `init()`, `update(dt)`
//! and `destroy()`.

const EVENTS_JS: &str = r#"NodeGame.define('EventBus', class EventBus {
  constructor(ctx) {
    this.handlers = new Map();
    ctx.events = this;
  }
  on(name, fn) {
    if (!this.handlers.has(name)) this.handlers.set(name, new Set());
    this.handlers.get(name).add(fn);
    return () => this.off(name, fn);
  }
  off(name, fn) {
    const set = this.handlers.get(name);
    if (set) set.delete(fn);
  }
  emit(name, payload) {
    const set = this.handlers.get(name);
    if (!set) return;
    for (const fn of Array.from(set)) {
      try { fn(payload); } catch (e) { console.error('[nodegame] handler for ' + name + ' failed', e); }
    }
  }
  destroy() { this.handlers.clear(); }
});
"#;

const ASSETS_JS: &str = r#"NodeGame.define('AssetLoader', class AssetLoader {
  constructor(ctx) {
    this.ctx = ctx;
    this.paths = new Map();
    this.failed = [];
    const relative = (url) => !/^([a-z][a-z0-9+.-]*:|\/)/i.test(url);
    NodeGame.assetPath = (url) => this.paths.get(url) || (ctx.assetBase && relative(url) ? ctx.assetBase + url : url);
  }
  async init() {
    const manifest = this.ctx.manifest;
    if (!manifest || !Array.isArray(manifest.assets)) return;
    for (const asset of manifest.assets) this.paths.set(asset.source, asset.path);
    const timeout = (ms) => new Promise((_, reject) => setTimeout(() => reject(new Error('timed out after ' + ms + ' ms')), ms));
    await Promise.all(manifest.assets.map(async (asset) => {
      try {
        const load = asset.type === 'image' ? PIXI.Assets.load(asset.path) : fetch(asset.path).then((r) => {
          if (!r.ok) throw new Error('HTTP ' + r.status);
        });
        await Promise.race([load, timeout(10000)]);
      } catch (e) {
        console.warn('[nodegame] asset ' + asset.id + ' (' + asset.path + ') failed to load', e);
        this.failed.push(asset.id);
      }
    }));
    this.ctx.events.emit('assets:loaded', { failed: this.failed.slice() });
  }
});
"#;

const INPUT_JS: &str = r#"NodeGame.define('InputManager', class InputManager {
  constructor(ctx) {
    this.ctx = ctx;
    this.down = new Set();
    this.onDown = (e) => {
      if (!this.down.has(e.key)) ctx.events.emit('input:keydown', e.key);
      this.down.add(e.key);
    };
    this.onUp = (e) => {
      this.down.delete(e.key);
      ctx.events.emit('input:keyup', e.key);
    };
    this.onBlur = () => this.down.clear();
  }
  init() {
    window.addEventListener('keydown', this.onDown);
    window.addEventListener('keyup', this.onUp);
    window.addEventListener('blur', this.onBlur);
  }
  isDown(key) { return this.down.has(key); }
  destroy() {
    window.removeEventListener('keydown', this.onDown);
    window.removeEventListener('keyup', this.onUp);
    window.removeEventListener('blur', this.onBlur);
  }
});
"#;

const AUDIO_JS: &str = r#"NodeGame.define('AudioManager', class AudioManager {
  constructor(ctx) {
    this.ctx = ctx;
    this.muted = false;
    this.unlocked = false;
    this.unlock = () => {
      this.unlocked = true;
      ctx.events.emit('audio:unlocked');
      window.removeEventListener('pointerdown', this.unlock);
    };
  }
  init() {
    window.addEventListener('pointerdown', this.unlock);
    this.ctx.events.on('input:keydown', (key) => { if (key === 'm' || key === 'M') this.toggleMute(); });
  }
  toggleMute() {
    this.muted = !this.muted;
    for (const el of document.querySelectorAll('audio')) el.muted = this.muted;
    this.ctx.events.emit('audio:muted', this.muted);
  }
  destroy() { window.removeEventListener('pointerdown', this.unlock); }
});
"#;

const DEBUG_JS: &str = r#"NodeGame.define('DebugOverlay', class DebugOverlay {
  constructor(ctx) {
    this.ctx = ctx;
    this.el = document.createElement('div');
    this.el.className = 'debug-overlay z-debug-overlay';
    this.el.hidden = true;
    this.frames = 0;
    this.elapsed = 0;
  }
  init() {
    document.body.appendChild(this.el);
    this.ctx.events.on('input:keydown', (key) => { if (key === '`') this.el.hidden = !this.el.hidden; });
  }
  update(dt) {
    this.frames += 1;
    this.elapsed += dt;
    if (this.elapsed < 500) return;
    const fps = Math.round((this.frames * 1000) / this.elapsed);
    const app = this.ctx.app;
    const objects = app ? countChildren(app.stage) : 0;
    this.el.textContent = fps + ' fps | ' + objects + ' objects';
    this.frames = 0;
    this.elapsed = 0;
  }
  destroy() { this.el.remove(); }
});

function countChildren(node) {
  let n = 0;
  for (const child of node.children || []) n += 1 + countChildren(child);
  return n;
}
"#;

/// Source for a stock module file, by its registered path.
pub fn builtin_module(file: &str) -> Option<&'static str> {
    match file {
        "modules/events.js" => Some(EVENTS_JS),
        "modules/assets.js" => Some(ASSETS_JS),
        "modules/input.js" => Some(INPUT_JS),
        "modules/audio.js" => Some(AUDIO_JS),
        "modules/debug.js" => Some(DEBUG_JS),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::ModuleRegistry;

    #[test]
    fn every_default_module_has_a_source() {
        for module in ModuleRegistry::with_defaults().iter() {
            let src = builtin_module(&module.file).unwrap_or_else(|| panic!("{} has no source", module.file));
            assert!(src.contains(&format!("NodeGame.define('{}'", module.class_name)));
        }
        assert!(builtin_module("modules/unknown.js").is_none());
    }
}
