use crate::error::Result;
use crate::modules::LoadStep;

use super::helpers::script_json;

/// Script defining `NodeGame.define`, `NodeGame.loadModules(ctx, base)` and
/// `NodeGame.updateModules(ctx, dt)` for a resolved load plan.
///
/// Modules load strictly in plan order. A failing required module rejects
/// the whole load; an optional one is logged and skipped.
pub fn loader_js(plan: &[LoadStep]) -> Result<String> {
    let plan_json = script_json(plan)?;
    Ok(format!(
        r#"(function (global) {{
  'use strict';
  const NodeGame = global.NodeGame = global.NodeGame || {{}};
  NodeGame.classes = NodeGame.classes || {{}};
  NodeGame.define = NodeGame.define || function (name, cls) {{ NodeGame.classes[name] = cls; }};

  const PLAN = {plan_json};

  function loadScript(src) {{
    return new Promise((resolve, reject) => {{
      const el = document.createElement('script');
      el.src = src;
      el.onload = () => resolve();
      el.onerror = () => reject(new Error('failed to load ' + src));
      document.head.appendChild(el);
    }});
  }}

  NodeGame.loadModules = async function (ctx, base) {{
    ctx.modules = {{}};
    for (const step of PLAN) {{
      try {{
        if (!NodeGame.classes[step.className]) await loadScript((base || '') + step.file);
        const Cls = NodeGame.classes[step.className];
        if (!Cls) throw new Error(step.file + ' did not define ' + step.className);
        const instance = new Cls(ctx);
        if (typeof instance.init === 'function') await instance.init();
        ctx.modules[step.name] = instance;
      }} catch (e) {{
        if (step.required) throw new Error('required module ' + step.name + ' failed: ' + e.message);
        console.warn('[nodegame] optional module ' + step.name + ' skipped', e);
      }}
    }}
    return ctx.modules;
  }};

  NodeGame.updateModules = function (ctx, dt) {{
    for (const name in ctx.modules) {{
      const m = ctx.modules[name];
      if (typeof m.update === 'function') m.update(dt);
    }}
  }};

  NodeGame.destroyModules = function (ctx) {{
    const names = Object.keys(ctx.modules || {{}}).reverse();
    for (const name of names) {{
      const m = ctx.modules[name];
      if (typeof m.destroy === 'function') m.destroy();
    }}
    ctx.modules = {{}};
  }};
}})(window);
"#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::ModuleRegistry;

    #[test]
    fn plan_is_embedded_in_order() {
        let plan = ModuleRegistry::with_defaults().load_plan().unwrap();
        let js = loader_js(&plan).unwrap();
        let events = js.find(r#""name":"events""#).unwrap();
        let debug = js.find(r#""name":"debug""#).unwrap();
        assert!(events < debug);
        assert!(js.contains(r#""className":"EventBus""#));
        assert!(js.contains("if (step.required) throw"));
    }
}
