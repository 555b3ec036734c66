//! Runtime helpers every generated program carries. Node templates call into
//! these (`resolveAsset`, `createSignal`, `createTween`, `createTimer`).

pub(super) const PRELUDE_JS: &str = r#"  const resolveAsset = (url) =>
    global.NodeGame && typeof global.NodeGame.assetPath === 'function' ? global.NodeGame.assetPath(url) : url;

  const EASINGS = {
    linear: (t) => t,
    easeIn: (t) => t * t,
    easeOut: (t) => t * (2 - t),
    easeInOut: (t) => (t < 0.5 ? 2 * t * t : -1 + (4 - 2 * t) * t),
    bounce: (t) => {
      const n = 7.5625, d = 2.75;
      if (t < 1 / d) return n * t * t;
      if (t < 2 / d) return n * (t -= 1.5 / d) * t + 0.75;
      if (t < 2.5 / d) return n * (t -= 2.25 / d) * t + 0.9375;
      return n * (t -= 2.625 / d) * t + 0.984375;
    },
  };

  function createSignal() {
    const listeners = [];
    return {
      connect(fn) { listeners.push(fn); },
      emit(value) {
        for (const fn of listeners.slice()) {
          try { fn(value); } catch (e) { console.error('[nodegame] listener failed', e); }
        }
      },
      clear() { listeners.length = 0; },
    };
  }

  function createTween(target, prop, to, duration, easing, opts) {
    const ease = EASINGS[easing] || EASINGS.linear;
    const done = createSignal();
    let from = 0, elapsed = 0, running = false, forward = true;
    const read = () => (prop === 'scale' ? target.scale.x : target[prop]);
    const write = (v) => { if (prop === 'scale') target.scale.set(v); else target[prop] = v; };
    return {
      done,
      play() {
        if (!target) return;
        from = read();
        elapsed = 0;
        forward = true;
        running = true;
      },
      stop() { running = false; },
      step(dt) {
        if (!running) return;
        elapsed = Math.min(elapsed + dt, duration);
        const k = ease(duration > 0 ? elapsed / duration : 1);
        write(forward ? from + (to - from) * k : to + (from - to) * k);
        if (elapsed < duration) return;
        if (opts.yoyo && forward) { forward = false; elapsed = 0; return; }
        if (opts.repeat) { elapsed = 0; forward = true; return; }
        running = false;
        done.emit(target);
      },
    };
  }

  function createTimer(interval, repeat) {
    const tick = createSignal();
    let elapsed = 0, running = false;
    return {
      tick,
      connect: tick.connect,
      emit: tick.emit,
      start() { elapsed = 0; running = true; },
      stop() { running = false; },
      step(dt) {
        if (!running) return;
        elapsed += dt;
        while (running && interval > 0 && elapsed >= interval) {
          elapsed -= interval;
          tick.emit(elapsed);
          if (!repeat) running = false;
        }
      },
    };
  }
"#;
