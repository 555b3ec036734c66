//! Node catalog: every node type the editor can place, with its typed
//! properties, input slots, variable prefix and code template.
//!
//! The editor stores properties as a free-form bag; [`NodeKind::from_node`]
//! turns the bag into the typed variant so the generator can match
//! exhaustively.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ErrorKind, Result};
use crate::graph::Node;

/// Static description of a node type.
#[derive(Debug)]
pub struct NodeDef {
    pub type_tag: &'static str,
    /// Variable prefix; `None` derives one from the type tag.
    pub prefix: Option<&'static str>,
    pub inputs: &'static [SlotDef],
    /// Output slots, in slot order.
    pub outputs: &'static [OutputDef],
    pub template: &'static str,
}

/// An output slot and how downstream code reaches it from the node's
/// variable: `button_1` + `.clicked`.
#[derive(Debug)]
pub struct OutputDef {
    pub name: &'static str,
    pub accessor: &'static str,
}

impl NodeDef {
    /// JS expression a downstream node sees for `var`'s output `slot`.
    pub fn output_expr(&self, var: &str, slot: usize) -> String {
        let accessor = self.outputs.get(slot).map_or("", |o| o.accessor);
        format!("{var}{accessor}")
    }
}

/// An input slot and the JS expression used when nothing is linked to it.
/// `None` leaves the slot `null`, which `{{#if}}` treats as absent.
#[derive(Debug)]
pub struct SlotDef {
    pub name: &'static str,
    pub default: Option<&'static str>,
}

const PARENT: SlotDef = SlotDef {
    name: "parent",
    default: Some("root"),
};
const TRIGGER: SlotDef = SlotDef {
    name: "trigger",
    default: None,
};
const TARGET: SlotDef = SlotDef {
    name: "target",
    default: None,
};

const fn out(name: &'static str) -> OutputDef {
    OutputDef { name, accessor: "" }
}

// ── Typed properties ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageProps {
    pub width: u32,
    pub height: u32,
    pub background: String,
}

impl Default for StageProps {
    fn default() -> Self {
        Self {
            width: 720,
            height: 1280,
            background: "#1a1a2e".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerProps {
    pub x: f64,
    pub y: f64,
    pub visible: bool,
    pub alpha: f64,
    pub z_index: i32,
}

impl Default for ContainerProps {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            visible: true,
            alpha: 1.0,
            z_index: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteProps {
    pub texture: String,
    pub x: f64,
    pub y: f64,
    pub anchor: f64,
    pub scale: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl Default for SpriteProps {
    fn default() -> Self {
        Self {
            texture: String::new(),
            x: 0.0,
            y: 0.0,
            anchor: 0.5,
            scale: 1.0,
            width: None,
            height: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatedSpriteProps {
    pub frames: Vec<String>,
    pub x: f64,
    pub y: f64,
    pub anchor: f64,
    pub speed: f64,
    pub looping: bool,
    pub autoplay: bool,
}

impl Default for AnimatedSpriteProps {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            x: 0.0,
            y: 0.0,
            anchor: 0.5,
            speed: 0.2,
            looping: true,
            autoplay: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextProps {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font_size: u32,
    pub font_family: String,
    pub color: String,
    pub anchor: f64,
    pub bold: bool,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            text: "Text".into(),
            x: 0.0,
            y: 0.0,
            font_size: 32,
            font_family: "Arial".into(),
            color: "#ffffff".into(),
            anchor: 0.5,
            bold: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonProps {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
    pub text_color: String,
    pub radius: f64,
}

impl Default for ButtonProps {
    fn default() -> Self {
        Self {
            label: "Start".into(),
            x: 0.0,
            y: 0.0,
            width: 200.0,
            height: 64.0,
            color: "#e94560".into(),
            text_color: "#ffffff".into(),
            radius: 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectProps {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
    pub radius: f64,
}

impl Default for RectProps {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            color: "#0f3460".into(),
            radius: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleProps {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: String,
}

impl Default for CircleProps {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            radius: 32.0,
            color: "#f5c518".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweenProps {
    pub property: String,
    pub to: f64,
    pub duration: f64,
    pub easing: String,
    pub repeat: bool,
    pub yoyo: bool,
    pub autoplay: bool,
}

impl Default for TweenProps {
    fn default() -> Self {
        Self {
            property: "alpha".into(),
            to: 1.0,
            duration: 500.0,
            easing: "linear".into(),
            repeat: false,
            yoyo: false,
            autoplay: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerProps {
    pub interval: f64,
    pub repeat: bool,
    pub autostart: bool,
}

impl Default for TimerProps {
    fn default() -> Self {
        Self {
            interval: 1000.0,
            repeat: true,
            autostart: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyInputProps {
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickProps {
    pub once: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundProps {
    pub src: String,
    pub volume: f64,
    pub looping: bool,
}

impl Default for SoundProps {
    fn default() -> Self {
        Self {
            src: String::new(),
            volume: 1.0,
            looping: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptProps {
    pub code: String,
}

// ── Kinds ──────────────────────────────────────────────────────────────

/// A node with its properties decoded by type.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Stage(StageProps),
    Container(ContainerProps),
    Sprite(SpriteProps),
    AnimatedSprite(AnimatedSpriteProps),
    Text(TextProps),
    Button(ButtonProps),
    Rect(RectProps),
    Circle(CircleProps),
    Tween(TweenProps),
    Timer(TimerProps),
    KeyInput(KeyInputProps),
    Click(ClickProps),
    Sound(SoundProps),
    Script(ScriptProps),
}

/// Kind of file a node pulls in at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Audio,
}

/// A file reference found in node properties.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRef {
    pub kind: AssetKind,
    pub url: String,
}

fn decode<T: DeserializeOwned>(node: &Node) -> Result<T> {
    serde_json::from_value(Value::Object(node.properties.clone())).map_err(|e| {
        ErrorKind::InvalidProperties {
            node_type: node.node_type.clone(),
            reason: e.to_string(),
        }
        .into()
    })
}

impl NodeKind {
    /// All type tags the catalog knows, in menu order.
    pub const TYPE_TAGS: &'static [&'static str] = &[
        "game/stage",
        "game/container",
        "game/sprite",
        "game/animated-sprite",
        "game/text",
        "game/button",
        "shape/rect",
        "shape/circle",
        "anim/tween",
        "logic/timer",
        "input/key",
        "input/click",
        "audio/sound",
        "logic/script",
    ];

    /// Decode a node's property bag into its typed variant.
    pub fn from_node(node: &Node) -> Result<Self> {
        Ok(match node.node_type.as_str() {
            "game/stage" => NodeKind::Stage(decode(node)?),
            "game/container" => NodeKind::Container(decode(node)?),
            "game/sprite" => NodeKind::Sprite(decode(node)?),
            "game/animated-sprite" => NodeKind::AnimatedSprite(decode(node)?),
            "game/text" => NodeKind::Text(decode(node)?),
            "game/button" => NodeKind::Button(decode(node)?),
            "shape/rect" => NodeKind::Rect(decode(node)?),
            "shape/circle" => NodeKind::Circle(decode(node)?),
            "anim/tween" => NodeKind::Tween(decode(node)?),
            "logic/timer" => NodeKind::Timer(decode(node)?),
            "input/key" => NodeKind::KeyInput(decode(node)?),
            "input/click" => NodeKind::Click(decode(node)?),
            "audio/sound" => NodeKind::Sound(decode(node)?),
            "logic/script" => NodeKind::Script(decode(node)?),
            other => return Err(ErrorKind::UnknownNodeType(other.to_string()).into()),
        })
    }

    /// The static definition for this kind.
    pub fn def(&self) -> &'static NodeDef {
        match self {
            NodeKind::Stage(_) => &STAGE,
            NodeKind::Container(_) => &CONTAINER,
            NodeKind::Sprite(_) => &SPRITE,
            NodeKind::AnimatedSprite(_) => &ANIMATED_SPRITE,
            NodeKind::Text(_) => &TEXT,
            NodeKind::Button(_) => &BUTTON,
            NodeKind::Rect(_) => &RECT,
            NodeKind::Circle(_) => &CIRCLE,
            NodeKind::Tween(_) => &TWEEN,
            NodeKind::Timer(_) => &TIMER,
            NodeKind::KeyInput(_) => &KEY_INPUT,
            NodeKind::Click(_) => &CLICK,
            NodeKind::Sound(_) => &SOUND,
            NodeKind::Script(_) => &SCRIPT,
        }
    }

    /// Typed properties as a template data bag.
    ///
    /// String-valued properties are also exposed JSON-quoted under `js.*`
    /// (`{{js.text}}`) so templates can embed them as JS literals safely.
    pub fn property_bag(&self) -> Map<String, Value> {
        let value = match self {
            NodeKind::Stage(p) => serde_json::to_value(p),
            NodeKind::Container(p) => serde_json::to_value(p),
            NodeKind::Sprite(p) => serde_json::to_value(p),
            NodeKind::AnimatedSprite(p) => serde_json::to_value(p),
            NodeKind::Text(p) => serde_json::to_value(p),
            NodeKind::Button(p) => serde_json::to_value(p),
            NodeKind::Rect(p) => serde_json::to_value(p),
            NodeKind::Circle(p) => serde_json::to_value(p),
            NodeKind::Tween(p) => serde_json::to_value(p),
            NodeKind::Timer(p) => serde_json::to_value(p),
            NodeKind::KeyInput(p) => serde_json::to_value(p),
            NodeKind::Click(p) => serde_json::to_value(p),
            NodeKind::Sound(p) => serde_json::to_value(p),
            NodeKind::Script(p) => serde_json::to_value(p),
        };
        let mut bag = match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };

        let mut quoted = Map::new();
        for (key, value) in &bag {
            match value {
                Value::String(s) => {
                    quoted.insert(key.clone(), Value::String(js_string(s)));
                }
                Value::Array(items) if items.iter().all(Value::is_string) => {
                    let items = items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|s| Value::String(js_string(s)))
                        .collect();
                    quoted.insert(key.clone(), Value::Array(items));
                }
                _ => {}
            }
        }
        bag.insert("js".into(), Value::Object(quoted));
        bag
    }

    /// Files this node loads at runtime.
    pub fn assets(&self) -> Vec<AssetRef> {
        let image = |url: &str| AssetRef {
            kind: AssetKind::Image,
            url: url.to_string(),
        };
        match self {
            NodeKind::Sprite(p) if !p.texture.is_empty() => vec![image(&p.texture)],
            NodeKind::AnimatedSprite(p) => p.frames.iter().filter(|f| !f.is_empty()).map(|f| image(f)).collect(),
            NodeKind::Sound(p) if !p.src.is_empty() => vec![AssetRef {
                kind: AssetKind::Audio,
                url: p.src.clone(),
            }],
            NodeKind::Sprite(_)
            | NodeKind::Sound(_)
            | NodeKind::Stage(_)
            | NodeKind::Container(_)
            | NodeKind::Text(_)
            | NodeKind::Button(_)
            | NodeKind::Rect(_)
            | NodeKind::Circle(_)
            | NodeKind::Tween(_)
            | NodeKind::Timer(_)
            | NodeKind::KeyInput(_)
            | NodeKind::Click(_)
            | NodeKind::Script(_) => Vec::new(),
        }
    }

    /// Non-fatal problems worth surfacing to the user.
    pub fn lint(&self) -> Vec<String> {
        match self {
            NodeKind::Sprite(p) if p.texture.is_empty() => vec!["sprite has no texture".into()],
            NodeKind::AnimatedSprite(p) if p.frames.is_empty() => vec!["animated sprite has no frames".into()],
            NodeKind::Sound(p) if p.src.is_empty() => vec!["sound has no source file".into()],
            NodeKind::KeyInput(p) if p.keys.is_empty() => vec!["key input listens to no keys".into()],
            NodeKind::Script(p) if p.code.trim().is_empty() => vec!["script is empty".into()],
            NodeKind::Tween(p) if p.duration <= 0.0 => vec!["tween duration must be positive".into()],
            _ => Vec::new(),
        }
    }
}

/// Quote a string as a JavaScript string literal, safe inside `<script>`.
pub fn js_string(s: &str) -> String {
    serde_json::to_string(s)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}

/// Variable prefix derived from a type tag: `game/animated-sprite` →
/// `animated_sprite`.
pub fn prefix_from_type(type_tag: &str) -> String {
    let last = type_tag.rsplit('/').next().unwrap_or(type_tag);
    let mut prefix: String = last
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    prefix = prefix.trim_matches('_').to_string();
    if prefix.is_empty() {
        return "node".to_string();
    }
    if prefix.starts_with(|c: char| c.is_ascii_digit()) {
        prefix.insert(0, 'n');
    }
    prefix
}

// ── Definitions ────────────────────────────────────────────────────────

static STAGE: NodeDef = NodeDef {
    type_tag: "game/stage",
    prefix: Some("stage"),
    inputs: &[],
    outputs: &[out("stage")],
    template: "\
const {{var}} = root;
app.renderer.resize({{width}}, {{height}});
app.renderer.background.color = {{js.background}};
",
};

static CONTAINER: NodeDef = NodeDef {
    type_tag: "game/container",
    prefix: Some("container"),
    inputs: &[PARENT],
    outputs: &[out("container")],
    template: "\
const {{var}} = new PIXI.Container();
{{var}}.position.set({{x}}, {{y}});
{{var}}.alpha = {{alpha}};
{{var}}.zIndex = {{z_index}};
{{#if visible}}{{else}}{{var}}.visible = false;
{{/if}}{{parent}}.addChild({{var}});
",
};

static SPRITE: NodeDef = NodeDef {
    type_tag: "game/sprite",
    prefix: Some("sprite"),
    inputs: &[PARENT],
    outputs: &[out("sprite")],
    template: "\
const {{var}} = {{#if texture}}PIXI.Sprite.from(resolveAsset({{js.texture}})){{else}}new PIXI.Sprite(PIXI.Texture.WHITE){{/if}};
{{var}}.anchor.set({{anchor}});
{{var}}.position.set({{x}}, {{y}});
{{var}}.scale.set({{scale}});
{{#if width}}{{var}}.width = {{width}};
{{/if}}{{#if height}}{{var}}.height = {{height}};
{{/if}}{{parent}}.addChild({{var}});
",
};

static ANIMATED_SPRITE: NodeDef = NodeDef {
    type_tag: "game/animated-sprite",
    prefix: Some("anim"),
    inputs: &[PARENT],
    outputs: &[out("sprite")],
    template: "\
const {{var}} = new PIXI.AnimatedSprite([
{{#each js.frames}}  PIXI.Texture.from(resolveAsset({{this}})),
{{/each}}]);
{{var}}.anchor.set({{anchor}});
{{var}}.position.set({{x}}, {{y}});
{{var}}.animationSpeed = {{speed}};
{{var}}.loop = {{looping}};
{{#if autoplay}}{{var}}.play();
{{/if}}{{parent}}.addChild({{var}});
",
};

static TEXT: NodeDef = NodeDef {
    type_tag: "game/text",
    prefix: Some("text"),
    inputs: &[PARENT],
    outputs: &[out("text")],
    template: "\
const {{var}} = new PIXI.Text({{js.text}}, {
  fontFamily: {{js.font_family}},
  fontSize: {{font_size}},
  fill: {{js.color}},{{#if bold}}
  fontWeight: 'bold',{{/if}}
});
{{var}}.anchor.set({{anchor}});
{{var}}.position.set({{x}}, {{y}});
{{parent}}.addChild({{var}});
",
};

static BUTTON: NodeDef = NodeDef {
    type_tag: "game/button",
    prefix: Some("button"),
    inputs: &[PARENT],
    outputs: &[
        out("button"),
        OutputDef {
            name: "clicked",
            accessor: ".clicked",
        },
    ],
    template: "\
const {{var}} = new PIXI.Container();
{{var}}.position.set({{x}}, {{y}});
{{var}}.eventMode = 'static';
{{var}}.cursor = 'pointer';
{
  const bg = new PIXI.Graphics();
  bg.beginFill(PIXI.utils.string2hex({{js.color}}));
  bg.drawRoundedRect(-{{width}} / 2, -{{height}} / 2, {{width}}, {{height}}, {{radius}});
  bg.endFill();
  const label = new PIXI.Text({{js.label}}, { fontSize: {{height}} * 0.45, fill: {{js.text_color}} });
  label.anchor.set(0.5);
  {{var}}.addChild(bg, label);
}
{{var}}.clicked = createSignal();
{{var}}.on('pointertap', () => {{var}}.clicked.emit());
{{parent}}.addChild({{var}});
",
};

static RECT: NodeDef = NodeDef {
    type_tag: "shape/rect",
    prefix: Some("rect"),
    inputs: &[PARENT],
    outputs: &[out("shape")],
    template: "\
const {{var}} = new PIXI.Graphics();
{{var}}.beginFill(PIXI.utils.string2hex({{js.color}}));
{{#if radius}}{{var}}.drawRoundedRect(0, 0, {{width}}, {{height}}, {{radius}});
{{else}}{{var}}.drawRect(0, 0, {{width}}, {{height}});
{{/if}}{{var}}.endFill();
{{var}}.position.set({{x}}, {{y}});
{{parent}}.addChild({{var}});
",
};

static CIRCLE: NodeDef = NodeDef {
    type_tag: "shape/circle",
    prefix: Some("circle"),
    inputs: &[PARENT],
    outputs: &[out("shape")],
    template: "\
const {{var}} = new PIXI.Graphics();
{{var}}.beginFill(PIXI.utils.string2hex({{js.color}}));
{{var}}.drawCircle(0, 0, {{radius}});
{{var}}.endFill();
{{var}}.position.set({{x}}, {{y}});
{{parent}}.addChild({{var}});
",
};

static TWEEN: NodeDef = NodeDef {
    type_tag: "anim/tween",
    prefix: Some("tween"),
    inputs: &[TARGET, TRIGGER],
    outputs: &[
        out("tween"),
        OutputDef {
            name: "done",
            accessor: ".done",
        },
    ],
    template: "\
const {{var}} = createTween({{#if target}}{{target}}{{else}}null{{/if}}, {{js.property}}, {{to}}, {{duration}}, {{js.easing}}, { repeat: {{repeat}}, yoyo: {{yoyo}} });
updaters.push((dt) => {{var}}.step(dt));
{{#if trigger}}{{trigger}}.connect(() => {{var}}.play());
{{/if}}{{#if autoplay}}{{var}}.play();
{{/if}}",
};

static TIMER: NodeDef = NodeDef {
    type_tag: "logic/timer",
    prefix: Some("timer"),
    inputs: &[TRIGGER],
    outputs: &[out("tick")],
    template: "\
const {{var}} = createTimer({{interval}}, {{repeat}});
updaters.push((dt) => {{var}}.step(dt));
{{#if trigger}}{{trigger}}.connect(() => {{var}}.start());
{{/if}}{{#if autostart}}{{var}}.start();
{{/if}}",
};

static KEY_INPUT: NodeDef = NodeDef {
    type_tag: "input/key",
    prefix: Some("keys"),
    inputs: &[],
    outputs: &[out("pressed")],
    template: "\
const {{var}} = createSignal();
{
  const watched = [{{#each js.keys}}{{this}}, {{/each}}];
  const onKey = (e) => { if (watched.includes(e.key)) {{var}}.emit(e.key); };
  window.addEventListener('keydown', onKey);
  disposers.push(() => window.removeEventListener('keydown', onKey));
}
",
};

static CLICK: NodeDef = NodeDef {
    type_tag: "input/click",
    prefix: Some("click"),
    inputs: &[TARGET],
    outputs: &[out("clicked")],
    template: "\
const {{var}} = createSignal();
{
  const source = {{#if target}}{{target}}{{else}}app.stage{{/if}};
  source.eventMode = 'static';
  if (source === app.stage) source.hitArea = app.screen;
  source.{{#if once}}once{{else}}on{{/if}}('pointertap', (e) => {{var}}.emit(e));
}
",
};

static SOUND: NodeDef = NodeDef {
    type_tag: "audio/sound",
    prefix: Some("sound"),
    inputs: &[TRIGGER],
    outputs: &[out("sound")],
    template: "\
const {{var}} = new Audio(resolveAsset({{js.src}}));
{{var}}.volume = {{volume}};
{{var}}.loop = {{looping}};
{{#if trigger}}{{trigger}}.connect(() => { {{var}}.currentTime = 0; {{var}}.play().catch((e) => console.warn('[nodegame] audio blocked', e)); });
{{/if}}disposers.push(() => {{var}}.pause());
",
};

static SCRIPT: NodeDef = NodeDef {
    type_tag: "logic/script",
    prefix: None,
    inputs: &[
        SlotDef {
            name: "input",
            default: None,
        },
        TRIGGER,
    ],
    outputs: &[out("result")],
    template: "\
const {{var}} = (input) => {
{{code}}
};
{{#if trigger}}{{trigger}}.connect(() => {{var}}({{#if input}}{{input}}{{else}}null{{/if}}));
{{else}}{{var}}({{#if input}}{{input}}{{else}}null{{/if}});
{{/if}}",
};
