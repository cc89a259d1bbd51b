//! The implicit first plugin: base resets, the core utility set and the core
//! variants.

use super::{
    Declaration, Plugin, PluginContext, RuleBody, UtilityTemplate, ValueType,
};
use crate::config::DarkMode;
use crate::error::PluginError;
use crate::matcher::normalize_arbitrary_value;
use crate::theme::ThemeValue;

const FRACTIONS: [(&str, &str); 7] = [
    ("1/2", "50%"),
    ("1/3", "33.333333%"),
    ("2/3", "66.666667%"),
    ("1/4", "25%"),
    ("3/4", "75%"),
    ("1/5", "20%"),
    ("full", "100%"),
];

const STATES: [(&str, &str); 24] = [
    ("hover", ":hover"),
    ("focus", ":focus"),
    ("focus-within", ":focus-within"),
    ("focus-visible", ":focus-visible"),
    ("active", ":active"),
    ("visited", ":visited"),
    ("target", ":target"),
    ("disabled", ":disabled"),
    ("enabled", ":enabled"),
    ("checked", ":checked"),
    ("indeterminate", ":indeterminate"),
    ("required", ":required"),
    ("invalid", ":invalid"),
    ("read-only", ":read-only"),
    ("placeholder-shown", ":placeholder-shown"),
    ("empty", ":empty"),
    ("first", ":first-child"),
    ("last", ":last-child"),
    ("only", ":only-child"),
    ("odd", ":nth-child(odd)"),
    ("even", ":nth-child(even)"),
    ("first-of-type", ":first-of-type"),
    ("last-of-type", ":last-of-type"),
    ("open", "[open]"),
];

const MEDIA_VARIANTS: [(&str, &str); 6] = [
    ("motion-safe", "@media (prefers-reduced-motion: no-preference)"),
    ("motion-reduce", "@media (prefers-reduced-motion: reduce)"),
    ("contrast-more", "@media (prefers-contrast: more)"),
    ("portrait", "@media (orientation: portrait)"),
    ("landscape", "@media (orientation: landscape)"),
    ("print", "@media print"),
];

const TRANSITION_PROPERTIES: &str = "color, background-color, border-color, text-decoration-color, fill, stroke, opacity, box-shadow, transform, filter, backdrop-filter";

#[derive(Debug, Clone, Default)]
pub struct CorePlugin {
    dark_mode: DarkMode,
}

impl CorePlugin {
    pub fn new(dark_mode: DarkMode) -> Self {
        Self { dark_mode }
    }
}

impl Plugin for CorePlugin {
    fn name(&self) -> &str {
        "core"
    }

    fn register(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        register_base(ctx);
        register_layout(ctx);
        register_flex_and_grid(ctx);
        register_spacing(ctx);
        register_sizing(ctx);
        register_typography(ctx);
        register_backgrounds_and_colors(ctx);
        register_borders(ctx);
        register_effects(ctx);
        register_interactivity(ctx);
        register_transitions(ctx);
        register_screen_variants(ctx)?;
        register_state_variants(ctx);
        register_dark_variant(ctx, &self.dark_mode);
        register_dynamic_variants(ctx);
        Ok(())
    }
}

pub(crate) fn decls(pairs: &[(&str, &str)]) -> Vec<Declaration> {
    pairs
        .iter()
        .map(|(property, value)| Declaration::new(*property, *value))
        .collect()
}

fn body(pairs: &[(&str, &str)]) -> RuleBody {
    RuleBody {
        declarations: decls(pairs),
        nested: Vec::new(),
    }
}

fn statics(ctx: &mut PluginContext<'_>, entries: &[(&str, &[(&str, &str)])]) {
    for (name, pairs) in entries {
        ctx.add_static(*name, body(pairs));
    }
}

/// One static class per `(suffix, value)` pair, all setting `property`.
fn keyword_set(ctx: &mut PluginContext<'_>, prefix: &str, property: &str, keywords: &[(&str, &str)]) {
    for (suffix, value) in keywords {
        let name = if suffix.is_empty() {
            prefix.to_string()
        } else {
            format!("{}-{}", prefix, suffix)
        };
        ctx.add_static(name, RuleBody::single(property, *value));
    }
}

fn integer(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn register_base(ctx: &mut PluginContext<'_>) {
    let border_color = ctx
        .theme("colors.gray.200")
        .and_then(ThemeValue::to_css)
        .unwrap_or_else(|| "currentColor".to_string());
    let sans = ctx
        .theme("fontFamily.sans")
        .and_then(ThemeValue::to_css)
        .unwrap_or_else(|| "sans-serif".to_string());
    let mono = ctx
        .theme("fontFamily.mono")
        .and_then(ThemeValue::to_css)
        .unwrap_or_else(|| "monospace".to_string());

    ctx.add_base(
        "*, ::before, ::after",
        decls(&[
            ("box-sizing", "border-box"),
            ("border-width", "0"),
            ("border-style", "solid"),
            ("border-color", border_color.as_str()),
        ]),
    );
    ctx.add_base("::before, ::after", decls(&[("--tw-content", "''")]));
    ctx.add_base(
        "html, :host",
        decls(&[
            ("line-height", "1.5"),
            ("-webkit-text-size-adjust", "100%"),
            ("tab-size", "4"),
            ("font-family", sans.as_str()),
        ]),
    );
    ctx.add_base("body", decls(&[("margin", "0"), ("line-height", "inherit")]));
    ctx.add_base(
        "h1, h2, h3, h4, h5, h6",
        decls(&[("font-size", "inherit"), ("font-weight", "inherit")]),
    );
    ctx.add_base("a", decls(&[("color", "inherit"), ("text-decoration", "inherit")]));
    ctx.add_base("b, strong", decls(&[("font-weight", "bolder")]));
    ctx.add_base(
        "code, kbd, samp, pre",
        decls(&[("font-family", mono.as_str()), ("font-size", "1em")]),
    );
    ctx.add_base(
        "button, input, optgroup, select, textarea",
        decls(&[
            ("font-family", "inherit"),
            ("font-size", "100%"),
            ("font-weight", "inherit"),
            ("line-height", "inherit"),
            ("color", "inherit"),
            ("margin", "0"),
            ("padding", "0"),
        ]),
    );
    ctx.add_base(
        "blockquote, dl, dd, h1, h2, h3, h4, h5, h6, hr, figure, p, pre",
        decls(&[("margin", "0")]),
    );
    ctx.add_base(
        "ol, ul, menu",
        decls(&[("list-style", "none"), ("margin", "0"), ("padding", "0")]),
    );
    ctx.add_base(
        "img, svg, video, canvas, audio, iframe, embed, object",
        decls(&[("display", "block"), ("vertical-align", "middle")]),
    );
    ctx.add_base("img, video", decls(&[("max-width", "100%"), ("height", "auto")]));
    ctx.add_base("[hidden]", decls(&[("display", "none")]));
}

fn register_layout(ctx: &mut PluginContext<'_>) {
    for display in [
        "block",
        "inline-block",
        "inline",
        "flex",
        "inline-flex",
        "grid",
        "inline-grid",
        "table",
        "table-row",
        "table-cell",
        "contents",
        "flow-root",
        "list-item",
    ] {
        ctx.add_static(display, RuleBody::single("display", display));
    }
    ctx.add_static("hidden", RuleBody::single("display", "none"));

    for position in ["static", "fixed", "absolute", "relative", "sticky"] {
        ctx.add_static(position, RuleBody::single("position", position));
    }
    statics(
        ctx,
        &[
            ("visible", &[("visibility", "visible")]),
            ("invisible", &[("visibility", "hidden")]),
            ("collapse", &[("visibility", "collapse")]),
            ("isolate", &[("isolation", "isolate")]),
            ("isolation-auto", &[("isolation", "auto")]),
            ("box-border", &[("box-sizing", "border-box")]),
            ("box-content", &[("box-sizing", "content-box")]),
            (
                "sr-only",
                &[
                    ("position", "absolute"),
                    ("width", "1px"),
                    ("height", "1px"),
                    ("padding", "0"),
                    ("margin", "-1px"),
                    ("overflow", "hidden"),
                    ("clip", "rect(0, 0, 0, 0)"),
                    ("white-space", "nowrap"),
                    ("border-width", "0"),
                ],
            ),
        ],
    );

    let overflow = [
        ("auto", "auto"),
        ("hidden", "hidden"),
        ("clip", "clip"),
        ("visible", "visible"),
        ("scroll", "scroll"),
    ];
    keyword_set(ctx, "overflow", "overflow", &overflow);
    keyword_set(ctx, "overflow-x", "overflow-x", &overflow);
    keyword_set(ctx, "overflow-y", "overflow-y", &overflow);
    keyword_set(
        ctx,
        "object",
        "object-fit",
        &[("contain", "contain"), ("cover", "cover"), ("fill", "fill"), ("none", "none")],
    );

    let inset_values = [("auto", "auto")].into_iter().chain(FRACTIONS);
    for (prefix, properties) in [
        ("inset", &["top", "right", "bottom", "left"][..]),
        ("inset-x", &["left", "right"][..]),
        ("inset-y", &["top", "bottom"][..]),
        ("top", &["top"][..]),
        ("right", &["right"][..]),
        ("bottom", &["bottom"][..]),
        ("left", &["left"][..]),
    ] {
        ctx.add_utility(
            UtilityTemplate::properties(prefix, properties)
                .theme("spacing")
                .values(inset_values.clone())
                .arbitrary(ValueType::Any)
                .negative(),
        );
    }

    ctx.add_utility(
        UtilityTemplate::property("z", "z-index")
            .theme("zIndex")
            .arbitrary(ValueType::Any)
            .negative(),
    );
}

fn register_flex_and_grid(ctx: &mut PluginContext<'_>) {
    statics(
        ctx,
        &[
            ("flex-row", &[("flex-direction", "row")]),
            ("flex-row-reverse", &[("flex-direction", "row-reverse")]),
            ("flex-col", &[("flex-direction", "column")]),
            ("flex-col-reverse", &[("flex-direction", "column-reverse")]),
            ("flex-wrap", &[("flex-wrap", "wrap")]),
            ("flex-wrap-reverse", &[("flex-wrap", "wrap-reverse")]),
            ("flex-nowrap", &[("flex-wrap", "nowrap")]),
            ("flex-1", &[("flex", "1 1 0%")]),
            ("flex-auto", &[("flex", "1 1 auto")]),
            ("flex-initial", &[("flex", "0 1 auto")]),
            ("flex-none", &[("flex", "none")]),
            ("grow", &[("flex-grow", "1")]),
            ("grow-0", &[("flex-grow", "0")]),
            ("shrink", &[("flex-shrink", "1")]),
            ("shrink-0", &[("flex-shrink", "0")]),
        ],
    );
    keyword_set(
        ctx,
        "items",
        "align-items",
        &[
            ("start", "flex-start"),
            ("end", "flex-end"),
            ("center", "center"),
            ("baseline", "baseline"),
            ("stretch", "stretch"),
        ],
    );
    keyword_set(
        ctx,
        "justify",
        "justify-content",
        &[
            ("start", "flex-start"),
            ("end", "flex-end"),
            ("center", "center"),
            ("between", "space-between"),
            ("around", "space-around"),
            ("evenly", "space-evenly"),
        ],
    );
    keyword_set(
        ctx,
        "content",
        "align-content",
        &[
            ("start", "flex-start"),
            ("end", "flex-end"),
            ("center", "center"),
            ("between", "space-between"),
        ],
    );
    keyword_set(
        ctx,
        "self",
        "align-self",
        &[
            ("auto", "auto"),
            ("start", "flex-start"),
            ("end", "flex-end"),
            ("center", "center"),
            ("stretch", "stretch"),
        ],
    );

    ctx.add_utility(
        UtilityTemplate::property("order", "order")
            .values([("first", "-9999"), ("last", "9999"), ("none", "0")])
            .parse(|raw| integer(raw).map(|n| n.to_string()))
            .arbitrary(ValueType::Any)
            .negative(),
    );
    ctx.add_utility(
        UtilityTemplate::property("basis", "flex-basis")
            .theme("spacing")
            .values([("auto", "auto")].into_iter().chain(FRACTIONS))
            .arbitrary(ValueType::Length),
    );

    for (prefix, property) in [
        ("grid-cols", "grid-template-columns"),
        ("grid-rows", "grid-template-rows"),
    ] {
        ctx.add_utility(
            UtilityTemplate::property(prefix, property)
                .values([("none", "none")])
                .parse(|raw| {
                    integer(raw)
                        .filter(|n| (1..=12).contains(n))
                        .map(|n| format!("repeat({}, minmax(0, 1fr))", n))
                })
                .arbitrary(ValueType::Any),
        );
    }
    for (prefix, property) in [("col-span", "grid-column"), ("row-span", "grid-row")] {
        ctx.add_utility(
            UtilityTemplate::property(prefix, property)
                .values([("full", "1 / -1")])
                .parse(|raw| {
                    integer(raw)
                        .filter(|n| (1..=12).contains(n))
                        .map(|n| format!("span {} / span {}", n, n))
                })
                .arbitrary(ValueType::Any),
        );
    }

    for (prefix, properties) in [
        ("gap", &["gap"][..]),
        ("gap-x", &["column-gap"][..]),
        ("gap-y", &["row-gap"][..]),
    ] {
        ctx.add_utility(
            UtilityTemplate::properties(prefix, properties)
                .theme("spacing")
                .arbitrary(ValueType::Length),
        );
    }
}

fn register_spacing(ctx: &mut PluginContext<'_>) {
    let sides: [(&str, &[&str]); 7] = [
        ("", &[""]),
        ("x", &["-left", "-right"]),
        ("y", &["-top", "-bottom"]),
        ("t", &["-top"]),
        ("r", &["-right"]),
        ("b", &["-bottom"]),
        ("l", &["-left"]),
    ];
    for (base, property) in [("p", "padding"), ("m", "margin")] {
        for (side, suffixes) in sides {
            let prefix = format!("{}{}", base, side);
            let properties = suffixes
                .iter()
                .map(|suffix| format!("{}{}", property, suffix))
                .collect::<Vec<_>>();
            let properties = properties.iter().map(String::as_str).collect::<Vec<_>>();
            let mut template = UtilityTemplate::properties(prefix, &properties)
                .theme("spacing")
                .arbitrary(ValueType::Length);
            if base == "m" {
                template = template.values([("auto", "auto")]).negative();
            }
            ctx.add_utility(template);
        }
    }

    for (prefix, property) in [("space-x", "margin-left"), ("space-y", "margin-top")] {
        ctx.add_utility(
            UtilityTemplate::new(prefix, move |value| {
                RuleBody::new().nested(
                    " > :not([hidden]) ~ :not([hidden])",
                    vec![Declaration::new(property, value.css.as_str())],
                )
            })
            .theme("spacing")
            .arbitrary(ValueType::Length)
            .negative(),
        );
    }
}

fn register_sizing(ctx: &mut PluginContext<'_>) {
    let content_sizes = [("min", "min-content"), ("max", "max-content"), ("fit", "fit-content")];

    ctx.add_utility(
        UtilityTemplate::property("w", "width")
            .theme("spacing")
            .values([("auto", "auto"), ("screen", "100vw")])
            .values(FRACTIONS)
            .values(content_sizes)
            .arbitrary(ValueType::Length),
    );
    ctx.add_utility(
        UtilityTemplate::property("h", "height")
            .theme("spacing")
            .values([("auto", "auto"), ("screen", "100vh")])
            .values(FRACTIONS)
            .values(content_sizes)
            .arbitrary(ValueType::Length),
    );
    ctx.add_utility(
        UtilityTemplate::properties("size", &["width", "height"])
            .theme("spacing")
            .values([("auto", "auto")])
            .values(FRACTIONS)
            .arbitrary(ValueType::Length),
    );
    ctx.add_utility(
        UtilityTemplate::property("min-w", "min-width")
            .values([("0", "0px"), ("full", "100%")])
            .values(content_sizes)
            .arbitrary(ValueType::Length),
    );
    ctx.add_utility(
        UtilityTemplate::property("min-h", "min-height")
            .values([("0", "0px"), ("full", "100%"), ("screen", "100vh")])
            .values(content_sizes)
            .arbitrary(ValueType::Length),
    );
    ctx.add_utility(
        UtilityTemplate::property("max-w", "max-width")
            .theme("maxWidth")
            .values([("none", "none"), ("full", "100%")])
            .values(content_sizes)
            .arbitrary(ValueType::Length),
    );
    ctx.add_utility(
        UtilityTemplate::property("max-h", "max-height")
            .theme("spacing")
            .values([("none", "none"), ("full", "100%"), ("screen", "100vh")])
            .values(content_sizes)
            .arbitrary(ValueType::Length),
    );
}

fn register_typography(ctx: &mut PluginContext<'_>) {
    ctx.add_utility(
        UtilityTemplate::property("font", "font-family")
            .theme("fontFamily")
            .arbitrary(ValueType::Any),
    );
    ctx.add_utility(UtilityTemplate::property("font", "font-weight").theme("fontWeight"));

    ctx.add_utility(
        UtilityTemplate::new("text", |value| {
            let mut body = RuleBody::single("font-size", value.css.as_str());
            if let Some(line_height) = value
                .theme
                .as_ref()
                .and_then(ThemeValue::as_list)
                .and_then(|pair| pair.get(1))
                .and_then(|extra| match extra {
                    ThemeValue::Table(options) => options.get("lineHeight"),
                    scalar => Some(scalar),
                })
                .and_then(ThemeValue::as_scalar)
            {
                body = body.decl("line-height", line_height);
            }
            body
        })
        .theme("fontSize")
        .arbitrary(ValueType::Length),
    );
    ctx.add_utility(
        UtilityTemplate::property("text", "color")
            .theme("colors")
            .arbitrary(ValueType::Color)
            .opacity(),
    );

    ctx.add_utility(
        UtilityTemplate::property("leading", "line-height")
            .theme("lineHeight")
            .arbitrary(ValueType::Length),
    );
    ctx.add_utility(
        UtilityTemplate::property("tracking", "letter-spacing")
            .theme("letterSpacing")
            .arbitrary(ValueType::Length)
            .negative(),
    );
    ctx.add_utility(
        UtilityTemplate::property("indent", "text-indent")
            .theme("spacing")
            .arbitrary(ValueType::Length)
            .negative(),
    );

    keyword_set(
        ctx,
        "text",
        "text-align",
        &[
            ("left", "left"),
            ("center", "center"),
            ("right", "right"),
            ("justify", "justify"),
            ("start", "start"),
            ("end", "end"),
        ],
    );
    keyword_set(
        ctx,
        "whitespace",
        "white-space",
        &[
            ("normal", "normal"),
            ("nowrap", "nowrap"),
            ("pre", "pre"),
            ("pre-line", "pre-line"),
            ("pre-wrap", "pre-wrap"),
            ("break-spaces", "break-spaces"),
        ],
    );
    keyword_set(
        ctx,
        "align",
        "vertical-align",
        &[
            ("baseline", "baseline"),
            ("top", "top"),
            ("middle", "middle"),
            ("bottom", "bottom"),
            ("text-top", "text-top"),
            ("text-bottom", "text-bottom"),
        ],
    );
    keyword_set(
        ctx,
        "list",
        "list-style-type",
        &[("none", "none"), ("disc", "disc"), ("decimal", "decimal")],
    );
    statics(
        ctx,
        &[
            ("uppercase", &[("text-transform", "uppercase")]),
            ("lowercase", &[("text-transform", "lowercase")]),
            ("capitalize", &[("text-transform", "capitalize")]),
            ("normal-case", &[("text-transform", "none")]),
            ("italic", &[("font-style", "italic")]),
            ("not-italic", &[("font-style", "normal")]),
            ("underline", &[("text-decoration-line", "underline")]),
            ("overline", &[("text-decoration-line", "overline")]),
            ("line-through", &[("text-decoration-line", "line-through")]),
            ("no-underline", &[("text-decoration-line", "none")]),
            (
                "truncate",
                &[
                    ("overflow", "hidden"),
                    ("text-overflow", "ellipsis"),
                    ("white-space", "nowrap"),
                ],
            ),
            ("text-ellipsis", &[("text-overflow", "ellipsis")]),
            ("text-clip", &[("text-overflow", "clip")]),
            ("break-normal", &[("overflow-wrap", "normal"), ("word-break", "normal")]),
            ("break-words", &[("overflow-wrap", "break-word")]),
            ("break-all", &[("word-break", "break-all")]),
            (
                "antialiased",
                &[
                    ("-webkit-font-smoothing", "antialiased"),
                    ("-moz-osx-font-smoothing", "grayscale"),
                ],
            ),
            (
                "subpixel-antialiased",
                &[
                    ("-webkit-font-smoothing", "auto"),
                    ("-moz-osx-font-smoothing", "auto"),
                ],
            ),
        ],
    );

    ctx.add_utility(
        UtilityTemplate::property("decoration", "text-decoration-color")
            .theme("colors")
            .arbitrary(ValueType::Color)
            .opacity(),
    );
    ctx.add_utility(
        UtilityTemplate::new("content", |value| {
            RuleBody::single("--tw-content", value.css.as_str()).decl("content", "var(--tw-content)")
        })
        .values([("none", "none")])
        .arbitrary(ValueType::Any),
    );
}

fn register_backgrounds_and_colors(ctx: &mut PluginContext<'_>) {
    for (prefix, property) in [
        ("bg", "background-color"),
        ("fill", "fill"),
        ("stroke", "stroke"),
        ("accent", "accent-color"),
        ("caret", "caret-color"),
        ("outline", "outline-color"),
    ] {
        ctx.add_utility(
            UtilityTemplate::property(prefix, property)
                .theme("colors")
                .arbitrary(ValueType::Color)
                .opacity(),
        );
    }
    keyword_set(
        ctx,
        "bg",
        "background-size",
        &[("auto", "auto"), ("cover", "cover"), ("contain", "contain")],
    );
    keyword_set(
        ctx,
        "bg",
        "background-repeat",
        &[("repeat", "repeat"), ("no-repeat", "no-repeat")],
    );
    keyword_set(
        ctx,
        "bg",
        "background-position",
        &[("center", "center"), ("top", "top"), ("bottom", "bottom")],
    );
}

fn register_borders(ctx: &mut PluginContext<'_>) {
    for (prefix, properties) in [
        ("border", &["border-width"][..]),
        ("border-x", &["border-left-width", "border-right-width"][..]),
        ("border-y", &["border-top-width", "border-bottom-width"][..]),
        ("border-t", &["border-top-width"][..]),
        ("border-r", &["border-right-width"][..]),
        ("border-b", &["border-bottom-width"][..]),
        ("border-l", &["border-left-width"][..]),
    ] {
        ctx.add_utility(
            UtilityTemplate::properties(prefix, properties)
                .theme("borderWidth")
                .arbitrary(ValueType::Length),
        );
    }
    ctx.add_utility(
        UtilityTemplate::property("border", "border-color")
            .theme("colors")
            .arbitrary(ValueType::Color)
            .opacity(),
    );
    keyword_set(
        ctx,
        "border",
        "border-style",
        &[
            ("solid", "solid"),
            ("dashed", "dashed"),
            ("dotted", "dotted"),
            ("double", "double"),
            ("none", "none"),
        ],
    );

    for (prefix, properties) in [
        ("rounded", &["border-radius"][..]),
        ("rounded-t", &["border-top-left-radius", "border-top-right-radius"][..]),
        ("rounded-r", &["border-top-right-radius", "border-bottom-right-radius"][..]),
        ("rounded-b", &["border-bottom-right-radius", "border-bottom-left-radius"][..]),
        ("rounded-l", &["border-top-left-radius", "border-bottom-left-radius"][..]),
        ("rounded-tl", &["border-top-left-radius"][..]),
        ("rounded-tr", &["border-top-right-radius"][..]),
        ("rounded-br", &["border-bottom-right-radius"][..]),
        ("rounded-bl", &["border-bottom-left-radius"][..]),
    ] {
        ctx.add_utility(
            UtilityTemplate::properties(prefix, properties)
                .theme("borderRadius")
                .arbitrary(ValueType::Length),
        );
    }
}

fn register_effects(ctx: &mut PluginContext<'_>) {
    ctx.add_utility(
        UtilityTemplate::property("opacity", "opacity")
            .theme("opacity")
            .arbitrary(ValueType::Any),
    );
    ctx.add_utility(
        UtilityTemplate::property("shadow", "box-shadow")
            .theme("boxShadow")
            .arbitrary(ValueType::Any),
    );
}

fn register_interactivity(ctx: &mut PluginContext<'_>) {
    keyword_set(
        ctx,
        "cursor",
        "cursor",
        &[
            ("auto", "auto"),
            ("default", "default"),
            ("pointer", "pointer"),
            ("wait", "wait"),
            ("text", "text"),
            ("move", "move"),
            ("help", "help"),
            ("not-allowed", "not-allowed"),
        ],
    );
    keyword_set(
        ctx,
        "pointer-events",
        "pointer-events",
        &[("none", "none"), ("auto", "auto")],
    );
    keyword_set(
        ctx,
        "select",
        "user-select",
        &[("none", "none"), ("text", "text"), ("all", "all"), ("auto", "auto")],
    );
    keyword_set(
        ctx,
        "resize",
        "resize",
        &[("", "both"), ("none", "none"), ("x", "horizontal"), ("y", "vertical")],
    );
    statics(
        ctx,
        &[
            ("appearance-none", &[("appearance", "none")]),
            (
                "outline-none",
                &[("outline", "2px solid transparent"), ("outline-offset", "2px")],
            ),
            ("outline", &[("outline-style", "solid")]),
        ],
    );
}

fn register_transitions(ctx: &mut PluginContext<'_>) {
    let timing = ("transition-timing-function", "cubic-bezier(0.4, 0, 0.2, 1)");
    let duration = ("transition-duration", "150ms");
    statics(
        ctx,
        &[
            (
                "transition",
                &[("transition-property", TRANSITION_PROPERTIES), timing, duration],
            ),
            ("transition-all", &[("transition-property", "all"), timing, duration]),
            (
                "transition-colors",
                &[
                    (
                        "transition-property",
                        "color, background-color, border-color, text-decoration-color, fill, stroke",
                    ),
                    timing,
                    duration,
                ],
            ),
            ("transition-opacity", &[("transition-property", "opacity"), timing, duration]),
            ("transition-shadow", &[("transition-property", "box-shadow"), timing, duration]),
            ("transition-transform", &[("transition-property", "transform"), timing, duration]),
            ("transition-none", &[("transition-property", "none")]),
        ],
    );
    keyword_set(
        ctx,
        "ease",
        "transition-timing-function",
        &[
            ("linear", "linear"),
            ("in", "cubic-bezier(0.4, 0, 1, 1)"),
            ("out", "cubic-bezier(0, 0, 0.2, 1)"),
            ("in-out", "cubic-bezier(0.4, 0, 0.2, 1)"),
        ],
    );
    for (prefix, property) in [
        ("duration", "transition-duration"),
        ("delay", "transition-delay"),
    ] {
        ctx.add_utility(
            UtilityTemplate::property(prefix, property)
                .parse(|raw| integer(raw).map(|ms| format!("{}ms", ms)))
                .arbitrary(ValueType::Any),
        );
    }
}

/// `@media` prelude for a `screens` entry: a plain width, `{ raw }`, or a
/// `{ min, max }` range.
fn screen_query(name: &str, value: &ThemeValue) -> Result<String, PluginError> {
    if let Some(width) = value.as_scalar() {
        return Ok(format!("@media (min-width: {})", width));
    }
    if let Some(table) = value.as_table() {
        if let Some(raw) = table.get("raw").and_then(ThemeValue::as_scalar) {
            return Ok(format!("@media {}", raw));
        }
        let min = table.get("min").and_then(ThemeValue::as_scalar);
        let max = table.get("max").and_then(ThemeValue::as_scalar);
        let query = match (min, max) {
            (Some(min), Some(max)) => format!("(min-width: {}) and (max-width: {})", min, max),
            (Some(min), None) => format!("(min-width: {})", min),
            (None, Some(max)) => format!("(max-width: {})", max),
            (None, None) => String::new(),
        };
        if !query.is_empty() {
            return Ok(format!("@media {}", query));
        }
    }
    Err(PluginError::Registration {
        plugin: "core".to_string(),
        message: format!("screen '{}' has no usable width", name),
    })
}

fn register_screen_variants(ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
    let screens = ctx
        .theme_category("screens")
        .map(|screens| {
            screens
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    for (name, value) in screens {
        let query = screen_query(&name, &value)?;
        ctx.add_variant(name.clone(), move |shape| shape.wrap(query.as_str()));
        if let Some(width) = value.as_scalar() {
            let max_query = format!("@media not all and (min-width: {})", width);
            ctx.add_variant(format!("max-{}", name), move |shape| {
                shape.wrap(max_query.as_str())
            });
        }
    }
    Ok(())
}

fn register_state_variants(ctx: &mut PluginContext<'_>) {
    for (name, pseudo) in STATES {
        ctx.add_variant(name, move |shape| shape.append(pseudo));
        let group = format!(".group{} &", pseudo);
        ctx.add_variant(format!("group-{}", name), move |shape| shape.replace_self(&group));
        let peer = format!(".peer{} ~ &", pseudo);
        ctx.add_variant(format!("peer-{}", name), move |shape| shape.replace_self(&peer));
    }

    for (name, pseudo, needs_content) in [
        ("before", "::before", true),
        ("after", "::after", true),
        ("placeholder", "::placeholder", false),
        ("file", "::file-selector-button", false),
        ("first-letter", "::first-letter", false),
        ("first-line", "::first-line", false),
    ] {
        ctx.add_variant(name, move |shape| {
            shape.pseudo_element = Some(pseudo.to_string());
            shape.needs_content |= needs_content;
        });
    }

    for (name, at_rule) in MEDIA_VARIANTS {
        ctx.add_variant(name, move |shape| shape.wrap(at_rule));
    }
}

fn register_dark_variant(ctx: &mut PluginContext<'_>, dark_mode: &DarkMode) {
    match dark_mode {
        DarkMode::Media => {
            ctx.add_variant("dark", |shape| shape.wrap("@media (prefers-color-scheme: dark)"))
        }
        DarkMode::Class => ctx.add_variant("dark", |shape| shape.replace_self(":is(.dark &)")),
        DarkMode::Selector(selector) => {
            let suffix = format!(":where({}, {} *)", selector, selector);
            ctx.add_variant("dark", move |shape| shape.append(&suffix));
        }
    }
}

fn register_dynamic_variants(ctx: &mut PluginContext<'_>) {
    ctx.add_functional_variant("[", |rest, shape| {
        let Some(raw) = rest.strip_suffix(']') else {
            return false;
        };
        let selector = normalize_arbitrary_value(raw);
        if selector.is_empty() {
            return false;
        }
        if selector.starts_with('@') {
            shape.wrap(selector);
            return true;
        }
        if !selector.contains('&') {
            return false;
        }
        shape.replace_self(&selector);
        true
    });

    ctx.add_functional_variant("supports-", |rest, shape| {
        let Some(raw) = bracketed(rest) else {
            return false;
        };
        let query = normalize_arbitrary_value(raw);
        let query = if query.starts_with('(') || query.starts_with("not ") {
            query
        } else {
            format!("({})", query)
        };
        shape.wrap(format!("@supports {}", query));
        true
    });

    ctx.add_functional_variant("data-", |rest, shape| {
        let attribute = match bracketed(rest) {
            Some(raw) => normalize_arbitrary_value(raw),
            None if is_plain_name(rest) => rest.to_string(),
            None => return false,
        };
        shape.append(&format!("[data-{}]", attribute));
        true
    });

    ctx.add_functional_variant("aria-", |rest, shape| {
        let attribute = match bracketed(rest) {
            Some(raw) => normalize_arbitrary_value(raw),
            None if is_plain_name(rest) => format!("{}=\"true\"", rest),
            None => return false,
        };
        shape.append(&format!("[aria-{}]", attribute));
        true
    });

    ctx.add_functional_variant("has-", |rest, shape| {
        let Some(raw) = bracketed(rest) else {
            return false;
        };
        shape.append(&format!(":has({})", normalize_arbitrary_value(raw)));
        true
    });
}

fn bracketed(raw: &str) -> Option<&str> {
    raw.strip_prefix('[')
        .and_then(|value| value.strip_suffix(']'))
        .filter(|value| !value.is_empty())
}

fn is_plain_name(raw: &str) -> bool {
    !raw.is_empty()
        && raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::{screen_query, CorePlugin};
    use crate::plugin::pipeline::build;
    use crate::plugin::{Plugin, VariantKind};
    use crate::theme::{default_theme, ThemeValue, TokenMap};

    fn index() -> crate::plugin::pipeline::RuleIndex {
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(CorePlugin::default())];
        build(default_theme(), &plugins).expect("core registers")
    }

    #[test]
    fn expands_theme_bound_utilities() {
        let index = index();
        assert_eq!(index.exact("mt-4").map(|e| e.value.css.as_str()), Some("1rem"));
        assert_eq!(index.exact("bg-red-500").map(|e| e.value.css.as_str()), Some("#ef4444"));
        assert_eq!(index.exact("w-1/2").map(|e| e.value.css.as_str()), Some("50%"));
        assert!(index.exact("rounded").is_some());
        assert!(index.exact("border").is_some());
        assert!(index.exact("shadow").is_some());
    }

    #[test]
    fn font_size_carries_line_height() {
        let index = index();
        let entry = index.exact("text-sm").expect("text-sm");
        let body = entry.template.apply(&entry.value);
        let rendered = body
            .declarations
            .iter()
            .map(|d| format!("{}:{}", d.property, d.value))
            .collect::<Vec<_>>();
        assert_eq!(rendered, vec!["font-size:0.875rem", "line-height:1.25rem"]);
    }

    #[test]
    fn registers_screen_and_state_variants() {
        let index = index();
        for name in ["sm", "md", "2xl", "max-lg", "hover", "group-hover", "peer-checked", "before", "dark", "print"] {
            assert!(
                matches!(index.static_variant(name), Some(VariantKind::Static(_))),
                "missing variant {}",
                name
            );
        }
        assert!(index.functional_variants("[&_p]").next().is_some());
        assert!(index.functional_variants("data-[state=open]").next().is_some());
    }

    #[test]
    fn base_rules_follow_the_theme() {
        let index = index();
        let html = index
            .base_rules()
            .iter()
            .find(|rule| rule.selector == "html, :host")
            .expect("html base rule");
        assert!(html
            .declarations
            .iter()
            .any(|d| d.property == "font-family" && d.value.starts_with("ui-sans-serif")));
    }

    #[test]
    fn screen_queries_accept_ranges_and_raw() {
        assert_eq!(
            screen_query("md", &ThemeValue::scalar("768px")).expect("width"),
            "@media (min-width: 768px)"
        );
        let range = ThemeValue::Table(TokenMap::from_iter([("min", "640px"), ("max", "767px")]));
        assert_eq!(
            screen_query("tablet", &range).expect("range"),
            "@media (min-width: 640px) and (max-width: 767px)"
        );
        let raw = ThemeValue::Table(TokenMap::from_iter([("raw", "(orientation: portrait)")]));
        assert_eq!(
            screen_query("tall", &raw).expect("raw"),
            "@media (orientation: portrait)"
        );
        assert!(screen_query("bad", &ThemeValue::list(["a", "b"])).is_err());
    }
}
