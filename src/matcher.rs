//! Turns one candidate token into at most one [`EmittedRule`].
//!
//! Matching order for the base token (variants and `!` stripped):
//! arbitrary property, exact index entry, prefix-keyed dynamic template,
//! opacity modifier, then the negated form. Anything else is silently
//! dropped.

use crate::assembler::{EmittedRule, RuleBlock};
use crate::plugin::pipeline::RuleIndex;
use crate::plugin::{Declaration, Layer, ResolvedValue, RuleBody, RuleShape, UtilityTemplate, ValueType, VariantKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Marks every declaration `!important`.
    pub important: bool,
}

pub fn match_token(token: &str, index: &RuleIndex, options: &MatchOptions) -> Option<EmittedRule> {
    let (variants, base) = parse_variants(token);
    if base.is_empty() || variants.iter().any(|variant| variant.is_empty()) {
        return None;
    }
    let (base, important) = split_important(base);

    let (body, layer) = match arbitrary_property(base) {
        Some(body) => (body, Layer::Utilities),
        None => {
            let (template, value) = resolve(base, index)?;
            (template.apply(&value), template.layer)
        }
    };
    if body.is_empty() {
        return None;
    }

    let mut shape = RuleShape::new(format!(".{}", escape_selector(token)));
    // The last-peeled variant sits closest to the rule.
    for variant in variants.iter().rev() {
        if !apply_variant(variant, index, &mut shape) {
            return None;
        }
    }

    Some(emit(body, &shape, layer, important || options.important))
}

fn resolve<'a>(base: &str, index: &'a RuleIndex) -> Option<(&'a UtilityTemplate, ResolvedValue)> {
    if let Some(hit) = lookup(base, index, |_| true) {
        return Some(hit);
    }
    let positive = base.strip_prefix('-')?;
    let (template, mut value) = lookup(positive, index, |template| template.negative)?;
    value.css = negate(&value.css)?;
    Some((template, value))
}

fn lookup<'a, F>(base: &str, index: &'a RuleIndex, accept: F) -> Option<(&'a UtilityTemplate, ResolvedValue)>
where
    F: Fn(&UtilityTemplate) -> bool,
{
    if let Some(hit) = lookup_plain(base, index, &accept) {
        return Some(hit);
    }

    let (head, modifier) = split_modifier(base)?;
    let alpha = opacity_percentage(modifier)?;
    let (template, mut value) =
        lookup_plain(head, index, &|template: &UtilityTemplate| template.opacity && accept(template))?;
    value.css = format!("color-mix(in srgb, {} {}, transparent)", value.css, alpha);
    Some((template, value))
}

fn lookup_plain<'a>(
    base: &str,
    index: &'a RuleIndex,
    accept: &dyn Fn(&UtilityTemplate) -> bool,
) -> Option<(&'a UtilityTemplate, ResolvedValue)> {
    if let Some(entry) = index.exact(base) {
        if accept(entry.template.as_ref()) {
            return Some((entry.template.as_ref(), entry.value.clone()));
        }
    }

    for template in index.dynamic() {
        if !accept(template) {
            continue;
        }
        let Some(rest) = base
            .strip_prefix(template.prefix.as_str())
            .and_then(|rest| rest.strip_prefix(template.separator))
        else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        if let Some(inner) = rest.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            let Some(expected) = template.arbitrary else {
                continue;
            };
            if let Some(css) = parse_arbitrary(inner, expected) {
                return Some((
                    template,
                    ResolvedValue {
                        css,
                        theme: None,
                        arbitrary: true,
                    },
                ));
            }
            continue;
        }
        if let Some(css) = template.parser.as_ref().and_then(|parse| parse(rest)) {
            return Some((template, ResolvedValue::css(css)));
        }
    }
    None
}

fn apply_variant(name: &str, index: &RuleIndex, shape: &mut RuleShape) -> bool {
    if let Some(VariantKind::Static(transform)) = index.static_variant(name) {
        transform(shape);
        return true;
    }
    for (kind, rest) in index.functional_variants(name) {
        let VariantKind::Functional(parser) = kind else {
            continue;
        };
        let mut trial = shape.clone();
        if parser(rest, &mut trial) {
            *shape = trial;
            return true;
        }
    }
    false
}

fn emit(body: RuleBody, shape: &RuleShape, layer: Layer, important: bool) -> EmittedRule {
    let selector = shape.final_selector();
    let mut declarations = body.declarations;
    if shape.needs_content && !declarations.iter().any(|decl| decl.property == "content") {
        declarations.insert(0, Declaration::new("content", "var(--tw-content)"));
    }
    let mut nested = body
        .nested
        .into_iter()
        .filter(|rule| !rule.declarations.is_empty())
        .map(|rule| RuleBlock {
            selector: format!("{}{}", selector, rule.selector_suffix),
            declarations: rule.declarations,
        })
        .collect::<Vec<_>>();

    if important {
        declarations
            .iter_mut()
            .chain(nested.iter_mut().flat_map(|block| block.declarations.iter_mut()))
            .for_each(|decl| decl.important = true);
    }

    EmittedRule {
        selector,
        declarations,
        nested,
        wrappers: shape.wrappers.clone(),
        layer,
    }
}

/// Byte offsets of `needle` outside any `[...]` or `(...)` group.
fn top_level(text: &str, needle: char) -> impl Iterator<Item = usize> + '_ {
    text.char_indices()
        .scan(0usize, move |depth, (idx, ch)| {
            let hit = match ch {
                '[' | '(' => {
                    *depth += 1;
                    false
                }
                ']' | ')' => {
                    *depth = depth.saturating_sub(1);
                    false
                }
                _ => ch == needle && *depth == 0,
            };
            Some(hit.then_some(idx))
        })
        .flatten()
}

/// Splits `md:hover:text-red-500` into `["md", "hover"]` and `text-red-500`,
/// ignoring colons inside brackets and parentheses.
pub fn parse_variants(class: &str) -> (Vec<&str>, &str) {
    let mut variants = Vec::new();
    let mut rest = class;
    let mut consumed = 0usize;
    for colon in top_level(class, ':') {
        let (variant, tail) = class[consumed..].split_at(colon - consumed);
        variants.push(variant);
        consumed = colon + 1;
        rest = &tail[1..];
    }
    (variants, rest)
}

/// `!font-bold` and `font-bold!` both mean important.
fn split_important(base: &str) -> (&str, bool) {
    if let Some(rest) = base.strip_prefix('!') {
        return (rest, true);
    }
    if let Some(rest) = base.strip_suffix('!') {
        return (rest, true);
    }
    (base, false)
}

/// Splits at the last `/` outside brackets: `bg-red-500/50`,
/// `bg-[#123]/[0.35]`.
fn split_modifier(base: &str) -> Option<(&str, &str)> {
    let idx = top_level(base, '/').last()?;
    let (head, modifier) = (&base[..idx], &base[idx + 1..]);
    if head.is_empty() || modifier.is_empty() {
        return None;
    }
    Some((head, modifier))
}

fn opacity_percentage(modifier: &str) -> Option<String> {
    if modifier.bytes().all(|b| b.is_ascii_digit()) {
        let value = modifier.parse::<u32>().ok().filter(|v| *v <= 100)?;
        return Some(format!("{}%", value));
    }
    let raw = modifier.strip_prefix('[')?.strip_suffix(']')?;
    if let Some(percent) = raw.strip_suffix('%') {
        percent.parse::<f64>().ok()?;
        return Some(raw.to_string());
    }
    let ratio = raw.parse::<f64>().ok().filter(|v| (0.0..=1.0).contains(v))?;
    let percent = (ratio * 100_000.0).round() / 1000.0;
    Some(format!("{}%", percent))
}

/// Keywords such as `auto` have no negative; those tokens match nothing.
fn negate(value: &str) -> Option<String> {
    if value.bytes().all(|b| b == b'0' || b == b'.') || value == "0px" {
        return Some(value.to_string());
    }
    if let Some(positive) = value.strip_prefix('-') {
        return Some(positive.to_string());
    }
    if value.starts_with(|ch: char| ch.is_ascii_digit() || ch == '.') {
        return Some(format!("-{}", value));
    }
    value.contains('(').then(|| format!("calc({} * -1)", value))
}

/// `[mask-type:luminance]` sets a property directly.
fn arbitrary_property(base: &str) -> Option<RuleBody> {
    let inner = base.strip_prefix('[')?.strip_suffix(']')?;
    let (property, raw) = inner.split_once(':')?;
    let valid_property = !property.is_empty()
        && property
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    if !valid_property {
        return None;
    }
    let value = normalize_arbitrary_value(raw);
    if value.is_empty() || !is_safe_arbitrary(&value) {
        return None;
    }
    Some(RuleBody::single(property, value))
}

fn parse_arbitrary(inner: &str, expected: ValueType) -> Option<String> {
    let (hint, raw) = split_type_hint(inner);
    let value = normalize_arbitrary_value(raw);
    if value.is_empty() || !is_safe_arbitrary(&value) {
        return None;
    }
    accepts(expected, hint, &value).then_some(value)
}

fn split_type_hint(inner: &str) -> (Option<ValueType>, &str) {
    for (prefix, hint) in [
        ("color:", ValueType::Color),
        ("length:", ValueType::Length),
        ("number:", ValueType::Length),
        ("percentage:", ValueType::Length),
        ("any:", ValueType::Any),
    ] {
        if let Some(rest) = inner.strip_prefix(prefix) {
            return (Some(hint), rest);
        }
    }
    (None, inner)
}

fn accepts(expected: ValueType, hint: Option<ValueType>, value: &str) -> bool {
    if expected == ValueType::Any {
        return true;
    }
    if let Some(hint) = hint {
        return hint == expected || hint == ValueType::Any;
    }
    let lower = value.to_ascii_lowercase();
    // A bare variable could be either; the newest template takes it.
    if lower.starts_with("var(") {
        return true;
    }
    match expected {
        ValueType::Color => is_color_like_value(&lower),
        ValueType::Length => !is_color_like_value(&lower) && is_length_like_value(&lower),
        ValueType::Any => true,
    }
}

fn is_color_like_value(lower: &str) -> bool {
    lower.starts_with('#')
        || [
            "rgb(", "rgba(", "hsl(", "hsla(", "hwb(", "lab(", "lch(", "oklab(", "oklch(",
            "color(", "color-mix(",
        ]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
        || matches!(lower, "currentcolor" | "transparent" | "inherit")
}

fn is_length_like_value(lower: &str) -> bool {
    lower.starts_with(|ch: char| ch.is_ascii_digit() || ch == '.' || ch == '-')
        || ["calc(", "min(", "max(", "clamp(", "env("]
            .iter()
            .any(|prefix| lower.starts_with(prefix))
}

/// Rejects values that could escape the declaration they are placed in.
fn is_safe_arbitrary(value: &str) -> bool {
    let mut stack = Vec::new();
    let mut quote: Option<char> = None;
    for ch in value.chars() {
        if matches!(ch, ';' | '{' | '}') {
            return false;
        }
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' | '[' => stack.push(ch),
            ')' => {
                if stack.pop() != Some('(') {
                    return false;
                }
            }
            ']' => {
                if stack.pop() != Some('[') {
                    return false;
                }
            }
            _ => {}
        }
    }
    quote.is_none() && stack.is_empty()
}

/// Arbitrary-value text to CSS: `_` becomes a space (`\_` stays an
/// underscore, underscores inside `url()` are kept), and operators in
/// `calc()` get the spaces CSS requires.
pub(crate) fn normalize_arbitrary_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    let mut quote: Option<char> = None;
    // One entry per open paren: whether it opened a `url(`.
    let mut groups: Vec<bool> = Vec::new();

    while let Some(ch) = chars.next() {
        match (ch, quote) {
            ('\\', _) => match chars.next() {
                Some('_') => out.push('_'),
                Some(escaped) => {
                    out.push('\\');
                    out.push(escaped);
                }
                None => out.push('\\'),
            },
            (_, Some(open)) => {
                if ch == open {
                    quote = None;
                }
                out.push(if ch == '_' && !groups.contains(&true) { ' ' } else { ch });
            }
            ('\'' | '"', None) => {
                quote = Some(ch);
                out.push(ch);
            }
            ('(', None) => {
                let is_url = out
                    .get(out.len().saturating_sub(3)..)
                    .is_some_and(|tail| tail.eq_ignore_ascii_case("url"));
                groups.push(is_url);
                out.push(ch);
            }
            (')', None) => {
                groups.pop();
                out.push(ch);
            }
            ('_', None) if !groups.contains(&true) => out.push(' '),
            _ => out.push(ch),
        }
    }

    let is_calc = out.get(..5).is_some_and(|head| head.eq_ignore_ascii_case("calc("));
    if is_calc { space_operators(&out) } else { out }
}

/// `calc(100%-2rem)` to `calc(100% - 2rem)`. A `+` or `-` counts as an
/// operator only after a number, a unit, `%` or `)`; inside `var(--a-b)` or
/// before a negative literal it is left alone.
fn space_operators(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len() + 8);
    let mut prev: Option<char> = None;
    // Chars in the word ending at `prev`, and whether that word is a number.
    let mut word_len = 0usize;
    let mut numeric = false;

    for ch in expr.chars() {
        if ch.is_whitespace() {
            if !out.ends_with(' ') {
                out.push(' ');
            }
            continue;
        }

        let after_operand = match prev {
            Some(')' | '%') => true,
            Some(p) if p.is_ascii_alphanumeric() => numeric,
            _ => false,
        };
        let operator = match ch {
            '*' | '/' => true,
            '+' | '-' => after_operand,
            _ => false,
        };
        if operator {
            out.truncate(out.trim_end().len());
            out.push(' ');
            out.push(ch);
            out.push(' ');
            prev = Some(ch);
            word_len = 0;
            numeric = false;
            continue;
        }

        let in_word = !out.ends_with(' ')
            && prev.is_some_and(|p| p.is_ascii_alphanumeric() || matches!(p, '.' | '-' | '%'));
        let digit = ch.is_ascii_digit() || ch == '.';
        if in_word {
            numeric = numeric || (word_len == 1 && prev == Some('-') && digit);
            word_len += 1;
        } else {
            numeric = digit;
            word_len = 1;
        }
        out.push(ch);
        prev = Some(ch);
    }
    out
}

/// Escapes a class name for use as a CSS class selector.
pub fn escape_selector(class: &str) -> String {
    let mut escaped = String::with_capacity(class.len() * 2);

    for (idx, ch) in class.chars().enumerate() {
        if idx == 0 && ch.is_ascii_digit() {
            escaped.push_str(&format!("\\3{} ", ch));
            continue;
        }
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii() {
            escaped.push(ch);
        } else {
            escaped.push('\\');
            escaped.push(ch);
        }
    }

    escaped
}
