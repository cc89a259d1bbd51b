use super::{ThemeTable, ThemeValue, TokenMap};

const SHADES: [&str; 11] = [
    "50", "100", "200", "300", "400", "500", "600", "700", "800", "900", "950",
];

const PALETTE: &[(&str, [&str; 11])] = &[
    (
        "slate",
        [
            "#f8fafc", "#f1f5f9", "#e2e8f0", "#cbd5e1", "#94a3b8", "#64748b", "#475569",
            "#334155", "#1e293b", "#0f172a", "#020617",
        ],
    ),
    (
        "gray",
        [
            "#f9fafb", "#f3f4f6", "#e5e7eb", "#d1d5db", "#9ca3af", "#6b7280", "#4b5563",
            "#374151", "#1f2937", "#111827", "#030712",
        ],
    ),
    (
        "red",
        [
            "#fef2f2", "#fee2e2", "#fecaca", "#fca5a5", "#f87171", "#ef4444", "#dc2626",
            "#b91c1c", "#991b1b", "#7f1d1d", "#450a0a",
        ],
    ),
    (
        "orange",
        [
            "#fff7ed", "#ffedd5", "#fed7aa", "#fdba74", "#fb923c", "#f97316", "#ea580c",
            "#c2410c", "#9a3412", "#7c2d12", "#431407",
        ],
    ),
    (
        "amber",
        [
            "#fffbeb", "#fef3c7", "#fde68a", "#fcd34d", "#fbbf24", "#f59e0b", "#d97706",
            "#b45309", "#92400e", "#78350f", "#451a03",
        ],
    ),
    (
        "yellow",
        [
            "#fefce8", "#fef9c3", "#fef08a", "#fde047", "#facc15", "#eab308", "#ca8a04",
            "#a16207", "#854d0e", "#713f12", "#422006",
        ],
    ),
    (
        "green",
        [
            "#f0fdf4", "#dcfce7", "#bbf7d0", "#86efac", "#4ade80", "#22c55e", "#16a34a",
            "#15803d", "#166534", "#14532d", "#052e16",
        ],
    ),
    (
        "emerald",
        [
            "#ecfdf5", "#d1fae5", "#a7f3d0", "#6ee7b7", "#34d399", "#10b981", "#059669",
            "#047857", "#065f46", "#064e3b", "#022c22",
        ],
    ),
    (
        "teal",
        [
            "#f0fdfa", "#ccfbf1", "#99f6e4", "#5eead4", "#2dd4bf", "#14b8a6", "#0d9488",
            "#0f766e", "#115e59", "#134e4a", "#042f2e",
        ],
    ),
    (
        "sky",
        [
            "#f0f9ff", "#e0f2fe", "#bae6fd", "#7dd3fc", "#38bdf8", "#0ea5e9", "#0284c7",
            "#0369a1", "#075985", "#0c4a6e", "#082f49",
        ],
    ),
    (
        "blue",
        [
            "#eff6ff", "#dbeafe", "#bfdbfe", "#93c5fd", "#60a5fa", "#3b82f6", "#2563eb",
            "#1d4ed8", "#1e40af", "#1e3a8a", "#172554",
        ],
    ),
    (
        "indigo",
        [
            "#eef2ff", "#e0e7ff", "#c7d2fe", "#a5b4fc", "#818cf8", "#6366f1", "#4f46e5",
            "#4338ca", "#3730a3", "#312e81", "#1e1b4b",
        ],
    ),
    (
        "violet",
        [
            "#f5f3ff", "#ede9fe", "#ddd6fe", "#c4b5fd", "#a78bfa", "#8b5cf6", "#7c3aed",
            "#6d28d9", "#5b21b6", "#4c1d95", "#2e1065",
        ],
    ),
    (
        "purple",
        [
            "#faf5ff", "#f3e8ff", "#e9d5ff", "#d8b4fe", "#c084fc", "#a855f7", "#9333ea",
            "#7e22ce", "#6b21a8", "#581c87", "#3b0764",
        ],
    ),
    (
        "pink",
        [
            "#fdf2f8", "#fce7f3", "#fbcfe8", "#f9a8d4", "#f472b6", "#ec4899", "#db2777",
            "#be185d", "#9d174d", "#831843", "#500724",
        ],
    ),
    (
        "rose",
        [
            "#fff1f2", "#ffe4e6", "#fecdd3", "#fda4af", "#fb7185", "#f43f5e", "#e11d48",
            "#be123c", "#9f1239", "#881337", "#4c0519",
        ],
    ),
];

/// The token table the engine ships with. User themes resolve against it.
pub fn default_theme() -> ThemeTable {
    let mut theme = ThemeTable::new();
    theme.set_category("screens", scalars(&[
        ("sm", "640px"),
        ("md", "768px"),
        ("lg", "1024px"),
        ("xl", "1280px"),
        ("2xl", "1536px"),
    ]));
    theme.set_category("colors", colors());
    theme.set_category("spacing", spacing());
    theme.set_category("fontFamily", font_family());
    theme.set_category("fontSize", font_size());
    theme.set_category("fontWeight", scalars(&[
        ("thin", "100"),
        ("extralight", "200"),
        ("light", "300"),
        ("normal", "400"),
        ("medium", "500"),
        ("semibold", "600"),
        ("bold", "700"),
        ("extrabold", "800"),
        ("black", "900"),
    ]));
    theme.set_category("lineHeight", scalars(&[
        ("none", "1"),
        ("tight", "1.25"),
        ("snug", "1.375"),
        ("normal", "1.5"),
        ("relaxed", "1.625"),
        ("loose", "2"),
        ("3", ".75rem"),
        ("4", "1rem"),
        ("5", "1.25rem"),
        ("6", "1.5rem"),
        ("7", "1.75rem"),
        ("8", "2rem"),
        ("9", "2.25rem"),
        ("10", "2.5rem"),
    ]));
    theme.set_category("letterSpacing", scalars(&[
        ("tighter", "-0.05em"),
        ("tight", "-0.025em"),
        ("normal", "0em"),
        ("wide", "0.025em"),
        ("wider", "0.05em"),
        ("widest", "0.1em"),
    ]));
    theme.set_category("borderRadius", scalars(&[
        ("none", "0px"),
        ("sm", "0.125rem"),
        ("DEFAULT", "0.25rem"),
        ("md", "0.375rem"),
        ("lg", "0.5rem"),
        ("xl", "0.75rem"),
        ("2xl", "1rem"),
        ("3xl", "1.5rem"),
        ("full", "9999px"),
    ]));
    theme.set_category("borderWidth", scalars(&[
        ("DEFAULT", "1px"),
        ("0", "0px"),
        ("2", "2px"),
        ("4", "4px"),
        ("8", "8px"),
    ]));
    theme.set_category("opacity", opacity());
    theme.set_category("zIndex", scalars(&[
        ("0", "0"),
        ("10", "10"),
        ("20", "20"),
        ("30", "30"),
        ("40", "40"),
        ("50", "50"),
        ("auto", "auto"),
    ]));
    theme.set_category("maxWidth", scalars(&[
        ("none", "none"),
        ("xs", "20rem"),
        ("sm", "24rem"),
        ("md", "28rem"),
        ("lg", "32rem"),
        ("xl", "36rem"),
        ("2xl", "42rem"),
        ("3xl", "48rem"),
        ("4xl", "56rem"),
        ("5xl", "64rem"),
        ("6xl", "72rem"),
        ("7xl", "80rem"),
        ("full", "100%"),
        ("prose", "65ch"),
    ]));
    theme.set_category("boxShadow", scalars(&[
        ("sm", "0 1px 2px 0 rgb(0 0 0 / 0.05)"),
        ("DEFAULT", "0 1px 3px 0 rgb(0 0 0 / 0.1), 0 1px 2px -1px rgb(0 0 0 / 0.1)"),
        ("md", "0 4px 6px -1px rgb(0 0 0 / 0.1), 0 2px 4px -2px rgb(0 0 0 / 0.1)"),
        ("lg", "0 10px 15px -3px rgb(0 0 0 / 0.1), 0 4px 6px -4px rgb(0 0 0 / 0.1)"),
        ("xl", "0 20px 25px -5px rgb(0 0 0 / 0.1), 0 8px 10px -6px rgb(0 0 0 / 0.1)"),
        ("2xl", "0 25px 50px -12px rgb(0 0 0 / 0.25)"),
        ("inner", "inset 0 2px 4px 0 rgb(0 0 0 / 0.05)"),
        ("none", "none"),
    ]));
    theme
}

fn scalars(pairs: &[(&str, &str)]) -> TokenMap {
    pairs.iter().map(|(key, value)| (*key, *value)).collect()
}

fn colors() -> TokenMap {
    let mut colors = scalars(&[
        ("inherit", "inherit"),
        ("current", "currentColor"),
        ("transparent", "transparent"),
        ("black", "#000"),
        ("white", "#fff"),
    ]);
    for (family, values) in PALETTE {
        let shades = SHADES
            .iter()
            .zip(values.iter())
            .map(|(shade, value)| (*shade, *value))
            .collect::<TokenMap>();
        colors.insert(*family, shades);
    }
    colors
}

fn spacing() -> TokenMap {
    let mut spacing = scalars(&[("px", "1px"), ("0", "0px")]);
    for step in [
        "0.5", "1", "1.5", "2", "2.5", "3", "3.5", "4", "5", "6", "7", "8", "9", "10", "11", "12",
        "14", "16", "20", "24", "28", "32", "36", "40", "44", "48", "52", "56", "60", "64", "72",
        "80", "96",
    ] {
        let Ok(units) = step.parse::<f64>() else {
            continue;
        };
        spacing.insert(step, ThemeValue::Scalar(format!("{}rem", units / 4.0)));
    }
    spacing
}

fn font_family() -> TokenMap {
    TokenMap::from_iter([
        (
            "sans",
            ThemeValue::list([
                "ui-sans-serif",
                "system-ui",
                "sans-serif",
                "\"Apple Color Emoji\"",
                "\"Segoe UI Emoji\"",
                "\"Segoe UI Symbol\"",
                "\"Noto Color Emoji\"",
            ]),
        ),
        (
            "serif",
            ThemeValue::list(["ui-serif", "Georgia", "Cambria", "\"Times New Roman\"", "Times", "serif"]),
        ),
        (
            "mono",
            ThemeValue::list([
                "ui-monospace",
                "SFMono-Regular",
                "Menlo",
                "Monaco",
                "Consolas",
                "\"Liberation Mono\"",
                "\"Courier New\"",
                "monospace",
            ]),
        ),
    ])
}

fn font_size() -> TokenMap {
    [
        ("xs", "0.75rem", "1rem"),
        ("sm", "0.875rem", "1.25rem"),
        ("base", "1rem", "1.5rem"),
        ("lg", "1.125rem", "1.75rem"),
        ("xl", "1.25rem", "1.75rem"),
        ("2xl", "1.5rem", "2rem"),
        ("3xl", "1.875rem", "2.25rem"),
        ("4xl", "2.25rem", "2.5rem"),
        ("5xl", "3rem", "1"),
        ("6xl", "3.75rem", "1"),
        ("7xl", "4.5rem", "1"),
        ("8xl", "6rem", "1"),
        ("9xl", "8rem", "1"),
    ]
    .into_iter()
    .map(|(key, size, line_height)| {
        let options = TokenMap::from_iter([("lineHeight", line_height)]);
        (
            key,
            ThemeValue::List(vec![ThemeValue::scalar(size), ThemeValue::Table(options)]),
        )
    })
    .collect()
}

fn opacity() -> TokenMap {
    let mut opacity = TokenMap::new();
    for step in [0u32, 5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55, 60, 65, 70, 75, 80, 85, 90, 95, 100] {
        opacity.insert(step.to_string(), ThemeValue::Scalar(format!("{}", f64::from(step) / 100.0)));
    }
    opacity
}

#[cfg(test)]
mod tests {
    use super::default_theme;
    use crate::theme::ThemeValue;

    #[test]
    fn ships_palette_and_spacing_scale() {
        let theme = default_theme();
        assert_eq!(
            theme.get("colors.red.500").and_then(ThemeValue::as_scalar),
            Some("#ef4444")
        );
        assert_eq!(
            theme.get("spacing.2.5").and_then(ThemeValue::as_scalar),
            Some("0.625rem")
        );
        assert_eq!(
            theme.get("opacity.50").and_then(ThemeValue::as_scalar),
            Some("0.5")
        );
        let screens = theme.category("screens").expect("screens");
        assert_eq!(
            screens.keys().collect::<Vec<_>>(),
            vec!["sm", "md", "lg", "xl", "2xl"]
        );
    }
}
