use std::fs;

use stylesmith::{
    compile, CancellationToken, Config, Corpus, Engine, EngineError, Plugin, PluginContext,
    PluginError, RuleBody,
};

fn config_from(toml: &str) -> Config {
    Config::from_toml_str(toml).expect("config should parse")
}

fn default_engine() -> Engine {
    Engine::new(&config_from(r#"content = ["**/*.html"]"#)).expect("engine")
}

struct Button {
    name: &'static str,
    color: &'static str,
}

impl Plugin for Button {
    fn name(&self) -> &str {
        self.name
    }

    fn register(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        ctx.add_static("btn", RuleBody::single("color", self.color));
        Ok(())
    }
}

#[test]
fn repeated_builds_are_byte_identical() {
    let engine = default_engine();
    let corpus = Corpus::in_memory([
        ("a.html", "<div class=\"md:flex p-4 hover:bg-blue-500 text-[14px]\"></div>"),
        ("b.html", "<p class=\"mt-4 -mx-2 bg-red-500/50 dark:text-white\">x</p>"),
    ]);

    let first = engine.build(&corpus, &CancellationToken::new()).expect("first build");
    let second = engine.build(&corpus, &CancellationToken::new()).expect("second build");
    assert_eq!(first.css, second.css);
    assert_eq!(first.rules_emitted, second.rules_emitted);
}

#[test]
fn extend_adds_to_the_base_and_overrides_replace_it() {
    let extended = Engine::new(&config_from(
        r##"
content = ["**/*.html"]
[theme.extend.colors]
brand = "#ff5500"
"##,
    ))
    .expect("extended engine");
    let css = extended.generate(["bg-brand", "bg-red-500"]);
    assert!(css.contains("background-color: #ff5500;"));
    assert!(css.contains("background-color: #ef4444;"));

    let overridden = Engine::new(&config_from(
        r##"
content = ["**/*.html"]
[theme.colors]
brand = "#ff5500"
"##,
    ))
    .expect("overridden engine");
    let css = overridden.generate(["bg-brand", "bg-red-500"]);
    assert!(css.contains(".bg-brand {"));
    assert!(!css.contains(".bg-red-500 {"));
}

#[test]
fn later_plugin_wins_a_class_name() {
    let config = config_from(r#"content = ["**/*.html"]"#);
    let plugins: Vec<Box<dyn Plugin>> = vec![
        Box::new(Button { name: "first", color: "red" }),
        Box::new(Button { name: "second", color: "blue" }),
    ];
    let engine = Engine::with_plugins(&config, plugins).expect("engine");
    let css = engine.generate(["btn"]);
    assert!(css.contains(".btn {\n    color: blue;\n  }"));
    assert!(!css.contains("color: red;"));
}

#[test]
fn a_token_in_a_noisy_corpus_yields_one_block() {
    let noise = "lorem ipsum {{ value }} <a href=\"/x\"> const x = 1; ".repeat(200);
    let corpus = Corpus::in_memory([
        ("noise.js", noise.clone()),
        ("page.html", format!("{}<span class=\"underline\"></span>{}", noise, noise)),
        ("more.txt", noise),
    ]);
    let output = default_engine()
        .build(&corpus, &CancellationToken::new())
        .expect("build");
    assert_eq!(output.css.matches(".underline {").count(), 1);
    assert_eq!(output.files_scanned, 3);
}

#[test]
fn variants_wrap_in_peel_order() {
    let css = default_engine().generate(["md:hover:underline"]);
    assert!(css.contains(
        "  @media (min-width: 768px) {\n    .md\\:hover\\:underline:hover {\n      text-decoration-line: underline;\n    }\n  }"
    ));
}

#[test]
fn extended_font_family_example() {
    let engine = Engine::new(&config_from(
        r#"
content = ["**/*.html"]
[theme.extend.fontFamily]
sans = ["Foo", "sans-serif"]
"#,
    ))
    .expect("engine");
    let corpus = Corpus::in_memory([(
        "index.html",
        "<div class=\"font-sans text-center nonsense-xyz\"></div>",
    )]);
    let output = engine.build(&corpus, &CancellationToken::new()).expect("build");

    assert!(output.css.contains(".font-sans {\n    font-family: Foo, sans-serif;\n  }"));
    assert!(output.css.contains(".text-center {\n    text-align: center;\n  }"));
    assert!(!output.css.contains("nonsense"));
}

#[test]
fn compile_reads_globs_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("src/nested")).expect("mkdir");
    fs::create_dir_all(dir.path().join("node_modules/pkg")).expect("mkdir");
    fs::write(dir.path().join("src/index.html"), "<main class=\"grid gap-4\"></main>")
        .expect("write html");
    fs::write(dir.path().join("src/nested/app.js"), "el.className = 'rounded-lg shadow'")
        .expect("write js");
    fs::write(dir.path().join("node_modules/pkg/index.html"), "<b class=\"italic\"></b>")
        .expect("write dependency");

    let config = config_from(
        r#"
content = ["**/*.{html,js}"]
minify = true
"#,
    );
    let output = compile(&config, dir.path()).expect("compile");
    assert_eq!(output.files_scanned, 2);
    assert!(output.css.starts_with("@layer base,components,utilities;"));
    for selector in [".grid{", ".gap-4{", ".rounded-lg{", ".shadow{"] {
        assert!(output.css.contains(selector), "missing {}", selector);
    }
    assert!(!output.css.contains(".italic{"));
}

#[test]
fn compile_rejects_malformed_globs_before_scanning() {
    let config = config_from(r#"content = ["src/**/*.{html"]"#);
    assert!(matches!(compile(&config, "."), Err(EngineError::Config(_))));
}

#[test]
fn class_dark_mode_and_forms_plugin() {
    let engine = Engine::new(&config_from(
        r#"
content = ["**/*.html"]
darkMode = "class"
plugins = [{ name = "@tailwindcss/forms", strategy = "class" }]
"#,
    ))
    .expect("engine");
    let css = engine.generate(["dark:bg-black", "form-input"]);
    assert!(css.contains(":is(.dark .dark\\:bg-black) {"));
    assert!(css.contains("@layer components {\n  .form-input {"));
    assert!(css.contains(".form-input:focus {"));
    assert!(!css.contains("[type='text']"));
}

#[test]
fn config_with_every_builtin_plugin() {
    let engine = Engine::new(&config_from(
        r#"
content = ["./index.html", "./src/js/main.js", "./src/css/main.css", "./src/elm/**/*.elm"]
plugins = ["@tailwindcss/forms", "@tailwindcss/typography", "@tailwindcss/container-queries"]

[theme.extend]

[theme.fontFamily]
sans = ["Name Sans", "sans-serif"]
"#,
    ))
    .expect("engine");
    let corpus = Corpus::in_memory([(
        "src/elm/Main.elm",
        "div [ class \"font-sans prose lg:prose-xl @container\" ] [ div [ class \"@md:grid font-mono\" ] [] ]",
    )]);
    let output = engine.build(&corpus, &CancellationToken::new()).expect("build");

    assert!(output.css.contains("font-family: Name Sans, sans-serif;"));
    assert!(!output.css.contains(".font-mono {"));
    assert!(output.css.contains("[type='checkbox']"));
    assert!(output.css.contains(".prose {"));
    assert!(output.css.contains("@container (min-width: 28rem)"));
    assert!(output.warnings.is_empty());
}
