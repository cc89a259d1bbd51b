//! The build facade: theme, plugins, scan, match, assemble.

use crate::assembler::{CssOutput, EmittedRule, Stylesheet};
use crate::cancel::{CancellationToken, Cancelled};
use crate::config::Config;
use crate::error::{EngineError, ScanWarning};
use crate::matcher::{match_token, MatchOptions};
use crate::plugin::core::CorePlugin;
use crate::plugin::pipeline::{self, RuleIndex};
use crate::plugin::{builtin, Plugin};
use crate::scanner::{Corpus, ScanOptions};
use crate::theme::{self, default_theme};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::Path;

const MATCH_CHUNK: usize = 256;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutput {
    pub css: CssOutput,
    pub files_scanned: usize,
    /// Distinct tokens considered after safelist and blocklist.
    pub candidates: usize,
    pub rules_emitted: usize,
    pub warnings: Vec<ScanWarning>,
}

/// A resolved theme plus a frozen rule index, reusable across builds.
#[derive(Debug)]
pub struct Engine {
    index: RuleIndex,
    options: MatchOptions,
    minify: bool,
    safelist: Vec<String>,
    blocklist: HashSet<String>,
}

struct Assembled {
    css: CssOutput,
    candidates: usize,
    rules_emitted: usize,
}

impl Engine {
    pub fn new(config: &Config) -> Result<Self, EngineError> {
        Self::with_plugins(config, Vec::new())
    }

    /// Core runs first, then the configured plugins in order, then `extra`.
    pub fn with_plugins(config: &Config, extra: Vec<Box<dyn Plugin>>) -> Result<Self, EngineError> {
        let theme = theme::resolve(&default_theme(), &config.theme);

        let mut plugins: Vec<Box<dyn Plugin>> =
            vec![Box::new(CorePlugin::new(config.dark_mode.clone()))];
        for reference in &config.plugins {
            plugins.push(builtin(reference)?);
        }
        plugins.extend(extra);

        let index = pipeline::build(theme, &plugins)?;
        Ok(Self {
            index,
            options: MatchOptions {
                important: config.important,
            },
            minify: config.minify,
            safelist: config.safelist.clone(),
            blocklist: config.blocklist.iter().cloned().collect(),
        })
    }

    pub fn index(&self) -> &RuleIndex {
        &self.index
    }

    pub fn build(&self, corpus: &Corpus, cancel: &CancellationToken) -> Result<BuildOutput, EngineError> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let scan = corpus.scan_parallel(cancel)?;
        let assembled = self.assemble(scan.tokens.iter().map(|token| token.as_str()), cancel)?;

        tracing::debug!(
            files = scan.files_scanned,
            candidates = assembled.candidates,
            rules = assembled.rules_emitted,
            warnings = scan.warnings.len(),
            "build finished"
        );
        Ok(BuildOutput {
            css: assembled.css,
            files_scanned: scan.files_scanned,
            candidates: assembled.candidates,
            rules_emitted: assembled.rules_emitted,
            warnings: scan.warnings,
        })
    }

    /// Generates CSS for already-tokenized input.
    pub fn generate<I, S>(&self, tokens: I) -> CssOutput
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = tokens.into_iter().collect::<Vec<_>>();
        // A fresh token is never cancelled.
        self.assemble(tokens.iter().map(|token| token.as_ref()), &CancellationToken::new())
            .map(|assembled| assembled.css)
            .unwrap_or_default()
    }

    pub fn generate_cancellable<I, S>(
        &self,
        tokens: I,
        cancel: &CancellationToken,
    ) -> Result<CssOutput, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = tokens.into_iter().collect::<Vec<_>>();
        let assembled = self.assemble(tokens.iter().map(|token| token.as_ref()), cancel)?;
        Ok(assembled.css)
    }

    fn assemble<'a, I>(&self, tokens: I, cancel: &CancellationToken) -> Result<Assembled, Cancelled>
    where
        I: Iterator<Item = &'a str>,
    {
        let distinct = self.distinct_tokens(tokens);

        let matched = distinct
            .par_chunks(MATCH_CHUNK)
            .map(|chunk| {
                if cancel.is_cancelled() {
                    return Err(Cancelled);
                }
                Ok(chunk
                    .iter()
                    .filter_map(|token| match_token(token, &self.index, &self.options))
                    .collect::<Vec<_>>())
            })
            .collect::<Result<Vec<_>, Cancelled>>()?;

        let mut sheet = Stylesheet::new();
        for rule in self.index.base_rules() {
            sheet.push(EmittedRule::base(rule));
        }
        for rule in matched.into_iter().flatten() {
            sheet.push(rule);
        }
        if cancel.is_cancelled() {
            return Err(Cancelled);
        }

        Ok(Assembled {
            css: sheet.render(self.minify),
            candidates: distinct.len(),
            rules_emitted: sheet.len(),
        })
    }

    /// First-seen order, scanned tokens before the safelist, blocklisted
    /// tokens removed.
    fn distinct_tokens<'s, 'a: 's, I>(&'s self, tokens: I) -> Vec<&'s str>
    where
        I: Iterator<Item = &'a str>,
    {
        let mut seen: HashSet<&'s str> = HashSet::new();
        let mut distinct: Vec<&'s str> = Vec::new();
        for token in tokens {
            if !self.blocklist.contains(token) && seen.insert(token) {
                distinct.push(token);
            }
        }
        for token in &self.safelist {
            if !self.blocklist.contains(token) && !seen.contains(token.as_str()) {
                distinct.push(token.as_str());
            }
        }
        distinct
    }
}

/// Validates `config`, resolves its content globs under `base_path` and runs
/// one build.
pub fn compile(config: &Config, base_path: impl AsRef<Path>) -> Result<BuildOutput, EngineError> {
    config.validate()?;
    let options = ScanOptions {
        base_path: base_path.as_ref().to_path_buf(),
        ..ScanOptions::default()
    };
    let corpus = Corpus::from_globs(&config.content, &options)?;
    Engine::new(config)?.build(&corpus, &CancellationToken::new())
}
