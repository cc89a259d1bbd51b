//! Content scanning.
//!
//! Files are matched by glob, read one at a time through a [`SourceReader`],
//! and cut into [`CandidateToken`]s by a purely lexical pass. The scanner
//! over-generates on purpose: anything that looks like a class name is
//! emitted and the matcher sorts out the rest. [`Corpus::candidates`]
//! yields every occurrence; [`Corpus::scan_parallel`] keeps the first.

use crate::cancel::{CancellationToken, Cancelled};
use crate::error::{ConfigError, ScanError, ScanWarning};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const MAX_TOKEN_LEN: usize = 256;

/// A class-like substring lifted from a source file. Carries no meaning until
/// the matcher finds a rule for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateToken(String);

impl CandidateToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opens a byte stream for a matched file.
pub trait SourceReader: Send + Sync {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(std::fs::File::open(path)?))
    }
}

/// Serves file contents the caller already holds.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    files: BTreeMap<PathBuf, Arc<[u8]>>,
}

impl MemoryReader {
    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        let bytes: Vec<u8> = contents.into();
        self.files.insert(path.into(), Arc::from(bytes));
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }
}

impl SourceReader for MemoryReader {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        let contents = self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no source named {}", path.display()))
        })?;
        Ok(Box::new(Cursor::new(contents)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub base_path: PathBuf,
    pub respect_gitignore: bool,
    pub include_node_modules: bool,
    pub include_binary_files: bool,
    pub include_lock_files: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            respect_gitignore: true,
            include_node_modules: false,
            include_binary_files: false,
            include_lock_files: false,
        }
    }
}

/// The set of files a build reads, plus the reader that opens them.
#[derive(Clone)]
pub struct Corpus {
    files: Vec<PathBuf>,
    reader: Arc<dyn SourceReader>,
}

impl fmt::Debug for Corpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Corpus").field("files", &self.files).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Distinct tokens in first-seen order (files in path order).
    pub tokens: Vec<CandidateToken>,
    pub files_scanned: usize,
    pub warnings: Vec<ScanWarning>,
}

impl Corpus {
    pub fn new(files: Vec<PathBuf>, reader: Arc<dyn SourceReader>) -> Self {
        Self { files, reader }
    }

    /// Resolves `patterns` on disk and reads matches from the filesystem.
    pub fn from_globs(patterns: &[String], options: &ScanOptions) -> Result<Self, ScanError> {
        let files = resolve_content(patterns, options)?;
        Ok(Self::new(files, Arc::new(FsReader)))
    }

    /// Builds a corpus from in-memory sources, scanned in path order.
    pub fn in_memory<I, P, C>(sources: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<PathBuf>,
        C: Into<Vec<u8>>,
    {
        let mut reader = MemoryReader::default();
        for (path, contents) in sources {
            reader.insert(path, contents);
        }
        let files = reader.paths().map(Path::to_path_buf).collect();
        Self::new(files, Arc::new(reader))
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// A fresh lazy pass over the corpus. Each call starts from the first file.
    pub fn candidates(&self) -> Candidates<'_> {
        Candidates {
            corpus: self,
            next_file: 0,
            pending: VecDeque::new(),
            warnings: Vec::new(),
        }
    }

    /// Scans every file on the rayon pool. Each worker keeps only its file's
    /// distinct tokens; the merge runs in file order and drops tokens an
    /// earlier file already produced, so the result is the distinct
    /// subsequence of a sequential pass.
    pub fn scan_parallel(&self, cancel: &CancellationToken) -> Result<ScanOutcome, Cancelled> {
        let per_file = self
            .files
            .par_iter()
            .map(|path| {
                if cancel.is_cancelled() {
                    return Err(Cancelled);
                }
                Ok(scan_file(self.reader.as_ref(), path).map(distinct_in_file))
            })
            .collect::<Result<Vec<_>, Cancelled>>()?;

        let mut outcome = ScanOutcome::default();
        let mut seen = HashSet::new();
        for result in per_file {
            match result {
                Ok(tokens) => {
                    outcome.files_scanned += 1;
                    outcome
                        .tokens
                        .extend(tokens.into_iter().filter(|token| seen.insert(token.0.clone())));
                }
                Err(warning) => outcome.warnings.push(warning),
            }
        }
        tracing::debug!(
            files = outcome.files_scanned,
            tokens = outcome.tokens.len(),
            skipped = outcome.warnings.len(),
            "scanned corpus"
        );
        Ok(outcome)
    }
}

/// Lazy candidate stream. Holds at most one file's tokens at a time.
pub struct Candidates<'a> {
    corpus: &'a Corpus,
    next_file: usize,
    pending: VecDeque<CandidateToken>,
    warnings: Vec<ScanWarning>,
}

impl Candidates<'_> {
    /// Files skipped so far in this pass.
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }
}

impl Iterator for Candidates<'_> {
    type Item = CandidateToken;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            let path = self.corpus.files.get(self.next_file)?;
            self.next_file += 1;
            match scan_file(self.corpus.reader.as_ref(), path) {
                Ok(tokens) => self.pending.extend(tokens),
                Err(warning) => self.warnings.push(warning),
            }
        }
    }
}

fn distinct_in_file(tokens: Vec<CandidateToken>) -> Vec<CandidateToken> {
    let mut seen = HashSet::with_capacity(tokens.len());
    tokens
        .into_iter()
        .filter(|token| seen.insert(token.0.clone()))
        .collect()
}

fn scan_file(reader: &dyn SourceReader, path: &Path) -> Result<Vec<CandidateToken>, ScanWarning> {
    let mut bytes = Vec::new();
    let read = reader
        .open(path)
        .and_then(|mut stream| stream.read_to_end(&mut bytes));
    if let Err(err) = read {
        tracing::warn!(path = %path.display(), error = %err, "skipping unreadable source");
        return Err(ScanWarning {
            path: path.to_path_buf(),
            message: err.to_string(),
        });
    }
    Ok(extract_candidates(&bytes))
}

/// Walks `options.base_path` and returns every file matching `patterns`,
/// sorted so that repeated runs see the same order.
pub fn resolve_content(patterns: &[String], options: &ScanOptions) -> Result<Vec<PathBuf>, ScanError> {
    if patterns.is_empty() {
        return Err(ConfigError::EmptyContent.into());
    }
    if !options.base_path.exists() {
        return Err(ScanError::MissingBase(options.base_path.clone()));
    }

    let globset = build_globset(patterns)?;
    let mut paths = Vec::new();
    let mut seen = HashSet::new();

    let mut builder = WalkBuilder::new(&options.base_path);
    builder
        .hidden(false)
        .git_ignore(options.respect_gitignore)
        .git_global(options.respect_gitignore)
        .git_exclude(options.respect_gitignore)
        .require_git(false);
    let walker = builder.build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();
        let relative_path = path.strip_prefix(&options.base_path).unwrap_or(path);
        if !globset.is_match(relative_path) && !globset.is_match(path) {
            continue;
        }
        if should_skip_file(path, options) {
            continue;
        }
        if seen.insert(path.to_path_buf()) {
            paths.push(path.to_path_buf());
        }
    }

    paths.sort();
    tracing::debug!(patterns = patterns.len(), files = paths.len(), "resolved content globs");
    Ok(paths)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let normalized = pattern.strip_prefix("./").unwrap_or(pattern);
        let glob = GlobBuilder::new(normalized)
            .literal_separator(true)
            .build()
            .map_err(|err| ConfigError::InvalidGlob {
                pattern: pattern.clone(),
                message: err.to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|err| ConfigError::InvalidGlob {
        pattern: patterns.join(", "),
        message: err.to_string(),
    })
}

fn should_skip_file(path: &Path, options: &ScanOptions) -> bool {
    if !options.include_node_modules
        && path
            .components()
            .any(|component| component.as_os_str() == "node_modules")
    {
        return true;
    }

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("");
    if !options.include_lock_files && is_common_lock_file(file_name) {
        return true;
    }

    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase());
    if let Some(ext) = ext.as_deref() {
        if !options.include_binary_files && is_binary_extension(ext) {
            return true;
        }
    }

    false
}

fn is_binary_extension(ext: &str) -> bool {
    matches!(
        ext,
        "png"
            | "jpg"
            | "jpeg"
            | "gif"
            | "webp"
            | "ico"
            | "bmp"
            | "tiff"
            | "avif"
            | "mp4"
            | "mov"
            | "webm"
            | "mp3"
            | "wav"
            | "ogg"
            | "zip"
            | "gz"
            | "tgz"
            | "7z"
            | "pdf"
            | "woff"
            | "woff2"
            | "ttf"
            | "otf"
            | "eot"
    )
}

fn is_common_lock_file(file_name: &str) -> bool {
    matches!(
        file_name,
        "package-lock.json"
            | "pnpm-lock.yaml"
            | "yarn.lock"
            | "bun.lockb"
            | "bun.lock"
            | "npm-shrinkwrap.json"
            | "Cargo.lock"
            | "composer.lock"
            | "Gemfile.lock"
            | "poetry.lock"
    )
}

/// Convenience wrapper over [`extract_candidates`] for text input.
pub fn extract_classes(text: &str) -> Vec<String> {
    extract_candidates(text.as_bytes())
        .into_iter()
        .map(|token| token.0)
        .collect()
}

/// Splits raw bytes into class-like tokens. Works on bytes so binary input is
/// harmless: any token that is not valid UTF-8 is dropped.
pub fn extract_candidates(bytes: &[u8]) -> Vec<CandidateToken> {
    let mut out = Vec::new();
    let mut idx = 0;

    while idx < bytes.len() {
        if !is_token_byte(bytes[idx]) && bytes[idx] != b'[' {
            idx += 1;
            continue;
        }
        let end = scan_token(bytes, idx);
        if end == idx {
            idx += 1;
            continue;
        }
        if let Some(token) = accept_token(&bytes[idx..end]) {
            out.push(CandidateToken(token));
        }
        idx = end;
    }

    out
}

fn scan_token(bytes: &[u8], start: usize) -> usize {
    let mut pos = start;
    while pos < bytes.len() {
        let byte = bytes[pos];
        if byte == b'[' {
            let opens_segment = if pos == start {
                bytes
                    .get(pos + 1)
                    .is_some_and(|next| !matches!(next, b'"' | b'\'' | b'`'))
            } else {
                matches!(bytes[pos - 1], b'-' | b':' | b'/' | b'@' | b'!')
            };
            if opens_segment {
                if let Some(close) = find_segment_end(bytes, pos) {
                    pos = close + 1;
                    continue;
                }
            }
            break;
        }
        if !is_token_byte(byte) {
            break;
        }
        pos += 1;
    }
    pos
}

/// Index of the `]` closing the segment opened at `open`, provided it arrives
/// before any whitespace.
fn find_segment_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, byte) in bytes[open..].iter().enumerate() {
        match byte {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            b if b.is_ascii_whitespace() || *b == 0 => return None,
            _ => {}
        }
        if offset > MAX_TOKEN_LEN {
            return None;
        }
    }
    None
}

fn accept_token(raw: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(raw).ok()?;
    let text = text.trim_end_matches('.');
    if is_valid_candidate(text) {
        Some(text.to_string())
    } else {
        None
    }
}

fn is_valid_candidate(token: &str) -> bool {
    if token.is_empty() || token.len() > MAX_TOKEN_LEN {
        return false;
    }
    if token.starts_with('.') || token.starts_with('/') || token.starts_with(':') {
        return false;
    }
    if token.ends_with(':') || token.ends_with('-') || token.ends_with('/') {
        return false;
    }
    if token.chars().any(char::is_control) {
        return false;
    }
    token.bytes().any(|byte| byte.is_ascii_alphabetic())
}

fn is_token_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'-' | b'_' | b':' | b'/' | b'.' | b'!' | b'%' | b'#' | b'@'
        )
}
