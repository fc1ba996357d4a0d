//! Internal import graph of a Python code base.
//!
//! DESIGN
//! ======
//! Pull request feedback needs the code a changed file depends on. For a
//! Python repository that is the set of internal modules it imports. This
//! module scans `.py` sources line by line (joining bracketed and
//! backslash continuations, skipping triple-quoted blocks) and resolves
//! `import a.b` and `from ..x import y` statements to dotted module names.
//!
//! A module name is internal when it equals, or lives under, a top-level
//! package of the root (a directory holding `__init__.py`) or one of the
//! caller's group prefixes. For `from m import n`, the graph records
//! `m.n` when that is internal (the imported name may be a submodule or a
//! function), otherwise `m`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use walkdir::WalkDir;

static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^import\s+(.+)$").expect("import regex is valid"));
static FROM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^from\s+(\.*)\s*([\w.]*)\s+import\s+(.+)$").expect("from regex is valid"));

#[derive(Debug, thiserror::Error)]
pub enum DepsError {
    #[error("failed to walk {path}: {source}")]
    Walk { path: PathBuf, source: walkdir::Error },
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
}

// =============================================================================
// IMPORT STATEMENTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStmt {
    /// `import a.b.c` (one per comma-separated name).
    Import(String),
    /// `from <dots><module> import <names>`.
    From { level: usize, module: Option<String>, names: Vec<String> },
}

/// Extract import statements from Python source.
#[must_use]
pub fn parse_imports(source: &str) -> Vec<ImportStmt> {
    let mut out = Vec::new();
    for statement in logical_lines(source) {
        if let Some(caps) = IMPORT_RE.captures(&statement) {
            out.extend(split_names(&caps[1]).into_iter().map(ImportStmt::Import));
        } else if let Some(caps) = FROM_RE.captures(&statement) {
            let module = Some(caps[2].to_string()).filter(|m| !m.is_empty());
            let names = split_names(&caps[3]);
            out.push(ImportStmt::From { level: caps[1].len(), module, names });
        }
    }
    out
}

/// Split `a as b, (c, d)` into `["a", "c", "d"]`.
fn split_names(raw: &str) -> Vec<String> {
    raw.replace(['(', ')'], " ")
        .split(',')
        .filter_map(|part| part.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Join physical lines into logical statements that may hold an import.
/// Comments and triple-quoted blocks are dropped.
fn logical_lines(source: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending = String::new();
    let mut depth: i32 = 0;
    let mut in_docstring: Option<&str> = None;

    for raw in source.lines() {
        let line = raw.trim();
        if let Some(quote) = in_docstring {
            if line.contains(quote) {
                in_docstring = None;
            }
            continue;
        }
        if pending.is_empty() {
            if let Some(quote) = ["\"\"\"", "'''"].into_iter().find(|q| line.starts_with(q)) {
                if line.len() < 6 || !line[3..].contains(quote) {
                    in_docstring = Some(quote);
                }
                continue;
            }
        }

        let (code, delta) = scan_code(line);
        let code = code.trim_end();
        let (code, continued) = match code.strip_suffix('\\') {
            Some(stripped) => (stripped, true),
            None => (code, false),
        };
        depth += delta;
        if !pending.is_empty() {
            pending.push(' ');
        }
        pending.push_str(code.trim());

        if depth <= 0 && !continued {
            depth = 0;
            if !pending.is_empty() {
                out.push(std::mem::take(&mut pending));
            }
        }
    }
    if !pending.is_empty() {
        out.push(pending);
    }
    out
}

/// Cut a physical line at its comment and count its bracket balance.
/// Quoted strings are skipped, so `"(#"` neither opens a bracket nor
/// starts a comment.
fn scan_code(line: &str) -> (&str, i32) {
    let mut depth = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, ch) in line.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '#' => return (&line[..i], depth),
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
    }
    (line, depth)
}

// =============================================================================
// MODULE NAMES
// =============================================================================

/// Dotted module name of a path relative to the project root:
/// `src/pkg/mod.py` -> `src.pkg.mod`, `src/pkg/__init__.py` -> `src.pkg`.
#[must_use]
pub fn module_name(relative: &str) -> String {
    let dotted = relative.replace(['/', '\\'], ".");
    let dotted = dotted.strip_suffix(".py").unwrap_or(&dotted);
    dotted.strip_suffix(".__init__").unwrap_or(dotted).to_string()
}

/// Candidate source files for a dotted name, most specific first.
/// Every prefix is tried since `a.b.func` lives in `a/b.py`.
#[must_use]
pub fn module_file_candidates(module: &str) -> Vec<String> {
    let parts: Vec<&str> = module.split('.').filter(|p| !p.is_empty()).collect();
    let mut out = Vec::new();
    for len in (1..=parts.len()).rev() {
        let base = parts[..len].join("/");
        out.push(format!("{base}.py"));
        out.push(format!("{base}/__init__.py"));
    }
    out
}

// =============================================================================
// GRAPH
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Scan `root/package` (or all of `root` when `package` is empty).
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be walked or a source file
    /// cannot be read.
    pub fn build(root: &Path, package: &str, groups: &BTreeSet<String>) -> Result<Self, DepsError> {
        let mut internal = internal_packages(root)?;
        internal.extend(groups.iter().cloned());
        let is_internal =
            |name: &str| internal.iter().any(|pkg| name == pkg || name.strip_prefix(pkg.as_str()).is_some_and(|rest| rest.starts_with('.')));

        let scan_root = if package.is_empty() { root.to_path_buf() } else { root.join(package) };
        let mut edges: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for entry in WalkDir::new(&scan_root).sort_by_file_name() {
            let entry = entry.map_err(|source| DepsError::Walk { path: scan_root.clone(), source })?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "py") {
                continue;
            }
            let Some(relative) = relative_str(root, path) else {
                continue;
            };
            let current = module_name(&relative);
            if !is_internal(&current) {
                continue;
            }

            let source = std::fs::read_to_string(path).map_err(|source| DepsError::Read { path: path.to_path_buf(), source })?;
            let is_package_init = path.file_name().is_some_and(|name| name == "__init__.py");
            let anchor = if is_package_init { format!("{current}.__init__") } else { current.clone() };

            let imports = edges.entry(current.clone()).or_default();
            for stmt in parse_imports(&source) {
                for target in resolve(&stmt, &anchor, &is_internal) {
                    if target != current {
                        imports.insert(target);
                    }
                }
            }
        }

        Ok(Self { edges })
    }

    /// Internal imports of one module.
    #[must_use]
    pub fn dependencies_of(&self, module: &str) -> Option<&BTreeSet<String>> {
        self.edges.get(module)
    }

    /// Union of the internal imports of the given changed files.
    #[must_use]
    pub fn dependencies_for_files(&self, files: &[String]) -> BTreeSet<String> {
        files
            .iter()
            .filter_map(|file| self.edges.get(&module_name(file)))
            .flatten()
            .cloned()
            .collect()
    }

    /// Pretty JSON object of module -> sorted imports, omitting modules
    /// without internal imports.
    #[must_use]
    pub fn to_json(&self) -> String {
        let non_empty: BTreeMap<&String, &BTreeSet<String>> =
            self.edges.iter().filter(|(_, deps)| !deps.is_empty()).collect();
        serde_json::to_string_pretty(&non_empty).unwrap_or_else(|_| "{}".to_string())
    }
}

fn resolve(stmt: &ImportStmt, anchor: &str, is_internal: &impl Fn(&str) -> bool) -> Vec<String> {
    match stmt {
        ImportStmt::Import(name) => {
            if is_internal(name) {
                vec![name.clone()]
            } else {
                Vec::new()
            }
        }
        ImportStmt::From { level, module, names } => {
            let base = if *level == 0 {
                module.clone().unwrap_or_default()
            } else {
                let parts: Vec<&str> = anchor.split('.').collect();
                let kept = parts.len().saturating_sub(*level);
                let mut base = parts[..kept].join(".");
                if let Some(module) = module {
                    if !base.is_empty() {
                        base.push('.');
                    }
                    base.push_str(module);
                }
                base
            };

            let mut out = Vec::new();
            for name in names {
                let full = if base.is_empty() { name.clone() } else { format!("{base}.{name}") };
                if is_internal(&full) {
                    out.push(full);
                } else if !base.is_empty() && is_internal(&base) {
                    out.push(base.clone());
                }
            }
            out
        }
    }
}

fn internal_packages(root: &Path) -> Result<BTreeSet<String>, DepsError> {
    let entries = std::fs::read_dir(root).map_err(|source| DepsError::Read { path: root.to_path_buf(), source })?;
    Ok(entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().join("__init__.py").is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect())
}

fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative.components().filter_map(|c| c.as_os_str().to_str()).collect();
    Some(parts.join("/"))
}

#[cfg(test)]
#[path = "deps_test.rs"]
mod tests;
