//! Integration Test: Client Core Boundaries
//!
//! The client core must stay embeddable in any surface:
//! - no UI framework dependencies
//! - no blocking HTTP client
//! - no `unwrap()` / `expect()` in production code (errors are returned)
//!
//! Test modules (everything after `#[cfg(test)]`) are exempt.

use std::fs;
use std::path::{Path, PathBuf};

const FORBIDDEN_UI_CRATES: &[&str] = &[
    "ratatui", "crossterm", "egui", "eframe", "iced", "gtk", "tauri", "yew", "dioxus", "slint",
];

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn core_dir() -> PathBuf {
    workspace_root().join("hotline").join("core")
}

/// Production part of a source file: everything before the first test module
fn production_lines(content: &str) -> Vec<(usize, &str)> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .filter(|(_, line)| !line.trim_start().starts_with("//"))
        .map(|(idx, line)| (idx + 1, line))
        .collect()
}

fn for_each_source(dir: &Path, mut f: impl FnMut(&Path, &str)) {
    for entry in walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
    {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(entry.path()) {
            f(entry.path(), &content);
        }
    }
}

fn report(kind: &str, violations: &[String]) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n❌ {kind} found in hotline-core:");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!("\nFound {} violation(s): {kind}", violations.len());
}

#[test]
fn test_core_has_no_ui_dependencies() {
    let manifest = fs::read_to_string(core_dir().join("Cargo.toml"))
        .expect("hotline-core manifest should be readable");

    let violations: Vec<String> = manifest
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let name = line.split(['=', ' ', '.']).next()?;
            FORBIDDEN_UI_CRATES
                .contains(&name)
                .then(|| format!("Cargo.toml - UI dependency: {line}"))
        })
        .collect();

    report("UI framework dependencies", &violations);
}

#[test]
fn test_core_has_no_blocking_http() {
    let mut violations = Vec::new();
    for_each_source(&core_dir().join("src"), |path, content| {
        for (line_number, line) in production_lines(content) {
            if line.contains("reqwest::blocking") {
                violations.push(format!("{}:{line_number} - {}", path.display(), line.trim()));
            }
        }
    });

    report("Blocking HTTP client", &violations);
}

#[test]
fn test_core_production_code_does_not_panic_on_errors() {
    let mut violations = Vec::new();
    for_each_source(&core_dir().join("src"), |path, content| {
        for (line_number, line) in production_lines(content) {
            if line.contains(".unwrap()") || line.contains(".expect(") {
                violations.push(format!("{}:{line_number} - {}", path.display(), line.trim()));
            }
        }
    });

    report("unwrap()/expect() in production code", &violations);
}

#[test]
fn test_core_sources_are_scanned() {
    let mut files = 0;
    for_each_source(&core_dir().join("src"), |_, _| files += 1);
    assert!(files > 5, "expected to find hotline-core sources, found {files}");
}
