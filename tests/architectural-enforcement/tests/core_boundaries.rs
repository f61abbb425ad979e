//! Integration Test: Core Boundaries
//!
//! **Policy**: `chatstream-core` is headless. It MUST NOT depend on terminal,
//! UI or CLI crates, and its production code MUST NOT panic on recoverable
//! failures: errors are folded into session state instead.

use std::fs;

use architectural_enforcement::{find_violations, workspace_root};

const UI_CRATES: &[&str] = &[
    "ratatui",
    "crossterm",
    "clap",
    "tracing-subscriber",
    "chatstream-cli",
];

const PANICKING_SHORTCUTS: &[&str] = &[
    ".unwrap()",
    ".expect(",
    "unreachable!(",
    "panic!(",
    "todo!(",
    "unimplemented!(",
];

#[test]
fn test_core_has_no_ui_dependencies() {
    let manifest = workspace_root().join("chatstream/core/Cargo.toml");
    let content = fs::read_to_string(&manifest).unwrap();

    let violations: Vec<_> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter(|line| {
            UI_CRATES.iter().any(|name| {
                line.starts_with(&format!("{name} ")) || line.starts_with(&format!("{name}="))
            })
        })
        .collect();

    assert!(
        violations.is_empty(),
        "chatstream-core must stay headless, found: {violations:?}"
    );
}

#[test]
fn test_no_panicking_shortcuts_in_core() {
    let violations = find_violations("chatstream/core/src", PANICKING_SHORTCUTS);

    assert!(
        violations.is_empty(),
        "Propagate or fold errors instead of panicking:\n{}",
        violations.join("\n")
    );
}
