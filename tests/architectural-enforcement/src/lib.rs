//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles
//! on the chatstream core:
//! - No sleep() calls in production code
//! - No panicking shortcuts (`.unwrap()`, `.expect(`, `unreachable!`, `panic!`)
//!   in production code
//! - No terminal or UI dependencies in the core crate
//!
//! The helpers here locate the workspace and split source files into their
//! production part and their `#[cfg(test)]` part.

use std::fs;
use std::path::{Path, PathBuf};

/// Root of the workspace this crate lives in
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// All `.rs` files below `dir`, relative to the workspace root
#[must_use]
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let root = workspace_root().join(dir);
    assert!(root.exists(), "{} does not exist", root.display());

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();
    files
}

/// Lines of a source file up to its test module, numbered from 1
///
/// Comment lines are skipped, and trailing `//` comments are cut off.
#[must_use]
pub fn production_lines(path: &Path) -> Vec<(usize, String)> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };

    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| line.trim() != "#[cfg(test)]")
        .filter(|(_, line)| !line.trim_start().starts_with("//"))
        .map(|(idx, line)| {
            let code = line.split("//").next().unwrap_or(line);
            (idx + 1, code.to_string())
        })
        .collect()
}

/// Every production line of the files under `dir` that matches `forbidden`
#[must_use]
pub fn find_violations(dir: &str, forbidden: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();
    for file in rust_files(dir) {
        for (line_number, code) in production_lines(&file) {
            if forbidden.iter().any(|pattern| code.contains(pattern)) {
                violations.push(format!(
                    "{}:{} - {}",
                    file.display(),
                    line_number,
                    code.trim()
                ));
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let dir = std::env::temp_dir().join(format!("arch-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("sample.rs");
        fs::write(
            &file,
            concat!(
                "fn a() {}\n",
                "// note .unwrap()\n",
                "fn b() { x(); } // y.unwrap()\n",
                "#[cfg(test)]\n",
                "mod tests { fn c() { d.unwrap(); } }\n",
            ),
        )
        .unwrap();

        let lines = production_lines(&file);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].0, 3);
        assert!(!lines[1].1.contains("unwrap"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_find_violations_sees_disguised_panics() {
        let dir = std::env::temp_dir().join(format!("arch-panics-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("config.rs"),
            "fn a() -> Url {\n    Url::parse(X).unwrap_or_else(|_| unreachable!())\n}\n",
        )
        .unwrap();

        let dir_str = dir.to_string_lossy().to_string();
        let violations = find_violations(&dir_str, &["unreachable!(", "panic!("]);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("config.rs:2"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
