//! Hygiene: source-level budgets for the registration core.
//!
//! Scans `registration/src/` (test files excluded) for patterns the core must
//! not grow. Budgets only ever go down.

use std::fs;
use std::path::Path;

struct SourceFile {
    path: String,
    content: String,
}

struct Budget {
    pattern: &'static str,
    max: usize,
    what: &'static str,
}

/// Panics crash the page.
const PANICS: &[Budget] = &[
    Budget { pattern: ".unwrap()", max: 0, what: "unwrap" },
    Budget { pattern: ".expect(", max: 0, what: "expect" },
    Budget { pattern: "panic!(", max: 0, what: "panic!" },
    Budget { pattern: "unreachable!(", max: 0, what: "unreachable!" },
    Budget { pattern: "todo!(", max: 0, what: "todo!" },
    Budget { pattern: "unimplemented!(", max: 0, what: "unimplemented!" },
];

/// Errors dropped without a look.
const SILENT_LOSS: &[Budget] = &[
    Budget { pattern: "let _ =", max: 0, what: "let _ =" },
    Budget { pattern: ".ok()", max: 0, what: ".ok()" },
];

/// The core runs in the browser and the CLI; output goes through `log`, and
/// DOM access belongs to the client crate.
const PORTABILITY: &[Budget] = &[
    Budget { pattern: "println!(", max: 0, what: "println!" },
    Budget { pattern: "eprintln!(", max: 0, what: "eprintln!" },
    Budget { pattern: "web_sys", max: 0, what: "web_sys" },
    Budget { pattern: "wasm_bindgen", max: 0, what: "wasm_bindgen" },
    Budget { pattern: "#[allow(dead_code)]", max: 0, what: "#[allow(dead_code)]" },
];

fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
            continue;
        }
        let path_str = path.to_string_lossy().to_string();
        if !path_str.ends_with(".rs") || path_str.ends_with("_test.rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path: path_str, content });
        }
    }
}

fn hits(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|file| {
            let count = file.content.lines().filter(|line| line.contains(pattern)).count();
            (count > 0).then(|| (file.path.clone(), count))
        })
        .collect()
}

fn check(budgets: &[Budget]) {
    let files = source_files();
    assert!(!files.is_empty(), "no sources found; run from the crate root");
    let mut failures = Vec::new();
    for budget in budgets {
        let found = hits(&files, budget.pattern);
        let count: usize = found.iter().map(|(_, c)| c).sum();
        if count > budget.max {
            let listing: Vec<String> = found.iter().map(|(path, c)| format!("    {path}: {c}")).collect();
            failures.push(format!("  {} budget exceeded: found {count}, max {}\n{}", budget.what, budget.max, listing.join("\n")));
        }
    }
    assert!(failures.is_empty(), "hygiene failures:\n{}", failures.join("\n"));
}

#[test]
fn panic_budgets() {
    check(PANICS);
}

#[test]
fn silent_loss_budgets() {
    check(SILENT_LOSS);
}

#[test]
fn portability_budgets() {
    check(PORTABILITY);
}
