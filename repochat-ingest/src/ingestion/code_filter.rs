use std::path::{Component, Path};

/// File suffixes treated as source code
pub const CODE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".py", ".java", ".go", ".rs"];

/// Directory names never descended into
pub const EXCLUDED_DIRS: &[&str] = &["node_modules", ".git"];

/// Check if a file name (or path) ends with one of the code extensions.
///
/// This is a plain suffix match on the name, so `lib.d.ts` counts and
/// `Makefile` does not.
pub fn is_code_file(name: &str) -> bool {
    CODE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Check if a directory with this name should be skipped during a walk
pub fn is_excluded_dir(name: &str) -> bool {
    EXCLUDED_DIRS.contains(&name)
}

/// Check a repository-relative path as a whole: no excluded directory on the
/// way down and a code file at the end.
///
/// Used where the whole listing arrives at once (GitHub trees) instead of
/// being discovered directory by directory.
pub fn should_ingest_path(relative_path: &Path) -> bool {
    let mut components = relative_path.components().peekable();
    while let Some(component) = components.next() {
        let Component::Normal(name) = component else {
            continue;
        };
        let name = name.to_string_lossy();
        if components.peek().is_none() {
            return is_code_file(&name);
        }
        if is_excluded_dir(&name) {
            return false;
        }
    }
    false
}
