// src/core/context.rs

//! Target classification and the per-target `CommandContext`.

use std::path::{Component, Path, PathBuf};
use url::Url;

/// File-derived values available to command templates and scripts.
///
/// Built once per resolution from the target's absolute path and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    /// The target exactly as given.
    pub file: String,
    /// The absolute, lexically cleaned form of the target.
    pub abs_file: String,
    pub dir: String,
    pub base: String,
    /// `base` without `ext`.
    pub name: String,
    /// Extension including the leading dot, or empty.
    pub ext: String,
}

impl CommandContext {
    /// Derives the context for a target.
    ///
    /// URLs are not filesystem paths: their `dir`/`base` come from the URL itself.
    pub fn from_target(target: &str) -> Self {
        if is_url(target) {
            return Self::from_url_target(target);
        }

        let absolute = absolutize(Path::new(target));
        let clean = dunce::simplified(&absolute);
        let abs_file = clean.to_string_lossy().into_owned();

        let base = clean
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| abs_file.clone());
        let dir = clean
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| abs_file.clone());
        let ext = extension_of(&base).to_string();
        let name = base
            .strip_suffix(ext.as_str())
            .unwrap_or(&base)
            .to_string();

        Self {
            file: target.to_string(),
            abs_file,
            dir,
            base,
            name,
            ext,
        }
    }

    fn from_url_target(target: &str) -> Self {
        let trimmed = target.trim_end_matches('/');
        let (dir, base) = match trimmed.rsplit_once('/') {
            Some((dir, base)) => (dir.to_string(), base.to_string()),
            None => (String::new(), trimmed.to_string()),
        };
        let ext = extension_of(&base).to_string();
        let name = base
            .strip_suffix(ext.as_str())
            .unwrap_or(&base)
            .to_string();
        Self {
            file: target.to_string(),
            abs_file: target.to_string(),
            dir,
            base,
            name,
            ext,
        }
    }
}

/// Parses the target as a URL with a real scheme.
///
/// Single-letter schemes are rejected so Windows drive paths (`C:\notes.txt`) stay files.
pub fn parse_url(target: &str) -> Option<Url> {
    Url::parse(target)
        .ok()
        .filter(|url| url.scheme().len() > 1)
}

/// Returns true if the target is a URL with a scheme.
pub fn is_url(target: &str) -> bool {
    parse_url(target).is_some()
}

/// Returns true if the target exists on the local filesystem.
pub fn target_exists(target: &str) -> bool {
    Path::new(target).exists()
}

/// Returns true if the target is a URL or an existing local path.
pub fn is_file_or_url(target: &str) -> bool {
    is_url(target) || target_exists(target)
}

/// Returns the extension of the last path element, including the dot.
///
/// Mirrors shell conventions: `foo.bar.txt` -> `.txt`, `.bashrc` -> `.bashrc`,
/// `Makefile` -> ``.
pub fn extension_of(path: &str) -> &str {
    let last_element_start = path
        .rfind(|c: char| std::path::is_separator(c) || c == '/')
        .map(|i| i + 1)
        .unwrap_or(0);
    let last_element = path.get(last_element_start..).unwrap_or("");
    match last_element.rfind('.') {
        Some(dot) => last_element.get(dot..).unwrap_or(""),
        None => "",
    }
}

/// Makes a path absolute against the current directory and removes `.`/`..` lexically.
fn absolutize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|e| {
        log::debug!(
            "Could not make '{}' absolute ({}); using it as given.",
            path.display(),
            e
        );
        path.to_path_buf()
    });

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping past the root is a no-op, as in `cd /..`.
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_splits_multi_dot_file_name() {
        let ctx = CommandContext::from_target("/tmp/foo.bar.txt");
        assert_eq!(ctx.file, "/tmp/foo.bar.txt");
        assert_eq!(ctx.dir, "/tmp");
        assert_eq!(ctx.base, "foo.bar.txt");
        assert_eq!(ctx.name, "foo.bar");
        assert_eq!(ctx.ext, ".txt");
    }

    #[test]
    fn test_context_keeps_given_file_but_absolutizes_dir() {
        let ctx = CommandContext::from_target("notes/../a.txt");
        assert_eq!(ctx.file, "notes/../a.txt");
        let cwd = std::env::current_dir().unwrap();
        let expected_dir = dunce::simplified(&cwd).to_string_lossy().into_owned();
        assert_eq!(ctx.dir, expected_dir);
        assert_eq!(ctx.base, "a.txt");
        assert_eq!(ctx.name, "a");
    }

    #[test]
    fn test_context_for_file_without_extension() {
        let ctx = CommandContext::from_target("/srv/Makefile");
        assert_eq!(ctx.ext, "");
        assert_eq!(ctx.name, "Makefile");
    }

    #[test]
    fn test_context_for_url_uses_url_segments() {
        let ctx = CommandContext::from_target("https://example.com/docs/page.html");
        assert_eq!(ctx.abs_file, "https://example.com/docs/page.html");
        assert_eq!(ctx.dir, "https://example.com/docs");
        assert_eq!(ctx.base, "page.html");
        assert_eq!(ctx.name, "page");
        assert_eq!(ctx.ext, ".html");
    }

    #[test]
    fn test_extension_of_follows_last_element() {
        assert_eq!(extension_of("a.txt"), ".txt");
        assert_eq!(extension_of("dir.d/file"), "");
        assert_eq!(extension_of(".bashrc"), ".bashrc");
        assert_eq!(extension_of("archive.tar.GZ"), ".GZ");
    }

    #[test]
    fn test_url_detection() {
        assert!(is_url("https://example.com"));
        assert!(is_url("mailto:someone@example.com"));
        assert!(!is_url("a.txt"));
        assert!(!is_url("/tmp/a.txt"));
        assert!(!is_url(r"C:\notes.txt"));
    }
}
