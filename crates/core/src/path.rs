//! Key and path derivation
//!
//! Folders in an object store are a naming convention: every key that starts
//! with a prefix belongs to that prefix. These helpers derive destination keys
//! and local paths from listed keys.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Key separator used by object stores
pub const KEY_SEPARATOR: char = '/';

/// Strip `prefix` from `key`, returning the path of the key relative to the folder
///
/// Returns `None` for folder-placeholder markers: keys equal to the prefix or
/// ending with the separator. Keys are expected to start with `prefix`; a key
/// that does not is returned unchanged.
pub fn relative_key<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    let relative = key.strip_prefix(prefix).unwrap_or(key);
    if relative.is_empty() || relative.ends_with(KEY_SEPARATOR) {
        None
    } else {
        Some(relative)
    }
}

/// Replace the first occurrence of `source_prefix` in `key` with `destination_prefix`
///
/// Keys that do not contain the source prefix are returned unchanged.
pub fn rewrite_prefix(key: &str, source_prefix: &str, destination_prefix: &str) -> String {
    if source_prefix.is_empty() {
        return format!("{destination_prefix}{key}");
    }
    key.replacen(source_prefix, destination_prefix, 1)
}

/// Build an object key from a folder prefix and a relative path
///
/// Plain concatenation; callers choose the separators.
pub fn join_key(prefix: &str, relative_path: &str) -> String {
    format!("{prefix}{relative_path}")
}

/// Map a relative key onto a local root directory
///
/// Leading separators are dropped so `"/main.py"` and `"main.py"` land on the
/// same file. Components that would leave `local_root` are rejected.
pub fn local_path(local_root: &Path, relative: &str) -> Result<PathBuf> {
    let mut path = local_root.to_path_buf();
    let mut depth = 0usize;

    for segment in relative.split(KEY_SEPARATOR).filter(|s| !s.is_empty()) {
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => {
                path.push(part);
                depth += 1;
            }
            (Some(Component::CurDir), None) => {}
            _ => {
                return Err(Error::InvalidPath(format!(
                    "Key segment '{segment}' in '{relative}' escapes the download root"
                )));
            }
        }
    }

    if depth == 0 {
        return Err(Error::InvalidPath(format!(
            "Key '{relative}' does not name a file"
        )));
    }

    Ok(path)
}

/// Convert a local path relative to `base` into a key suffix using `/`
pub fn relative_local_key(base: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(base).map_err(|_| {
        Error::InvalidPath(format!(
            "{} is not inside {}",
            path.display(),
            base.display()
        ))
    })?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_key_strips_prefix() {
        assert_eq!(
            relative_key("base/python", "base/python/main.py"),
            Some("/main.py")
        );
        assert_eq!(
            relative_key("base/python/", "base/python/src/app.py"),
            Some("src/app.py")
        );
    }

    #[test]
    fn test_relative_key_skips_markers() {
        assert_eq!(relative_key("base/python", "base/python"), None);
        assert_eq!(relative_key("base/python", "base/python/"), None);
        assert_eq!(relative_key("base/python/", "base/python/src/"), None);
    }

    #[test]
    fn test_rewrite_prefix_substitutes_first_occurrence() {
        assert_eq!(
            rewrite_prefix("base/python/main.py", "base/python", "code/abc123"),
            "code/abc123/main.py"
        );
        assert_eq!(
            rewrite_prefix("base/python/base/python.txt", "base/python", "code/x"),
            "code/x/base/python.txt"
        );
    }

    #[test]
    fn test_rewrite_prefix_empty_source() {
        assert_eq!(rewrite_prefix("main.py", "", "code/x/"), "code/x/main.py");
    }

    #[test]
    fn test_join_key_concatenates() {
        assert_eq!(join_key("code/abc123", "/main.py"), "code/abc123/main.py");
        assert_eq!(join_key("code/abc123/", "main.py"), "code/abc123/main.py");
    }

    #[test]
    fn test_local_path_derivation() {
        let root = Path::new("/tmp/workspace");
        let relative = relative_key("base/python", "base/python/main.py").unwrap();
        assert_eq!(local_path(root, relative).unwrap(), root.join("main.py"));

        assert_eq!(
            local_path(root, "src/pkg/mod.py").unwrap(),
            root.join("src").join("pkg").join("mod.py")
        );
    }

    #[test]
    fn test_local_path_rejects_escape() {
        let root = Path::new("/tmp/workspace");
        assert!(local_path(root, "../etc/passwd").is_err());
        assert!(local_path(root, "a/../../b").is_err());
        assert!(local_path(root, "./").is_err());
    }

    #[test]
    fn test_relative_local_key_uses_forward_slashes() {
        let base = Path::new("/tmp/template");
        let file = base.join("src").join("main.rs");
        assert_eq!(relative_local_key(base, &file).unwrap(), "src/main.rs");
        assert!(relative_local_key(base, Path::new("/elsewhere/x")).is_err());
    }
}
