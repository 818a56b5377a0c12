//! Path helpers shared by both backends. Paths are plain strings separated
//! by '/', directories always carry a trailing '/'.

/// Normalizes a directory path so it always ends with '/'. Empty path
/// stands for the root directory.
pub fn dir_path(path: &str) -> String {
    if path.is_empty() {
        String::from("/")
    } else if path.ends_with('/') {
        path.to_owned()
    } else {
        format!("{}/", path)
    }
}

/// Returns the last non-empty segment of the path, or "" for the root
pub fn last_segment(path: &str) -> &str {
    path.trim_matches('/').rsplit('/').next().unwrap_or("")
}

/// Joins base and name with exactly one '/', regardless of trailing
/// separators in base
pub fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        return name.to_owned();
    }
    format!("{}/{}", base.trim_end_matches('/'), name.trim_start_matches('/'))
}

/// Converts a tree path into an object store key. Keys never start with '/'
/// and the bucket root maps onto the empty prefix.
pub fn object_key(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// Splits given path into the directory part (with trailing '/') and the
/// name of the last segment
pub fn split_path_into_dir_and_filename(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(i) => (&trimmed[..=i], &trimmed[i + 1..]),
        None => ("", trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_paths_end_with_separator() {
        assert_eq!(dir_path(""), "/");
        assert_eq!(dir_path("/"), "/");
        assert_eq!(dir_path("photos"), "photos/");
        assert_eq!(dir_path("photos/2021/"), "photos/2021/");
    }

    #[test]
    fn last_segment_ignores_separators() {
        assert_eq!(last_segment("/"), "");
        assert_eq!(last_segment(""), "");
        assert_eq!(last_segment("a/b/c/"), "c");
        assert_eq!(last_segment("/home/user/notes.txt"), "notes.txt");
        assert_eq!(last_segment("f1"), "f1");
    }

    #[test]
    fn join_uses_single_separator() {
        assert_eq!(join_path("out", "a"), "out/a");
        assert_eq!(join_path("out/", "a"), "out/a");
        assert_eq!(join_path("out///", "a"), "out/a");
        assert_eq!(join_path("/", "a"), "/a");
        assert_eq!(join_path("", "a"), "a");
    }

    #[test]
    fn object_keys_drop_leading_separator() {
        assert_eq!(object_key("/"), "");
        assert_eq!(object_key("/a/b/"), "a/b/");
        assert_eq!(object_key("a/f1"), "a/f1");
    }

    #[test]
    fn split_path() {
        assert_eq!(split_path_into_dir_and_filename("a/b/f2"), ("a/b/", "f2"));
        assert_eq!(split_path_into_dir_and_filename("/tmp/x/"), ("/tmp/", "x"));
        assert_eq!(split_path_into_dir_and_filename("f"), ("", "f"));
    }
}
