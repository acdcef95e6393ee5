use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Output sink used by `*_into` APIs.
pub trait OutputBuffer {
    /// Writes the full payload to the sink, replacing any previous content.
    fn write_exact(&mut self, data: &[u8]) -> io::Result<()>;
}

impl OutputBuffer for Vec<u8> {
    fn write_exact(&mut self, data: &[u8]) -> io::Result<()> {
        self.clear();
        self.extend_from_slice(data);
        Ok(())
    }
}

/// Recursively collects every regular file below `root`. Unreadable directories are skipped.
pub fn collect_files_recursive(root: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(root) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, out);
        } else if path.is_file() {
            out.push(path);
        }
    }
}

/// Root of the optional retail data used by data-driven tests.
pub fn testdata_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("testdata")
}

/// Collects files under `testdata/<subdir>` whose extension matches `ext` (case-insensitive).
pub fn testdata_files(subdir: &str, ext: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect_files_recursive(&testdata_root().join(subdir), &mut files);
    files.retain(|path| {
        path.extension()
            .and_then(|value| value.to_str())
            .is_some_and(|value| value.eq_ignore_ascii_case(ext))
    });
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_buffer_replaces_previous_content() {
        let mut out = vec![9u8; 8];
        out.write_exact(&[4, 5]).expect("write to vec cannot fail");
        assert_eq!(out, vec![4, 5]);
    }

    #[test]
    fn missing_testdata_yields_no_files() {
        let files = testdata_files("definitely-not-present", "cc");
        assert!(files.is_empty());
    }

    #[test]
    fn collects_nested_files() {
        let root = std::env::temp_dir().join(format!("common-collect-{}", std::process::id()));
        let nested = root.join("a").join("b");
        fs::create_dir_all(&nested).expect("create temp tree");
        fs::write(nested.join("X.CC"), b"x").expect("write temp file");
        fs::write(root.join("y.txt"), b"y").expect("write temp file");

        let mut files = Vec::new();
        collect_files_recursive(&root, &mut files);
        files.sort();
        assert_eq!(files.len(), 2);
        let _ = fs::remove_dir_all(&root);
    }
}
