//! Input sources: standard input, named files, file lists and glob patterns.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tally_core::error::{Result, TallyError};
use tally_core::settings::is_stdin;
use tracing::{debug, warn};

// ── Public API ────────────────────────────────────────────────────────────────

/// Open `path` for line reading, or standard input when `path` is `None`
/// or `-`.
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(p) if !is_stdin(p) => {
            let file = File::open(p).map_err(|source| TallyError::FileRead {
                path: p.to_path_buf(),
                source,
            })?;
            debug!("Reading {}", p.display());
            Ok(Box::new(BufReader::new(file)))
        }
        _ => {
            debug!("Reading standard input");
            Ok(Box::new(io::stdin().lock()))
        }
    }
}

/// Expand shell-style patterns into file names, in argument order.
///
/// A pattern that matches nothing (or is not a valid pattern) stands for
/// itself, so a plain missing file name is passed through and reported
/// downstream.
pub fn expand_patterns(patterns: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for pattern in patterns {
        let matches: Vec<PathBuf> = match glob::glob(pattern) {
            Ok(paths) => paths
                .filter_map(|entry| match entry {
                    Ok(path) => Some(path),
                    Err(e) => {
                        warn!("Skipping unreadable match of {}: {}", pattern, e);
                        None
                    }
                })
                .collect(),
            Err(e) => {
                debug!("Treating {} literally: {}", pattern, e);
                Vec::new()
            }
        };

        if matches.is_empty() {
            files.push(PathBuf::from(pattern));
        } else {
            files.extend(matches);
        }
    }
    files
}

/// Read file names, one per line, from `list` (`-` is standard input).
///
/// Surrounding whitespace is stripped and blank lines are skipped.
pub fn read_file_list(list: &Path) -> Result<Vec<PathBuf>> {
    let reader = open_input(Some(list))?;
    parse_file_list(reader)
}

/// Collect non-blank, trimmed lines of `reader` as paths.
pub fn parse_file_list(reader: impl BufRead) -> Result<Vec<PathBuf>> {
    let mut names = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            names.push(PathBuf::from(trimmed));
        }
    }
    Ok(names)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_open_input_reads_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("trace.txt");
        std::fs::write(&path, "one\ntwo\n").unwrap();

        let lines: Vec<String> = open_input(Some(&path))
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_open_input_missing_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("missing.txt");

        let err = open_input(Some(&path)).err().expect("should fail");
        match err {
            TallyError::FileRead { path: p, source } => {
                assert_eq!(p, path);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_expand_patterns_matches_sorted() {
        let tmp = TempDir::new().expect("tempdir");
        for name in ["b.c", "a.c", "notes.txt"] {
            std::fs::write(tmp.path().join(name), "").unwrap();
        }

        let pattern = tmp.path().join("*.c").to_string_lossy().to_string();
        let files = expand_patterns(&[pattern]);
        assert_eq!(files, vec![tmp.path().join("a.c"), tmp.path().join("b.c")]);
    }

    #[test]
    fn test_expand_patterns_unmatched_is_literal() {
        let tmp = TempDir::new().expect("tempdir");
        let missing = tmp.path().join("nothing*.java").to_string_lossy().to_string();
        let files = expand_patterns(&[missing.clone()]);
        assert_eq!(files, vec![PathBuf::from(missing)]);
    }

    #[test]
    fn test_expand_patterns_invalid_is_literal() {
        let files = expand_patterns(&["src/[".to_string()]);
        assert_eq!(files, vec![PathBuf::from("src/[")]);
    }

    #[test]
    fn test_expand_patterns_keeps_argument_order() {
        let tmp = TempDir::new().expect("tempdir");
        std::fs::write(tmp.path().join("z.c"), "").unwrap();
        std::fs::write(tmp.path().join("a.h"), "").unwrap();

        let patterns = vec![
            tmp.path().join("*.c").to_string_lossy().to_string(),
            tmp.path().join("*.h").to_string_lossy().to_string(),
        ];
        let files = expand_patterns(&patterns);
        assert_eq!(files, vec![tmp.path().join("z.c"), tmp.path().join("a.h")]);
    }

    #[test]
    fn test_parse_file_list_trims_and_skips_blank() {
        let input = Cursor::new("  a.c \n\n\tsrc/b.c\n   \n");
        let names = parse_file_list(input).unwrap();
        assert_eq!(names, vec![PathBuf::from("a.c"), PathBuf::from("src/b.c")]);
    }

    #[test]
    fn test_read_file_list_from_file() {
        let tmp = TempDir::new().expect("tempdir");
        let list = tmp.path().join("files.txt");
        std::fs::write(&list, "x.c\ny.c\n").unwrap();

        let names = read_file_list(&list).unwrap();
        assert_eq!(names, vec![PathBuf::from("x.c"), PathBuf::from("y.c")]);
    }
}
