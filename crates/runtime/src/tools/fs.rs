//! Filesystem tools: read, list, and edit files.
//!
//! Paths are resolved against the process working directory and are not
//! sandboxed. Any path the process can reach, the model can reach.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use walkdir::WalkDir;

use super::registry::parse_args;
use super::{ParamKind, ToolError, ToolSpec};

type ToolOutput = Result<String, ToolError>;

// ─────────────────────────────────────────────────────────────────────────────
// read_file
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ReadFileInput {
    path: String,
}

pub fn read_file_spec() -> ToolSpec {
    ToolSpec::new(
        "read_file",
        "Read the contents of a given relative file path. Use this when you want to see \
         what's inside a file. Do not use this with directory names.",
    )
    .param(
        "path",
        ParamKind::String,
        "The relative path of a file in the working directory.",
    )
}

/// Return the file's content as text.
pub fn read_file(input: &Value) -> ToolOutput {
    let input: ReadFileInput = parse_args(input)?;
    let path = Path::new(&input.path);

    let meta = fs::metadata(path).map_err(|e| ToolError::io(&input.path, e))?;
    if meta.is_dir() {
        return Err(ToolError::IsADirectory(input.path));
    }

    let bytes = fs::read(path).map_err(|e| ToolError::io(&input.path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// ─────────────────────────────────────────────────────────────────────────────
// list_files
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListFilesInput {
    #[serde(default)]
    path: Option<String>,
}

pub fn list_files_spec() -> ToolSpec {
    ToolSpec::new(
        "list_files",
        "List files and directories at a given path. If no path is provided, lists files \
         in the current directory.",
    )
    .optional(
        "path",
        ParamKind::String,
        "Optional relative path to list files from. Defaults to current directory if not provided.",
    )
}

/// Recursively list everything under a directory as a JSON array.
///
/// Entries are relative to the listed directory, `/`-separated, sorted by
/// name at each level. Directories carry a trailing `/`.
pub fn list_files(input: &Value) -> ToolOutput {
    let input: ListFilesInput = parse_args(input)?;
    let dir = match input.path.as_deref() {
        None | Some("") => ".",
        Some(p) => p,
    };

    let root = Path::new(dir);
    let meta = fs::metadata(root).map_err(|e| ToolError::io(dir, e))?;
    if !meta.is_dir() {
        return Err(ToolError::InvalidArgs(format!("{dir} is not a directory")));
    }

    let entries = walk(root).map_err(|e| match e.into_io_error() {
        Some(io) => ToolError::io(dir, io),
        None => ToolError::Io(format!("{dir}: filesystem loop detected")),
    })?;

    serde_json::to_string(&entries).map_err(|e| ToolError::Io(format!("encode listing: {e}")))
}

fn walk(root: &Path) -> Result<Vec<String>, walkdir::Error> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let mut name = to_slash(relative);
        if entry.file_type().is_dir() {
            name.push('/');
        }
        entries.push(name);
    }
    Ok(entries)
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

// ─────────────────────────────────────────────────────────────────────────────
// edit_file
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EditFileInput {
    path: String,
    old_str: String,
    new_str: String,
}

/// A single planned text substitution.
#[derive(Debug)]
struct EditIntent {
    path: String,
    old: String,
    new: String,
}

impl TryFrom<EditFileInput> for EditIntent {
    type Error = ToolError;

    fn try_from(input: EditFileInput) -> Result<Self, ToolError> {
        if input.path.is_empty() {
            return Err(ToolError::InvalidArgs("path must not be empty".into()));
        }
        if !input.old_str.is_empty() && input.old_str == input.new_str {
            return Err(ToolError::InvalidArgs(
                "old_str and new_str must be different".into(),
            ));
        }
        Ok(Self {
            path: input.path,
            old: input.old_str,
            new: input.new_str,
        })
    }
}

pub fn edit_file_spec() -> ToolSpec {
    ToolSpec::new(
        "edit_file",
        "Make edits to a text file.\n\n\
         Replaces 'old_str' with 'new_str' in the given file. 'old_str' and 'new_str' MUST \
         be different from each other.\n\n\
         If the file specified with path doesn't exist, it will be created with new_str as \
         its contents when old_str is empty.",
    )
    .param("path", ParamKind::String, "The path to the file")
    .param(
        "old_str",
        ParamKind::String,
        "Text to search for - must match exactly. Use empty string to create a new file.",
    )
    .param(
        "new_str",
        ParamKind::String,
        "Text to replace old_str with, or contents for a new file if old_str is empty",
    )
}

/// Replace every occurrence of `old_str`, or create the file when absent.
pub fn edit_file(input: &Value) -> ToolOutput {
    let input: EditFileInput = parse_args(input)?;
    let intent = EditIntent::try_from(input)?;
    apply(intent)
}

fn apply(intent: EditIntent) -> ToolOutput {
    let path = Path::new(&intent.path);

    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return create(&intent),
        Err(e) => return Err(ToolError::io(&intent.path, e)),
    };
    if meta.is_dir() {
        return Err(ToolError::IsADirectory(intent.path));
    }
    if intent.old.is_empty() {
        return Err(ToolError::InvalidArgs(format!(
            "{} already exists; old_str must not be empty",
            intent.path
        )));
    }

    let content = fs::read(path).map_err(|e| ToolError::io(&intent.path, e))?;
    let content = String::from_utf8(content)
        .map_err(|_| ToolError::Io(format!("{} is not valid UTF-8 text", intent.path)))?;
    if !content.contains(&intent.old) {
        return Err(ToolError::NoMatch(format!(
            "old_str not found in {}",
            intent.path
        )));
    }

    let updated = content.replace(&intent.old, &intent.new);
    // Rename would replace a symlink itself; write to what it points at.
    let target = fs::canonicalize(path).map_err(|e| ToolError::io(&intent.path, e))?;
    write_atomic(&target, updated.as_bytes(), Some(meta.permissions()))
        .map_err(|e| ToolError::io(&intent.path, e))?;

    Ok(format!("File {} updated successfully", intent.path))
}

fn create(intent: &EditIntent) -> ToolOutput {
    if !intent.old.is_empty() {
        return Err(ToolError::InvalidArgs(format!(
            "{} does not exist and old_str is not empty",
            intent.path
        )));
    }

    let path = Path::new(&intent.path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            ToolError::Io(format!("failed to create directory {}: {e}", parent.display()))
        })?;
    }
    write_atomic(path, intent.new.as_bytes(), None)
        .map_err(|e| ToolError::io(&intent.path, e))?;

    Ok(format!("Successfully created file {}", intent.path))
}

/// Write through a sibling temp file so the target is either fully
/// replaced or untouched.
fn write_atomic(
    path: &Path,
    data: &[u8],
    permissions: Option<fs::Permissions>,
) -> std::io::Result<()> {
    let tmp = temp_sibling(path);
    let result = fs::write(&tmp, data)
        .and_then(|()| match permissions {
            Some(p) => fs::set_permissions(&tmp, p),
            None => Ok(()),
        })
        .and_then(|()| fs::rename(&tmp, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn p(dir: &TempDir, rel: &str) -> String {
        dir.path().join(rel).to_string_lossy().into_owned()
    }

    #[test]
    fn read_file_returns_content_verbatim() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "line one\nline two\n").unwrap();

        let out = read_file(&json!({"path": p(&dir, "a.txt")})).unwrap();
        assert_eq!(out, "line one\nline two\n");
    }

    #[test]
    fn read_file_missing_path_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = read_file(&json!({"path": p(&dir, "nope.txt")})).unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[test]
    fn read_file_on_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = read_file(&json!({"path": p(&dir, "")})).unwrap_err();
        assert!(matches!(err, ToolError::IsADirectory(_)));
    }

    #[test]
    fn read_file_requires_path() {
        let err = read_file(&json!({})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
    }

    #[test]
    fn list_files_is_recursive_sorted_and_marks_directories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/c.txt"), "").unwrap();

        let out = list_files(&json!({"path": p(&dir, "")})).unwrap();
        let entries: Vec<String> = serde_json::from_str(&out).unwrap();
        assert_eq!(entries, vec!["a.txt", "b/", "b/c.txt"]);
    }

    #[test]
    fn list_files_sorts_each_level() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("z/y")).unwrap();
        fs::write(dir.path().join("z/b.txt"), "").unwrap();
        fs::write(dir.path().join("z/y/a.txt"), "").unwrap();
        fs::write(dir.path().join("m.txt"), "").unwrap();

        let out = list_files(&json!({"path": p(&dir, "")})).unwrap();
        let entries: Vec<String> = serde_json::from_str(&out).unwrap();
        assert_eq!(entries, vec!["m.txt", "z/", "z/b.txt", "z/y/", "z/y/a.txt"]);
    }

    #[test]
    fn list_files_empty_directory() {
        let dir = TempDir::new().unwrap();
        let out = list_files(&json!({"path": p(&dir, "")})).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn list_files_missing_directory_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = list_files(&json!({"path": p(&dir, "gone")})).unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[test]
    fn list_files_accepts_missing_path() {
        assert!(list_files(&Value::Null).is_ok());
        assert!(list_files(&json!({})).is_ok());
    }

    #[test]
    fn edit_file_creates_file_and_parents() {
        let dir = TempDir::new().unwrap();
        let path = p(&dir, "nested/deeper/new.txt");

        let out = edit_file(&json!({"path": path, "old_str": "", "new_str": "Hi"})).unwrap();
        assert!(out.contains("created"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "Hi");
    }

    #[test]
    fn edit_file_replaces_every_occurrence() {
        let dir = TempDir::new().unwrap();
        let path = p(&dir, "f.txt");
        fs::write(&path, "foo bar foo baz foo").unwrap();

        edit_file(&json!({"path": path, "old_str": "foo", "new_str": "qux"})).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "qux bar qux baz qux");

        // old_str is fully consumed, so a second application has nothing to do.
        let err = edit_file(&json!({"path": path, "old_str": "foo", "new_str": "qux"})).unwrap_err();
        assert!(matches!(err, ToolError::NoMatch(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "qux bar qux baz qux");
    }

    #[test]
    fn edit_file_is_literal_not_regex() {
        let dir = TempDir::new().unwrap();
        let path = p(&dir, "f.txt");
        fs::write(&path, "a.b axb").unwrap();

        edit_file(&json!({"path": path, "old_str": "a.b", "new_str": "ok"})).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "ok axb");
    }

    #[test]
    fn edit_file_no_match_leaves_file_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = p(&dir, "f.txt");
        fs::write(&path, "hello").unwrap();

        let err = edit_file(&json!({"path": path, "old_str": "bye", "new_str": "x"})).unwrap_err();
        assert!(matches!(err, ToolError::NoMatch(_)));
        assert_eq!(fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn edit_file_rejects_identical_strings_regardless_of_existence() {
        let dir = TempDir::new().unwrap();
        let existing = p(&dir, "f.txt");
        fs::write(&existing, "same").unwrap();

        for path in [existing.clone(), p(&dir, "absent.txt")] {
            let err =
                edit_file(&json!({"path": path, "old_str": "same", "new_str": "same"})).unwrap_err();
            assert!(matches!(err, ToolError::InvalidArgs(_)));
        }
        assert_eq!(fs::read_to_string(&existing).unwrap(), "same");
        assert!(!dir.path().join("absent.txt").exists());
    }

    #[test]
    fn edit_file_missing_file_with_old_str_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = p(&dir, "absent.txt");
        let err = edit_file(&json!({"path": path, "old_str": "x", "new_str": "y"})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
        assert!(!dir.path().join("absent.txt").exists());
    }

    #[test]
    fn edit_file_empty_old_str_on_existing_file_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = p(&dir, "f.txt");
        fs::write(&path, "keep").unwrap();

        let err = edit_file(&json!({"path": path, "old_str": "", "new_str": "x"})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep");
    }

    #[test]
    fn edit_file_does_not_guess_missing_arguments() {
        let err = edit_file(&json!({"new_str": "content"})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
        let err = edit_file(&json!({"path": "", "old_str": "", "new_str": "x"})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
    }

    #[test]
    fn edit_file_on_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = edit_file(&json!({"path": p(&dir, ""), "old_str": "a", "new_str": "b"}))
            .unwrap_err();
        assert!(matches!(err, ToolError::IsADirectory(_)));
    }

    #[cfg(unix)]
    #[test]
    fn edit_file_writes_through_symlink() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real.txt");
        let link = dir.path().join("link.txt");
        fs::write(&real, "hello").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let path = link.to_string_lossy().into_owned();
        edit_file(&json!({"path": path, "old_str": "hello", "new_str": "bye"})).unwrap();

        assert_eq!(fs::read_to_string(&real).unwrap(), "bye");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&link).unwrap(), "bye");
    }

    #[test]
    fn failed_write_leaves_target_and_directory_untouched() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("f.txt");
        fs::write(&target, "original").unwrap();
        // Occupy the temp slot with a directory so the write itself fails.
        let blocker = temp_sibling(&fs::canonicalize(&target).unwrap());
        fs::create_dir(&blocker).unwrap();

        let path = target.to_string_lossy().into_owned();
        let err =
            edit_file(&json!({"path": path, "old_str": "original", "new_str": "new"})).unwrap_err();

        assert!(matches!(err, ToolError::IsADirectory(_) | ToolError::Io(_)));
        assert_eq!(fs::read_to_string(&target).unwrap(), "original");
        let mut names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        let blocker_name = blocker.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(names, vec![blocker_name, "f.txt".to_string()]);
        assert!(blocker.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("data");
        fs::write(&target, "bytes").unwrap();

        // Renaming a regular file over a non-empty directory always fails.
        let occupied = dir.path().join("occupied");
        fs::create_dir(&occupied).unwrap();
        fs::write(occupied.join("keep.txt"), "").unwrap();

        let err = write_atomic(&occupied, b"payload", None).unwrap_err();
        assert!(!err.to_string().is_empty());
        assert!(!temp_sibling(&occupied).exists());
        assert!(occupied.join("keep.txt").exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "bytes");
    }

    #[test]
    fn edit_file_leaves_no_temp_files_behind() {
        let dir = TempDir::new().unwrap();
        let path = p(&dir, "f.txt");
        fs::write(&path, "one").unwrap();
        edit_file(&json!({"path": path, "old_str": "one", "new_str": "two"})).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["f.txt"]);
    }
}
