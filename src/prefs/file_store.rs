use super::{PrefError, PrefFile, PreferenceStore};
use std::fs;
use std::path::{Path, PathBuf};

/// Line-delimited preference files under a single directory.
pub struct FilePreferenceStore {
    dir: PathBuf,
}

impl FilePreferenceStore {
    /// Open the store, creating the directory if needed.
    pub fn new(dir: &Path) -> Result<Self, PrefError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path(&self, file: PrefFile) -> PathBuf {
        self.dir.join(file.file_name())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn list(&self, file: PrefFile) -> Result<Vec<String>, PrefError> {
        let raw = match fs::read_to_string(self.path(file)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    fn append(&self, file: PrefFile, value: &str) -> Result<(), PrefError> {
        let mut entries = self.list(file)?;
        if entries.iter().any(|v| v == value) {
            return Ok(());
        }
        entries.push(value.to_string());
        write_lines(&self.path(file), &entries)
    }

    fn remove(&self, file: PrefFile, value: &str) -> Result<(), PrefError> {
        let entries: Vec<String> = self
            .list(file)?
            .into_iter()
            .filter(|v| v != value)
            .collect();
        write_lines(&self.path(file), &entries)
    }
}

// Write-then-rename so an interrupted rewrite cannot truncate the list.
fn write_lines(path: &Path, lines: &[String]) -> Result<(), PrefError> {
    let tmp = path.with_extension("tmp");
    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_store() -> (FilePreferenceStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FilePreferenceStore::new(temp_dir.path()).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let (store, _temp_dir) = make_store();
        assert!(store.list(PrefFile::Favorites).unwrap().is_empty());
    }

    #[test]
    fn test_append_and_list_keeps_order() {
        let (store, _temp_dir) = make_store();
        store.append(PrefFile::Subscriptions, "UC111").unwrap();
        store.append(PrefFile::Subscriptions, "UC222").unwrap();
        store.append(PrefFile::Subscriptions, "UC333").unwrap();

        assert_eq!(
            store.list(PrefFile::Subscriptions).unwrap(),
            vec!["UC111", "UC222", "UC333"]
        );
    }

    #[test]
    fn test_append_is_idempotent() {
        let (store, _temp_dir) = make_store();
        store.append(PrefFile::Favorites, "dQw4w9WgXcQ").unwrap();
        store.append(PrefFile::Favorites, "dQw4w9WgXcQ").unwrap();

        assert_eq!(store.list(PrefFile::Favorites).unwrap(), vec!["dQw4w9WgXcQ"]);
    }

    #[test]
    fn test_remove_drops_matching_lines() {
        let (store, _temp_dir) = make_store();
        store.append(PrefFile::BannedInstances, "bad.example.org").unwrap();
        store.append(PrefFile::BannedInstances, "fine.example.org").unwrap();

        store.remove(PrefFile::BannedInstances, "bad.example.org").unwrap();

        assert_eq!(
            store.list(PrefFile::BannedInstances).unwrap(),
            vec!["fine.example.org"]
        );
    }

    #[test]
    fn test_remove_missing_value_is_noop() {
        let (store, _temp_dir) = make_store();
        store.append(PrefFile::Favorites, "abc12345678").unwrap();
        store.remove(PrefFile::Favorites, "not-there").unwrap();

        assert_eq!(store.list(PrefFile::Favorites).unwrap(), vec!["abc12345678"]);
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let (store, temp_dir) = make_store();
        std::fs::write(
            temp_dir.path().join(PrefFile::Favorites.file_name()),
            "one\n\n  \ntwo\n",
        )
        .unwrap();

        assert_eq!(store.list(PrefFile::Favorites).unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn test_lists_are_independent() {
        let (store, _temp_dir) = make_store();
        store.append(PrefFile::Favorites, "vid").unwrap();
        store.append(PrefFile::BannedChannels, "UCbad").unwrap();

        assert_eq!(store.list(PrefFile::Favorites).unwrap(), vec!["vid"]);
        assert_eq!(store.list(PrefFile::BannedChannels).unwrap(), vec!["UCbad"]);
        assert!(store.list(PrefFile::Subscriptions).unwrap().is_empty());
    }
}
