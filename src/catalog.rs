//! Input discovery
//!
//! Files are grouped by their parent directory. Directories are taken in the
//! pre-order of a name-sorted walk, and each directory's files are listed
//! together, sorted by name, before the next directory. Ids follow that order,
//! so the same tree always yields the same id for the same path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::DiscoveryError;
use crate::types::FileRecord;

/// Every file under a root directory, with dense ids `0..len`
#[derive(Debug, Clone, Default)]
pub struct FileCatalog {
    root: PathBuf,
    records: Vec<FileRecord>,
}

impl FileCatalog {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn get(&self, id: usize) -> Option<&FileRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter()
    }

    /// Id to path mapping.
    pub fn paths(&self) -> HashMap<usize, &Path> {
        self.records
            .iter()
            .map(|record| (record.id, record.path.as_path()))
            .collect()
    }
}

/// Enumerate all files below `root`.
pub fn discover(root: impl AsRef<Path>) -> Result<FileCatalog, DiscoveryError> {
    let root = root.as_ref();
    if !root.exists() {
        return Err(DiscoveryError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
    }
    std::fs::read_dir(root).map_err(|source| DiscoveryError::Unreadable {
        path: root.to_path_buf(),
        source,
    })?;

    // (directory, files) in first-visit order
    let mut groups: Vec<(PathBuf, Vec<PathBuf>)> = Vec::new();
    let mut group_index: HashMap<PathBuf, usize> = HashMap::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("Skipping unreadable entry: {}", err);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            group_index.insert(entry.path().to_path_buf(), groups.len());
            groups.push((entry.path().to_path_buf(), Vec::new()));
            continue;
        }
        // symlinks count when their target is a regular file
        if !entry.file_type().is_file() && !entry.path().is_file() {
            continue;
        }

        let parent = entry.path().parent().unwrap_or(root).to_path_buf();
        match group_index.get(&parent) {
            Some(&index) => groups[index].1.push(entry.path().to_path_buf()),
            None => {
                group_index.insert(parent.clone(), groups.len());
                groups.push((parent, vec![entry.path().to_path_buf()]));
            }
        }
    }

    let records: Vec<FileRecord> = groups
        .into_iter()
        .filter(|(_, files)| !files.is_empty())
        .flat_map(|(_, files)| files)
        .enumerate()
        .map(|(id, path)| FileRecord { id, path })
        .collect();

    tracing::debug!(
        root = %root.display(),
        files = records.len(),
        "discovery complete"
    );

    Ok(FileCatalog {
        root: root.to_path_buf(),
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn groups_files_by_directory_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("b.wav"));
        touch(&root.join("a/z.wav"));
        touch(&root.join("a/sub/y.wav"));
        touch(&root.join("a/m.wav"));
        touch(&root.join("c.wav"));
        fs::create_dir_all(root.join("empty/deeper")).unwrap();

        let catalog = discover(root).unwrap();
        let relative: Vec<PathBuf> = catalog
            .iter()
            .map(|r| r.path.strip_prefix(root).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::from("b.wav"),
                PathBuf::from("c.wav"),
                PathBuf::from("a/m.wav"),
                PathBuf::from("a/z.wav"),
                PathBuf::from("a/sub/y.wav"),
            ]
        );
        let ids: Vec<usize> = catalog.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn ids_are_unique_and_stable() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["x/1.wav", "x/2.wav", "y/1.wav", "y/z/3.wav"] {
            touch(&dir.path().join(name));
        }

        let first = discover(dir.path()).unwrap();
        let second = discover(dir.path()).unwrap();
        assert_eq!(first.records(), second.records());

        let ids: HashSet<usize> = first.iter().map(|r| r.id).collect();
        let paths: HashSet<&Path> = first.iter().map(|r| r.path.as_path()).collect();
        assert_eq!(ids.len(), first.len());
        assert_eq!(paths.len(), first.len());
        assert_eq!(first.paths().len(), 4);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        touch(&dir.path().join("real.wav"));
        fs::create_dir_all(root.join("links")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.wav"), root.join("links/linked.wav"))
            .unwrap();
        // a linked directory is not descended into
        std::os::unix::fs::symlink(dir.path(), root.join("loop")).unwrap();

        let catalog = discover(&root).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.records()[0].path.ends_with("links/linked.wav"));
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            discover(&missing),
            Err(DiscoveryError::NotFound(_))
        ));
    }

    #[test]
    fn file_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("clip.wav");
        touch(&file);
        assert!(matches!(
            discover(&file),
            Err(DiscoveryError::NotADirectory(_))
        ));
    }

    #[test]
    fn empty_tree_yields_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        let catalog = discover(dir.path()).unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.get(0).is_none());
    }
}
