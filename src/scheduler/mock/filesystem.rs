//! In-memory `/proc` tree for testing the procfs source without Linux.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use crate::scheduler::traits::FileSystem;

/// In-memory filesystem for testing.
///
/// Stores files and directories in memory so tests can describe a process
/// and its threads as they would appear under `/proc`.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: HashMap<PathBuf, String>,
    directories: HashSet<PathBuf>,
}

impl MockFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content. Parent directories are created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds an empty directory and its parents.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    /// Adds one thread of `pid` under `/proc/[pid]/task/[tid]/`.
    ///
    /// # Arguments
    /// * `pid` - Owning process ID
    /// * `tid` - Thread ID
    /// * `stat` - Content of `task/[tid]/stat`
    /// * `status` - Content of `task/[tid]/status`
    /// * `comm` - Content of `task/[tid]/comm`
    pub fn add_thread(&mut self, pid: u32, tid: u32, stat: &str, status: &str, comm: &str) {
        let base = PathBuf::from(format!("/proc/{}/task/{}", pid, tid));
        self.add_dir(&base);
        self.add_file(base.join("stat"), stat);
        self.add_file(base.join("status"), status);
        self.add_file(base.join("comm"), comm);
    }

    /// Removes a file, simulating an entry that vanished between listing
    /// and reading.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) {
        self.files.remove(path.as_ref());
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let children = self
            .files
            .keys()
            .chain(self.directories.iter())
            .filter(|p| p.parent() == Some(path) && p.as_path() != path)
            .cloned()
            .collect::<HashSet<_>>();

        let mut entries: Vec<PathBuf> = children.into_iter().collect();
        entries.sort();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_add_file() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/uptime", "350.52 700.10\n");

        assert!(fs.exists(Path::new("/proc/uptime")));
        assert!(fs.exists(Path::new("/proc")));
        assert_eq!(
            fs.read_to_string(Path::new("/proc/uptime")).unwrap(),
            "350.52 700.10\n"
        );
    }

    #[test]
    fn test_mock_fs_add_thread() {
        let mut fs = MockFs::new();
        fs.add_thread(10, 11, "11 (worker) S", "Name:\tworker\n", "worker\n");

        assert!(fs.exists(Path::new("/proc/10/task/11")));
        let tids = fs.read_dir(Path::new("/proc/10/task")).unwrap();
        assert_eq!(tids, vec![PathBuf::from("/proc/10/task/11")]);
        let files = fs.read_dir(Path::new("/proc/10/task/11")).unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_mock_fs_remove_file() {
        let mut fs = MockFs::new();
        fs.add_thread(10, 11, "stat", "status", "comm");
        fs.remove_file("/proc/10/task/11/stat");

        assert!(!fs.exists(Path::new("/proc/10/task/11/stat")));
        assert!(fs.exists(Path::new("/proc/10/task/11")));
    }

    #[test]
    fn test_mock_fs_not_found() {
        let fs = MockFs::new();
        let result = fs.read_to_string(Path::new("/nonexistent"));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
        assert!(fs.read_dir(Path::new("/nowhere")).is_err());
    }
}
