//! Mirroring a local tree onto a remote filesystem.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::destination::Destination;
use crate::{PublishError, error_chain};

/// Minimal remote filesystem used by [`mirror`].
pub trait RemoteFs {
    /// Create `dir` and any missing parents. Existing directories are fine.
    fn mkdir_all(&mut self, dir: &str) -> io::Result<()>;

    /// Copy the local file at `local` to `remote`, replacing it if present.
    fn upload(&mut self, local: &Path, remote: &str) -> io::Result<()>;
}

/// Upload every file under `directory` to the destination root.
///
/// Files are uploaded in sorted order and remote directories are created on
/// demand. The first failure aborts the whole operation. Returns the number
/// of files uploaded.
pub fn mirror(
    directory: &Path,
    destination: &Destination,
    remote: &mut dyn RemoteFs,
) -> Result<usize, PublishError> {
    if !directory.is_dir() {
        return Err(PublishError::DirectoryNotFound(directory.to_path_buf()));
    }

    let files = collect_files(directory)?;
    let mut created = HashSet::new();

    for (relative, local) in &files {
        let remote_path = destination.remote_path(relative);
        let transfer_failure = |e: &io::Error| PublishError::TransferFailure {
            path: remote_path.clone(),
            reason: error_chain(e),
        };

        if let Some((dir, _)) = remote_path.rsplit_once('/')
            && !dir.is_empty()
            && created.insert(dir.to_owned())
        {
            remote
                .mkdir_all(dir)
                .map_err(|e| transfer_failure(&e))?;
        }

        remote
            .upload(local, &remote_path)
            .map_err(|e| transfer_failure(&e))?;
        tracing::debug!(path = %remote_path, "Uploaded");
    }

    Ok(files.len())
}

/// Files under `directory` as (`/`-separated relative path, absolute path).
fn collect_files(directory: &Path) -> Result<Vec<(String, PathBuf)>, PublishError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(directory) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        files.push((relative, entry.into_path()));
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum Op {
        Mkdir(String),
        Upload(String, String),
    }

    #[derive(Default)]
    struct MockRemote {
        ops: Vec<Op>,
        fail_on: Option<String>,
    }

    impl RemoteFs for MockRemote {
        fn mkdir_all(&mut self, dir: &str) -> io::Result<()> {
            self.ops.push(Op::Mkdir(dir.to_owned()));
            Ok(())
        }

        fn upload(&mut self, local: &Path, remote: &str) -> io::Result<()> {
            if self.fail_on.as_deref() == Some(remote) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
            }
            let content = fs::read_to_string(local)?;
            self.ops.push(Op::Upload(remote.to_owned(), content));
            Ok(())
        }
    }

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("docs/api")).unwrap();
        fs::write(dir.path().join("index.html"), "home").unwrap();
        fs::write(dir.path().join("docs/a.html"), "a").unwrap();
        fs::write(dir.path().join("docs/b.html"), "b").unwrap();
        fs::write(dir.path().join("docs/api/c.html"), "c").unwrap();
        dir
    }

    fn destination() -> Destination {
        Destination::parse("sftp://deploy@example.com/srv/site", None).unwrap()
    }

    #[test]
    fn test_mirror_uploads_every_file() {
        let dir = tree();
        let mut remote = MockRemote::default();

        let count = mirror(dir.path(), &destination(), &mut remote).unwrap();

        assert_eq!(count, 4);
        assert_eq!(
            remote.ops,
            vec![
                Op::Mkdir("/srv/site/docs".to_owned()),
                Op::Upload("/srv/site/docs/a.html".to_owned(), "a".to_owned()),
                Op::Mkdir("/srv/site/docs/api".to_owned()),
                Op::Upload("/srv/site/docs/api/c.html".to_owned(), "c".to_owned()),
                Op::Upload("/srv/site/docs/b.html".to_owned(), "b".to_owned()),
                Op::Mkdir("/srv/site".to_owned()),
                Op::Upload("/srv/site/index.html".to_owned(), "home".to_owned()),
            ]
        );
    }

    #[test]
    fn test_mirror_aborts_on_first_failure() {
        let dir = tree();
        let mut remote = MockRemote {
            fail_on: Some("/srv/site/docs/api/c.html".to_owned()),
            ..MockRemote::default()
        };

        let err = mirror(dir.path(), &destination(), &mut remote).unwrap_err();

        match err {
            PublishError::TransferFailure { path, reason } => {
                assert_eq!(path, "/srv/site/docs/api/c.html");
                assert!(reason.contains("denied"));
            }
            other => panic!("unexpected error: {other}"),
        }
        let uploads = remote
            .ops
            .iter()
            .filter(|op| matches!(op, Op::Upload(..)))
            .count();
        assert_eq!(uploads, 1);
    }

    #[test]
    fn test_mirror_relative_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "home").unwrap();
        let destination = Destination::parse("sftp://deploy@example.com", None).unwrap();
        let mut remote = MockRemote::default();

        mirror(dir.path(), &destination, &mut remote).unwrap();

        assert_eq!(
            remote.ops,
            vec![Op::Upload("index.html".to_owned(), "home".to_owned())]
        );
    }

    #[test]
    fn test_mirror_missing_directory() {
        let dir = TempDir::new().unwrap();
        let mut remote = MockRemote::default();
        let err = mirror(&dir.path().join("missing"), &destination(), &mut remote).unwrap_err();
        assert!(matches!(err, PublishError::DirectoryNotFound(_)));
    }
}
