//! SFTP publishing for generated ktw sites.
//!
//! [`SftpPublisher`] mirrors a local directory onto an
//! `sftp://[user@]host[:port][/root]` destination. The server's host key must
//! already be in `known_hosts`; authentication uses the private keys found in
//! the SSH directory and then the SSH agent. The first failed transfer aborts
//! the publish.

mod destination;
mod mirror;
mod sftp;

use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};

pub use destination::{DEFAULT_PORT, Destination, SFTP_SCHEME};
pub use mirror::{RemoteFs, mirror};
pub use sftp::SftpRemote;

/// Private key file names tried in order.
pub const IDENTITY_FILES: [&str; 4] = ["id_rsa", "id_dsa", "id_ecdsa", "id_ed25519"];

/// Error returned by the publisher.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("invalid destination: {0}")]
    InvalidDestination(String),
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),
    #[error("host key verification failed for {host}: {reason}")]
    HostKey { host: String, reason: String },
    #[error("authentication failed for user {user}")]
    AuthenticationFailure { user: String },
    #[error("failed to upload {path}: {reason}")]
    TransferFailure { path: String, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),
}

/// Configuration for SFTP publishing.
#[derive(Clone, Debug, Default)]
pub struct PublishConfig {
    /// Destination URL.
    pub root: String,
    /// Directory holding `known_hosts` and private keys.
    pub ssh_dir: PathBuf,
    /// User name when the destination URL has none.
    pub user: Option<String>,
}

/// Publishes a generated site directory over SFTP.
pub struct SftpPublisher {
    config: PublishConfig,
}

impl SftpPublisher {
    #[must_use]
    pub fn new(config: PublishConfig) -> Self {
        Self { config }
    }

    /// Publish the directory.
    ///
    /// Returns the number of files uploaded.
    pub fn publish(&self, directory: &Path) -> Result<usize, PublishError> {
        if !directory.is_dir() {
            return Err(PublishError::DirectoryNotFound(directory.to_path_buf()));
        }

        let destination = Destination::parse(&self.config.root, self.config.user.as_deref())?;
        tracing::info!(
            host = %destination.host,
            port = destination.port,
            user = %destination.user,
            root = %destination.root,
            "Publishing"
        );

        let mut remote = SftpRemote::connect(&destination, &self.config.ssh_dir)?;
        let count = mirror(directory, &destination, &mut remote)?;

        tracing::info!(files = count, "Published");
        Ok(count)
    }
}

/// Resolve the SSH directory.
///
/// An explicit setting wins, then `SSH_DIR`, then `~/.ssh`. A leading `~` is
/// expanded.
#[must_use]
pub fn resolve_ssh_dir(configured: Option<&str>) -> PathBuf {
    let dir = configured
        .map(ToOwned::to_owned)
        .or_else(|| std::env::var("SSH_DIR").ok())
        .filter(|dir| !dir.is_empty())
        .unwrap_or_else(|| "~/.ssh".to_owned());
    PathBuf::from(shellexpand::tilde(&dir).into_owned())
}

/// Existing private key files in `ssh_dir`, in [`IDENTITY_FILES`] order.
#[must_use]
pub fn identity_files(ssh_dir: &Path) -> Vec<PathBuf> {
    IDENTITY_FILES
        .iter()
        .map(|name| ssh_dir.join(name))
        .filter(|path| path.is_file())
        .collect()
}

/// Walk the error source chain and join all messages.
pub(crate) fn error_chain(err: &dyn Error) -> String {
    let mut msgs = vec![err.to_string()];
    let mut source = err.source();
    while let Some(s) = source {
        msgs.push(s.to_string());
        source = s.source();
    }
    msgs.join(": ")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_identity_files_in_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("id_ed25519"), "key").unwrap();
        fs::write(dir.path().join("id_rsa"), "key").unwrap();
        fs::write(dir.path().join("known_hosts"), "").unwrap();

        assert_eq!(
            identity_files(dir.path()),
            vec![dir.path().join("id_rsa"), dir.path().join("id_ed25519")]
        );
    }

    #[test]
    fn test_identity_files_empty() {
        let dir = TempDir::new().unwrap();
        assert!(identity_files(dir.path()).is_empty());
    }

    #[test]
    fn test_resolve_ssh_dir_configured() {
        assert_eq!(
            resolve_ssh_dir(Some("/etc/deploy/ssh")),
            PathBuf::from("/etc/deploy/ssh")
        );
    }

    #[test]
    fn test_error_chain() {
        let err = PublishError::Connect {
            address: "example.com:22".to_owned(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert_eq!(
            error_chain(&err),
            "failed to connect to example.com:22: refused: refused"
        );
    }

    #[test]
    fn test_publish_missing_directory() {
        let dir = TempDir::new().unwrap();
        let publisher = SftpPublisher::new(PublishConfig {
            root: "sftp://deploy@example.com/srv".to_owned(),
            ..PublishConfig::default()
        });
        let err = publisher.publish(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, PublishError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_publish_rejects_other_schemes() {
        let dir = TempDir::new().unwrap();
        let publisher = SftpPublisher::new(PublishConfig {
            root: "ftp://example.com/srv".to_owned(),
            user: Some("deploy".to_owned()),
            ..PublishConfig::default()
        });
        let err = publisher.publish(dir.path()).unwrap_err();
        assert_eq!(err.to_string(), "unsupported URL scheme: ftp");
    }

    static_assertions::assert_impl_all!(PublishError: Send, Sync);
}
