//! SFTP transport over libssh2.

use std::fs::File;
use std::io;
use std::net::TcpStream;
use std::path::{Path, PathBuf};

use ssh2::{CheckResult, KnownHostFileKind, Session, Sftp};

use crate::destination::Destination;
use crate::mirror::RemoteFs;
use crate::{PublishError, identity_files};

const DIR_MODE: i32 = 0o755;

/// An authenticated SFTP session.
pub struct SftpRemote {
    sftp: Sftp,
    // Dropped after the channel.
    _session: Session,
}

impl SftpRemote {
    /// Connect to `destination`, verify its host key and authenticate.
    ///
    /// The host key must be listed in `known_hosts` under `ssh_dir`.
    /// Authentication tries each private key in `ssh_dir` and then the SSH
    /// agent.
    pub fn connect(destination: &Destination, ssh_dir: &Path) -> Result<Self, PublishError> {
        let address = destination.address();
        let tcp = TcpStream::connect(&address).map_err(|source| PublishError::Connect {
            address: address.clone(),
            source,
        })?;

        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.handshake()?;
        tracing::debug!(%address, "SSH handshake complete");

        verify_host_key(&session, destination, &ssh_dir.join("known_hosts"))?;
        authenticate(&session, &destination.user, ssh_dir)?;

        let sftp = session.sftp()?;
        Ok(Self {
            sftp,
            _session: session,
        })
    }
}

impl RemoteFs for SftpRemote {
    fn mkdir_all(&mut self, dir: &str) -> io::Result<()> {
        let mut current = PathBuf::new();
        if dir.starts_with('/') {
            current.push("/");
        }
        for part in dir.split('/').filter(|part| !part.is_empty()) {
            current.push(part);
            if self.sftp.stat(&current).is_ok() {
                continue;
            }
            self.sftp.mkdir(&current, DIR_MODE)?;
        }
        Ok(())
    }

    fn upload(&mut self, local: &Path, remote: &str) -> io::Result<()> {
        let mut source = File::open(local)?;
        let mut target = self.sftp.create(Path::new(remote))?;
        io::copy(&mut source, &mut target)?;
        Ok(())
    }
}

fn verify_host_key(
    session: &Session,
    destination: &Destination,
    known_hosts_path: &Path,
) -> Result<(), PublishError> {
    let host_key_error = |reason: String| PublishError::HostKey {
        host: destination.host.clone(),
        reason,
    };

    let (key, _) = session
        .host_key()
        .ok_or_else(|| host_key_error("server sent no host key".to_owned()))?;

    let mut known_hosts = session.known_hosts()?;
    known_hosts
        .read_file(known_hosts_path, KnownHostFileKind::OpenSSH)
        .map_err(|e| host_key_error(format!("{}: {e}", known_hosts_path.display())))?;

    match known_hosts.check_port(&destination.host, destination.port, key) {
        CheckResult::Match => Ok(()),
        CheckResult::NotFound => Err(host_key_error("host is not in known_hosts".to_owned())),
        CheckResult::Mismatch => Err(host_key_error("host key mismatch".to_owned())),
        CheckResult::Failure => Err(host_key_error("host key check failed".to_owned())),
    }
}

fn authenticate(session: &Session, user: &str, ssh_dir: &Path) -> Result<(), PublishError> {
    for key in identity_files(ssh_dir) {
        match session.userauth_pubkey_file(user, None, &key, None) {
            Ok(()) if session.authenticated() => {
                tracing::debug!(key = %key.display(), "Authenticated with identity file");
                return Ok(());
            }
            Ok(()) => {}
            Err(e) => tracing::debug!(key = %key.display(), error = %e, "Identity file rejected"),
        }
    }

    if std::env::var_os("SSH_AUTH_SOCK").is_some() {
        match session.userauth_agent(user) {
            Ok(()) if session.authenticated() => {
                tracing::debug!("Authenticated with SSH agent");
                return Ok(());
            }
            Ok(()) => {}
            Err(e) => tracing::debug!(error = %e, "SSH agent authentication failed"),
        }
    }

    Err(PublishError::AuthenticationFailure {
        user: user.to_owned(),
    })
}
