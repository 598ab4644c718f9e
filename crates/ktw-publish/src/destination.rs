//! Remote destination parsing.

use url::Url;

use crate::PublishError;

/// The only supported scheme.
pub const SFTP_SCHEME: &str = "sftp";

/// Port used when the destination URL has none.
pub const DEFAULT_PORT: u16 = 22;

/// Parsed `sftp://[user@]host[:port][/root]` destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Destination {
    pub user: String,
    pub host: String,
    pub port: u16,
    /// Remote directory receiving the tree. Empty means the login directory.
    pub root: String,
}

impl Destination {
    /// Parse a destination URL.
    ///
    /// `default_user` is used when the URL carries no user name.
    pub fn parse(dest: &str, default_user: Option<&str>) -> Result<Self, PublishError> {
        let url = Url::parse(dest)
            .map_err(|e| PublishError::InvalidDestination(format!("{dest}: {e}")))?;
        if url.scheme() != SFTP_SCHEME {
            return Err(PublishError::UnsupportedScheme(url.scheme().to_owned()));
        }

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| PublishError::InvalidDestination(format!("{dest}: missing host")))?
            .to_owned();

        let user = match url.username() {
            "" => default_user
                .filter(|user| !user.is_empty())
                .ok_or_else(|| {
                    PublishError::InvalidDestination(format!("{dest}: no user name"))
                })?
                .to_owned(),
            user => user.to_owned(),
        };

        Ok(Self {
            user,
            host,
            port: url.port().unwrap_or(DEFAULT_PORT),
            root: url.path().to_owned(),
        })
    }

    /// `host:port` for connecting.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Remote path for a `/`-separated path relative to the local root.
    #[must_use]
    pub fn remote_path(&self, relative: &str) -> String {
        let relative = relative.trim_start_matches('/');
        if self.root.is_empty() {
            relative.to_owned()
        } else {
            format!("{}/{relative}", self.root.trim_end_matches('/'))
        }
    }
}
