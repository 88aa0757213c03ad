//! Byte transport for fetching replicas
//!
//! A transport copies a whole repository directory, `.git` included, from a
//! content copy's location to a local destination. It never interprets the
//! bytes; integrity is checked afterwards against the registry.

use std::fmt;
use std::fs;
use std::path::Path;

use replica_git::ExternalCommand;

use crate::settings::Settings;
use crate::{Error, Result};

/// Where a replica's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLocation {
    /// Login used for the connection; `None` leaves it to the transport
    pub user: Option<String>,
    pub host: String,
    /// Absolute repository path on `host`
    pub path: String,
}

impl RemoteLocation {
    /// The directory with a trailing slash so copies take its contents.
    fn contents(&self) -> String {
        format!("{}/", self.path.trim_end_matches('/'))
    }
}

impl fmt::Display for RemoteLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.user {
            Some(user) => write!(f, "{user}@{}:{}", self.host, self.path),
            None => write!(f, "{}:{}", self.host, self.path),
        }
    }
}

/// Copies replica bytes to a local directory.
pub trait Transport {
    /// Copy the repository at `source` so that `destination` becomes its
    /// working directory. `destination` may be absent or an empty directory.
    fn copy(&self, source: &RemoteLocation, destination: &Path) -> Result<()>;
}

/// Remote copy over SSH with `rsync -a`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RsyncTransport;

impl Transport for RsyncTransport {
    fn copy(&self, source: &RemoteLocation, destination: &Path) -> Result<()> {
        let remote = match &source.user {
            Some(user) => format!("{user}@{}:{}", source.host, source.contents()),
            None => format!("{}:{}", source.host, source.contents()),
        };
        prepare_parent(destination)?;
        let command = ExternalCommand::new("rsync")
            .arg("-a")
            .arg(&remote)
            .arg(destination);
        tracing::debug!(command = %command.describe(), "Fetching replica");
        command.run().map_err(|source_error| Error::Transport {
            location: source.to_string(),
            source: source_error,
        })?;
        Ok(())
    }
}

/// Copy from this machine's filesystem with `cp -pR`.
///
/// Modification times survive the copy, as they do with `rsync -a`; WORM
/// identities depend on them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTransport;

impl Transport for LocalTransport {
    fn copy(&self, source: &RemoteLocation, destination: &Path) -> Result<()> {
        if !Path::new(&source.path).is_dir() {
            return Err(Error::InvalidContentCopy {
                message: format!("{} is not a directory", source.path),
            });
        }
        prepare_parent(destination)?;
        // `<dir>/.` copies the contents whether or not the destination exists
        let command = ExternalCommand::new("cp")
            .arg("-pR")
            .arg(format!("{}.", source.contents()))
            .arg(destination);
        tracing::debug!(command = %command.describe(), "Copying replica");
        command.run().map_err(|source_error| Error::Transport {
            location: source.to_string(),
            source: source_error,
        })?;
        Ok(())
    }
}

/// Local copy when the host names this machine, rsync otherwise.
#[derive(Debug, Clone)]
pub struct HostTransport {
    settings: Settings,
}

impl HostTransport {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Whether `host` is served by [`LocalTransport`].
    pub fn is_local(&self, host: &str) -> bool {
        self.settings.is_local_host(host)
    }
}

impl Transport for HostTransport {
    fn copy(&self, source: &RemoteLocation, destination: &Path) -> Result<()> {
        if self.is_local(&source.host) {
            LocalTransport.copy(source, destination)
        } else {
            RsyncTransport.copy(source, destination)
        }
    }
}

fn prepare_parent(destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| replica_fs::Error::io(parent, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn location_display_includes_user() {
        let location = RemoteLocation {
            user: Some("alice".into()),
            host: "archive".into(),
            path: "/data/ds1".into(),
        };
        assert_eq!(location.to_string(), "alice@archive:/data/ds1");
        assert_eq!(location.contents(), "/data/ds1/");
    }

    #[test]
    fn local_copy_includes_hidden_entries() {
        let source = tempfile::tempdir().unwrap();
        fs::create_dir_all(source.path().join(".git")).unwrap();
        fs::write(source.path().join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::write(source.path().join("a.txt"), "alpha").unwrap();
        let target = tempfile::tempdir().unwrap();
        let destination = target.path().join("nested/ds1");

        LocalTransport
            .copy(
                &RemoteLocation {
                    user: None,
                    host: "localhost".into(),
                    path: source.path().to_string_lossy().into_owned(),
                },
                &destination,
            )
            .unwrap();

        assert_eq!(fs::read_to_string(destination.join("a.txt")).unwrap(), "alpha");
        assert!(destination.join(".git/HEAD").is_file());
    }

    #[test]
    fn local_copy_keeps_modification_times() {
        let source = tempfile::tempdir().unwrap();
        let file = source.path().join("a.txt");
        fs::write(&file, "alpha").unwrap();
        let stamp = std::time::UNIX_EPOCH + std::time::Duration::from_secs(1_600_000_000);
        fs::File::options()
            .write(true)
            .open(&file)
            .unwrap()
            .set_modified(stamp)
            .unwrap();
        let target = tempfile::tempdir().unwrap();
        let destination = target.path().join("ds1");

        LocalTransport
            .copy(
                &RemoteLocation {
                    user: None,
                    host: "localhost".into(),
                    path: source.path().to_string_lossy().into_owned(),
                },
                &destination,
            )
            .unwrap();

        let copied = fs::metadata(destination.join("a.txt")).unwrap();
        assert_eq!(copied.modified().unwrap(), stamp);
    }

    #[test]
    fn host_transport_routes_by_host() {
        let transport = HostTransport::new(Settings {
            hostname: Some("lab-01".into()),
            ..Settings::default()
        });
        assert!(transport.is_local("lab-01"));
        assert!(transport.is_local("localhost"));
        assert!(!transport.is_local("archive.example.org"));
    }

    #[test]
    fn local_copy_of_missing_directory_fails() {
        let target = tempfile::tempdir().unwrap();
        let result = LocalTransport.copy(
            &RemoteLocation {
                user: None,
                host: "localhost".into(),
                path: "/nonexistent/replica".into(),
            },
            &target.path().join("ds"),
        );
        assert!(matches!(result, Err(Error::InvalidContentCopy { .. })));
    }
}
