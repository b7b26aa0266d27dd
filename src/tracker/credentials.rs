//! Certificate slots for the mutual TLS connection.
//!
//! Files are only checked by name suffix when picked. Their content is read
//! later, when a connection is opened, so a file that disappears in between
//! surfaces as a connect failure rather than a load failure.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Certificate,
    PrivateKey,
    RootCA,
}

impl CredentialKind {
    pub const ALL: [CredentialKind; 3] = [
        CredentialKind::Certificate,
        CredentialKind::PrivateKey,
        CredentialKind::RootCA,
    ];

    /// File name suffixes accepted for this slot.
    pub fn allowed_suffixes(self) -> &'static [&'static str] {
        match self {
            CredentialKind::Certificate => &[".crt", ".pem"],
            CredentialKind::PrivateKey => &[".key"],
            CredentialKind::RootCA => &[".pem"],
        }
    }

    /// Label shown next to the file picker.
    pub fn picker_label(self) -> &'static str {
        match self {
            CredentialKind::Certificate => "Device Certificate (.pem.crt)",
            CredentialKind::PrivateKey => "Private Key (.private.key)",
            CredentialKind::RootCA => "Root CA Certificate (AmazonRootCA1.pem)",
        }
    }

    fn invalid_hint(self) -> &'static str {
        match self {
            CredentialKind::Certificate => {
                "Invalid certificate file. Please use a .crt or .pem file."
            }
            CredentialKind::PrivateKey => "Invalid private key file. Please use a .key file.",
            CredentialKind::RootCA => "Invalid Root CA file. Please use a .pem file.",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            CredentialKind::Certificate => "Certificate",
            CredentialKind::PrivateKey => "Private Key",
            CredentialKind::RootCA => "Root CA",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("{hint}")]
    InvalidFileType {
        kind: CredentialKind,
        name: String,
        hint: &'static str,
    },

    #[error("Unable to read {kind} file {}: {source}", .path.display())]
    Read {
        kind: CredentialKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A picked file, referenced by path until the connection reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialFile {
    pub name: String,
    pub path: PathBuf,
}

/// Contents of all three slots, read at connect time.
#[derive(Clone)]
pub struct CredentialBlobs {
    pub certificate: Vec<u8>,
    pub private_key: Vec<u8>,
    pub root_ca: Vec<u8>,
}

impl fmt::Debug for CredentialBlobs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CredentialBlobs")
            .field("certificate", &self.certificate.len())
            .field("private_key", &"<redacted>")
            .field("root_ca", &self.root_ca.len())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    certificate: Option<CredentialFile>,
    private_key: Option<CredentialFile>,
    root_ca: Option<CredentialFile>,
}

impl CredentialStore {
    /// Stores `path` in the slot for `kind` if its name has an accepted suffix.
    ///
    /// On rejection the slot keeps whatever it held before. Returns the status
    /// line to show the user on success.
    pub fn load(&mut self, kind: CredentialKind, path: &Path) -> Result<String, CredentialError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !kind
            .allowed_suffixes()
            .iter()
            .any(|suffix| name.ends_with(suffix))
        {
            warn!("Rejected {} file {:?}", kind, name);
            return Err(CredentialError::InvalidFileType {
                kind,
                name,
                hint: kind.invalid_hint(),
            });
        }

        let status = match kind {
            CredentialKind::Certificate => format!("Certificate loaded: {}", name),
            CredentialKind::PrivateKey => format!("Private key loaded: {}", name),
            CredentialKind::RootCA => format!("Root CA loaded: {}", name),
        };
        info!("{} slot set to {}", kind, path.display());

        *self.slot_mut(kind) = Some(CredentialFile {
            name,
            path: path.to_path_buf(),
        });
        debug!("Credentials ready: {}", self.is_ready());
        Ok(status)
    }

    pub fn get(&self, kind: CredentialKind) -> Option<&CredentialFile> {
        match kind {
            CredentialKind::Certificate => self.certificate.as_ref(),
            CredentialKind::PrivateKey => self.private_key.as_ref(),
            CredentialKind::RootCA => self.root_ca.as_ref(),
        }
    }

    pub fn is_loaded(&self, kind: CredentialKind) -> bool {
        self.get(kind).is_some()
    }

    /// True once all three slots are filled.
    pub fn is_ready(&self) -> bool {
        CredentialKind::ALL.iter().all(|kind| self.is_loaded(*kind))
    }

    /// Snapshot of the three file references, if complete.
    pub fn files(&self) -> Option<CredentialFiles> {
        Some(CredentialFiles {
            certificate: self.certificate.clone()?,
            private_key: self.private_key.clone()?,
            root_ca: self.root_ca.clone()?,
        })
    }

    fn slot_mut(&mut self, kind: CredentialKind) -> &mut Option<CredentialFile> {
        match kind {
            CredentialKind::Certificate => &mut self.certificate,
            CredentialKind::PrivateKey => &mut self.private_key,
            CredentialKind::RootCA => &mut self.root_ca,
        }
    }
}

/// A complete set of file references, handed to the session worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialFiles {
    pub certificate: CredentialFile,
    pub private_key: CredentialFile,
    pub root_ca: CredentialFile,
}

impl CredentialFiles {
    /// Reads all three files fully into memory.
    pub async fn read_all(&self) -> Result<CredentialBlobs, CredentialError> {
        let certificate = read_slot(CredentialKind::Certificate, &self.certificate).await?;
        let private_key = read_slot(CredentialKind::PrivateKey, &self.private_key).await?;
        let root_ca = read_slot(CredentialKind::RootCA, &self.root_ca).await?;

        Ok(CredentialBlobs {
            certificate,
            private_key,
            root_ca,
        })
    }
}

async fn read_slot(kind: CredentialKind, file: &CredentialFile) -> Result<Vec<u8>, CredentialError> {
    tokio::fs::read(&file.path)
        .await
        .map_err(|source| CredentialError::Read {
            kind,
            path: file.path.clone(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_store() -> CredentialStore {
        let mut store = CredentialStore::default();
        store
            .load(CredentialKind::Certificate, Path::new("/certs/device.pem.crt"))
            .unwrap();
        store
            .load(CredentialKind::PrivateKey, Path::new("/certs/device.private.key"))
            .unwrap();
        store
            .load(CredentialKind::RootCA, Path::new("/certs/AmazonRootCA1.pem"))
            .unwrap();
        store
    }

    #[test]
    fn accepts_matching_suffixes() {
        let mut store = CredentialStore::default();
        let status = store
            .load(CredentialKind::Certificate, Path::new("/tmp/device.crt"))
            .unwrap();
        assert_eq!(status, "Certificate loaded: device.crt");
        assert!(store.is_loaded(CredentialKind::Certificate));

        store
            .load(CredentialKind::Certificate, Path::new("/tmp/device.pem"))
            .unwrap();
        assert_eq!(
            store.get(CredentialKind::Certificate).unwrap().name,
            "device.pem"
        );
    }

    #[test]
    fn ready_only_when_all_three_loaded() {
        let mut store = CredentialStore::default();
        assert!(!store.is_ready());
        store
            .load(CredentialKind::Certificate, Path::new("a.crt"))
            .unwrap();
        store
            .load(CredentialKind::PrivateKey, Path::new("a.key"))
            .unwrap();
        assert!(!store.is_ready());
        assert!(store.files().is_none());
        store.load(CredentialKind::RootCA, Path::new("ca.pem")).unwrap();
        assert!(store.is_ready());
        assert!(store.files().is_some());
    }

    #[test]
    fn wrong_suffix_leaves_slot_and_ready_flag_untouched() {
        let mut store = CredentialStore::default();
        let err = store
            .load(CredentialKind::RootCA, Path::new("root.crt"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid Root CA file. Please use a .pem file.");
        assert!(!store.is_loaded(CredentialKind::RootCA));

        let mut store = full_store();
        let before = store.get(CredentialKind::PrivateKey).cloned();
        assert!(store
            .load(CredentialKind::PrivateKey, Path::new("/certs/other.pem"))
            .is_err());
        assert_eq!(store.get(CredentialKind::PrivateKey).cloned(), before);
        assert!(store.is_ready());
    }

    #[test]
    fn suffix_check_is_case_sensitive() {
        let mut store = CredentialStore::default();
        assert!(store
            .load(CredentialKind::PrivateKey, Path::new("DEVICE.KEY"))
            .is_err());
    }

    #[tokio::test]
    async fn read_all_reports_the_failing_slot() {
        let dir = std::env::temp_dir().join(format!("balltracker-creds-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let cert = dir.join("device.pem.crt");
        let key = dir.join("device.private.key");
        tokio::fs::write(&cert, b"CERT").await.unwrap();
        tokio::fs::write(&key, b"KEY").await.unwrap();

        let mut store = CredentialStore::default();
        store.load(CredentialKind::Certificate, &cert).unwrap();
        store.load(CredentialKind::PrivateKey, &key).unwrap();
        store
            .load(CredentialKind::RootCA, &dir.join("missing.pem"))
            .unwrap();

        match store.files().unwrap().read_all().await {
            Err(CredentialError::Read { kind, path, .. }) => {
                assert_eq!(kind, CredentialKind::RootCA);
                assert!(path.ends_with("missing.pem"));
            }
            other => panic!("expected read failure, got {:?}", other),
        }

        tokio::fs::write(dir.join("missing.pem"), b"CA").await.unwrap();
        let blobs = store.files().unwrap().read_all().await.unwrap();
        assert_eq!(blobs.certificate, b"CERT");
        assert_eq!(blobs.private_key, b"KEY");
        assert_eq!(blobs.root_ca, b"CA");

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
