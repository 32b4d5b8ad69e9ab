// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup, in-memory services, and update content fixtures.

use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use otaflow::service::{Service, ServiceSettings};
use otaflow::store::MemoryBackend;
use otaflow::types::Email;

static TRACING_INIT: Once = Once::new();

pub const OWNER: &str = "owner@example.com";
pub const APP: &str = "Demo";
pub const STAGING: &str = "Staging";
pub const PRODUCTION: &str = "Production";

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("otaflow=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[allow(dead_code)]
pub fn settings(account: &str) -> ServiceSettings {
    let mut settings = ServiceSettings::for_account(Email::new(account).unwrap());
    settings.lock_timeout = Duration::from_secs(5);
    settings
}

/// A fresh in-memory service acting as [`OWNER`], with [`APP`] already
/// created.
#[allow(dead_code)]
pub async fn service_with_app() -> Service<MemoryBackend> {
    init_tracing();
    let service = Service::new(MemoryBackend::new(), settings(OWNER));
    service.add_app(APP).await.unwrap();
    service
}

/// Named files of update content in a temporary directory.
#[allow(dead_code)]
pub struct Content {
    dir: tempfile::TempDir,
}

#[allow(dead_code)]
impl Content {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Write a file named `name` with `body` and return its path.
    pub fn file(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    /// Write a directory named `name` holding the given files.
    pub fn directory(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let root = self.dir.path().join(name);
        for (relative, body) in files {
            let path = root.join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, body).unwrap();
        }
        root
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
