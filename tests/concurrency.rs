// ABOUTME: Concurrent operations on one deployment or the registry are serialized by locks.
// ABOUTME: Races tasks within one service and across services sharing a data directory.

mod support;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use otaflow::release::ReleaseOptions;
use otaflow::service::{LockBusy, LockError, Locks, Service};
use otaflow::store::{FileBackend, LockInfo, MemoryBackend};
use otaflow::types::{AccessKey, DeploymentName};
use otaflow::validator::{CommandError, ErrorKind};
use support::{APP, Content, OWNER, PRODUCTION, STAGING, service_with_app, settings};
use tokio::task::JoinSet;

fn file_service(dir: &Path) -> Service<FileBackend> {
    Service::new(FileBackend::new(dir), settings(OWNER))
}

async fn staging_key(service: &Service<FileBackend>) -> AccessKey {
    service
        .list_deployments(APP)
        .await
        .unwrap()
        .into_iter()
        .find(|d| d.name.as_str() == STAGING)
        .map(|d| d.key)
        .unwrap()
}

fn write_lock(dir: &Path, file: &str, info: &LockInfo) {
    let locks = dir.join("locks");
    std::fs::create_dir_all(&locks).unwrap();
    std::fs::write(locks.join(file), serde_json::to_string(info).unwrap()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_releases_get_distinct_labels() {
    let service = Arc::new(service_with_app().await);
    let content = Content::new();

    let mut tasks = JoinSet::new();
    for i in 0..12 {
        let service = Arc::clone(&service);
        let path = content.file(&format!("r{i}.js"), &format!("release {i}"));
        tasks.spawn(async move {
            service
                .release(APP, STAGING, &path, "1.0.0", &ReleaseOptions::default())
                .await
                .map(|outcome| outcome.package().label.to_string())
        });
    }

    let mut labels = BTreeSet::new();
    while let Some(joined) = tasks.join_next().await {
        labels.insert(joined.unwrap().unwrap());
    }

    let history = service.history(APP, STAGING).await.unwrap();
    assert_eq!(labels.len(), 12);
    assert_eq!(history.len(), 12);
    for (i, package) in history.packages().iter().enumerate() {
        assert_eq!(package.label.number().unwrap(), i as u64 + 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn deployments_do_not_block_each_other() {
    let service = Arc::new(service_with_app().await);
    let content = Content::new();
    let a = content.file("a.js", "a");
    let b = content.file("b.js", "b");

    let staging = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .release(APP, STAGING, &a, "1.0.0", &ReleaseOptions::default())
                .await
        })
    };
    let production = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .release(APP, PRODUCTION, &b, "1.0.0", &ReleaseOptions::default())
                .await
        })
    };

    let staging = staging.await.unwrap().unwrap();
    let production = production.await.unwrap().unwrap();
    assert_eq!(staging.package().label.as_str(), "v1");
    assert_eq!(production.package().label.as_str(), "v1");
}

#[tokio::test]
async fn held_lock_times_out_as_busy() {
    let backend = MemoryBackend::new();
    let key = AccessKey::generate();
    let name = DeploymentName::new(STAGING).unwrap();
    let locks = Locks::new(Duration::from_millis(50));

    let _held = locks.deployment(&backend, &key, &name).await.unwrap();
    let busy = match locks.deployment(&backend, &key, &name).await.unwrap_err() {
        LockError::Busy(busy) => busy,
        other => panic!("expected a busy lock, got {other:?}"),
    };
    assert!(matches!(busy, LockBusy::Deployment { ref deployment, .. } if *deployment == name));
    assert_eq!(CommandError::from(busy).kind(), ErrorKind::DeploymentBusy);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn services_sharing_a_directory_serialize_releases() {
    support::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    file_service(dir.path()).add_app(APP).await.unwrap();
    let content = Content::new();

    let mut tasks = JoinSet::new();
    for i in 0..16 {
        let service = file_service(dir.path());
        let path = content.file(&format!("r{i}.js"), &format!("release {i}"));
        tasks.spawn(async move {
            service
                .release(APP, STAGING, &path, "1.0.0", &ReleaseOptions::default())
                .await
                .map(|outcome| outcome.package().label.to_string())
        });
    }

    let mut labels = BTreeSet::new();
    while let Some(joined) = tasks.join_next().await {
        labels.insert(joined.unwrap().unwrap());
    }

    let history = file_service(dir.path()).history(APP, STAGING).await.unwrap();
    assert_eq!(labels.len(), 16);
    assert_eq!(history.len(), 16);
    for (i, package) in history.packages().iter().enumerate() {
        assert_eq!(package.label.number().unwrap(), i as u64 + 1);
    }
    assert_eq!(std::fs::read_dir(dir.path().join("locks")).unwrap().count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn services_sharing_a_directory_keep_every_app() {
    let dir = tempfile::tempdir().unwrap();

    let mut tasks = JoinSet::new();
    for i in 0..8 {
        let service = file_service(dir.path());
        tasks.spawn(async move { service.add_app(&format!("App {i}")).await.map(|_| ()) });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap().unwrap();
    }

    let apps = file_service(dir.path()).list_apps().await.unwrap();
    assert_eq!(apps.len(), 8);
}

#[tokio::test]
async fn lock_held_elsewhere_makes_commands_busy() {
    let dir = tempfile::tempdir().unwrap();
    let mut impatient = settings(OWNER);
    impatient.lock_timeout = Duration::from_millis(100);
    let service = Service::new(FileBackend::new(dir.path()), impatient);
    service.add_app(APP).await.unwrap();
    let key = staging_key(&service).await;
    let content = Content::new();
    let r1 = content.file("r1.js", "one");

    let mut holder = LockInfo::new("history");
    holder.holder = "build-agent-7".to_string();
    write_lock(dir.path(), &format!("history-{key}.lock"), &holder);
    let err = service
        .release(APP, STAGING, &r1, "1.0.0", &ReleaseOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DeploymentBusy);
    assert!(service.history(APP, STAGING).await.unwrap().is_empty());

    write_lock(dir.path(), "apps.lock", &holder);
    let err = service.add_app("Other").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RegistryBusy);
    assert_eq!(service.list_apps().await.unwrap().len(), 1);
}

#[tokio::test]
async fn stale_lock_is_broken() {
    let dir = tempfile::tempdir().unwrap();
    let service = file_service(dir.path());
    service.add_app(APP).await.unwrap();
    let key = staging_key(&service).await;
    let content = Content::new();
    let r1 = content.file("r1.js", "one");

    let mut abandoned = LockInfo::new("history");
    abandoned.started_at = chrono::Utc::now() - chrono::Duration::hours(1);
    write_lock(dir.path(), &format!("history-{key}.lock"), &abandoned);

    let outcome = service
        .release(APP, STAGING, &r1, "1.0.0", &ReleaseOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.package().label.as_str(), "v1");
    assert!(!dir.path().join("locks").join(format!("history-{key}.lock")).exists());
}
