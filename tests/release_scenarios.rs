// ABOUTME: End-to-end release, patch, promote, and rollback scenarios through the service.
// ABOUTME: Runs against the in-memory backend with real content files.

mod support;

use otaflow::history::ReleaseMethod;
use otaflow::release::{
    PatchOptions, PromoteOptions, ReleaseOptions, ReleaseOutcome, RollbackOptions,
};
use otaflow::rollout::Rollout;
use otaflow::validator::ErrorKind;
use support::{APP, Content, PRODUCTION, STAGING, service_with_app};

fn labels(history: &otaflow::history::PackageHistory) -> Vec<String> {
    history
        .packages()
        .iter()
        .map(|p| p.label.to_string())
        .collect()
}

mod release {
    use super::*;

    #[tokio::test]
    async fn first_release_is_v1_full_upload() {
        let service = service_with_app().await;
        let content = Content::new();
        let r1 = content.file("r1.js", "console.log(1)");

        let outcome = service
            .release(APP, STAGING, &r1, "1.0.0", &ReleaseOptions::default())
            .await
            .unwrap();

        let package = outcome.package();
        assert!(outcome.is_released());
        assert_eq!(package.label.as_str(), "v1");
        assert_eq!(package.app_version.as_str(), "1.0.0");
        assert_eq!(package.rollout, Rollout::FULL);
        assert_eq!(package.release_method, ReleaseMethod::Upload);
    }

    #[tokio::test]
    async fn labels_are_sequential_across_binary_versions() {
        let service = service_with_app().await;
        let content = Content::new();

        for (i, version) in ["1.0.0", "2.0.0", "1.0.0", "^3.1.0"].iter().enumerate() {
            let path = content.file(&format!("r{i}.js"), &format!("release {i}"));
            service
                .release(APP, STAGING, &path, version, &ReleaseOptions::default())
                .await
                .unwrap();
        }

        let history = service.history(APP, STAGING).await.unwrap();
        assert_eq!(labels(&history), ["v1", "v2", "v3", "v4"]);
    }

    #[tokio::test]
    async fn directory_content_is_accepted() {
        let service = service_with_app().await;
        let content = Content::new();
        let dir = content.directory("bundle", &[("index.js", "main"), ("img/a.png", "png")]);

        let outcome = service
            .release(APP, STAGING, &dir, "1.0.0", &ReleaseOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.package().size, 7);
    }

    #[tokio::test]
    async fn metadata_is_recorded() {
        let service = service_with_app().await;
        let content = Content::new();
        let r1 = content.file("r1.js", "one");

        let options = ReleaseOptions::default()
            .with_description("this_is_a_description")
            .with_disabled(true)
            .with_mandatory(true);
        let package = service
            .release(APP, STAGING, &r1, "1.0.0", &options)
            .await
            .unwrap()
            .package()
            .clone();

        assert_eq!(package.description.as_deref(), Some("this_is_a_description"));
        assert!(package.is_disabled);
        assert!(package.is_mandatory);
    }

    #[tokio::test]
    async fn identical_content_same_version_rejected_then_allowed_after_other_release() {
        let service = service_with_app().await;
        let content = Content::new();
        let r1 = content.file("r1.js", "one");
        let r2 = content.file("r2.js", "two");
        let opts = ReleaseOptions::default();

        service.release(APP, STAGING, &r1, "1.0.0", &opts).await.unwrap();
        let err = service
            .release(APP, STAGING, &r1, "1.0.0", &opts)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReleaseIdentical);

        service.release(APP, STAGING, &r2, "1.0.0", &opts).await.unwrap();
        service.release(APP, STAGING, &r1, "1.0.0", &opts).await.unwrap();

        let history = service.history(APP, STAGING).await.unwrap();
        assert_eq!(labels(&history), ["v1", "v2", "v3"]);
    }

    #[tokio::test]
    async fn identical_content_on_other_binary_version_is_released() {
        let service = service_with_app().await;
        let content = Content::new();
        let r1 = content.file("r1.js", "one");
        let opts = ReleaseOptions::default();

        service.release(APP, STAGING, &r1, "1.0.0", &opts).await.unwrap();
        let outcome = service.release(APP, STAGING, &r1, "2.0.0", &opts).await.unwrap();
        assert_eq!(outcome.package().label.as_str(), "v2");
        assert_eq!(outcome.package().app_version.as_str(), "2.0.0");
    }

    #[tokio::test]
    async fn duplicate_is_skipped_when_allowed() {
        let service = service_with_app().await;
        let content = Content::new();
        let r1 = content.file("r1.js", "one");

        service
            .release(APP, STAGING, &r1, "1.0.0", &ReleaseOptions::default())
            .await
            .unwrap();
        let outcome = service
            .release(
                APP,
                STAGING,
                &r1,
                "1.0.0",
                &ReleaseOptions::default().allow_duplicate(),
            )
            .await
            .unwrap();

        assert!(matches!(outcome, ReleaseOutcome::SkippedDuplicate(ref p) if p.label.as_str() == "v1"));
        assert_eq!(service.history(APP, STAGING).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejections_leave_history_empty() {
        let service = service_with_app().await;
        let content = Content::new();
        let r1 = content.file("r1.js", "one");
        let zip = content.file("bundle.zip", "zip");
        let apk = content.file("app.apk", "apk");
        let ipa = content.file("app.ipa", "ipa");
        let empty = content.file("empty.js", "");
        let hollow = content.directory("hollow", &[("index.js", ""), ("assets/a.txt", "")]);
        let opts = ReleaseOptions::default();

        let cases = [
            (
                service.release("Ghost", STAGING, &r1, "1.0.0", &opts).await,
                ErrorKind::AppNotFound,
            ),
            (
                service.release(APP, "Nowhere", &r1, "1.0.0", &opts).await,
                ErrorKind::DeploymentNotFound,
            ),
            (
                service.release(APP, STAGING, &zip, "1.0.0", &opts).await,
                ErrorKind::BinaryZipRejected,
            ),
            (
                service.release(APP, STAGING, &apk, "1.0.0", &opts).await,
                ErrorKind::BinaryZipRejected,
            ),
            (
                service.release(APP, STAGING, &ipa, "1.0.0", &opts).await,
                ErrorKind::BinaryZipRejected,
            ),
            (
                service
                    .release(
                        APP,
                        STAGING,
                        &content.path().join("not_a_real_update"),
                        "1.0.0",
                        &opts,
                    )
                    .await,
                ErrorKind::BundleNotFound,
            ),
            (
                service.release(APP, STAGING, &empty, "1.0.0", &opts).await,
                ErrorKind::BundleEmpty,
            ),
            (
                service.release(APP, STAGING, &hollow, "1.0.0", &opts).await,
                ErrorKind::BundleEmpty,
            ),
            (
                service
                    .release(APP, STAGING, &r1, "not_real_semver", &opts)
                    .await,
                ErrorKind::InvalidSemver,
            ),
        ];

        for (result, kind) in cases {
            assert_eq!(result.unwrap_err().kind(), kind);
        }

        for rollout in [0, -50, 150] {
            let err = service
                .release(
                    APP,
                    STAGING,
                    &r1,
                    "1.0.0",
                    &ReleaseOptions::default().with_rollout(rollout),
                )
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidRollout);
        }

        assert!(service.history(APP, STAGING).await.unwrap().is_empty());
    }
}

mod rollout {
    use super::*;

    #[tokio::test]
    async fn partial_rollout_blocks_until_patched_to_full() {
        let service = service_with_app().await;
        let content = Content::new();
        let r1 = content.file("r1.js", "one");
        let r2 = content.file("r2.js", "two");

        service
            .release(
                APP,
                STAGING,
                &r1,
                "1.0.0",
                &ReleaseOptions::default().with_rollout(50),
            )
            .await
            .unwrap();

        for version in ["1.0.0", "2.0.0"] {
            let err = service
                .release(APP, STAGING, &r2, version, &ReleaseOptions::default())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::RollbackInProgress);
        }

        let patched = service
            .patch(APP, STAGING, &PatchOptions::default().with_rollout(100))
            .await
            .unwrap();
        assert_eq!(patched.rollout, Rollout::FULL);

        let outcome = service
            .release(APP, STAGING, &r2, "1.0.0", &ReleaseOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.package().label.as_str(), "v2");
    }

    #[tokio::test]
    async fn disabled_partial_rollout_does_not_block() {
        let service = service_with_app().await;
        let content = Content::new();
        let r1 = content.file("r1.js", "one");
        let r2 = content.file("r2.js", "two");

        service
            .release(
                APP,
                STAGING,
                &r1,
                "1.0.0",
                &ReleaseOptions::default().with_rollout(50).with_disabled(true),
            )
            .await
            .unwrap();
        let outcome = service
            .release(
                APP,
                STAGING,
                &r2,
                "1.0.0",
                &ReleaseOptions::default().with_rollout(50),
            )
            .await
            .unwrap();
        assert_eq!(outcome.package().label.as_str(), "v2");
        assert_eq!(outcome.package().rollout, Rollout::new(50).unwrap());
    }

    #[tokio::test]
    async fn partial_after_full_on_other_version() {
        let service = service_with_app().await;
        let content = Content::new();
        let r1 = content.file("r1.js", "one");
        let r2 = content.file("r2.js", "two");

        service
            .release(APP, STAGING, &r1, "2.0.0", &ReleaseOptions::default())
            .await
            .unwrap();
        let outcome = service
            .release(
                APP,
                STAGING,
                &r2,
                "1.0.0",
                &ReleaseOptions::default().with_rollout(50),
            )
            .await
            .unwrap();
        assert_eq!(outcome.package().rollout.value(), 50);
    }
}

mod patch {
    use super::*;

    async fn released_service() -> otaflow::service::Service<otaflow::store::MemoryBackend> {
        let service = service_with_app().await;
        let content = Content::new();
        let r1 = content.file("r1.js", "one");
        service
            .release(
                APP,
                STAGING,
                &r1,
                "1.0.0",
                &ReleaseOptions::default().with_rollout(25),
            )
            .await
            .unwrap();
        service
    }

    #[tokio::test]
    async fn label_only_is_none_specified() {
        let service = service_with_app().await;
        let err = service
            .patch(APP, STAGING, &PatchOptions::for_label("v1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PatchNoneSpecified);
    }

    #[tokio::test]
    async fn empty_deployment_has_no_releases() {
        let service = service_with_app().await;
        let err = service
            .patch(APP, STAGING, &PatchOptions::default().with_mandatory(true))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeploymentNoReleases);
    }

    #[tokio::test]
    async fn all_fields_update_in_place() {
        let service = released_service().await;
        let options = PatchOptions::for_label("v1")
            .with_description("new description")
            .with_disabled(true)
            .with_mandatory(true)
            .with_rollout(75)
            .with_target_binary_version("1.0.1");

        service.patch(APP, STAGING, &options).await.unwrap();
        let history = service.history(APP, STAGING).await.unwrap();
        let v1 = &history.packages()[0];

        assert_eq!(history.len(), 1);
        assert_eq!(v1.label.as_str(), "v1");
        assert_eq!(v1.description.as_deref(), Some("new description"));
        assert!(v1.is_disabled);
        assert!(v1.is_mandatory);
        assert_eq!(v1.rollout.value(), 75);
        assert_eq!(v1.app_version.as_str(), "1.0.1");
    }

    #[tokio::test]
    async fn rollout_rules() {
        let service = released_service().await;

        let err = service
            .patch(APP, STAGING, &PatchOptions::default().with_rollout(25))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RolloutMustIncrease);

        let err = service
            .patch(APP, STAGING, &PatchOptions::default().with_rollout(10))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RolloutMustIncrease);

        for bad in [0, -50, 150] {
            let err = service
                .patch(APP, STAGING, &PatchOptions::default().with_rollout(bad))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidRollout);
        }

        service
            .patch(APP, STAGING, &PatchOptions::default().with_rollout(100))
            .await
            .unwrap();
        let err = service
            .patch(APP, STAGING, &PatchOptions::default().with_rollout(100))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RolloutAgainstFull);
    }

    #[tokio::test]
    async fn unknown_label_and_bad_semver() {
        let service = released_service().await;

        let err = service
            .patch(
                APP,
                STAGING,
                &PatchOptions::for_label("v1000").with_description("x"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PatchLabelNotFound);

        let err = service
            .patch(
                APP,
                STAGING,
                &PatchOptions::default().with_target_binary_version("not_real_semver"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSemver);
    }
}

mod promote {
    use super::*;

    #[tokio::test]
    async fn copies_latest_enabled_release() {
        let service = service_with_app().await;
        let content = Content::new();
        let r1 = content.file("r1.js", "one");
        let r2 = content.file("r2.js", "two");

        service
            .release(
                APP,
                STAGING,
                &r1,
                "1.0.0",
                &ReleaseOptions::default().with_description("good"),
            )
            .await
            .unwrap();
        service
            .release(
                APP,
                STAGING,
                &r2,
                "1.0.0",
                &ReleaseOptions::default().with_disabled(true),
            )
            .await
            .unwrap();

        let outcome = service
            .promote(APP, STAGING, PRODUCTION, &PromoteOptions::default())
            .await
            .unwrap();
        let staging = service.history(APP, STAGING).await.unwrap();
        let promoted = outcome.package();

        assert_eq!(promoted.label.as_str(), "v1");
        assert_eq!(promoted.release_method, ReleaseMethod::Promote);
        assert_eq!(promoted.package_hash, staging.packages()[0].package_hash);
        assert_eq!(promoted.description.as_deref(), Some("good"));
        assert!(!promoted.is_disabled);
    }

    #[tokio::test]
    async fn overrides_apply() {
        let service = service_with_app().await;
        let content = Content::new();
        let r1 = content.file("r1.js", "one");
        service
            .release(APP, STAGING, &r1, "1.0.0", &ReleaseOptions::default())
            .await
            .unwrap();

        let options = PromoteOptions::default()
            .with_description("prod")
            .with_mandatory(true)
            .with_rollout(30)
            .with_target_binary_version("^1.0.0");
        let promoted = service
            .promote(APP, STAGING, PRODUCTION, &options)
            .await
            .unwrap()
            .package()
            .clone();

        assert_eq!(promoted.description.as_deref(), Some("prod"));
        assert!(promoted.is_mandatory);
        assert_eq!(promoted.rollout.value(), 30);
        assert_eq!(promoted.app_version.as_str(), "^1.0.0");
    }

    #[tokio::test]
    async fn errors() {
        let service = service_with_app().await;
        let err = service
            .promote(APP, STAGING, PRODUCTION, &PromoteOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PromoteNoReleases);

        let err = service
            .promote(APP, "Nowhere", PRODUCTION, &PromoteOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeploymentNotFound);

        let content = Content::new();
        let r1 = content.file("r1.js", "one");
        service
            .release(APP, STAGING, &r1, "1.0.0", &ReleaseOptions::default())
            .await
            .unwrap();
        service
            .promote(APP, STAGING, PRODUCTION, &PromoteOptions::default())
            .await
            .unwrap();
        let err = service
            .promote(APP, STAGING, PRODUCTION, &PromoteOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReleaseIdentical);

        let outcome = service
            .promote(
                APP,
                STAGING,
                PRODUCTION,
                &PromoteOptions::default().allow_duplicate(),
            )
            .await
            .unwrap();
        assert!(!outcome.is_released());
    }

    #[tokio::test]
    async fn pending_partial_rollout_in_destination_blocks() {
        let service = service_with_app().await;
        let content = Content::new();
        let r1 = content.file("r1.js", "one");
        let r2 = content.file("r2.js", "two");

        service
            .release(
                APP,
                PRODUCTION,
                &r1,
                "1.0.0",
                &ReleaseOptions::default().with_rollout(50),
            )
            .await
            .unwrap();
        service
            .release(APP, STAGING, &r2, "1.0.0", &ReleaseOptions::default())
            .await
            .unwrap();
        let before = service.history(APP, PRODUCTION).await.unwrap();

        let err = service
            .promote(APP, STAGING, PRODUCTION, &PromoteOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RollbackInProgress);
        assert_eq!(service.history(APP, PRODUCTION).await.unwrap(), before);
        assert_eq!(before.len(), 1);
    }

    #[tokio::test]
    async fn disabled_partial_rollout_in_destination_does_not_block() {
        let service = service_with_app().await;
        let content = Content::new();
        let r1 = content.file("r1.js", "one");
        let r2 = content.file("r2.js", "two");

        service
            .release(
                APP,
                PRODUCTION,
                &r1,
                "1.0.0",
                &ReleaseOptions::default().with_rollout(50).with_disabled(true),
            )
            .await
            .unwrap();
        service
            .release(APP, STAGING, &r2, "1.0.0", &ReleaseOptions::default())
            .await
            .unwrap();

        let outcome = service
            .promote(APP, STAGING, PRODUCTION, &PromoteOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.package().label.as_str(), "v2");
        assert_eq!(outcome.package().rollout, Rollout::FULL);
        assert_eq!(service.history(APP, PRODUCTION).await.unwrap().len(), 2);
    }
}

mod rollback {
    use super::*;

    #[tokio::test]
    async fn rollback_copies_previous_release() {
        let service = service_with_app().await;
        let content = Content::new();
        let r1 = content.file("r1.js", "one");
        let r2 = content.file("r2.js", "two");

        service
            .release(APP, STAGING, &r1, "1.0.0", &ReleaseOptions::default())
            .await
            .unwrap();
        service
            .release(APP, STAGING, &r2, "1.0.0", &ReleaseOptions::default())
            .await
            .unwrap();

        let package = service
            .rollback(APP, STAGING, &RollbackOptions::default())
            .await
            .unwrap();
        let history = service.history(APP, STAGING).await.unwrap();
        let v1 = &history.packages()[0];

        assert_eq!(labels(&history), ["v1", "v2", "v3"]);
        assert_eq!(package.label.as_str(), "v3");
        assert_eq!(package.release_method, ReleaseMethod::Rollback);
        assert_eq!(package.package_hash, v1.package_hash);
        assert_eq!(package.app_version, v1.app_version);
        assert_eq!(package.size, v1.size);
    }

    #[tokio::test]
    async fn rollback_to_explicit_label() {
        let service = service_with_app().await;
        let content = Content::new();
        for i in 0..3 {
            let path = content.file(&format!("r{i}.js"), &format!("body {i}"));
            service
                .release(APP, STAGING, &path, "1.0.0", &ReleaseOptions::default())
                .await
                .unwrap();
        }

        let package = service
            .rollback(APP, STAGING, &RollbackOptions::to_label("v1"))
            .await
            .unwrap();
        let history = service.history(APP, STAGING).await.unwrap();
        assert_eq!(package.label.as_str(), "v4");
        assert_eq!(package.package_hash, history.packages()[0].package_hash);
    }

    #[tokio::test]
    async fn rollback_errors() {
        let service = service_with_app().await;
        let err = service
            .rollback(APP, STAGING, &RollbackOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RollbackNoReleases);

        let content = Content::new();
        let r1 = content.file("r1.js", "one");
        service
            .release(APP, STAGING, &r1, "1.0.0", &ReleaseOptions::default())
            .await
            .unwrap();

        let cases = [
            (RollbackOptions::default(), ErrorKind::RollbackNoPriorReleases),
            (RollbackOptions::to_label("v1"), ErrorKind::RollbackAlreadyLatest),
            (RollbackOptions::to_label("v7"), ErrorKind::RollbackLabelNotFound),
        ];
        for (options, kind) in cases {
            let err = service.rollback(APP, STAGING, &options).await.unwrap_err();
            assert_eq!(err.kind(), kind);
        }
        assert_eq!(service.history(APP, STAGING).await.unwrap().len(), 1);
    }
}

mod clear {
    use super::*;

    #[tokio::test]
    async fn clear_restarts_labels() {
        let service = service_with_app().await;
        let content = Content::new();
        let r1 = content.file("r1.js", "one");
        let r2 = content.file("r2.js", "two");

        service
            .release(APP, STAGING, &r1, "1.0.0", &ReleaseOptions::default())
            .await
            .unwrap();
        service.clear_history(APP, STAGING).await.unwrap();
        assert!(service.history(APP, STAGING).await.unwrap().is_empty());

        let outcome = service
            .release(APP, STAGING, &r2, "1.0.0", &ReleaseOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.package().label.as_str(), "v1");
    }
}
