//! End-to-end scenarios against the `Service` façade. `claim_next_batch`'s
//! `SKIP LOCKED` query is Postgres-only (see `dispatch_testing::store`), so
//! these exercise what the SQLite test store supports: job submission and
//! batching through `Service::submit_job`, and the `status`/`health`
//! lifecycle around `start`/`stop` — the parts of submission and service
//! lifecycle that don't require a live claim.

use dispatch::{DispatchConfig, JobKind, JobSpec, JobTemplate, Recipient, Service};
use dispatch_db::entity::batch::Entity as BatchEntity;
use dispatch_provider::NullProvider;
use dispatch_testing::test_store;
use sea_orm::EntityTrait;
use std::sync::Arc;
use uuid::Uuid;

fn template() -> JobTemplate {
    JobTemplate {
        subject: "Welcome".into(),
        html: "<p>Hi {{name}}</p>".into(),
        text: Some("Hi {{name}}".into()),
        from_email: "campaigns@example.com".into(),
        from_name: Some("Example Co".into()),
        reply_to: None,
        tags: vec!["welcome".into()],
    }
}

fn recipient(email: &str, name: &str) -> Recipient {
    Recipient { id: Uuid::new_v4().to_string(), email: email.into(), display_name: Some(name.into()), custom_fields: Default::default() }
}

async fn service_over_sqlite(config: DispatchConfig) -> (Service, dispatch_db::Store) {
    let store = test_store().await.unwrap();
    let provider: Arc<dyn dispatch_provider::Provider> = Arc::new(NullProvider::default());
    (Service::from_parts(store.clone(), provider, config).unwrap(), store)
}

#[tokio::test]
async fn happy_path_submission_splits_recipients_into_batches_of_two() {
    let config = DispatchConfig { batch_size: 2, ..DispatchConfig::default() };
    let (service, store) = service_over_sqlite(config).await;

    let spec = JobSpec::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        JobKind::Campaign,
        template(),
        vec![recipient("a@x.test", "Alice"), recipient("b@x.test", "Bob"), recipient("c@x.test", "Carol")],
    )
    .with_batch_size(2);

    let job_id = service.submit_job(spec).await.unwrap();

    let batches = BatchEntity::find().all(store.database().connection()).await.unwrap();
    let mut batches: Vec<_> = batches.into_iter().filter(|b| b.job_id == job_id).collect();
    batches.sort_by_key(|b| b.index);

    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].recipients.as_array().unwrap().len(), 2);
    assert_eq!(batches[1].recipients.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn submission_rejects_an_empty_recipient_list() {
    let (service, _store) = service_over_sqlite(DispatchConfig::default()).await;

    let spec = JobSpec::new(Uuid::new_v4(), Uuid::new_v4(), JobKind::Campaign, template(), vec![]);

    assert!(service.submit_job(spec).await.is_err());
}

#[tokio::test]
async fn status_reports_not_running_before_start_and_running_after() {
    let config = DispatchConfig { min_workers: 1, max_workers: 2, ..DispatchConfig::default() };
    let (mut service, _store) = service_over_sqlite(config).await;

    let status = service.status().await;
    assert!(status.initialized);
    assert!(!status.running);
    assert_eq!(status.worker_count, 0);

    service.start().await.unwrap();
    let status = service.status().await;
    assert!(status.running);
    assert_eq!(status.worker_count, 1);

    service.stop().await.unwrap();
    let status = service.status().await;
    assert!(!status.running);
}

#[tokio::test]
async fn health_is_healthy_immediately_after_start() {
    let config = DispatchConfig { min_workers: 1, max_workers: 2, ..DispatchConfig::default() };
    let (mut service, _store) = service_over_sqlite(config).await;

    service.start().await.unwrap();
    let health = service.health().await;
    assert!(health.healthy, "issues: {:?}", health.issues);
    assert!(health.components.monitor);
    assert!(health.components.retry);

    service.stop().await.unwrap();
}
