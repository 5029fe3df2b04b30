//! Pipeline tests against in-memory store and repository fakes.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use chrono::{NaiveDate, Utc};
use quill_shared::config::UploadConfig;
use quill_shared::types::PageRequest;
use uuid::Uuid;

use super::*;
use crate::storage::{
    CdnResolver, DeleteOutcome, ObjectStore, ObjectVersion, OpendalStore, StorageError,
    StoredObject,
};

#[derive(Debug, Default)]
struct FakeStore {
    objects: Mutex<HashMap<String, Bytes>>,
    put_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fail_put: bool,
    fail_delete: HashSet<String>,
    fail_all_deletes: bool,
}

impl FakeStore {
    fn contains(&self, path: &str) -> bool {
        self.objects.lock().unwrap().contains_key(path)
    }

    fn get(&self, path: &str) -> Option<Bytes> {
        self.objects.lock().unwrap().get(path).cloned()
    }

    fn seed(&self, path: &str) {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), Bytes::from_static(b"seed"));
    }
}

impl ObjectStore for FakeStore {
    async fn stat(&self, path: &str) -> Result<Option<ObjectVersion>, StorageError> {
        Ok(self.contains(path).then(|| ObjectVersion {
            path: path.to_string(),
            sha: "fake".into(),
        }))
    }

    async fn put(&self, path: &str, data: Bytes, _message: &str) -> Result<StoredObject, StorageError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_put {
            return Err(StorageError::remote(409, "sha does not match"));
        }
        self.objects.lock().unwrap().insert(path.to_string(), data);
        Ok(StoredObject {
            path: path.to_string(),
            sha: Some("fake".into()),
        })
    }

    async fn delete(&self, path: &str, _message: &str) -> Result<DeleteOutcome, StorageError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_all_deletes || self.fail_delete.contains(path) {
            return Err(StorageError::Transport("connection reset".into()));
        }
        Ok(match self.objects.lock().unwrap().remove(path) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::AlreadyAbsent,
        })
    }
}

#[derive(Debug, Default)]
struct FakeRepo {
    records: Mutex<Vec<MediaRecord>>,
    attempted: Mutex<Vec<String>>,
    /// Number of inserts to reject with a category constraint violation.
    reject_categories: AtomicUsize,
    fail_insert: bool,
}

impl FakeRepo {
    fn rejecting(times: usize) -> Self {
        Self {
            reject_categories: AtomicUsize::new(times),
            ..Self::default()
        }
    }

    fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn find_path(&self, path: &str) -> Option<MediaRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.path == path)
            .cloned()
    }

    fn attempted(&self) -> Vec<String> {
        self.attempted.lock().unwrap().clone()
    }

    fn seed(&self, path: &str, category: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.records.lock().unwrap().push(MediaRecord {
            id,
            filename: "seed.png".into(),
            url: format!("https://cdn.example.com/o/r/main/{path}"),
            path: path.to_string(),
            size: 4,
            category: category.to_string(),
            created_at: Utc::now(),
        });
        id
    }
}

impl MediaRepository for FakeRepo {
    async fn insert(&self, record: NewMediaRecord) -> Result<MediaRecord, RepositoryError> {
        self.attempted.lock().unwrap().push(record.category.clone());
        if self.fail_insert {
            return Err(RepositoryError::other("connection refused"));
        }
        let rejected = self
            .reject_categories
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(RepositoryError::CategoryRejected(record.category));
        }
        let stored = MediaRecord {
            id: Uuid::new_v4(),
            filename: record.filename,
            url: record.url,
            path: record.path,
            size: record.size,
            category: record.category,
            created_at: Utc::now(),
        };
        self.records.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MediaRecord>, RepositoryError> {
        Ok(self.records.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<MediaRecord>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64, RepositoryError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| !ids.contains(&r.id));
        Ok((before - records.len()) as u64)
    }

    async fn list(
        &self,
        category: Option<&str>,
        page: &PageRequest,
    ) -> Result<(Vec<MediaRecord>, u64), RepositoryError> {
        let mut matching: Vec<MediaRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| category.is_none_or(|c| r.category == c))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as u64;
        let data = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok((data, total))
    }
}

fn cdn() -> CdnResolver {
    CdnResolver::new("cdn.example.com", "alice", "assets", "main").unwrap()
}

fn upload_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

fn service<S: ObjectStore + 'static>(store: &Arc<S>, repo: &Arc<FakeRepo>) -> MediaService<S, FakeRepo> {
    MediaService::new(
        Arc::clone(store),
        Arc::clone(repo),
        cdn(),
        UploadConfig::default(),
    )
    .with_clock(Arc::new(FixedClock(upload_day())))
}

fn png(bytes: usize) -> UploadInput {
    UploadInput::new(vec![0x89; bytes], "image/png", "cat.png", MediaType::Post)
}

#[tokio::test]
async fn test_example_post_upload() {
    let store = Arc::new(FakeStore::default());
    let repo = Arc::new(FakeRepo::default());
    let media = service(&store, &repo);

    let result = media.upload(png(2048).with_context("42")).await.unwrap();

    let rest = result.path.strip_prefix("posts/42-20260115/").unwrap();
    let id = rest.strip_suffix(".png").unwrap();
    assert!(Uuid::parse_str(id).is_ok());
    assert_eq!(result.url, cdn().resolve(&result.path));
    assert_eq!(
        result.url,
        format!("https://cdn.example.com/alice/assets/main/{}", result.path)
    );

    let record = repo.find_path(&result.path).unwrap();
    assert_eq!(record.id, result.id);
    assert_eq!(record.category, "blog");
    assert_eq!(record.size, 2048);
    assert_eq!(record.filename, "cat.png");
    assert_eq!(store.get(&result.path).unwrap().len(), 2048);
}

#[tokio::test]
async fn test_successful_upload_has_record_and_object() {
    let store = Arc::new(FakeStore::default());
    let repo = Arc::new(FakeRepo::default());
    let media = service(&store, &repo);

    for media_type in [MediaType::Site, MediaType::Other, MediaType::Post] {
        let input = UploadInput::new(vec![1; 10], "image/webp", "banner.webp", media_type);
        let result = media.upload(input).await.unwrap();
        assert!(store.contains(&result.path));
        assert!(repo.find_path(&result.path).is_some());
    }
    assert_eq!(repo.count(), 3);
}

#[tokio::test]
async fn test_insert_failure_rolls_back_object() {
    let store = Arc::new(FakeStore::default());
    let repo = Arc::new(FakeRepo {
        fail_insert: true,
        ..FakeRepo::default()
    });
    let media = service(&store, &repo);

    let err = media.upload(png(16)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Database);
    assert_eq!(store.put_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.delete_calls.load(Ordering::SeqCst), 1);
    assert!(store.objects.lock().unwrap().is_empty());
    assert_eq!(repo.count(), 0);
}

#[tokio::test]
async fn test_failed_rollback_keeps_insert_error() {
    let store = Arc::new(FakeStore {
        fail_all_deletes: true,
        ..FakeStore::default()
    });
    let repo = Arc::new(FakeRepo {
        fail_insert: true,
        ..FakeRepo::default()
    });
    let media = service(&store, &repo);

    let err = media.upload(png(16)).await.unwrap_err();

    assert!(matches!(err, MediaError::Database(ref m) if m.contains("connection refused")));
    assert_eq!(store.delete_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_store_failure_creates_no_record() {
    let store = Arc::new(FakeStore {
        fail_put: true,
        ..FakeStore::default()
    });
    let repo = Arc::new(FakeRepo::default());
    let media = service(&store, &repo);

    let err = media.upload(png(16)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Upload);
    assert!(err.to_string().contains("sha does not match"));
    assert!(repo.attempted().is_empty());
    assert_eq!(store.delete_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_post_fallback_stores_blog() {
    let store = Arc::new(FakeStore::default());
    let repo = Arc::new(FakeRepo::rejecting(1));
    let media = service(&store, &repo);

    let result = media.upload(png(16).with_context("7")).await.unwrap();

    assert_eq!(repo.attempted(), vec!["blog", "blog"]);
    let record = repo.find_path(&result.path).unwrap();
    assert_eq!(record.category, "blog");
    assert_ne!(record.category, "post");
}

#[tokio::test]
async fn test_non_post_fallback_stores_other() {
    let store = Arc::new(FakeStore::default());
    let repo = Arc::new(FakeRepo::rejecting(1));
    let media = service(&store, &repo);

    let input = UploadInput::new(vec![1; 4], "image/png", "face.png", MediaType::Avatar)
        .with_owner("user-9");
    let result = media.upload(input).await.unwrap();

    assert_eq!(repo.attempted(), vec!["avatar", "other"]);
    assert_eq!(repo.find_path(&result.path).unwrap().category, "other");
}

#[tokio::test]
async fn test_failed_fallback_surfaces_retry_error_and_rolls_back() {
    let store = Arc::new(FakeStore::default());
    let repo = Arc::new(FakeRepo::rejecting(2));
    let media = service(&store, &repo);

    let input = UploadInput::new(vec![1; 4], "image/png", "logo.png", MediaType::Site);
    let err = media.upload(input).await.unwrap_err();

    assert!(matches!(err, MediaError::Database(ref m) if m.contains("other")));
    assert_eq!(repo.attempted(), vec!["site", "other"]);
    assert!(store.objects.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_avatar_path_is_reused() {
    let store = Arc::new(FakeStore::default());
    let repo = Arc::new(FakeRepo::default());
    let media = service(&store, &repo);

    let first = media
        .upload(
            UploadInput::new(vec![1; 4], "image/png", "a.png", MediaType::Avatar).with_owner("u1"),
        )
        .await
        .unwrap();
    let second = media
        .upload(
            UploadInput::new(vec![2; 8], "image/png", "b.png", MediaType::Avatar).with_owner("u1"),
        )
        .await
        .unwrap();

    assert_eq!(first.path, "avatars/u1.png");
    assert_eq!(first.path, second.path);
    assert_eq!(first.url, second.url);
    assert_eq!(store.get(&second.path), Some(Bytes::from(vec![2; 8])));
}

#[tokio::test]
async fn test_disallowed_mime_never_touches_store() {
    let store = Arc::new(FakeStore::default());
    let repo = Arc::new(FakeRepo::default());
    let media = service(&store, &repo);

    let input = UploadInput::new(vec![1; 4], "application/pdf", "doc.pdf", MediaType::Other);
    let err = media.upload(input).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(store.put_calls.load(Ordering::SeqCst), 0);
    assert!(repo.attempted().is_empty());
}

#[tokio::test]
async fn test_other_validation_failures_have_no_side_effects() {
    let store = Arc::new(FakeStore::default());
    let repo = Arc::new(FakeRepo::default());
    let media = MediaService::new(
        Arc::clone(&store),
        Arc::clone(&repo),
        cdn(),
        UploadConfig::default().with_max_file_size(8),
    );

    let cases = [
        UploadInput::new(Vec::<u8>::new(), "image/png", "a.png", MediaType::Site),
        UploadInput::new(vec![0; 9], "image/png", "a.png", MediaType::Site),
        UploadInput::new(vec![0; 4], "image/png", "a.png", MediaType::Avatar),
        UploadInput::new(vec![0; 4], "image/png", "a.png", MediaType::Avatar).with_owner("  "),
    ];
    for input in cases {
        let err = media.upload(input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert_eq!(store.put_calls.load(Ordering::SeqCst), 0);
    assert!(repo.attempted().is_empty());
}

#[tokio::test]
async fn test_mime_parameters_and_case_are_ignored() {
    let store = Arc::new(FakeStore::default());
    let repo = Arc::new(FakeRepo::default());
    let media = service(&store, &repo);

    let input = UploadInput::new(vec![1; 4], "IMAGE/JPEG; q=1", "photo", MediaType::Site);
    let result = media.upload(input).await.unwrap();
    assert!(result.path.ends_with(".jpg"));
}

#[tokio::test]
async fn test_extension_follows_checked_mime_type() {
    let store = Arc::new(FakeStore::default());
    let repo = Arc::new(FakeRepo::default());
    let media = service(&store, &repo);

    let input = UploadInput::new(vec![1; 4], "image/png", "evil.html", MediaType::Site);
    let result = media.upload(input).await.unwrap();
    assert!(result.path.starts_with("site/"));
    assert!(result.path.ends_with(".png"), "{}", result.path);
    assert!(result.url.ends_with(".png"));
    assert!(store.contains(&result.path));

    let input = UploadInput::new(vec![1; 4], "image/jpeg", "scan.JPEG", MediaType::Site);
    let result = media.upload(input).await.unwrap();
    assert!(result.path.ends_with(".jpeg"), "{}", result.path);
}

#[tokio::test]
async fn test_delete_survives_object_failure() {
    let store = Arc::new(FakeStore {
        fail_delete: HashSet::from(["site/b.png".to_string()]),
        ..FakeStore::default()
    });
    let repo = Arc::new(FakeRepo::default());
    let mut ids = Vec::new();
    for path in ["site/a.png", "site/b.png", "site/c.png"] {
        store.seed(path);
        ids.push(repo.seed(path, "site"));
    }
    let media = service(&store, &repo);

    let report = media.delete(&ids).await.unwrap();

    assert_eq!(report.records_deleted, 3);
    assert_eq!(report.objects_deleted, 2);
    assert_eq!(report.object_failures.len(), 1);
    assert_eq!(report.object_failures[0].path, "site/b.png");
    assert_eq!(repo.count(), 0);
    assert!(store.contains("site/b.png"));
}

#[tokio::test]
async fn test_delete_missing_object_is_not_an_error() {
    let store = Arc::new(OpendalStore::memory().unwrap());
    let repo = Arc::new(FakeRepo::default());
    let id = repo.seed("others/20260115/gone.png", "other");
    let media = service(&store, &repo);

    let report = media.delete(&[id]).await.unwrap();

    assert_eq!(report.records_deleted, 1);
    assert_eq!(report.objects_missing, 1);
    assert!(report.object_failures.is_empty());
}

#[tokio::test]
async fn test_delete_skips_unknown_ids() {
    let store = Arc::new(FakeStore::default());
    let repo = Arc::new(FakeRepo::default());
    store.seed("site/a.png");
    let id = repo.seed("site/a.png", "site");
    let media = service(&store, &repo);

    let report = media.delete(&[Uuid::new_v4(), id]).await.unwrap();

    assert_eq!(report.records_deleted, 1);
    assert_eq!(report.objects_deleted, 1);
    assert_eq!(store.delete_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_delete_rejects_empty_and_unknown() {
    let store = Arc::new(FakeStore::default());
    let repo = Arc::new(FakeRepo::default());
    let media = service(&store, &repo);

    let err = media.delete(&[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = media.delete(&[Uuid::new_v4()]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(store.delete_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_upload_then_delete_on_opendal() {
    let store = Arc::new(OpendalStore::memory().unwrap());
    let repo = Arc::new(FakeRepo::default());
    let media = service(&store, &repo);

    let result = media.upload(png(64).with_context("9")).await.unwrap();
    assert_eq!(store.read(&result.path).await.unwrap().len(), 64);

    let report = media.delete(&[result.id]).await.unwrap();
    assert_eq!(report.objects_deleted, 1);
    assert_eq!(store.stat(&result.path).await.unwrap(), None);
}

#[tokio::test]
async fn test_list_and_get() {
    let store = Arc::new(FakeStore::default());
    let repo = Arc::new(FakeRepo::default());
    let media = service(&store, &repo);

    let post = media.upload(png(4)).await.unwrap();
    media
        .upload(UploadInput::new(vec![1; 4], "image/png", "l.png", MediaType::Site))
        .await
        .unwrap();

    let all = media.list(None, PageRequest::default()).await.unwrap();
    assert_eq!(all.meta.total, 2);

    let posts = media
        .list(Some(MediaType::Post), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(posts.data.len(), 1);
    assert_eq!(posts.data[0].id, post.id);

    assert_eq!(media.get(post.id).await.unwrap().path, post.path);
    let err = media.get(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
