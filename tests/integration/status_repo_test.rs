// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use statuswatch::domain::repositories::status_repository::{RepositoryError, StatusRepository};
use statuswatch::infrastructure::repositories::file_status_repo_impl::FileStatusRepository;

#[tokio::test]
async fn test_status_survives_repository_recreation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latest_status.txt");

    {
        let repo = FileStatusRepository::new(path.clone());
        repo.store("Phone Screening Scheduled").await.unwrap();
    }

    // 新实例模拟下一个周期的进程重启
    let repo = FileStatusRepository::new(path);
    assert_eq!(repo.load_last().await.unwrap(), "Phone Screening Scheduled");
}

#[tokio::test]
async fn test_store_overwrites_previous_value() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileStatusRepository::new(dir.path().join("latest_status.txt"));

    repo.store("Applied").await.unwrap();
    repo.store("Interview Scheduled").await.unwrap();

    assert_eq!(repo.load_last().await.unwrap(), "Interview Scheduled");
}

#[tokio::test]
async fn test_store_empty_value_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileStatusRepository::new(dir.path().join("latest_status.txt"));

    repo.store("Applied").await.unwrap();
    repo.store("").await.unwrap();

    assert_eq!(repo.load_last().await.unwrap(), "");
}

#[tokio::test]
async fn test_store_into_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileStatusRepository::new(dir.path().join("no-such-dir").join("status.txt"));

    let err = repo.store("Applied").await.unwrap_err();
    assert!(matches!(err, RepositoryError::Io(_)));
}
