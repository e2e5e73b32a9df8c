// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use statuswatch::domain::models::status::{StatusChange, StatusSnapshot};
use statuswatch::domain::services::monitor_service::MonitorService;
use statuswatch::domain::services::notification_service::{Notifier, NotifyError};
use statuswatch::engines::traits::{EngineError, StatusProbe};
use statuswatch::infrastructure::repositories::file_status_repo_impl::FileStatusRepository;
use std::sync::{Arc, Mutex};

/// 可切换返回值的探测桩，模拟门户状态随周期变化
struct ScriptedProbe {
    values: Mutex<Vec<&'static str>>,
}

impl ScriptedProbe {
    fn new(mut values: Vec<&'static str>) -> Self {
        values.reverse();
        Self {
            values: Mutex::new(values),
        }
    }
}

#[async_trait]
impl StatusProbe for ScriptedProbe {
    async fn probe(&self) -> Result<StatusSnapshot, EngineError> {
        let value = self
            .values
            .lock()
            .unwrap()
            .pop()
            .expect("probe script exhausted");
        Ok(StatusSnapshot::new(value))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct RecordingNotifier {
    calls: Mutex<Vec<StatusChange>>,
}

impl RecordingNotifier {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<StatusChange> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_change(&self, change: &StatusChange) -> Result<(), NotifyError> {
        self.calls.lock().unwrap().push(change.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

#[tokio::test]
async fn test_full_flow_with_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let repository = Arc::new(FileStatusRepository::new(dir.path().join("latest_status.txt")));
    let notifier = Arc::new(RecordingNotifier::new());
    let probe = Arc::new(ScriptedProbe::new(vec![
        "Applied",
        "Applied",
        "Shortlisted",
        "",
    ]));

    let service = MonitorService::new(probe, repository.clone(), notifier.clone());

    // 首次观测：空 -> Applied，持久化并通知
    let first = service.check_once().await.unwrap();
    assert!(first.changed());

    // 第二周期：无变化，无副作用
    let second = service.check_once().await.unwrap();
    assert!(!second.changed());

    // 第三周期：Applied -> Shortlisted
    let third = service.check_once().await.unwrap();
    assert!(third.changed());

    // 第四周期：状态清空，持久化但不发邮件
    let fourth = service.check_once().await.unwrap();
    assert!(fourth.changed());

    let calls = notifier.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].previous, "");
    assert_eq!(calls[0].current, "Applied");
    assert_eq!(calls[1].previous, "Applied");
    assert_eq!(calls[1].current, "Shortlisted");

    use statuswatch::domain::repositories::status_repository::StatusRepository;
    assert_eq!(repository.load_last().await.unwrap(), "");
}
