use std::path::Path;

use super::*;

#[test]
fn begin_names_the_package_manager_and_root() {
    let begin = begin_payload(Path::new("/ws/app"), PackageManager::Npm);
    assert_eq!(begin.title, "xref-analyzer: Installing dependencies");
    assert_eq!(begin.message.as_deref(), Some("npm install in /ws/app"));
    assert_eq!(begin.percentage, Some(0));
    assert_eq!(begin.cancellable, Some(false));
}

#[test]
fn steps_become_reports() {
    let report = report_payload(&InstallEvent::Step {
        message: "Fetching packages".to_string(),
        current: 2,
        total: 4,
    })
    .unwrap();
    assert_eq!(report.message.as_deref(), Some("Fetching packages"));
    assert_eq!(report.percentage, Some(50));

    let unknown_total = report_payload(&InstallEvent::Step {
        message: "Linking".to_string(),
        current: 1,
        total: 0,
    })
    .unwrap();
    assert_eq!(unknown_total.percentage, None);
}

#[test]
fn other_events_are_not_reported() {
    assert!(report_payload(&InstallEvent::Info("yarn install v1.22".to_string())).is_none());
    assert!(report_payload(&InstallEvent::Warning("peer dependency".to_string())).is_none());
    assert!(report_payload(&InstallEvent::Error("network".to_string())).is_none());
}

#[test]
fn end_message_carries_the_outcome() {
    assert_eq!(end_message(&Ok(())), "Dependencies installed");
    let failed = Err(BootstrapError::CommandNotFound("yarn".to_string()));
    assert_eq!(end_message(&failed), "Dependency install failed: yarn is not available");
}
