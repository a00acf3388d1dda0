use std::sync::Arc;

use confsched_app_lib::db::repositories::schedule_repository::ScheduleRepository;
use confsched_app_lib::db::DbPool;
use confsched_app_lib::error::AppError;
use confsched_app_lib::models::conflict::{ConflictType, ScanOptions};
use confsched_app_lib::models::forced_conflict::ForceConflictInput;
use confsched_app_lib::models::records::{
    PlacementCandidate, RoomRecord, SessionRecord, SlotRecord, SpeakerRecord, TalkRecord,
    TrackRecord,
};
use confsched_app_lib::models::settings::EngineConfig;
use confsched_app_lib::services::conflict_service::ConflictService;
use futures::future::join_all;
use tempfile::tempdir;

const EDITION: &str = "rustconf-2024";

fn seed(pool: &DbPool) {
    pool.with_connection(|conn| {
        for (id, name) in [("hall", "Main Hall"), ("annex", "Annex")] {
            ScheduleRepository::insert_room(
                conn,
                &RoomRecord {
                    id: id.into(),
                    edition_id: EDITION.into(),
                    name: name.into(),
                },
            )?;
        }
        ScheduleRepository::insert_track(
            conn,
            &TrackRecord {
                id: "track-systems".into(),
                edition_id: EDITION.into(),
                name: "Systems".into(),
            },
        )?;
        for (id, name) in [("sp-ana", "Ana"), ("sp-bo", "Bo")] {
            ScheduleRepository::insert_speaker(
                conn,
                &SpeakerRecord {
                    id: id.into(),
                    edition_id: EDITION.into(),
                    display_name: name.into(),
                },
            )?;
        }
        for (id, speakers) in [("talk-1", vec!["sp-ana"]), ("talk-2", vec!["sp-ana", "sp-bo"])] {
            ScheduleRepository::insert_talk(
                conn,
                &TalkRecord {
                    id: id.into(),
                    edition_id: EDITION.into(),
                    title: format!("Talk {id}"),
                    speaker_ids: speakers.into_iter().map(Into::into).collect(),
                },
            )?;
        }
        for (id, start, end, room) in [
            ("slot-1", "09:00", "10:00", "hall"),
            ("slot-2", "09:30", "10:30", "annex"),
            ("slot-3", "11:00", "12:00", "hall"),
            ("slot-4", "09:15", "09:45", "hall"),
        ] {
            ScheduleRepository::insert_slot(
                conn,
                &SlotRecord {
                    id: id.into(),
                    edition_id: EDITION.into(),
                    date: "2024-09-10".into(),
                    start_time: start.into(),
                    end_time: end.into(),
                    room_id: Some(room.into()),
                },
            )?;
        }
        ScheduleRepository::insert_session(
            conn,
            &SessionRecord {
                id: "s1".into(),
                edition_id: EDITION.into(),
                title: "Zero-copy parsing".into(),
                slot_id: Some("slot-1".into()),
                talk_id: Some("talk-1".into()),
                track_id: Some("track-systems".into()),
            },
        )?;
        ScheduleRepository::insert_session(
            conn,
            &SessionRecord {
                id: "s2".into(),
                edition_id: EDITION.into(),
                title: "Lock-free queues".into(),
                slot_id: Some("slot-2".into()),
                talk_id: Some("talk-2".into()),
                track_id: Some("track-systems".into()),
            },
        )?;
        Ok(())
    })
    .expect("seed schedule");
}

fn service_with(config: EngineConfig) -> (tempfile::TempDir, DbPool, ConflictService) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("confsched.sqlite")).expect("db pool");
    seed(&pool);
    let service = ConflictService::new(pool.clone(), config);
    (dir, pool, service)
}

#[tokio::test]
async fn scan_force_and_publish_flow() {
    let (_dir, _pool, service) = service_with(EngineConfig::default());

    let result = service.scan_edition(EDITION, None).await.expect("scan");
    assert_eq!(result.total_conflicts, 2);
    assert!(result.has_blocking_conflicts);
    let presenter = result.conflicts_by_type[&ConflictType::PresenterDoubleBooked][0].clone();
    assert_eq!(presenter.entity_id, "sp-ana");
    assert_eq!(presenter.session_ids, vec!["s1".to_string(), "s2".to_string()]);
    assert_eq!(result.conflicts_by_type[&ConflictType::TrackMultipleRooms].len(), 1);
    assert!(!service.can_publish_edition(EDITION).await.expect("gate"));

    let forced = service
        .force_conflict(ForceConflictInput {
            edition_id: EDITION.into(),
            conflict_id: presenter.id.clone(),
            forced_by: "chair@rustconf.example".into(),
            reason: Some("  Ana records the second talk in advance  ".into()),
        })
        .await
        .expect("force conflict");
    assert_eq!(forced.reason.as_deref(), Some("Ana records the second talk in advance"));

    let again = service
        .force_conflict(ForceConflictInput {
            edition_id: EDITION.into(),
            conflict_id: presenter.id.clone(),
            forced_by: "someone-else".into(),
            reason: None,
        })
        .await;
    assert!(matches!(again, Err(AppError::Conflict { .. })));

    // Forced records are ignored unless asked for.
    let unfiltered = service.scan_edition(EDITION, None).await.expect("scan");
    assert_eq!(unfiltered.total_conflicts, 2);
    assert!(unfiltered.forced_conflicts.is_empty());

    let filtered = service
        .scan_edition(
            EDITION,
            Some(ScanOptions {
                ignore_forced: true,
                ..ScanOptions::default()
            }),
        )
        .await
        .expect("filtered scan");
    assert_eq!(filtered.total_conflicts, 1);
    assert!(!filtered.has_blocking_conflicts);
    assert_eq!(filtered.forced_conflicts.len(), 1);
    assert!(filtered.forced_conflicts[0].resolved);
    assert_eq!(filtered.forced_conflicts[0].id, presenter.id);

    let listed = service.list_forced(EDITION).await.expect("list forced");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].forced_by, "chair@rustconf.example");

    service
        .unforce_conflict(EDITION, &presenter.id)
        .await
        .expect("unforce");
    assert!(service.list_forced(EDITION).await.expect("list").is_empty());
    assert!(matches!(
        service.unforce_conflict(EDITION, &presenter.id).await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn configured_ignore_forced_unblocks_publishing() {
    let config = EngineConfig {
        ignore_forced: true,
        ..EngineConfig::default()
    };
    let (_dir, _pool, service) = service_with(config);

    let result = service.scan_edition(EDITION, None).await.expect("scan");
    let presenter_id = result.conflicts_by_type[&ConflictType::PresenterDoubleBooked][0]
        .id
        .clone();
    service
        .force_conflict(ForceConflictInput {
            edition_id: EDITION.into(),
            conflict_id: presenter_id,
            forced_by: "chair".into(),
            reason: None,
        })
        .await
        .expect("force");

    // Only the track warning is left.
    assert!(service.can_publish_edition(EDITION).await.expect("gate"));
    let summary = service.conflict_summary(EDITION).await.expect("summary");
    assert_eq!(summary.total, 1);
    assert_eq!(summary.blocking, 0);
    assert_eq!(summary.warnings, 1);
    assert_eq!(summary.forced, 1);
    assert!(summary.can_publish);
}

#[tokio::test]
async fn lookups_and_placement_validation() {
    let (_dir, pool, service) = service_with(EngineConfig::default());

    let for_s1 = service
        .conflicts_for_session(EDITION, "s1")
        .await
        .expect("session lookup");
    assert_eq!(for_s1.len(), 2);
    let for_bo = service
        .conflicts_for_presenter(EDITION, "sp-bo")
        .await
        .expect("presenter lookup");
    assert!(for_bo.is_empty());
    let for_ana = service
        .conflicts_for_presenter(EDITION, "sp-ana")
        .await
        .expect("presenter lookup");
    assert_eq!(for_ana.len(), 1);

    // Moving s2 into the free late-morning hall slot clears everything it touched.
    let moved = service
        .validate_placement(
            EDITION,
            PlacementCandidate {
                session_id: "s2".into(),
                slot_id: "slot-3".into(),
                title: None,
                talk_id: None,
                track_id: None,
            },
        )
        .await
        .expect("validate move");
    assert!(!moved.has_conflicts);

    // A new session in the hall during s1 collides on the room.
    let new_session = service
        .validate_placement(
            EDITION,
            PlacementCandidate {
                session_id: "s-new".into(),
                slot_id: "slot-4".into(),
                title: Some("Lightning talks".into()),
                talk_id: None,
                track_id: None,
            },
        )
        .await
        .expect("validate new session");
    assert_eq!(new_session.total_conflicts, 1);
    assert_eq!(new_session.conflicts[0].conflict_type, ConflictType::RoomDoubleBooked);
    assert!(new_session.affected_sessions.contains("s1"));

    let unknown_slot = service
        .validate_placement(
            EDITION,
            PlacementCandidate {
                session_id: "s1".into(),
                slot_id: "slot-nope".into(),
                title: None,
                talk_id: None,
                track_id: None,
            },
        )
        .await;
    assert!(matches!(unknown_slot, Err(AppError::Validation { .. })));

    // Validation never writes; committing the move is the caller's job.
    pool.with_connection(|conn| ScheduleRepository::assign_slot(conn, "s2", Some("slot-3")))
        .expect("commit move");
    assert!(service.can_publish_edition(EDITION).await.expect("gate"));
}

#[tokio::test]
async fn concurrent_scans_agree() {
    let (_dir, _pool, service) = service_with(EngineConfig::default());
    let service = Arc::new(service);

    let scans = (0..8).map(|_| {
        let service = Arc::clone(&service);
        async move { service.scan_edition(EDITION, None).await }
    });
    let results = join_all(scans).await;

    let first = results[0].as_ref().expect("scan");
    for result in &results {
        let result = result.as_ref().expect("scan");
        assert_eq!(result.total_conflicts, first.total_conflicts);
        let ids: Vec<&str> = result.conflicts.iter().map(|c| c.id.as_str()).collect();
        let first_ids: Vec<&str> = first.conflicts.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, first_ids);
    }
}

#[tokio::test]
async fn blank_identifiers_are_rejected() {
    let (_dir, _pool, service) = service_with(EngineConfig::default());

    assert!(matches!(
        service.scan_edition("   ", None).await,
        Err(AppError::Validation { .. })
    ));
    assert!(matches!(
        service
            .force_conflict(ForceConflictInput {
                edition_id: EDITION.into(),
                conflict_id: String::new(),
                forced_by: "chair".into(),
                reason: None,
            })
            .await,
        Err(AppError::Validation { .. })
    ));
}

#[tokio::test]
async fn padded_session_id_still_replaces_existing_placement() {
    let (_dir, _pool, service) = service_with(EngineConfig::default());

    // s1 moves from slot-1 into slot-4; both are in the hall but only s1 used it.
    let result = service
        .validate_placement(
            EDITION,
            PlacementCandidate {
                session_id: " s1 ".into(),
                slot_id: " slot-4 ".into(),
                title: None,
                talk_id: None,
                track_id: None,
            },
        )
        .await
        .expect("validate padded move");

    assert!(result
        .conflicts
        .iter()
        .all(|conflict| conflict.conflict_type != ConflictType::RoomDoubleBooked));
    assert!(result
        .affected_sessions
        .iter()
        .all(|session_id| session_id == "s1" || session_id == "s2"));
    assert!(!result.affected_sessions.contains(" s1 "));
}
