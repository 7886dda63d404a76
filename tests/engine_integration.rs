//! End-to-end tests over the session store, conflict detector, and
//! distribution tracker wired against the in-memory repository.

mod support;

use timetable_engine::api::{SessionId, SubjectId};
use timetable_engine::db::EngineError;
use timetable_engine::models::conflict::{ConflictType, Severity};
use timetable_engine::models::session::{AuditAction, SessionPatch, SessionStatus};
use timetable_engine::models::slot::{SlotSignature, UnitBreakdown};

use support::{monday, scope, DraftBuilder, Engine};

#[tokio::test]
async fn test_faculty_double_booking_scenario() {
    let engine = Engine::new();

    // Faculty F teaches Mon periods 1-2 for division D1; a second session is
    // created for F at Mon periods 2-3 for division D2.
    let s1 = engine
        .store
        .create(
            DraftBuilder::new().periods(1, 2).cohort(2024, 5, "CSE").build(),
            "planner",
        )
        .await
        .unwrap();
    let s2 = engine
        .store
        .create(
            DraftBuilder::new()
                .subject("MA201")
                .periods(2, 2)
                .cohort(2024, 5, "ECE")
                .build(),
            "planner",
        )
        .await
        .unwrap();

    let conflicts = engine.detector.scan(&scope()).await.unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].conflict_type, ConflictType::Faculty);
    assert_eq!(conflicts[0].severity, Severity::Blocking);
    assert_eq!(conflicts[0].session_ids, vec![s1.id, s2.id]);

    // Publish of either session fails until the conflict is resolved.
    for id in [s1.id, s2.id] {
        let err = engine.gate.publish(&[id], "planner").await.unwrap_err();
        assert!(matches!(err, EngineError::PublishBlocked { .. }));
    }

    let key = conflicts[0].key();
    engine
        .detector
        .resolve(&scope(), key.conflict_type, key.participants.clone())
        .await
        .unwrap();
    assert!(engine.gate.publish(&[s1.id, s2.id], "planner").await.is_ok());
}

#[tokio::test]
async fn test_under_scheduled_quota_scenario() {
    let engine = Engine::new();
    let subject = SubjectId::new("CS301");
    engine.quotas.set(subject.clone(), 5, UnitBreakdown::lectures(4));

    // Three 1-unit lecture sessions against a planned quota of 4.
    for start in [1u8, 3, 5] {
        engine
            .store
            .create(DraftBuilder::new().periods(start, 1).build(), "planner")
            .await
            .unwrap();
    }

    let record = engine.tracker.reconcile(&subject, 5).await.unwrap();
    let lecture = record
        .deltas
        .iter()
        .find(|d| d.unit_type == timetable_engine::api::UnitType::Lecture)
        .unwrap();
    assert_eq!(lecture.scheduled, 3);
    assert_eq!(lecture.planned, 4);
    assert_eq!(lecture.delta, -1);

    // Under-scheduling raises no conflict at all.
    assert!(engine.detector.scan(&scope()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_scan_is_idempotent() {
    let engine = Engine::new();
    engine
        .store
        .create(DraftBuilder::new().room("LH-1").build(), "planner")
        .await
        .unwrap();
    engine
        .store
        .create(
            DraftBuilder::new()
                .subject("MA201")
                .faculty("iyer@college.edu")
                .room("LH-1")
                .cohort(2024, 5, "ECE")
                .build(),
            "planner",
        )
        .await
        .unwrap();

    let first = engine.detector.scan(&scope()).await.unwrap();
    let second = engine.detector.scan(&scope()).await.unwrap();
    assert_eq!(first.len(), second.len());
    let first_keys: Vec<_> = first.iter().map(|c| c.key()).collect();
    let second_keys: Vec<_> = second.iter().map(|c| c.key()).collect();
    assert_eq!(first_keys, second_keys);
}

#[tokio::test]
async fn test_optimistic_concurrency_one_winner() {
    let engine = Engine::new();
    let session = engine
        .store
        .create(DraftBuilder::new().build(), "alice")
        .await
        .unwrap();

    // Two editors read the same token; the first write wins.
    let token = session.updated_at;
    let win = SessionPatch {
        faculty_email: Some("iyer@college.edu".to_string()),
        expected_updated_at: token,
        ..Default::default()
    };
    let lose = SessionPatch {
        faculty_email: Some("nair@college.edu".to_string()),
        expected_updated_at: token,
        ..Default::default()
    };

    engine.store.update(session.id, win, "alice").await.unwrap();
    let err = engine.store.update(session.id, lose, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::Concurrency { .. }));
    assert!(err.is_retryable());

    // The stale writer refetches and retries against fresh state.
    let fresh = engine.store.get(session.id).await.unwrap();
    assert_eq!(fresh.faculty_email, "iyer@college.edu");
    let retry = SessionPatch {
        faculty_email: Some("nair@college.edu".to_string()),
        expected_updated_at: fresh.updated_at,
        ..Default::default()
    };
    let after = engine.store.update(session.id, retry, "bob").await.unwrap();
    assert_eq!(after.faculty_email, "nair@college.edu");
}

#[tokio::test]
async fn test_update_revalidates_invariants() {
    let engine = Engine::new();
    let session = engine
        .store
        .create(DraftBuilder::new().build(), "planner")
        .await
        .unwrap();

    let bad = SessionPatch {
        units: Some(UnitBreakdown::default()),
        expected_updated_at: session.updated_at,
        ..Default::default()
    };
    let err = engine.store.update(session.id, bad, "planner").await.unwrap_err();
    assert!(matches!(err, EngineError::Validation { .. }));

    // Slot day must keep agreeing with the calendar date.
    let mismatched = SessionPatch {
        slot: Some(SlotSignature::new(chrono::Weekday::Tue, 1, 2)),
        expected_updated_at: session.updated_at,
        ..Default::default()
    };
    let err = engine
        .store
        .update(session.id, mismatched, "planner")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation { .. }));
}

#[tokio::test]
async fn test_deleting_published_session_is_refused() {
    let engine = Engine::new();
    let session = engine
        .store
        .create(DraftBuilder::new().build(), "planner")
        .await
        .unwrap();
    engine.gate.publish(&[session.id], "planner").await.unwrap();

    let err = engine.store.delete(session.id, "planner").await.unwrap_err();
    assert!(matches!(err, EngineError::State { .. }));
    assert_eq!(
        engine.store.get(session.id).await.unwrap().status,
        SessionStatus::Published
    );
}

#[tokio::test]
async fn test_delete_clears_conflicts_and_reduces_distribution() {
    let engine = Engine::new();
    let subject = SubjectId::new("CS301");
    engine.quotas.set(subject.clone(), 5, UnitBreakdown::lectures(4));

    let keeper = engine
        .store
        .create(DraftBuilder::new().periods(1, 2).build(), "planner")
        .await
        .unwrap();
    let victim = engine
        .store
        .create(
            DraftBuilder::new().subject("MA201").periods(2, 2).cohort(2024, 5, "ECE").build(),
            "planner",
        )
        .await
        .unwrap();

    assert_eq!(engine.detector.scan(&scope()).await.unwrap().len(), 1);

    engine.store.delete(victim.id, "planner").await.unwrap();

    // Incremental notification from the delete path already cleared the
    // cache; no explicit rescan needed.
    assert!(engine.detector.cached(&scope()).is_empty());
    assert!(engine.store.get(victim.id).await.is_err());
    assert!(engine.store.get(keeper.id).await.is_ok());

    let record = engine.tracker.reconcile(&subject, 5).await.unwrap();
    assert_eq!(record.session_count, 1);
}

#[tokio::test]
async fn test_assignment_detach_never_cascades() {
    use timetable_engine::api::AssignmentId;
    use timetable_engine::models::session::AssignmentLink;

    let engine = Engine::new();
    let mut draft = DraftBuilder::new().build();
    draft.assignment = Some(AssignmentLink {
        assignment_id: AssignmentId::new(11),
        due_date: Some(monday()),
        linked_session: None,
        completed: false,
    });
    let session = engine.store.create(draft, "planner").await.unwrap();

    let detached = engine
        .store
        .detach_assignment(AssignmentId::new(11), "sync-bot")
        .await
        .unwrap();
    assert_eq!(detached, 1);

    let after = engine.store.get(session.id).await.unwrap();
    assert!(after.assignment.is_none());
    assert!(!after.deleted);
}

#[tokio::test]
async fn test_availability_probe_sees_stored_sessions() {
    let engine = Engine::new();
    engine.affiliations.set("rao@college.edu", 3);

    let tuesday = monday().succ_opt().unwrap();
    engine
        .store
        .create(DraftBuilder::new().periods(1, 2).build(), "planner")
        .await
        .unwrap();
    engine
        .store
        .create(
            DraftBuilder::new().subject("MA201").date(tuesday).periods(1, 2).build(),
            "planner",
        )
        .await
        .unwrap();

    // Monday periods 2-3 collide with the stored 1-2 session.
    let clash = engine
        .scheduler
        .check_availability("rao@college.edu", monday(), 2, 2)
        .await
        .unwrap();
    assert!(!clash.available);
    assert_eq!(clash.conflicting_session_ids.len(), 1);

    // A free slot on Tuesday is available but the weekly ceiling of 3 is
    // already reached, so any further span overloads.
    let free = engine
        .scheduler
        .check_availability("rao@college.edu", tuesday, 5, 2)
        .await
        .unwrap();
    assert!(free.available);
    assert_eq!(free.load.unit_hours, 2);
    assert!(free.overloaded);
}

#[tokio::test]
async fn test_audit_trail_for_unknown_session_is_not_found() {
    let engine = Engine::new();
    let err = engine
        .store
        .audit_trail(SessionId::new(4242))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

#[tokio::test]
async fn test_every_mutation_appends_audit() {
    let engine = Engine::new();
    let session = engine
        .store
        .create(DraftBuilder::new().build(), "alice")
        .await
        .unwrap();
    let patch = SessionPatch {
        room: Some(Some("LH-4".to_string())),
        expected_updated_at: session.updated_at,
        ..Default::default()
    };
    engine.store.update(session.id, patch, "bob").await.unwrap();
    engine.store.delete(session.id, "carol").await.unwrap();

    let trail = engine.store.audit_trail(session.id).await.unwrap();
    let actions: Vec<AuditAction> = trail.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![AuditAction::Create, AuditAction::Update, AuditAction::Delete]
    );
    assert_eq!(trail[0].actor, "alice");
    assert_eq!(trail[1].actor, "bob");
    assert_eq!(trail[2].actor, "carol");
}
