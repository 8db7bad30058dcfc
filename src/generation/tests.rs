use super::*;
use chrono::{Duration, TimeZone, Utc};

fn at(secs: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

#[test]
fn create_generation_issues_fresh_ids_even_within_one_millisecond() {
    let mut store = GenerationStore::new();
    let now = at(0);
    let a = store.create_generation_at("first", now);
    let b = store.create_generation_at("second", now);
    let c = store.create_generation_at("third", now - Duration::seconds(5));

    assert_ne!(a, b);
    assert_ne!(b, c);
    assert_ne!(a, c);
    let as_num = |id: &GenerationId| id.as_str().parse::<i64>().unwrap();
    assert!(as_num(&a) < as_num(&b));
    assert!(as_num(&b) < as_num(&c));
}

#[test]
fn new_generation_is_visible_generating_at_zero_newest_first() {
    let mut store = GenerationStore::new();
    let older = store.create_generation("ambient drone");
    let newer = store.create_generation("lofi beat");

    let listed: Vec<&Generation> = store.list_generations().collect();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id(), &newer);
    assert_eq!(listed[1].id(), &older);
    assert_eq!(listed[0].status(), GenerationStatus::Generating);
    assert_eq!(listed[0].progress(), 0.0);
    assert_eq!(listed[0].prompt(), "lofi beat");
    assert!(listed[0].error().is_none());
    assert!(listed[0].audio_url().is_none());
    assert!(store.is_any_generating());
}

#[test]
fn progress_sequence_then_completion_matches_last_fields() {
    let mut store = GenerationStore::new();
    let id = store.create_generation("lofi beat");

    let mut seen = Vec::new();
    for p in [12.5, 30.0, 65.0, 99.0] {
        assert_eq!(
            store.apply_update(&id, GenerationUpdate::progress(p)),
            ApplyOutcome::Applied
        );
        let current = store.get(&id).unwrap().progress();
        if let Some(&last) = seen.last() {
            assert!(current >= last);
        }
        seen.push(current);
    }
    assert_eq!(seen, vec![12.5, 30.0, 65.0, 99.0]);

    let outcome = store.apply_update(&id, GenerationUpdate::completed("/api/audio/x.mp3"));
    assert_eq!(outcome, ApplyOutcome::Applied);

    let record = store.get(&id).unwrap();
    assert_eq!(record.status(), GenerationStatus::Completed);
    assert_eq!(record.progress(), 100.0);
    assert_eq!(record.audio_url(), Some("/api/audio/x.mp3"));
    assert!(record.error().is_none());
    assert!(!store.is_any_generating());
}

#[test]
fn lower_progress_is_ignored_and_values_are_clamped() {
    let mut store = GenerationStore::new();
    let id = store.create_generation("x");

    store.apply_update(&id, GenerationUpdate::progress(40.0));
    store.apply_update(&id, GenerationUpdate::progress(20.0));
    assert_eq!(store.get(&id).unwrap().progress(), 40.0);

    store.apply_update(&id, GenerationUpdate::progress(f64::NAN));
    assert_eq!(store.get(&id).unwrap().progress(), 40.0);

    store.apply_update(&id, GenerationUpdate::progress(250.0));
    assert_eq!(store.get(&id).unwrap().progress(), 100.0);
    assert_eq!(store.get(&id).unwrap().status(), GenerationStatus::Generating);
}

#[test]
fn unknown_id_leaves_collection_unchanged() {
    let mut store = GenerationStore::new();
    let id = store.create_generation("keep me");
    store.apply_update(&id, GenerationUpdate::progress(10.0));
    let before: Vec<Generation> = store.list_generations().cloned().collect();

    let ghost = GenerationId::new("does-not-exist");
    assert_eq!(
        store.apply_update(&ghost, GenerationUpdate::failed("late")),
        ApplyOutcome::UnknownId
    );
    assert_eq!(
        store.apply_update(&ghost, GenerationUpdate::progress(50.0)),
        ApplyOutcome::UnknownId
    );

    let after: Vec<Generation> = store.list_generations().cloned().collect();
    assert_eq!(before, after);
}

#[test]
fn terminal_records_absorb_later_updates() {
    let mut store = GenerationStore::new();
    let id = store.create_generation("x");
    store.apply_update(&id, GenerationUpdate::failed("Failed to generate music"));
    let settled = store.get(&id).unwrap().clone();

    assert_eq!(
        store.apply_update(&id, GenerationUpdate::progress(90.0)),
        ApplyOutcome::AlreadySettled
    );
    assert_eq!(
        store.apply_update(&id, GenerationUpdate::completed("/a.mp3")),
        ApplyOutcome::AlreadySettled
    );
    assert_eq!(store.get(&id).unwrap(), &settled);
}

#[test]
fn failure_keeps_progress_and_leaves_audio_unset() {
    let mut store = GenerationStore::new();
    let id = store.create_generation("x");
    store.apply_update(&id, GenerationUpdate::progress(37.0));
    store.apply_update(&id, GenerationUpdate::failed(""));

    let record = store.get(&id).unwrap();
    assert_eq!(record.status(), GenerationStatus::Failed);
    assert_eq!(record.error(), Some(DEFAULT_FAILURE_MESSAGE));
    assert_eq!(record.progress(), 37.0);
    assert!(record.audio_url().is_none());
}

#[test]
fn updates_breaking_invariants_are_rejected() {
    let mut store = GenerationStore::new();
    let id = store.create_generation("x");
    let before = store.get(&id).unwrap().clone();

    let stray_error = GenerationUpdate {
        error: Some("boom".into()),
        ..GenerationUpdate::default()
    };
    let completed_without_url = GenerationUpdate {
        status: Some(GenerationStatus::Completed),
        ..GenerationUpdate::default()
    };
    let failed_with_url = GenerationUpdate {
        audio_url: Some("/a.mp3".into()),
        ..GenerationUpdate::failed("nope")
    };

    for update in [stray_error, completed_without_url, failed_with_url] {
        assert!(matches!(
            store.apply_update(&id, update),
            ApplyOutcome::Rejected(_)
        ));
    }
    assert_eq!(store.get(&id).unwrap(), &before);
}

#[test]
fn generating_flag_is_derived_from_every_record() {
    let mut store = GenerationStore::new();
    assert!(!store.is_any_generating());

    let a = store.create_generation("a");
    let b = store.create_generation("b");

    store.apply_update(&a, GenerationUpdate::completed("/a.mp3"));
    assert!(store.is_any_generating(), "b is still running");

    store.apply_update(&b, GenerationUpdate::progress(50.0));
    assert!(store.is_any_generating());

    store.apply_update(&b, GenerationUpdate::failed("nope"));
    assert!(!store.is_any_generating());
}

#[test]
fn interleaved_generations_stay_independently_monotonic() {
    let mut store = GenerationStore::new();
    let a = store.create_generation("a");
    let b = store.create_generation("b");

    let script = [
        (&a, 10.0),
        (&b, 5.0),
        (&b, 50.0),
        (&a, 20.0),
        (&a, 70.0),
        (&b, 51.0),
    ];
    let mut last_a = 0.0;
    let mut last_b = 0.0;
    for (id, p) in script {
        store.apply_update(id, GenerationUpdate::progress(p));
        let pa = store.get(&a).unwrap().progress();
        let pb = store.get(&b).unwrap().progress();
        assert!(pa >= last_a && pb >= last_b);
        last_a = pa;
        last_b = pb;
    }
    assert_eq!((last_a, last_b), (70.0, 51.0));
}

#[test]
fn time_ago_picks_largest_whole_unit() {
    let now = at(10_000_000);
    assert_eq!(time_ago(now, now), "Just now");
    assert_eq!(time_ago(now - Duration::seconds(59), now), "Just now");
    assert_eq!(time_ago(now - Duration::seconds(60), now), "1 minute ago");
    assert_eq!(time_ago(now - Duration::minutes(5), now), "5 minutes ago");
    assert_eq!(time_ago(now - Duration::hours(1), now), "1 hour ago");
    assert_eq!(time_ago(now - Duration::days(3), now), "3 days ago");
    assert_eq!(time_ago(now - Duration::days(14), now), "2 weeks ago");
    assert_eq!(time_ago(now - Duration::days(400), now), "1 year ago");
    assert_eq!(time_ago(now + Duration::minutes(2), now), "Just now");
}

#[test]
fn prompt_headline_keeps_four_words() {
    assert_eq!(
        prompt_headline("Upbeat lo-fi hip hop beat with smooth jazz"),
        "Upbeat lo-fi hip hop..."
    );
    assert_eq!(prompt_headline("  lofi   beat "), "lofi beat");
}

#[test]
fn progress_bar_fills_proportionally() {
    assert_eq!(progress_bar(0.0, 4), "░░░░   0%");
    assert_eq!(progress_bar(50.0, 4), "██░░  50%");
    assert_eq!(progress_bar(100.0, 4), "████ 100%");
    assert_eq!(progress_bar(f64::NAN, 2), "░░   0%");
}
