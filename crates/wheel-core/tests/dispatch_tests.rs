//! Dispatch behaviour of a single event
//!
//! Covers ordering, handle identity, swap removal, type checks, metadata,
//! interceptor binding and the lifecycle hooks.

use std::sync::Arc;

use parking_lot::Mutex;
use wheel_core::{is_valid, Callback, Event, Handle, WheelError};

/// Shared call log for recording which callbacks ran
fn call_log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

/// Insert a callback that appends `label` to `log` and return its handle
fn insert_labeled(event: &Event, log: &Arc<Mutex<Vec<String>>>, label: &str, weight: u16) -> Handle {
    let sink = log.clone();
    let label = label.to_string();
    event
        .insert(move |_n: i32| sink.lock().push(label.clone()), weight)
        .unwrap();
    event.last_handle().unwrap()
}

#[test]
fn test_weights_order_emission() {
    let event = Event::new::<(i32,)>("ordered");
    let log = call_log();

    insert_labeled(&event, &log, "w5", 5);
    insert_labeled(&event, &log, "w0-first", 0);
    insert_labeled(&event, &log, "w10", 10);
    insert_labeled(&event, &log, "w0-second", 0);

    event.emit((1,)).unwrap();
    assert_eq!(*log.lock(), vec!["w10", "w5", "w0-first", "w0-second"]);
}

#[test]
fn test_removed_handle_is_invalid_and_second_remove_is_noop() {
    let event = Event::new::<(i32,)>("removal");
    let log = call_log();

    insert_labeled(&event, &log, "a", 0);
    let middle = insert_labeled(&event, &log, "b", 0);
    insert_labeled(&event, &log, "c", 0);

    event.remove(&middle);
    assert!(!middle.is_valid());
    assert_eq!(middle.value(), wheel_core::INVALID);
    assert_eq!(event.length(), 2);

    // Removing again changes nothing.
    event.remove(&middle);
    assert_eq!(event.length(), 2);

    event.emit((0,)).unwrap();
    assert_eq!(*log.lock(), vec!["a", "c"]);
}

#[test]
fn test_swap_removal_relocates_last_slot() {
    let event = Event::new::<(i32,)>("swap");
    let log = call_log();

    let handles: Vec<Handle> = ["a", "b", "c", "d"]
        .iter()
        .map(|label| insert_labeled(&event, &log, label, 0))
        .collect();

    event.remove(&handles[1]);
    assert_eq!(handles[3].index(), Some(1));
    assert_eq!(handles[0].index(), Some(0));
    assert_eq!(handles[2].index(), Some(2));

    event.emit((0,)).unwrap();
    assert_eq!(*log.lock(), vec!["a", "d", "c"]);
}

#[test]
fn test_copies_of_a_handle_observe_removal() {
    let event = Event::new::<()>("copies");
    event.insert(|| {}, 0).unwrap();
    let handle = event.last_handle().unwrap();
    let copy = handle.clone();

    event.remove(&handle);
    assert!(!is_valid(Some(&copy)));
}

#[test]
fn test_detached_and_foreign_handles_are_ignored() {
    let event = Event::new::<()>("ignored");
    let other = Event::new::<()>("other");
    event.insert(|| {}, 0).unwrap();
    other.insert(|| {}, 0).unwrap();
    let foreign = other.last_handle().unwrap();

    event.remove(&Handle::detached());
    event.remove(&foreign);

    assert_eq!(event.length(), 1);
    assert!(foreign.is_valid());
}

#[test]
fn test_insert_wrong_arity_names_event() {
    let event = Event::new::<(i32, String)>("typed");
    let err = event.insert(|_n: i32| {}, 0).unwrap_err();

    match err {
        WheelError::WrongType {
            event,
            accepted,
            found,
            what,
            context,
        } => {
            assert_eq!(event, "typed");
            assert_eq!(accepted, vec!["fn(i32, String)".to_string()]);
            assert_eq!(found, "fn(i32)");
            assert_eq!(what, "function");
            assert_eq!(context, Some("insert()"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_insert_wrong_type_same_arity() {
    let event = Event::new::<(i32,)>("typed");
    assert!(event.insert(|_n: u32| {}, 0).unwrap_err().is_wrong_type());
    assert!(event.empty());
}

#[test]
fn test_emit_wrong_arguments_reports_both_lists() {
    let event = Event::new::<(i32, String)>("args");
    let err = event.emit((1_i32, 2_i32)).unwrap_err();

    let text = err.to_string();
    assert!(text.contains("\"args\""));
    assert!(text.contains("expected: (i32, String)"));
    assert!(text.contains("found: (i32, i32)"));
}

#[test]
fn test_tag_then_insert_records_metadata() {
    let event = Event::new::<()>("tagged");
    event.tag((42, "x".to_string())).insert(|| {}, 0).unwrap();
    let handle = event.last_handle().unwrap();

    let meta: (i32, String) = event.get_meta(&handle).unwrap();
    assert_eq!(meta, (42, "x".to_string()));
    assert!(event.is_meta_of::<(i32, String)>(&handle));

    let err = event.get_meta::<f64>(&handle).unwrap_err();
    assert!(err.is_wrong_type());
    assert!(err.to_string().contains("found: f64"));
}

#[test]
fn test_tag_is_consumed_by_one_insert() {
    let event = Event::new::<()>("once");
    event.tag(1_u8).insert(|| {}, 0).unwrap();
    let tagged = event.last_handle().unwrap();
    event.insert(|| {}, 0).unwrap();
    let untagged = event.last_handle().unwrap();

    assert!(event.is_meta_of::<u8>(&tagged));
    assert!(event.is_meta_of::<()>(&untagged));
}

#[test]
fn test_tag_consumed_even_when_insert_fails() {
    let event = Event::new::<(i32,)>("consumed");
    event.tag(5_u8);
    assert!(event.insert(|_s: String| {}, 0).is_err());

    event.insert(|_n: i32| {}, 0).unwrap();
    let handle = event.last_handle().unwrap();
    assert!(event.is_meta_of::<()>(&handle));
}

#[test]
fn test_meta_allow_list() {
    let event = Event::new::<()>("allowed");
    event.accept_meta::<(i32,)>().accept_meta::<String>();
    assert_eq!(event.accepted_meta_shapes().len(), 2);

    event.tag((1,)).insert(|| {}, 0).unwrap();
    event.tag("name".to_string()).insert(|| {}, 0).unwrap();

    let err = event.tag(1.5_f64).insert(|| {}, 0).unwrap_err();
    match err {
        WheelError::WrongType { what, accepted, .. } => {
            assert_eq!(what, "meta");
            assert_eq!(accepted, vec!["(i32,)".to_string(), "String".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    event.accept_any_meta();
    event.tag(1.5_f64).insert(|| {}, 0).unwrap();
    assert_eq!(event.length(), 3);
}

#[test]
fn test_set_meta_requires_recorded_shape() {
    let event = Event::new::<()>("replace");
    event.tag(10_i32).insert(|| {}, 0).unwrap();
    let handle = event.last_handle().unwrap();

    event.set_meta(&handle, 11_i32).unwrap();
    assert_eq!(event.get_meta::<i32>(&handle).unwrap(), 11);

    let err = event.set_meta(&handle, "eleven").unwrap_err();
    assert!(err.to_string().contains("set_meta()"));
}

#[test]
fn test_interceptor_binds_at_insert_time() {
    let event = Event::new::<(i32,)>("intercepted");
    let log = call_log();

    let seen = log.clone();
    event
        .set_interceptor::<(i32,), _>(move |_handle: &Handle, callback: &Callback<(i32,)>, args| {
            seen.lock().push("intercept".to_string());
            callback(args);
        })
        .unwrap();
    insert_labeled(&event, &log, "a", 0);

    event.unset_interceptor();
    insert_labeled(&event, &log, "b", 0);

    event.emit((0,)).unwrap();
    assert_eq!(*log.lock(), vec!["intercept", "a", "b"]);
}

#[test]
fn test_interceptor_can_suppress_and_repeat() {
    let event = Event::new::<(i32,)>("control");
    let total = Arc::new(Mutex::new(0));

    event
        .set_interceptor::<(i32,), _>(|_handle, callback, (n,)| {
            if n > 0 {
                callback((n,));
                callback((n,));
            }
        })
        .unwrap();
    let sink = total.clone();
    event.insert(move |n: i32| *sink.lock() += n, 0).unwrap();

    event.emit((-1,)).unwrap();
    event.emit((3,)).unwrap();
    assert_eq!(*total.lock(), 6);
}

#[test]
fn test_interceptor_receives_slot_handle() {
    let event = Event::new::<()>("which");
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = seen.clone();
    event
        .set_interceptor::<(), _>(move |handle, callback, args| {
            sink.lock().push(handle.clone());
            callback(args);
        })
        .unwrap();
    event.insert(|| {}, 0).unwrap();
    let handle = event.last_handle().unwrap();

    event.emit(()).unwrap();
    assert_eq!(*seen.lock(), vec![handle]);
}

#[test]
fn test_clear_runs_remove_hook_per_slot() {
    let event = Event::new::<(i32,)>("cleared");
    let log = call_log();
    let removed = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<Handle> = ["a", "b", "c"]
        .iter()
        .map(|label| insert_labeled(&event, &log, label, 0))
        .collect();

    let sink = removed.clone();
    event.set_on_remove(move |handle| {
        // The slot is still stored while the hook runs.
        assert!(handle.is_valid());
        sink.lock().push(handle.clone());
    });

    event.clear();
    assert_eq!(event.length(), 0);
    assert!(event.empty());
    // Slots are detached from the back.
    let expected: Vec<Handle> = handles.iter().rev().cloned().collect();
    assert_eq!(*removed.lock(), expected);
    assert!(handles.iter().all(|handle| !handle.is_valid()));
}

#[test]
fn test_insert_hook_sees_final_position() {
    let event = Event::new::<()>("hooked");
    let positions = Arc::new(Mutex::new(Vec::new()));

    let sink = positions.clone();
    event.set_on_insert(move |handle| sink.lock().push(handle.index()));

    event.insert(|| {}, 0).unwrap();
    event.insert(|| {}, 0).unwrap();
    event.insert(|| {}, 7).unwrap();

    assert_eq!(*positions.lock(), vec![Some(0), Some(1), Some(0)]);

    event.unset_on_insert();
    event.insert(|| {}, 0).unwrap();
    assert_eq!(positions.lock().len(), 3);
}

#[test]
fn test_remove_hook_can_read_metadata() {
    let event = Arc::new(Event::new::<()>("farewell"));
    let labels = Arc::new(Mutex::new(Vec::new()));

    let inner = Arc::downgrade(&event);
    let sink = labels.clone();
    event.set_on_remove(move |handle| {
        if let Some(event) = inner.upgrade() {
            sink.lock().push(event.get_meta::<&'static str>(handle).unwrap());
        }
    });

    event.tag("first").insert(|| {}, 0).unwrap();
    let handle = event.last_handle().unwrap();
    event.remove(&handle);

    assert_eq!(*labels.lock(), vec!["first"]);
}

#[test]
fn test_remove_hook_removing_same_handle_is_harmless() {
    let event = Arc::new(Event::new::<()>("recursive"));
    let calls = Arc::new(Mutex::new(0));

    let still_stored = Arc::new(Mutex::new(None));

    let inner = Arc::downgrade(&event);
    let sink = calls.clone();
    let stored = still_stored.clone();
    event.set_on_remove(move |handle| {
        *sink.lock() += 1;
        if let Some(event) = inner.upgrade() {
            event.remove(handle);
            // The inner removal is a no-op; the outer one detaches the slot.
            *stored.lock() = Some((handle.is_valid(), event.length()));
        }
    });

    event.insert(|| {}, 0).unwrap();
    let handle = event.last_handle().unwrap();
    event.remove(&handle);

    assert_eq!(*calls.lock(), 1);
    assert_eq!(*still_stored.lock(), Some((true, 1)));
    assert!(!handle.is_valid());
    assert!(event.empty());
}
