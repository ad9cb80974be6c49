//! Registry behaviour: declaration, lookup, redeclaration and retirement

use std::sync::Arc;

use parking_lot::Mutex;
use wheel_config::WheelConfig;
use wheel_core::{Emitter, EmitterConfig, RedeclarePolicy, WheelError};

#[test]
fn test_declare_then_use_by_name() {
    let emitter = Emitter::new();
    emitter.declare_event::<(u32, u32)>("resized").unwrap();

    let sizes = Arc::new(Mutex::new(Vec::new()));
    let sink = sizes.clone();
    emitter
        .get("resized")
        .unwrap()
        .insert(move |w: u32, h: u32| sink.lock().push((w, h)), 0)
        .unwrap();

    emitter.get("resized").unwrap().emit((640_u32, 480_u32)).unwrap();
    assert_eq!(*sizes.lock(), vec![(640, 480)]);
}

#[test]
fn test_redeclare_warn_keeps_signature() {
    let emitter = Emitter::new();
    assert_eq!(emitter.config().redeclare, RedeclarePolicy::Warn);

    emitter.declare_event::<(String,)>("named").unwrap();
    let event = emitter.declare_event::<(i64,)>("named").unwrap();

    assert_eq!(event.signature(), "String");
    let err = event.insert(|_n: i64| {}, 0).unwrap_err();
    assert!(err.is_wrong_type());
}

#[test]
fn test_config_from_toml_drives_emitter() {
    let config = WheelConfig::from_toml_str(
        r#"
        [emitter]
        redeclare = "error"
        default_weight = 3
        "#,
    )
    .unwrap();
    let emitter = Emitter::with_config(config.emitter);

    let event = emitter.declare_event::<()>("configured").unwrap();
    assert!(matches!(
        emitter.declare_event::<(u8,)>("configured"),
        Err(WheelError::SignatureConflict { .. })
    ));

    // Subscribe uses the configured weight, so it runs before weight 1.
    let order = Arc::new(Mutex::new(Vec::new()));
    let (a, b) = (order.clone(), order.clone());
    event.insert(move || a.lock().push("weight-1"), 1).unwrap();
    event.subscribe(move || b.lock().push("default")).unwrap();

    event.emit(()).unwrap();
    assert_eq!(*order.lock(), vec!["default", "weight-1"]);
}

#[test]
fn test_default_signature_builder() {
    let emitter = Emitter::with_config(EmitterConfig::default()).default_signature::<(i32,)>();
    assert!(emitter.is_empty());

    let event = emitter.get("implicit").unwrap();
    assert_eq!(event.describe(), "fn(i32)");
    assert!(Arc::ptr_eq(&event, &emitter.get("implicit").unwrap()));
    assert_eq!(emitter.len(), 1);
}

#[test]
fn test_retired_event_stays_usable_by_holders() {
    let emitter = Emitter::new();
    let event = emitter.declare_event::<()>("detached").unwrap();
    event.insert(|| {}, 0).unwrap();

    let retired = emitter.retire("detached").unwrap();
    assert!(Arc::ptr_eq(&event, &retired));
    assert!(matches!(
        emitter.get("detached"),
        Err(WheelError::NoSuchEvent(name)) if name == "detached"
    ));
    assert_eq!(event.length(), 1);
    event.emit(()).unwrap();
}

#[test]
fn test_dropping_emitter_invalidates_handles() {
    let emitter = Emitter::new();
    let event = emitter.declare_event::<()>("scoped").unwrap();
    event.insert(|| {}, 0).unwrap();
    let handle = emitter.last_handle().unwrap();
    drop(event);

    assert!(handle.is_valid());
    drop(emitter);
    assert!(!handle.is_valid());
}
