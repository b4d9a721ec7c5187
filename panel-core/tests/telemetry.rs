use panel_core::behavior::{Behavior, BehaviorKind, BehaviorMeta, ButtonDefinition, ButtonId};
use panel_core::executor::ActionExecutor;
use panel_core::state::{RuntimeState, RuntimeStatePatch, RuntimeStateStore};
use panel_core::telemetry::STRUCTURED_LOG_CAPACITY;
use panel_core::time::SimInstant;

fn ms(value: u64) -> SimInstant {
    SimInstant::from_millis(value)
}

#[test]
fn structured_log_keeps_a_bounded_window_with_increasing_ids() {
    let meta = BehaviorMeta {
        structured_logging: true,
        ..BehaviorMeta::default()
    };
    let mut executor = ActionExecutor::new(meta);
    executor
        .load_buttons(vec![
            ButtonDefinition::new(ButtonId(1), "Water", Behavior::Counter),
            ButtonDefinition::new(
                ButtonId(2),
                "Reading",
                Behavior::Playlist {
                    source: String::from("A\nB"),
                },
            ),
        ])
        .expect("unique ids");

    for press in 0..12u64 {
        let id = if press % 3 == 0 { ButtonId(2) } else { ButtonId(1) };
        executor.press(id, ms(press * 100)).expect("known button");
        let log = executor.structured_log();
        assert!(log.len() <= STRUCTURED_LOG_CAPACITY);
        assert!(log.windows(2).all(|pair| pair[0].id < pair[1].id));
    }

    let log = executor.structured_log();
    assert_eq!(log.len(), STRUCTURED_LOG_CAPACITY);
    assert_eq!(log.first().map(|entry| entry.id), Some(8));
    assert_eq!(log.last().map(|entry| entry.id), Some(12));

    let last = log.last().expect("non-empty");
    assert_eq!(last.button, ButtonId(1));
    assert_eq!(last.behavior, BehaviorKind::Counter);
    assert_eq!(last.action, "Count: 8");
    assert_eq!(last.timestamp, ms(1_100));

    let playlist = log
        .iter()
        .find(|entry| entry.button == ButtonId(2))
        .expect("playlist entry in window");
    assert_eq!(playlist.playlist_item.as_deref(), Some("A"));
    assert_eq!(playlist.action, "Now showing: A");
}

#[test]
fn clearing_the_window_keeps_ids_moving_forward() {
    let meta = BehaviorMeta {
        structured_logging: true,
        ..BehaviorMeta::default()
    };
    let mut executor = ActionExecutor::new(meta);
    executor
        .load_buttons(vec![ButtonDefinition::new(ButtonId(1), "Go", Behavior::Custom)])
        .expect("unique ids");

    executor.press(ButtonId(1), ms(0)).expect("known button");
    executor.press(ButtonId(1), ms(10)).expect("known button");
    executor.clear_structured_log();
    executor.press(ButtonId(1), ms(20)).expect("known button");

    let log = executor.structured_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].id, 3);
    assert_eq!(log[0].action, "Go");
}

#[test]
fn overdue_macro_completion_is_logged_before_a_later_press() {
    let meta = BehaviorMeta {
        structured_logging: true,
        ..BehaviorMeta::default()
    };
    let mut executor = ActionExecutor::new(meta);
    executor
        .load_buttons(vec![
            ButtonDefinition::new(ButtonId(1), "Brief", Behavior::Meta),
            ButtonDefinition::new(ButtonId(2), "Water", Behavior::Counter),
        ])
        .expect("unique ids");

    executor.press(ButtonId(1), ms(0)).expect("known button");
    executor.press(ButtonId(2), ms(1_000)).expect("known button");

    let log = executor.structured_log();
    let stamped: Vec<_> = log
        .iter()
        .map(|entry| (entry.id, entry.button, entry.timestamp))
        .collect();
    assert_eq!(
        stamped,
        [(1, ButtonId(1), ms(900)), (2, ButtonId(2), ms(1_000))]
    );
}

#[test]
fn logging_disabled_records_nothing() {
    let mut executor = ActionExecutor::new(BehaviorMeta::default());
    executor
        .load_buttons(vec![ButtonDefinition::new(ButtonId(1), "Go", Behavior::Counter)])
        .expect("unique ids");
    executor.press(ButtonId(1), ms(0)).expect("known button");
    assert!(executor.structured_log().is_empty());
}

#[test]
fn ensure_twice_leaves_existing_state_alone() {
    let mut store: RuntimeStateStore<SimInstant> = RuntimeStateStore::new();
    let ids = [ButtonId(1), ButtonId(2)];
    store.ensure(&ids);
    store.update(
        ButtonId(1),
        RuntimeStatePatch {
            counter_value: Some(4),
            is_active: Some(true),
            ..RuntimeStatePatch::default()
        },
    );
    store.update(ButtonId(2), |state: &mut RuntimeState<SimInstant>| {
        state.macro_log.push("kept");
    });
    let before: Vec<_> = ids.iter().map(|&id| store.get(id).clone()).collect();

    assert!(store.ensure(&ids).is_empty());
    assert!(store.ensure(&ids).is_empty());

    let after: Vec<_> = ids.iter().map(|&id| store.get(id).clone()).collect();
    assert_eq!(before, after);
}

#[test]
fn ensure_drops_missing_ids_and_defaults_new_ones() {
    let mut store: RuntimeStateStore<SimInstant> = RuntimeStateStore::new();
    store.ensure(&[ButtonId(1), ButtonId(2)]);
    store.update(ButtonId(2), RuntimeStatePatch {
        badge_count: Some(9),
        ..RuntimeStatePatch::default()
    });

    let removed = store.ensure(&[ButtonId(2), ButtonId(3)]);
    assert_eq!(removed, [ButtonId(1)]);
    assert_eq!(store.get(ButtonId(2)).badge_count, 9);
    assert_eq!(store.get(ButtonId(3)), &RuntimeState::default());
    assert!(!store.contains(ButtonId(1)));
    assert_eq!(store.get(ButtonId(1)), &RuntimeState::default());
}
