//! Property tests for the permissive state machine and stack invariants.

mod harness;

use eventflow_events::EventStage;
use harness::{CallLog, Fixture, StockWatcher};
use proptest::prelude::*;

fn stage_strategy() -> impl Strategy<Value = EventStage> {
    prop::sample::select(EventStage::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_stage_is_last_transition(stages in prop::collection::vec(stage_strategy(), 1..24)) {
        let fx = Fixture::new();
        let log = CallLog::default();
        fx.registry.register_listener(StockWatcher(log.clone()));

        let mut stock = fx.stock("prop");
        for stage in &stages {
            match stage {
                EventStage::Start => stock.start().unwrap(),
                EventStage::PrePersistence => stock.pre_persist().unwrap(),
                EventStage::PostPersistence => stock.post_persist().unwrap(),
                EventStage::Success => stock.success().unwrap(),
                EventStage::Failed => stock.fail().unwrap(),
                EventStage::End => stock.end().unwrap(),
            }
            prop_assert_eq!(stock.stage(), *stage);
        }

        prop_assert_eq!(stock.stage(), *stages.last().unwrap());
        prop_assert_eq!(log.stages_for("StockWatcher"), stages.clone());

        // At most one stack entry per event, and none once the last call was End.
        prop_assert!(fx.stack.depth() <= 1);
        if stock.stage() == EventStage::End {
            prop_assert!(fx.stack.is_empty());
        }
    }

    #[test]
    fn prop_end_unwinds_to_below_event(depth in 1usize..8, end_at in 0usize..8) {
        let fx = Fixture::new();
        let mut events: Vec<_> = (0..depth as u64).map(|i| fx.order(i)).collect();
        for event in events.iter_mut() {
            event.start().unwrap();
        }
        prop_assert_eq!(fx.stack.depth(), depth);

        let target = end_at % depth;
        events[target].end().unwrap();
        prop_assert_eq!(fx.stack.depth(), target);
        for event in &events[target..] {
            prop_assert!(!fx.stack.contains(event.id()));
        }
    }
}
