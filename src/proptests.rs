use super::*;

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::snowflake::DEFAULT_EPOCH;

#[derive(Clone, Debug)]
enum Op {
    Set(u8, u32),
    Get(u8),
    GetOrSet(u8, u32),
    Delete(u8),
    GetAndDelete(u8),
    Clear,
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    // Small key space so that hits, misses and overwrites all happen often.
    let key = 0u8..32;
    let op = prop_oneof![
        30 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Set(k, v)),
        20 => key.clone().prop_map(Op::Get),
        20 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::GetOrSet(k, v)),
        12 => key.clone().prop_map(Op::Delete),
        12 => key.clone().prop_map(Op::GetAndDelete),
        1 => Just(Op::Clear),
    ];
    prop::collection::vec(op, 0..=500)
}

struct StepClock(AtomicI64);

impl Clock for StepClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_map_equivalence(ops in ops_strategy()) {
        let m: ConcurrentMap<u8, u32> = ConcurrentMap::new();
        let mut reference: HashMap<u8, u32> = HashMap::new();

        for op in ops {
            match op {
                Op::Set(k, v) => {
                    m.set(k, v);
                    reference.insert(k, v);
                }
                Op::Get(k) => {
                    prop_assert_eq!(m.get(&k), reference.get(&k).copied());
                }
                Op::GetOrSet(k, v) => {
                    let expected = match reference.get(&k) {
                        Some(&existing) => (existing, true),
                        None => {
                            reference.insert(k, v);
                            (v, false)
                        }
                    };
                    prop_assert_eq!(m.get_or_set(k, v), expected);
                }
                Op::Delete(k) => {
                    m.delete(&k);
                    reference.remove(&k);
                }
                Op::GetAndDelete(k) => {
                    prop_assert_eq!(m.get_and_delete(&k), reference.remove(&k));
                    prop_assert_eq!(m.get(&k), None);
                }
                Op::Clear => {
                    m.clear();
                    reference.clear();
                }
            }

            prop_assert_eq!(m.len(), reference.len());
        }

        let mut got = m.snapshot();
        got.sort_unstable();
        let mut expected: Vec<(u8, u32)> = reference.into_iter().collect();
        expected.sort_unstable();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_snowflake_monotonic_under_clock_jitter(
        node_id in any::<u8>(),
        steps in prop::collection::vec(-3i64..=3, 1..=300),
    ) {
        let clock = StepClock(AtomicI64::new(DEFAULT_EPOCH + 1_000));
        let sf = Snowflake::with_clock(
            SnowflakeConfig { epoch_ms: DEFAULT_EPOCH, node_id },
            &clock,
        );

        let mut last_ok: Option<(i64, i64)> = None; // (clock reading, id)
        for step in steps {
            let now = clock.0.fetch_add(step, Ordering::SeqCst) + step;
            match sf.generate() {
                Ok(id) => {
                    if let Some((prev_now, prev_id)) = last_ok {
                        prop_assert!(now >= prev_now);
                        prop_assert!(id > prev_id, "{} must exceed {}", id, prev_id);
                    }
                    let parts = SnowflakeParts::from_id(id);
                    prop_assert_eq!(parts.node_id, node_id);
                    prop_assert_eq!(parts.timestamp_millis(DEFAULT_EPOCH), now);
                    last_ok = Some((now, id));
                }
                Err(Error::ClockMovedBackward { last, now: seen }) => {
                    prop_assert_eq!(seen, now);
                    prop_assert!(now < last);
                    prop_assert_eq!(Some(last), last_ok.map(|(t, _)| t));
                }
                Err(e) => prop_assert!(false, "unexpected error: {}", e),
            }
        }
    }
}
