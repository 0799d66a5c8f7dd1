//! Fanout: partition a run's positions into tasks grouped by
//! `(product_type, hash_bucket)`.
//!
//! `hash_bucket` comes from a fixed, cross-process-stable hash of the
//! position id, not from ordering or position count, so re-running fanout
//! for the same `(positions, hash_mod)` always produces the same bucket
//! assignment — important since `insert_tasks` is keyed on
//! `(run_id, product_type, hash_bucket)` and must be able to no-op on retry.

use std::collections::BTreeMap;

use risk_db::tasks::NewTask;
use risk_schemas::{Measure, Position, ScenarioId};

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// FNV-1a over the UTF-8 bytes of `s`. Chosen for simplicity and because it
/// needs no external crate: this is not a security hash, only a stable
/// bucket assignment.
pub fn stable_hash(s: &str) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in s.as_bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

pub fn bucket_for(position_id: &str, hash_mod: u32) -> i32 {
    let hash_mod = hash_mod.max(1);
    (stable_hash(position_id) % u64::from(hash_mod)) as i32
}

pub struct FanoutPlan {
    pub market_snapshot_id: String,
    pub measures: Vec<Measure>,
    pub scenarios: Vec<ScenarioId>,
    pub hash_mod: u32,
    pub max_attempts: i32,
}

/// Group `positions` by `(product_type, hash_bucket)` and build one task
/// payload per group. Positions that share a bucket and product type are
/// priced together by the same worker claim; buckets exist purely to cap
/// how many positions land in a single task when a portfolio is large.
pub fn partition_into_tasks(positions: &[Position], plan: &FanoutPlan) -> Vec<NewTask> {
    let mut groups: BTreeMap<(String, i32), Vec<Position>> = BTreeMap::new();

    for position in positions {
        let key = (position.product_type_upper(), bucket_for(&position.position_id, plan.hash_mod));
        groups.entry(key).or_default().push(position.clone());
    }

    groups
        .into_iter()
        .map(|((product_type, hash_bucket), positions)| {
            let payload = risk_schemas::TaskPayload {
                market_snapshot_id: plan.market_snapshot_id.clone(),
                product_type: product_type.clone(),
                hash_bucket,
                positions,
                measures: plan.measures.clone(),
                scenarios: plan.scenarios.clone(),
            };
            NewTask {
                product_type,
                hash_bucket,
                payload: serde_json::to_value(&payload).expect("TaskPayload always serializes"),
                max_attempts: plan.max_attempts,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(id: &str, product_type: &str) -> Position {
        Position {
            position_id: id.to_string(),
            product_type: product_type.to_string(),
            portfolio_node_id: "desk-1".to_string(),
            currency: "USD".to_string(),
            attributes: serde_json::json!({}),
        }
    }

    fn plan(hash_mod: u32) -> FanoutPlan {
        FanoutPlan {
            market_snapshot_id: "snap-1".to_string(),
            measures: vec![Measure::Pv],
            scenarios: vec![ScenarioId::Base],
            hash_mod,
            max_attempts: 3,
        }
    }

    #[test]
    fn stable_hash_is_deterministic_across_calls() {
        assert_eq!(stable_hash("pos-1"), stable_hash("pos-1"));
        assert_ne!(stable_hash("pos-1"), stable_hash("pos-2"));
    }

    #[test]
    fn bucket_for_is_always_within_hash_mod() {
        for id in ["a", "bb", "ccc", "dddd", "eeeee"] {
            assert!(bucket_for(id, 4) < 4);
        }
    }

    #[test]
    fn hash_mod_of_one_puts_everything_in_bucket_zero() {
        for id in ["a", "bb", "ccc"] {
            assert_eq!(bucket_for(id, 1), 0);
        }
    }

    #[test]
    fn positions_group_by_product_type_and_bucket() {
        let positions = vec![
            position("p1", "FIXED_BOND"),
            position("p2", "FIXED_BOND"),
            position("p3", "FX_FWD"),
        ];
        let tasks = partition_into_tasks(&positions, &plan(1));

        // hash_mod=1 -> one bucket per product type.
        assert_eq!(tasks.len(), 2);
        let bond_task = tasks.iter().find(|t| t.product_type == "FIXED_BOND").unwrap();
        let payload: risk_schemas::TaskPayload = serde_json::from_value(bond_task.payload.clone()).unwrap();
        assert_eq!(payload.positions.len(), 2);
    }

    #[test]
    fn refanning_out_the_same_positions_produces_identical_bucket_assignment() {
        let positions = vec![position("p1", "FIXED_BOND"), position("p2", "FX_FWD")];
        let first = partition_into_tasks(&positions, &plan(8));
        let second = partition_into_tasks(&positions, &plan(8));

        let first_keys: Vec<_> = first.iter().map(|t| (t.product_type.clone(), t.hash_bucket)).collect();
        let second_keys: Vec<_> = second.iter().map(|t| (t.product_type.clone(), t.hash_bucket)).collect();
        assert_eq!(first_keys, second_keys);
    }
}
