//! Seeded differential suite for the observer/codec laws.
//!
//! Generates random structured values, applies random structural mutations,
//! and checks that the observed change-list transforms the pre-edit value
//! into the post-edit value and reverses back exactly. A second pass drives
//! the same transitions end-to-end through the hub and checks convergence.

mod common;

use common::{register_all, Hub};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use replicant_core::{apply_changes, diff_transition, format_changes, reverse_changes};
use replicant_util::deep_equal;
use serde_json::{json, Map, Value};

// ── Random value and mutation generation ──────────────────────────────────

fn random_scalar(rng: &mut StdRng) -> Value {
    match rng.gen_range(0..4) {
        0 => Value::Null,
        1 => json!(rng.gen::<bool>()),
        2 => json!(rng.gen_range(-1000..1000)),
        _ => json!(format!("s{}", rng.gen_range(0..100))),
    }
}

fn random_value(rng: &mut StdRng, depth: usize) -> Value {
    if depth == 0 {
        return random_scalar(rng);
    }
    match rng.gen_range(0..4) {
        0 => {
            let len = rng.gen_range(0..5);
            Value::Array((0..len).map(|_| random_value(rng, depth - 1)).collect())
        }
        1 => {
            let len = rng.gen_range(0..5);
            let mut map = Map::new();
            for i in 0..len {
                map.insert(format!("k{i}"), random_value(rng, depth - 1));
            }
            Value::Object(map)
        }
        _ => random_scalar(rng),
    }
}

/// Applies one random structural mutation somewhere in the value.
fn mutate(rng: &mut StdRng, value: &mut Value) {
    match value {
        Value::Object(map) => {
            let keys: Vec<String> = map.keys().cloned().collect();
            match rng.gen_range(0..4) {
                0 => {
                    map.insert(format!("new{}", rng.gen_range(0..10)), random_value(rng, 1));
                }
                1 if !keys.is_empty() => {
                    let key = &keys[rng.gen_range(0..keys.len())];
                    map.remove(key);
                }
                2 if !keys.is_empty() => {
                    let key = keys[rng.gen_range(0..keys.len())].clone();
                    let slot = map.get_mut(&key).unwrap();
                    mutate(rng, slot);
                }
                _ if !keys.is_empty() => {
                    let key = keys[rng.gen_range(0..keys.len())].clone();
                    map.insert(key, random_scalar(rng));
                }
                _ => {
                    map.insert("fallback".to_owned(), random_scalar(rng));
                }
            }
        }
        Value::Array(items) => match rng.gen_range(0..4) {
            0 => {
                let at = rng.gen_range(0..=items.len());
                items.insert(at, random_value(rng, 1));
            }
            1 if !items.is_empty() => {
                let at = rng.gen_range(0..items.len());
                items.remove(at);
            }
            2 if !items.is_empty() => {
                let at = rng.gen_range(0..items.len());
                mutate(rng, &mut items[at]);
            }
            _ => {
                items.push(random_scalar(rng));
            }
        },
        other => *other = random_scalar(rng),
    }
}

// ── Codec-level laws ──────────────────────────────────────────────────────

#[test]
fn observed_transitions_apply_and_reverse_exactly() {
    for seed in 0..200u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let before = random_value(&mut rng, 3);
        let mut after = before.clone();
        for _ in 0..rng.gen_range(1..4) {
            mutate(&mut rng, &mut after);
        }

        let raw = diff_transition(Some(&before), Some(&after));
        let changes = format_changes(Some(&after), &raw);

        let forward = apply_changes(&before, &changes);
        assert!(
            deep_equal(&forward, &after),
            "seed {seed}: apply diverged\nbefore: {before}\nafter: {after}\nchanges: {changes:?}\ngot: {forward}"
        );

        let backward = reverse_changes(&after, &changes);
        assert!(
            deep_equal(&backward, &before),
            "seed {seed}: reverse diverged\nbefore: {before}\nafter: {after}\nchanges: {changes:?}\ngot: {backward}"
        );
    }
}

#[test]
fn cold_transitions_from_absent_values_apply_exactly() {
    for seed in 0..100u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let after = random_value(&mut rng, 3);

        // An empty mapping produces no per-key adds; that shape replicates
        // through the whole-value path instead.
        if after.as_object().is_some_and(|m| m.is_empty()) {
            continue;
        }

        let raw = diff_transition(None, Some(&after));
        let changes = format_changes(Some(&after), &raw);
        let forward = apply_changes(&Value::Null, &changes);
        assert!(
            deep_equal(&forward, &after),
            "seed {seed}: {after} vs {forward}"
        );
    }
}

#[test]
fn label_determinism_over_random_values() {
    use replicant_core::revision_label;
    for seed in 0..100u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let value = random_value(&mut rng, 3);
        let copy: Value = serde_json::from_str(&value.to_string()).unwrap();
        assert_eq!(
            revision_label(seed, Some(&value)),
            revision_label(seed, Some(&copy))
        );
    }
}

// ── End-to-end convergence ────────────────────────────────────────────────

#[test]
fn random_edit_streams_converge_across_clients() {
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut hub = Hub::new(2);
        register_all(&mut hub, "doc", &[0, 1]);

        hub.client(0)
            .assign("doc", json!({"base": {"items": [1, 2, 3]}}))
            .unwrap();
        hub.pump();

        for _ in 0..10 {
            let editor = rng.gen_range(0..2);
            let mut edit_rng = StdRng::seed_from_u64(rng.gen());
            hub.client(editor)
                .update("doc", move |v| mutate(&mut edit_rng, v))
                .unwrap();
            hub.pump();
        }

        let server_value = hub
            .server
            .replicant("doc")
            .unwrap()
            .value()
            .cloned()
            .unwrap();
        for index in 0..2 {
            let mirrored = hub.client_ref(index).value("doc").cloned().unwrap();
            assert!(
                deep_equal(&mirrored, &server_value),
                "seed {seed}: client {index} diverged\nserver: {server_value}\nclient: {mirrored}"
            );
            assert_eq!(
                hub.client_ref(index).revision_history("doc"),
                hub.server.replicant("doc").unwrap().revision_history(),
                "seed {seed}: client {index} holds a different chain"
            );
        }
    }
}
