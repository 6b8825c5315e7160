//! Property-based tests for save listing and record decoding.
//!
//! These tests check that the index always agrees with the sequence of
//! operations applied to it, and that decoding arbitrary input never panics.

mod common;

use std::collections::BTreeSet;

use chrono::{Duration, TimeZone, Utc};
use common::{TestService, character, live_game};
use proptest::prelude::*;
use savekeep::{LiveGame, SaveIndex, SaveRecord, StorageLocation, WorldSnapshot};

#[derive(Debug, Clone)]
enum Op {
    Create(String),
    /// Delete the n-th live save (modulo the number of live saves).
    Delete(usize),
    /// Delete an id that was never issued.
    DeleteUnknown,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => "[A-Za-z ]{0,12}".prop_map(Op::Create),
        2 => any::<usize>().prop_map(Op::Delete),
        1 => Just(Op::DeleteUnknown),
    ]
}

// Service listing agrees with a plain set of live ids
proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn listing_matches_applied_ops(ops in prop::collection::vec(op(), 1..16)) {
        let t = TestService::new().unwrap();
        let game = live_game("u1", "Rin");
        let mut live: Vec<String> = Vec::new();

        for op in ops {
            match op {
                Op::Create(name) => {
                    let summary = t.service.create_save("u1", Some(&game), Some(&name)).unwrap();
                    prop_assert!(!live.contains(&summary.save_id));
                    live.push(summary.save_id);
                }
                Op::Delete(n) if !live.is_empty() => {
                    let id = live.remove(n % live.len());
                    prop_assert!(t.service.delete_save("u1", &id).unwrap());
                }
                Op::Delete(_) | Op::DeleteUnknown => {
                    prop_assert!(!t.service.delete_save("u1", "never-issued").unwrap());
                }
            }
        }

        let listed = t.service.list_saves("u1").unwrap();
        let listed_ids: BTreeSet<_> = listed.iter().map(|s| s.save_id.clone()).collect();
        let expected: BTreeSet<_> = live.iter().cloned().collect();
        prop_assert_eq!(listed_ids, expected);
        prop_assert_eq!(listed.len(), live.len());
        let sorted = listed.windows(2).all(|w| match w {
            [a, b] => a.timestamp >= b.timestamp,
            _ => true,
        });
        prop_assert!(sorted);
    }
}

// Index invariants under arbitrary upserts and removals
proptest! {
    #[test]
    fn index_stays_sorted_and_unique(
        ops in prop::collection::vec((0u8..6, 0i64..1000, any::<bool>()), 0..40)
    ) {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut index = SaveIndex::new();

        for (id, offset, insert) in ops {
            let save_id = format!("s{}", id);
            if insert {
                let mut rec = SaveRecord::capture(
                    "u1",
                    &LiveGame::new(character("u1", "Rin", 1), WorldSnapshot::default()),
                    None,
                    base + Duration::seconds(offset),
                );
                rec.save_id = save_id.clone();
                index.upsert(rec.summary(StorageLocation::Server));
                prop_assert!(index.contains(&save_id));
            } else {
                index.remove(&save_id);
                prop_assert!(!index.contains(&save_id));
            }
        }

        let ids: Vec<_> = index.entries().iter().map(|s| s.save_id.clone()).collect();
        let unique: BTreeSet<_> = ids.iter().cloned().collect();
        prop_assert_eq!(ids.len(), unique.len());
        let sorted = index.entries().windows(2).all(|w| match w {
            [a, b] => (a.timestamp, &b.save_id) >= (b.timestamp, &a.save_id),
            _ => true,
        });
        prop_assert!(sorted);
    }
}

// Decoding never panics and never accepts a document without its snapshots
proptest! {
    #[test]
    fn decoding_arbitrary_bytes_is_total(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = SaveRecord::from_json_slice(&bytes);
    }

    #[test]
    fn documents_missing_a_snapshot_are_rejected(
        drop_character in any::<bool>(),
        save_id in "[a-z0-9-]{1,20}",
    ) {
        let mut doc = common::save_document(&save_id, "u1", "Bram");
        let removed = if drop_character { "character_snapshot" } else { "world_snapshot" };
        if let Some(object) = doc.as_object_mut() {
            object.remove(removed);
        }
        let bytes = serde_json::to_vec(&doc).unwrap();
        prop_assert!(SaveRecord::from_json_slice(&bytes).is_err());
    }

    #[test]
    fn captured_character_survives_encoding(
        level in 1u32..20,
        hp in -10i32..200,
        strength in 3u8..=20,
        inventory in prop::collection::vec("[a-zA-Z ]{1,16}", 0..8),
    ) {
        let mut game = live_game("u1", "Rin");
        game.character.level = level;
        game.character.hp = hp;
        game.character.strength = strength;
        game.character.inventory = inventory;

        let rec = SaveRecord::capture("u1", &game, None, Utc::now());
        let decoded = SaveRecord::from_json_slice(&rec.to_json_pretty().unwrap()).unwrap();
        prop_assert_eq!(decoded.to_live_game(), game);
    }
}
