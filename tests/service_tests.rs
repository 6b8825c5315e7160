//! Integration tests for the save service over the file store.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use common::{TestService, live_game, live_game_in_combat};
use savekeep::{SaveError, SaveStore, SessionRegistry, StorageLocation};

// =============================================================================
// Create / List
// =============================================================================

#[test]
fn test_create_then_list_newest_first() -> anyhow::Result<()> {
    let t = TestService::new()?;
    let game = live_game("u1", "Rin");

    let first = t.service.create_save("u1", Some(&game), Some("Dawn"))?;
    let second = t.service.create_save("u1", Some(&game), None)?;

    assert_ne!(first.save_id, second.save_id);
    assert_eq!(second.save_name, "Rin's Adventure");
    assert_eq!(second.character_name, "Rin");
    assert_eq!(second.character_level, 3);
    assert_eq!(second.character_class, "Ranger");
    assert_eq!(second.storage_location, StorageLocation::Server);

    let saves = t.service.list_saves("u1")?;
    let names: Vec<_> = saves.iter().map(|s| s.save_name.as_str()).collect();
    assert_eq!(names, vec!["Rin's Adventure", "Dawn"]);
    Ok(())
}

#[test]
fn test_whitespace_name_uses_default() -> anyhow::Result<()> {
    let t = TestService::new()?;
    let summary = t
        .service
        .create_save("u1", Some(&live_game("u1", "Rin")), Some("   "))?;
    assert_eq!(summary.save_name, "Rin's Adventure");
    Ok(())
}

#[test]
fn test_unknown_owner_has_no_saves() -> anyhow::Result<()> {
    let t = TestService::new()?;
    assert!(t.service.list_saves("nobody")?.is_empty());
    Ok(())
}

#[test]
fn test_owners_never_see_each_other() -> anyhow::Result<()> {
    let t = TestService::new()?;
    let summary = t
        .service
        .create_save("u1", Some(&live_game("u1", "Rin")), None)?;

    assert!(t.service.list_saves("u2")?.is_empty());
    let err = t.service.load_save("u2", &summary.save_id).unwrap_err();
    assert_eq!(err.code(), "SAVE_NOT_FOUND");
    assert!(!t.service.delete_save("u2", &summary.save_id)?);
    assert_eq!(t.service.list_saves("u1")?.len(), 1);
    Ok(())
}

#[test]
fn test_create_without_character_writes_nothing() -> anyhow::Result<()> {
    let t = TestService::new()?;
    let mut game = live_game("u1", "Rin");
    game.character.name.clear();

    let err = t.service.create_save("u1", Some(&game), None).unwrap_err();
    assert!(matches!(err, SaveError::NoActiveCharacter(_)));
    assert!(t.store.list_record_ids("u1")?.is_empty());
    Ok(())
}

// =============================================================================
// Load
// =============================================================================

#[test]
fn test_round_trip_ignores_later_mutation() -> anyhow::Result<()> {
    let t = TestService::new()?;
    let mut game = live_game_in_combat("u1", "Rin");
    let summary = t.service.create_save("u1", Some(&game), Some("Ambush"))?;

    game.character.hp = 1;
    game.character.inventory.clear();
    game.world.combat = None;
    game.world.current_location_id = "crypt".into();

    let record = t.service.load_save("u1", &summary.save_id)?;
    let saved = live_game_in_combat("u1", "Rin");
    assert_eq!(record.character_snapshot, saved.character);
    assert_eq!(record.world_snapshot, saved.world);
    assert_eq!(record.save_name, "Ambush");
    assert_eq!(record.owner_id, "u1");
    Ok(())
}

#[test]
fn test_load_restores_live_state() -> anyhow::Result<()> {
    let t = TestService::new()?;
    let sessions = SessionRegistry::new();
    let game = live_game("u1", "Rin");
    sessions.set("u1", game.clone());

    let summary = t.service.create_save("u1", sessions.get("u1").as_ref(), None)?;

    let mut wounded = game.clone();
    wounded.character.hp = 2;
    sessions.set("u1", wounded);

    let record = t.service.load_save("u1", &summary.save_id)?;
    sessions.apply_record(&record);
    assert_eq!(sessions.get("u1"), Some(game));
    Ok(())
}

#[test]
fn test_load_unknown_save() -> anyhow::Result<()> {
    let t = TestService::new()?;
    let err = t.service.load_save("u1", "does-not-exist").unwrap_err();
    assert!(matches!(err, SaveError::SaveNotFound(_)));
    Ok(())
}

#[test]
fn test_load_never_rewrites_record() -> anyhow::Result<()> {
    let t = TestService::new()?;
    let summary = t
        .service
        .create_save("u1", Some(&live_game("u1", "Rin")), None)?;

    let before: Vec<_> = std::fs::read_dir(t.saves_dir("u1"))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    let bytes_before = std::fs::read(before.first().ok_or_else(|| anyhow::anyhow!("no artifact"))?)?;

    t.service.load_save("u1", &summary.save_id)?;
    t.service.load_save("u1", &summary.save_id)?;

    let after: Vec<_> = std::fs::read_dir(t.saves_dir("u1"))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    assert_eq!(before, after);
    assert_eq!(
        std::fs::read(after.first().ok_or_else(|| anyhow::anyhow!("no artifact"))?)?,
        bytes_before
    );
    Ok(())
}

// =============================================================================
// Delete
// =============================================================================

#[test]
fn test_double_delete() -> anyhow::Result<()> {
    let t = TestService::new()?;
    let summary = t
        .service
        .create_save("u1", Some(&live_game("u1", "Rin")), None)?;

    assert!(t.service.delete_save("u1", &summary.save_id)?);
    assert!(!t.service.delete_save("u1", &summary.save_id)?);
    assert!(t.service.list_saves("u1")?.is_empty());
    assert!(matches!(
        t.service.load_save("u1", &summary.save_id),
        Err(SaveError::SaveNotFound(_))
    ));
    Ok(())
}

#[test]
fn test_delete_with_record_already_gone() -> anyhow::Result<()> {
    let t = TestService::new()?;
    let summary = t
        .service
        .create_save("u1", Some(&live_game("u1", "Rin")), None)?;
    std::fs::remove_dir_all(t.saves_dir("u1"))?;

    assert!(t.service.delete_save("u1", &summary.save_id)?);
    assert!(t.service.list_saves("u1")?.is_empty());
    Ok(())
}

// =============================================================================
// Reconciliation
// =============================================================================

#[test]
fn test_dangling_entry_purged_on_list() -> anyhow::Result<()> {
    let t = TestService::new()?;
    let game = live_game("u1", "Rin");
    let kept = t.service.create_save("u1", Some(&game), Some("Kept"))?;
    let lost = t.service.create_save("u1", Some(&game), Some("Lost"))?;

    // Remove the record behind the service's back.
    assert!(t.store.delete_record("u1", &lost.save_id)?);

    let saves = t.service.list_saves("u1")?;
    assert_eq!(saves.len(), 1);
    assert_eq!(saves.first().map(|s| s.save_id.as_str()), Some(kept.save_id.as_str()));

    // The purge is persisted.
    let index = t.store.read_index("u1")?;
    assert!(!index.contains(&lost.save_id));
    Ok(())
}

#[test]
fn test_dangling_entry_purged_on_load() -> anyhow::Result<()> {
    let t = TestService::new()?;
    let lost = t
        .service
        .create_save("u1", Some(&live_game("u1", "Rin")), None)?;
    t.store.delete_record("u1", &lost.save_id)?;

    assert!(matches!(
        t.service.load_save("u1", &lost.save_id),
        Err(SaveError::SaveNotFound(_))
    ));
    assert!(!t.store.read_index("u1")?.contains(&lost.save_id));
    Ok(())
}

#[test]
fn test_corrupted_record_with_readable_metadata_keeps_entry() -> anyhow::Result<()> {
    let t = TestService::new()?;
    let summary = t
        .service
        .create_save("u1", Some(&live_game("u1", "Rin")), Some("Dawn"))?;

    let artifact = std::fs::read_dir(t.saves_dir("u1"))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .next()
        .ok_or_else(|| anyhow::anyhow!("no artifact"))?;
    let mut doc: serde_json::Value = serde_json::from_slice(&std::fs::read(&artifact)?)?;
    doc["character_snapshot"] = serde_json::json!("not an object");
    std::fs::write(&artifact, serde_json::to_vec(&doc)?)?;

    let err = t.service.load_save("u1", &summary.save_id).unwrap_err();
    assert_eq!(err.code(), "SAVE_CORRUPTED");
    assert!(t.store.read_index("u1")?.contains(&summary.save_id));
    Ok(())
}

#[test]
fn test_unreadable_record_purges_entry() -> anyhow::Result<()> {
    let t = TestService::new()?;
    let summary = t
        .service
        .create_save("u1", Some(&live_game("u1", "Rin")), None)?;

    let artifact = std::fs::read_dir(t.saves_dir("u1"))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .next()
        .ok_or_else(|| anyhow::anyhow!("no artifact"))?;
    std::fs::write(&artifact, b"{\"save_id\": ")?;

    let err = t.service.load_save("u1", &summary.save_id).unwrap_err();
    assert_eq!(err.code(), "SAVE_CORRUPTED");
    assert!(!t.store.read_index("u1")?.contains(&summary.save_id));
    Ok(())
}

#[test]
fn test_corrupted_index_starts_empty_then_rebuilds() -> anyhow::Result<()> {
    let t = TestService::new()?;
    let game = live_game("u1", "Rin");
    t.service.create_save("u1", Some(&game), Some("One"))?;
    t.service.create_save("u1", Some(&game), Some("Two"))?;

    // A fresh service has no cached index and must read the damaged file.
    std::fs::write(t.index_path("u1"), b"not json")?;
    let fresh = savekeep::SaveService::new(t.store.clone());
    assert!(fresh.list_saves("u1")?.is_empty());

    let rebuilt = fresh.rebuild_index("u1")?;
    let names: Vec<_> = rebuilt.iter().map(|s| s.save_name.as_str()).collect();
    assert_eq!(names, vec!["Two", "One"]);
    assert_eq!(fresh.list_saves("u1")?.len(), 2);
    Ok(())
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_creates_are_all_indexed() -> anyhow::Result<()> {
    let t = TestService::new()?;
    let service = Arc::new(savekeep::SaveService::new(t.store.clone()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                let game = live_game("u1", "Rin");
                service.create_save("u1", Some(&game), Some(&format!("Save {}", i)))
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        let summary = handle
            .join()
            .map_err(|_| anyhow::anyhow!("save thread panicked"))??;
        ids.push(summary.save_id);
    }

    let listed = service.list_saves("u1")?;
    assert_eq!(listed.len(), 8);
    for id in &ids {
        assert!(listed.iter().any(|s| &s.save_id == id));
    }
    assert_eq!(t.store.read_index("u1")?.len(), 8);
    Ok(())
}

#[test]
fn test_saves_racing_deletes_leave_consistent_state() -> anyhow::Result<()> {
    let t = TestService::new()?;
    let service = Arc::new(savekeep::SaveService::new(t.store.clone()));
    let game = live_game("u1", "Rin");

    let seeded: Vec<String> = (0..8)
        .map(|i| service.create_save("u1", Some(&game), Some(&format!("Seed {}", i))))
        .map(|r| r.map(|s| s.save_id))
        .collect::<Result<_, _>>()?;
    let seeded = Arc::new(seeded);

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let service = Arc::clone(&service);
            let seeded = Arc::clone(&seeded);
            thread::spawn(move || -> anyhow::Result<(Vec<String>, usize)> {
                let game = live_game("u1", "Rin");
                let mut kept = Vec::new();
                let mut seeds_deleted = 0;
                for i in 0..6 {
                    let name = format!("Worker {} #{}", worker, i);
                    let summary = service.create_save("u1", Some(&game), Some(&name))?;
                    if i % 2 == 0 {
                        assert!(service.delete_save("u1", &summary.save_id)?);
                    } else {
                        kept.push(summary.save_id);
                    }

                    let seed = &seeded[(worker * 2 + i) % seeded.len()];
                    if service.delete_save("u1", seed)? {
                        seeds_deleted += 1;
                    }
                }
                Ok((kept, seeds_deleted))
            })
        })
        .collect();

    let mut kept = BTreeSet::new();
    let mut seeds_deleted = 0;
    for handle in handles {
        let (ids, deleted) = handle
            .join()
            .map_err(|_| anyhow::anyhow!("worker thread panicked"))??;
        kept.extend(ids);
        seeds_deleted += deleted;
    }
    assert_eq!(seeds_deleted, seeded.len());
    assert_eq!(kept.len(), 12);

    let listed: BTreeSet<_> = service
        .list_saves("u1")?
        .into_iter()
        .map(|s| s.save_id)
        .collect();
    let indexed: BTreeSet<_> = t
        .store
        .read_index("u1")?
        .entries()
        .iter()
        .map(|s| s.save_id.clone())
        .collect();
    let on_disk: BTreeSet<_> = t.store.list_record_ids("u1")?.into_iter().collect();

    assert_eq!(listed, kept);
    assert_eq!(indexed, kept);
    assert_eq!(on_disk, kept);
    Ok(())
}

#[test]
fn test_owners_save_in_parallel() -> anyhow::Result<()> {
    let t = TestService::new()?;
    let service = Arc::new(savekeep::SaveService::new(t.store.clone()));

    let handles: Vec<_> = ["u1", "u2", "u3"]
        .into_iter()
        .map(|owner| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                let game = live_game(owner, "Rin");
                service.create_save(owner, Some(&game), None)
            })
        })
        .collect();
    for handle in handles {
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("save thread panicked"))??;
    }

    for owner in ["u1", "u2", "u3"] {
        assert_eq!(service.list_saves(owner)?.len(), 1);
    }
    Ok(())
}
