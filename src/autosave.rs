//! Periodic dual-write auto-save.
//!
//! Every tick captures the live game once and writes it twice: to the
//! remote save service and to the local mirror. The two writes are
//! independent and best effort; one failing never prevents the other.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::logging::{debug, warn};
use crate::mirror::{ClientMirror, MirrorError};
use crate::model::{LiveGame, SaveRecord, SaveSummary};
use crate::service::{SaveError, SaveService};
use crate::session::LiveSource;

/// Remote side of an auto-save.
pub trait RemoteSaves: Send + Sync {
    fn save_game(
        &self,
        owner_id: &str,
        game: &LiveGame,
        save_name: &str,
    ) -> Result<SaveSummary, SaveError>;
}

impl RemoteSaves for SaveService {
    fn save_game(
        &self,
        owner_id: &str,
        game: &LiveGame,
        save_name: &str,
    ) -> Result<SaveSummary, SaveError> {
        self.create_save(owner_id, Some(game), Some(save_name))
    }
}

/// Local side of an auto-save.
pub trait LocalSaves: Send + Sync {
    fn mirror_save(&self, record: &SaveRecord) -> Result<SaveSummary, MirrorError>;
}

impl LocalSaves for ClientMirror {
    fn mirror_save(&self, record: &SaveRecord) -> Result<SaveSummary, MirrorError> {
        ClientMirror::mirror_save(self, record)
    }
}

/// Name used for auto-saves, e.g. `Autosave: Rin (2026-10-16 18:05)`.
pub fn autosave_name(character_name: &str, now: DateTime<Utc>) -> String {
    format!("Autosave: {} ({})", character_name, now.format("%Y-%m-%d %H:%M"))
}

/// Result of one auto-save tick.
#[derive(Debug)]
pub enum AutoSaveOutcome {
    /// No live game with a created character; nothing was written.
    Skipped,
    /// Both writes were attempted.
    Attempted {
        remote: Result<SaveSummary, SaveError>,
        local: Result<SaveSummary, MirrorError>,
    },
}

impl AutoSaveOutcome {
    /// True when at least one copy was written.
    pub fn any_succeeded(&self) -> bool {
        match self {
            Self::Skipped => false,
            Self::Attempted { remote, local } => remote.is_ok() || local.is_ok(),
        }
    }
}

/// Fixed-interval auto-saver for one owner.
pub struct AutoSaver {
    owner_id: String,
    interval: Duration,
    live: Arc<dyn LiveSource>,
    remote: Arc<dyn RemoteSaves>,
    local: Arc<dyn LocalSaves>,
}

impl AutoSaver {
    pub fn new(
        owner_id: impl Into<String>,
        interval: Duration,
        live: Arc<dyn LiveSource>,
        remote: Arc<dyn RemoteSaves>,
        local: Arc<dyn LocalSaves>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            interval,
            live,
            remote,
            local,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one auto-save now.
    pub fn tick(&self) -> AutoSaveOutcome {
        let Some(game) = self.live.live_game(&self.owner_id) else {
            debug!(owner = %self.owner_id, "auto-save skipped, no live game");
            return AutoSaveOutcome::Skipped;
        };
        if !game.character.is_created() {
            debug!(owner = %self.owner_id, "auto-save skipped, character not created");
            return AutoSaveOutcome::Skipped;
        }

        let now = Utc::now();
        let name = autosave_name(&game.character.name, now);

        let remote = self.remote.save_game(&self.owner_id, &game, &name);
        if let Err(_e) = &remote {
            warn!(owner = %self.owner_id, code = _e.code(), error = %_e, "remote auto-save failed");
        }

        let record = SaveRecord::capture(&self.owner_id, &game, Some(&name), now);
        let local = self.local.mirror_save(&record);
        if let Err(_e) = &local {
            warn!(owner = %self.owner_id, code = _e.code(), error = %_e, "local auto-save failed");
        }

        AutoSaveOutcome::Attempted { remote, local }
    }

    /// Tick on a fixed interval until the returned task is aborted.
    ///
    /// The first tick fires one full interval after spawning.
    pub fn spawn(self) -> JoinHandle<()> {
        let saver = Arc::new(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(saver.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let current = Arc::clone(&saver);
                if let Err(_e) = tokio::task::spawn_blocking(move || current.tick()).await {
                    warn!(owner = %saver.owner_id, error = %_e, "auto-save task failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_autosave_name_embeds_character() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 18, 5, 0).unwrap();
        assert_eq!(autosave_name("Rin", now), "Autosave: Rin (2026-10-16 18:05)");
    }
}
