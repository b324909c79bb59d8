#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Campaign progression carried between sessions.
//!
//! Players earn campaign points for kills and spend them on tower unlocks
//! and permanent skills. [`CampaignProgress`] is the plain state machine;
//! [`Campaign`] binds it to a [`KeyValueStore`] and persists every change.

mod store;

use std::collections::BTreeSet;

use castle_defence_core::{Bonuses, Skill, TowerKind, Unlockable};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};

/// Key the campaign record is stored under.
pub const STORAGE_KEY: &str = "tower_defense_campaign_progress";

/// Version of the persisted record; any other version resets progress.
pub const STORAGE_VERSION: u32 = 2;

/// Reasons an unlock request is refused.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UnlockError {
    /// No unlockable carries the requested identifier.
    #[error("unknown unlockable `{0}`")]
    Unknown(String),
    /// The item was bought before.
    #[error("`{}` is already unlocked", .0.id())]
    AlreadyUnlocked(Unlockable),
    /// The player lacks campaign points.
    #[error("unlocking needs {required} campaign points but only {available} are available")]
    InsufficientPoints {
        /// Price of the item.
        required: u32,
        /// Points currently held.
        available: u32,
    },
}

/// Failure of a persisted campaign operation.
#[derive(Debug, Error)]
pub enum CampaignError {
    /// The unlock request was refused.
    #[error(transparent)]
    Unlock(#[from] UnlockError),
    /// The change could not be persisted.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Summary of the campaign for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Points available to spend.
    pub campaign_points: u32,
    /// Points earned over the whole campaign.
    pub total_points_earned: u32,
    /// Towers available, the basic tower included.
    pub towers_unlocked: usize,
    /// Towers in the catalogue.
    pub total_towers: usize,
    /// Skills bought.
    pub skills_unlocked: usize,
    /// Skills in the shop.
    pub total_skills: usize,
}

/// Points, towers and skills accumulated across sessions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CampaignProgress {
    campaign_points: u32,
    total_points_earned: u32,
    unlocked_towers: BTreeSet<TowerKind>,
    unlocked_skills: BTreeSet<Skill>,
}

impl Default for CampaignProgress {
    fn default() -> Self {
        Self {
            campaign_points: 0,
            total_points_earned: 0,
            unlocked_towers: BTreeSet::from([TowerKind::Basic]),
            unlocked_skills: BTreeSet::new(),
        }
    }
}

impl CampaignProgress {
    /// Fresh campaign with only the basic tower available.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Points available to spend.
    #[must_use]
    pub fn campaign_points(&self) -> u32 {
        self.campaign_points
    }

    /// Points earned over the whole campaign.
    #[must_use]
    pub fn total_points_earned(&self) -> u32 {
        self.total_points_earned
    }

    /// Towers available for placement, in catalogue order.
    pub fn unlocked_towers(&self) -> impl Iterator<Item = TowerKind> + '_ {
        self.unlocked_towers.iter().copied()
    }

    /// Skills bought so far.
    pub fn unlocked_skills(&self) -> impl Iterator<Item = Skill> + '_ {
        self.unlocked_skills.iter().copied()
    }

    /// Reports whether `item` was unlocked.
    #[must_use]
    pub fn is_unlocked(&self, item: Unlockable) -> bool {
        match item {
            Unlockable::Tower(kind) => self.unlocked_towers.contains(&kind),
            Unlockable::Skill(skill) => self.unlocked_skills.contains(&skill),
        }
    }

    /// Credits `points` earned in a session.
    pub fn award(&mut self, points: u32) {
        self.campaign_points = self.campaign_points.saturating_add(points);
        self.total_points_earned = self.total_points_earned.saturating_add(points);
    }

    /// Checks whether `item` could be bought right now.
    pub fn can_unlock(&self, item: Unlockable) -> Result<(), UnlockError> {
        if self.is_unlocked(item) {
            return Err(UnlockError::AlreadyUnlocked(item));
        }
        let required = item.cost();
        if self.campaign_points < required {
            return Err(UnlockError::InsufficientPoints {
                required,
                available: self.campaign_points,
            });
        }
        Ok(())
    }

    /// Buys `item`, deducting its price.
    pub fn unlock(&mut self, item: Unlockable) -> Result<(), UnlockError> {
        self.can_unlock(item)?;
        self.campaign_points -= item.cost();
        let _ = match item {
            Unlockable::Tower(kind) => self.unlocked_towers.insert(kind),
            Unlockable::Skill(skill) => self.unlocked_skills.insert(skill),
        };
        Ok(())
    }

    /// Buys the item identified by `id`, e.g. `tower_frost`.
    pub fn unlock_by_id(&mut self, id: &str) -> Result<Unlockable, UnlockError> {
        let item = Unlockable::from_id(id).ok_or_else(|| UnlockError::Unknown(id.to_owned()))?;
        self.unlock(item)?;
        Ok(item)
    }

    /// Gameplay modifiers granted by the bought skills.
    #[must_use]
    pub fn bonuses(&self) -> Bonuses {
        Bonuses::from_skills(self.unlocked_skills())
    }

    /// Summary for display.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        Statistics {
            campaign_points: self.campaign_points,
            total_points_earned: self.total_points_earned,
            towers_unlocked: self.unlocked_towers.len(),
            total_towers: TowerKind::ALL.len(),
            skills_unlocked: self.unlocked_skills.len(),
            total_skills: Skill::ALL.len(),
        }
    }

    /// Encodes the progress as a versioned JSON record.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&ProgressRecord {
            version: STORAGE_VERSION,
            campaign_points: self.campaign_points,
            total_points_earned: self.total_points_earned,
            unlocked_towers: self.unlocked_towers.iter().copied().collect(),
            unlocked_skills: self.unlocked_skills.iter().copied().collect(),
        })
    }

    /// Decodes a record, falling back to a fresh campaign when it is
    /// corrupt or carries another version.
    #[must_use]
    pub fn from_json(json: &str) -> Self {
        let record: ProgressRecord = match serde_json::from_str(json) {
            Ok(record) => record,
            Err(error) => {
                warn!(%error, "campaign record is corrupt, resetting progress");
                return Self::new();
            }
        };

        if record.version != STORAGE_VERSION {
            warn!(
                found = record.version,
                expected = STORAGE_VERSION,
                "campaign record version mismatch, resetting progress"
            );
            return Self::new();
        }

        let mut unlocked_towers: BTreeSet<TowerKind> = record.unlocked_towers.into_iter().collect();
        let _ = unlocked_towers.insert(TowerKind::Basic);
        Self {
            campaign_points: record.campaign_points,
            total_points_earned: record.total_points_earned,
            unlocked_towers,
            unlocked_skills: record.unlocked_skills.into_iter().collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressRecord {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    campaign_points: u32,
    #[serde(default)]
    total_points_earned: u32,
    #[serde(default)]
    unlocked_towers: Vec<TowerKind>,
    #[serde(default)]
    unlocked_skills: Vec<Skill>,
}

/// Campaign progress bound to the store it persists into.
#[derive(Debug)]
pub struct Campaign<S> {
    store: S,
    progress: CampaignProgress,
}

impl<S: KeyValueStore> Campaign<S> {
    /// Loads the campaign held by `store`.
    ///
    /// A missing, corrupt, or outdated record starts a fresh campaign that
    /// is written back immediately.
    pub fn open(mut store: S) -> Result<Self, StoreError> {
        let progress = match store.load(STORAGE_KEY)? {
            Some(json) => {
                let progress = CampaignProgress::from_json(&json);
                if progress == CampaignProgress::new() {
                    save(&mut store, &progress)?;
                }
                progress
            }
            None => {
                info!("no campaign record found, starting fresh");
                let progress = CampaignProgress::new();
                save(&mut store, &progress)?;
                progress
            }
        };
        Ok(Self { store, progress })
    }

    /// Current progress.
    #[must_use]
    pub fn progress(&self) -> &CampaignProgress {
        &self.progress
    }

    /// Backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Credits `points` and persists the result.
    pub fn award(&mut self, points: u32) -> Result<(), StoreError> {
        self.progress.award(points);
        debug!(points, total = self.progress.campaign_points(), "campaign points awarded");
        self.persist()
    }

    /// Buys the item identified by `id` and persists the result.
    pub fn unlock(&mut self, id: &str) -> Result<Unlockable, CampaignError> {
        let item = self.progress.unlock_by_id(id)?;
        info!(item = item.id(), remaining = self.progress.campaign_points(), "unlocked");
        self.persist()?;
        Ok(item)
    }

    /// Drops every saved record and starts over with a fresh campaign.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.store.remove(STORAGE_KEY)?;
        self.progress = CampaignProgress::new();
        info!("campaign progress reset");
        self.persist()
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        save(&mut self.store, &self.progress)
    }
}

fn save<S: KeyValueStore>(store: &mut S, progress: &CampaignProgress) -> Result<(), StoreError> {
    let json = progress.to_json()?;
    store.save(STORAGE_KEY, &json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_campaign_only_has_the_basic_tower() {
        let progress = CampaignProgress::new();
        assert_eq!(progress.unlocked_towers().collect::<Vec<_>>(), vec![TowerKind::Basic]);
        assert_eq!(progress.unlocked_skills().count(), 0);
        assert_eq!(progress.bonuses(), Bonuses::default());
    }

    #[test]
    fn unlocking_spends_points() {
        let mut progress = CampaignProgress::new();
        progress.award(120);

        let item = progress.unlock_by_id("tower_chain").expect("affordable");
        assert_eq!(item, Unlockable::Tower(TowerKind::Chain));
        assert_eq!(progress.campaign_points(), 20);
        assert_eq!(progress.total_points_earned(), 120);
        assert!(progress.is_unlocked(item));
    }

    #[test]
    fn unlock_refusals() {
        let mut progress = CampaignProgress::new();
        progress.award(60);

        assert_eq!(
            progress.unlock_by_id("tower_laser"),
            Err(UnlockError::Unknown("tower_laser".to_owned()))
        );
        assert_eq!(
            progress.unlock_by_id("tower_frost"),
            Err(UnlockError::InsufficientPoints {
                required: 300,
                available: 60,
            })
        );

        let gold = Unlockable::Skill(Skill::StartingGold);
        progress.unlock(gold).expect("affordable");
        progress.award(100);
        assert_eq!(progress.unlock(gold), Err(UnlockError::AlreadyUnlocked(gold)));
        assert_eq!(progress.campaign_points(), 110);
    }

    #[test]
    fn skills_feed_bonuses() {
        let mut progress = CampaignProgress::new();
        progress.award(1_000);
        let _ = progress.unlock_by_id("skill_starting_gold").expect("affordable");
        let _ = progress.unlock_by_id("skill_extra_lives").expect("affordable");

        let bonuses = progress.bonuses();
        assert_eq!(bonuses.starting_gold, 150);
        assert_eq!(bonuses.starting_lives, 25);
    }

    #[test]
    fn record_uses_the_flat_camel_case_layout() {
        let mut progress = CampaignProgress::new();
        progress.award(300);
        let _ = progress.unlock_by_id("tower_aoe").expect("affordable");
        let _ = progress.unlock_by_id("skill_gold_bonus").expect("affordable");

        let json: serde_json::Value =
            serde_json::from_str(&progress.to_json().expect("encode")).expect("valid json");
        assert_eq!(
            json,
            serde_json::json!({
                "version": 2,
                "campaignPoints": 50,
                "totalPointsEarned": 300,
                "unlockedTowers": ["basic", "aoe"],
                "unlockedSkills": ["skill_gold_bonus"],
            })
        );
    }

    #[test]
    fn outdated_or_corrupt_records_reset() {
        let outdated = r#"{"version":1,"campaignPoints":999,"unlockedTowers":["frost"]}"#;
        assert_eq!(CampaignProgress::from_json(outdated), CampaignProgress::new());
        assert_eq!(CampaignProgress::from_json("not json"), CampaignProgress::new());
        assert_eq!(
            CampaignProgress::from_json(r#"{"campaignPoints":5}"#),
            CampaignProgress::new()
        );
    }

    #[test]
    fn missing_basic_tower_is_restored() {
        let record = r#"{"version":2,"campaignPoints":5,"totalPointsEarned":5,"unlockedTowers":["sniper"],"unlockedSkills":[]}"#;
        let progress = CampaignProgress::from_json(record);
        assert!(progress.is_unlocked(Unlockable::Tower(TowerKind::Basic)));
        assert!(progress.is_unlocked(Unlockable::Tower(TowerKind::Sniper)));
        assert_eq!(progress.campaign_points(), 5);
    }

    #[test]
    fn campaign_persists_every_change() {
        let mut campaign = Campaign::open(MemoryStore::new()).expect("open");
        assert!(campaign
            .store()
            .load(STORAGE_KEY)
            .expect("load")
            .is_some());

        campaign.award(150).expect("award");
        let _ = campaign.unlock("tower_aoe").expect("unlock");

        let reopened = Campaign::open(campaign.store().clone()).expect("reopen");
        assert_eq!(reopened.progress(), campaign.progress());
        assert_eq!(reopened.progress().campaign_points(), 0);
    }

    #[test]
    fn statistics_count_the_basic_tower() {
        let stats = CampaignProgress::new().statistics();
        assert_eq!(stats.towers_unlocked, 1);
        assert_eq!(stats.total_towers, 6);
        assert_eq!(stats.total_skills, 6);
    }
}
