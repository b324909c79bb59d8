//! Campaign skills and the gameplay modifiers they grant.

use serde::{Deserialize, Serialize};

use crate::TowerKind;

const BASE_STARTING_GOLD: u32 = 100;
const BASE_LIVES: u32 = 20;

/// Permanent upgrades purchasable with campaign points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Skill {
    /// Start every session with 50 additional gold.
    #[serde(rename = "skill_starting_gold")]
    StartingGold,
    /// Kill bounties pay 20% more.
    #[serde(rename = "skill_gold_bonus")]
    GoldRush,
    /// Building and upgrading costs 10% less.
    #[serde(rename = "skill_tower_discount")]
    TowerDiscount,
    /// Start every session with 5 additional lives.
    #[serde(rename = "skill_extra_lives")]
    ExtraLives,
    /// Towers deal 15% more damage.
    #[serde(rename = "skill_tower_damage")]
    TowerDamage,
    /// Towers reach 20% further.
    #[serde(rename = "skill_tower_range")]
    TowerRange,
}

impl Skill {
    /// Every skill in shop order.
    pub const ALL: [Skill; 6] = [
        Self::StartingGold,
        Self::GoldRush,
        Self::TowerDiscount,
        Self::ExtraLives,
        Self::TowerDamage,
        Self::TowerRange,
    ];

    /// Stable identifier used in saves and on the command line.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::StartingGold => "skill_starting_gold",
            Self::GoldRush => "skill_gold_bonus",
            Self::TowerDiscount => "skill_tower_discount",
            Self::ExtraLives => "skill_extra_lives",
            Self::TowerDamage => "skill_tower_damage",
            Self::TowerRange => "skill_tower_range",
        }
    }

    /// Campaign points needed to unlock the skill.
    #[must_use]
    pub const fn cost(self) -> u32 {
        match self {
            Self::StartingGold => 50,
            Self::GoldRush => 100,
            Self::TowerDiscount => 150,
            Self::ExtraLives => 200,
            Self::TowerDamage | Self::TowerRange => 250,
        }
    }
}

/// Anything that can be bought in the unlock shop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Unlockable {
    /// Makes a tower kind buildable.
    Tower(TowerKind),
    /// Grants a permanent skill.
    Skill(Skill),
}

impl Unlockable {
    /// Every purchasable item; the basic tower is excluded as it is always available.
    pub const ALL: [Unlockable; 11] = [
        Self::Tower(TowerKind::Chain),
        Self::Tower(TowerKind::Aoe),
        Self::Tower(TowerKind::Sniper),
        Self::Tower(TowerKind::Rapid),
        Self::Tower(TowerKind::Frost),
        Self::Skill(Skill::StartingGold),
        Self::Skill(Skill::GoldRush),
        Self::Skill(Skill::TowerDiscount),
        Self::Skill(Skill::ExtraLives),
        Self::Skill(Skill::TowerDamage),
        Self::Skill(Skill::TowerRange),
    ];

    /// Stable identifier, e.g. `tower_chain` or `skill_extra_lives`.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Tower(kind) => match kind {
                TowerKind::Basic => "tower_basic",
                TowerKind::Sniper => "tower_sniper",
                TowerKind::Rapid => "tower_rapid",
                TowerKind::Aoe => "tower_aoe",
                TowerKind::Chain => "tower_chain",
                TowerKind::Frost => "tower_frost",
            },
            Self::Skill(skill) => skill.id(),
        }
    }

    /// Looks up an item by its identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.id() == id)
    }

    /// Campaign points needed to unlock the item.
    #[must_use]
    pub const fn cost(self) -> u32 {
        match self {
            Self::Tower(kind) => match kind {
                TowerKind::Basic => 0,
                TowerKind::Chain => 100,
                TowerKind::Aoe => 150,
                TowerKind::Sniper => 200,
                TowerKind::Rapid => 250,
                TowerKind::Frost => 300,
            },
            Self::Skill(skill) => skill.cost(),
        }
    }
}

/// Gameplay modifiers derived from unlocked skills.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bonuses {
    /// Gold available when a session starts.
    pub starting_gold: u32,
    /// Lives available when a session starts.
    pub starting_lives: u32,
    /// Multiplier applied to kill bounties.
    pub gold_multiplier: f64,
    /// Multiplier applied to build and upgrade costs.
    pub cost_multiplier: f64,
    /// Multiplier applied to tower damage.
    pub damage_multiplier: f64,
    /// Multiplier applied to tower range.
    pub range_multiplier: f64,
}

impl Default for Bonuses {
    fn default() -> Self {
        Self {
            starting_gold: BASE_STARTING_GOLD,
            starting_lives: BASE_LIVES,
            gold_multiplier: 1.0,
            cost_multiplier: 1.0,
            damage_multiplier: 1.0,
            range_multiplier: 1.0,
        }
    }
}

impl Bonuses {
    /// Folds the provided skills into a set of modifiers.
    #[must_use]
    pub fn from_skills(skills: impl IntoIterator<Item = Skill>) -> Self {
        let mut bonuses = Self::default();
        for skill in skills {
            match skill {
                Skill::StartingGold => bonuses.starting_gold = BASE_STARTING_GOLD + 50,
                Skill::GoldRush => bonuses.gold_multiplier = 1.2,
                Skill::TowerDiscount => bonuses.cost_multiplier = 0.9,
                Skill::ExtraLives => bonuses.starting_lives = BASE_LIVES + 5,
                Skill::TowerDamage => bonuses.damage_multiplier = 1.15,
                Skill::TowerRange => bonuses.range_multiplier = 1.2,
            }
        }
        bonuses
    }

    /// Bounty paid for a kill worth `base` gold.
    #[must_use]
    pub fn bounty(&self, base: u32) -> u32 {
        round_scaled(f64::from(base), self.gold_multiplier) as u32
    }

    /// Price of something listed at `base` gold.
    #[must_use]
    pub fn cost(&self, base: u32) -> u32 {
        round_scaled(f64::from(base), self.cost_multiplier) as u32
    }

    /// Damage dealt by a hit listed at `base`.
    #[must_use]
    pub fn damage(&self, base: f32) -> f32 {
        round_scaled(f64::from(base), self.damage_multiplier) as f32
    }

    /// Range of a tower listed at `base`.
    #[must_use]
    pub fn range(&self, base: f32) -> f32 {
        round_scaled(f64::from(base), self.range_multiplier) as f32
    }
}

fn round_scaled(base: f64, multiplier: f64) -> f64 {
    (base * multiplier).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_skills_leave_values_untouched() {
        let bonuses = Bonuses::from_skills([]);
        assert_eq!(bonuses, Bonuses::default());
        assert_eq!(bonuses.cost(55), 55);
        assert_eq!(bonuses.bounty(10), 10);
    }

    #[test]
    fn skills_round_like_the_shop() {
        let bonuses = Bonuses::from_skills([Skill::GoldRush, Skill::TowerDiscount]);
        assert_eq!(bonuses.bounty(10), 12);
        assert_eq!(bonuses.cost(55), 50);
        assert_eq!(bonuses.cost(250), 225);
    }

    #[test]
    fn starting_resources_include_skill_bonuses() {
        let bonuses = Bonuses::from_skills([Skill::StartingGold, Skill::ExtraLives]);
        assert_eq!(bonuses.starting_gold, 150);
        assert_eq!(bonuses.starting_lives, 25);
    }

    #[test]
    fn unlockables_resolve_by_identifier() {
        assert_eq!(
            Unlockable::from_id("tower_chain"),
            Some(Unlockable::Tower(TowerKind::Chain))
        );
        assert_eq!(
            Unlockable::from_id("skill_extra_lives"),
            Some(Unlockable::Skill(Skill::ExtraLives))
        );
        assert_eq!(Unlockable::from_id("tower_basic"), None);
        assert_eq!(Unlockable::from_id("nonsense"), None);
    }
}
