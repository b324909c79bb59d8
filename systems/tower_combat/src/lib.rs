#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turns tower-to-unit pairings into fire orders for the world.
//!
//! Targeting decides who each tower aims at; this system only decides
//! whether the tower may pull the trigger this tick.

use castle_defence_core::{Command, SessionStatus, TowerTarget, TowerView};

/// Issues `FireProjectile` for every paired tower that is loaded and upright.
#[derive(Debug, Default)]
pub struct TowerCombat;

impl TowerCombat {
    /// Creates the combat system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Appends one fire order per target whose tower can shoot right now.
    ///
    /// Orders keep the order of `tower_targets`. A tower counts as unable to
    /// shoot while reloading, while a splash has knocked it out, or when it
    /// has vanished from `towers` since targeting ran.
    pub fn handle(
        &mut self,
        status: SessionStatus,
        towers: &TowerView,
        tower_targets: &[TowerTarget],
        out: &mut Vec<Command>,
    ) {
        if status != SessionStatus::Running {
            return;
        }

        out.extend(
            tower_targets
                .iter()
                .filter(|pairing| {
                    towers
                        .get(pairing.tower)
                        .is_some_and(|tower| tower.can_fire())
                })
                .map(|pairing| Command::FireProjectile {
                    tower: pairing.tower,
                    target: pairing.unit,
                }),
        );
    }
}
