//! Consumption resolution
//!
//! Players eat anything edible whose center has crossed inside their edge and
//! pick up power-ups the same way. Deletions are collected into a pending set
//! and applied once every player has had its turn.

use smallvec::SmallVec;

use crate::game::entity::{Color, EntityId, GameTime, PlayerId, PowerupKind};
use crate::game::game_loop::GameEvent;
use crate::game::spatial::{EntitySet, Rect};
use crate::game::state::GameState;
use crate::game::systems::spawning;

/// What a candidate turns into once its center is inside the eater
enum Meal {
    Grow { radius: f32, victim: Option<(PlayerId, Color)> },
    Collect(PowerupKind),
}

/// Resolve every player's meals for this frame
pub fn resolve(state: &mut GameState, now: GameTime) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let mut pending = EntitySet::default();
    let mut candidates = EntitySet::default();

    let eaters: SmallVec<[EntityId; 16]> = state.registry.player_ids().iter().copied().collect();

    for eater_id in eaters {
        // Eaten earlier this frame
        if pending.contains(&eater_id) {
            continue;
        }
        let Some(eater) = state.registry.get(eater_id) else {
            continue;
        };
        let Some(eater_player) = eater.as_player().map(|p| p.player_id) else {
            continue;
        };

        // Snapshot: growth during this turn does not widen the threshold
        let center = eater.position;
        let radius = eater.radius;
        let radius_sq = radius * radius;

        candidates.clear();
        state.registry.query_into(&Rect::centered(center, radius), &mut candidates);
        let mut ordered: SmallVec<[EntityId; 32]> = candidates.iter().copied().collect();
        ordered.sort_unstable();

        for candidate_id in ordered {
            if candidate_id == eater_id || pending.contains(&candidate_id) {
                continue;
            }
            let Some(candidate) = state.registry.get(candidate_id) else {
                continue;
            };
            if candidate.radius > radius {
                continue;
            }
            let caps = candidate.capabilities();
            if !caps.edible && !caps.collectible {
                continue;
            }
            // The candidate's center must be inside the eater's edge
            if candidate.position.distance_sq_to(center) >= radius_sq {
                continue;
            }

            let meal = if let Some(powerup) = candidate.as_powerup() {
                Meal::Collect(powerup.kind)
            } else {
                Meal::Grow {
                    radius: candidate.radius,
                    victim: candidate.as_player().map(|p| (p.player_id, candidate.color)),
                }
            };

            match meal {
                Meal::Collect(kind) => {
                    let collected = state
                        .registry
                        .update(eater_id, |e| e.as_player_mut().is_some_and(|p| p.powerups.push(kind)))
                        .unwrap_or(false);
                    if !collected {
                        continue;
                    }
                    pending.insert(candidate_id);
                    tracing::debug!("Player {} collected {:?}", eater_player, kind);
                    events.push(GameEvent::PowerupCollected {
                        player_id: eater_player,
                        kind,
                    });
                }
                Meal::Grow { radius: eaten, victim } => {
                    if state.registry.update(eater_id, |e| e.eat(eaten)) != Some(true) {
                        continue;
                    }
                    pending.insert(candidate_id);
                    if let Some((victim_id, color)) = victim {
                        tracing::info!("Player {} was eaten by player {}", victim_id, eater_player);
                        spawning::schedule_respawn(state, victim_id, color, now);
                        events.push(GameEvent::PlayerEaten {
                            player_id: victim_id,
                            eaten_by: eater_player,
                        });
                    }
                }
            }
        }
    }

    let removed = state.registry.remove_all(&pending);
    if !removed.is_empty() {
        tracing::trace!("Consumed {} entities", removed.len());
    }
    events
}
