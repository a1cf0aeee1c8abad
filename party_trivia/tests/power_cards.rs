//! Property-based tests for power-card resolution using proptest
//!
//! Steal resolution must pick exactly one of block, reflect and transfer,
//! and move cards accordingly. Cancelling must always release the card.

use party_trivia::GameSettings;
use party_trivia::game::{PowerCardKind, Session, StealOutcome, TargetedKind};
use proptest::prelude::*;
use uuid::Uuid;

const ATTACKER: u32 = 1;
const VICTIM: u32 = 2;

// Strategy for any card kind
fn card_kind_strategy() -> impl Strategy<Value = PowerCardKind> {
    (0..PowerCardKind::ALL.len()).prop_map(|i| PowerCardKind::ALL[i])
}

#[derive(Debug)]
struct StealSetup {
    seed: u64,
    attacker_cards: Vec<PowerCardKind>,
    victim_cards: Vec<PowerCardKind>,
    shielded: bool,
    counter_armed: bool,
}

fn steal_setup_strategy() -> impl Strategy<Value = StealSetup> {
    (
        any::<u64>(),
        prop::collection::vec(card_kind_strategy(), 0..=4),
        prop::collection::vec(card_kind_strategy(), 1..=5),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(seed, attacker_cards, victim_cards, shielded, counter_armed)| StealSetup {
                seed,
                attacker_cards,
                victim_cards,
                shielded,
                counter_armed,
            },
        )
}

// Helper to build a started two-player game
fn game(seed: u64) -> Session {
    let mut session =
        Session::new(Uuid::new_v4(), "Cards", GameSettings::default(), Some(seed)).unwrap();
    session.add_player("Attacker").unwrap();
    session.add_player("Victim").unwrap();
    session.start_game().unwrap();
    session
}

fn hand_size(session: &Session, player_id: u32) -> usize {
    session.player(player_id).unwrap().inventory.len()
}

proptest! {
    #[test]
    fn test_steal_resolution_is_exclusive(setup in steal_setup_strategy()) {
        let mut session = game(setup.seed);
        let steal = session.acquire_card(ATTACKER, PowerCardKind::Steal).unwrap();
        for kind in &setup.attacker_cards {
            session.acquire_card(ATTACKER, *kind).unwrap();
        }
        for kind in &setup.victim_cards {
            session.acquire_card(VICTIM, *kind).unwrap();
        }
        {
            let flags = &mut session.player_mut(VICTIM).unwrap().flags;
            flags.shielded = setup.shielded;
            flags.counter_armed = setup.counter_armed;
        }

        session.use_power_card(ATTACKER, steal, Vec::new()).unwrap();
        // The steal card itself is spent whatever happens.
        let attacker_before = hand_size(&session, ATTACKER) - 1;
        let victim_before = hand_size(&session, VICTIM);

        let outcome = session.select_steal_target(ATTACKER, VICTIM).unwrap();
        let attacker_after = hand_size(&session, ATTACKER);
        let victim_after = hand_size(&session, VICTIM);
        let victim = session.player(VICTIM).unwrap();

        match outcome {
            StealOutcome::Blocked { .. } => {
                prop_assert!(setup.shielded);
                prop_assert!(!victim.flags.shielded);
                prop_assert_eq!(victim.flags.counter_armed, setup.counter_armed);
                prop_assert_eq!(attacker_after, attacker_before);
                prop_assert_eq!(victim_after, victim_before);
            }
            StealOutcome::Reflected { card, .. } => {
                prop_assert!(!setup.shielded && setup.counter_armed);
                prop_assert!(!victim.flags.counter_armed);
                match card {
                    Some(_) => {
                        prop_assert_eq!(attacker_after + 1, attacker_before);
                        prop_assert_eq!(victim_after, victim_before + 1);
                    }
                    None => {
                        prop_assert_eq!(attacker_after, attacker_before);
                        prop_assert_eq!(victim_after, victim_before);
                    }
                }
            }
            StealOutcome::Transferred { card, .. } => {
                prop_assert!(!setup.shielded && !setup.counter_armed);
                prop_assert!(setup.victim_cards.contains(&card));
                prop_assert_eq!(attacker_after, attacker_before + 1);
                prop_assert_eq!(victim_after + 1, victim_before);
            }
        }

        let attacker = session.player(ATTACKER).unwrap();
        prop_assert!(attacker.used_cards.iter().any(|c| c.id == steal));
        prop_assert!(session.targeted_action().is_none());
    }

    #[test]
    fn test_cancel_always_releases_card(
        seed in any::<u64>(),
        kind in prop::sample::select(vec![
            PowerCardKind::Steal,
            PowerCardKind::Challenge,
        ]),
    ) {
        let mut session = game(seed);
        let card = session.acquire_card(ATTACKER, kind).unwrap();
        session.acquire_card(VICTIM, PowerCardKind::Boost).unwrap();

        session.use_power_card(ATTACKER, card, Vec::new()).unwrap();
        prop_assert!(session.targeted_action().is_some());

        let cancelled = session.cancel_targeted_action(ATTACKER).unwrap();
        let expected = match kind {
            PowerCardKind::Steal => TargetedKind::StealTargeting,
            _ => TargetedKind::ChallengePerformance,
        };
        prop_assert_eq!(cancelled, expected);
        prop_assert!(session.targeted_action().is_none());

        let attacker = session.player(ATTACKER).unwrap();
        prop_assert!(attacker.inventory.contains(card));
        prop_assert!(attacker.used_cards.is_empty());

        // The released card can be played again.
        prop_assert!(session.use_power_card(ATTACKER, card, Vec::new()).is_ok());
    }

    #[test]
    fn test_inventory_never_exceeds_cap(kinds in prop::collection::vec(card_kind_strategy(), 0..12)) {
        let mut session = game(0);
        let cap = session.settings().inventory_cap;
        for kind in kinds {
            let before = hand_size(&session, ATTACKER);
            let result = session.acquire_card(ATTACKER, kind);
            prop_assert_eq!(result.is_ok(), before < cap);
            prop_assert!(hand_size(&session, ATTACKER) <= cap);
        }
    }
}
