//! Property-based tests for scoring and wagers using proptest
//!
//! Random moderator command sequences are applied to a session; commands
//! that are rejected must leave no trace, and scores and wager tokens must
//! obey their invariants after every step.

use party_trivia::game::{
    Combo, Difficulty, GameEvent, PowerCardKind, Question, QuestionType, RoundPhase, Session,
    compute_points, wager_multiplier,
};
use party_trivia::GameSettings;
use proptest::prelude::*;
use std::collections::BTreeSet;
use uuid::Uuid;

const PLAYERS: u32 = 3;

#[derive(Clone, Debug)]
enum Op {
    /// Moves the round one phase forward
    Advance {
        winner: Option<u32>,
        question_type: QuestionType,
        difficulty: Difficulty,
    },
    Bet { player_id: u32, token: u32 },
    Bonus { player_id: u32, points: u32 },
    Acquire { player_id: u32, kind: PowerCardKind },
    PlayFirstCard { player_id: u32 },
    StealFrom { victim: u32 },
    Verdict { completed: bool },
    Cancel,
    Void,
}

fn question_type_strategy() -> impl Strategy<Value = QuestionType> {
    prop::sample::select(vec![
        QuestionType::Song,
        QuestionType::Artist,
        QuestionType::Album,
        QuestionType::Year,
        QuestionType::Lyrics,
    ])
}

fn difficulty_strategy() -> impl Strategy<Value = Difficulty> {
    prop::sample::select(vec![Difficulty::Easy, Difficulty::Medium, Difficulty::Hard])
}

fn player_strategy() -> impl Strategy<Value = u32> {
    1..=PLAYERS
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (
            prop::option::of(player_strategy()),
            question_type_strategy(),
            difficulty_strategy()
        )
            .prop_map(|(winner, question_type, difficulty)| Op::Advance {
                winner,
                question_type,
                difficulty,
            }),
        2 => (player_strategy(), 0u32..=4).prop_map(|(player_id, token)| Op::Bet { player_id, token }),
        1 => (player_strategy(), 0u32..=3).prop_map(|(player_id, points)| Op::Bonus { player_id, points }),
        1 => (player_strategy(), 0..PowerCardKind::ALL.len())
            .prop_map(|(player_id, i)| Op::Acquire { player_id, kind: PowerCardKind::ALL[i] }),
        1 => player_strategy().prop_map(|player_id| Op::PlayFirstCard { player_id }),
        1 => player_strategy().prop_map(|victim| Op::StealFrom { victim }),
        1 => any::<bool>().prop_map(|completed| Op::Verdict { completed }),
        1 => Just(Op::Cancel),
        1 => Just(Op::Void),
    ]
}

fn new_game() -> Session {
    let settings = GameSettings {
        // High enough that the game keeps going for the whole sequence.
        target_score: 10_000,
        ..GameSettings::default()
    };
    let mut session = Session::new(Uuid::new_v4(), "Props", settings, Some(5)).unwrap();
    session.add_player("Ada").unwrap();
    session.add_player("Grace").unwrap();
    session.add_player("Linus").unwrap();
    session.start_game().unwrap();
    session
}

/// Applies one op, ignoring rejections.
fn apply(session: &mut Session, op: &Op, next_question: &mut u32) {
    match op {
        Op::Advance {
            winner,
            question_type,
            difficulty,
        } => match session.phase() {
            RoundPhase::Idle => {
                if session.request_next_round().is_ok() {
                    *next_question += 1;
                    let question = Question {
                        id: format!("q{next_question}"),
                        question_type: *question_type,
                        difficulty: *difficulty,
                        text: "?".to_string(),
                        answers: vec!["!".to_string()],
                    };
                    let generation = session.phase_generation();
                    let _ = session.load_round(generation, question, None);
                }
            }
            RoundPhase::Betting => {
                let _ = session.close_betting();
            }
            RoundPhase::Question => {
                let _ = session.reveal_answer(*winner);
            }
            RoundPhase::Answer => {
                let _ = session.prepare_next_round();
            }
            RoundPhase::Loading | RoundPhase::Audio => {}
        },
        Op::Bet { player_id, token } => {
            let _ = session.place_bet(*player_id, *token);
        }
        Op::Bonus { player_id, points } => {
            let _ = session.award_bonus(*player_id, *points);
        }
        Op::Acquire { player_id, kind } => {
            let _ = session.acquire_card(*player_id, *kind);
        }
        Op::PlayFirstCard { player_id } => {
            let first = session
                .player(*player_id)
                .ok()
                .and_then(|p| p.inventory.iter().next().map(|c| c.id));
            if let Some(card_id) = first {
                let _ = session.use_power_card(*player_id, card_id, Vec::new());
            }
        }
        Op::StealFrom { victim } => {
            if let Some(attacker) = session.targeted_action().map(|a| a.initiator()) {
                let _ = session.select_steal_target(attacker, *victim);
            }
        }
        Op::Verdict { completed } => {
            let _ = session.submit_challenge_verdict(*completed);
        }
        Op::Cancel => {
            if let Some(initiator) = session.targeted_action().map(|a| a.initiator()) {
                let _ = session.cancel_targeted_action(initiator);
            }
        }
        Op::Void => {
            let _ = session.void_round();
        }
    }
}

fn scores(session: &Session) -> Vec<u32> {
    session.roster().iter().map(|p| p.score).collect()
}

fn tokens(session: &Session, player_id: u32) -> BTreeSet<u32> {
    session.player(player_id).unwrap().tokens.iter().collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_scores_never_decrease(ops in prop::collection::vec(op_strategy(), 1..120)) {
        let mut session = new_game();
        let mut next_question = 0;
        let mut previous = scores(&session);
        for op in &ops {
            apply(&mut session, op, &mut next_question);
            let current = scores(&session);
            for (before, after) in previous.iter().zip(&current) {
                prop_assert!(after >= before, "score dropped after {:?}", op);
            }
            previous = current;
        }
    }

    #[test]
    fn test_spent_tokens_only_return_through_rewards(
        ops in prop::collection::vec(op_strategy(), 1..120)
    ) {
        let mut session = new_game();
        let mut next_question = 0;
        session.drain_events();

        for op in &ops {
            let before: Vec<BTreeSet<u32>> =
                (1..=PLAYERS).map(|id| tokens(&session, id)).collect();
            apply(&mut session, op, &mut next_question);
            let events = session.drain_events();

            let voided = events.iter().any(|e| matches!(e, GameEvent::RoundVoided { .. }));
            for player_id in 1..=PLAYERS {
                let rewarded = events.iter().any(|e| matches!(
                    e,
                    GameEvent::ComboTriggered { player_id: p, combo: Combo::HotStreak } if *p == player_id
                ));
                if voided || rewarded {
                    continue;
                }
                let after = tokens(&session, player_id);
                let gained: Vec<_> = after.difference(&before[(player_id - 1) as usize]).collect();
                prop_assert!(gained.is_empty(), "player {} regained {:?} after {:?}", player_id, gained, op);
            }
        }
    }

    #[test]
    fn test_awarded_points_match_displayed_potential(
        base in 1u32..=5,
        boosted in any::<bool>(),
        wager in prop::sample::select(vec![0u32, 1, 2, 3]),
    ) {
        let points = compute_points(base, boosted, wager);
        let doubled = if boosted { base * 2 } else { base };
        prop_assert_eq!(points.total, doubled + wager);
        prop_assert!(points.total >= base);
        prop_assert!(wager_multiplier(wager) >= 1);
    }
}
