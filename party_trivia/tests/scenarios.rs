//! End-to-end game scenarios against the synchronous session
//!
//! These tests drive a `Session` the way a moderator device would and
//! check scores, turn order, wagers and power-card effects afterwards.

use party_trivia::game::{
    CardOutcome, Difficulty, Directive, ErrorKind, PowerCardKind, PrecisionQuestion, Question,
    QuestionType, RoundPhase, Session, SessionError, SessionStatus, StateConflict, StealOutcome,
    TargetedKind, TimerKind,
};
use party_trivia::GameSettings;
use uuid::Uuid;

fn question(id: &str, question_type: QuestionType, difficulty: Difficulty) -> Question {
    Question {
        id: id.to_string(),
        question_type,
        difficulty,
        text: "Name this track".to_string(),
        answers: vec!["Answer".to_string()],
    }
}

fn two_player_game() -> Session {
    let mut session =
        Session::new(Uuid::new_v4(), "Scenarios", GameSettings::default(), Some(42)).unwrap();
    assert_eq!(session.add_player("Ada").unwrap(), 1);
    assert_eq!(session.add_player("Grace").unwrap(), 2);
    session.start_game().unwrap();
    session
}

/// Requests a round and delivers `question` without media.
fn load(session: &mut Session, question: Question) {
    session.request_next_round().unwrap();
    let generation = session.phase_generation();
    assert!(session.load_round(generation, question, None).unwrap());
}

/// Plays a round nobody wins and returns to idle.
fn skip_round(session: &mut Session, id: &str) {
    load(session, question(id, QuestionType::Song, Difficulty::Easy));
    if session.phase() == RoundPhase::Betting {
        session.close_betting().unwrap();
    }
    session.reveal_answer(None).unwrap();
    session.prepare_next_round().unwrap();
}

fn precision_questions(count: usize) -> Vec<PrecisionQuestion> {
    (0..count)
        .map(|i| PrecisionQuestion {
            prompt: format!("Question {i}"),
            answers: vec![format!("answer {i}")],
        })
        .collect()
}

#[test]
fn test_first_round_has_no_betting_and_turn_passes() {
    let mut session = two_player_game();
    assert_eq!(session.current_turn(), Some(1));

    load(
        &mut session,
        question("song-1", QuestionType::Song, Difficulty::Easy),
    );
    assert_eq!(session.phase(), RoundPhase::Question);

    for player_id in [1, 2] {
        let err = session.place_bet(player_id, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
    }

    let result = session.reveal_answer(Some(1)).unwrap();
    assert_eq!(result.winner, Some(1));
    assert_eq!(result.points.map(|p| p.total), Some(1));
    assert_eq!(session.player(1).unwrap().score, 1);
    assert_eq!(session.player(2).unwrap().score, 0);
    assert_eq!(session.current_turn(), Some(2));
}

#[test]
fn test_boosted_wager_on_third_round() {
    let mut session = two_player_game();
    skip_round(&mut session, "r1");
    skip_round(&mut session, "r2");

    let boost = session.acquire_card(1, PowerCardKind::Boost).unwrap();
    assert_eq!(
        session.use_power_card(1, boost, Vec::new()).unwrap(),
        CardOutcome::Boosted {
            already_boosted: false
        }
    );

    load(
        &mut session,
        question("album-1", QuestionType::Album, Difficulty::Easy),
    );
    assert_eq!(session.round_counter(), 3);
    assert_eq!(session.phase(), RoundPhase::Betting);

    let bet = session.place_bet(1, 2).unwrap();
    assert_eq!(bet.multiplier, 3);
    session.close_betting().unwrap();

    let result = session.reveal_answer(Some(1)).unwrap();
    let points = result.points.unwrap();
    assert_eq!(points.base, 4);
    assert_eq!(points.wager_bonus, 2);
    assert_eq!(points.total, 6);

    let player = session.player(1).unwrap();
    assert_eq!(player.score, 6);
    assert!(!player.flags.boosted);
    assert!(!player.tokens.contains(2));
    assert!(player.tokens.contains(1) && player.tokens.contains(3));
}

#[test]
fn test_spent_token_cannot_be_reused() {
    let mut session = two_player_game();
    skip_round(&mut session, "r1");

    load(
        &mut session,
        question("r2", QuestionType::Song, Difficulty::Easy),
    );
    session.place_bet(1, 3).unwrap();
    session.close_betting().unwrap();
    session.reveal_answer(None).unwrap();
    session.prepare_next_round().unwrap();

    load(
        &mut session,
        question("r3", QuestionType::Song, Difficulty::Easy),
    );
    let err = session.place_bet(1, 3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(session.place_bet(1, 1).is_ok());
}

#[test]
fn test_steal_against_shielded_victim() {
    let mut session = two_player_game();
    let steal = session.acquire_card(1, PowerCardKind::Steal).unwrap();
    let shield = session.acquire_card(2, PowerCardKind::Shield).unwrap();
    session.acquire_card(2, PowerCardKind::Boost).unwrap();
    session.use_power_card(2, shield, Vec::new()).unwrap();
    assert!(session.player(2).unwrap().flags.shielded);

    assert_eq!(
        session.use_power_card(1, steal, Vec::new()).unwrap(),
        CardOutcome::AwaitingInput {
            action: TargetedKind::StealTargeting
        }
    );
    let outcome = session.select_steal_target(1, 2).unwrap();
    assert_eq!(
        outcome,
        StealOutcome::Blocked {
            attacker: 1,
            victim: 2
        }
    );

    let attacker = session.player(1).unwrap();
    assert!(attacker.inventory.is_empty());
    assert!(attacker.used_cards.iter().any(|c| c.id == steal));
    let victim = session.player(2).unwrap();
    assert!(!victim.flags.shielded);
    assert_eq!(victim.inventory.len(), 1);
    assert!(session.targeted_action().is_none());
}

#[test]
fn test_target_score_finishes_over_pending_precision() {
    let mut session = two_player_game();
    let precision = session.acquire_card(1, PowerCardKind::Precision).unwrap();
    let count = session.settings().precision_questions;
    session
        .use_power_card(1, precision, precision_questions(count))
        .unwrap();
    assert_eq!(
        session.targeted_action().map(|a| a.kind()),
        Some(TargetedKind::PrecisionQuiz)
    );
    let stale_generation = session.action_generation();

    let target = session.settings().target_score;
    session.award_bonus(2, target).unwrap();

    assert_eq!(session.status(), SessionStatus::Finished);
    assert!(session.targeted_action().is_none());
    assert_eq!(session.winner(), Some(2));
    assert!(!session.timer_fired(TimerKind::Precision, stale_generation));

    let directives = session.drain_directives();
    assert!(
        directives
            .iter()
            .any(|d| matches!(d, Directive::RecordStandings(s) if s.winner == Some(2)))
    );
}

#[test]
fn test_targeted_action_freezes_round_flow() {
    let mut session = two_player_game();
    let challenge = session.acquire_card(1, PowerCardKind::Challenge).unwrap();
    load(
        &mut session,
        question("q1", QuestionType::Year, Difficulty::Medium),
    );
    session.use_power_card(1, challenge, Vec::new()).unwrap();

    let err = session.reveal_answer(Some(2)).unwrap_err();
    assert_eq!(
        err,
        SessionError::StateConflict(StateConflict::TargetedActionPending(
            TargetedKind::ChallengePerformance
        ))
    );

    let bonus = session.submit_challenge_verdict(true).unwrap();
    assert_eq!(session.player(1).unwrap().score, bonus);
    let result = session.reveal_answer(Some(2)).unwrap();
    assert_eq!(result.points.map(|p| p.total), Some(3));
}

#[test]
fn test_game_clock_ends_game_mid_round() {
    let settings = GameSettings {
        game_clock_secs: 3,
        ..GameSettings::default()
    };
    let mut session = Session::new(Uuid::new_v4(), "Short", settings, Some(1)).unwrap();
    session.add_player("Ada").unwrap();
    session.add_player("Grace").unwrap();
    session.start_game().unwrap();
    load(
        &mut session,
        question("q1", QuestionType::Song, Difficulty::Easy),
    );
    session.reveal_answer(Some(2)).unwrap();

    assert!(!session.tick_clock());
    assert!(!session.tick_clock());
    assert!(session.tick_clock());
    assert_eq!(session.status(), SessionStatus::Finished);
    assert_eq!(session.winner(), Some(2));

    let standings = session.final_standings();
    assert_eq!(standings.entries[0].player_id, 2);
    assert_eq!(standings.entries[0].rank, 1);
    assert_eq!(standings.entries[1].rank, 2);

    let err = session.request_next_round().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);
}

#[test]
fn test_voided_round_refunds_and_awards_nothing() {
    let mut session = two_player_game();
    skip_round(&mut session, "r1");
    load(
        &mut session,
        question("r2", QuestionType::Lyrics, Difficulty::Hard),
    );
    session.place_bet(1, 3).unwrap();
    session.place_bet(2, 1).unwrap();
    assert_eq!(session.phase(), RoundPhase::Question);

    session.void_round().unwrap();
    assert_eq!(session.phase(), RoundPhase::Answer);
    assert!(session.player(1).unwrap().tokens.contains(3));
    assert!(session.player(2).unwrap().tokens.contains(1));
    assert_eq!(session.player(1).unwrap().score, 0);
    assert!(session.round().is_some_and(|r| r.voided));
}
