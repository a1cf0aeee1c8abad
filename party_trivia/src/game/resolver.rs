//! Resolution and cancellation of targeted actions.

use log::debug;

use super::{
    cards::{PowerCardInstance, PowerCardKind},
    entities::{CardId, PlayerId, Points},
    errors::{NotFound, SessionResult, StateConflict, ValidationError},
    events::{GameEvent, TimerKind},
    session::Session,
    targeted::{
        ChallengeStage, PrecisionResult, StealOutcome, TargetedAction, TargetedKind,
    },
};

impl Session {
    /// Checks that the pending action is of kind `expected` and, if a
    /// player is given, that they started it.
    fn pending(
        &self,
        expected: TargetedKind,
        player_id: Option<PlayerId>,
    ) -> SessionResult<&TargetedAction> {
        let action = self.targeted.as_ref().ok_or(StateConflict::NoTargetedAction)?;
        let actual = action.kind();
        if actual != expected {
            return Err(StateConflict::WrongTargetedAction { expected, actual }.into());
        }
        if let Some(player_id) = player_id
            && action.initiator() != player_id
        {
            return Err(StateConflict::NotInitiator(player_id).into());
        }
        Ok(action)
    }

    /// Ends the pending action and retires its countdowns.
    fn end_targeted(&mut self) -> Option<TargetedAction> {
        self.action_generation += 1;
        self.targeted.take()
    }

    /// Executes a pending steal against `victim`. The steal card is spent
    /// whatever happens. A shield is checked before a counter.
    pub fn select_steal_target(
        &mut self,
        attacker: PlayerId,
        victim: PlayerId,
    ) -> SessionResult<StealOutcome> {
        self.ensure_playing()?;
        let TargetedAction::StealTargeting(steal) =
            self.pending(TargetedKind::StealTargeting, Some(attacker))?
        else {
            return Err(StateConflict::NoTargetedAction.into());
        };
        if !steal.candidates.iter().any(|c| c.player_id == victim) {
            if !self.roster.contains(victim) {
                return Err(NotFound::Target(victim).into());
            }
            return Err(ValidationError::InvalidTarget(victim).into());
        }
        let card_id = steal.card_id;

        self.consume_card(attacker, card_id)?;
        self.end_targeted();

        let flags = self.player(victim)?.flags;
        let outcome = if flags.shielded {
            self.player_mut(victim)?.flags.shielded = false;
            StealOutcome::Blocked { attacker, victim }
        } else if flags.counter_armed {
            self.player_mut(victim)?.flags.counter_armed = false;
            let card = self.transfer_random_card(attacker, victim);
            StealOutcome::Reflected {
                attacker,
                victim,
                card,
            }
        } else {
            match self.transfer_random_card(victim, attacker) {
                Some(card) => StealOutcome::Transferred {
                    attacker,
                    victim,
                    card,
                },
                // The candidate list is taken while the round is frozen, so
                // the victim still has cards. Treat an empty hand as blocked.
                None => StealOutcome::Blocked { attacker, victim },
            }
        };

        self.push_event(GameEvent::StealResolved {
            outcome: outcome.clone(),
        });
        Ok(outcome)
    }

    /// Moves one pseudo-random card between hands. Nothing moves if `from`
    /// is empty or `to` is full.
    fn transfer_random_card(&mut self, from: PlayerId, to: PlayerId) -> Option<PowerCardKind> {
        if self.roster.get(to)?.inventory.is_full() {
            return None;
        }
        let card = self
            .roster
            .get_mut(from)?
            .inventory
            .take_random(&mut self.rng)?;
        let kind = card.kind;
        self.roster.get_mut(to)?.inventory.insert(card).ok()?;
        Some(kind)
    }

    /// Records one precision answer without submitting.
    pub fn answer_precision(
        &mut self,
        player_id: PlayerId,
        index: usize,
        answer: String,
    ) -> SessionResult<()> {
        self.ensure_playing()?;
        self.pending(TargetedKind::PrecisionQuiz, Some(player_id))?;
        let Some(TargetedAction::PrecisionQuiz(quiz)) = self.targeted.as_mut() else {
            return Err(StateConflict::NoTargetedAction.into());
        };
        let slot = quiz
            .answers
            .get_mut(index)
            .ok_or(ValidationError::InvalidQuestionIndex(index))?;
        *slot = Some(answer);
        Ok(())
    }

    /// Submits the quiz. `answers` fill the slots in order and override
    /// anything recorded earlier; missing answers count as wrong.
    pub fn submit_precision_answers(
        &mut self,
        player_id: PlayerId,
        answers: Vec<String>,
    ) -> SessionResult<PrecisionResult> {
        self.ensure_playing()?;
        self.pending(TargetedKind::PrecisionQuiz, Some(player_id))?;
        let Some(TargetedAction::PrecisionQuiz(quiz)) = self.targeted.as_mut() else {
            return Err(StateConflict::NoTargetedAction.into());
        };
        if answers.len() > quiz.questions.len() {
            return Err(ValidationError::TooManyAnswers {
                expected: quiz.questions.len(),
                got: answers.len(),
            }
            .into());
        }
        for (slot, answer) in quiz.answers.iter_mut().zip(answers) {
            *slot = Some(answer);
        }
        self.complete_precision(false)
    }

    pub(crate) fn precision_timer_expired(&mut self, generation: u64) -> bool {
        if generation != self.action_generation
            || !matches!(self.targeted, Some(TargetedAction::PrecisionQuiz(_)))
        {
            return false;
        }
        self.complete_precision(true).is_ok()
    }

    fn complete_precision(&mut self, timed_out: bool) -> SessionResult<PrecisionResult> {
        let Some(TargetedAction::PrecisionQuiz(quiz)) = self.end_targeted() else {
            return Err(StateConflict::NoTargetedAction.into());
        };
        let mut result = quiz.grade();
        result.timed_out = timed_out;

        self.consume_card(quiz.player_id, quiz.card_id)?;
        self.player_mut(quiz.player_id)?.add_points(result.points);
        debug!(
            "{}: precision quiz scored {}/{}",
            self.name, result.correct, result.total
        );
        self.push_event(GameEvent::PrecisionScored {
            result: result.clone(),
        });
        self.check_target_score();
        Ok(result)
    }

    /// Advances a challenge from preparation to performance, and from
    /// performance to waiting on the moderator.
    pub(crate) fn challenge_timer_elapsed(&mut self, generation: u64) -> bool {
        if generation != self.action_generation {
            return false;
        }
        let perform_secs = self.settings.challenge_perform_secs;
        let Some(TargetedAction::ChallengePerformance(challenge)) = self.targeted.as_mut() else {
            return false;
        };
        let player_id = challenge.player_id;
        let stage = match challenge.stage {
            ChallengeStage::Preparing => ChallengeStage::Performing,
            ChallengeStage::Performing => ChallengeStage::AwaitingVerdict,
            ChallengeStage::AwaitingVerdict => return false,
        };
        challenge.stage = stage;

        self.action_generation += 1;
        if stage == ChallengeStage::Performing {
            self.start_action_timer(TimerKind::Challenge, perform_secs);
        }
        self.push_event(GameEvent::ChallengeStageChanged { player_id, stage });
        true
    }

    /// The moderator's verdict. Accepted at any stage; a completed
    /// challenge earns the bonus, a failed one costs nothing.
    pub fn submit_challenge_verdict(&mut self, completed: bool) -> SessionResult<Points> {
        self.ensure_playing()?;
        self.pending(TargetedKind::ChallengePerformance, None)?;
        let Some(TargetedAction::ChallengePerformance(challenge)) = self.end_targeted() else {
            return Err(StateConflict::NoTargetedAction.into());
        };

        let points = if completed {
            self.settings.challenge_bonus
        } else {
            0
        };
        self.consume_card(challenge.player_id, challenge.card_id)?;
        self.player_mut(challenge.player_id)?.add_points(points);
        self.push_event(GameEvent::ChallengeJudged {
            player_id: challenge.player_id,
            completed,
            points,
        });
        self.check_target_score();
        Ok(points)
    }

    /// Brings back a fresh copy of a used card. The resurrect card is spent
    /// in the same step, so its slot counts as free.
    pub fn select_resurrect_card(
        &mut self,
        player_id: PlayerId,
        used_card_id: CardId,
    ) -> SessionResult<PowerCardKind> {
        self.ensure_playing()?;
        let TargetedAction::ResurrectSelection(selection) =
            self.pending(TargetedKind::ResurrectSelection, Some(player_id))?
        else {
            return Err(StateConflict::NoTargetedAction.into());
        };
        let kind = selection
            .candidates
            .iter()
            .find(|c| c.card_id == used_card_id)
            .map(|c| c.kind)
            .ok_or(NotFound::Card(used_card_id))?;
        let resurrect_card = selection.card_id;

        let inventory = &self.player(player_id)?.inventory;
        let kept = inventory.len() - usize::from(inventory.contains(resurrect_card));
        if kept >= inventory.cap() {
            return Err(ValidationError::InventoryFull {
                cap: inventory.cap(),
            }
            .into());
        }

        self.end_targeted();
        self.consume_card(player_id, resurrect_card)?;
        let fresh = PowerCardInstance::new(self.next_card_id(), kind);
        let player = self.player_mut(player_id)?;
        player.used_cards.retain(|c| c.id != used_card_id);
        player.inventory.insert(fresh)?;

        self.push_event(GameEvent::CardResurrected { player_id, kind });
        Ok(kind)
    }

    /// Abandons the pending action. The card that started it stays in the
    /// initiator's hand unused.
    pub fn cancel_targeted_action(&mut self, player_id: PlayerId) -> SessionResult<TargetedKind> {
        self.ensure_playing()?;
        let action = self.targeted.as_ref().ok_or(StateConflict::NoTargetedAction)?;
        if action.initiator() != player_id {
            return Err(StateConflict::NotInitiator(player_id).into());
        }
        let (kind, card_id) = (action.kind(), action.card_id());
        self.end_targeted();
        debug!("{}: card {card_id} back in play for player {player_id}", self.name);
        self.push_event(GameEvent::TargetedActionCancelled {
            player_id,
            action: kind,
        });
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        cards::CardOutcome, entities::SessionStatus, settings::GameSettings,
        targeted::PrecisionQuestion,
    };
    use uuid::Uuid;

    fn session() -> Session {
        let mut session =
            Session::new(Uuid::new_v4(), "test", GameSettings::default(), Some(11)).unwrap();
        session.add_player("Ada").unwrap();
        session.add_player("Bob").unwrap();
        session.start_game().unwrap();
        session
    }

    fn precision_questions() -> Vec<PrecisionQuestion> {
        ["1969", "Queen", "Thriller"]
            .iter()
            .map(|a| PrecisionQuestion {
                prompt: format!("answer is {a}"),
                answers: vec![a.to_string()],
            })
            .collect()
    }

    #[test]
    fn test_steal_transfers_one_card() {
        let mut session = session();
        let steal = session.acquire_card(1, PowerCardKind::Steal).unwrap();
        session.acquire_card(2, PowerCardKind::Boost).unwrap();
        session.acquire_card(2, PowerCardKind::Shield).unwrap();

        let outcome = session.use_power_card(1, steal, Vec::new()).unwrap();
        assert_eq!(
            outcome,
            CardOutcome::AwaitingInput {
                action: TargetedKind::StealTargeting
            }
        );
        let outcome = session.select_steal_target(1, 2).unwrap();
        assert!(matches!(outcome, StealOutcome::Transferred { .. }));
        assert_eq!(session.player(1).unwrap().inventory.len(), 1);
        assert_eq!(session.player(2).unwrap().inventory.len(), 1);
        assert!(session.targeted_action().is_none());
    }

    #[test]
    fn test_steal_reflected_by_counter() {
        let mut session = session();
        let steal = session.acquire_card(1, PowerCardKind::Steal).unwrap();
        session.acquire_card(1, PowerCardKind::Boost).unwrap();
        let counter = session.acquire_card(2, PowerCardKind::Counter).unwrap();
        session.acquire_card(2, PowerCardKind::Shield).unwrap();
        session.use_power_card(2, counter, Vec::new()).unwrap();

        session.use_power_card(1, steal, Vec::new()).unwrap();
        let outcome = session.select_steal_target(1, 2).unwrap();
        assert_eq!(
            outcome,
            StealOutcome::Reflected {
                attacker: 1,
                victim: 2,
                card: Some(PowerCardKind::Boost)
            }
        );
        assert!(session.player(1).unwrap().inventory.is_empty());
        assert_eq!(session.player(2).unwrap().inventory.len(), 2);
        assert!(!session.player(2).unwrap().flags.counter_armed);
    }

    #[test]
    fn test_steal_rejects_invalid_targets() {
        let mut session = session();
        session.add_player("Cy").unwrap();
        let steal = session.acquire_card(1, PowerCardKind::Steal).unwrap();
        session.acquire_card(2, PowerCardKind::Boost).unwrap();
        session.use_power_card(1, steal, Vec::new()).unwrap();

        assert_eq!(
            session.select_steal_target(1, 3).unwrap_err(),
            ValidationError::InvalidTarget(3).into()
        );
        assert_eq!(
            session.select_steal_target(1, 9).unwrap_err(),
            NotFound::Target(9).into()
        );
        assert_eq!(
            session.select_steal_target(2, 1).unwrap_err(),
            StateConflict::NotInitiator(2).into()
        );
        assert!(session.targeted_action().is_some());
    }

    #[test]
    fn test_steal_without_targets() {
        let mut session = session();
        let steal = session.acquire_card(1, PowerCardKind::Steal).unwrap();
        assert_eq!(
            session.use_power_card(1, steal, Vec::new()).unwrap_err(),
            ValidationError::NoValidTargets.into()
        );
        assert!(session.player(1).unwrap().inventory.contains(steal));
    }

    #[test]
    fn test_cancel_releases_card() {
        let mut session = session();
        let steal = session.acquire_card(1, PowerCardKind::Steal).unwrap();
        session.acquire_card(2, PowerCardKind::Boost).unwrap();
        session.use_power_card(1, steal, Vec::new()).unwrap();

        assert_eq!(
            session.cancel_targeted_action(2).unwrap_err(),
            StateConflict::NotInitiator(2).into()
        );
        assert_eq!(
            session.cancel_targeted_action(1).unwrap(),
            TargetedKind::StealTargeting
        );
        let player = session.player(1).unwrap();
        assert!(player.inventory.contains(steal));
        assert!(!player.inventory.get(steal).unwrap().is_used);
        assert!(player.used_cards.is_empty());
    }

    #[test]
    fn test_second_targeted_action_rejected() {
        let mut session = session();
        let steal = session.acquire_card(1, PowerCardKind::Steal).unwrap();
        let challenge = session.acquire_card(2, PowerCardKind::Challenge).unwrap();
        session.use_power_card(1, steal, Vec::new()).unwrap();
        assert_eq!(
            session.use_power_card(2, challenge, Vec::new()).unwrap_err(),
            StateConflict::TargetedActionPending(TargetedKind::StealTargeting).into()
        );
    }

    #[test]
    fn test_precision_full_marks() {
        let mut session = session();
        let card = session.acquire_card(1, PowerCardKind::Precision).unwrap();
        session
            .use_power_card(1, card, precision_questions())
            .unwrap();
        session
            .answer_precision(1, 0, "1969".to_string())
            .unwrap();
        assert_eq!(
            session
                .answer_precision(1, 5, "x".to_string())
                .unwrap_err(),
            ValidationError::InvalidQuestionIndex(5).into()
        );
        let result = session
            .submit_precision_answers(
                1,
                vec!["1969".into(), "queen".into(), "Thriller".into()],
            )
            .unwrap();
        assert_eq!(result.points, 3);
        assert_eq!(session.player(1).unwrap().score, 3);
        assert!(session.targeted_action().is_none());
        assert_eq!(session.player(1).unwrap().used_cards.len(), 1);
    }

    #[test]
    fn test_precision_timeout_grades_recorded_answers() {
        let mut session = session();
        let card = session.acquire_card(1, PowerCardKind::Precision).unwrap();
        session
            .use_power_card(1, card, precision_questions())
            .unwrap();
        session
            .answer_precision(1, 1, "Queen".to_string())
            .unwrap();
        let generation = session.action_generation();
        assert!(session.timer_fired(TimerKind::Precision, generation));
        assert_eq!(session.player(1).unwrap().score, 1);
        assert!(session.targeted_action().is_none());
        assert!(!session.timer_fired(TimerKind::Precision, generation));
    }

    #[test]
    fn test_precision_needs_questions() {
        let mut session = session();
        let card = session.acquire_card(1, PowerCardKind::Precision).unwrap();
        assert_eq!(
            session.use_power_card(1, card, Vec::new()).unwrap_err(),
            ValidationError::PrecisionQuestionsUnavailable {
                expected: 3,
                got: 0
            }
            .into()
        );
    }

    #[test]
    fn test_challenge_stages_and_verdict() {
        let mut session = session();
        let card = session.acquire_card(2, PowerCardKind::Challenge).unwrap();
        session.use_power_card(2, card, Vec::new()).unwrap();

        let generation = session.action_generation();
        assert!(session.timer_fired(TimerKind::Challenge, generation));
        assert!(!session.timer_fired(TimerKind::Challenge, generation));
        let Some(TargetedAction::ChallengePerformance(challenge)) = session.targeted_action()
        else {
            panic!("challenge should be pending");
        };
        assert_eq!(challenge.stage, ChallengeStage::Performing);

        assert!(session.timer_fired(TimerKind::Challenge, session.action_generation()));
        assert_eq!(session.submit_challenge_verdict(true).unwrap(), 3);
        assert_eq!(session.player(2).unwrap().score, 3);
        assert!(session.targeted_action().is_none());
    }

    #[test]
    fn test_failed_challenge_awards_nothing() {
        let mut session = session();
        let card = session.acquire_card(1, PowerCardKind::Challenge).unwrap();
        session.use_power_card(1, card, Vec::new()).unwrap();
        assert_eq!(session.submit_challenge_verdict(false).unwrap(), 0);
        assert_eq!(session.player(1).unwrap().score, 0);
    }

    #[test]
    fn test_resurrect_returns_fresh_card() {
        let mut session = session();
        let boost = session.acquire_card(1, PowerCardKind::Boost).unwrap();
        session.use_power_card(1, boost, Vec::new()).unwrap();
        let resurrect = session.acquire_card(1, PowerCardKind::Resurrect).unwrap();
        session.use_power_card(1, resurrect, Vec::new()).unwrap();

        assert_eq!(
            session.select_resurrect_card(1, 777).unwrap_err(),
            NotFound::Card(777).into()
        );
        let kind = session.select_resurrect_card(1, boost).unwrap();
        assert_eq!(kind, PowerCardKind::Boost);

        let player = session.player(1).unwrap();
        assert_eq!(player.inventory.len(), 1);
        let card = player.inventory.iter().next().unwrap();
        assert_eq!(card.kind, PowerCardKind::Boost);
        assert_ne!(card.id, boost);
        assert!(!card.is_used);
        assert_eq!(player.used_cards.len(), 1);
        assert_eq!(player.used_cards[0].kind, PowerCardKind::Resurrect);
    }

    #[test]
    fn test_resurrect_reuses_its_own_slot() {
        let mut session = session();
        let boost = session.acquire_card(1, PowerCardKind::Boost).unwrap();
        session.use_power_card(1, boost, Vec::new()).unwrap();
        let resurrect = session.acquire_card(1, PowerCardKind::Resurrect).unwrap();
        for _ in 0..4 {
            session.acquire_card(1, PowerCardKind::Shield).unwrap();
        }
        assert!(session.player(1).unwrap().inventory.is_full());
        session.use_power_card(1, resurrect, Vec::new()).unwrap();

        assert_eq!(
            session.select_resurrect_card(1, boost).unwrap(),
            PowerCardKind::Boost
        );
        let player = session.player(1).unwrap();
        assert_eq!(player.inventory.len(), 5);
        assert!(!player.inventory.contains(resurrect));
        assert!(player.used_cards.iter().any(|c| c.id == resurrect));
        assert!(session.targeted_action().is_none());
    }

    #[test]
    fn test_resurrect_rejected_without_a_free_slot() {
        let mut session = session();
        let boost = session.acquire_card(1, PowerCardKind::Boost).unwrap();
        session.use_power_card(1, boost, Vec::new()).unwrap();
        let resurrect = session.acquire_card(1, PowerCardKind::Resurrect).unwrap();
        session.use_power_card(1, resurrect, Vec::new()).unwrap();

        // A hand filled by other cards alone leaves nothing to free.
        let player = session.player_mut(1).unwrap();
        player.inventory.take(resurrect).unwrap();
        for id in 100..105 {
            player
                .inventory
                .insert(PowerCardInstance::new(id, PowerCardKind::Shield))
                .unwrap();
        }

        assert_eq!(
            session.select_resurrect_card(1, boost).unwrap_err(),
            ValidationError::InventoryFull { cap: 5 }.into()
        );
        assert!(session.targeted_action().is_some());
        assert_eq!(session.player(1).unwrap().used_cards.len(), 1);
    }

    #[test]
    fn test_nothing_to_resurrect() {
        let mut session = session();
        let resurrect = session.acquire_card(1, PowerCardKind::Resurrect).unwrap();
        assert_eq!(
            session.use_power_card(1, resurrect, Vec::new()).unwrap_err(),
            ValidationError::NothingToResurrect.into()
        );
    }

    #[test]
    fn test_finish_discards_pending_action() {
        let mut session = session();
        let card = session.acquire_card(1, PowerCardKind::Precision).unwrap();
        session
            .use_power_card(1, card, precision_questions())
            .unwrap();
        session.award_bonus(2, 30).unwrap();
        assert_eq!(session.status(), SessionStatus::Finished);
        assert!(session.targeted_action().is_none());
        assert!(!session.timer_fired(TimerKind::Precision, session.action_generation()));
    }
}
