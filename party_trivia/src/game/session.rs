//! The per-game state machine.
//!
//! `Session` is synchronous and owns every piece of game state. Phase
//! sequencing lives here; scoring, roster, card and targeted-action logic
//! live in sibling modules as further `impl Session` blocks. Work for the
//! outside world (fetching a question, playing media, starting a
//! countdown, recording standings) is queued as [`Directive`]s.
//!
//! Two generation counters make stale callbacks inert. `phase_generation`
//! moves on every round phase change and guards the catalog fetch, media
//! playback and the betting countdown. `action_generation` moves whenever
//! a targeted action starts, advances or ends and guards the precision and
//! challenge countdowns. Pausing bumps both.

use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng};
use std::{collections::HashSet, mem, time::Duration};

use super::{
    cards::{CardOutcome, CardPlay, PowerCardInstance, PowerCardKind},
    entities::{
        Bet, CardId, MediaRef, Player, PlayerId, Points, Question, QuestionId, Round, RoundPhase,
        SessionId, SessionStatus,
    },
    errors::{NotFound, SessionResult, StateConflict, ValidationError, WagerRejection},
    events::{Directive, GameEvent, TimerKind},
    roster::Roster,
    scoring::RoundResult,
    settings::GameSettings,
    snapshot::{FinalStandings, StandingEntry},
    targeted::{ChallengeStage, PrecisionQuestion, StealCandidate, TargetedAction},
};

#[derive(Debug)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) name: String,
    pub(crate) settings: GameSettings,
    pub(crate) status: SessionStatus,
    pub(crate) round_counter: u32,
    pub(crate) clock_remaining_secs: u64,
    pub(crate) roster: Roster,
    pub(crate) round: Option<Round>,
    pub(crate) used_questions: HashSet<QuestionId>,
    pub(crate) targeted: Option<TargetedAction>,
    pub(crate) winner: Option<PlayerId>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) rng: StdRng,
    pub(crate) phase_generation: u64,
    pub(crate) action_generation: u64,
    next_card_id: CardId,
    events: Vec<GameEvent>,
    directives: Vec<Directive>,
}

impl Session {
    /// Creates a session in the `created` state. A seed makes every
    /// pseudo-random choice reproducible.
    pub fn new(
        id: SessionId,
        name: impl Into<String>,
        settings: GameSettings,
        seed: Option<u64>,
    ) -> SessionResult<Self> {
        settings.validate()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            id,
            name: name.into(),
            clock_remaining_secs: settings.game_clock_secs,
            settings,
            status: SessionStatus::Created,
            round_counter: 0,
            roster: Roster::new(),
            round: None,
            used_questions: HashSet::new(),
            targeted: None,
            winner: None,
            created_at: Utc::now(),
            rng,
            phase_generation: 0,
            action_generation: 0,
            next_card_id: 1,
            events: Vec::new(),
            directives: Vec::new(),
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn round_counter(&self) -> u32 {
        self.round_counter
    }

    #[must_use]
    pub fn clock_remaining(&self) -> Duration {
        Duration::from_secs(self.clock_remaining_secs)
    }

    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    #[must_use]
    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    #[must_use]
    pub fn targeted_action(&self) -> Option<&TargetedAction> {
        self.targeted.as_ref()
    }

    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current round phase. No round means idle.
    #[must_use]
    pub fn phase(&self) -> RoundPhase {
        self.round.as_ref().map_or(RoundPhase::Idle, |r| r.phase)
    }

    #[must_use]
    pub fn phase_generation(&self) -> u64 {
        self.phase_generation
    }

    #[must_use]
    pub fn action_generation(&self) -> u64 {
        self.action_generation
    }

    #[must_use]
    pub fn current_turn(&self) -> Option<PlayerId> {
        self.roster.current().map(|p| p.id)
    }

    #[must_use]
    pub fn has_used_question(&self, id: &str) -> bool {
        self.used_questions.contains(id)
    }

    pub fn used_question_ids(&self) -> impl Iterator<Item = &QuestionId> {
        self.used_questions.iter()
    }

    pub fn player(&self, id: PlayerId) -> SessionResult<&Player> {
        Ok(self.roster.get(id).ok_or(NotFound::Player(id))?)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> SessionResult<&mut Player> {
        Ok(self.roster.get_mut(id).ok_or(NotFound::Player(id))?)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        mem::take(&mut self.events)
    }

    pub fn drain_directives(&mut self) -> Vec<Directive> {
        mem::take(&mut self.directives)
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub(crate) fn push_directive(&mut self, directive: Directive) {
        self.directives.push(directive);
    }

    pub(crate) fn next_card_id(&mut self) -> CardId {
        let id = self.next_card_id;
        self.next_card_id += 1;
        id
    }

    // Guards.

    pub(crate) fn ensure_not_finished(&self) -> SessionResult<()> {
        if self.status == SessionStatus::Finished {
            return Err(StateConflict::SessionFinished.into());
        }
        Ok(())
    }

    pub(crate) fn ensure_playing(&self) -> SessionResult<()> {
        self.ensure_not_finished()?;
        if self.status != SessionStatus::Playing {
            return Err(StateConflict::WrongStatus {
                expected: SessionStatus::Playing,
                actual: self.status,
            }
            .into());
        }
        Ok(())
    }

    pub(crate) fn ensure_no_targeted(&self) -> SessionResult<()> {
        match &self.targeted {
            Some(action) => Err(StateConflict::TargetedActionPending(action.kind()).into()),
            None => Ok(()),
        }
    }

    pub(crate) fn ensure_phase(&self, expected: RoundPhase) -> SessionResult<()> {
        let actual = self.phase();
        if actual != expected {
            return Err(StateConflict::WrongPhase { expected, actual }.into());
        }
        Ok(())
    }

    /// Players can join or leave before the game and between commands
    /// while playing, never while paused or during a targeted action.
    pub(crate) fn ensure_roster_editable(&self) -> SessionResult<()> {
        self.ensure_not_finished()?;
        if self.status == SessionStatus::Paused {
            return Err(StateConflict::WrongStatus {
                expected: SessionStatus::Playing,
                actual: self.status,
            }
            .into());
        }
        self.ensure_no_targeted()
    }

    fn set_phase(&mut self, phase: RoundPhase) {
        if let Some(round) = self.round.as_mut() {
            debug!(
                "{}: round {} {} -> {}",
                self.name, round.number, round.phase, phase
            );
            round.phase = phase;
        }
        self.phase_generation += 1;
    }

    fn set_status(&mut self, status: SessionStatus) {
        info!("{}: {} -> {}", self.name, self.status, status);
        self.status = status;
        self.push_event(GameEvent::StatusChanged { status });
    }

    // Lifecycle.

    pub fn start_game(&mut self) -> SessionResult<()> {
        self.ensure_not_finished()?;
        if self.status != SessionStatus::Created {
            return Err(StateConflict::WrongStatus {
                expected: SessionStatus::Created,
                actual: self.status,
            }
            .into());
        }
        self.ensure_enough_players()?;
        self.clock_remaining_secs = self.settings.game_clock_secs;
        self.set_status(SessionStatus::Playing);
        Ok(())
    }

    /// Freezes the game clock and makes every outstanding timer and
    /// collaborator callback stale.
    pub fn pause(&mut self) -> SessionResult<()> {
        self.ensure_playing()?;
        self.phase_generation += 1;
        self.action_generation += 1;
        self.set_status(SessionStatus::Paused);
        Ok(())
    }

    /// Resumes a paused game and re-issues whatever work the current state
    /// was waiting on. Countdowns restart at full length.
    pub fn resume(&mut self) -> SessionResult<()> {
        self.ensure_not_finished()?;
        if self.status != SessionStatus::Paused {
            return Err(StateConflict::WrongStatus {
                expected: SessionStatus::Paused,
                actual: self.status,
            }
            .into());
        }
        self.set_status(SessionStatus::Playing);

        let generation = self.phase_generation;
        match self.phase() {
            RoundPhase::Loading => self.push_directive(Directive::FetchQuestion { generation }),
            RoundPhase::Audio => {
                if let Some(media) = self.round.as_ref().and_then(|r| r.media.clone()) {
                    self.push_play_media(media);
                }
            }
            RoundPhase::Betting => self.push_directive(Directive::StartTimer {
                timer: TimerKind::Betting,
                generation,
                duration: self.settings.betting_duration(),
            }),
            RoundPhase::Idle | RoundPhase::Question | RoundPhase::Answer => {}
        }

        match &self.targeted {
            Some(TargetedAction::PrecisionQuiz(quiz)) => {
                let secs = quiz.countdown_secs;
                self.start_action_timer(TimerKind::Precision, secs);
            }
            Some(TargetedAction::ChallengePerformance(challenge)) => {
                let secs = match challenge.stage {
                    ChallengeStage::Preparing => Some(self.settings.challenge_prepare_secs),
                    ChallengeStage::Performing => Some(self.settings.challenge_perform_secs),
                    ChallengeStage::AwaitingVerdict => None,
                };
                if let Some(secs) = secs {
                    self.start_action_timer(TimerKind::Challenge, secs);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Ends the game immediately from any state.
    pub fn end_session(&mut self) -> SessionResult<()> {
        self.ensure_not_finished()?;
        self.finish();
        Ok(())
    }

    /// Counts one second off the game clock. Returns whether this finished
    /// the game.
    pub fn tick_clock(&mut self) -> bool {
        if self.status != SessionStatus::Playing {
            return false;
        }
        self.clock_remaining_secs = self.clock_remaining_secs.saturating_sub(1);
        if self.clock_remaining_secs == 0 {
            info!("{}: game clock ran out", self.name);
            self.finish();
            return true;
        }
        false
    }

    /// Forces `finished`. Discards any targeted action and makes all
    /// outstanding timers stale.
    pub(crate) fn finish(&mut self) {
        if self.status == SessionStatus::Finished {
            return;
        }
        if let Some(action) = self.targeted.take() {
            debug!("{}: discarding pending {}", self.name, action.kind());
        }
        self.phase_generation += 1;
        self.action_generation += 1;

        let top = self.roster.iter().map(|p| p.score).max().unwrap_or(0);
        self.winner = if top > 0 {
            self.roster.iter().find(|p| p.score == top).map(|p| p.id)
        } else {
            None
        };

        self.set_status(SessionStatus::Finished);
        self.push_event(GameEvent::GameFinished {
            winner: self.winner,
        });
        let standings = self.final_standings();
        self.push_directive(Directive::RecordStandings(standings));
    }

    /// Ends the game if anyone has reached the target score. Returns
    /// whether it did.
    pub(crate) fn check_target_score(&mut self) -> bool {
        if self.status == SessionStatus::Finished {
            return false;
        }
        let target = self.settings.target_score;
        if self.roster.iter().any(|p| p.score >= target) {
            info!("{}: target score {target} reached", self.name);
            self.finish();
            return true;
        }
        false
    }

    #[must_use]
    pub fn final_standings(&self) -> FinalStandings {
        let mut players: Vec<&Player> = self.roster.iter().collect();
        players.sort_by(|a, b| b.score.cmp(&a.score));

        let mut entries = Vec::with_capacity(players.len());
        let mut rank = 0;
        let mut previous = None;
        for (idx, player) in players.iter().enumerate() {
            if previous != Some(player.score) {
                rank = idx as u32 + 1;
                previous = Some(player.score);
            }
            entries.push(StandingEntry {
                rank,
                player_id: player.id,
                name: player.name.clone(),
                score: player.score,
            });
        }

        FinalStandings {
            session_id: self.id,
            session_name: self.name.clone(),
            rounds_played: self.round_counter,
            winner: self.winner,
            finished_at: Utc::now(),
            entries,
        }
    }

    fn ensure_enough_players(&self) -> SessionResult<()> {
        let present = self.roster.len();
        let required = self.settings.min_players;
        if present < required {
            return Err(ValidationError::NotEnoughPlayers { required, present }.into());
        }
        Ok(())
    }

    // Round phases.

    /// `idle -> loading`. Asks the catalog for the next question.
    pub fn request_next_round(&mut self) -> SessionResult<u32> {
        self.ensure_playing()?;
        self.ensure_no_targeted()?;
        self.ensure_phase(RoundPhase::Idle)?;
        self.ensure_enough_players()?;

        self.round_counter += 1;
        self.round = Some(Round::new(self.round_counter));
        self.phase_generation += 1;
        self.push_directive(Directive::FetchQuestion {
            generation: self.phase_generation,
        });
        self.push_event(GameEvent::RoundRequested {
            round: self.round_counter,
        });
        Ok(self.round_counter)
    }

    /// `loading -> audio`, or straight on to betting/question when the
    /// round has no media. Returns `Ok(false)` for a stale delivery.
    pub fn load_round(
        &mut self,
        generation: u64,
        question: Question,
        media: Option<MediaRef>,
    ) -> SessionResult<bool> {
        if self.status != SessionStatus::Playing
            || generation != self.phase_generation
            || self.phase() != RoundPhase::Loading
        {
            debug!("{}: dropping stale round delivery", self.name);
            return Ok(false);
        }
        if self.has_used_question(&question.id) {
            return Err(ValidationError::DuplicateQuestion(question.id).into());
        }

        self.used_questions.insert(question.id.clone());
        let question_type = question.question_type;
        let round_number = self.round_counter;
        if let Some(round) = self.round.as_mut() {
            round.question = Some(question);
            round.media = media.clone();
        }
        self.push_event(GameEvent::RoundLoaded {
            round: round_number,
            question_type,
        });

        match media {
            Some(media) => {
                self.set_phase(RoundPhase::Audio);
                self.push_play_media(media);
            }
            None => self.enter_betting_or_question(),
        }
        Ok(true)
    }

    /// Gives up on a round whose question never arrived. The round number
    /// is handed back.
    pub fn abandon_loading(&mut self, generation: u64) -> bool {
        if generation != self.phase_generation || self.phase() != RoundPhase::Loading {
            return false;
        }
        self.round = None;
        self.round_counter = self.round_counter.saturating_sub(1);
        self.phase_generation += 1;
        true
    }

    /// `audio -> betting` once the audio collaborator reports the end of
    /// playback. Stale or repeated reports are ignored.
    pub fn playback_finished(&mut self, generation: u64) -> bool {
        if self.status != SessionStatus::Playing
            || generation != self.phase_generation
            || self.phase() != RoundPhase::Audio
        {
            return false;
        }
        self.enter_betting_or_question();
        true
    }

    fn push_play_media(&mut self, media: MediaRef) {
        let duration_hint = media
            .duration_secs
            .map_or_else(|| self.settings.playback_hint(), Duration::from_secs);
        self.push_directive(Directive::PlayMedia {
            generation: self.phase_generation,
            media,
            duration_hint,
        });
    }

    fn enter_betting_or_question(&mut self) {
        let offers_betting = self.round.as_ref().is_some_and(Round::offers_betting);
        if !offers_betting {
            self.set_phase(RoundPhase::Question);
            return;
        }

        self.set_phase(RoundPhase::Betting);
        self.push_event(GameEvent::BettingOpened {
            round: self.round_counter,
        });
        if self.all_bets_in() {
            self.finish_betting();
            return;
        }
        self.push_directive(Directive::StartTimer {
            timer: TimerKind::Betting,
            generation: self.phase_generation,
            duration: self.settings.betting_duration(),
        });
    }

    /// Everyone has wagered or has nothing left to wager.
    pub(crate) fn all_bets_in(&self) -> bool {
        self.roster
            .iter()
            .all(|p| p.wager > 0 || p.tokens.is_empty())
    }

    /// `betting -> question`. Moving the phase on retires the countdown.
    pub(crate) fn finish_betting(&mut self) {
        if self.phase() != RoundPhase::Betting {
            return;
        }
        self.set_phase(RoundPhase::Question);
        self.push_event(GameEvent::BettingClosed {
            round: self.round_counter,
        });
    }

    /// Spends one of the player's wager tokens on the current round.
    /// Allowed while a targeted action is pending.
    pub fn place_bet(&mut self, player_id: PlayerId, token: u32) -> SessionResult<Bet> {
        self.ensure_playing()?;
        let player = self.player(player_id)?;
        let (already_wagered, has_token) = (player.wager > 0, player.tokens.contains(token));
        self.ensure_phase(RoundPhase::Betting)?;

        if already_wagered {
            return Err(ValidationError::InvalidWager {
                token,
                reason: WagerRejection::AlreadyPlaced,
            }
            .into());
        }
        if !has_token {
            return Err(ValidationError::InvalidWager {
                token,
                reason: WagerRejection::TokenUnavailable,
            }
            .into());
        }

        let player = self.player_mut(player_id)?;
        player.tokens.spend(token);
        player.wager = token;
        let bet = Bet::new(player_id, token);
        if let Some(round) = self.round.as_mut() {
            round.bets.push(bet.clone());
        }
        self.push_event(GameEvent::BetPlaced {
            player_id,
            amount: token,
        });

        if self.all_bets_in() {
            self.finish_betting();
        }
        Ok(bet)
    }

    /// Moderator closes betting early.
    pub fn close_betting(&mut self) -> SessionResult<()> {
        self.ensure_playing()?;
        self.ensure_no_targeted()?;
        self.ensure_phase(RoundPhase::Betting)?;
        self.finish_betting();
        Ok(())
    }

    /// Dispatches a countdown that ran out. Returns whether it still
    /// applied.
    pub fn timer_fired(&mut self, timer: TimerKind, generation: u64) -> bool {
        if self.status != SessionStatus::Playing {
            return false;
        }
        let applied = match timer {
            TimerKind::Betting => self.betting_timer_expired(generation),
            TimerKind::Precision => self.precision_timer_expired(generation),
            TimerKind::Challenge => self.challenge_timer_elapsed(generation),
        };
        if !applied {
            debug!("{}: stale {timer} timer ignored", self.name);
        }
        applied
    }

    fn betting_timer_expired(&mut self, generation: u64) -> bool {
        if generation != self.phase_generation || self.phase() != RoundPhase::Betting {
            return false;
        }
        self.finish_betting();
        true
    }

    /// `question -> answer`. The only transition that scores.
    pub fn reveal_answer(&mut self, winner: Option<PlayerId>) -> SessionResult<RoundResult> {
        self.ensure_playing()?;
        self.ensure_no_targeted()?;
        self.ensure_phase(RoundPhase::Question)?;
        if let Some(winner) = winner {
            self.player(winner)?;
        }

        let (question_type, difficulty) = self
            .round
            .as_ref()
            .and_then(|r| r.question.as_ref())
            .map(|q| (q.question_type, q.difficulty))
            .ok_or(StateConflict::WrongPhase {
                expected: RoundPhase::Question,
                actual: RoundPhase::Loading,
            })?;
        let round_number = self.round_counter;
        self.set_phase(RoundPhase::Answer);

        let result = match winner {
            Some(winner) => {
                let (points, combos) = self.award_points(winner, question_type, difficulty)?;
                if let Some(round) = self.round.as_mut() {
                    round.winner = Some(winner);
                }
                RoundResult {
                    round: round_number,
                    winner: Some(winner),
                    points: Some(points),
                    combos,
                }
            }
            None => {
                for player in self.roster.iter_mut() {
                    player.streaks.consecutive = 0;
                }
                self.clear_wagers();
                if let Some(round) = self.round.as_mut() {
                    round.no_correct_answer = true;
                }
                self.push_event(GameEvent::NoWinner {
                    round: round_number,
                });
                self.rotate_turn();
                RoundResult {
                    round: round_number,
                    winner: None,
                    points: None,
                    combos: Vec::new(),
                }
            }
        };

        self.check_target_score();
        Ok(result)
    }

    /// Cancels the current round from betting or question. Every wager is
    /// refunded and nobody scores.
    pub fn void_round(&mut self) -> SessionResult<()> {
        self.ensure_playing()?;
        self.ensure_no_targeted()?;
        let phase = self.phase();
        if !matches!(phase, RoundPhase::Betting | RoundPhase::Question) {
            return Err(StateConflict::WrongPhase {
                expected: RoundPhase::Question,
                actual: phase,
            }
            .into());
        }

        for player in self.roster.iter_mut() {
            if player.wager > 0 {
                player.tokens.restore(player.wager);
                player.wager = 0;
            }
        }
        if let Some(round) = self.round.as_mut() {
            round.bets.clear();
            round.voided = true;
        }
        self.set_phase(RoundPhase::Answer);
        self.push_event(GameEvent::RoundVoided {
            round: self.round_counter,
        });
        Ok(())
    }

    /// `answer -> idle`. Drops the round; scores, inventories and streaks
    /// carry over.
    pub fn prepare_next_round(&mut self) -> SessionResult<()> {
        self.ensure_playing()?;
        self.ensure_no_targeted()?;
        self.ensure_phase(RoundPhase::Answer)?;
        self.clear_wagers();
        self.round = None;
        self.phase_generation += 1;
        Ok(())
    }

    // Power cards.

    /// Plays a card. Precision cards need their quiz questions supplied up
    /// front.
    pub fn use_power_card(
        &mut self,
        player_id: PlayerId,
        card_id: CardId,
        precision_questions: Vec<PrecisionQuestion>,
    ) -> SessionResult<CardOutcome> {
        self.ensure_playing()?;
        self.ensure_no_targeted()?;
        self.play_card(CardPlay {
            player_id,
            card_id,
            precision_questions,
        })
    }

    /// Adds a freshly scanned card to a player's hand.
    pub fn acquire_card(
        &mut self,
        player_id: PlayerId,
        kind: PowerCardKind,
    ) -> SessionResult<CardId> {
        self.ensure_roster_editable()?;
        self.player(player_id)?;
        let card_id = self.next_card_id();
        self.player_mut(player_id)?
            .inventory
            .insert(PowerCardInstance::new(card_id, kind))?;
        self.push_event(GameEvent::CardAcquired {
            player_id,
            card_id,
            kind,
        });
        Ok(card_id)
    }

    /// Kind of a card the player holds unused.
    pub fn owned_card_kind(
        &self,
        player_id: PlayerId,
        card_id: CardId,
    ) -> SessionResult<PowerCardKind> {
        let player = self.player(player_id)?;
        if let Some(card) = player.inventory.get(card_id) {
            return Ok(card.kind);
        }
        if player.used_cards.iter().any(|c| c.id == card_id) {
            return Err(ValidationError::CardAlreadyUsed(card_id).into());
        }
        let held_elsewhere = self.roster.iter().any(|p| {
            p.inventory.contains(card_id) || p.used_cards.iter().any(|c| c.id == card_id)
        });
        if held_elsewhere {
            return Err(ValidationError::CardNotOwned { player_id, card_id }.into());
        }
        Err(NotFound::Card(card_id).into())
    }

    /// Moves a card from the player's hand to their used-card log.
    pub(crate) fn consume_card(
        &mut self,
        player_id: PlayerId,
        card_id: CardId,
    ) -> SessionResult<PowerCardKind> {
        self.owned_card_kind(player_id, card_id)?;
        let player = self.player_mut(player_id)?;
        let mut card = player
            .inventory
            .take(card_id)
            .ok_or(NotFound::Card(card_id))?;
        card.mark_used();
        let kind = card.kind;
        player.used_cards.push(card);
        Ok(kind)
    }

    /// Other players holding at least one card.
    pub(crate) fn steal_candidates(&self, attacker: PlayerId) -> Vec<StealCandidate> {
        self.roster
            .iter()
            .filter(|p| p.id != attacker && !p.inventory.is_empty())
            .map(|p| StealCandidate {
                player_id: p.id,
                card_count: p.inventory.len(),
                shielded: p.flags.shielded,
                counter_armed: p.flags.counter_armed,
            })
            .collect()
    }

    pub(crate) fn begin_targeted(&mut self, action: TargetedAction) {
        debug!(
            "{}: player {} started {}",
            self.name,
            action.initiator(),
            action.kind()
        );
        self.targeted = Some(action);
        self.action_generation += 1;
    }

    /// Manual points from the moderator. Allowed while a targeted action is
    /// pending.
    pub fn award_bonus(&mut self, player_id: PlayerId, points: Points) -> SessionResult<()> {
        self.ensure_playing()?;
        self.player_mut(player_id)?.add_points(points);
        self.push_event(GameEvent::PointsAwarded { player_id, points });
        self.check_target_score();
        Ok(())
    }
}
