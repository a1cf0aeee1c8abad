//! Session actor implementation with async message handling.

use super::{
    config::SessionConfig,
    messages::{SessionMessage, SessionMetadata, SessionUpdate},
};
use crate::{
    audio::{AudioPlayer, PlaybackDone},
    catalog::{Catalog, CatalogEntry, CatalogResult, QuestionFilters},
    game::{
        CommandOutcome, Directive, FinalStandings, GameEvent, NotFound, PowerCardKind,
        PrecisionQuestion, QuestionId, Session, SessionCommand, SessionError, SessionId,
        SessionResult, SessionSnapshot, SessionStatus, TimerKind,
    },
    history::StandingsRecorder,
};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tokio::{
    sync::{mpsc, oneshot},
    time::{Duration, Instant, MissedTickBehavior, interval_at},
};
use uuid::Uuid;

/// Inbox capacity per session
const INBOX_CAPACITY: usize = 100;

/// The services a session talks to. Cheap to clone.
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn Catalog>,
    pub audio: Arc<dyn AudioPlayer>,
    pub recorder: Option<Arc<dyn StandingsRecorder>>,
}

/// Session actor handle for sending messages
#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionMessage>,
    session_id: SessionId,
}

impl SessionHandle {
    /// Create a new session handle
    pub fn new(sender: mpsc::Sender<SessionMessage>, session_id: SessionId) -> Self {
        Self { sender, session_id }
    }

    /// Get session ID
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Whether the actor has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the session
    pub async fn send(&self, message: SessionMessage) -> SessionResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| self.gone())
    }

    /// Apply one command and wait for its outcome
    pub async fn execute(&self, command: SessionCommand) -> SessionResult<CommandOutcome> {
        let (response, rx) = oneshot::channel();
        self.send(SessionMessage::Command { command, response })
            .await?;
        rx.await.map_err(|_| self.gone())?
    }

    pub async fn snapshot(&self) -> SessionResult<SessionSnapshot> {
        let (response, rx) = oneshot::channel();
        self.send(SessionMessage::GetSnapshot { response }).await?;
        rx.await.map_err(|_| self.gone())
    }

    pub async fn metadata(&self) -> SessionResult<SessionMetadata> {
        let (response, rx) = oneshot::channel();
        self.send(SessionMessage::GetMetadata { response }).await?;
        rx.await.map_err(|_| self.gone())
    }

    pub async fn standings(&self) -> SessionResult<FinalStandings> {
        let (response, rx) = oneshot::channel();
        self.send(SessionMessage::GetStandings { response }).await?;
        rx.await.map_err(|_| self.gone())
    }

    /// Subscribe to updates. Returns the subscriber id, the current
    /// snapshot and the update stream.
    pub async fn subscribe(
        &self,
        buffer: usize,
    ) -> SessionResult<(Uuid, SessionSnapshot, mpsc::Receiver<SessionUpdate>)> {
        let subscriber_id = Uuid::new_v4();
        let (sender, updates) = mpsc::channel(buffer.max(1));
        let (response, rx) = oneshot::channel();
        self.send(SessionMessage::Subscribe {
            subscriber_id,
            sender,
            response,
        })
        .await?;
        let snapshot = rx.await.map_err(|_| self.gone())?;
        Ok((subscriber_id, snapshot, updates))
    }

    pub async fn unsubscribe(&self, subscriber_id: Uuid) -> SessionResult<()> {
        self.send(SessionMessage::Unsubscribe { subscriber_id })
            .await
    }

    /// Stop the actor and wait until it has
    pub async fn close(&self) -> SessionResult<()> {
        let (response, rx) = oneshot::channel();
        self.send(SessionMessage::Close { response }).await?;
        rx.await.map_err(|_| self.gone())
    }

    fn gone(&self) -> SessionError {
        NotFound::Session(self.session_id).into()
    }
}

/// Session actor owning a single game exclusively
pub struct SessionActor {
    /// Game state (pure state machine)
    session: Session,

    /// Catalog filters for this game
    filters: QuestionFilters,

    /// Catalog, audio and history services
    collaborators: Collaborators,

    /// Message inbox
    inbox: mpsc::Receiver<SessionMessage>,

    /// Route back into the inbox for timers and collaborator callbacks.
    /// Weak so the actor stops once every handle is gone.
    loopback: mpsc::WeakSender<SessionMessage>,

    /// Subscribers for state change notifications
    subscribers: HashMap<Uuid, mpsc::Sender<SessionUpdate>>,

    /// Is session closed
    is_closed: bool,
}

impl SessionActor {
    /// Create a new session actor
    ///
    /// # Arguments
    ///
    /// * `id` - Session ID
    /// * `config` - Session configuration
    /// * `collaborators` - Catalog, audio and history services
    ///
    /// # Returns
    ///
    /// * `(SessionActor, SessionHandle)` - Actor and handle for sending messages
    pub fn new(
        id: SessionId,
        config: SessionConfig,
        collaborators: Collaborators,
    ) -> SessionResult<(Self, SessionHandle)> {
        config.validate()?;
        let SessionConfig {
            name,
            settings,
            filters,
            seed,
        } = config;
        let session = Session::new(id, name.trim().to_string(), settings, seed)?;

        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let actor = Self {
            session,
            filters,
            collaborators,
            inbox,
            loopback: sender.downgrade(),
            subscribers: HashMap::new(),
            is_closed: false,
        };

        Ok((actor, SessionHandle::new(sender, id)))
    }

    /// Run the session actor event loop
    pub async fn run(mut self) {
        log::info!(
            "Session {} '{}' starting",
            self.session.id(),
            self.session.name()
        );

        let tick_duration = Duration::from_secs(1);
        let mut clock = interval_at(Instant::now() + tick_duration, tick_duration);
        clock.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                message = self.inbox.recv() => {
                    match message {
                        Some(message) => self.handle_message(message).await,
                        None => break,
                    }

                    if self.is_closed {
                        break;
                    }
                }

                _ = clock.tick() => {
                    self.tick();
                }
            }
        }

        log::info!(
            "Session {} '{}' closed",
            self.session.id(),
            self.session.name()
        );
    }

    /// Handle a session message
    async fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Command { command, response } => {
                let label = command.label();
                let result = self.handle_command(command).await;
                match &result {
                    Ok(_) => self.after_mutation(),
                    Err(e) => log::debug!(
                        "Session {}: {} rejected: {}",
                        self.session.id(),
                        label,
                        e
                    ),
                }
                let _ = response.send(result);
            }

            SessionMessage::GetSnapshot { response } => {
                let _ = response.send(self.session.snapshot());
            }

            SessionMessage::GetMetadata { response } => {
                let _ = response.send(self.metadata());
            }

            SessionMessage::GetStandings { response } => {
                let _ = response.send(self.session.final_standings());
            }

            SessionMessage::Subscribe {
                subscriber_id,
                sender,
                response,
            } => {
                log::debug!(
                    "Session {}: subscriber {} attached",
                    self.session.id(),
                    subscriber_id
                );
                self.subscribers.insert(subscriber_id, sender);
                let _ = response.send(self.session.snapshot());
            }

            SessionMessage::Unsubscribe { subscriber_id } => {
                self.subscribers.remove(&subscriber_id);
            }

            SessionMessage::Close { response } => {
                self.is_closed = true;
                self.subscribers.clear();
                let _ = response.send(());
            }

            SessionMessage::RoundFetched { generation, result } => {
                if self.handle_round_fetched(generation, result) {
                    self.after_mutation();
                }
            }

            SessionMessage::PlaybackFinished { generation } => {
                if self.session.playback_finished(generation) {
                    self.after_mutation();
                }
            }

            SessionMessage::TimerFired { timer, generation } => {
                if self.session.timer_fired(timer, generation) {
                    self.after_mutation();
                }
            }
        }
    }

    /// Precision cards need quiz questions from the catalog before the
    /// session can play them. Everything else goes straight to the session.
    async fn handle_command(&mut self, command: SessionCommand) -> SessionResult<CommandOutcome> {
        match command {
            SessionCommand::UsePowerCard { player_id, card_id }
                if matches!(
                    self.session.owned_card_kind(player_id, card_id),
                    Ok(PowerCardKind::Precision)
                ) =>
            {
                let questions = self.fetch_precision_questions().await;
                let outcome = self
                    .session
                    .use_power_card(player_id, card_id, questions)?;
                Ok(CommandOutcome::CardPlayed { outcome })
            }
            command => self.session.apply(command),
        }
    }

    async fn fetch_precision_questions(&self) -> Vec<PrecisionQuestion> {
        let count = self.session.settings().precision_questions;
        match self.collaborators.catalog.precision_questions(count).await {
            Ok(questions) => questions,
            Err(e) => {
                log::warn!(
                    "Session {}: no precision questions: {}",
                    self.session.id(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Returns whether the session changed
    fn handle_round_fetched(
        &mut self,
        generation: u64,
        result: CatalogResult<CatalogEntry>,
    ) -> bool {
        match result {
            Ok(CatalogEntry { question, media }) => {
                let question_id = question.id.clone();
                match self.session.load_round(generation, question, media) {
                    Ok(applied) => applied,
                    Err(e) => {
                        log::warn!(
                            "Session {}: catalog returned {}: {}",
                            self.session.id(),
                            question_id,
                            e
                        );
                        self.session.abandon_loading(generation)
                    }
                }
            }
            Err(e) => {
                log::warn!(
                    "Session {}: could not load a round: {}",
                    self.session.id(),
                    e
                );
                self.session.abandon_loading(generation)
            }
        }
    }

    /// Advance the game clock (called every second)
    fn tick(&mut self) {
        if self.is_closed || self.session.status() != SessionStatus::Playing {
            return;
        }
        self.session.tick_clock();
        self.after_mutation();
    }

    /// Run queued directives, log events and push an update
    fn after_mutation(&mut self) {
        for directive in self.session.drain_directives() {
            self.execute(directive);
        }

        let events = self.session.drain_events();
        for event in &events {
            log::info!("Session {}: {}", self.session.id(), event);
        }

        self.notify_subscribers(events);
    }

    fn execute(&self, directive: Directive) {
        match directive {
            Directive::FetchQuestion { generation } => {
                let catalog = Arc::clone(&self.collaborators.catalog);
                let used: HashSet<QuestionId> =
                    self.session.used_question_ids().cloned().collect();
                let filters = self.filters.clone();
                let loopback = self.loopback.clone();
                tokio::spawn(async move {
                    let result = catalog.next_question(&used, &filters).await;
                    deliver(&loopback, SessionMessage::RoundFetched { generation, result }).await;
                });
            }

            Directive::PlayMedia {
                generation,
                media,
                duration_hint,
            } => {
                let (done, finished) = PlaybackDone::channel();
                self.collaborators.audio.play(media, duration_hint, done);
                let loopback = self.loopback.clone();
                tokio::spawn(async move {
                    if finished.await.is_ok() {
                        deliver(&loopback, SessionMessage::PlaybackFinished { generation }).await;
                    }
                });
            }

            Directive::StartTimer {
                timer,
                generation,
                duration,
            } => {
                self.start_timer(timer, generation, duration);
            }

            Directive::RecordStandings(standings) => {
                let Some(recorder) = self.collaborators.recorder.clone() else {
                    log::debug!(
                        "Session {}: no history store, standings not recorded",
                        self.session.id()
                    );
                    return;
                };
                tokio::spawn(async move {
                    if let Err(e) = recorder.record(&standings).await {
                        log::error!(
                            "Failed to record standings for session {}: {}",
                            standings.session_id,
                            e
                        );
                    }
                });
            }
        }
    }

    fn start_timer(&self, timer: TimerKind, generation: u64, duration: Duration) {
        log::debug!(
            "Session {}: {} countdown of {:?} (generation {})",
            self.session.id(),
            timer,
            duration,
            generation
        );
        let loopback = self.loopback.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            deliver(&loopback, SessionMessage::TimerFired { timer, generation }).await;
        });
    }

    /// Notify all subscribers of a state change
    fn notify_subscribers(&mut self, events: Vec<GameEvent>) {
        if self.subscribers.is_empty() {
            return;
        }
        let update = SessionUpdate {
            snapshot: self.session.snapshot(),
            events,
        };
        let session_id = self.session.id();
        self.subscribers.retain(|subscriber_id, sender| {
            match sender.try_send(update.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!(
                        "Session {}: subscriber {} channel full, dropping update",
                        session_id,
                        subscriber_id
                    );
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!(
                        "Session {}: subscriber {} disconnected, removing",
                        session_id,
                        subscriber_id
                    );
                    false
                }
            }
        });
    }

    fn metadata(&self) -> SessionMetadata {
        SessionMetadata {
            id: self.session.id(),
            name: self.session.name().to_string(),
            status: self.session.status(),
            player_count: self.session.roster().len(),
            max_players: self.session.settings().max_players,
            round_counter: self.session.round_counter(),
            clock_remaining_secs: self.session.clock_remaining().as_secs(),
            created_at: self.session.created_at(),
        }
    }
}

/// Sends a callback into the actor if it is still running
async fn deliver(loopback: &mpsc::WeakSender<SessionMessage>, message: SessionMessage) {
    if let Some(sender) = loopback.upgrade() {
        let _ = sender.send(message).await;
    }
}
