//! Turn engine: the per-session state machine. Receives normalized input,
//! dispatches to control handlers or the question-submission protocol, and
//! orchestrates the bank, judge, checker and session store.

use crate::authoring;
use crate::bank::QuestionBank;
use crate::checker::AnswerChecker;
use crate::classify;
use crate::error::GameError;
use crate::judge::JudgeAdapter;
use crate::llm::ReasoningProvider;
use crate::messages;
use crate::store::{GameSession, SessionHandle, SessionStore};
use crate::types::{session_key, GameConfig, QuestionRecord, SessionKey};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Bank listing page size for the `list` command
const LIST_PER_PAGE: usize = 10;

/// One inbound event from the dispatcher collaborator
#[derive(Debug, Clone)]
pub struct Inbound {
    pub text: String,
    pub sender_id: String,
    pub group_id: Option<String>,
    pub is_admin: bool,
}

impl Inbound {
    pub fn session_key(&self) -> SessionKey {
        session_key(&self.sender_id, self.group_id.as_deref())
    }
}

/// Out-of-band message pushed by the engine, currently only timeout
/// summaries. The dispatcher delivers these to the session's channel.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub session_key: SessionKey,
    pub text: String,
}

/// Response to one inbound event
#[derive(Debug, Default)]
pub struct Reply {
    pub texts: Vec<String>,
    pub session_ended: bool,
}

impl Reply {
    fn text(text: String) -> Self {
        Self {
            texts: vec![text],
            session_ended: false,
        }
    }

    fn ended(text: String) -> Self {
        Self {
            texts: vec![text],
            session_ended: true,
        }
    }

    /// No response at all: unrecognized chatter, or a turn whose session
    /// vanished mid-flight.
    fn silent() -> Self {
        Self::default()
    }
}

enum Command<'a> {
    Start(Option<&'a str>),
    /// None means the question marker carried no text
    Ask(Option<&'a str>),
    End,
    Abort,
    Reveal,
    Swap,
    Help,
    List(usize),
    Detail(Option<&'a str>),
    Author,
    AdminEndAll,
    Other,
}

fn parse_command(text: &str) -> Command<'_> {
    let trimmed = text.trim();
    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (trimmed, ""),
    };

    match head {
        "start" => Command::Start((!rest.is_empty()).then_some(rest)),
        "ask" => Command::Ask((!rest.is_empty()).then_some(rest)),
        "end" if rest.is_empty() => Command::End,
        "abort" if rest.is_empty() => Command::Abort,
        "reveal" if rest.is_empty() => Command::Reveal,
        "swap" if rest.is_empty() => Command::Swap,
        "help" if rest.is_empty() => Command::Help,
        "author" if rest.is_empty() => Command::Author,
        "list" => Command::List(rest.parse().unwrap_or(1)),
        "detail" => Command::Detail((!rest.is_empty()).then_some(rest)),
        "shutdown" if rest == "all" => Command::AdminEndAll,
        _ => Command::Other,
    }
}

pub struct TurnEngine {
    store: SessionStore,
    bank: QuestionBank,
    judge: JudgeAdapter,
    checker: AnswerChecker,
    provider: Option<Arc<dyn ReasoningProvider>>,
    config: GameConfig,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl TurnEngine {
    /// Build the engine and the receiver for its out-of-band messages.
    pub fn new(
        bank: QuestionBank,
        provider: Option<Arc<dyn ReasoningProvider>>,
        config: GameConfig,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = Arc::new(Self {
            store: SessionStore::new(),
            bank,
            judge: JudgeAdapter::new(provider.clone()),
            checker: AnswerChecker::new(provider.clone()),
            provider,
            config,
            outbound: tx,
        });
        (engine, rx)
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Process one inbound event.
    pub async fn handle(self: &Arc<Self>, inbound: Inbound) -> Reply {
        let key = inbound.session_key();
        match parse_command(&inbound.text) {
            Command::Start(id) => self.handle_start(&key, id).await,
            Command::Ask(question) => self.handle_ask(&key, question).await,
            Command::End => self.handle_end(&key).await,
            Command::Abort => self.handle_abort(&key).await,
            Command::Reveal => self.handle_reveal(&key).await,
            Command::Swap => self.handle_swap(&key).await,
            Command::Help => Reply::text(messages::help(
                self.config.max_questions,
                self.config.session_timeout,
            )),
            Command::List(page) => {
                Reply::text(messages::bank_list(self.bank.records(), page, LIST_PER_PAGE))
            }
            Command::Detail(id) => self.handle_detail(id),
            Command::Author => self.handle_author(&key).await,
            Command::AdminEndAll => self.handle_admin_end_all(inbound.is_admin).await,
            Command::Other => Reply::silent(),
        }
    }

    /// Terminate every session and stop the engine's timers.
    pub async fn shutdown(&self) -> usize {
        let drained = self.store.drain().await;
        tracing::info!("Engine shutdown: terminated {} active session(s)", drained);
        drained
    }

    async fn handle_start(self: &Arc<Self>, key: &SessionKey, id: Option<&str>) -> Reply {
        if let Some(handle) = self.store.get(key).await {
            // A start during a running game is activity, not a restart
            self.arm_timer(key, &handle);
            return Reply::text(messages::already_in_progress());
        }

        let record = match id {
            Some(raw) => match self.bank.by_id(raw) {
                Some(record) => record.clone(),
                None => {
                    return Reply::text(messages::record_not_found(&QuestionRecord::canonical_id(
                        raw,
                    )))
                }
            },
            None => self.bank.random().clone(),
        };

        let framing = self.judge.system_framing(&record);
        let game = GameSession::new(record.clone(), framing);

        match self.store.create(key, game).await {
            Ok(handle) => {
                self.arm_timer(key, &handle);
                tracing::info!("Session {} started puzzle {}", key, record.id);
                Reply {
                    texts: vec![
                        messages::rules_preamble(
                            self.config.max_questions,
                            self.config.session_timeout,
                        ),
                        messages::intro(&record, self.config.max_questions),
                    ],
                    session_ended: false,
                }
            }
            // Lost a race against a concurrent start for the same key
            Err(_) => Reply::text(messages::already_in_progress()),
        }
    }

    async fn handle_ask(self: &Arc<Self>, key: &SessionKey, question: Option<&str>) -> Reply {
        let Some(handle) = self.store.get(key).await else {
            return Reply::text(messages::no_active_session());
        };

        let Some(question) = question else {
            self.arm_timer(key, &handle);
            return Reply::text(messages::empty_question_usage());
        };

        // Holding the game lock serializes turns for this key
        let mut game = handle.game.lock().await;
        if !self.store.still_active(key, &handle).await {
            return Reply::silent();
        }

        self.arm_timer(key, &handle);
        game.question_count += 1;

        match self.run_submission(key, &handle, &mut game, question).await {
            Ok(reply) => reply,
            Err(GameError::ReasoningService(e)) => {
                tracing::error!("Reasoning service failed for session {}: {}", key, e);
                Reply::text(messages::service_unavailable())
            }
            Err(e) => {
                // No dangling session: the failure notice and the removal
                // are one transition
                tracing::error!("Turn processing failed for session {}: {}", key, e);
                self.store.remove_matching(key, &handle).await;
                Reply::ended(messages::unexpected_failure())
            }
        }
    }

    /// Steps (b)-(e) of the question-submission protocol. The caller has
    /// already refreshed the timer and incremented the question count.
    async fn run_submission(
        &self,
        key: &SessionKey,
        handle: &Arc<SessionHandle>,
        game: &mut GameSession,
        question: &str,
    ) -> Result<Reply, GameError> {
        if classify::looks_like_guess(question) {
            let correct = self
                .checker
                .check(question, &game.record.solution, key)
                .await;
            if !self.store.still_active(key, handle).await {
                return Ok(Reply::silent());
            }
            if correct {
                let summary = messages::correct_summary(&game.record, game.question_count);
                self.store.remove_matching(key, handle).await;
                tracing::info!(
                    "Session {} solved puzzle {} in {} questions",
                    key,
                    game.record.id,
                    game.question_count
                );
                return Ok(Reply::ended(summary));
            }
            // A wrong guess still consumes a slot and gets judged below
        }

        if game.question_count > self.config.max_questions {
            let summary =
                messages::out_of_questions_summary(&game.record, self.config.max_questions);
            self.store.remove_matching(key, handle).await;
            return Ok(Reply::ended(summary));
        }

        let GameSession {
            record,
            question_count,
            context,
        } = game;
        let label = self
            .judge
            .judge(question, context, &record.solution, key)
            .await?;
        if !self.store.still_active(key, handle).await {
            return Ok(Reply::silent());
        }

        Ok(Reply::text(messages::round_result(
            *question_count,
            question,
            label,
            self.config.max_questions - *question_count,
        )))
    }

    async fn handle_end(&self, key: &SessionKey) -> Reply {
        let Some(handle) = self.store.get(key).await else {
            return Reply::text(messages::no_active_session());
        };

        let game = handle.game.lock().await;
        if !self.store.still_active(key, &handle).await {
            return Reply::text(messages::no_active_session());
        }

        let summary = messages::ended_summary(&game.record, game.question_count);
        drop(game);
        self.store.remove_matching(key, &handle).await;
        Reply::ended(summary)
    }

    async fn handle_abort(&self, key: &SessionKey) -> Reply {
        match self.store.remove(key).await {
            Some(_) => {
                tracing::info!("Session {} aborted", key);
                Reply::ended(messages::force_ended())
            }
            None => Reply::text(messages::no_active_session()),
        }
    }

    async fn handle_reveal(self: &Arc<Self>, key: &SessionKey) -> Reply {
        let Some(handle) = self.store.get(key).await else {
            return Reply::text(messages::no_active_session());
        };

        let game = handle.game.lock().await;
        if !self.store.still_active(key, &handle).await {
            return Reply::text(messages::no_active_session());
        }

        self.arm_timer(key, &handle);
        Reply::text(messages::reveal(&game.record, game.question_count))
    }

    async fn handle_swap(self: &Arc<Self>, key: &SessionKey) -> Reply {
        let Some(handle) = self.store.get(key).await else {
            return Reply::text(messages::no_active_session());
        };

        let mut game = handle.game.lock().await;
        if !self.store.still_active(key, &handle).await {
            return Reply::text(messages::no_active_session());
        }

        let Some(record) = self.bank.random_different_from(&game.record.id) else {
            return Reply::text(messages::change_failed());
        };
        let record = record.clone();

        let framing = self.judge.system_framing(&record);
        game.replace_record(record.clone(), framing);
        self.arm_timer(key, &handle);

        tracing::info!("Session {} swapped to puzzle {}", key, record.id);
        Reply::text(messages::changed(&record, self.config.max_questions))
    }

    fn handle_detail(&self, id: Option<&str>) -> Reply {
        let Some(id) = id else {
            return Reply::text(messages::detail_usage());
        };
        match self.bank.by_id(id) {
            Some(record) => Reply::text(messages::bank_detail(record)),
            None => Reply::text(messages::record_not_found(&QuestionRecord::canonical_id(id))),
        }
    }

    async fn handle_author(&self, key: &SessionKey) -> Reply {
        let Some(provider) = &self.provider else {
            return Reply::text(messages::authoring_unavailable());
        };

        match authoring::author_puzzle(provider.as_ref(), key).await {
            Ok(Some((story, solution))) => {
                Reply::text(messages::authored_preview(&story, &solution))
            }
            Ok(None) => Reply::text(messages::authoring_failed()),
            Err(e) => {
                tracing::warn!("Puzzle authoring failed: {}", e);
                Reply::text(messages::authoring_failed())
            }
        }
    }

    async fn handle_admin_end_all(&self, is_admin: bool) -> Reply {
        if !is_admin {
            return Reply::text(messages::admin_denied());
        }

        let keys = self.store.keys().await;
        if keys.is_empty() {
            return Reply::text(messages::admin_none_active());
        }

        let mut removed = 0;
        for key in keys {
            if self.store.remove(&key).await.is_some() {
                removed += 1;
            }
        }

        tracing::info!("Admin terminated {} active session(s)", removed);
        Reply::text(messages::admin_report(removed))
    }

    /// Reset the session's inactivity timer. The spawned task stands down if
    /// a later reset supersedes it; if it fires while still current, it owns
    /// the expiry: remove the session and emit the timeout summary once.
    fn arm_timer(self: &Arc<Self>, key: &SessionKey, handle: &Arc<SessionHandle>) {
        let generation = handle.begin_timer();
        let engine = Arc::clone(self);
        let key = key.clone();
        let session = Arc::clone(handle);
        let timeout = self.config.session_timeout;

        let task = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if !session.try_expire(generation) {
                return;
            }
            if let Some(removed) = engine.store.remove_matching(&key, &session).await {
                let game = removed.game.lock().await;
                tracing::info!("Session {} timed out on puzzle {}", key, game.record.id);
                let _ = engine.outbound.send(Outbound {
                    session_key: key,
                    text: messages::timeout_summary(&game.record),
                });
            }
        });

        handle.attach_timer(generation, task.abort_handle());
    }
}
