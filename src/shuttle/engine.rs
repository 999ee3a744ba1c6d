// Command boundary: load, validate, persist, notify.
//
// The engine owns no aggregate state. Each command reloads the text with its
// version, runs the pure transition function and writes back with a
// compare-and-write, so two commands racing on one text cannot both win.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

use super::command::{Command, CommitteeAction, CommitteeCommand, VoteEvent};
use super::error::EngineError;
use super::events::{Notifier, ShuttleEvent};
use super::graph::CmpResult;
use super::location::Chamber;
use super::machine::{self, TransitionRules};
use super::projection::TextProjection;
use super::text::{LegislativeText, TextId, TransitionRecord};
use crate::config::EngineConfig;
use crate::storage::{TextRepository, Versioned};
use crate::telemetry::{create_command_span, generate_correlation_id};

pub struct ShuttleEngine {
    repository: Arc<dyn TextRepository>,
    notifier: Arc<dyn Notifier>,
    rules: TransitionRules,
    max_conflict_retries: u32,
}

impl ShuttleEngine {
    pub fn new(repository: Arc<dyn TextRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            repository,
            notifier,
            rules: TransitionRules::default(),
            max_conflict_retries: 3,
        }
    }

    pub fn from_config(
        repository: Arc<dyn TextRepository>,
        notifier: Arc<dyn Notifier>,
        config: &EngineConfig,
    ) -> Self {
        Self::new(repository, notifier)
            .with_rules(TransitionRules {
                cmp_min_readings_per_chamber: config.cmp_min_readings_per_chamber,
            })
            .with_max_conflict_retries(config.max_conflict_retries)
    }

    pub fn with_rules(mut self, rules: TransitionRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    /// Register a newly deposited text at its origin chamber's depot
    pub async fn create(
        &self,
        origin: Chamber,
        title: &str,
        reference: &str,
        urgency: bool,
    ) -> Result<LegislativeText, EngineError> {
        let text = LegislativeText::deposit(origin, title, reference, urgency, Utc::now())?;
        self.repository.insert(&text).await?;
        info!(
            text_id = %text.id(),
            reference = %text.reference(),
            origin = %origin,
            urgency,
            "Legislative text deposited"
        );
        self.notifier.notify(&ShuttleEvent::deposited(&text)).await;
        Ok(text)
    }

    pub async fn advance(&self, id: TextId) -> Result<LegislativeText, EngineError> {
        self.execute(id, Command::Advance).await
    }

    pub async fn apply_vote_result(&self, vote: &VoteEvent) -> Result<LegislativeText, EngineError> {
        self.execute(
            vote.text_id,
            Command::Vote {
                chamber: vote.chamber,
                outcome: vote.outcome,
            },
        )
        .await
    }

    pub async fn transmit(&self, id: TextId) -> Result<LegislativeText, EngineError> {
        self.execute(id, Command::Transmit).await
    }

    pub async fn convene_cmp(&self, id: TextId) -> Result<LegislativeText, EngineError> {
        self.execute(id, Command::ConveneCmp).await
    }

    pub async fn open_cmp(&self, id: TextId) -> Result<LegislativeText, EngineError> {
        self.execute(id, Command::OpenCmp).await
    }

    pub async fn resolve_cmp(&self, id: TextId, result: CmpResult) -> Result<LegislativeText, EngineError> {
        self.execute(id, Command::ResolveCmp { result }).await
    }

    pub async fn promulgate(&self, id: TextId) -> Result<LegislativeText, EngineError> {
        self.execute(id, Command::Promulgate).await
    }

    /// Dispatch a command from the committee-management service
    pub async fn handle_committee_command(
        &self,
        command: &CommitteeCommand,
    ) -> Result<LegislativeText, EngineError> {
        match (command.action, command.result) {
            (CommitteeAction::Convene, _) => self.convene_cmp(command.text_id).await,
            (CommitteeAction::Open, _) => self.open_cmp(command.text_id).await,
            (CommitteeAction::Resolve, Some(result)) => self.resolve_cmp(command.text_id, result).await,
            (CommitteeAction::Resolve, None) => Err(EngineError::InvalidCommand(
                "committee resolution is missing its result".to_string(),
            )),
        }
    }

    /// Run one command against the latest stored version of the text
    pub async fn execute(&self, id: TextId, command: Command) -> Result<LegislativeText, EngineError> {
        let correlation_id = generate_correlation_id();
        let text_id = id.to_string();
        let span = create_command_span(command.kind().as_str(), Some(&text_id), Some(&correlation_id));

        async {
            let Versioned { version, value: mut text } = self.load(id).await?;
            let records = machine::apply(&mut text, &command, Utc::now(), &self.rules)?;
            let new_version = self.repository.save(&text, version).await?;
            debug!(text_id = %id, version = new_version, hops = records.len(), "Text saved");

            for event in ShuttleEvent::from_records(&text, &records) {
                self.notifier.notify(&event).await;
            }
            Ok::<_, EngineError>(text)
        }
        .instrument(span)
        .await
    }

    /// Like [`execute`](Self::execute), but a lost version race is retried
    /// from fresh state. Any other error is returned at once.
    pub async fn execute_with_retry(&self, id: TextId, command: Command) -> Result<LegislativeText, EngineError> {
        let mut attempt = 0;
        loop {
            match self.execute(id, command.clone()).await {
                Err(e) if e.is_conflict() && attempt < self.max_conflict_retries => {
                    attempt += 1;
                    warn!(
                        text_id = %id,
                        command = %command.kind(),
                        attempt,
                        max_retries = self.max_conflict_retries,
                        "Concurrent modification, retrying"
                    );
                }
                other => return other,
            }
        }
    }

    pub async fn get_text(&self, id: TextId) -> Result<LegislativeText, EngineError> {
        Ok(self.load(id).await?.value)
    }

    pub async fn projection(&self, id: TextId) -> Result<TextProjection, EngineError> {
        let text = self.get_text(id).await?;
        Ok(TextProjection::of(&text, &self.rules))
    }

    /// Append-only transition log of a text
    pub async fn history(&self, id: TextId) -> Result<Vec<TransitionRecord>, EngineError> {
        Ok(self.get_text(id).await?.history().to_vec())
    }

    /// Projections of every stored text, oldest deposit first
    pub async fn list(&self) -> Result<Vec<TextProjection>, EngineError> {
        let texts = self.repository.list().await?;
        Ok(texts
            .iter()
            .map(|stored| TextProjection::of(&stored.value, &self.rules))
            .collect())
    }

    async fn load(&self, id: TextId) -> Result<Versioned<LegislativeText>, EngineError> {
        self.repository
            .load(id)
            .await?
            .ok_or(EngineError::TextNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shuttle::command::VoteOutcome;
    use crate::shuttle::events::{EventType, MockNotifier, NoopNotifier};
    use crate::shuttle::location::Location;
    use crate::storage::{MemoryRepository, RepositoryError};
    use async_trait::async_trait;
    use mockall::predicate::function;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn engine() -> ShuttleEngine {
        ShuttleEngine::new(Arc::new(MemoryRepository::new()), Arc::new(NoopNotifier))
    }

    async fn at_vote(engine: &ShuttleEngine, origin: Chamber) -> TextId {
        let text = engine.create(origin, "Budget 2025", "PL-2025-001", false).await.unwrap();
        for _ in 0..4 {
            engine.advance(text.id()).await.unwrap();
        }
        text.id()
    }

    #[tokio::test]
    async fn test_create_places_text_at_origin_depot() {
        let engine = engine();
        let text = engine.create(Chamber::Senate, "Water law", "PPL-12", true).await.unwrap();
        assert_eq!(text.current_location(), Location::SnDepot);
        let stored = engine.get_text(text.id()).await.unwrap();
        assert_eq!(stored, text);
    }

    #[tokio::test]
    async fn test_blank_title_is_invalid() {
        let engine = engine();
        let err = engine.create(Chamber::Assembly, "  ", "PL-1", false).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidText(_)));
        assert!(engine.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_text() {
        let engine = engine();
        let err = engine.advance(TextId::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::TextNotFound(_)));
    }

    #[tokio::test]
    async fn test_illegal_command_is_not_persisted() {
        let engine = engine();
        let text = engine.create(Chamber::Assembly, "Budget 2025", "PL-2025-001", false).await.unwrap();
        let err = engine.transmit(text.id()).await.unwrap_err();
        assert!(matches!(err, EngineError::IllegalTransition { location: Location::AnDepot, .. }));
        assert!(engine.history(text.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_vote_result_moves_to_adopted() {
        let engine = engine();
        let id = at_vote(&engine, Chamber::Assembly).await;
        let vote = VoteEvent {
            text_id: id,
            chamber: Chamber::Assembly,
            outcome: VoteOutcome::Adopted,
        };
        let text = engine.apply_vote_result(&vote).await.unwrap();
        assert_eq!(text.current_location(), Location::AnAdopted);

        let projection = engine.projection(id).await.unwrap();
        assert!(projection.can_transmit);
    }

    #[tokio::test]
    async fn test_transmit_notifies_once() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .with(function(|e: &ShuttleEvent| e.event_type == EventType::TextTransmitted))
            .times(1)
            .return_const(());
        notifier
            .expect_notify()
            .with(function(|e: &ShuttleEvent| e.event_type != EventType::TextTransmitted))
            .return_const(());

        let engine = ShuttleEngine::new(Arc::new(MemoryRepository::new()), Arc::new(notifier));
        let id = at_vote(&engine, Chamber::Assembly).await;
        engine
            .apply_vote_result(&VoteEvent {
                text_id: id,
                chamber: Chamber::Assembly,
                outcome: VoteOutcome::Adopted,
            })
            .await
            .unwrap();
        let text = engine.transmit(id).await.unwrap();
        assert_eq!(text.current_location(), Location::SnBureau);
        assert_eq!(text.shuttle_count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_command_sends_nothing() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .with(function(|e: &ShuttleEvent| e.event_type == EventType::TextDeposited))
            .times(1)
            .return_const(());

        let engine = ShuttleEngine::new(Arc::new(MemoryRepository::new()), Arc::new(notifier));
        let text = engine.create(Chamber::Assembly, "Budget 2025", "PL-2025-001", false).await.unwrap();
        assert!(engine.promulgate(text.id()).await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_without_result() {
        let engine = engine();
        let command = CommitteeCommand {
            text_id: TextId::new(),
            action: CommitteeAction::Resolve,
            result: None,
        };
        let err = engine.handle_committee_command(&command).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidCommand(_)));
        assert!(err.is_recoverable());
    }

    /// Lets another writer slip in before the first save
    struct RacingRepository {
        inner: MemoryRepository,
        raced: AtomicBool,
        always: bool,
    }

    #[async_trait]
    impl TextRepository for RacingRepository {
        async fn insert(&self, text: &LegislativeText) -> Result<u64, RepositoryError> {
            self.inner.insert(text).await
        }

        async fn load(&self, id: TextId) -> Result<Option<Versioned<LegislativeText>>, RepositoryError> {
            self.inner.load(id).await
        }

        async fn save(&self, text: &LegislativeText, expected_version: u64) -> Result<u64, RepositoryError> {
            if self.always || !self.raced.swap(true, Ordering::SeqCst) {
                let current = self.inner.load(text.id()).await?.unwrap();
                self.inner.save(&current.value, current.version).await?;
            }
            self.inner.save(text, expected_version).await
        }

        async fn list(&self) -> Result<Vec<Versioned<LegislativeText>>, RepositoryError> {
            self.inner.list().await
        }
    }

    #[tokio::test]
    async fn test_lost_race_is_a_conflict() {
        let repository = RacingRepository {
            inner: MemoryRepository::new(),
            raced: AtomicBool::new(true),
            always: true,
        };
        let engine = ShuttleEngine::new(Arc::new(repository), Arc::new(NoopNotifier)).with_max_conflict_retries(2);
        let text = engine.create(Chamber::Assembly, "Budget 2025", "PL-2025-001", false).await.unwrap();
        let err = engine.advance(text.id()).await.unwrap_err();
        assert!(matches!(err, EngineError::ConcurrentModification { .. }));
        assert_eq!(engine.get_text(text.id()).await.unwrap().current_location(), Location::AnDepot);

        let err = engine.execute_with_retry(text.id(), Command::Advance).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_retry_recovers_from_one_lost_race() {
        let repository = RacingRepository {
            inner: MemoryRepository::new(),
            raced: AtomicBool::new(false),
            always: false,
        };
        let text = LegislativeText::deposit(Chamber::Assembly, "Budget 2025", "PL-2025-001", false, Utc::now()).unwrap();
        repository.inner.insert(&text).await.unwrap();
        let engine = ShuttleEngine::new(Arc::new(repository), Arc::new(NoopNotifier));

        let text = engine.execute_with_retry(text.id(), Command::Advance).await.unwrap();
        assert_eq!(text.current_location(), Location::AnBureau);
        assert_eq!(engine.history(text.id()).await.unwrap().len(), 1);
    }
}
