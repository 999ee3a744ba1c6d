// End-to-end procedures driven through the engine with in-memory storage

use std::sync::Arc;

use navette::shuttle::phase::PhaseStatus;
use navette::shuttle::{
    phase_ordinal, Chamber, CmpResult, Command, CommitteeAction, CommitteeCommand, EngineError, EventType,
    LegislativeText, Location, LocationGraph, NoopNotifier, Phase, ShuttleEngine, TextId, VoteEvent, VoteOutcome,
};
use navette::storage::MemoryRepository;
use navette::NavetteConfig;

fn engine() -> ShuttleEngine {
    ShuttleEngine::new(Arc::new(MemoryRepository::new()), Arc::new(NoopNotifier))
}

async fn deposit(engine: &ShuttleEngine, origin: Chamber) -> TextId {
    engine
        .create(origin, "Budget 2025", "PL-2025-001", true)
        .await
        .unwrap()
        .id()
}

/// Advance from the depot or bureau up to the chamber's vote
async fn advance_to_vote(engine: &ShuttleEngine, id: TextId) {
    loop {
        let text = engine.get_text(id).await.unwrap();
        if matches!(text.current_location(), Location::AnVote | Location::SnVote) {
            return;
        }
        engine.advance(id).await.unwrap();
    }
}

async fn vote(engine: &ShuttleEngine, id: TextId, chamber: Chamber, outcome: VoteOutcome) -> LegislativeText {
    engine
        .apply_vote_result(&VoteEvent {
            text_id: id,
            chamber,
            outcome,
        })
        .await
        .unwrap()
}

/// Assembly adopts, Senate amends: the chambers now disagree
async fn diverging_text(engine: &ShuttleEngine) -> TextId {
    let id = deposit(engine, Chamber::Assembly).await;
    advance_to_vote(engine, id).await;
    vote(engine, id, Chamber::Assembly, VoteOutcome::Adopted).await;
    engine.transmit(id).await.unwrap();
    advance_to_vote(engine, id).await;
    let text = vote(engine, id, Chamber::Senate, VoteOutcome::Amended).await;
    assert_eq!(text.current_location(), Location::SnAdopted);
    assert!(text.is_divergent());
    id
}

fn assert_history_chains(text: &LegislativeText) {
    let graph = LocationGraph::new();
    let history = text.history();
    for (i, record) in history.iter().enumerate() {
        assert_eq!(record.sequence, i as u64 + 1);
        assert!(graph.allows(record.from, record.to), "{} -> {} is not an edge", record.from, record.to);
        if let Some(next) = history.get(i + 1) {
            assert_eq!(record.to, next.from);
        }
    }
    if let Some(last) = history.last() {
        assert_eq!(last.to, text.current_location());
    }
}

#[tokio::test]
async fn deposit_starts_at_origin_depot() {
    let engine = engine();
    let text = engine
        .create(Chamber::Assembly, "Budget 2025", "PL-2025-001", true)
        .await
        .unwrap();
    assert_eq!(text.current_location(), Location::AnDepot);
    assert_eq!(text.shuttle_count(), 0);
    assert!(text.urgency());
}

#[tokio::test]
async fn first_reading_then_transmission_reaches_senate_bureau() {
    let engine = engine();
    let id = deposit(&engine, Chamber::Assembly).await;

    let mut visited = Vec::new();
    for _ in 0..4 {
        visited.push(engine.advance(id).await.unwrap().current_location());
    }
    assert_eq!(
        visited,
        vec![Location::AnBureau, Location::AnCommission, Location::AnPleniere, Location::AnVote]
    );

    let text = vote(&engine, id, Chamber::Assembly, VoteOutcome::Adopted).await;
    assert_eq!(text.current_location(), Location::AnAdopted);

    let text = engine.transmit(id).await.unwrap();
    assert_eq!(text.current_location(), Location::SnBureau);
    assert_eq!(text.shuttle_count(), 1);
    assert!(text.timestamps().transmitted_at.is_some());
    assert_history_chains(&text);
}

#[tokio::test]
async fn conforming_vote_skips_cmp() {
    let engine = engine();
    let id = deposit(&engine, Chamber::Assembly).await;
    advance_to_vote(&engine, id).await;
    vote(&engine, id, Chamber::Assembly, VoteOutcome::Adopted).await;
    engine.transmit(id).await.unwrap();
    advance_to_vote(&engine, id).await;

    let text = vote(&engine, id, Chamber::Senate, VoteOutcome::Adopted).await;
    assert_eq!(text.current_location(), Location::Adopted);
    assert!(text.timestamps().adopted_at.is_some());

    let projection = engine.projection(id).await.unwrap();
    let cmp = projection.phases.iter().find(|v| v.phase == Phase::Cmp).unwrap();
    assert_eq!(cmp.status, PhaseStatus::Skipped);
    assert_eq!(projection.phase, Phase::Promulgation);

    let text = engine.promulgate(id).await.unwrap();
    assert_eq!(text.current_location(), Location::Promulgated);
    assert_history_chains(&text);
}

#[tokio::test]
async fn cmp_failure_goes_straight_to_promulgation() {
    let engine = engine();
    let id = diverging_text(&engine).await;

    assert!(engine.projection(id).await.unwrap().can_convene_cmp);
    let text = engine.convene_cmp(id).await.unwrap();
    assert_eq!(text.current_location(), Location::CmpConvened);

    engine.open_cmp(id).await.unwrap();
    let text = engine.resolve_cmp(id, CmpResult::Failure).await.unwrap();
    assert_eq!(text.current_location(), Location::FinalAn);

    let text = engine.promulgate(id).await.unwrap();
    assert_eq!(text.current_location(), Location::Promulgated);
    assert!(!text.history().iter().any(|r| r.to == Location::FinalSn));
    assert!(text.timestamps().is_ordered());
    assert_history_chains(&text);
}

#[tokio::test]
async fn second_promulgation_is_terminal() {
    let engine = engine();
    let id = diverging_text(&engine).await;
    engine.convene_cmp(id).await.unwrap();
    engine.open_cmp(id).await.unwrap();
    engine.resolve_cmp(id, CmpResult::Failure).await.unwrap();
    engine.promulgate(id).await.unwrap();

    let err = engine.promulgate(id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::TerminalStateViolation {
            location: Location::Promulgated,
            ..
        }
    ));
}

#[tokio::test]
async fn cmp_agreement_requires_final_senate_reading() {
    let engine = engine();
    let id = diverging_text(&engine).await;
    engine.convene_cmp(id).await.unwrap();
    engine.open_cmp(id).await.unwrap();
    let text = engine.resolve_cmp(id, CmpResult::Agreement).await.unwrap();
    assert_eq!(text.current_location(), Location::FinalAn);

    let err = engine.promulgate(id).await.unwrap_err();
    assert!(matches!(err, EngineError::IllegalTransition { location: Location::FinalAn, .. }));

    let text = engine.advance(id).await.unwrap();
    assert_eq!(text.current_location(), Location::FinalSn);
    let text = engine.promulgate(id).await.unwrap();
    assert_eq!(text.current_location(), Location::Promulgated);
}

#[tokio::test]
async fn committee_commands_drive_the_committee() {
    let engine = engine();
    let id = diverging_text(&engine).await;
    for (action, result) in [
        (CommitteeAction::Convene, None),
        (CommitteeAction::Open, None),
        (CommitteeAction::Resolve, Some(CmpResult::Agreement)),
    ] {
        engine
            .handle_committee_command(&CommitteeCommand { text_id: id, action, result })
            .await
            .unwrap();
    }
    let text = engine.get_text(id).await.unwrap();
    assert_eq!(text.current_location(), Location::FinalAn);
    assert_eq!(text.cmp().and_then(|c| c.result), Some(CmpResult::Agreement));
}

#[tokio::test]
async fn cmp_before_second_reading_is_premature() {
    let engine = engine();
    let id = deposit(&engine, Chamber::Assembly).await;
    advance_to_vote(&engine, id).await;
    vote(&engine, id, Chamber::Assembly, VoteOutcome::Amended).await;

    let err = engine.convene_cmp(id).await.unwrap_err();
    assert!(matches!(err, EngineError::PrematureCmp { .. }));
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn vote_from_wrong_chamber_is_illegal() {
    let engine = engine();
    let id = deposit(&engine, Chamber::Assembly).await;
    advance_to_vote(&engine, id).await;

    let err = engine
        .apply_vote_result(&VoteEvent {
            text_id: id,
            chamber: Chamber::Senate,
            outcome: VoteOutcome::Adopted,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::IllegalTransition { location: Location::AnVote, .. }));
    assert_eq!(engine.history(id).await.unwrap().len(), 4);
}

#[tokio::test]
async fn rejection_closes_the_procedure() {
    let engine = engine();
    let id = deposit(&engine, Chamber::Senate).await;
    advance_to_vote(&engine, id).await;
    let text = vote(&engine, id, Chamber::Senate, VoteOutcome::Rejected).await;
    assert_eq!(text.current_location(), Location::SnRejected);

    let err = engine.advance(id).await.unwrap_err();
    assert!(matches!(err, EngineError::TerminalStateViolation { .. }));
    assert!(engine.projection(id).await.unwrap().is_terminal);
}

#[tokio::test]
async fn multi_round_shuttle_counts_every_transmission() {
    let engine = engine();
    let id = deposit(&engine, Chamber::Assembly).await;

    let mut readings = Vec::new();
    let rounds = [
        (Chamber::Assembly, VoteOutcome::Adopted),
        (Chamber::Senate, VoteOutcome::Amended),
        (Chamber::Assembly, VoteOutcome::Amended),
    ];
    for (n, (chamber, outcome)) in rounds.into_iter().enumerate() {
        advance_to_vote(&engine, id).await;
        readings.push(engine.get_text(id).await.unwrap().reading_number());
        vote(&engine, id, chamber, outcome).await;
        let text = engine.transmit(id).await.unwrap();
        assert_eq!(text.shuttle_count(), n as u32 + 1);
    }

    let text = engine.get_text(id).await.unwrap();
    assert_eq!(text.current_location(), Location::SnBureau);
    assert_eq!(text.shuttle_count(), 3);
    assert_eq!(text.reading_number(), 3);
    assert_eq!(readings, vec![1, 1, 2]);
    assert_history_chains(&text);
}

#[tokio::test]
async fn transmit_is_legal_only_from_adopted() {
    let engine = engine();
    let id = deposit(&engine, Chamber::Assembly).await;

    for _ in 0..4 {
        let location = engine.get_text(id).await.unwrap().current_location();
        let err = engine.transmit(id).await.unwrap_err();
        assert!(matches!(err, EngineError::IllegalTransition { location: l, .. } if l == location));
        engine.advance(id).await.unwrap();
    }
    let err = engine.transmit(id).await.unwrap_err();
    assert!(matches!(err, EngineError::IllegalTransition { location: Location::AnVote, .. }));

    vote(&engine, id, Chamber::Assembly, VoteOutcome::Adopted).await;
    assert!(engine.transmit(id).await.is_ok());
}

#[tokio::test]
async fn every_command_after_promulgation_is_terminal() {
    let engine = engine();
    let id = diverging_text(&engine).await;
    engine.convene_cmp(id).await.unwrap();
    engine.open_cmp(id).await.unwrap();
    engine.resolve_cmp(id, CmpResult::Failure).await.unwrap();
    engine.promulgate(id).await.unwrap();

    let commands = [
        Command::Advance,
        Command::Vote {
            chamber: Chamber::Assembly,
            outcome: VoteOutcome::Adopted,
        },
        Command::Transmit,
        Command::ConveneCmp,
        Command::OpenCmp,
        Command::ResolveCmp {
            result: CmpResult::Agreement,
        },
        Command::Promulgate,
    ];
    for command in commands {
        let err = engine.execute(id, command).await.unwrap_err();
        assert!(matches!(err, EngineError::TerminalStateViolation { .. }));
    }
}

#[tokio::test]
async fn serialization_round_trip_preserves_the_aggregate() {
    let engine = engine();
    let id = diverging_text(&engine).await;
    engine.convene_cmp(id).await.unwrap();
    let text = engine.get_text(id).await.unwrap();

    let json = serde_json::to_string(&text).unwrap();
    let back: LegislativeText = serde_json::from_str(&json).unwrap();
    assert_eq!(back, text);
    assert_eq!(back.current_location(), Location::CmpConvened);
    assert_eq!(back.shuttle_count(), text.shuttle_count());
    assert_eq!(back.reading_number(), text.reading_number());
    assert_eq!(back.timestamps(), text.timestamps());
    assert_eq!(serde_json::to_string(&back).unwrap(), json);
}

#[test]
fn every_location_has_a_phase() {
    for location in Location::ALL {
        for origin in [Chamber::Assembly, Chamber::Senate] {
            for shuttles in 0..3 {
                assert!(phase_ordinal(location, origin, shuttles) <= 5);
            }
        }
    }
}

#[test]
fn unknown_stored_location_is_fatal() {
    let err = "AN_LIMBO".parse::<Location>().unwrap_err();
    assert!(matches!(err, EngineError::UnknownLocation(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn broadcast_subscribers_see_milestones() {
    let config = NavetteConfig::default();
    let (engine, notifier) =
        navette::cli::commands::broadcasting_engine(Arc::new(MemoryRepository::new()), &config);
    let mut events = notifier.subscribe();

    let id = deposit(&engine, Chamber::Assembly).await;
    advance_to_vote(&engine, id).await;
    vote(&engine, id, Chamber::Assembly, VoteOutcome::Adopted).await;
    engine.transmit(id).await.unwrap();

    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        kinds.push(event.event_type);
    }
    assert_eq!(kinds.first(), Some(&EventType::TextDeposited));
    assert_eq!(kinds.last(), Some(&EventType::TextTransmitted));
    assert!(kinds.contains(&EventType::VoteRecorded));
}
