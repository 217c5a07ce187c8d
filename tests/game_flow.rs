use soupstone::bank::QuestionBank;
use soupstone::engine::{Inbound, TurnEngine};
use soupstone::types::GameConfig;
use std::io::Write;
use std::time::Duration;

fn config() -> GameConfig {
    GameConfig {
        session_timeout: Duration::from_secs(1000),
        max_questions: 5,
        bank_file: String::new(),
    }
}

fn from(sender: &str, text: &str) -> Inbound {
    Inbound {
        text: text.to_string(),
        sender_id: sender.to_string(),
        group_id: None,
        is_admin: false,
    }
}

/// End-to-end flow over the fallback heuristics: start a puzzle, burn
/// through the question budget, and watch the session terminate itself.
#[tokio::test]
async fn test_full_game_to_exhaustion() {
    let (engine, _outbound) = TurnEngine::new(QuestionBank::builtin(), None, config());

    // 1. Start a specific puzzle
    let reply = engine.handle(from("alice", "start 001")).await;
    assert_eq!(reply.texts.len(), 2, "rules preamble plus intro");
    assert!(reply.texts[0].contains("How to play"));
    assert!(reply.texts[1].contains("Puzzle #001"));

    // 2. A second start is refused while the game runs
    let reply = engine.handle(from("alice", "start 002")).await;
    assert!(reply.texts[0].contains("already have a puzzle"));

    // 3. Ask questions until the budget runs out
    for i in 1..=5u32 {
        let reply = engine.handle(from("alice", "ask was it night")).await;
        assert!(reply.texts[0].contains(&format!("Question {}", i)));
        assert!(reply.texts[0].contains(&format!("Remaining: {}", 5 - i)));
        assert!(!reply.session_ended);
    }

    // 4. The next question exceeds the budget and ends the game
    let reply = engine.handle(from("alice", "ask was it cold")).await;
    assert!(reply.session_ended);
    assert!(reply.texts[0].contains("all 5 questions used"));
    assert!(reply.texts[0].contains("lighthouse keeper"));

    // 5. The session is gone
    let reply = engine.handle(from("alice", "ask anything")).await;
    assert!(reply.texts[0].contains("No puzzle is in progress"));
    assert!(engine.store().is_empty().await);
}

/// Two senders play independent games at the same time.
#[tokio::test]
async fn test_parallel_sessions_do_not_interfere() {
    let (engine, _outbound) = TurnEngine::new(QuestionBank::builtin(), None, config());

    engine.handle(from("alice", "start 001")).await;
    engine.handle(from("bob", "start 002")).await;
    assert_eq!(engine.store().len().await, 2);

    engine.handle(from("alice", "ask is he alive")).await;
    let reply = engine.handle(from("alice", "end")).await;
    assert!(reply.texts[0].contains("asked 1 questions"));

    // Bob's game is untouched by Alice's ending hers
    assert_eq!(engine.store().len().await, 1);
    let reply = engine.handle(from("bob", "ask was it soup")).await;
    assert!(reply.texts[0].contains("Question 1"));
    engine.handle(from("bob", "abort")).await;
    assert!(engine.store().is_empty().await);
}

/// Sessions left idle are reaped by the inactivity timer and their timeout
/// summary is delivered out of band.
#[tokio::test]
async fn test_idle_sessions_are_reaped() {
    let config = GameConfig {
        session_timeout: Duration::from_millis(40),
        ..config()
    };
    let (engine, mut outbound) = TurnEngine::new(QuestionBank::builtin(), None, config);

    engine.handle(from("alice", "start 001")).await;
    engine.handle(from("bob", "start 002")).await;

    tokio::time::sleep(Duration::from_millis(150)).await;

    let mut reaped = Vec::new();
    while let Ok(message) = outbound.try_recv() {
        assert!(message.text.contains("Time's up"));
        reaped.push(message.session_key);
    }
    reaped.sort();
    assert_eq!(reaped, vec!["alice".to_string(), "bob".to_string()]);
    assert!(engine.store().is_empty().await);
}

/// A bank file on disk drives the whole flow, including `list` and `detail`.
#[tokio::test]
async fn test_game_from_bank_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        "id: 7\n\
         title: The Silent Orchestra\n\
         difficulty: 2\n\
         tags: music, night\n\
         story: The orchestra played all night, yet nobody heard a note.\n\
         solution: The concert hall had burned down years ago. The orchestra was a recording played in an empty field for an anniversary nobody attended.\n\
         ---\n\
         id: 8\n\
         story: A man buys the same newspaper twice every day.\n\
         solution: He wraps fish with the first copy and reads the second.\n"
    )
    .expect("write bank");

    let bank = QuestionBank::load_file(file.path().to_str().expect("utf-8 path"));
    assert_eq!(bank.len(), 2);

    let (engine, _outbound) = TurnEngine::new(bank, None, config());

    let reply = engine.handle(from("alice", "list")).await;
    assert!(reply.texts[0].contains("The Silent Orchestra"));
    assert!(reply.texts[0].contains("Puzzle #008"));

    let reply = engine.handle(from("alice", "detail 7")).await;
    assert!(reply.texts[0].contains("nobody heard a note"));
    assert!(!reply.texts[0].contains("burned down"));

    let reply = engine.handle(from("alice", "start 7")).await;
    assert!(reply.texts[1].contains("Puzzle #007 - The Silent Orchestra"));
    assert!(reply.texts[1].contains("★★"));

    // Swap moves to the only other record and resets the count
    engine.handle(from("alice", "ask was it outdoors")).await;
    let reply = engine.handle(from("alice", "swap")).await;
    assert!(reply.texts[0].contains("Puzzle #008"));
    assert!(reply.texts[0].contains("question count is reset"));

    let reply = engine.handle(from("alice", "end")).await;
    assert!(reply.texts[0].contains("wraps fish"));
}
