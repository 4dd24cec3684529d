//! A scripted quiz night, start to podium.
//!
//! Creates one classic room, seats three players, and plays a
//! three-question game against the engine. Only the host seat is wired
//! to a screen: every event it receives is printed as the JSON a real
//! client would read off the socket.
//!
//! ```text
//! RUST_LOG=quizforge_engine=debug cargo run -p quiz-night
//! ```

use std::error::Error;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use quizforge_engine::{GameSettings, RoomRegistry};
use quizforge_protocol::{
    AnswerPayload, Codec, GameMode, JsonCodec, MatchBoard, MatchPair, Player, PlayerId, Question,
    QuestionBroadcast, ServerEvent,
};

const HOST: PlayerId = PlayerId(1);
const BRUNO: PlayerId = PlayerId(2);
const CAROL: PlayerId = PlayerId(3);

fn quiz() -> Vec<Question> {
    vec![
        Question::single(
            "Which planet is closest to the sun?",
            vec!["Venus".into(), "Mercury".into(), "Mars".into()],
            1,
        ),
        Question::matching("Match the capital to its country", capitals()),
        Question::typed("Type the chemical symbol for gold", vec!["au".into()]),
    ]
}

fn capitals() -> Vec<MatchPair> {
    vec![
        MatchPair::new("Paris", "France"),
        MatchPair::new("Rome", "Italy"),
        MatchPair::new("Oslo", "Norway"),
    ]
}

// ---------------------------------------------------------------------------
// Host screen
// ---------------------------------------------------------------------------

fn print_event(codec: &JsonCodec, event: &ServerEvent) {
    match codec.encode(event) {
        Ok(bytes) => println!("<- {}", String::from_utf8_lossy(&bytes)),
        Err(err) => eprintln!("could not encode {}: {err}", event.name()),
    }
}

/// Reads and prints the next event on the host channel.
async fn read_event(
    rx: &mut mpsc::UnboundedReceiver<ServerEvent>,
    codec: &JsonCodec,
) -> Result<ServerEvent, Box<dyn Error>> {
    let event = timeout(Duration::from_secs(5), rx.recv())
        .await
        .map_err(|_| "the room went quiet")?
        .ok_or("the room closed the host channel")?;
    print_event(codec, &event);
    Ok(event)
}

/// Reads forward to the next question broadcast.
async fn next_question(
    rx: &mut mpsc::UnboundedReceiver<ServerEvent>,
    codec: &JsonCodec,
) -> Result<QuestionBroadcast, Box<dyn Error>> {
    loop {
        if let ServerEvent::Question(q) = read_event(rx, codec).await? {
            return Ok(q);
        }
    }
}

/// Reads forward to the named event.
async fn wait_for(
    rx: &mut mpsc::UnboundedReceiver<ServerEvent>,
    codec: &JsonCodec,
    name: &str,
) -> Result<ServerEvent, Box<dyn Error>> {
    loop {
        let event = read_event(rx, codec).await?;
        if event.name() == name {
            return Ok(event);
        }
    }
}

/// Lines up the shuffled right column against the authored pairs, the
/// way a player who knows the answers would.
fn solve_match_board(board: &MatchBoard) -> Vec<usize> {
    let truth = capitals();
    board
        .left
        .iter()
        .map(|left| {
            let want = truth
                .iter()
                .find(|p| &p.left == left)
                .map(|p| p.right.as_str())
                .unwrap_or_default();
            board
                .right
                .iter()
                .position(|r| r == want)
                .unwrap_or_default()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// The night itself
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let codec = JsonCodec;
    let registry = RoomRegistry::new();
    let (pin, room) = registry
        .create(GameSettings::for_mode(GameMode::Classic), quiz())
        .await;
    println!("room {pin} is open");

    // The host keeps a screen; the other two seats just play.
    let (host_tx, mut host) = mpsc::unbounded_channel();
    room.add_player(Player::new(HOST, "alice", "owl"), host_tx)
        .await?;
    for (id, nickname, avatar) in [(BRUNO, "bruno", "fox"), (CAROL, "carol", "bear")] {
        let (tx, _rx) = mpsc::unbounded_channel();
        room.add_player(Player::new(id, nickname, avatar), tx).await?;
    }

    if let Some(reject) = room.start().await? {
        eprintln!("could not start: {}", reject.message);
        return Ok(());
    }

    // Round one. Carol dawdles and pays for it in points.
    next_question(&mut host, &codec).await?;
    room.answer(HOST, AnswerPayload::Index(1)).await?;
    room.answer(BRUNO, AnswerPayload::Index(0)).await?;
    sleep(Duration::from_millis(1200)).await;
    room.answer(CAROL, AnswerPayload::Index(1)).await?;
    wait_for(&mut host, &codec, "question:end").await?;
    room.advance().await?;

    // Round two: the match board. Alice reads the shuffled columns off
    // the broadcast; the others guess.
    let q = next_question(&mut host, &codec).await?;
    let pairs = match &q.question.pairs {
        Some(board) => solve_match_board(board),
        None => Vec::new(),
    };
    room.answer(HOST, AnswerPayload::Pairs(pairs)).await?;
    room.answer(BRUNO, AnswerPayload::Pairs(vec![0, 1, 2])).await?;
    room.answer(CAROL, AnswerPayload::Pairs(vec![2, 1, 0])).await?;
    wait_for(&mut host, &codec, "question:end").await?;
    room.advance().await?;

    // Round three: free text, matched after normalization.
    next_question(&mut host, &codec).await?;
    room.answer(HOST, AnswerPayload::Text("Au".into())).await?;
    room.answer(BRUNO, AnswerPayload::Text("gold".into())).await?;
    room.answer(CAROL, AnswerPayload::Text("  AU ".into())).await?;
    wait_for(&mut host, &codec, "question:end").await?;

    // Advancing past the last question closes the night.
    room.advance().await?;
    let event = wait_for(&mut host, &codec, "game:over").await?;

    if let ServerEvent::GameOver(over) = event {
        println!();
        println!("podium for room {pin}:");
        for (place, row) in over.leaderboard.iter().enumerate() {
            println!(
                "  {}. {} with {} points",
                place + 1,
                row.nickname,
                row.total_score
            );
        }
    }

    registry.shutdown_all().await;
    Ok(())
}
