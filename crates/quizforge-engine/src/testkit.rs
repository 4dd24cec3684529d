//! Synchronous harness for driving a [`Room`] through the dispatcher
//! without the actor, channels, or real time.
//!
//! Time is a plain [`Instant`] the test advances by hand, the RNG is
//! seeded, and everything the room emits lands in the rig's [`Outbox`]
//! for inspection. Alarms never fire on their own; tests take the
//! request out of the outbox and feed it back through [`Rig::alarm`].

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use quizforge_protocol::{
    AnswerPayload, GameMode, Player, PlayerId, Question, Recipient, Reject, RoomPin, ServerEvent,
};
use quizforge_scoring::StandardScoring;

use crate::config::GameSettings;
use crate::dispatch::Dispatch;
use crate::outbox::{AlarmRequest, Outbox};
use crate::room::Room;
use crate::timer::Alarm;

pub struct Rig {
    pub room: Room,
    pub scoring: StandardScoring,
    pub rng: StdRng,
    pub outbox: Outbox,
    pub now: Instant,
}

impl Rig {
    pub fn new(mode: GameMode, questions: Vec<Question>) -> Self {
        Self::with_settings(GameSettings::for_mode(mode), questions)
    }

    pub fn with_settings(settings: GameSettings, questions: Vec<Question>) -> Self {
        Self {
            room: Room::new(RoomPin::new("123456"), settings, questions),
            scoring: StandardScoring,
            rng: StdRng::seed_from_u64(7),
            outbox: Outbox::default(),
            now: Instant::now(),
        }
    }

    /// Adds one player per nickname, ids 1, 2, 3... in order.
    pub fn seat(&mut self, nicknames: &[&str]) {
        for (i, nickname) in nicknames.iter().enumerate() {
            self.room
                .add_player(Player::new(PlayerId(i as u64 + 1), *nickname, ""));
        }
    }

    /// Moves the rig's clock forward. Nothing fires; alarms are
    /// delivered explicitly through [`Rig::alarm`].
    pub fn tick(&mut self, secs: u64) {
        self.now += Duration::from_secs(secs);
    }

    /// Runs one closure against a freshly assembled dispatcher.
    pub fn run<R>(&mut self, f: impl FnOnce(&mut Dispatch<'_>) -> R) -> R {
        let mut cx = Dispatch {
            room: &mut self.room,
            scoring: &self.scoring,
            rng: &mut self.rng,
            outbox: &mut self.outbox,
            now: self.now,
        };
        f(&mut cx)
    }

    pub fn start(&mut self) -> Result<(), Reject> {
        self.run(|cx| cx.start_game())
    }

    pub fn answer(&mut self, id: u64, answer: AnswerPayload) {
        self.run(|cx| cx.player_answer(PlayerId(id), answer));
    }

    pub fn advance(&mut self) {
        self.run(|cx| cx.advance());
    }

    /// Closes the current question as the timeout path would.
    pub fn end(&mut self) {
        self.run(|cx| cx.question_end());
    }

    pub fn alarm(&mut self, alarm: Alarm, generation: u64) {
        self.run(|cx| cx.handle_alarm(alarm, generation));
    }

    /// Drains everything emitted since the last call.
    pub fn events(&mut self) -> Vec<(Recipient, ServerEvent)> {
        self.outbox.take_events()
    }

    /// Takes the pending alarm request, if any. Latest-wins, so call at
    /// the moment the test cares about.
    pub fn take_alarm(&mut self) -> Option<AlarmRequest> {
        self.outbox.take_alarm()
    }
}
