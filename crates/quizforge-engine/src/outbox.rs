//! Collects the side effects of one dispatched command.
//!
//! Game logic never touches channels. It records who should hear what in
//! an [`Outbox`], plus at most one deadline to schedule, and the actor
//! drains both after the command returns. Tests drain the same outbox
//! directly, so every line of game logic runs without a runtime.

use std::time::Duration;

use quizforge_protocol::{PlayerId, Recipient, Reject, ServerEvent};

use crate::timer::Alarm;

/// A deadline the actor should schedule after this command.
#[derive(Debug, Clone, Copy)]
pub struct AlarmRequest {
    pub alarm: Alarm,
    pub generation: u64,
    pub after: Duration,
}

/// Pending events and the pending alarm for one command.
#[derive(Debug, Default)]
pub struct Outbox {
    events: Vec<(Recipient, ServerEvent)>,
    alarm: Option<AlarmRequest>,
}

impl Outbox {
    pub fn push(&mut self, recipient: Recipient, event: ServerEvent) {
        self.events.push((recipient, event));
    }

    pub fn broadcast(&mut self, event: ServerEvent) {
        self.push(Recipient::All, event);
    }

    /// Tells one player their action was refused.
    pub fn reject(&mut self, player: PlayerId, reject: Reject) {
        self.push(Recipient::Player(player), ServerEvent::RoomError(reject));
    }

    /// Replaces any previously requested alarm. One command arms at most
    /// one deadline, and the latest request wins.
    pub fn schedule(&mut self, alarm: Alarm, generation: u64, after: Duration) {
        self.alarm = Some(AlarmRequest {
            alarm,
            generation,
            after,
        });
    }

    pub fn take_events(&mut self) -> Vec<(Recipient, ServerEvent)> {
        std::mem::take(&mut self.events)
    }

    pub fn take_alarm(&mut self) -> Option<AlarmRequest> {
        self.alarm.take()
    }

    pub fn events(&self) -> &[(Recipient, ServerEvent)] {
        &self.events
    }

    pub fn alarm(&self) -> Option<&AlarmRequest> {
        self.alarm.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_events_drains() {
        let mut outbox = Outbox::default();
        outbox.broadcast(ServerEvent::GameStart(
            quizforge_protocol::GameStartBroadcast { total_questions: 3 },
        ));
        assert_eq!(outbox.events().len(), 1);
        assert_eq!(outbox.take_events().len(), 1);
        assert!(outbox.events().is_empty());
    }

    #[test]
    fn test_schedule_keeps_latest_alarm() {
        let mut outbox = Outbox::default();
        outbox.schedule(Alarm::QuestionTimeout, 1, Duration::from_secs(20));
        outbox.schedule(Alarm::QuestionTimeout, 2, Duration::from_secs(30));
        let alarm = outbox.take_alarm().unwrap();
        assert_eq!(alarm.generation, 2);
        assert_eq!(alarm.after, Duration::from_secs(30));
        assert!(outbox.take_alarm().is_none());
    }
}
