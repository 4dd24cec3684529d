//! XO Duel: tic-tac-toe between the first two players in join order.
//!
//! Start seats the duelists (X joins first), broadcasts the empty board
//! and takes over the flow: every legal move re-broadcasts the board as
//! a question payload, and a win or full board goes straight to game
//! over. Everyone past the first two seats spectates; their moves are
//! rejected.

use tracing::info;

use quizforge_protocol::{
    AnswerPayload, GameMode, GameOverBroadcast, GameStartBroadcast,
    PlayerId, QuestionKind, QuestionPayload, Reject, RejectCode,
    ServerEvent, XoOutcome, XoSeat, XoSnapshot, XoSymbol,
};

use crate::config::RoomState;
use crate::dispatch::Dispatch;
use crate::modes::{Flow, ModeRuntime, ModeState};

/// Rows, columns, diagonals of the 3x3 board, row-major cells.
const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug)]
pub struct XoState {
    pub board: [Option<XoSymbol>; 9],
    /// X seat first, O seat second.
    pub seats: [XoSeat; 2],
    /// Index into `seats` of whoever moves next.
    pub active_turn_index: usize,
    pub winner_id: Option<PlayerId>,
    pub draw: bool,
    pub winning_line: Option<[usize; 3]>,
}

impl XoState {
    fn snapshot(&self) -> XoSnapshot {
        XoSnapshot {
            board: self.board.to_vec(),
            players: self.seats.to_vec(),
            active_player: self.seats[self.active_turn_index].id,
        }
    }

    fn seat_of(&self, id: PlayerId) -> Option<usize> {
        self.seats.iter().position(|seat| seat.id == id)
    }
}

fn winning_line(
    board: &[Option<XoSymbol>; 9],
    symbol: XoSymbol,
) -> Option<[usize; 3]> {
    WIN_LINES
        .into_iter()
        .find(|line| line.iter().all(|&cell| board[cell] == Some(symbol)))
}

fn board_payload(state: &XoState) -> QuestionPayload {
    let mut payload =
        QuestionPayload::new(QuestionKind::Single, "Tic-tac-toe duel");
    payload.xo = Some(state.snapshot());
    payload
}

pub struct XoDuel;

impl ModeRuntime for XoDuel {
    fn mode(&self) -> GameMode {
        GameMode::XoDuel
    }

    fn on_game_start(&self, cx: &mut Dispatch<'_>) -> Result<Flow, Reject> {
        let duelists: Vec<XoSeat> = cx
            .room
            .connected()
            .take(2)
            .zip([XoSymbol::X, XoSymbol::O])
            .map(|(player, symbol)| XoSeat {
                id: player.id,
                nickname: player.nickname.clone(),
                symbol,
            })
            .collect();
        let Ok(seats) = <[XoSeat; 2]>::try_from(duelists) else {
            return Err(Reject::new(RejectCode::XoDuelNeedsTwoPlayers));
        };

        let state = XoState {
            board: [None; 9],
            seats,
            active_turn_index: 0,
            winner_id: None,
            draw: false,
            winning_line: None,
        };
        info!(
            room_pin = %cx.room.pin,
            x = %state.seats[0].id,
            o = %state.seats[1].id,
            "duel started"
        );
        let payload = board_payload(&state);
        cx.room.mode_state = ModeState::Xo(state);
        cx.room.state = RoomState::Question;
        cx.outbox
            .broadcast(ServerEvent::GameStart(GameStartBroadcast {
                total_questions: 1,
            }));
        cx.broadcast_payload(payload, 0, 1);
        Ok(Flow::Handled)
    }

    fn on_question_dispatch(
        &self,
        cx: &mut Dispatch<'_>,
        payload: &mut QuestionPayload,
    ) -> Flow {
        let _ = (cx, payload);
        Flow::Handled
    }

    fn on_player_answer(
        &self,
        cx: &mut Dispatch<'_>,
        player_id: PlayerId,
        answer: &AnswerPayload,
    ) -> Flow {
        enum Move {
            Refuse(RejectCode),
            Win(PlayerId),
            Draw,
            Continue(QuestionPayload),
        }

        let outcome = {
            let ModeState::Xo(state) = &mut cx.room.mode_state else {
                return Flow::Handled;
            };
            match state.seat_of(player_id) {
                None => Move::Refuse(RejectCode::XoDuelSpectator),
                Some(seat) if seat != state.active_turn_index => {
                    Move::Refuse(RejectCode::XoDuelNotYourTurn)
                }
                Some(seat) => match answer {
                    AnswerPayload::Cell(cell) if *cell < 9 => {
                        if state.board[*cell].is_some() {
                            Move::Refuse(RejectCode::XoDuelCellTaken)
                        } else {
                            let symbol = state.seats[seat].symbol;
                            state.board[*cell] = Some(symbol);
                            if let Some(line) =
                                winning_line(&state.board, symbol)
                            {
                                state.winner_id = Some(player_id);
                                state.winning_line = Some(line);
                                Move::Win(player_id)
                            } else if state
                                .board
                                .iter()
                                .all(Option::is_some)
                            {
                                state.draw = true;
                                Move::Draw
                            } else {
                                state.active_turn_index =
                                    1 - state.active_turn_index;
                                Move::Continue(board_payload(state))
                            }
                        }
                    }
                    _ => Move::Refuse(RejectCode::XoDuelInvalidCell),
                },
            }
        };

        match outcome {
            Move::Refuse(code) => {
                cx.outbox.reject(player_id, Reject::new(code));
            }
            Move::Win(winner) => {
                if let Some(player) = cx.room.player_mut(winner) {
                    player.score += 1;
                }
                info!(room_pin = %cx.room.pin, %winner, "duel won");
                cx.game_over();
            }
            Move::Draw => {
                info!(room_pin = %cx.room.pin, "duel drawn");
                cx.game_over();
            }
            Move::Continue(payload) => cx.broadcast_payload(payload, 0, 1),
        }
        Flow::Handled
    }

    fn on_game_over(
        &self,
        cx: &mut Dispatch<'_>,
        broadcast: &mut GameOverBroadcast,
    ) -> Flow {
        if let ModeState::Xo(state) = &cx.room.mode_state {
            broadcast.xo = Some(XoOutcome {
                winner_id: state.winner_id,
                draw: state.draw,
                winning_line: state.winning_line,
                board: state.board.to_vec(),
            });
        }
        Flow::Delegate
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::Rig;
    use quizforge_protocol::{Recipient, ServerEvent};

    fn duel_rig(nicknames: &[&str]) -> Rig {
        let mut rig = Rig::new(GameMode::XoDuel, vec![]);
        rig.seat(nicknames);
        rig
    }

    fn last_board(
        events: &[(Recipient, ServerEvent)],
    ) -> &XoSnapshot {
        let Some((_, ServerEvent::Question(q))) = events
            .iter()
            .rev()
            .find(|(_, e)| matches!(e, ServerEvent::Question(_)))
        else {
            panic!("no board broadcast in {events:?}");
        };
        q.question.xo.as_ref().unwrap()
    }

    fn reject_code(
        events: &[(Recipient, ServerEvent)],
    ) -> (Recipient, RejectCode) {
        let Some((recipient, ServerEvent::RoomError(reject))) = events
            .iter()
            .find(|(_, e)| matches!(e, ServerEvent::RoomError(_)))
        else {
            panic!("no rejection in {events:?}");
        };
        (*recipient, reject.code)
    }

    // =====================================================================
    // Seating
    // =====================================================================

    #[test]
    fn test_start_needs_two_connected_players() {
        let mut rig = duel_rig(&["ada"]);
        let reject = rig.start().unwrap_err();
        assert_eq!(reject.code, RejectCode::XoDuelNeedsTwoPlayers);
        assert_eq!(rig.room.state, RoomState::Lobby);
        assert!(rig.events().is_empty());
    }

    #[test]
    fn test_disconnected_players_do_not_take_seats() {
        let mut rig = duel_rig(&["ada", "bo"]);
        rig.room.mark_disconnected(PlayerId(2));
        let reject = rig.start().unwrap_err();
        assert_eq!(reject.code, RejectCode::XoDuelNeedsTwoPlayers);
    }

    #[test]
    fn test_start_seats_first_two_in_join_order() {
        let mut rig = duel_rig(&["ada", "bo", "cy"]);
        rig.start().unwrap();

        let events = rig.events();
        assert!(matches!(
            events[0],
            (
                Recipient::All,
                ServerEvent::GameStart(GameStartBroadcast {
                    total_questions: 1
                })
            )
        ));
        let board = last_board(&events);
        assert_eq!(board.players.len(), 2);
        assert_eq!(board.players[0].id, PlayerId(1));
        assert_eq!(board.players[0].symbol, XoSymbol::X);
        assert_eq!(board.players[1].id, PlayerId(2));
        assert_eq!(board.players[1].symbol, XoSymbol::O);
        assert_eq!(board.active_player, PlayerId(1));
        assert!(board.board.iter().all(Option::is_none));
    }

    #[test]
    fn test_spectator_moves_are_rejected() {
        let mut rig = duel_rig(&["ada", "bo", "cy"]);
        rig.start().unwrap();
        rig.events();

        rig.answer(3, AnswerPayload::Cell(0));
        let (recipient, code) = reject_code(&rig.events());
        assert_eq!(recipient, Recipient::Player(PlayerId(3)));
        assert_eq!(code, RejectCode::XoDuelSpectator);
    }

    // =====================================================================
    // Moving
    // =====================================================================

    #[test]
    fn test_legal_move_rebroadcasts_the_board() {
        let mut rig = duel_rig(&["ada", "bo"]);
        rig.start().unwrap();
        rig.events();

        rig.answer(1, AnswerPayload::Cell(4));
        let events = rig.events();
        let board = last_board(&events);
        assert_eq!(board.board[4], Some(XoSymbol::X));
        assert_eq!(board.active_player, PlayerId(2));
    }

    #[test]
    fn test_moving_out_of_turn_is_rejected() {
        let mut rig = duel_rig(&["ada", "bo"]);
        rig.start().unwrap();
        rig.events();

        rig.answer(2, AnswerPayload::Cell(0));
        let (recipient, code) = reject_code(&rig.events());
        assert_eq!(recipient, Recipient::Player(PlayerId(2)));
        assert_eq!(code, RejectCode::XoDuelNotYourTurn);
    }

    #[test]
    fn test_taken_cell_is_rejected() {
        let mut rig = duel_rig(&["ada", "bo"]);
        rig.start().unwrap();
        rig.answer(1, AnswerPayload::Cell(4));
        rig.events();

        rig.answer(2, AnswerPayload::Cell(4));
        let (_, code) = reject_code(&rig.events());
        assert_eq!(code, RejectCode::XoDuelCellTaken);
        // The turn does not burn on a rejected move.
        rig.answer(2, AnswerPayload::Cell(0));
        let board_events = rig.events();
        assert_eq!(last_board(&board_events).board[0], Some(XoSymbol::O));
    }

    #[test]
    fn test_out_of_range_or_malformed_moves_are_rejected() {
        let mut rig = duel_rig(&["ada", "bo"]);
        rig.start().unwrap();
        rig.events();

        rig.answer(1, AnswerPayload::Cell(9));
        let (_, code) = reject_code(&rig.events());
        assert_eq!(code, RejectCode::XoDuelInvalidCell);

        rig.answer(1, AnswerPayload::Index(0));
        let (_, code) = reject_code(&rig.events());
        assert_eq!(code, RejectCode::XoDuelInvalidCell);
    }

    // =====================================================================
    // Endings
    // =====================================================================

    #[test]
    fn test_three_in_a_row_wins_the_duel() {
        let mut rig = duel_rig(&["ada", "bo", "cy"]);
        rig.start().unwrap();
        for (player, cell) in [(1, 0), (2, 4), (1, 1), (2, 5), (1, 2)] {
            rig.answer(player, AnswerPayload::Cell(cell));
        }

        assert_eq!(rig.room.state, RoomState::Finished);
        assert_eq!(rig.room.player(PlayerId(1)).unwrap().score, 1);
        assert_eq!(rig.room.player(PlayerId(2)).unwrap().score, 0);

        let events = rig.events();
        let Some((Recipient::All, ServerEvent::GameOver(over))) = events
            .iter()
            .find(|(_, e)| matches!(e, ServerEvent::GameOver(_)))
        else {
            panic!("no game:over in {events:?}");
        };
        let xo = over.xo.as_ref().unwrap();
        assert_eq!(xo.winner_id, Some(PlayerId(1)));
        assert!(!xo.draw);
        assert_eq!(xo.winning_line, Some([0, 1, 2]));
        assert_eq!(xo.board[0], Some(XoSymbol::X));
        assert_eq!(over.leaderboard[0].id, PlayerId(1));
    }

    #[test]
    fn test_full_board_without_a_line_is_a_draw() {
        let mut rig = duel_rig(&["ada", "bo"]);
        rig.start().unwrap();
        let moves = [
            (1, 0),
            (2, 1),
            (1, 2),
            (2, 4),
            (1, 3),
            (2, 5),
            (1, 7),
            (2, 6),
            (1, 8),
        ];
        for (player, cell) in moves {
            rig.answer(player, AnswerPayload::Cell(cell));
        }

        assert_eq!(rig.room.state, RoomState::Finished);
        let events = rig.events();
        let Some((_, ServerEvent::GameOver(over))) = events
            .iter()
            .find(|(_, e)| matches!(e, ServerEvent::GameOver(_)))
        else {
            panic!("no game:over in {events:?}");
        };
        let xo = over.xo.as_ref().unwrap();
        assert!(xo.draw);
        assert_eq!(xo.winner_id, None);
        assert_eq!(xo.winning_line, None);
        assert!(xo.board.iter().all(Option::is_some));
    }

    #[test]
    fn test_moves_after_the_duel_ends_are_ignored() {
        let mut rig = duel_rig(&["ada", "bo"]);
        rig.start().unwrap();
        for (player, cell) in [(1, 0), (2, 4), (1, 1), (2, 5), (1, 2)] {
            rig.answer(player, AnswerPayload::Cell(cell));
        }
        rig.events();

        rig.answer(2, AnswerPayload::Cell(8));
        assert!(rig.events().is_empty());
    }

    // =====================================================================
    // Line detection
    // =====================================================================

    #[test]
    fn test_winning_line_finds_rows_columns_and_diagonals() {
        let mut board = [None; 9];
        board[0] = Some(XoSymbol::X);
        board[1] = Some(XoSymbol::X);
        board[2] = Some(XoSymbol::X);
        assert_eq!(winning_line(&board, XoSymbol::X), Some([0, 1, 2]));
        assert_eq!(winning_line(&board, XoSymbol::O), None);

        let mut board = [None; 9];
        board[2] = Some(XoSymbol::O);
        board[4] = Some(XoSymbol::O);
        board[6] = Some(XoSymbol::O);
        assert_eq!(winning_line(&board, XoSymbol::O), Some([2, 4, 6]));
    }

    #[test]
    fn test_mixed_line_is_not_a_win() {
        let mut board = [None; 9];
        board[0] = Some(XoSymbol::X);
        board[1] = Some(XoSymbol::O);
        board[2] = Some(XoSymbol::X);
        assert_eq!(winning_line(&board, XoSymbol::X), None);
    }
}
