//! The handler registry: a total map from question kind to handler.
//!
//! Handlers are stateless unit structs held in statics, so resolution is a
//! plain match and the alias guarantee is structural: `match` and
//! `match_plus` arms name the *same* static, which makes the returned
//! `&'static dyn QuestionHandler` pointer-identical for both. Authoring,
//! dispatch, and evaluation all resolve through this one function, so no
//! side of the system can disagree about what an alias means.

use quizforge_protocol::QuestionKind;

use crate::boss::BossHandler;
use crate::choice::{MultiChoice, SingleChoice};
use crate::handler::QuestionHandler;
use crate::matching::MatchHandler;
use crate::ordering::OrderHandler;
use crate::typed::TypedHandler;

static SINGLE: SingleChoice = SingleChoice;
static MULTI: MultiChoice = MultiChoice;
static MATCH: MatchHandler = MatchHandler;
static ORDER: OrderHandler = OrderHandler;
static TYPED: TypedHandler = TypedHandler;
static BOSS: BossHandler = BossHandler;

/// Resolves any question kind, alias or canonical, to its handler.
pub fn handler_for(kind: QuestionKind) -> &'static dyn QuestionHandler {
    match kind {
        QuestionKind::Single => &SINGLE,
        QuestionKind::Multi => &MULTI,
        QuestionKind::Match | QuestionKind::MatchPlus => &MATCH,
        QuestionKind::Order | QuestionKind::OrderPlus => &ORDER,
        QuestionKind::Typed => &TYPED,
        QuestionKind::Boss => &BOSS,
    }
}

// =========================================================================
// Tests
// =========================================================================
