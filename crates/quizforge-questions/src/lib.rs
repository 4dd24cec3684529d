//! Question-type handlers for Quizforge.
//!
//! Six behaviors behind one trait: single choice, multi choice, matching,
//! ordering, free text, and boss fights. The room engine never branches on
//! a question kind; it resolves [`handler_for`] and talks to the
//! [`QuestionHandler`] trait. The two wire aliases (`match_plus`,
//! `order_plus`) resolve to the same handler objects as their canonical
//! kinds, which keeps authoring and evaluation in lockstep by
//! construction.

mod boss;
mod choice;
mod handler;
mod matching;
mod ordering;
mod registry;
mod typed;

pub use handler::{
    AnswerTiming, HandlerMeta, QuestionHandler, Verdict,
};
pub use registry::handler_for;
