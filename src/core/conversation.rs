//! Conversation state machine
//!
//! The state machine is a pure function: given a session, one raw answer and
//! the conversation context, it returns the next session and what to say
//! back. It performs no I/O, so every path is testable with plain values.
//!
//! # State Order
//!
//! ```text
//! Price → [ManualRate] → Engine → Year → [Delivery → Freight → Broker] → Done
//!   └───────────────── cancel (from any state) ──────────────────────→ Cancelled
//! ```
//!
//! - `ManualRate` is visited only when the session started without a rate.
//! - The logistics questions are asked only when the context enables them.
//! - A rejected answer returns the session unchanged and re-asks the same
//!   question.

use crate::io::input::{parse_engine_cc, parse_positive, parse_year, MIN_MODEL_YEAR};
use crate::types::{ExchangeRate, InputError, RateSource, Session, SessionState};

/// Per-conversation parameters the transition depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationContext {
    /// Calendar year used for the year range and the age
    pub current_year: i32,

    /// Whether delivery, freight and broker fee are asked
    pub collect_logistics: bool,
}

/// A question the user is asked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Price,
    ManualRate,
    Engine,
    Year { min: i32, max: i32 },
    Delivery,
    Freight,
    Broker,
}

/// What the transport should do after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The answer was accepted; ask the next question
    Next(Prompt),

    /// The answer was rejected; explain and ask the same question again
    Retry { error: InputError, prompt: Prompt },

    /// Every answer is in; run the calculation
    Complete,

    /// The session was cancelled
    Cancelled,

    /// The session had already finished
    Closed,
}

/// Outcome of one transition
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub session: Session,
    pub reply: Reply,
}

/// Begin a conversation
///
/// # Arguments
///
/// * `rate` - The rate acquired at session start, or `None` when the user
///   must enter it after the price
pub fn start(rate: Option<ExchangeRate>) -> Transition {
    Transition {
        session: Session::new(rate),
        reply: Reply::Next(Prompt::Price),
    }
}

/// Cancel a conversation from any state
pub fn cancel(session: &Session) -> Transition {
    Transition {
        session: Session {
            state: SessionState::Cancelled,
            ..session.clone()
        },
        reply: Reply::Cancelled,
    }
}

/// Apply one raw answer to a session
///
/// This function is pure - given the same inputs, it always produces the same
/// outputs, with no I/O side effects.
///
/// # Returns
///
/// - `Reply::Next` with the advanced session when the answer is valid
/// - `Reply::Retry` with an identical copy of the session when it is not
/// - `Reply::Complete` when the accepted answer was the last one
/// - `Reply::Closed` for a session already in a terminal state
pub fn transition(session: &Session, input: &str, context: &ConversationContext) -> Transition {
    if session.state.is_terminal() {
        return Transition {
            session: session.clone(),
            reply: Reply::Closed,
        };
    }

    match accept(session, input, context) {
        Ok(next) => {
            let reply = match prompt_for(next.state, context) {
                Some(prompt) => Reply::Next(prompt),
                None => Reply::Complete,
            };
            Transition {
                session: next,
                reply,
            }
        }
        Err(error) => {
            // Non-terminal states always have a prompt.
            let prompt = prompt_for(session.state, context).unwrap_or(Prompt::Price);
            Transition {
                session: session.clone(),
                reply: Reply::Retry { error, prompt },
            }
        }
    }
}

/// The question asked in a state, `None` for terminal states
pub fn prompt_for(state: SessionState, context: &ConversationContext) -> Option<Prompt> {
    match state {
        SessionState::Price => Some(Prompt::Price),
        SessionState::ManualRate => Some(Prompt::ManualRate),
        SessionState::Engine => Some(Prompt::Engine),
        SessionState::Year => Some(Prompt::Year {
            min: MIN_MODEL_YEAR,
            max: context.current_year,
        }),
        SessionState::Delivery => Some(Prompt::Delivery),
        SessionState::Freight => Some(Prompt::Freight),
        SessionState::Broker => Some(Prompt::Broker),
        SessionState::Done | SessionState::Cancelled => None,
    }
}

fn accept(
    session: &Session,
    input: &str,
    context: &ConversationContext,
) -> Result<Session, InputError> {
    let mut next = session.clone();

    match session.state {
        SessionState::Price => {
            next.price_yen = Some(parse_positive(input, "price")?);
            next.state = if next.rate.is_some() {
                SessionState::Engine
            } else {
                SessionState::ManualRate
            };
        }
        SessionState::ManualRate => {
            let value = parse_positive(input, "rate")?;
            next.rate = Some(ExchangeRate {
                value,
                source: RateSource::Manual,
            });
            next.state = SessionState::Engine;
        }
        SessionState::Engine => {
            next.engine_cc = Some(parse_engine_cc(input)?);
            next.state = SessionState::Year;
        }
        SessionState::Year => {
            let year = parse_year(input, context.current_year)?;
            next.year = Some(year);
            // parse_year guarantees year <= current_year
            next.age = Some(context.current_year.abs_diff(year));
            next.state = if context.collect_logistics {
                SessionState::Delivery
            } else {
                SessionState::Done
            };
        }
        SessionState::Delivery => {
            next.delivery = Some(parse_positive(input, "delivery")?);
            next.state = SessionState::Freight;
        }
        SessionState::Freight => {
            next.freight = Some(parse_positive(input, "freight")?);
            next.state = SessionState::Broker;
        }
        SessionState::Broker => {
            next.broker_fee = Some(parse_positive(input, "broker fee")?);
            next.state = SessionState::Done;
        }
        SessionState::Done | SessionState::Cancelled => return Err(InputError::SessionClosed),
    }

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    const FULL: ConversationContext = ConversationContext {
        current_year: 2026,
        collect_logistics: true,
    };

    const SHORT: ConversationContext = ConversationContext {
        current_year: 2026,
        collect_logistics: false,
    };

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn fetched_rate() -> ExchangeRate {
        ExchangeRate::new(dec("0.62"), RateSource::Fetched).unwrap()
    }

    /// Feed answers one by one, asserting each is accepted
    fn run(mut session: Session, answers: &[&str], context: &ConversationContext) -> Session {
        for answer in answers {
            let step = transition(&session, answer, context);
            assert!(
                !matches!(step.reply, Reply::Retry { .. }),
                "answer {answer:?} rejected: {:?}",
                step.reply
            );
            session = step.session;
        }
        session
    }

    #[test]
    fn test_start_asks_for_price() {
        let step = start(Some(fetched_rate()));
        assert_eq!(step.session.state, SessionState::Price);
        assert_eq!(step.reply, Reply::Next(Prompt::Price));
    }

    #[test]
    fn test_full_sequence_with_fetched_rate() {
        let context = FULL;
        let mut session = start(Some(fetched_rate())).session;
        let expected = [
            ("1 200 000", SessionState::Engine, Reply::Next(Prompt::Engine)),
            (
                "1798",
                SessionState::Year,
                Reply::Next(Prompt::Year { min: 1980, max: 2026 }),
            ),
            ("2024", SessionState::Delivery, Reply::Next(Prompt::Delivery)),
            ("25000", SessionState::Freight, Reply::Next(Prompt::Freight)),
            ("45000", SessionState::Broker, Reply::Next(Prompt::Broker)),
            ("15000", SessionState::Done, Reply::Complete),
        ];

        for (answer, state, reply) in expected {
            let step = transition(&session, answer, &context);
            assert_eq!(step.session.state, state, "after {answer}");
            assert_eq!(step.reply, reply, "after {answer}");
            session = step.session;
        }

        assert_eq!(session.price_yen, Some(dec("1200000")));
        assert_eq!(session.engine_cc, Some(1798));
        assert_eq!(session.year, Some(2024));
        assert_eq!(session.age, Some(2));
        assert_eq!(session.delivery, Some(dec("25000")));
        assert_eq!(session.freight, Some(dec("45000")));
        assert_eq!(session.broker_fee, Some(dec("15000")));
        assert_eq!(session.rate, Some(fetched_rate()));
    }

    #[test]
    fn test_manual_rate_branch_after_price() {
        let session = start(None).session;

        let step = transition(&session, "1200000", &FULL);
        assert_eq!(step.session.state, SessionState::ManualRate);
        assert_eq!(step.reply, Reply::Next(Prompt::ManualRate));

        let step = transition(&step.session, "0,6123", &FULL);
        assert_eq!(step.session.state, SessionState::Engine);
        assert_eq!(
            step.session.rate,
            Some(ExchangeRate {
                value: dec("0.6123"),
                source: RateSource::Manual
            })
        );
    }

    #[test]
    fn test_logistics_skipped_when_disabled() {
        let session = run(start(Some(fetched_rate())).session, &["1200000", "1.8"], &SHORT);

        let step = transition(&session, "2020", &SHORT);
        assert_eq!(step.session.state, SessionState::Done);
        assert_eq!(step.reply, Reply::Complete);
        assert_eq!(step.session.age, Some(6));
        assert_eq!(step.session.delivery, None);
    }

    #[rstest]
    #[case::price_text(&[], "abc")]
    #[case::price_zero(&[], "0")]
    #[case::manual_rate_negative(&["1200000"], "-0.5")]
    #[case::engine_too_small(&["1200000", "0.62"], "40")]
    #[case::year_too_old(&["1200000", "0.62", "1798"], "1979")]
    #[case::year_future(&["1200000", "0.62", "1798"], "2027")]
    #[case::year_fraction(&["1200000", "0.62", "1798"], "2020.5")]
    #[case::delivery_zero(&["1200000", "0.62", "1798", "2024"], "0")]
    #[case::freight_text(&["1200000", "0.62", "1798", "2024", "25000"], "lots")]
    #[case::broker_negative(&["1200000", "0.62", "1798", "2024", "25000", "45000"], "-1")]
    fn test_invalid_answer_leaves_session_identical(
        #[case] accepted: &[&str],
        #[case] invalid: &str,
    ) {
        let session = run(start(None).session, accepted, &FULL);

        let step = transition(&session, invalid, &FULL);

        assert_eq!(step.session, session);
        match step.reply {
            Reply::Retry { prompt, .. } => {
                assert_eq!(Some(prompt), prompt_for(session.state, &FULL))
            }
            other => panic!("expected retry, got {other:?}"),
        }
    }

    #[test]
    fn test_year_boundaries_and_age() {
        let session = run(start(Some(fetched_rate())).session, &["1000000", "1500"], &FULL);

        for (answer, age) in [("1980", 46), ("2026", 0), ("2023", 3)] {
            let step = transition(&session, answer, &FULL);
            assert_eq!(step.session.age, Some(age), "year {answer}");
        }
    }

    #[rstest]
    #[case(&[])]
    #[case(&["1200000"])]
    #[case(&["1200000", "0.62", "1798"])]
    #[case(&["1200000", "0.62", "1798", "2024", "25000", "45000"])]
    fn test_cancel_from_any_state(#[case] accepted: &[&str]) {
        let session = run(start(None).session, accepted, &FULL);

        let step = cancel(&session);
        assert_eq!(step.session.state, SessionState::Cancelled);
        assert_eq!(step.reply, Reply::Cancelled);

        let after = transition(&step.session, "2024", &FULL);
        assert_eq!(after.reply, Reply::Closed);
        assert_eq!(after.session, step.session);
    }

    #[test]
    fn test_done_session_is_closed() {
        let session = run(
            start(Some(fetched_rate())).session,
            &["1200000", "1798", "2024"],
            &SHORT,
        );
        assert_eq!(session.state, SessionState::Done);
        assert_eq!(transition(&session, "1", &SHORT).reply, Reply::Closed);
    }
}
