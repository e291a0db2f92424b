//! Property-based tests for the router state machine
//!
//! These tests verify key invariants hold across arbitrary event sequences.

use super::*;
use crate::conversation::{Handoff, RequestId, Role, Turn};
use crate::registry::{ParticipantId, ParticipantSpec, Registry};
use crate::termination::TerminationEvaluator;
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

const PARTICIPANTS: usize = 4;

/// hub <-> {a, b}, b -> c, c terminal
fn test_context() -> RouterContext {
    let mut builder = Registry::builder();
    builder
        .register(ParticipantSpec::plain("hub", "route"), ["a", "b"])
        .unwrap()
        .register(ParticipantSpec::plain("a", "x"), ["hub"])
        .unwrap()
        .register(ParticipantSpec::plain("b", "y"), ["hub", "c"])
        .unwrap()
        .register(ParticipantSpec::plain("c", "z"), Vec::<String>::new())
        .unwrap()
        .with_start("hub");
    RouterContext::new(
        "prop-session",
        Arc::new(builder.finalize().unwrap()),
        TerminationEvaluator::new(["goodbye", "that's it"]),
    )
}

fn pid(index: usize) -> ParticipantId {
    ParticipantId::new(index)
}

/// Apply the effects that touch the log, like the session does
fn apply(log: &mut Vec<Turn>, effects: &[Effect]) {
    for effect in effects {
        if let Effect::AppendTurns { turns } = effect {
            log.extend(turns.iter().cloned());
        }
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

#[derive(Debug, Clone)]
enum Step {
    Output {
        participant: usize,
        text: String,
        handoff_to: Option<usize>,
        awaiting_user: bool,
    },
    Fail,
    Resume {
        ids: Vec<usize>,
        reply: String,
        terminate: bool,
    },
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-z ]{0,20}",
        1 => Just("goodbye".to_string()),
        1 => Just("Thanks, that's it".to_string()),
    ]
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (
            0..PARTICIPANTS,
            arb_text(),
            proptest::option::of(0..PARTICIPANTS),
            any::<bool>()
        )
            .prop_map(|(participant, text, handoff_to, awaiting_user)| Step::Output {
                participant,
                text,
                handoff_to,
                awaiting_user,
            }),
        1 => Just(Step::Fail),
        3 => (
            proptest::collection::vec(0usize..20, 0..3),
            arb_text(),
            prop::bool::weighted(0.1)
        )
            .prop_map(|(ids, reply, terminate)| Step::Resume { ids, reply, terminate }),
    ]
}

fn to_event(step: Step, counter: usize, state: &RouterState) -> Event {
    match step {
        Step::Output {
            participant,
            text,
            handoff_to,
            awaiting_user,
        } => {
            // Usually report for the active participant so the run makes progress
            let participant = state.active().unwrap_or(pid(participant));
            let mut turn = Turn::assistant(participant, text);
            if let Some(target) = handoff_to {
                turn = turn.with_handoff(Handoff {
                    source: participant,
                    target: pid(target),
                });
            }
            Event::ExecutionComplete {
                participant,
                turns: vec![turn],
                outcome: if awaiting_user {
                    StepOutcome::AwaitingUser
                } else {
                    StepOutcome::Continue
                },
                request_id: RequestId::from(format!("r{counter}")),
            }
        }
        Step::Fail => Event::RunFailed {
            turns: vec![],
            failure: RunFailure::StepLimitExceeded {
                participant: "hub".into(),
                limit: 1,
            },
        },
        Step::Resume {
            ids,
            reply,
            terminate,
        } => {
            let mut responses: HashMap<RequestId, UserResponse> = ids
                .into_iter()
                .map(|i| (RequestId::from(format!("r{i}")), UserResponse::Reply(reply.clone())))
                .collect();
            // Answer the real pending set most of the time
            for pending in state.pending() {
                responses.insert(
                    pending.id.clone(),
                    if terminate {
                        UserResponse::Terminate
                    } else {
                        UserResponse::Reply(reply.clone())
                    },
                );
            }
            Event::Resume { responses }
        }
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Control only moves along registered edges
    #[test]
    fn prop_control_follows_allowed_edges(
        opening in "[a-z ]{1,20}",
        steps in proptest::collection::vec(arb_step(), 0..30)
    ) {
        let ctx = test_context();
        let mut state = RouterState::initial(&ctx.registry);
        let mut log = vec![];

        if let Ok(result) = transition(&state, &ctx, &log, Event::UserMessage { text: opening }) {
            apply(&mut log, &result.effects);
            state = result.new_state;
        }

        for (counter, step) in steps.into_iter().enumerate() {
            let event = to_event(step, counter, &state);
            if let Ok(result) = transition(&state, &ctx, &log, event) {
                if let (Some(from), Some(to)) = (state.active(), result.new_state.active()) {
                    prop_assert!(
                        from == to || ctx.registry.is_allowed(from, to),
                        "moved from {:?} to {:?} without an edge", from, to
                    );
                }
                for effect in &result.effects {
                    if let Effect::NotifyHandoff { handoff } = effect {
                        prop_assert!(ctx.registry.is_allowed(handoff.source, handoff.target));
                    }
                }
                apply(&mut log, &result.effects);
                state = result.new_state;
            }
        }
    }

    // Terminated is absorbing and the log stops growing
    #[test]
    fn prop_terminated_is_final(
        opening in arb_text(),
        steps in proptest::collection::vec(arb_step(), 0..30)
    ) {
        let ctx = test_context();
        let mut state = RouterState::initial(&ctx.registry);
        let mut log = vec![];
        let mut closed_at: Option<usize> = None;

        let mut steps = steps.into_iter().enumerate();
        let mut event = Some(Event::UserMessage { text: opening });

        while let Some(current) = event.take() {
            match transition(&state, &ctx, &log, current) {
                Ok(result) => {
                    prop_assert!(closed_at.is_none(), "transition accepted after termination");
                    apply(&mut log, &result.effects);
                    state = result.new_state;
                    if state.is_terminated() {
                        closed_at = Some(log.len());
                    }
                }
                Err(err) => {
                    if state.is_terminated() {
                        prop_assert_eq!(err, TransitionError::SessionClosed);
                    }
                }
            }
            event = steps
                .next()
                .map(|(counter, step)| to_event(step, counter, &state));
        }
        if let Some(len) = closed_at {
            prop_assert_eq!(log.len(), len);
        }
    }

    // Replies become user turns and the requester runs next
    #[test]
    fn prop_resume_appends_reply_then_executes_requester(
        requester in 0..PARTICIPANTS,
        reply in "[a-z]{1,12}( [a-z]{1,12}){0,3}"
    ) {
        let ctx = test_context();
        prop_assume!(!ctx.termination.is_farewell(Some(&Turn::user(reply.clone()))));

        let id = RequestId::from("pending-1");
        let state = RouterState::Suspended {
            pending: vec![PendingRequest {
                id: id.clone(),
                participant: pid(requester),
                prompt: vec![],
            }],
        };
        let result = transition(
            &state,
            &ctx,
            &[],
            Event::Resume { responses: HashMap::from([(id.clone(), UserResponse::Reply(reply.clone()))]) },
        ).unwrap();

        prop_assert_eq!(result.new_state, RouterState::Running { active: pid(requester) });
        match result.effects.as_slice() {
            [Effect::AppendTurns { turns }, Effect::Execute { participant }] => {
                prop_assert_eq!(turns.len(), 1);
                prop_assert_eq!(turns[0].role, Role::User);
                prop_assert_eq!(&turns[0].text, &reply);
                prop_assert_eq!(turns[0].in_reply_to.as_ref(), Some(&id));
                prop_assert_eq!(*participant, pid(requester));
            }
            other => prop_assert!(false, "unexpected effects {:?}", other),
        }
    }

    // Unknown ids are rejected no matter what else is answered
    #[test]
    fn prop_unknown_request_rejected(
        extra in "[a-z]{4,10}",
        answer_real in any::<bool>()
    ) {
        prop_assume!(extra != "real");
        let ctx = test_context();
        let real = RequestId::from("real");
        let state = RouterState::Suspended {
            pending: vec![PendingRequest { id: real.clone(), participant: pid(1), prompt: vec![] }],
        };
        let mut responses = HashMap::from([(RequestId::from(extra.clone()), UserResponse::reply("x"))]);
        if answer_real {
            responses.insert(real, UserResponse::reply("y"));
        }
        let err = transition(&state, &ctx, &[], Event::Resume { responses }).unwrap_err();
        prop_assert_eq!(err, TransitionError::UnknownRequest(RequestId::from(extra)));
    }

    // The evaluator's verdict on a user turn decides the opening transition
    #[test]
    fn prop_opening_farewell_matches_evaluator(text in arb_text()) {
        let ctx = test_context();
        let state = RouterState::initial(&ctx.registry);
        let expected = ctx.termination.is_farewell(Some(&Turn::user(text.clone())));
        let result = transition(&state, &ctx, &[], Event::UserMessage { text }).unwrap();
        prop_assert_eq!(result.new_state.is_terminated(), expected);
    }
}
