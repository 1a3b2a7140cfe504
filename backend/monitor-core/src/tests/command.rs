use crate::command::{CommandParser, PipelineCommand};
use crate::envelope::MonitorCommand;

use serde::{Deserialize, Serialize};
use serde_json::Map;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct AppState {
    name: String,
    visits: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SetName {
    payload: String,
}

type Parser = CommandParser<AppState, SetName>;

fn jump_to(state: &str) -> MonitorCommand {
    MonitorCommand::JumpToState {
        action: Map::new(),
        state: state.to_string(),
    }
}

/// **VALUE**: Verifies that a captured state survives the trip through the tool and back.
///
/// **WHY THIS MATTERS**: Jump-to-state is only useful if the restored state equals the
/// one the tool recorded; any lossy step would make time travel lie.
#[test]
fn given_captured_state_when_jump_to_state_parsed_then_equals_original() {
    // GIVEN: A state as the inspection tool captured it
    let captured = AppState {
        name: "Zlatan".to_string(),
        visits: 3,
    };
    let state_json = serde_json::to_string(&captured).expect("encode");

    // WHEN: Parsing the jump command
    let parsed = Parser::parse(&jump_to(&state_json));

    // THEN: The pipeline receives an equal state
    assert_eq!(parsed, Some(PipelineCommand::SetState(captured)));
}

#[test]
fn given_action_command_when_parsed_then_yields_dispatch() {
    let command = MonitorCommand::Action {
        action: r#"{"payload":"Ruby"}"#.to_string(),
    };

    assert_eq!(
        Parser::parse(&command),
        Some(PipelineCommand::Dispatch(SetName {
            payload: "Ruby".to_string()
        }))
    );
}

#[test]
fn given_undecodable_json_when_parsed_then_dropped() {
    assert_eq!(Parser::parse(&jump_to("{\"name\":42}")), None);
    assert_eq!(Parser::parse(&jump_to("not json")), None);
    assert_eq!(
        Parser::parse(&MonitorCommand::Action {
            action: "{\"unknown\":true}".to_string()
        }),
        None
    );
}

#[test]
fn given_parser_handler_when_invoked_then_forwards_to_pipeline_channel() {
    // GIVEN: A handler wired to a pipeline channel
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handler = Parser::new(tx).into_handler();

    // WHEN: The monitor invokes it with a valid and an invalid command
    handler(MonitorCommand::Action {
        action: r#"{"payload":"Simon"}"#.to_string(),
    });
    handler(jump_to("broken"));

    // THEN: Only the decodable one reaches the pipeline
    assert_eq!(
        rx.try_recv().expect("dispatch"),
        PipelineCommand::Dispatch(SetName {
            payload: "Simon".to_string()
        })
    );
    assert!(rx.try_recv().is_err());
}

#[test]
fn given_closed_pipeline_when_handled_then_does_not_panic() {
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);

    Parser::new(tx).handle(MonitorCommand::Action {
        action: r#"{"payload":"Mary"}"#.to_string(),
    });
}
