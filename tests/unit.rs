//! Unit tests for core types: geometry, commands, connectors, errors.
mod common;
use tsunagi::error::{CommandError, ExecError, RobotError};
use tsunagi::graph::{Connector, Direction, ParamType};
use tsunagi::prelude::*;

#[test]
fn test_vec2_math() {
    let a = Vec2::new(3.0, 0.0);
    let b = Vec2::new(0.0, 4.0);
    assert_eq!(a.distance(b), 5.0);
    assert_eq!(a + b, Vec2::new(3.0, 4.0));
    assert_eq!(a - b, Vec2::new(3.0, -4.0));
    assert_eq!(a * 2.0, Vec2::new(6.0, 0.0));
    assert_eq!(-a, Vec2::new(-3.0, 0.0));
    assert_eq!(format!("{}", Vec2::new(1.0, 2.0)), "(1, 2)");
}

#[test]
fn test_vec2_lerp_is_clamped() {
    let a = Vec2::ZERO;
    let b = Vec2::new(10.0, 0.0);
    assert_eq!(a.lerp(b, 0.5), Vec2::new(5.0, 0.0));
    assert_eq!(a.lerp(b, -1.0), a);
    assert_eq!(a.lerp(b, 2.0), b);
}

#[test]
fn test_command_kind_display() {
    assert_eq!(format!("{}", CommandKind::MoveForward), "MoveForward");
    assert_eq!(format!("{}", CommandKind::Wait), "Wait");
}

#[test]
fn test_command_display_name_uses_params() {
    let mut factory = CommandFactory::new();
    let forward = factory.create_with_params(CommandKind::MoveForward, vec![2.5]);
    let wait = factory.create_with_params(CommandKind::Wait, vec![3.0]);
    let turn = factory.create(CommandKind::TurnLeft);
    assert_eq!(forward.display_name(), "Forward (2.5)");
    assert_eq!(wait.display_name(), "Wait 3s");
    assert_eq!(turn.display_name(), "Turn left");
}

#[test]
fn test_factory_ids_are_monotonic() {
    let mut factory = CommandFactory::new();
    let a = factory.create(CommandKind::MoveForward);
    let b = factory.create(CommandKind::TurnLeft);
    let c = factory.create(CommandKind::Wait);
    assert_eq!((a.id, b.id, c.id), (0, 1, 2));

    factory.reset();
    let again = factory.create(CommandKind::MoveForward);
    assert_eq!(again.id, 0);
}

#[test]
fn test_connector_compatibility() {
    let output = Connector::new(Direction::Output, Vec2::ZERO);
    let input = Connector::new(Direction::Input, Vec2::ZERO);
    assert!(output.can_connect_to(&input));
    // Same direction never connects.
    assert!(!output.can_connect_to(&output));

    let mut typed_out = Connector::new(Direction::Output, Vec2::ZERO);
    typed_out.param_type = ParamType::Number;
    let mut typed_in = Connector::new(Direction::Input, Vec2::ZERO);
    typed_in.param_type = ParamType::Text;
    assert!(!typed_out.can_connect_to(&typed_in));

    typed_in.param_type = ParamType::Number;
    assert!(typed_out.can_connect_to(&typed_in));

    // Untyped accepts anything.
    typed_in.param_type = ParamType::Untyped;
    assert!(typed_out.can_connect_to(&typed_in));
}

#[test]
fn test_block_connector_layout() {
    let mut factory = CommandFactory::new();
    let block = Block::new(factory.create(CommandKind::MoveForward), Vec2::new(10.0, 20.0));
    assert_eq!(block.id, block.command.id);

    let input = block.input.as_ref().unwrap();
    assert_eq!(input.offset, Vec2::new(Block::WIDTH / 2.0, 0.0));

    let output = block.primary_output().unwrap();
    assert_eq!(output.offset, Vec2::new(Block::WIDTH / 2.0, Block::HEIGHT));
    assert!(output.connected_to.is_none());
}

#[test]
fn test_pose_forward() {
    let mut pose = Pose::default();
    let ahead = pose.forward();
    assert!((ahead.x - 0.0).abs() < 1e-6);
    assert!((ahead.y - 1.0).abs() < 1e-6);

    pose.heading = 90.0;
    let right = pose.forward();
    assert!((right.x - 1.0).abs() < 1e-6);
    assert!(right.y.abs() < 1e-6);
}

#[test]
fn test_exec_state_accepts_run() {
    assert!(ExecState::Idle.accepts_run());
    assert!(ExecState::Completed.accepts_run());
    assert!(ExecState::Failed.accepts_run());
    assert!(ExecState::Stopped.accepts_run());
    assert!(!ExecState::Running.accepts_run());
    assert!(!ExecState::Paused.accepts_run());
}

#[test]
fn test_error_display() {
    let err = ExecError::MissingEntry(7);
    assert!(err.to_string().contains('7'));

    let err = ExecError::Command {
        id: 3,
        source: CommandError::Robot(RobotError::Busy),
    };
    assert!(err.to_string().contains('3'));
    assert!(err.to_string().contains("already executing"));

    let err = CommandError::WaitCancelled;
    assert!(err.to_string().contains("cancelled"));
}
