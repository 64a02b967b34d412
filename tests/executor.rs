//! Tests for the async execution engine, the timer provider, and the
//! simulated robot. All of them run on the paused tokio clock, so waits
//! resolve instantly while keeping their relative ordering.
mod common;
use common::{build_chain, build_stack, build_wait_chain, completed_progresses, drain_events};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio_test::assert_ok;
use tsunagi::error::{CommandError, ExecError, RobotError};
use tsunagi::exec::{ExecEvent, ExecState, Executor, MAX_CHAIN_HOPS, RunOutcome};
use tsunagi::prelude::*;

#[tokio::test(start_paused = true)]
async fn test_promise_settles_once() {
    let (mut deferred, promise) = tsunagi::promise::Deferred::pair();
    assert!(!deferred.is_settled());
    deferred.resolve();
    assert!(deferred.is_settled());
    // A second settle attempt is a no-op.
    deferred.reject();
    assert_eq!(promise.await, Ok(()));

    let (mut deferred, promise) = tsunagi::promise::Deferred::pair();
    deferred.reject();
    assert!(promise.await.is_err());

    // Dropping unsettled rejects.
    let (deferred, promise) = tsunagi::promise::Deferred::pair();
    drop(deferred);
    assert!(promise.await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_wait_resolves_with_progress() {
    let timers = TokioTimers::new();
    let fractions = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = fractions.clone();

    let handle = timers.wait(
        0.1,
        Some(Box::new(move |fraction| sink.lock().push(fraction))),
    );
    tokio_test::assert_ok!(handle.await);

    let fractions = fractions.lock();
    assert!(!fractions.is_empty());
    assert!(fractions.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(*fractions.last().unwrap(), 1.0);
    assert_eq!(timers.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_zero_duration_wait_resolves_without_a_tick() {
    let timers = TokioTimers::new();
    let fractions = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = fractions.clone();

    let before = tokio::time::Instant::now();
    let handle = timers.wait(
        0.0,
        Some(Box::new(move |fraction| sink.lock().push(fraction))),
    );
    tokio_test::assert_ok!(handle.await);

    // No clock time passed and progress reported completion exactly once.
    assert_eq!(tokio::time::Instant::now(), before);
    assert_eq!(*fractions.lock(), vec![1.0]);
    assert_eq!(timers.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_wait_can_be_stopped() {
    let timers = TokioTimers::new();
    let handle = timers.wait(60.0, None);
    timers.stop(handle.id());
    assert!(handle.await.is_err());

    // Stopping an unknown id is a no-op.
    timers.stop(999);
}

#[tokio::test(start_paused = true)]
async fn test_wait_until_polls_predicate() {
    let timers = TokioTimers::new();
    let flag = Arc::new(AtomicBool::new(false));

    let checked = flag.clone();
    let handle = timers.wait_until(Box::new(move || checked.load(Ordering::SeqCst)));

    let setter = flag.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        setter.store(true, Ordering::SeqCst);
    });

    tokio_test::assert_ok!(handle.await);
}

#[tokio::test(start_paused = true)]
async fn test_stop_all_rejects_every_wait() {
    let timers = TokioTimers::new();
    let a = timers.wait(60.0, None);
    let b = timers.wait(60.0, None);
    assert_eq!(timers.pending_count(), 2);

    timers.stop_all();
    assert!(a.await.is_err());
    assert!(b.await.is_err());
    assert_eq!(timers.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_robot_moves_and_turns() {
    let (timers, _, _) = build_stack();
    let robot = SimRobot::new(timers);

    robot.move_forward(1.0).await.unwrap();
    let pose = robot.pose();
    assert!(pose.position.distance(Vec2::new(0.0, 1.0)) < 1e-3);

    robot.turn_right().await.unwrap();
    assert!((robot.pose().heading - 90.0).abs() < 1e-6);

    robot.move_forward(1.0).await.unwrap();
    assert!(robot.pose().position.distance(Vec2::new(1.0, 1.0)) < 1e-3);

    robot.move_backward(1.0).await.unwrap();
    assert!(robot.pose().position.distance(Vec2::new(0.0, 1.0)) < 1e-3);

    robot.reset();
    assert_eq!(robot.pose(), Pose::default());
}

#[tokio::test(start_paused = true)]
async fn test_robot_rejects_concurrent_actions() {
    let (timers, _, _) = build_stack();
    let robot = SimRobot::new(timers);

    let (first, second) = tokio::join!(robot.move_forward(1.0), robot.move_forward(1.0));
    assert_eq!(first, Ok(()));
    assert_eq!(second, Err(RobotError::Busy));
}

#[tokio::test(start_paused = true)]
async fn test_robot_stop_interrupts_movement() {
    let (timers, _, _) = build_stack();
    let robot = Arc::new(SimRobot::new(timers));

    let mover = robot.clone();
    let action = tokio::spawn(async move { mover.move_forward(100.0).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(robot.is_executing());

    robot.stop();
    assert_eq!(action.await.unwrap(), Err(RobotError::Interrupted));
    assert!(!robot.is_executing());
    // The pose stays wherever the interpolation got to.
    assert!(robot.pose().position.y > 0.0);
    assert!(robot.pose().position.y < 100.0);
}

#[tokio::test(start_paused = true)]
async fn test_run_completes_and_reports_progress() {
    let (graph, entry) = build_chain(&[
        CommandKind::MoveForward,
        CommandKind::TurnRight,
        CommandKind::MoveForward,
    ]);
    let (_, robot, executor) = build_stack();
    let mut events = executor.subscribe();

    let summary = executor.run(&graph, entry, robot).await.unwrap();
    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.steps_completed, 3);
    assert_eq!(summary.total_steps, 3);
    assert_eq!(executor.state(), ExecState::Completed);
    assert_eq!(executor.progress(), 1.0);

    let events = drain_events(&mut events);
    let started = events
        .iter()
        .filter(|e| matches!(e, ExecEvent::StepStarted(_)))
        .count();
    assert_eq!(started, 3);
    assert!(matches!(events.last(), Some(ExecEvent::ProgramCompleted)));

    let progresses = completed_progresses(&events);
    assert_eq!(progresses.len(), 3);
    assert!(progresses.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(*progresses.last().unwrap(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_run_rejects_missing_entry() {
    let (graph, _) = build_chain(&[CommandKind::MoveForward]);
    let (_, robot, executor) = build_stack();

    let result = executor.run(&graph, 42, robot).await;
    assert!(matches!(result, Err(ExecError::MissingEntry(42))));
    // A rejected run leaves the engine idle.
    assert_eq!(executor.state(), ExecState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_run_rejects_while_running() {
    let (graph, entry) = build_wait_chain(3, 1.0);
    let (_, robot, executor) = build_stack();

    let (summary, overlap) = tokio::join!(executor.run(&graph, entry, robot.clone()), async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        executor.run(&graph, entry, robot.clone()).await
    });

    assert!(matches!(overlap, Err(ExecError::AlreadyRunning)));
    // The original run is unaffected by the rejected overlap.
    let summary = summary.unwrap();
    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.steps_completed, 3);
}

#[tokio::test(start_paused = true)]
async fn test_pause_blocks_next_step_and_resume_continues() {
    let (graph, entry) = build_wait_chain(3, 1.0);
    let (_, robot, executor) = build_stack();

    let (summary, _) = tokio::join!(executor.run(&graph, entry, robot), async {
        // Land the pause mid-step 2: the step finishes, step 3 must not
        // start until resume.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        executor.pause();
        assert_eq!(executor.state(), ExecState::Paused);

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(executor.state(), ExecState::Paused);
        assert_eq!(executor.steps_completed(), 2);

        executor.resume();
    });

    let summary = summary.unwrap();
    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.steps_completed, 3);
    assert_eq!(executor.state(), ExecState::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_in_flight_step() {
    let (graph, entry) = build_wait_chain(2, 60.0);
    let (_, robot, executor) = build_stack();
    let mut events = executor.subscribe();

    let (summary, _) = tokio::join!(executor.run(&graph, entry, robot), async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        executor.stop();
    });

    let summary = summary.unwrap();
    assert_eq!(summary.outcome, RunOutcome::Stopped);
    assert_eq!(summary.steps_completed, 0);
    assert_eq!(executor.state(), ExecState::Stopped);

    // The first step started but never completed, and no terminal
    // completion event was published.
    let events = drain_events(&mut events);
    assert!(matches!(events.first(), Some(ExecEvent::StepStarted(_))));
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, ExecEvent::StepCompleted { .. } | ExecEvent::ProgramCompleted))
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_while_paused_releases_the_gate() {
    let (graph, entry) = build_wait_chain(2, 1.0);
    let (_, robot, executor) = build_stack();

    let (summary, _) = tokio::join!(executor.run(&graph, entry, robot), async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        executor.pause();
        // Step 1 finishes; step 2 is held at the gate.
        tokio::time::sleep(Duration::from_millis(2000)).await;
        executor.stop();
    });

    let summary = summary.unwrap();
    assert_eq!(summary.outcome, RunOutcome::Stopped);
    assert_eq!(summary.steps_completed, 1);
    assert_eq!(executor.state(), ExecState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_stop_immediately_after_pause_resolves_the_run() {
    let (graph, entry) = build_wait_chain(2, 1.0);
    let (_, robot, executor) = build_stack();

    // Back-to-back pause + stop must never leave the run waiting on a gate
    // nobody will settle; the timeout turns a hang into a failure.
    let (outcome, _) = tokio::join!(
        tokio::time::timeout(Duration::from_secs(60), executor.run(&graph, entry, robot)),
        async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            executor.pause();
            executor.stop();
        }
    );

    let summary = outcome.expect("run resolves after stop").unwrap();
    assert_eq!(summary.outcome, RunOutcome::Stopped);
    assert_eq!(executor.state(), ExecState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_stopped_engine_accepts_a_new_run() {
    let (graph, entry) = build_wait_chain(2, 60.0);
    let (_, robot, executor) = build_stack();

    let (stopped, _) = tokio::join!(executor.run(&graph, entry, robot.clone()), async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        executor.stop();
    });
    assert_eq!(stopped.unwrap().outcome, RunOutcome::Stopped);

    let (graph, entry) = build_chain(&[CommandKind::TurnLeft, CommandKind::TurnRight]);
    let summary = executor.run(&graph, entry, robot).await.unwrap();
    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.steps_completed, 2);
    assert_eq!(executor.progress(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_busy_robot_fails_the_run() {
    let (graph, entry) = build_chain(&[CommandKind::MoveForward]);
    let (_, robot, executor) = build_stack();
    let mut events = executor.subscribe();

    // Occupy the robot outside the engine.
    let mover = robot.clone();
    let blocking = tokio::spawn(async move { mover.move_forward(100.0).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(robot.is_executing());

    let result = executor.run(&graph, entry, robot.clone()).await;
    match result {
        Err(ExecError::Command {
            id: 0,
            source: CommandError::Robot(RobotError::Busy),
        }) => {}
        other => panic!("expected busy failure, got {:?}", other),
    }
    assert_eq!(executor.state(), ExecState::Failed);

    let events = drain_events(&mut events);
    assert!(
        events
            .iter()
            .any(|e| matches!(e, ExecEvent::ProgramFailed(_)))
    );

    robot.stop();
    let _ = blocking.await;
}

#[tokio::test(start_paused = true)]
async fn test_looping_chain_is_truncated() {
    let mut factory = CommandFactory::new();
    let mut graph = BlockGraph::new();
    let a = graph.insert(Block::new(
        factory.create_with_params(CommandKind::Wait, vec![0.0]),
        Vec2::ZERO,
    ));
    let b = graph.insert(Block::new(
        factory.create_with_params(CommandKind::Wait, vec![0.0]),
        Vec2::new(0.0, 48.0),
    ));
    graph.connect(PortRef::output(a, 0), PortRef::input(b));
    graph.connect(PortRef::output(b, 0), PortRef::input(a));

    let (_, robot, executor) = build_stack();
    let summary = executor.run(&graph, a, robot).await.unwrap();
    assert_eq!(summary.total_steps, MAX_CHAIN_HOPS);
    assert_eq!(summary.steps_completed, MAX_CHAIN_HOPS);
    assert_eq!(summary.outcome, RunOutcome::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_executor_is_shareable_across_tasks() {
    let (graph, entry) = build_wait_chain(2, 1.0);
    let (timers, robot, _) = build_stack();
    let executor = Arc::new(Executor::new(timers));

    let controller = executor.clone();
    let control = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        controller.pause();
        tokio::time::sleep(Duration::from_millis(500)).await;
        controller.resume();
    });

    let summary = executor.run(&graph, entry, robot).await.unwrap();
    assert_eq!(summary.outcome, RunOutcome::Completed);
    control.await.unwrap();
}
