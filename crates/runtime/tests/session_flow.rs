use std::time::Duration;

use ctman_core::{
    Command, GameConfig, Grid, Position, RunError, RunOutcome, SessionError, SequenceFault,
};
use ctman_runtime::{
    Event, LoadTarget, RunEvent, Runtime, RuntimeConfig, RuntimeError, StaticIdentity, Topic,
};

async fn start(step_interval: Duration) -> Runtime {
    Runtime::builder()
        .config(RuntimeConfig::default().with_step_interval(step_interval))
        .identity(StaticIdentity::new("ada"))
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_single_step_onto_pellet() {
    let runtime = start(Duration::ZERO).await;
    let handle = runtime.handle();

    handle.append_command(Command::Left).await.unwrap();
    let (steps, report) = handle.run().await.unwrap().collect().await.unwrap();

    assert_eq!(steps.len(), 1);
    assert_eq!(report.outcome, RunOutcome::Completed);

    let state = handle.query_state().await.unwrap();
    assert_eq!(state.score, 10);
    assert_eq!(state.player, Position::new(4, 5));
    assert_eq!(state.iterations, 19);
    assert_eq!(state.lives, 3);
    assert!(state.commands.is_empty());

    drop(handle);
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_stream_yields_post_step_states() {
    let runtime = start(Duration::ZERO).await;
    let handle = runtime.handle();

    for command in [Command::RunUntilWall, Command::Left, Command::Down] {
        handle.append_command(command).await.unwrap();
    }
    let (steps, report) = handle.run().await.unwrap().collect().await.unwrap();

    let players: Vec<Position> = steps.iter().map(|snapshot| snapshot.step.player).collect();
    assert_eq!(
        players,
        vec![Position::new(4, 5), Position::new(3, 5), Position::new(3, 6)]
    );
    for snapshot in &steps {
        assert_eq!(snapshot.state.player, snapshot.step.player);
        assert_eq!(snapshot.state.score, snapshot.step.score);
        snapshot.state.check_invariants().unwrap();
    }
    assert_eq!(report.score, 30);
    assert_eq!(report.steps, 3);
}

#[tokio::test]
async fn test_collision_costs_a_life() {
    let grid = Grid::parse(
        "#####
         #.#.#
         #.P.#
         #####",
    )
    .unwrap();
    let runtime = Runtime::builder()
        .config(RuntimeConfig::default().with_step_interval(Duration::ZERO))
        .grid(grid)
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    for command in [Command::Left, Command::Left, Command::Right] {
        handle.append_command(command).await.unwrap();
    }
    let report = handle.run().await.unwrap().finish().await.unwrap();

    assert!(report.collided());
    assert_eq!(report.steps, 2);
    let state = handle.query_state().await.unwrap();
    assert_eq!(state.score, 5);
    assert_eq!(state.player, Position::new(2, 2));
    assert_eq!((state.lives, state.iterations), (2, 19));
    assert!(state.commands.is_empty());
}

#[tokio::test]
async fn test_invalid_sequence_is_refused() {
    let runtime = start(Duration::ZERO).await;
    let handle = runtime.handle();

    handle.append_command(Command::RunUntilWall).await.unwrap();
    let before = handle.query_state().await.unwrap();

    let err = handle.run().await.err().unwrap();
    let RuntimeError::Session(SessionError::Run(RunError::InvalidSequence(err))) = err else {
        panic!("expected invalid sequence, got {err:?}");
    };
    assert_eq!(err.index, 0);
    assert_eq!(err.fault, SequenceFault::MissingDirection);
    assert_eq!(handle.query_state().await.unwrap(), before);
}

#[tokio::test]
async fn test_queue_limits() {
    let runtime = start(Duration::ZERO).await;
    let handle = runtime.handle();

    for _ in 0..10 {
        handle.append_command(Command::Up).await.unwrap();
    }
    let err = handle.append_command(Command::Down).await.unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(handle.query_state().await.unwrap().commands.len(), 10);

    assert_eq!(handle.remove_command(3).await.unwrap(), Command::Up);
    assert!(handle.remove_command(9).await.is_err());
    assert_eq!(handle.query_state().await.unwrap().commands.len(), 9);
}

#[tokio::test]
async fn test_exhausted_session_refuses_runs() {
    let config = RuntimeConfig::default()
        .with_step_interval(Duration::ZERO)
        .with_game(GameConfig::default().with_budget(3, 1));
    let runtime = Runtime::builder().config(config).build().await.unwrap();
    let handle = runtime.handle();

    handle.append_command(Command::Left).await.unwrap();
    handle.run().await.unwrap().finish().await.unwrap();

    handle.append_command(Command::Right).await.unwrap();
    let err = handle.run().await.err().unwrap();
    assert!(matches!(
        err,
        RuntimeError::Session(SessionError::Run(RunError::SessionExhausted {
            iterations: 0,
            ..
        }))
    ));
}

#[tokio::test]
async fn test_run_events_in_order() {
    let runtime = start(Duration::ZERO).await;
    let handle = runtime.handle();
    let mut events = runtime.subscribe(Topic::Run);

    handle.append_command(Command::Left).await.unwrap();
    handle.append_command(Command::Right).await.unwrap();
    let report = handle.run().await.unwrap().finish().await.unwrap();

    let Event::Run(RunEvent::Started { commands, player, .. }) = events.recv().await.unwrap()
    else {
        panic!("expected run start");
    };
    assert_eq!(commands, vec![Command::Left, Command::Right]);
    assert_eq!(player, Position::new(5, 5));

    for _ in 0..2 {
        assert!(matches!(
            events.recv().await.unwrap(),
            Event::Run(RunEvent::Stepped { .. })
        ));
    }
    assert_eq!(
        events.recv().await.unwrap(),
        Event::Run(RunEvent::Finished { report })
    );
}

#[tokio::test(start_paused = true)]
async fn test_requests_refused_while_running() {
    let runtime = start(Duration::from_millis(500)).await;
    let handle = runtime.handle();

    for command in [Command::Left, Command::Left, Command::Down] {
        handle.append_command(command).await.unwrap();
    }
    let _stream = handle.run().await.unwrap();

    assert!(
        handle
            .append_command(Command::Up)
            .await
            .unwrap_err()
            .is_run_in_progress()
    );
    assert!(handle.remove_command(0).await.unwrap_err().is_run_in_progress());
    assert!(handle.run().await.err().unwrap().is_run_in_progress());
    assert!(handle.list_saves().await.unwrap_err().is_run_in_progress());
    assert!(handle.save("mid-run").await.unwrap_err().is_run_in_progress());
    assert!(
        handle
            .load(LoadTarget::New)
            .await
            .unwrap_err()
            .is_run_in_progress()
    );

    let state = handle.query_state().await.unwrap();
    assert_eq!(state.commands.len(), 3);
    assert_eq!(state.player, Position::new(5, 5));

    handle.abort().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_abort_mid_run_skips_bookkeeping() {
    let runtime = start(Duration::from_millis(500)).await;
    let handle = runtime.handle();

    for command in [Command::Left, Command::Left, Command::Down] {
        handle.append_command(command).await.unwrap();
    }
    let mut stream = handle.run().await.unwrap();

    let first = stream.next_step().await.unwrap();
    assert_eq!(first.step.player, Position::new(4, 5));

    let report = handle.abort().await.unwrap();
    assert!(report.aborted());
    assert_eq!(report.steps, 1);
    assert_eq!(report.retained_commands, 2);

    assert!(stream.next_step().await.is_none());
    assert_eq!(stream.finish().await.unwrap(), report);

    let state = handle.query_state().await.unwrap();
    assert_eq!((state.lives, state.iterations), (3, 20));
    assert_eq!(state.score, 10);
    assert_eq!(state.commands.as_slice(), &[Command::Left, Command::Down]);

    assert!(matches!(
        handle.abort().await,
        Err(RuntimeError::Session(SessionError::NoActiveRun))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_abort_after_collision_keeps_penalty() {
    let grid = Grid::parse(
        "#####
         #.#.#
         #.P.#
         #####",
    )
    .unwrap();
    let runtime = Runtime::builder()
        .config(RuntimeConfig::default().with_step_interval(Duration::from_millis(500)))
        .grid(grid)
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    handle.append_command(Command::Up).await.unwrap();
    handle.append_command(Command::Left).await.unwrap();
    let mut stream = handle.run().await.unwrap();

    let collided = stream.next_step().await.unwrap();
    assert!(collided.step.collision().is_some());

    assert!(matches!(
        handle.abort().await,
        Err(RuntimeError::Session(SessionError::NoActiveRun))
    ));
    let report = stream.finish().await.unwrap();
    assert!(report.collided());

    let state = handle.query_state().await.unwrap();
    assert_eq!((state.lives, state.iterations), (2, 19));
    assert!(state.commands.is_empty());
}

#[tokio::test]
async fn test_identical_queues_are_deterministic() {
    let commands = [
        Command::RunUntilCrossroad,
        Command::Up,
        Command::RunUntilWall,
        Command::Left,
        Command::Down,
    ];

    let mut outcomes = Vec::new();
    for _ in 0..2 {
        let runtime = start(Duration::ZERO).await;
        let handle = runtime.handle();
        for command in commands {
            handle.append_command(command).await.unwrap();
        }
        let (steps, report) = handle.run().await.unwrap().collect().await.unwrap();
        let steps: Vec<_> = steps.into_iter().map(|snapshot| snapshot.step).collect();
        outcomes.push((steps, report, handle.query_state().await.unwrap()));
    }

    assert_eq!(outcomes[0], outcomes[1]);
}
