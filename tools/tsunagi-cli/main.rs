use clap::Parser;
use std::io::{self, Write};
use std::time::Instant;
use tsunagi::prelude::*;

/// A snap-together block programming engine CLI
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Program letters: F (forward), B (backward), L (turn left),
    /// R (turn right), W (wait 1s)
    program: Option<String>,

    /// World units per second while moving
    #[arg(long, default_value_t = 4.0)]
    move_speed: f64,

    /// Degrees per second while turning
    #[arg(long, default_value_t = 360.0)]
    turn_speed: f64,

    /// Pause after this many completed steps, then resume (demonstration)
    #[arg(short, long)]
    pause_after: Option<usize>,

    /// Run in interactive mode to be prompted for inputs
    #[arg(short = 'i', long, help = "Run in interactive 'human' mode")]
    human: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.human {
        run_interactive(&cli);
    } else {
        run_non_interactive(cli);
    }
}

fn parse_program(letters: &str) -> Vec<CommandKind> {
    letters
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c.to_ascii_uppercase() {
            'F' => CommandKind::MoveForward,
            'B' => CommandKind::MoveBackward,
            'L' => CommandKind::TurnLeft,
            'R' => CommandKind::TurnRight,
            'W' => CommandKind::Wait,
            other => exit_with_error(&format!(
                "Unknown command letter '{}'. Use F, B, L, R or W.",
                other
            )),
        })
        .collect()
}

/// Builds the block graph by simulating the drag-and-snap gestures a user
/// would perform: each block is dropped just below the tail of the chain.
fn assemble(kinds: &[CommandKind]) -> (BlockGraph, Option<BlockId>) {
    let mut factory = CommandFactory::new();
    let mut graph = BlockGraph::new();
    let snap = SnapManager::new();

    let mut previous: Option<BlockId> = None;
    for (index, kind) in kinds.iter().enumerate() {
        let loose = Vec2::new(400.0, 600.0 + index as f32 * 200.0);
        let id = graph.insert(Block::new(factory.create(*kind), loose));

        if let Some(prev) = previous {
            // Drag to just below the predecessor, within snap distance of
            // its output anchor, then release.
            let drop = graph
                .get(prev)
                .map(|block| block.position + Vec2::new(0.0, Block::HEIGHT + 5.0))
                .unwrap_or(loose);
            if let Some(block) = graph.get_mut(id) {
                block.position = drop;
            }
            snap.end_drag(&mut graph, id, loose);
        }
        previous = Some(id);
    }

    let entry = graph.entry_block();
    (graph, entry)
}

fn run_program(kinds: Vec<CommandKind>, cli: &Cli) {
    if kinds.is_empty() {
        exit_with_error("Program is empty.");
    }

    let total_start = Instant::now();

    // --- 1. Assembly ---
    println!("\nAssembling {} blocks by snapping...", kinds.len());
    let assemble_start = Instant::now();
    let (graph, entry) = assemble(&kinds);
    let entry = entry.unwrap_or_else(|| exit_with_error("Assembled graph has no entry block."));
    let assemble_duration = assemble_start.elapsed();
    println!(
        "Assembly successful! Chain entry is block {} ({:?})",
        entry, assemble_duration
    );

    // --- 2. Execution ---
    let config = RobotConfig {
        move_speed: cli.move_speed,
        turn_speed: cli.turn_speed,
        ..RobotConfig::default()
    };

    let runtime = tokio::runtime::Runtime::new()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to start runtime: {}", e)));

    let summary = runtime.block_on(async {
        let timers = Arc::new(TokioTimers::new());
        let robot = Arc::new(SimRobot::with_config(timers.clone(), config));
        let executor = Arc::new(Executor::new(timers));

        let mut events = executor.subscribe();
        let pause_after = cli.pause_after;
        let watcher = executor.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    ExecEvent::StepStarted(info) => {
                        println!("  -> [{}] {}", info.id, info.display_name);
                    }
                    ExecEvent::StepCompleted { progress, .. } => {
                        println!("     done ({:.0}%)", progress * 100.0);
                        if Some(watcher.steps_completed()) == pause_after {
                            println!("     pausing for 500ms...");
                            watcher.pause();
                            let resumer = watcher.clone();
                            tokio::spawn(async move {
                                tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                                resumer.resume();
                            });
                        }
                    }
                    ExecEvent::ProgramCompleted => println!("Program completed."),
                    ExecEvent::ProgramFailed(error) => println!("Program failed: {}", error),
                }
            }
        });

        println!("\nRunning program...");
        let result = executor.run(&graph, entry, robot.clone()).await;
        result.map(|summary| (summary, robot.pose()))
    });

    let (summary, pose) = summary.unwrap_or_else(|e| exit_with_error(&format!("Run failed: {}", e)));
    let total_duration = total_start.elapsed();

    // --- 3. Summary ---
    println!("\n--- Run Summary ---");
    println!("Outcome:         {:?}", summary.outcome);
    println!(
        "Steps:           {}/{}",
        summary.steps_completed, summary.total_steps
    );
    println!(
        "Final Position:  ({:.2}, {:.2})",
        pose.position.x, pose.position.y
    );
    println!("Final Heading:   {:.1} deg", pose.heading);
    println!("-------------------");
    println!("Total Execution: {:?}", total_duration);
    println!();
}

/// Runs the CLI in non-interactive mode, taking all arguments from the command line.
fn run_non_interactive(cli: Cli) {
    let letters = cli
        .program
        .clone()
        .unwrap_or_else(|| exit_with_error("A program string is required in non-interactive mode."));
    let kinds = parse_program(&letters);
    run_program(kinds, &cli);
}

/// Runs the CLI in an interactive, human-friendly mode with prompts.
fn run_interactive(cli: &Cli) {
    println!("--- Tsunagi Interactive Mode ---");
    println!("Commands: F = forward, B = backward, L = turn left, R = turn right, W = wait 1s");

    let letters = prompt_for_input("Enter a program", Some("FFRW"));
    let kinds = parse_program(&letters);
    run_program(kinds, cli);
}

/// A helper function to prompt the user and read a line of input.
fn prompt_for_input(prompt_text: &str, default: Option<&str>) -> String {
    let mut line = String::new();
    let default_prompt = default.map_or("".to_string(), |d| format!(" [default: {}]", d));

    print!("> {}{}: ", prompt_text, default_prompt);
    io::stdout().flush().unwrap();

    io::stdin()
        .read_line(&mut line)
        .expect("Failed to read line");
    let trimmed = line.trim().to_string();

    if trimmed.is_empty() {
        default.unwrap_or("").to_string()
    } else {
        trimmed
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
