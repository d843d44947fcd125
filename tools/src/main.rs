//! sim-runner: headless runner for the rural business simulator.
//!
//! Usage:
//!   sim-runner --data-dir ./data --store data/game_data.json
//!   sim-runner --play "Lakshmi" --business "Dairy Farming" --seed 7
//!   sim-runner --store data/game.db --ipc-mode

use anyhow::Result;
use ruralsim_core::{
    command::PlayerCommand,
    game::Game,
    lifecycle::BusinessSetup,
    session::GameSession,
    store::{BusinessStatus, EmploymentMode},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Command { command: PlayerCommand },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    session:     Option<GameSession>,
    business:    Option<ruralsim_core::store::Business>,
    leaderboard: Vec<ruralsim_core::store::LeaderboardEntry>,
    auctions:    usize,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data_dir = str_arg(&args, "--data-dir").unwrap_or("./data");
    let store_path = str_arg(&args, "--store").unwrap_or("data/game_data.json");

    if !ipc_mode {
        println!("Rural Business Simulator - sim-runner");
        println!("  seed:      {seed}");
        println!("  data_dir:  {data_dir}");
        println!("  store:     {store_path}");
        println!();
    }

    let mut game = Game::open(data_dir, store_path, seed)?;

    if ipc_mode {
        run_ipc_loop(&mut game)?;
    } else if let Some(name) = str_arg(&args, "--play") {
        let business_type = str_arg(&args, "--business").unwrap_or("Dairy Farming");
        play_full_game(&mut game, name, business_type)?;
        print_summary(&game);
    } else {
        print_summary(&game);
    }

    Ok(())
}

fn run_ipc_loop(game: &mut Game) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();
    let mut session: Option<GameSession> = None;

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => {
                let state = build_ui_state(game, &session);
                writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
            }
            IpcCommand::Command { command } => {
                let reply = match game.execute(&mut session, command) {
                    Ok(result) => serde_json::json!({ "ok": result }),
                    Err(e) => serde_json::json!({ "error": e.to_string() }),
                };
                writeln!(stdout, "{reply}")?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn build_ui_state(game: &Game, session: &Option<GameSession>) -> UiState {
    UiState {
        session:     session.clone(),
        business:    session.as_ref().and_then(|s| game.current_business(s).ok()),
        leaderboard: game.leaderboard(5),
        auctions:    game.active_auctions().len(),
    }
}

/// Play every round of a new business, cycling through the options.
fn play_full_game(game: &mut Game, name: &str, business_type: &str) -> Result<()> {
    let base_language = game.config().game.base_language.clone();
    let location = game.config().game.default_location.clone();
    let mut session = game.start_session(name, &base_language)?;
    let business = game.create_business(
        &mut session,
        BusinessSetup::new(business_type, &location, EmploymentMode::SelfOperated),
    )?;
    println!("=== {} ({}) in {} ===", name, business.business_type, business.location);
    println!("  starting capital: ₹{}", business.capital);

    let mut option = 1;
    loop {
        let scenario = game.next_scenario(&mut session)?;
        let outcome = game.choose_option(&mut session, option)?;
        println!(
            "  round {:>2} [{:?}] option {} -> score {:>3} {}",
            scenario.round,
            scenario.source,
            option,
            outcome.score,
            outcome.feedback
        );
        if outcome.status == BusinessStatus::Completed {
            if let Some(report) = outcome.final_report {
                println!();
                println!("=== FINAL REPORT ===");
                println!("  total rounds:  {}", report.total_rounds);
                println!("  average score: {:.1}", report.average_score);
                println!("  total score:   {}", report.total_score);
            }
            break;
        }
        option = option % 3 + 1;
    }

    let seeded = game.refresh_auctions()?;
    log::info!("seeded {} sample auction(s)", seeded.len());
    Ok(())
}

fn print_summary(game: &Game) {
    let stats = game.store().statistics();
    println!();
    println!("=== SUMMARY ({}) ===", chrono::Local::now().format("%Y-%m-%d %H:%M"));
    println!("  users:           {}", stats.total_users);
    println!("  businesses:      {}", stats.total_businesses);
    println!("  decisions:       {}", stats.total_scenarios);
    println!("  active auctions: {}", stats.active_auctions);
    println!("  games played:    {}", stats.total_games_played);

    println!();
    println!("=== LEADERBOARD (Top 10) ===");
    let board = game.leaderboard(10);
    if board.is_empty() {
        println!("  (No scores yet)");
    }
    for (rank, entry) in board.iter().enumerate() {
        println!(
            "  {:>2}. {:<20} {:>3}  {}",
            rank + 1,
            entry.user_name,
            entry.score,
            entry.business_type
        );
    }
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
