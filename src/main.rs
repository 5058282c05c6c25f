use std::io::Read;
use std::path::PathBuf;
use std::{fs, io};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use itertools::Itertools;
use minesweeper_kb::play::{play, Outcome};
use minesweeper_kb::util::{render, Board, Minefield};
use minesweeper_kb::{InferenceMode, KnowledgeBase};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Parser)]
#[command(
    name = "minesweeper-kb",
    about = "Play minesweeper by logical deduction",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    /// Keep combining statements until nothing new follows, rather than one
    /// pass per move
    #[arg(long)]
    closure: bool,

    /// Log moves and deductions (RUST_LOG overrides this)
    #[arg(short, long)]
    verbose: bool,
}
impl EngineArgs {
    fn mode(&self) -> InferenceMode {
        if self.closure {
            InferenceMode::Closure
        } else {
            InferenceMode::SinglePass
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play randomly generated games
    Play {
        #[arg(long, default_value = "8")]
        height: usize,

        #[arg(long, default_value = "8")]
        width: usize,

        #[arg(short, long, default_value = "8")]
        mines: usize,

        /// Number of games to play
        #[arg(short = 'n', long, default_value = "1")]
        games: usize,

        /// Seed for mine placement and guesses (random if omitted)
        #[arg(short, long)]
        seed: Option<u64>,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Print everything that can be deduced from a partially played board
    ///
    /// The board is ASCII art: `x` unknown, `*` flagged, `.` or `0`-`8` a
    /// revealed count.
    Deduce {
        /// File holding the board (stdin if omitted)
        board: Option<PathBuf>,

        #[command(flatten)]
        engine: EngineArgs,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .init();
}

fn run_play(
    height: usize,
    width: usize,
    mines: usize,
    games: usize,
    seed: Option<u64>,
    mode: InferenceMode,
) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    let mut won = 0;
    for game in 1..=games {
        let mut field =
            Minefield::random(height, width, mines, &mut rng).map_err(|e| anyhow!(e))?;
        let mut kb = KnowledgeBase::new(height, width).with_mode(mode);
        let report = play(&mut field, &mut kb, &mut rng)?;
        if report.outcome == Outcome::Won {
            won += 1;
        }
        if games == 1 {
            println!("{}\n", render(&field, &kb));
        }
        println!(
            "Game {game}: {:?} after {} moves ({} guessed)",
            report.outcome, report.moves, report.guesses
        );
    }
    #[allow(clippy::cast_precision_loss)]
    let rate = 100.0 * won as f64 / games.max(1) as f64;
    println!("Won {won}/{games} ({rate:.1}%)");
    Ok(())
}

fn run_deduce(board: Option<PathBuf>, mode: InferenceMode) -> Result<()> {
    let encoded = match board {
        Some(path) => {
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?
        },
        None => {
            let mut encoded = String::new();
            io::stdin().read_to_string(&mut encoded)?;
            encoded
        },
    };
    let board = Board::new(&encoded).map_err(|e| anyhow!(e))?;
    let mut kb = KnowledgeBase::new(board.height(), board.width()).with_mode(mode);
    board.feed(&mut kb)?;

    let unplayed_safes = kb.safes().difference(kb.moves_made()).sorted().join(" ");
    println!("Mines: {}", kb.mines().iter().sorted().join(" "));
    println!("Safe:  {unplayed_safes}");
    match kb.request_safe_move() {
        Some(cell) => println!("Next:  {cell}"),
        None => println!("Next:  no safe move, guess"),
    }
    for statement in kb.knowledge() {
        println!("  {statement}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Play {
            height,
            width,
            mines,
            games,
            seed,
            engine,
        } => {
            init_logging(engine.verbose);
            run_play(height, width, mines, games, seed, engine.mode())
        },
        Commands::Deduce {
            board,
            engine,
        } => {
            init_logging(engine.verbose);
            run_deduce(board, engine.mode())
        },
    }
}
