#[macro_use]
extern crate derive_more;
#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate log;

pub mod config;
pub mod display;
pub mod job;

use crate::{
    config::{load_generator_config, logger_setup},
    display::render,
    job::GenerationJob,
};
use anyhow::{bail, Result};
use arrows_core::{
    deadlock::exit_ray,
    game::Game,
    generator::GeneratorConfig,
    grid::{board::Board, storage::Occupancy},
    resolver::TickOutcome,
    snake::{Snake, SnakeId},
    verifier::{verify_solvable, Verification},
};
use rand::{thread_rng, Rng};
use std::{path::PathBuf, time::Duration};
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
struct GeneratorOptions {
    /// Generator configuration, `config/generator.yaml` by default
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,
    /// Difficulty level, replaces the configuration file
    #[structopt(long)]
    level: Option<u32>,
    #[structopt(long)]
    seed: Option<u64>,
    #[structopt(long)]
    rows: Option<usize>,
    #[structopt(long)]
    cols: Option<usize>,
    #[structopt(long)]
    coverage: Option<f64>,
    /// Only accept boards confirmed by the search
    #[structopt(long)]
    verify: bool,
    #[structopt(long)]
    max_states: Option<usize>,
    #[structopt(long)]
    max_depth: Option<usize>,
    #[structopt(long)]
    timeout_ms: Option<u64>,
}

impl GeneratorOptions {
    fn generator_config(&self) -> Result<GeneratorConfig> {
        let mut config = match self.level {
            Some(level) => GeneratorConfig::for_level(level),
            None => load_generator_config(self.config.clone())?,
        };
        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        if let Some(cols) = self.cols {
            config.cols = cols;
        }
        if let Some(coverage) = self.coverage {
            config.target_coverage = coverage;
        }
        if self.verify {
            config.verify = true;
        }
        if let Some(max_states) = self.max_states {
            config.verifier.max_states = max_states;
        }
        if let Some(max_depth) = self.max_depth {
            config.verifier.max_depth = max_depth;
        }
        Ok(config)
    }
}

#[derive(StructOpt, Debug)]
enum Command {
    /// Print a new puzzle
    #[structopt(name = "generate")]
    Generate,
    /// Print a new puzzle and search for its solution
    #[structopt(name = "verify")]
    Verify,
    /// Play a new puzzle to the end
    #[structopt(name = "play")]
    Play {
        /// Print the board after every exit
        #[structopt(long)]
        frames: bool,
    },
}

#[derive(StructOpt, Debug)]
struct Options {
    #[structopt(long, parse(from_os_str))]
    logger_config: Option<PathBuf>,
    #[structopt(flatten)]
    generator: GeneratorOptions,
    #[structopt(subcommand)]
    command: Option<Command>,
}

#[derive(new, Display)]
#[display(fmt = "{} snakes on {}x{}, coverage {:.0}%", snakes, rows, cols, percent)]
struct Summary {
    snakes: usize,
    rows: usize,
    cols: usize,
    percent: f64,
}

fn summary(board: Board, snakes: &[Snake]) -> Summary {
    let occupancy = Occupancy::from_snakes(board, snakes);
    Summary::new(
        snakes.len(),
        board.rows(),
        board.cols(),
        occupancy.coverage() * 100.0,
    )
}

fn print_verification(verification: &Verification) {
    match &verification.solution {
        Some(solution) => println!("solvable in {} moves", solution.len()),
        None => println!("no solution found within the limits"),
    }
}

/// Replays the found solution, one tick at a time.
fn play_solution(game: &mut Game, ids: &[SnakeId], solution: &[usize], frames: bool) {
    for index in solution {
        let id = ids[*index];
        match game.tick(id) {
            Some(TickOutcome::Exited) => {
                info!("snake {} exited", id);
                if frames {
                    println!("{}\n", render(game.board(), game.snakes()));
                }
            }
            Some(TickOutcome::Moved) => {}
            Some(outcome) => warn!("snake {} did not follow the solution: {:?}", id, outcome),
            None => warn!("snake {} is already gone", id),
        }
    }
}

/// Taps every snake with a clear way out and lets the scheduler run, until none is left.
fn play_greedy(game: &mut Game, frames: bool) {
    loop {
        let board = game.board();
        let occupancy = Occupancy::from_snakes(board, game.snakes());
        let clear: Vec<SnakeId> = game
            .snakes()
            .iter()
            .enumerate()
            .filter(|(index, snake)| exit_ray(&board, snake, *index, &occupancy).is_clear())
            .map(|(_, snake)| snake.id())
            .collect();
        if clear.is_empty() {
            return;
        }
        for id in clear {
            game.tap(id);
        }
        while game.active().next().is_some() {
            for (id, outcome) in game.step() {
                if outcome == TickOutcome::Exited {
                    debug!("snake {} exited", id);
                }
            }
        }
        if frames {
            println!("{}\n", render(game.board(), game.snakes()));
        }
    }
}

fn main() -> Result<()> {
    let options = Options::from_args();
    logger_setup(options.logger_config.clone())?;

    let config = options.generator.generator_config()?;
    let board = config.board();
    let seed = options.generator.seed.unwrap_or_else(|| thread_rng().gen());
    info!("generating a {}x{} puzzle with seed {}", board.rows(), board.cols(), seed);

    let timeout = options.generator.timeout_ms.map(Duration::from_millis);
    let snakes = match GenerationJob::new(config.clone(), seed).spawn().wait(timeout) {
        Ok(snakes) => snakes,
        Err(err) => bail!("no puzzle: {}", err),
    };
    println!("{}", render(board, &snakes));
    println!("{}", summary(board, &snakes));

    match options.command.unwrap_or(Command::Generate) {
        Command::Generate => {}
        Command::Verify => {
            let verification = verify_solvable(&board, &snakes, &config.verifier);
            print_verification(&verification);
        }
        Command::Play { frames } => {
            let verification = verify_solvable(&board, &snakes, &config.verifier);
            let ids: Vec<SnakeId> = snakes.iter().map(|snake| snake.id()).collect();
            let mut game = Game::new(board, snakes);
            match verification.solution {
                Some(solution) => play_solution(&mut game, &ids, &solution, frames),
                None => play_greedy(&mut game, frames),
            }
            let stats = game.stats();
            println!(
                "{} exited, {} collided, {} left",
                stats.exited,
                stats.collided,
                game.snakes().len()
            );
            if game.is_solved() {
                println!("solved!");
            }
        }
    }
    Ok(())
}
