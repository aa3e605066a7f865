// Entry point for cursedsweeper
// Parses the command line, sets up file logging, loads settings and launches a front end

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::error::Error;
use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info, Level};

use cursedsweeper::cs_board::{MinePlacer, RandomPlacer};
use cursedsweeper::cs_config::{data_dir, settings_path, Settings};
use cursedsweeper::cs_prompt::PromptSession;
use cursedsweeper::cs_ui;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Play with line prompts instead of the full-screen interface
    #[arg(long)]
    plain: bool,

    /// Settings file to read and write
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let path = cli.config.clone().or_else(settings_path);
    let mut settings = match &path {
        Some(p) => Settings::load(p),
        None => Settings::default(),
    };
    info!(?settings, plain = cli.plain, seed = ?cli.seed, "starting");

    let res = if cli.plain {
        let stdin = io::stdin();
        let mut session = PromptSession::new(stdin.lock(), io::stdout());
        match cli.seed {
            Some(seed) => session.run(&mut RandomPlacer::new(StdRng::seed_from_u64(seed))),
            None => session.run(&mut RandomPlacer::thread()),
        }
    } else {
        let placer: Box<dyn MinePlacer> = match cli.seed {
            Some(seed) => Box::new(RandomPlacer::new(StdRng::seed_from_u64(seed))),
            None => Box::new(RandomPlacer::thread()),
        };
        cs_ui::run(&mut settings, placer)
    };

    if let Some(p) = &path {
        if let Err(e) = settings.save(p) {
            error!(path = %p.display(), error = %e, "could not save settings");
        }
    }
    if let Err(e) = &res {
        error!(error = %e, "exited with error");
    }
    res
}

/// Log to a file in the data directory; stdout belongs to the game.
/// Without a usable directory nothing is logged.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let Some(dir) = data_dir() else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = File::create(dir.join("cursedsweeper.log")) else {
        return;
    };
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .init();
}
