//! CFR-BR training driver.
//!
//! Usage:
//!   cargo run --release --bin train -- --game leduc --iterations 1000 --eval-every 100
//!
//! Set `RUST_LOG=debug` for per-iteration logging.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use cfr_br::cfr::{
    exploitability, expected_returns, CfrBrConfig, CfrBrSolver, Game, ResponderSchedule,
    SolverState,
};
use cfr_br::games::kuhn::KuhnPoker;
use cfr_br::games::leduc::LeducPoker;

#[derive(Parser)]
#[command(name = "train")]
#[command(about = "Train a CFR-BR average policy and report its exploitability")]
struct Cli {
    /// Game to solve
    #[arg(short, long, value_enum, default_value = "kuhn")]
    game: GameKind,

    /// Number of iterations to run
    #[arg(short, long, default_value_t = 1000)]
    iterations: u64,

    /// Who best-responds each iteration
    #[arg(long, value_enum, default_value = "opponents")]
    schedule: Schedule,

    /// Responding player for `--schedule fixed`
    #[arg(long, default_value_t = 1)]
    responder: usize,

    /// Floor regrets at zero (regret-matching+)
    #[arg(long)]
    cfr_plus: bool,

    /// Weight iteration t's strategy by t in the average
    #[arg(long)]
    linear_averaging: bool,

    /// Measure NashConv every N iterations (0 = only at the end)
    #[arg(long, default_value_t = 0)]
    eval_every: u64,

    /// Write the average policy as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a solver checkpoint after training
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Resume from a checkpoint written by `--checkpoint`
    #[arg(long)]
    resume: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GameKind {
    Kuhn,
    Leduc,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Schedule {
    Opponents,
    Alternating,
    Fixed,
}

impl Cli {
    fn config(&self) -> CfrBrConfig {
        let responder = match self.schedule {
            Schedule::Opponents => ResponderSchedule::Opponents,
            Schedule::Alternating => ResponderSchedule::Alternating,
            Schedule::Fixed => ResponderSchedule::Fixed(self.responder),
        };
        CfrBrConfig::new()
            .with_responder(responder)
            .with_cfr_plus(self.cfr_plus)
            .with_linear_averaging(self.linear_averaging)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.game {
        GameKind::Kuhn => run(KuhnPoker::new(), &cli),
        GameKind::Leduc => run(LeducPoker::new(), &cli),
    }
}

fn run<G: Game>(game: G, cli: &Cli) -> Result<(), Box<dyn Error>> {
    let mut solver = CfrBrSolver::new(game, cli.config())?;
    if let Some(path) = &cli.resume {
        let state = SolverState::from_json(&fs::read_to_string(path)?)?;
        solver.import_state(state)?;
        log::info!("resumed from {} at iteration {}", path.display(), solver.iteration());
    }

    let bar = ProgressBar::new(cli.iterations);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );
    bar.set_message("CFR-BR");

    let start = Instant::now();
    let interval = if cli.eval_every == 0 { cli.iterations.max(1) } else { cli.eval_every };
    let mut done = 0;
    while done < cli.iterations {
        let step = interval.min(cli.iterations - done);
        solver.train(step)?;
        done += step;
        bar.set_position(done);
        if cli.eval_every > 0 {
            let nash_conv = solver.record_nash_conv()?;
            bar.set_message(format!("nash_conv {:.5}", nash_conv));
        }
    }
    bar.finish_and_clear();

    let recorded = solver.stats().nash_conv;
    let nash_conv = match recorded {
        Some(value) if cli.eval_every > 0 => value,
        _ => solver.record_nash_conv()?,
    };
    let average = solver.average_policy();
    let game = solver.game();
    let values = expected_returns(game, &game.initial_state(), &average, None)?;

    println!("iterations:     {}", solver.iteration());
    println!("info sets:      {}", solver.num_info_sets());
    println!("elapsed:        {:.2}s", start.elapsed().as_secs_f64());
    println!("values:         {:?}", values);
    println!("nash_conv:      {:.6}", nash_conv);
    if let Ok(exploit) = exploitability(game, &average) {
        println!("exploitability: {:.6}", exploit);
    }
    for point in &solver.stats().nash_conv_history {
        log::debug!("iteration {:>8}: nash_conv {:.6}", point.iteration, point.nash_conv);
    }

    if let Some(path) = &cli.output {
        write(path, &average.to_json()?)?;
        println!("average policy written to {}", path.display());
    }
    if let Some(path) = &cli.checkpoint {
        write(path, &solver.export_state().to_json()?)?;
        println!("checkpoint written to {}", path.display());
    }
    Ok(())
}

fn write(path: &Path, contents: &str) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)?;
    Ok(())
}
