use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use bruhat_kl::bruhat;
use bruhat_kl::config::KlConfig;
use bruhat_kl::error::KlError;
use bruhat_kl::group::GroupContext;
use bruhat_kl::permutation::Permutation;
use bruhat_kl::session::KlSession;

#[derive(Parser, Debug)]
#[command(name = "bruhat-kl", version)]
#[command(about = "Bruhat order and Kazhdan-Lusztig polynomials on the symmetric group")]
struct Cli {
    /// Directory holding bruhat-matrix<n>.txt and KL-database<n>.txt
    #[arg(long, default_value = ".", global = true)]
    data_dir: PathBuf,

    /// Worker threads (default: one per hardware thread)
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Do not save a freshly built matrix
    #[arg(long, global = true)]
    no_save_matrix: bool,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every permutation of S_n with its index and length
    Permutations {
        /// Size of the group
        n: usize,
        /// Order by (length, lexicographic) instead of lexicographic
        #[arg(long)]
        by_length: bool,
    },

    /// Decide whether U < V in Bruhat order
    Compare {
        /// Lower permutation, e.g. 1324 or "1 3 2 4"
        u: Permutation,
        /// Upper permutation
        v: Permutation,
    },

    /// List the Bruhat interval [U, V]
    Interval {
        /// Lower permutation
        u: Permutation,
        /// Upper permutation
        v: Permutation,
        /// Walk covers instead of loading or building the matrix
        #[arg(long)]
        standalone: bool,
    },

    /// Build (or load) and save the Bruhat matrix of S_n
    Matrix {
        /// Size of the group
        n: usize,
    },

    /// Compute the Kazhdan-Lusztig polynomial P(U, V)
    Kl {
        /// Lower permutation
        u: Permutation,
        /// Upper permutation
        v: Permutation,
        /// Use the on-demand order instead of the matrix
        #[arg(long)]
        standalone: bool,
    },

    /// Run the bundled self-checks
    Validate,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: could not install logger: {e}");
    }

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn config(cli: &Cli) -> KlConfig {
    let mut cfg = KlConfig::with_data_dir(&cli.data_dir);
    if let Some(workers) = cli.workers {
        cfg.workers = workers;
    }
    cfg.persist_matrix = !cli.no_save_matrix;
    cfg
}

fn open(cli: &Cli, n: usize, standalone: bool) -> Result<KlSession, KlError> {
    if standalone {
        KlSession::open_standalone(config(cli), n)
    } else {
        KlSession::open(config(cli), n)
    }
}

fn run(cli: &Cli) -> Result<ExitCode, KlError> {
    match &cli.command {
        Command::Permutations { n, by_length } => {
            let group = GroupContext::new(*n)?;
            let order = if *by_length {
                group.sorted_by_length()
            } else {
                (0..group.order()).collect()
            };
            for idx in order {
                if let (Some(p), Some(len)) = (group.permutation(idx), group.length(idx)) {
                    println!("{idx}\t{p}\t{len}");
                }
            }
        }

        Command::Compare { u, v } => {
            if u.degree() != v.degree() {
                return Err(KlError::GroupMismatch {
                    expected: u.degree(),
                    actual: v.degree(),
                });
            }
            let verdict = if bruhat::compare(u, v) {
                "<"
            } else if bruhat::compare(v, u) {
                ">"
            } else if u == v {
                "="
            } else {
                "incomparable"
            };
            println!("{u} {verdict} {v}");
        }

        Command::Interval { u, v, standalone } => {
            let session = open(cli, u.degree(), *standalone)?;
            for z in session.interval(u, v)? {
                println!("{z}");
            }
        }

        Command::Matrix { n } => {
            let cfg = config(cli);
            let path = cfg.matrix_path(*n);
            let session = KlSession::open(cfg, *n)?;
            if let Some(m) = session.matrix() {
                println!(
                    "S_{n}: {} elements, {} comparable pairs ({})",
                    m.order(),
                    m.count_ones(),
                    path.display()
                );
            }
        }

        Command::Kl { u, v, standalone } => {
            let mut session = open(cli, u.degree(), *standalone)?;
            let poly = session.polynomial(u, v)?;
            println!("P({u}; {v}) = {poly}");
            session.flush()?;
        }

        Command::Validate => match bruhat_kl::validate::validate_known_results() {
            Ok(()) => println!("Validation OK: comparator, matrix and K-L polynomials check out."),
            Err(e) => {
                eprintln!("Validation FAILED: {e}");
                return Ok(ExitCode::FAILURE);
            }
        },
    }
    Ok(ExitCode::SUCCESS)
}
