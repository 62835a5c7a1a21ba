use std::io::{BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;

use clasp::search::report;
use clasp::{Algorithm, Database, FullReport, Mode, SearchOpt, SearchResult};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

const DEFAULT_DB: &str = "cellosaurus.json";

#[derive(Parser, Debug)]
#[command(name = "clasp", author, version, about = "Cell line authentication with STR profiles", arg_required_else_help = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search query STR profiles against the Cellosaurus database
    Search {
        /// Query STR profile table (Sample, Marker, Allele1..AlleleN)
        query: PathBuf,
        /// Path to the Cellosaurus database in JSON format
        #[arg(short = 'd', long = "db", env = "CLASP_DB", default_value = DEFAULT_DB)]
        db: PathBuf,
        /// Scoring algorithm: Tanabe (2S/(Q+R)), query (S/Q) or reference (S/R)
        #[arg(short = 'a', long = "algorithm", default_value = "Tanabe")]
        algorithm: Algorithm,
        /// Markers to score: intersect (shared), query (all query markers) or reference (all reference markers)
        #[arg(short = 'm', long = "mode", default_value = "intersect")]
        mode: Mode,
        /// Do not report candidate matches with a score below this value
        #[arg(short = 's', long = "min-score", default_value_t = 0.0)]
        min_score: f64,
        /// Do not report more than this many candidate matches; <= 0 disables the limit
        #[arg(short = 'x', long = "max-hits", default_value_t = 20, allow_negative_numbers = true)]
        max_hits: i64,
        /// Include Amelogenin in scoring
        #[arg(long = "amel")]
        amel: bool,
        /// Write the full report in CSV format to this file
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        threads: usize,
    },
    /// Convert a Cellosaurus flat file into the JSON database
    Db {
        /// Local cellosaurus.txt (stdin if omitted)
        #[arg(short = 'p', long = "path")]
        path: Option<PathBuf>,
        /// Destination for the JSON database
        #[arg(short = 'd', long = "dest", env = "CLASP_DB", default_value = DEFAULT_DB)]
        dest: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    clasp::logging::init(cli.verbose);
    log::debug!("{}", std::env::args().collect::<Vec<_>>().join(" "));
    match cli.command {
        Commands::Search {
            query,
            db,
            algorithm,
            mode,
            min_score,
            max_hits,
            amel,
            out,
            threads,
        } => {
            let opt = SearchOpt {
                algorithm,
                mode,
                amel,
                minscore: min_score,
                maxhits: max_hits,
                ..SearchOpt::default()
            };
            run_search(&query, &db, out.as_deref(), opt, threads)
        }
        Commands::Db { path, dest } => run_db(path.as_deref(), &dest),
    }
}

fn run_search(
    query_path: &std::path::Path,
    db_path: &std::path::Path,
    out_path: Option<&std::path::Path>,
    opt: SearchOpt,
    threads: usize,
) -> Result<()> {
    let db = Database::load(db_path)
        .with_context(|| format!("cannot load database '{}'", db_path.display()))?;
    let queries = clasp::io::table::load_queries(query_path)
        .with_context(|| format!("cannot load query profiles from '{}'", query_path.display()))?;
    if queries.is_empty() {
        anyhow::bail!("query table '{}' contains no samples", query_path.display());
    }
    log::info!("{} reference profiles, {} queries", db.len(), queries.len());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .context("cannot build thread pool")?;
    // 每个查询只与同物种的参考图谱比较
    let results: Vec<SearchResult<'_>> = pool.install(|| {
        queries
            .par_iter()
            .map(|query| db.search(query, &opt.for_query(query)))
            .collect()
    });

    let summary: Vec<_> = results.iter().flat_map(|r| r.summary()).collect();
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    report::write_summary_markdown(&summary, &mut handle)?;
    writeln!(handle)?;

    if let Some(out_path) = out_path {
        let full = FullReport::concat(results.iter().map(|r| r.full_report()));
        let fh = std::fs::File::create(out_path)
            .with_context(|| format!("cannot create report '{}'", out_path.display()))?;
        report::write_full_csv(&full, fh, b',')?;
        log::info!("{} report rows", full.len());
        eprintln!("Full report written to {}", out_path.display());
    }
    Ok(())
}

fn run_db(path: Option<&std::path::Path>, dest: &std::path::Path) -> Result<()> {
    let db = match path {
        Some(path) => {
            let fh = std::fs::File::open(path)
                .with_context(|| format!("cannot open Cellosaurus file '{}'", path.display()))?;
            Database::from_flat_file(BufReader::new(fh))
                .with_context(|| format!("cannot parse Cellosaurus file '{}'", path.display()))?
        }
        None => Database::from_flat_file(std::io::stdin().lock())
            .context("cannot parse Cellosaurus data from stdin")?,
    };
    db.save(dest)
        .with_context(|| format!("cannot write database to '{}'", dest.display()))?;
    eprintln!("Database written to {}", dest.display());
    Ok(())
}
