use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "clipscan", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the corpus, rank the results and emit images of the worst scenes.
    Scan(ScanArgs),
    /// Evaluate a single scene and emit its two images.
    One(OneArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// JSON config file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Corpus root holding the partition directories.
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Output root for checkpoints, images and the summary.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Do not load system fonts; SVG text renders nothing.
    #[arg(long)]
    no_system_fonts: bool,

    /// More logging (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Args, Debug)]
struct ScanArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Worker threads for the concurrent scan.
    #[arg(long)]
    threads: Option<usize>,

    /// Scan partitions one after another.
    #[arg(long)]
    sequential: bool,

    /// Scan partitions 1..=N.
    #[arg(long)]
    max_partitions: Option<u32>,

    /// Capacity of each ranking.
    #[arg(long)]
    max_files: Option<usize>,

    /// Use the replace-first-smaller ranking policy.
    #[arg(long)]
    legacy_topk: bool,

    /// Skip writing images of the worst scenes.
    #[arg(long)]
    no_emit: bool,
}

#[derive(Args, Debug)]
struct OneArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Partition holding the scene.
    #[arg(long)]
    partition: u32,

    /// Scene file name inside the partition directory.
    #[arg(long)]
    scene: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Scan(args) => cmd_scan(args),
        Command::One(args) => cmd_one(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "clipscan=info",
        1 => "clipscan=debug",
        _ => "clipscan=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(args: &CommonArgs) -> anyhow::Result<clipscan::HarnessConfig> {
    let mut cfg = match &args.config {
        Some(path) => clipscan::HarnessConfig::from_json_path(path)?,
        None => clipscan::HarnessConfig::default(),
    };
    if let Some(corpus) = &args.corpus {
        cfg.corpus_root = corpus.clone();
    }
    if let Some(out) = &args.out {
        cfg.output_root = out.clone();
    }
    Ok(cfg)
}

fn make_renderer(args: &CommonArgs) -> clipscan::SvgRenderer {
    if args.no_system_fonts {
        clipscan::SvgRenderer::without_fonts()
    } else {
        clipscan::SvgRenderer::with_system_fonts()
    }
}

fn cmd_scan(args: ScanArgs) -> anyhow::Result<()> {
    init_tracing(args.common.verbose);
    let mut cfg = load_config(&args.common)?;
    if args.threads.is_some() {
        cfg.threads = args.threads;
    }
    if args.sequential {
        cfg.parallel = false;
    }
    if let Some(n) = args.max_partitions {
        cfg.max_partitions = n;
    }
    if let Some(n) = args.max_files {
        cfg.max_files = n;
    }
    if args.legacy_topk {
        cfg.topk_policy = clipscan::TopKPolicy::ReplaceFirstSmaller;
    }
    cfg.validate()?;

    let renderer = make_renderer(&args.common);
    let denylist = clipscan::Denylist::with_extra(&cfg.denylist);
    let ctx = clipscan::ScanContext {
        config: &cfg,
        renderer: &renderer,
        denylist: &denylist,
    };

    let outcome = clipscan::run_scan(&ctx)?;
    clipscan::log_rankings(&outcome.tracker);
    if !args.no_emit {
        clipscan::emit_worst(&ctx, &outcome.tracker.worst().sorted_desc());
    }
    let path = clipscan::write_summary(&cfg, &outcome.summary())?;

    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_one(args: OneArgs) -> anyhow::Result<()> {
    init_tracing(args.common.verbose);
    let cfg = load_config(&args.common)?;
    cfg.validate()?;

    let partition = clipscan::PartitionId::new(args.partition)?;
    let scene = clipscan::SceneName::new(args.scene)?;
    let renderer = make_renderer(&args.common);
    let denylist = clipscan::Denylist::with_extra(&cfg.denylist);
    let ctx = clipscan::ScanContext {
        config: &cfg,
        renderer: &renderer,
        denylist: &denylist,
    };

    let result = clipscan::evaluate_one(&ctx, partition, &scene)
        .with_context(|| format!("evaluate partition {partition} scene '{scene}'"))?;
    println!(
        "{}",
        serde_json::to_string(&result).context("serialize result")?
    );
    Ok(())
}
