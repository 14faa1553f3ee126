use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, bail};
use clap::{Args, Parser, Subcommand};

use spritegen::{
    BaseLayer, FrameSize, LayerCatalog, OutfitEntry, RenderStatus, SelectionState, SpriteConfig,
    SpriteGenerator,
};

#[derive(Parser, Debug)]
#[command(name = "spritegen", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a selection to a sprite-sheet PNG.
    Sheet(SheetArgs),
    /// Render a selection and write the walk-cycle preview frames as PNGs.
    Preview(PreviewArgs),
    /// List the sizes, body types and layer indexes of a catalog.
    Layers(LayersArgs),
}

#[derive(Args, Debug)]
struct SessionArgs {
    /// Configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Asset root directory (overrides the configuration).
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Layer catalog JSON (overrides the configuration).
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SheetArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Selection JSON.
    #[arg(long)]
    selection: PathBuf,

    /// Output PNG path.
    #[arg(long, default_value = "character_sheet.png")]
    out: PathBuf,

    /// Double the output size.
    #[arg(long)]
    upscale: bool,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Selection JSON.
    #[arg(long)]
    selection: PathBuf,

    /// Output directory for `frame_<n>.png`.
    #[arg(long)]
    out_dir: PathBuf,

    /// Number of walk-cycle frames to write.
    #[arg(long, default_value_t = 4)]
    frames: u32,
}

#[derive(Parser, Debug)]
struct LayersArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Only list this frame size, e.g. `48x64`.
    #[arg(long)]
    size: Option<FrameSize>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Sheet(args) => cmd_sheet(args),
        Command::Preview(args) => cmd_preview(args),
        Command::Layers(args) => cmd_layers(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &SessionArgs) -> anyhow::Result<SpriteConfig> {
    let mut cfg = match &args.config {
        Some(path) => SpriteConfig::from_path(path)?,
        None => SpriteConfig::default(),
    };
    if let Some(assets) = &args.assets {
        cfg.asset_root = assets.clone();
    }
    if let Some(catalog) = &args.catalog {
        cfg.catalog = catalog.clone();
    }
    Ok(cfg)
}

fn open_generator(args: &SessionArgs) -> anyhow::Result<SpriteGenerator> {
    let cfg = load_config(args)?;
    let catalog = LayerCatalog::from_path(&cfg.catalog)?;
    let source = spritegen::FsAssetSource::new(&cfg.asset_root);
    Ok(SpriteGenerator::new(catalog, source, cfg.generator_opts()?))
}

fn read_selection(path: &Path) -> anyhow::Result<SelectionState> {
    SelectionState::from_path(path).with_context(|| format!("load selection '{}'", path.display()))
}

fn render_now(generator: &mut SpriteGenerator, selection: SelectionState) -> anyhow::Result<()> {
    generator.render(selection)?;
    generator.advance(Duration::ZERO)?;
    match generator.status() {
        RenderStatus::Ready { .. } => Ok(()),
        RenderStatus::Stalled { .. } => match generator.last_error() {
            Some(e) => bail!("render abandoned: {e}"),
            None => bail!("render abandoned"),
        },
        other => bail!("render did not complete: {other:?}"),
    }
}

fn cmd_sheet(args: SheetArgs) -> anyhow::Result<()> {
    let mut generator = open_generator(&args.session)?;
    let mut selection = read_selection(&args.selection)?;
    selection.upscale |= args.upscale;
    render_now(&mut generator, selection)?;

    let sheet = generator
        .sheet()
        .context("no sheet after a completed render")?;
    sheet.write_png(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let mut generator = open_generator(&args.session)?;
    let selection = read_selection(&args.selection)?;
    render_now(&mut generator, selection)?;

    let opts = generator.opts().animation;
    for n in 0..args.frames {
        let preview = generator
            .preview()
            .context("walk-cycle preview is not running")?;
        let out = args.out_dir.join(format!("frame_{n}.png"));
        preview.write_png(&out)?;
        eprintln!("wrote {}", out.display());

        // Step tick by tick until the cycle moves to its next frame.
        let current = generator.animation().frame_index();
        let mut waited = Duration::ZERO;
        while generator.animation().frame_index() == current && waited <= opts.frame_delay {
            generator.advance(opts.tick_interval)?;
            waited += opts.tick_interval;
        }
    }
    Ok(())
}

fn cmd_layers(args: LayersArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.session)?;
    let catalog = LayerCatalog::from_path(&cfg.catalog)?;

    for size in catalog.sizes() {
        if args.size.is_some_and(|s| s != size) {
            continue;
        }
        let layers = catalog.size(size)?;
        println!("{size}");

        for body in layers.body_types() {
            let counts = layers.base_indexes(body)?;
            let row: Vec<String> = BaseLayer::ALL
                .iter()
                .map(|l| format!("{l} {}", counts.get(l).copied().unwrap_or(0)))
                .collect();
            println!("  base {body}: {}", row.join(", "));
        }

        for (layer, entry) in layers.outfits() {
            let count = entry.count(layer)?;
            let mapped = if matches!(entry, OutfitEntry::Mapped { .. }) {
                " (body mapped)"
            } else {
                ""
            };
            println!("  outfit {layer}: {count}{mapped}");
            for idx in 1..=count {
                if let Some(label) = catalog.label(layer.name(), idx) {
                    println!("    {idx}: {label}");
                }
            }
        }
    }
    Ok(())
}
