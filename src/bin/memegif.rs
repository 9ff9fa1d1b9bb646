use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use memegif::{
    ExportParams, ExportThreading, FontBook, JsonFileHistory, JsonFileSettings, MemeSession,
    MemoryHistory, MemorySettings, RenderConfig, Renderer, Settings,
};

#[derive(Parser, Debug)]
#[command(name = "memegif", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Export the 2 s animation as a looping GIF.
    Export(ExportArgs),
    /// List or delete saved memes.
    History(HistoryArgs),
    /// Unlock VIP animations for a store directory.
    Vip(StoreArgs),
}

#[derive(Parser, Debug)]
struct FontArgs {
    /// Font file used for text (falls back to $MEMEGIF_FONT).
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct StoreArgs {
    /// Directory holding history.json and settings.json.
    #[arg(long)]
    store_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Render config JSON (camelCase keys). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Animation time in milliseconds.
    #[arg(long, default_value_t = 0.0)]
    time_ms: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    font: FontArgs,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Render config JSON (camelCase keys). Without it the stored or default config is used.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output `.gif` file, or a directory to save under the suggested name.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Persist history and settings here; otherwise the export is not recorded.
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Worker threads for frame rendering.
    #[arg(long)]
    threads: Option<usize>,

    /// Render frames one at a time on the calling thread.
    #[arg(long)]
    sequential: bool,

    /// GIF palette quantization speed (1 = best, 30 = fastest).
    #[arg(long, default_value_t = memegif::export::DEFAULT_SPEED)]
    speed: i32,

    #[command(flatten)]
    font: FontArgs,
}

#[derive(Parser, Debug)]
struct HistoryArgs {
    #[command(subcommand)]
    action: HistoryAction,
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// Print the 20 newest records.
    List(StoreArgs),
    /// Print the config JSON of one record.
    Show {
        id: String,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Delete one record.
    Delete {
        id: String,
        #[command(flatten)]
        store: StoreArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Export(args) => cmd_export(args),
        Command::History(args) => cmd_history(args),
        Command::Vip(args) => cmd_vip(args),
    }
}

fn read_config_json(path: &Path) -> anyhow::Result<RenderConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config '{}'", path.display()))?;
    Ok(RenderConfig::from_json(&text)?)
}

fn load_fonts(args: &FontArgs) -> anyhow::Result<FontBook> {
    let fonts = match &args.font {
        Some(path) => FontBook::from_path(path)?,
        None => FontBook::from_env()?,
    };
    if fonts.is_empty() {
        eprintln!("note: no font given (--font or $MEMEGIF_FONT); text will not be drawn");
    }
    Ok(fonts)
}

fn history_path(dir: &Path) -> PathBuf {
    dir.join("history.json")
}

fn settings_path(dir: &Path) -> PathBuf {
    dir.join("settings.json")
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(p) => read_config_json(p)?,
        None => RenderConfig::default(),
    };
    let fonts = load_fonts(&args.font)?;
    let avatar = config
        .avatar_image
        .as_deref()
        .map(memegif::decode_avatar_source)
        .transpose()
        .unwrap_or_else(|e| {
            eprintln!("warning: avatar not loaded ({e}); drawing placeholder");
            None
        });

    let mut renderer = Renderer::new(&fonts)?;
    let frame = renderer.render(&config, avatar.as_ref(), args.time_ms);

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let fonts = load_fonts(&args.font)?;
    let params = ExportParams {
        speed: args.speed,
        threading: ExportThreading {
            parallel: !args.sequential,
            threads: args.threads,
        },
        ..ExportParams::default()
    };

    match &args.store_dir {
        Some(dir) => {
            let history = JsonFileHistory::open(history_path(dir))?;
            let settings = JsonFileSettings::new(settings_path(dir));
            let session = MemeSession::open(history, settings, fonts)?.with_params(params);
            run_export(&session, &args)
        }
        None => {
            // Without a store there is nothing to unlock, so the VIP gate stays open.
            let settings = MemorySettings::new(Settings {
                is_vip: true,
                saved_config: None,
            });
            let session =
                MemeSession::open(MemoryHistory::new(), settings, fonts)?.with_params(params);
            run_export(&session, &args)
        }
    }
}

fn run_export<H, S>(session: &MemeSession<H, S>, args: &ExportArgs) -> anyhow::Result<()>
where
    H: memegif::HistoryStore,
    S: memegif::SettingsStore,
{
    if let Some(p) = &args.config {
        session.set_config(read_config_json(p)?)?;
    }

    let outcome = session.export()?;
    let artifact = &outcome.artifact;
    let path = if args.out.extension().is_some_and(|e| e.eq_ignore_ascii_case("gif")) {
        artifact.save_as(&args.out)?;
        args.out.clone()
    } else {
        artifact.save_in(&args.out)?
    };

    eprintln!(
        "wrote {} ({} frames, {} bytes)",
        path.display(),
        artifact.frame_count,
        artifact.bytes.len()
    );
    if args.store_dir.is_some() {
        match &outcome.saved {
            Ok(record) => eprintln!("saved to history as {}", record.id),
            Err(e) => eprintln!("warning: history not saved: {e}"),
        }
    }
    Ok(())
}

fn cmd_history(args: HistoryArgs) -> anyhow::Result<()> {
    use memegif::HistoryStore as _;

    match args.action {
        HistoryAction::List(store) => {
            let history = JsonFileHistory::open(history_path(&store.store_dir))?;
            for record in history.list(memegif::HISTORY_LIMIT)? {
                println!(
                    "{}\t{}\t{}\t{}",
                    record.id, record.created_at_ms, record.config.animation_type, record.title
                );
            }
        }
        HistoryAction::Show { id, store } => {
            let history = JsonFileHistory::open(history_path(&store.store_dir))?;
            let record = history
                .get(&id)?
                .with_context(|| format!("no history record '{id}'"))?;
            println!("{}", record.config.to_json_pretty()?);
        }
        HistoryAction::Delete { id, store } => {
            let mut history = JsonFileHistory::open(history_path(&store.store_dir))?;
            if history.delete(&id)? {
                eprintln!("deleted {id}");
            } else {
                eprintln!("no history record '{id}'");
            }
        }
    }
    Ok(())
}

fn cmd_vip(args: StoreArgs) -> anyhow::Result<()> {
    let session = MemeSession::open(
        JsonFileHistory::open(history_path(&args.store_dir))?,
        JsonFileSettings::new(settings_path(&args.store_dir)),
        FontBook::empty(),
    )?;
    session.unlock_vip()?;
    eprintln!("vip unlocked for {}", args.store_dir.display());
    Ok(())
}
