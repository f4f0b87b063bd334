use std::fs::File;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use pageloupe::event_source::TerminalEventSource;
use pageloupe::export::{loupe_image, summarize_pages, zoomed_image};
use pageloupe::fetch::{Fetcher, SourceLocation};
use pageloupe::page::{PageDescriptor, RenderPipeline, ServiceConfig, TiffDecoder, load_pages};
use pageloupe::panic_handler::initialize_panic_handler;
use pageloupe::settings::{Settings, get_settings, load_settings};
use pageloupe::surface::RasterSurface;
use pageloupe::{App, AppConfig, run_app_with_event_source};

#[derive(Parser, Debug)]
#[command(name = "pageloupe", version, about = "Terminal viewer for multi-page TIFF documents")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    view: ViewArgs,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "pageloupe.log")]
    log_file: PathBuf,

    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the interactive viewer (the default)
    View(ViewArgs),
    /// Print page count and per-page sizes
    Info {
        /// TIFF file path or http(s) URL
        source: Option<String>,
    },
    /// Write one page as PNG at a zoom level, with region outlines
    Export {
        source: Option<String>,
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 1.0)]
        zoom: f32,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write the loupe image for a page position as PNG
    Loupe {
        source: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        x: f32,
        #[arg(long)]
        y: f32,
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// TIFF file path or http(s) URL
    source: Option<String>,
    /// 1-based page shown after loading
    #[arg(long)]
    page: Option<usize>,
    #[arg(long)]
    no_magnifier: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    WriteLogger::init(cli.log_level, Config::default(), File::create(&cli.log_file)?)?;
    initialize_panic_handler();
    info!("Starting pageloupe");

    load_settings(cli.config.as_deref());
    let settings = get_settings();

    let result = match cli.command {
        None => run_viewer(&settings, cli.view),
        Some(Command::View(args)) => run_viewer(&settings, args),
        Some(Command::Info { source }) => print_info(&settings, source),
        Some(Command::Export {
            source,
            page,
            zoom,
            output,
        }) => export_page(&settings, source, page, zoom, &output),
        Some(Command::Loupe {
            source,
            page,
            x,
            y,
            output,
        }) => export_loupe(&settings, source, page, x, y, &output),
    };

    if let Err(e) = &result {
        error!("{e:?}");
    }
    info!("Shutting down pageloupe");
    result
}

fn resolve_source(settings: &Settings, source: Option<String>) -> Result<SourceLocation> {
    source
        .or_else(|| settings.source.clone())
        .map(|raw| SourceLocation::parse(&raw))
        .ok_or_else(|| anyhow!("no source given and none configured"))
}

fn service_config(settings: &Settings) -> ServiceConfig {
    ServiceConfig {
        cache_size: settings.page_cache_size,
        fetch_timeout: Duration::from_secs(settings.fetch_timeout_secs),
    }
}

fn fetch_pages(settings: &Settings, source: &SourceLocation) -> Result<Vec<PageDescriptor>> {
    let fetcher = Fetcher::new(service_config(settings).fetch_timeout);
    load_pages(&fetcher, &TiffDecoder, source).with_context(|| format!("cannot open {source}"))
}

fn render_page(settings: &Settings, source: Option<String>, page: usize) -> Result<RasterSurface> {
    let source = resolve_source(settings, source)?;
    let pages = fetch_pages(settings, &source)?;
    let Some(descriptor) = page.checked_sub(1).and_then(|index| pages.get(index)) else {
        bail!("page {page} out of range (1-{})", pages.len());
    };
    let mut surface = RasterSurface::new();
    RenderPipeline::default()
        .render(descriptor, pages.len(), &mut surface)
        .outcome?;
    Ok(surface)
}

fn run_viewer(settings: &Settings, args: ViewArgs) -> Result<()> {
    let source = args
        .source
        .or_else(|| settings.source.clone())
        .map(|raw| SourceLocation::parse(&raw));
    let config = AppConfig {
        source,
        fields: settings.regions.clone(),
        regions: settings.region_set().unwrap_or_default(),
        magnifier_enabled: settings.magnifier_enabled && !args.no_magnifier,
        initial_page: args.page.and_then(|page| page.checked_sub(1)),
        service: service_config(settings),
    };

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);
    app.start();
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut TerminalEventSource);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn print_info(settings: &Settings, source: Option<String>) -> Result<()> {
    let source = resolve_source(settings, source)?;
    let pages = fetch_pages(settings, &source)?;
    println!("{source}: {} page(s)", pages.len());
    for summary in summarize_pages(&RenderPipeline::default(), &pages) {
        match summary.size {
            Ok((width, height)) => println!("  page {}: {width}x{height}", summary.page + 1),
            Err(e) => println!("  page {}: unreadable ({e})", summary.page + 1),
        }
    }
    Ok(())
}

fn export_page(
    settings: &Settings,
    source: Option<String>,
    page: usize,
    zoom: f32,
    output: &Path,
) -> Result<()> {
    let surface = render_page(settings, source, page)?;
    let regions = settings.region_set()?;
    zoomed_image(&surface, zoom, Some(&regions))
        .save(output)
        .with_context(|| format!("cannot write {}", output.display()))?;
    info!("Exported page {page} to {}", output.display());
    Ok(())
}

fn export_loupe(
    settings: &Settings,
    source: Option<String>,
    page: usize,
    x: f32,
    y: f32,
    output: &Path,
) -> Result<()> {
    let surface = render_page(settings, source, page)?;
    let image = loupe_image(&surface, x, y).ok_or_else(|| anyhow!("page {page} is empty"))?;
    image
        .save(output)
        .with_context(|| format!("cannot write {}", output.display()))?;
    info!("Wrote loupe at ({x}, {y}) on page {page} to {}", output.display());
    Ok(())
}
