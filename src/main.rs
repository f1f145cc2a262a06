use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pagescriber::draw::{PenTool, Stroke, StrokeKind};
use pagescriber::project;
use pagescriber::util::ViewTransform;
use pagescriber::{Annotator, Config};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("PAGESCRIBER_GIT_HASH"),
    ")"
);

/// Canvas size used when no background document gives the page size.
const BLANK_PAGE_SIZE: (f64, f64) = (800.0, 600.0);
const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(name = "pagescriber")]
#[command(version = VERSION, about = "Annotation surface for paginated documents")]
struct Cli {
    /// Config file to use instead of ~/.config/pagescriber/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export one page with its annotations to PNG
    Render {
        /// Project file to render
        project: PathBuf,

        /// PNG file to write
        #[arg(long, short = 'o', value_name = "FILE")]
        output: PathBuf,

        /// 1-based page number
        #[arg(long, short = 'p', default_value_t = 1)]
        page: u32,

        /// Background document (overrides the one stored in the project)
        #[arg(long, short = 'b', value_name = "DIR")]
        background: Option<PathBuf>,

        /// Device pixels per document unit
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
    },
    /// Summarize the strokes on every page of a project
    Inspect {
        project: PathBuf,
    },
    /// Report the topmost stroke at a device position
    Hit {
        project: PathBuf,

        x: f64,

        y: f64,

        #[arg(long, short = 'p', default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 1.0)]
        scale: f64,
    },
    /// Write a default config file
    InitConfig,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Render {
            project,
            output,
            page,
            background,
            scale,
        } => {
            let config = load_config(cli.config.as_deref())?;
            render(&config, &project, &output, page, background, scale)
        }
        Command::Inspect { project } => inspect(&project),
        Command::Hit {
            project,
            x,
            y,
            page,
            scale,
        } => {
            let config = load_config(cli.config.as_deref())?;
            hit(&config, &project, page, x, y, scale)
        }
        Command::InitConfig => {
            let path = Config::create_default_file()?;
            println!("Wrote default config to {}", path.display());
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

fn render(
    config: &Config,
    project_path: &Path,
    output: &Path,
    page: u32,
    background: Option<PathBuf>,
    scale: f64,
) -> Result<()> {
    let runtime = runtime()?;
    let mut app = Annotator::new(config, runtime.handle())?;
    let stored = app.load_project(project_path)?;

    let explicit = background.is_some();
    if let Some(dir) = background.or(stored.map(|bg| bg.path)) {
        match runtime.block_on(app.open(&dir)) {
            Ok(_) => {}
            Err(err) if !explicit => warn!("Rendering without background: {err:#}"),
            Err(err) => return Err(err),
        }
    }

    let page = app.go_to_page(page);
    if app.document().is_some() && !runtime.block_on(app.wait_for_page(PAGE_LOAD_TIMEOUT)) {
        warn!("Background for page {} is unavailable; rendering annotations only", page);
    }

    let transform = ViewTransform::with_scale(scale);
    let (doc_width, doc_height) = app
        .document()
        .and_then(|document| document.page(page))
        .map(|meta| (meta.width, meta.height))
        .unwrap_or(BLANK_PAGE_SIZE);
    let width = (doc_width * transform.scale).ceil().max(1.0) as i32;
    let height = (doc_height * transform.scale).ceil().max(1.0) as i32;

    app.set_transform(transform);
    app.resize(width, height);

    let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, width, height)
        .context("failed to allocate export surface")?;
    {
        let ctx = cairo::Context::new(&surface).context("failed to create cairo context")?;
        app.render_now(&ctx);
    }
    surface.flush();

    let mut file = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    surface
        .write_to_png(&mut file)
        .map_err(|err| anyhow!("failed to write PNG {}: {err}", output.display()))?;

    let strokes = app.store().page_strokes(page).count();
    info!("Rendered page {} to {}", page, output.display());
    println!(
        "Wrote {} ({}x{}, page {}, {} strokes)",
        output.display(),
        width,
        height,
        page,
        strokes
    );
    Ok(())
}

fn inspect(project_path: &Path) -> Result<()> {
    let project = project::load(project_path)?;

    println!("Project: {}", project_path.display());
    println!("Saved: {}", project.saved_at);
    match &project.background {
        Some(bg) => println!("Background: {} ({} pages)", bg.path.display(), bg.page_count),
        None => println!("Background: none"),
    }
    println!("Strokes: {}", project.strokes.len());

    let mut pages: BTreeMap<u32, BTreeMap<&'static str, usize>> = BTreeMap::new();
    for stroke in &project.strokes {
        *pages
            .entry(stroke.page_id)
            .or_default()
            .entry(kind_label(stroke))
            .or_default() += 1;
    }
    for (page, kinds) in pages {
        let total: usize = kinds.values().sum();
        let breakdown = kinds
            .iter()
            .map(|(kind, count)| format!("{kind} {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!("Page {page}: {total} ({breakdown})");
    }
    Ok(())
}

fn kind_label(stroke: &Stroke) -> &'static str {
    match &stroke.kind {
        StrokeKind::Freehand { tool } => match tool {
            PenTool::Pen => "pen",
            PenTool::Highlighter => "highlighter",
            PenTool::Eraser => "eraser",
        },
        StrokeKind::Shape { shape } => shape.as_str(),
        StrokeKind::Text { .. } => "text",
        StrokeKind::Unrecognized(_) => "unrecognized",
    }
}

fn hit(config: &Config, project_path: &Path, page: u32, x: f64, y: f64, scale: f64) -> Result<()> {
    let runtime = runtime()?;
    let mut app = Annotator::new(config, runtime.handle())?;
    app.load_project(project_path)?;
    app.go_to_page(page);
    app.set_transform(ViewTransform::with_scale(scale));

    match app.stroke_at(x, y) {
        Some(id) => {
            let kind = app
                .store()
                .stroke(&id)
                .map(kind_label)
                .unwrap_or("unknown");
            println!("{id} {kind}");
        }
        None => println!("No stroke at ({x}, {y}) on page {page}"),
    }
    Ok(())
}
