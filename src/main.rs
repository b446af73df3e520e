use clap::Parser;
use std::path::PathBuf;
use tracing::{Level, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber, filter::LevelFilter};

use watermarker::{
    Compositor, Config, FilePicker, ImageSource, PathPicker, Presenter, SavePresenter, Session,
    WatermarkFont, startup_checks,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Stamp centered, semi-transparent text onto an image", long_about = None)]
struct Cli {
    /// Image to watermark (.png, .jpg or .jpeg). Opens a file dialog when
    /// omitted and the `dialog` feature is enabled.
    image: Option<PathBuf>,

    /// Watermark text
    #[arg(short, long)]
    text: String,

    /// Where to write the result. Defaults to `<image>_watermarked.png`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set up logging first
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // RUST_LOG, when set, refines or overrides the command-line level
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load(&cli.config)?;
    info!("Font: {:?}", config.font.path);

    if let Err(errors) = startup_checks::perform_startup_checks(&config) {
        for e in &errors {
            error!("Startup check failed: {}", e);
        }
        if errors.iter().any(|e| e.is_fatal()) {
            error!("Critical startup check failed, exiting");
            return Err("Critical startup check failed".into());
        }
        warn!("Non-critical startup checks failed, continuing");
    }

    let font = WatermarkFont::load(&config.font.path)?;
    let mut session = Session::new(Compositor::new(font, config.watermark.clone()));

    let picker = picker_for(cli.image)?;
    if !session.load(&ImageSource::new(), picker.as_ref())? {
        info!("No image selected, nothing to do");
        return Ok(());
    }

    let watermarked = match session.watermark(&cli.text) {
        Ok(image) => image,
        Err(e) if e.is_user_input() => {
            println!("{}", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let output = match (cli.output, session.image_path()) {
        (Some(path), _) => path,
        (None, Some(input)) => SavePresenter::default_output_path(input),
        (None, None) => PathBuf::from("watermarked.png"),
    };
    SavePresenter::new(output, config.output.jpeg_quality).present(&watermarked)?;

    Ok(())
}

fn picker_for(image: Option<PathBuf>) -> Result<Box<dyn FilePicker>, Box<dyn std::error::Error>> {
    match image {
        Some(path) => Ok(Box::new(PathPicker::new(path))),
        #[cfg(feature = "dialog")]
        None => Ok(Box::new(watermarker::source::DialogPicker)),
        #[cfg(not(feature = "dialog"))]
        None => Err("No image given (build with the `dialog` feature for a file picker)".into()),
    }
}
