use anyhow::{Context, Result, bail};
use clap::Parser;
use duckscript::{
    DirSource, Directive, HidTransport, Layout, PtyTransport, RecordingTransport, ReportTransport,
    Runtime, ScriptSource, Settings, parse_line,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "duckscript",
    about = "Run a keystroke-injection script against a HID device or a local program",
    version
)]
struct Args {
    /// Name of the script to run, relative to --dir
    script: String,

    /// Directory scripts are loaded from
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// HID gadget device to write keyboard reports to (e.g. /dev/hidg0)
    #[arg(long, conflicts_with = "command")]
    device: Option<PathBuf>,

    /// Program to run in a PTY and type into instead of a HID device
    #[arg(short, long)]
    command: Option<String>,

    /// Arguments to pass to --command
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,

    /// After the script, wait for the --command program to exit
    #[arg(long, requires = "command")]
    wait: bool,

    /// Pause after every keystroke line, in milliseconds
    #[arg(long, default_value_t = 5)]
    default_delay: u64,

    /// Random extra pause added to the default delay, in milliseconds
    #[arg(long, default_value_t = 0)]
    jitter: u64,

    /// Keyboard layout of the target machine
    #[arg(long, default_value = "US", value_parser = parse_layout)]
    locale: Layout,

    /// Only parse the script and list lines that will be ignored
    #[arg(long)]
    check: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_layout(name: &str) -> Result<Layout, String> {
    Layout::from_name(name).ok_or_else(|| format!("unknown layout '{name}' (expected US or GB)"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let source = Arc::new(DirSource::new(&args.dir));
    if args.check {
        return check(&source, &args.script, args.locale);
    }

    let settings = Settings {
        default_delay: Duration::from_millis(args.default_delay),
        jitter: Duration::from_millis(args.jitter),
        layout: args.locale,
    };
    let root = source.root().to_path_buf();
    let (transport, pty) = open_transport(&args)?;
    let runtime = Runtime::new(source, transport, settings);

    let stopper = runtime.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping script");
            stopper.stop_all();
        }
    });

    let report = runtime
        .run(&args.script)
        .await
        .with_context(|| {
            format!("Failed to run script {} from {}", args.script, root.display())
        })?;

    if let Some(pty) = pty {
        if args.wait {
            info!("waiting for command to exit");
            tokio::task::spawn_blocking(move || pty.wait())
                .await
                .context("PTY wait task failed")?
                .context("Failed to wait for command")?;
        } else {
            // Give the program time to echo the last keystrokes.
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }

    info!(
        lines = report.lines,
        repeats = report.repeats,
        completed = report.completed,
        "done"
    );
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Pick the transport; the PTY handle is also returned so `main` can wait on it.
fn open_transport(args: &Args) -> Result<(Arc<dyn HidTransport>, Option<Arc<PtyTransport>>)> {
    if let Some(device) = &args.device {
        let transport: Arc<dyn HidTransport> = Arc::new(
            ReportTransport::open(device)
                .with_context(|| format!("Failed to open HID device: {}", device.display()))?,
        );
        return Ok((transport, None));
    }
    if let Some(command) = &args.command {
        let transport = PtyTransport::spawn(command, &args.args, args.locale)
            .context("Failed to start PTY transport")?;
        let pty = Arc::new(transport);
        let transport: Arc<dyn HidTransport> = pty.clone();
        return Ok((transport, Some(pty)));
    }
    info!("no --device or --command given, dry run");
    let transport: Arc<dyn HidTransport> = Arc::new(RecordingTransport::new());
    Ok((transport, None))
}

/// Resolve every line of the script and report the ones that will be ignored.
fn check(source: &DirSource, name: &str, layout: Layout) -> Result<()> {
    let lines = source
        .open_script(name)
        .with_context(|| {
            format!("Failed to load script {name} from {}", source.root().display())
        })?;

    let mut layout = layout;
    let mut ignored = 0;
    for (index, line) in lines.iter().enumerate() {
        match parse_line(line, layout) {
            Directive::Unknown(keyword) => {
                println!("{}:{}: ignored '{}': {}", name, index + 1, keyword, line.trim());
                ignored += 1;
            }
            Directive::Locale(next) => layout = next,
            _ => {}
        }
    }

    if ignored > 0 {
        bail!("{ignored} of {} lines would be ignored", lines.len());
    }
    println!("{}: {} lines OK", name, lines.len());
    Ok(())
}
