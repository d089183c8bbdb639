use eddy::{NodeAlign, SankeyConfig, SankeyInput, SankeyLayout};
use serde::Serialize;
use std::io::{Read, Write};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Layout(eddy::Error),
    Config(json5::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Layout(err) => write!(f, "{err}"),
            CliError::Config(err) => write!(f, "config error: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<eddy::Error> for CliError {
    fn from(value: eddy::Error) -> Self {
        Self::Layout(value)
    }
}

impl From<json5::Error> for CliError {
    fn from(value: json5::Error) -> Self {
        Self::Config(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Layout,
    Paths,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputFormat {
    Json,
    Csv,
}

impl FromStr for InputFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    format: Option<InputFormat>,
    config: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
    align: Option<NodeAlign>,
}

fn usage() -> &'static str {
    "eddy-cli\n\
\n\
USAGE:\n\
  eddy-cli [layout] [--pretty] [--format json|csv] [--config <file.json5>] [--width <w>] [--height <h>] [--align left|right|center|justify] [<path>|-]\n\
  eddy-cli paths [--format json|csv] [--config <file.json5>] [--width <w>] [--height <h>] [--align <mode>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Without --format, `.csv` files and text not starting with '{' are read as sankey CSV.\n\
  - layout prints the full layout as JSON; paths prints `source<TAB>target<TAB>d` per link.\n\
  - Set EDDY_LOG (e.g. EDDY_LOG=debug) to see pipeline events on stderr.\n\
"
}

fn parse_f64(value: Option<&String>) -> Result<f64, CliError> {
    let Some(raw) = value else {
        return Err(CliError::Usage(usage()));
    };
    let v = raw.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
    if !(v.is_finite() && v > 0.0) {
        return Err(CliError::Usage(usage()));
    }
    Ok(v)
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "paths" => args.command = Command::Paths,
            "--pretty" => args.pretty = true,
            "--format" => {
                let Some(fmt) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.format = Some(
                    fmt.parse::<InputFormat>()
                        .map_err(|_| CliError::Usage(usage()))?,
                );
            }
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--width" => args.width = Some(parse_f64(it.next())?),
            "--height" => args.height = Some(parse_f64(it.next())?),
            "--align" => {
                let Some(mode) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.align = Some(match mode.as_str() {
                    "left" => NodeAlign::Left,
                    "right" => NodeAlign::Right,
                    "center" => NodeAlign::Center,
                    "justify" => NodeAlign::Justify,
                    _ => return Err(CliError::Usage(usage())),
                });
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn detect_format(input: Option<&str>, text: &str) -> InputFormat {
    let by_extension = input
        .and_then(|p| std::path::Path::new(p).extension())
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match by_extension.as_deref() {
        Some("csv") => InputFormat::Csv,
        Some("json") => InputFormat::Json,
        _ if text.trim_start().starts_with('{') => InputFormat::Json,
        _ => InputFormat::Csv,
    }
}

fn load_config(args: &Args) -> Result<SankeyConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => json5::from_str::<SankeyConfig>(&std::fs::read_to_string(path)?)?,
        None => SankeyConfig::default(),
    };
    if let Some(w) = args.width {
        config.width = w;
    }
    if let Some(h) = args.height {
        config.height = h;
    }
    if let Some(align) = args.align {
        config.node_align = align;
    }
    Ok(config)
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut out, value)?;
    } else {
        serde_json::to_writer(&mut out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_paths(layout: &SankeyLayout<String>) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    for link in &layout.links {
        writeln!(out, "{}\t{}\t{}", link.source, link.target, link.d)?;
    }
    Ok(())
}

fn run(args: Args) -> Result<(), CliError> {
    let config = load_config(&args)?;
    let text = read_input(args.input.as_deref())?;
    let format = args
        .format
        .unwrap_or_else(|| detect_format(args.input.as_deref(), &text));
    let input: SankeyInput = match format {
        InputFormat::Json => eddy::parse_json(&text)?,
        InputFormat::Csv => eddy::parse_csv(&text)?,
    };
    tracing::info!(?format, "laying out graph");

    let layout = eddy::layout_input(input, &config)?;
    match args.command {
        Command::Layout => write_json(&layout, args.pretty),
        Command::Paths => write_paths(&layout),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("EDDY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_tracing();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
