use clap::{Parser, Subcommand, ValueEnum};
use figcui_lib::AssetMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "figcui")]
#[command(
    version,
    about = "Figma to Rust CUI - generate Oxide UI plugins from design trees",
    long_about = "figcui\n\nModes:\n- generate: turn a root frame (node snapshot JSON or Figma URL) into an Oxide CUI plugin and a diagnostic summary, uploading or writing its raster images.\n- import: rebuild a node tree from a JSON document and print the resulting snapshot.\n\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML) for export scale, author, fonts and upload settings; CLI flags override config"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate an Oxide CUI plugin from a root frame
    Generate {
        #[arg(
            long,
            help = "Design input (node snapshot .json, or Figma URL with node-id; needs FIGMA_TOKEN)"
        )]
        input: String,

        #[arg(
            long,
            default_value = "figcui-out",
            value_name = "PATH",
            help = "Directory for the plugin source, summary.txt and local images; created if missing"
        )]
        output_dir: PathBuf,

        #[arg(
            long,
            value_name = "URL",
            help = "Image upload endpoint (overrides upload.endpoint); images are written to <output-dir>/images when unset"
        )]
        endpoint: Option<String>,

        #[arg(
            long,
            value_name = "TOKEN",
            help = "API token forwarded to the upload endpoint (default: FIGCUI_API_TOKEN)"
        )]
        api_token: Option<String>,

        #[arg(long, help = "Raster scale for image exports (overrides export_scale)")]
        scale: Option<f64>,

        #[arg(long, help = "Author written into the plugin's [Info] attribute")]
        author: Option<String>,

        #[arg(
            long,
            value_enum,
            help = "How the plugin finds its images: uploaded URLs, or PNGs in the Oxide data directory (overrides asset_mode)"
        )]
        asset_mode: Option<AssetModeArg>,

        #[arg(long, value_enum, default_value = "json", help = "Output format")]
        format: OutputFormat,

        #[arg(long, short, help = "Write the result report to this file (stdout if omitted)")]
        output: Option<PathBuf>,
    },

    /// Rebuild a node tree from a JSON document
    Import {
        #[arg(long, help = "JSON document describing the node tree")]
        input: PathBuf,

        #[arg(
            long,
            short,
            help = "Write the rebuilt tree snapshot to this file (inlined in the report if omitted)"
        )]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "json", help = "Output format")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AssetModeArg {
    Urls,
    Data,
}

impl From<AssetModeArg> for AssetMode {
    fn from(arg: AssetModeArg) -> Self {
        match arg {
            AssetModeArg::Urls => AssetMode::Urls,
            AssetModeArg::Data => AssetMode::Data,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
}

pub fn parse() -> Cli {
    Cli::parse()
}
