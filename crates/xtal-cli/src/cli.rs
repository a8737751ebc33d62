use clap::Parser;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    name = "map2sf",
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "map2sf - Transforms a CCP4 map into amplitude and phase columns of an MTZ file.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    /// Input CCP4 map (optionally gzipped).
    #[arg(value_name = "MAP_FILE")]
    pub map_file: PathBuf,

    /// Output reflection file; only the .mtz extension is supported.
    #[arg(value_name = "OUTPUT_FILE")]
    pub output_file: PathBuf,

    /// Label of the new amplitude column.
    #[arg(value_name = "COL_F")]
    pub col_f: String,

    /// Label of the new phase column.
    #[arg(value_name = "COL_PH")]
    pub col_ph: String,

    /// Print progress to stderr (-v), plus debug (-vv) or trace (-vvv) logs
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Add the new columns to the reflections of an existing MTZ file
    #[arg(short, long, value_name = "PATH")]
    pub base: Option<PathBuf>,

    /// Dataset that receives the new columns
    #[arg(long, value_name = "NAME")]
    pub section: Option<String>,

    /// High-resolution limit in Angstroms (ignored together with --base)
    #[arg(long, value_name = "FLOAT")]
    pub dmin: Option<f64>,

    /// Column type of the amplitude column
    #[arg(long, value_name = "CHAR")]
    pub ftype: Option<char>,

    /// Column type of the phase column
    #[arg(long, value_name = "CHAR")]
    pub phitype: Option<char>,

    /// TOML file with defaults for base, section, dmin, ftype and phitype.
    /// Command-line options take precedence.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
