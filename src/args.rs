use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "fave-rank")]
#[command(about = "Re-ranks catalog listings by favorites through a WebDriver-controlled browser")]
#[command(version)]
pub struct Args {
    /// Catalog URL to open (optional when resuming or set in the config file)
    pub uri: Option<String>,

    /// What to do once the page is open
    #[arg(short, long, value_enum, default_value_t = Mode::Watch)]
    pub mode: Mode,

    /// Path to a JSON configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// File holding the resumable collection state
    #[arg(long)]
    pub state: Option<String>,

    /// Fixed wait after moving to the next page, in milliseconds
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// Hard ceiling on pages visited in one run
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Write the sorted items to this file as JSON
    #[arg(short, long)]
    pub output: Option<String>,

    /// Persist the enable flag and exit
    #[arg(long)]
    pub set_enabled: Option<bool>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Show the sort controls in the page and act on clicks until Ctrl-C
    Watch,
    /// Sort the current page once and exit
    Current,
    /// Collect every page, sort, and exit
    All,
}
