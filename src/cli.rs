use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// File containing the grammar
    pub file: PathBuf,

    /// Start symbol (default: first in the file)
    #[arg(short, long, value_name = "SYMBOL")]
    pub start: Option<String>,

    /// Token dump to parse (one `kind<TAB>lexeme<TAB>line<TAB>column` per line)
    #[arg(short, long, value_name = "FILE")]
    pub tokens: Option<PathBuf>,

    /// Print the FIRST and FOLLOW sets
    #[arg(long)]
    pub sets: bool,

    /// Print the parse table
    #[arg(long)]
    pub table: bool,

    /// Print the syntax tree of the parsed tokens
    #[arg(long)]
    pub tree: bool,

    /// Run the scope analyzer on the parsed tokens
    #[arg(long)]
    pub check: bool,

    /// Amount of random sentences to generate
    #[arg(short = 'n', long, value_name = "AMOUNT")]
    pub amount: Option<u32>,

    /// Seed for sentence generation (default: random)
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Derivation depth after which generation takes the shortest way out
    #[arg(long, default_value_t = 12, value_name = "DEPTH")]
    pub max_depth: usize,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}
