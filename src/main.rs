use std::error::Error;
use std::fs::File;
use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use diff_hunks::{DiffDocument, Direction, Side};

#[derive(Parser)]
#[command(name = "diff-hunks")]
#[command(about = "Inspect unified diffs and extract stageable sub-diffs")]
struct Cli {
    /// Diff file to read; stdin when omitted
    #[arg(global = true, long)]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List parsed hunks with header numbers and file pair
    Hunks,
    /// List the file pairs the diff touches
    Files,
    /// Map a diff-text line (0-based) to a file line
    Map {
        #[arg(long)]
        line: usize,
        #[arg(long, value_enum)]
        side: MapSide,
    },
    /// Extract the changes in a diff-text line range
    Lines {
        #[arg(long)]
        start: usize,
        #[arg(long)]
        end: usize,
        /// Emit the inverse patch (unstage direction)
        #[arg(long)]
        reverse: bool,
    },
    /// Extract the whole hunk containing a diff-text line
    Hunk {
        #[arg(long)]
        line: usize,
        /// Emit the inverse patch (unstage direction)
        #[arg(long)]
        reverse: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MapSide {
    Source,
    Target,
}

fn load(input: Option<&PathBuf>) -> Result<DiffDocument, Box<dyn Error>> {
    let doc = match input {
        Some(path) => DiffDocument::from_reader(File::open(path)?)?,
        None => DiffDocument::from_reader(io::stdin().lock())?,
    };
    Ok(doc)
}

fn direction(reverse: bool) -> Direction {
    if reverse {
        Direction::Reverse
    } else {
        Direction::Forward
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let doc = load(cli.input.as_ref())?;

    match cli.command {
        Commands::Hunks => {
            for hunk in doc.hunks() {
                println!(
                    "{}: @@ -{},{} +{},{} @@{} ({} -> {})",
                    hunk.heading_line_index,
                    hunk.src_start,
                    hunk.src_count,
                    hunk.tgt_start,
                    hunk.tgt_count,
                    hunk.heading,
                    hunk.source_file,
                    hunk.target_file
                );
            }
            if doc.parse_failed() {
                eprintln!("warning: input contains '@@' but no hunks were parsed");
            }
        }
        Commands::Files => {
            for pair in doc.file_pairs() {
                println!("{} -> {}", pair.source_file, pair.target_file);
            }
        }
        Commands::Map { line, side } => {
            let side = match side {
                MapSide::Source => Side::Source,
                MapSide::Target => Side::Target,
            };
            match doc.map_line(line, side) {
                Some(mapped) => println!("{mapped}"),
                None => println!("no mapping"),
            }
        }
        Commands::Lines {
            start,
            end,
            reverse,
        } => {
            print!("{}", doc.sub_diff(start, end, direction(reverse)).text());
        }
        Commands::Hunk { line, reverse } => {
            print!("{}", doc.sub_diff_hunk(line, direction(reverse)).text());
        }
    }

    Ok(())
}
