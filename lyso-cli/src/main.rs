use std::fs::File;
use std::io::{stdout, BufReader, Write};
use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, Subcommand};

use lyso_bam::header::{emit_header_text, HeaderLine};
use lyso_bam::samtext::alignment_to_sam_line;
use lyso_bam::{BamReader, SamItem};
use lyso_fastq::{tile_of_string, tile_to_string, FastqReader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a BGZF/BAM file and print it as SAM text.
    View { f_path: PathBuf },
    /// Run a FASTQ file through the record parser, reporting per-record failures.
    Fqcheck { f_path: PathBuf },
    /// Round-trip a 4-digit Illumina tile string through the tile codec.
    IlluminaTile { tile: String },
}

fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Commands::View { f_path } => view_bam(f_path),
        Commands::Fqcheck { f_path } => fqcheck(f_path),
        Commands::IlluminaTile { tile } => illumina_tile(tile),
    }
}

fn write_or_exit(handle: &mut impl Write, line: &str) {
    if let Err(e) = writeln!(handle, "{line}") {
        match e.kind() {
            std::io::ErrorKind::BrokenPipe => exit(141),
            _ => panic!("{e}"),
        }
    }
}

fn view_bam(fpath: &PathBuf) {
    let in_file = File::open(fpath).expect("unable to open file");
    let reader = BamReader::new(in_file);
    let stdout = stdout();
    let mut handle = stdout.lock();

    let mut header_lines = Vec::new();
    for item in reader {
        match item.expect("malformed bam stream") {
            SamItem::Header(line) => header_lines.push(line),
            SamItem::ReferenceSequenceDictionary(dict) => {
                let text_has_sq = header_lines.iter().any(|l| matches!(l, HeaderLine::Sq { .. }));
                if !header_lines.is_empty() {
                    write_or_exit(&mut handle, emit_header_text(&header_lines).trim_end());
                    header_lines.clear();
                }
                // The header text usually already carries one @SQ line per
                // dictionary entry; only synthesize them here when it didn't.
                if !text_has_sq {
                    for r in &dict {
                        write_or_exit(&mut handle, &format!("@SQ\tSN:{}\tLN:{}", r.name, r.length));
                    }
                }
            }
            SamItem::Alignment(rec) => write_or_exit(&mut handle, &alignment_to_sam_line(&rec)),
        }
    }
    if !header_lines.is_empty() {
        write_or_exit(&mut handle, emit_header_text(&header_lines).trim_end());
    }
}

fn fqcheck(fpath: &PathBuf) {
    let in_file = File::open(fpath).expect("unable to open file");
    let reader = FastqReader::new(BufReader::new(in_file));
    let stdout = stdout();
    let mut handle = stdout.lock();

    let mut total = 0;
    let mut failed = 0;
    for item in reader {
        total += 1;
        if let Err(e) = item {
            failed += 1;
            write_or_exit(&mut handle, &format!("record {total}: {e}"));
        }
    }
    write_or_exit(&mut handle, &format!("{total} records checked, {failed} failed"));
    if failed > 0 {
        exit(1);
    }
}

fn illumina_tile(tile: &str) {
    let parsed = tile_of_string(tile).expect("not a valid 4-digit illumina tile");
    println!("{:?}", parsed);
    println!("{}", tile_to_string(&parsed));
}
