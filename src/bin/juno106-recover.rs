//! Recover Juno-106 patches from a dump and write them in another format.

use std::env;
use std::io::{Error, ErrorKind};
use std::path::PathBuf;
use std::process::ExitCode;

use juno106_recover::format::FormatVariant;
use juno106_recover::job::{run_all, ConversionJob, OutputKind};
use log::{error, LevelFilter};
use simple_logger::SimpleLogger;

const USAGE: &str = "\
Usage: juno106-recover <SOURCE> <OUTPUT> [OPTIONS]
       juno106-recover --job <JOBS.json> [-v]

Options:
  --format <FORMAT>        container, nibble-hex-dump, raw-hex-dump,
                           annotated-listing or sys-ex
  --names <LISTING>        take the patch names from an annotated listing
  --output-kind <KIND>     sys-ex, json, table or state-list
  --library-name <NAME>    name of a JSON preset library
  --channel <CHANNEL>      MIDI channel of SysEx messages, 0 to 15
  -v, -vv                  log more detail
";

fn parse_format(value: &str) -> Result<FormatVariant, Error> {
    let variant = match value {
        "container" => FormatVariant::Container(Default::default()),
        "nibble-hex-dump" | "hex" => FormatVariant::NibbleHexDump(Default::default()),
        "raw-hex-dump" => FormatVariant::RawHexDump(Default::default()),
        "annotated-listing" | "listing" => FormatVariant::AnnotatedListing,
        "sys-ex" | "sysex" => FormatVariant::SysEx,
        _ => {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("Unknown format {value}"),
            ))
        }
    };
    Ok(variant)
}

fn parse_output_kind(value: &str) -> Result<OutputKind, Error> {
    let kind = match value {
        "sys-ex" | "sysex" | "syx" => OutputKind::SysEx,
        "json" => OutputKind::Json,
        "table" | "h" => OutputKind::Table,
        "state-list" | "txt" => OutputKind::StateList,
        _ => {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("Unknown output kind {value}"),
            ))
        }
    };
    Ok(kind)
}

struct Arguments {
    jobs: Vec<ConversionJob>,
    level: LevelFilter,
}

fn parse_arguments<I: Iterator<Item = String>>(mut args: I) -> Result<Arguments, Error> {
    let mut level = LevelFilter::Info;
    let mut job_file: Option<PathBuf> = None;
    let mut positional = Vec::new();
    let mut format = None;
    let mut names_source = None;
    let mut output_kind = None;
    let mut library_name = None;
    let mut sysex_channel = 0;

    let missing = |flag: &str| {
        Error::new(
            ErrorKind::InvalidInput,
            format!("Missing value for {flag}"),
        )
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-v" => level = LevelFilter::Debug,
            "-vv" => level = LevelFilter::Trace,
            "--job" => job_file = Some(args.next().ok_or_else(|| missing("--job"))?.into()),
            "--format" => {
                format = Some(parse_format(&args.next().ok_or_else(|| missing("--format"))?)?)
            }
            "--names" => {
                names_source = Some(PathBuf::from(
                    args.next().ok_or_else(|| missing("--names"))?,
                ))
            }
            "--output-kind" => {
                output_kind = Some(parse_output_kind(
                    &args.next().ok_or_else(|| missing("--output-kind"))?,
                )?)
            }
            "--library-name" => {
                library_name = Some(args.next().ok_or_else(|| missing("--library-name"))?)
            }
            "--channel" => {
                let value = args.next().ok_or_else(|| missing("--channel"))?;
                sysex_channel = match value.parse::<u8>() {
                    Ok(channel) if channel < 16 => channel,
                    _ => {
                        return Err(Error::new(
                            ErrorKind::InvalidInput,
                            format!("Channel {value} is not between 0 and 15"),
                        ))
                    }
                };
            }
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("Unknown option {flag}"),
                ))
            }
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    let jobs = match (job_file, positional.as_slice()) {
        (Some(path), []) => ConversionJob::read_jobs(path)?,
        (None, [source, output]) => {
            let mut job = ConversionJob::new(source, output);
            job.format = format;
            job.names_source = names_source;
            job.output_kind = output_kind;
            job.library_name = library_name;
            job.sysex_channel = sysex_channel;
            vec![job]
        }
        _ => return Err(Error::new(ErrorKind::InvalidInput, USAGE)),
    };
    Ok(Arguments { jobs, level })
}

fn main() -> ExitCode {
    let arguments = match parse_arguments(env::args().skip(1)) {
        Ok(arguments) => arguments,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = SimpleLogger::new()
        .with_level(arguments.level)
        .env()
        .init()
    {
        eprintln!("{error}");
    }

    let results = run_all(&arguments.jobs);
    let failed = results.iter().filter(|result| result.is_err()).count();
    if failed > 0 {
        error!("{failed} of {} jobs failed", results.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
