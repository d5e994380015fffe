use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{command, value_parser, Arg, ArgAction, ArgMatches, Command};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};

use crawl_dedupe::item::ItemPaths;
use crawl_dedupe::{deduplicate_file_with, DedupeError, Stats};

/// Exit status when the input is not a valid WARC file.
const EXIT_FORMAT_ERROR: u8 = 65;
/// Exit status when files could not be accessed.
const EXIT_IO_ERROR: u8 = 74;

fn cli() -> Command<'static> {
    command!()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Do not display a progress bar"),
        )
        .subcommand(
            Command::new("file")
                .about("Deduplicate one WARC file into another")
                .arg(
                    Arg::new("INPUT")
                        .help("WARC file to read, compressed or not")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("OUTPUT")
                        .help("Compressed WARC file to create")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("item")
                .about("Deduplicate the capture in an item directory")
                .long_about(
                    "Deduplicate the capture in an item directory.\n\n\
                     Reads <ITEM_DIR>/<STEM>.warc.gz and writes \
                     <ITEM_DIR>/<STEM>-deduplicated.warc.gz.",
                )
                .arg(
                    Arg::new("ITEM_DIR")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("STEM")
                        .help("File name stem shared by the item's files")
                        .required(true)
                        .value_parser(value_parser!(String)),
                ),
        )
        .subcommand(
            Command::new("prepare")
                .about("Create the working directory for an item and print its file stem")
                .arg(
                    Arg::new("data-dir")
                        .long("data-dir")
                        .takes_value(true)
                        .default_value(".")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("prefix")
                        .long("prefix")
                        .help("Prefix of WARC file names, usually the project name")
                        .takes_value(true)
                        .required(true)
                        .value_parser(value_parser!(String)),
                )
                .arg(
                    Arg::new("ITEM_NAME")
                        .required(true)
                        .value_parser(value_parser!(String)),
                ),
        )
}

fn progress_bar(input: &Path, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let len = std::fs::metadata(input).map(|m| m.len()).unwrap_or(0);
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner} [{elapsed_precise}] {wide_bar} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
    ) {
        bar.set_style(style);
    }
    bar
}

fn deduplicate(input: &Path, output: &Path, quiet: bool) -> Result<Stats, DedupeError> {
    info!("Deduplicating {:?} into {:?}", input, output);
    let progress = progress_bar(input, quiet);
    let result = deduplicate_file_with(input, output, |file| progress.wrap_read(file));
    progress.finish_and_clear();

    let stats = result?;
    println!(
        "{} records: {} copied, {} deduplicated, {} without payload digest",
        stats.records, stats.copied, stats.deduplicated, stats.missing_digest
    );
    Ok(stats)
}

fn run(matches: &ArgMatches) -> Result<(), DedupeError> {
    let quiet = matches.get_one::<bool>("quiet").copied().unwrap_or(false);
    match matches.subcommand() {
        Some(("file", args)) => {
            let input = args.get_one::<PathBuf>("INPUT").expect("INPUT is required");
            let output = args.get_one::<PathBuf>("OUTPUT").expect("OUTPUT is required");
            deduplicate(input, output, quiet)?;
        }
        Some(("item", args)) => {
            let item_dir = args.get_one::<PathBuf>("ITEM_DIR").expect("ITEM_DIR is required");
            let stem = args.get_one::<String>("STEM").expect("STEM is required");
            let paths = ItemPaths::new(item_dir, stem.as_str());
            deduplicate(&paths.raw_warc(), &paths.deduplicated_warc(), quiet)?;
        }
        Some(("prepare", args)) => {
            let data_dir = args
                .get_one::<PathBuf>("data-dir")
                .expect("data-dir has a default");
            let prefix = args.get_one::<String>("prefix").expect("prefix is required");
            let item_name = args
                .get_one::<String>("ITEM_NAME")
                .expect("ITEM_NAME is required");

            let paths = ItemPaths::for_item(data_dir, prefix, item_name, chrono::Local::now());
            paths.prepare().map_err(|source| DedupeError::Create {
                path: paths.item_dir.clone(),
                source,
            })?;
            info!("Prepared item directory {:?}", paths.item_dir);
            println!("{}\t{}", paths.item_dir.display(), paths.warc_file_base);
        }
        _ => unreachable!("a subcommand is required"),
    }
    Ok(())
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let matches = cli().get_matches();

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            if e.is_format_error() {
                ExitCode::from(EXIT_FORMAT_ERROR)
            } else {
                ExitCode::from(EXIT_IO_ERROR)
            }
        }
    }
}
