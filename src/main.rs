use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::{error::Error, process};

use clap::{ArgAction, Parser, ValueHint};
use log::{debug, error, LevelFilter};

use shuffled::client::Client;
use shuffled::config::{self, Config, FileSource};
use shuffled::load::{self, LibraryLoader};
use shuffled::mpd::{Mpd, Tag, DEFAULT_DIAL_TIMEOUT};
use shuffled::rule::Rule;
use shuffled::shuffle::ShuffleChain;
use shuffled::{connect, getpass, queue};

/// Group name for mutually exclusive logging options.
const ARGS_GROUP_LOGGING: &str = "logging";

/// Command line arguments as parsed by `clap`.
#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Songs to exclude from shuffling (think blacklist)
    ///
    /// Each occurrence is one rule of TAG VALUE pairs; a song is excluded
    /// when any of a rule's tag values contains its pattern,
    /// case-insensitively.
    #[arg(short, long, num_args = 2.., value_names = ["TAG", "VALUE"], action = ArgAction::Append)]
    exclude: Vec<Vec<String>>,

    /// Use song URIs from FILE instead of the whole library
    ///
    /// Supply `-` to read URIs from standard input, e.g. piped out of
    /// another program.
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    file: Option<String>,

    /// Don't check file URIs against the library or the exclude rules
    #[arg(short = 'n', long)]
    no_check: bool,

    /// Shuffle whole groups of songs sharing these tags
    ///
    /// With `--group-by album`, an entire album is queued at once instead
    /// of one song at a time.
    #[arg(short, long, num_args = 1.., value_name = "TAG")]
    group_by: Vec<Tag>,

    /// Same as --group-by album date
    #[arg(long, conflicts_with = "group_by")]
    by_album: bool,

    /// Add NUMBER songs and exit, instead of queueing continuously
    #[arg(short = 'o', long, value_name = "NUMBER", default_value_t = 0)]
    only: u32,

    /// Keep NUMBER songs queued after the current one
    ///
    /// Queue-lookahead features like crossfade stop working when the
    /// current song is the last one; this keeps a buffer behind it.
    #[arg(short, long, value_name = "NUMBER", default_value_t = 0)]
    queue_buffer: usize,

    /// Hostname or IP address to connect to
    ///
    /// May carry an inline password in the `password@host` form.
    #[arg(long, env = "MPD_HOST")]
    host: Option<String>,

    /// Port number to connect to
    #[arg(short, long, env = "MPD_PORT")]
    port: Option<u16>,

    /// How many other songs must play before a song can repeat
    #[arg(long, value_name = "NUMBER", default_value_t = config::DEFAULT_WINDOW_SIZE)]
    window_size: usize,

    /// Wait for the first player event instead of starting playback
    #[arg(long)]
    no_play_on_startup: bool,

    /// Exit successfully when the library is updated
    ///
    /// Useful together with --file when the URI list is regenerated
    /// after library updates.
    #[arg(long)]
    exit_on_db_update: bool,

    /// Suppresses all output except warnings and errors.
    #[arg(long, default_value_t = false, group = ARGS_GROUP_LOGGING)]
    quiet: bool,

    /// Enable verbose logging
    ///
    /// Specify twice for trace logging.
    #[arg(short, long, action = ArgAction::Count, group = ARGS_GROUP_LOGGING)]
    verbose: u8,
}

/// Initializes the logger facade.
///
/// The logging level is determined as follows, in order of precedence from
/// highest to lowest:
/// 1. Command line arguments
/// 2. `RUST_LOG` environment variable
/// 3. Hard coded default
fn init_logger(args: &Args) {
    let mut logger = env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    if args.quiet || args.verbose > 0 {
        let level = match args.verbose {
            0 => {
                // Quiet and verbose are mutually exclusive, and `verbose`
                // is 0 by default. So this arm means: quiet mode.
                LevelFilter::Warn
            }
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        // Filter log messages of external crates.
        logger.filter_module(module_path!(), level);
    }

    logger.init();
}

/// Builds the exclusion ruleset out of the raw `--exclude` occurrences.
fn build_ruleset(exclude: &[Vec<String>]) -> Result<Vec<Rule>, Box<dyn Error>> {
    let mut ruleset = Vec::with_capacity(exclude.len());
    for patterns in exclude {
        let mut rule = Rule::new();
        for pair in patterns.chunks(2) {
            match pair {
                [tag, value] => rule.add_pattern(tag.parse::<Tag>()?, value),
                [tag] => {
                    return Err(
                        format!("exclude pattern \"{tag}\" is missing a match value").into(),
                    )
                }
                _ => unreachable!("chunks(2) yields one or two elements"),
            }
        }
        // A rule with no patterns matches nothing; refuse it instead of
        // silently shuffling everything.
        if rule.is_empty() {
            return Err("an exclude rule needs at least one TAG VALUE pair".into());
        }
        ruleset.push(rule);
    }
    Ok(ruleset)
}

/// Resolves the parsed arguments into the configuration the core runs on.
fn build_config(args: &Args) -> Result<Config, Box<dyn Error>> {
    let group_by = if args.by_album {
        vec![Tag::Album, Tag::Date]
    } else {
        args.group_by.clone()
    };

    if args.no_check && !group_by.is_empty() {
        return Err("--group-by is not supported with --no-check".into());
    }
    if args.window_size < 1 {
        return Err("--window-size must be at least 1".into());
    }

    let file = args.file.as_deref().map(|path| {
        if path == "-" {
            FileSource::Stdin
        } else {
            FileSource::Path(path.into())
        }
    });

    Ok(Config {
        ruleset: build_ruleset(&args.exclude)?,
        group_by,
        window_size: args.window_size,
        queue_only: args.only,
        queue_buffer: args.queue_buffer,
        file,
        check_uris: !args.no_check,
        host: args.host.clone(),
        port: args.port,
        play_on_startup: !args.no_play_on_startup,
        exit_on_db_update: args.exit_on_db_update,
    })
}

/// Fills the chain from the configured source: the live library, a
/// library-checked file, or a raw file.
fn load_pool<C>(mpd: &mut C, config: &Config, chain: &mut ShuffleChain) -> Result<(), Box<dyn Error>>
where
    C: Mpd,
{
    match &config.file {
        None => LibraryLoader::new(&config.ruleset, &config.group_by).load(mpd, chain)?,
        Some(source) => {
            let reader: Box<dyn BufRead> = match source {
                FileSource::Stdin => Box::new(io::stdin().lock()),
                FileSource::Path(path) => Box::new(BufReader::new(File::open(path)?)),
            };
            if config.check_uris {
                LibraryLoader::with_whitelist(&config.ruleset, &config.group_by, reader)?
                    .load(mpd, chain)?;
            } else {
                load::load_file(reader, chain)?;
            }
        }
    }
    Ok(())
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = build_config(args)?;

    let mut prompt = || getpass::getpass("mpd password: ");
    let mut mpd = connect::connect(
        |address| Client::dial(address, DEFAULT_DIAL_TIMEOUT),
        &config,
        Some(&mut prompt),
    )?;

    let mut chain = ShuffleChain::new(config.window_size);
    load_pool(&mut mpd, &config, &mut chain)?;

    if chain.is_empty() {
        return Err(queue::pool_size_message(&chain).into());
    }
    println!("{}", queue::pool_size_message(&chain));

    if config.queue_only > 0 {
        let mut song_count = 0;
        for _ in 0..config.queue_only {
            let item = chain.pick().clone();
            song_count += item.len();
            mpd.add_item(&item)?;
        }

        let unit = if config.group_by.is_empty() {
            "song"
        } else {
            "group"
        };
        let plural = if config.queue_only > 1 { "s" } else { "" };
        if config.group_by.is_empty() {
            println!("Added {} {unit}{plural}.", config.queue_only);
        } else {
            println!(
                "Added {} {unit}{plural} ({song_count} songs).",
                config.queue_only
            );
        }
        return Ok(());
    }

    queue::run(&mut mpd, &mut chain, &config, None)?;
    Ok(())
}

fn main() {
    // `clap` handles our command line arguments and help text.
    let args = Args::parse();
    init_logger(&args);

    // Dump command line arguments before we do anything more.
    // This aids in debugging of whatever comes next.
    debug!("Command {args:#?}");

    if let Err(e) = run(&args) {
        error!("{e}");
        process::exit(1);
    }
}
