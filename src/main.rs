use std::{
    fs,
    io::{
        self,
        Write,
    },
    path::PathBuf,
    process::ExitCode,
    time::Duration,
};

use ankigrab::{
    extract_rows,
    parse_rows,
    persistence::{
        self,
        Config,
        CONFIG_FILE,
    },
    render,
    AnkiConnect,
    CollectionStore,
    FieldMapping,
    GrabError,
    OutputFormat,
    SqliteCollection,
};
use clap::{
    Parser,
    Subcommand,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ankigrab")]
#[command(about = "Extract mined sentence cards from an Anki collection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every card in the deck as one line
    Extract {
        /// Deck to read
        #[arg(short, long)]
        deck: Option<String>,

        /// Read this collection.anki2 file instead of asking AnkiConnect
        #[arg(short, long, conflicts_with = "url")]
        collection: Option<PathBuf>,

        /// AnkiConnect address
        #[arg(short, long)]
        url: Option<String>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Take the first five note fields in order instead of mapping by name
        #[arg(long)]
        positional: bool,

        /// Wait for AnkiConnect to come online, trying this many times
        #[arg(long, default_value_t = 0)]
        wait: u32,
    },
    /// Convert a saved tuple-list dump to JSON
    Convert {
        file: PathBuf,
    },
    /// Write the default configuration file
    Init,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), GrabError> {
    match command {
        Commands::Extract { deck, collection, url, format, positional, wait } => {
            let mut config = Config::load()?;
            if let Some(deck) = deck {
                config.deck = deck;
            }
            if let Some(format) = format {
                config.format = format;
            }
            if positional {
                config.field_mapping = FieldMapping::positional();
            }
            if let Some(url) = url {
                config.anki_connect_url = url;
                config.collection_path = None;
            }
            if collection.is_some() {
                config.collection_path = collection;
            }

            let store = open_store(&config, wait)?;
            let rows = extract_rows(store.as_ref(), &config.extract_options())?;
            print_line(&render(&rows, config.format)?)
        }
        Commands::Convert { file } => {
            let text = fs::read_to_string(&file)?;
            let rows = parse_rows(&text)?;
            info!("Read {} rows from {}", rows.len(), file.display());
            print_line(&render(&rows, OutputFormat::Json)?)
        }
        Commands::Init => {
            if persistence::data_file_exists(CONFIG_FILE) {
                info!("Config already exists, leaving it untouched");
                print_line(&persistence::get_data_file_path(CONFIG_FILE).display().to_string())
            } else {
                let path = persistence::save_json(&Config::default(), CONFIG_FILE)?;
                print_line(&path.display().to_string())
            }
        }
    }
}

fn open_store(config: &Config, wait: u32) -> Result<Box<dyn CollectionStore>, GrabError> {
    if let Some(path) = &config.collection_path {
        return Ok(Box::new(SqliteCollection::open(path)?));
    }

    let anki = AnkiConnect::new(&config.anki_connect_url)?;
    if wait > 0 && !anki.wait_awake(Duration::from_secs(2), wait) {
        return Err(GrabError::AnkiConnect(format!("no answer from {}", anki.url())));
    }
    Ok(Box::new(anki))
}

fn print_line(line: &str) -> Result<(), GrabError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()?;
    Ok(())
}
