use clap::{Parser, Subcommand};
use std::{
    error::Error,
    io::{self, Write},
    path::PathBuf,
    rc::Rc,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use verstree::{
    utils::{join_path, split_path_into_dir_and_filename},
    Directory, File, FileSystemObject, Location, StoreConfig, StoreKind,
};

/// verstree - browse and copy directory trees on local disks and S3 buckets
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// TOML file with object store settings
    #[clap(long, short)]
    config: Option<PathBuf>,
    /// Object store provider, aws or ibm
    #[clap(long)]
    kind: Option<StoreKind>,
    /// Region the bucket lives in
    #[clap(long)]
    region: Option<String>,
    /// Custom object store endpoint
    #[clap(long)]
    endpoint_url: Option<String>,
    /// Ask for S3 transfer acceleration
    #[clap(long)]
    accelerate: bool,
    #[clap(subcommand)]
    command: Command,
}

/// Locations are s3://bucket/prefix, file:///path or plain local paths
#[derive(Subcommand, Debug)]
enum Command {
    /// List the immediate contents of a directory
    Ls { location: Location },
    /// Search a directory for names matching the mask, '*' matches anything
    Find {
        location: Location,
        mask: String,
        /// Search the whole subtree
        #[clap(long, short)]
        recursive: bool,
    },
    /// Print every folder and file below a directory
    Tree { location: Location },
    /// Write the content of a file to stdout
    Cat { location: Location },
    /// Copy a file, or a whole directory with --recursive
    Copy {
        source: Location,
        destination: Location,
        #[clap(long, short)]
        recursive: bool,
    },
}

/// Settings from the config file, overridden by flags
fn store_config(args: &Args) -> verstree::Result<StoreConfig> {
    let mut config = match &args.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };
    if let Some(kind) = args.kind {
        config.kind = kind;
    }
    if args.region.is_some() {
        config.region = args.region.clone();
    }
    if args.endpoint_url.is_some() {
        config.endpoint_url = args.endpoint_url.clone();
    }
    config.use_accelerate_endpoint |= args.accelerate;
    Ok(config)
}

/// A destination ending with '/' (or a bare bucket) receives the file under
/// its own name
fn file_target(source: &Location, destination: &Location) -> String {
    let dest = destination.path();
    if dest.is_empty() || dest.ends_with('/') {
        let (_, name) = split_path_into_dir_and_filename(source.path());
        join_path(dest, name)
    } else {
        dest.to_owned()
    }
}

fn print_tree(dir: &Rc<Directory>, depth: usize) -> verstree::Result<()> {
    let entries = dir.ls()?;
    let indent = "  ".repeat(depth);
    for folder in entries.folders.iter() {
        println!("{}{}/", indent, folder.name());
        print_tree(folder, depth + 1)?;
    }
    for file in entries.files.iter() {
        println!("{}{}", indent, file.name());
    }
    Ok(())
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = store_config(&args)?;
    match &args.command {
        Command::Ls { location } => {
            let entries = location.open_dir(&config)?.ls()?;
            for folder in entries.folders.iter() {
                println!("{:>12}  {}/", "-", folder.name());
            }
            for file in entries.files.iter() {
                let size = file
                    .metadata()
                    .size
                    .map_or_else(|| String::from("-"), |s| s.to_string());
                println!("{:>12}  {}", size, file.name());
            }
        }
        Command::Find {
            location,
            mask,
            recursive,
        } => {
            let dir = location.open_dir(&config)?;
            let found = if *recursive {
                dir.find_all(mask)?
            } else {
                dir.find(mask)?
            };
            for folder in found.folders.iter() {
                println!("{}", folder.path());
            }
            for file in found.files.iter() {
                println!("{}", file.path());
            }
        }
        Command::Tree { location } => {
            let dir = location.open_dir(&config)?;
            // One listing request for the whole bucket subtree
            if !location.is_local() {
                dir.cache_all()?;
            }
            println!("{}", dir.path());
            print_tree(&dir, 1)?;
        }
        Command::Cat { location } => {
            let content = location.open_file(&config)?.read()?;
            io::stdout().write_all(&content)?;
        }
        Command::Copy {
            source,
            destination,
            recursive,
        } => {
            let from = source.backend(&config)?;
            let to = destination.backend(&config)?;
            if *recursive {
                Directory::new(source.path(), from)
                    .convert(&to, destination.path())?
                    .save(None)?;
            } else {
                let target = file_target(source, destination);
                File::new(source.path(), from)
                    .convert(&to, &target)?
                    .save(None)?;
            }
            info!(%source, %destination, "copy finished");
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
    run(Args::parse())?;
    Ok(())
}
