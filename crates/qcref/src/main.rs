use std::{io::Write, path::Path};

use clap::Parser;
use qcref::{cleanup, config::Config, die, run_test};

/// run one regression job against an external quantum chemistry package and
/// compare the results it reports to stored reference values
#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
struct Args {
    /// the configuration file to run
    #[arg(value_parser, default_value_t = String::from("qcref.toml"))]
    infile: String,

    /// the directory for scratch files
    #[arg(short, long, default_value_t = String::from("."))]
    workdir: String,

    /// keep the scratch files after the run
    #[arg(short, long, default_value_t = false)]
    keep: bool,

    /// print the version and exit
    #[arg(short, long, default_value_t = false)]
    version: bool,
}

fn main() -> Result<(), std::io::Error> {
    env_logger::init();
    let args = Args::parse();
    if args.version {
        println!("qcref version: {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = Config::load(&args.infile);
    if let Err(e) = config.validate() {
        die!("{}: {e}", args.infile);
    }
    let workdir = Path::new(&args.workdir);
    if let Err(e) = std::fs::create_dir_all(workdir) {
        die!("failed to create {} with {e}", workdir.display());
    }
    print!("{config}");

    match run_test(&config, workdir) {
        Ok(summary) => {
            print!("{summary}");
            let mut f = std::fs::File::create(format!("{}.json", config.name))?;
            writeln!(f, "{}", serde_json::to_string_pretty(&summary)?)?;
            if !args.keep {
                cleanup(&config.name, workdir);
            }
            if !summary.passed() {
                std::process::exit(1);
            }
        }
        Err(e) => die!("{}: {e}", config.name),
    }

    Ok(())
}
