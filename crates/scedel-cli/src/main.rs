#![allow(clippy::print_stdout)]
use std::{fs, path::{Path, PathBuf}, process::ExitCode};

use clap::Parser;
use scedel::{SchemaRepository, ValidationError};

#[derive(Parser)]
#[command(name = "scedel", version, about = "Validate JSON documents against a Scedel schema")]
struct Cli {
    /// Root type to validate against, instead of the inferred one.
    #[arg(long = "type", value_name = "TYPE")]
    root_type: Option<String>,

    /// The JSON document to validate: a file path, or inline JSON text.
    document: String,

    /// The schema repository document (i.e. schema.json).
    schema: PathBuf,
}

fn load_repository(path: &Path) -> Result<SchemaRepository, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    Ok(SchemaRepository::from_json_str(&text)?)
}

fn run(cli: &Cli) -> Result<Vec<ValidationError>, Box<dyn std::error::Error>> {
    let repository = load_repository(&cli.schema)?;
    let document = if Path::new(&cli.document).is_file() {
        fs::read_to_string(&cli.document)?
    } else {
        cli.document.clone()
    };
    Ok(scedel::validate(
        document.as_str(),
        &repository,
        cli.root_type.as_deref(),
    ))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(errors) if errors.is_empty() => {
            println!("VALID");
            ExitCode::SUCCESS
        }
        Ok(errors) => {
            println!("INVALID. Errors:");
            for error in &errors {
                println!("{}: {} [{}/{}]", error.path, error, error.code(), error.category());
            }
            ExitCode::from(1)
        }
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::from(2)
        }
    }
}
