// Wick: C struct front end for binary serializer generators

use std::fs;
use std::path::PathBuf;

use clap::Parser as ClapParser;
use log::info;

use wick::model::{DataModel, ModelOptions, Packing, Program};
use wick::parser::diagnostics::Severity;

/// Parse C struct declarations and print their layouts.
#[derive(Debug, ClapParser)]
#[command(name = "wick", version, about)]
struct Args {
    /// C source file holding the struct declarations
    source: PathBuf,

    /// Integer width conventions used for layout
    #[arg(long, default_value_t = DataModel::Lp64)]
    data_model: DataModel,

    /// Lay members out without padding
    #[arg(long)]
    packed: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    if !args.source.exists() {
        eprintln!("Error: File '{}' not found", args.source.display());
        std::process::exit(1);
    }

    let source = fs::read_to_string(&args.source)?;

    info!("parsing {}", args.source.display());
    let result = wick::parse(&source)?;

    for diagnostic in &result.diagnostics {
        eprintln!("{}: {}", args.source.display(), diagnostic);
    }
    if result.diagnostics.iter().any(|d| d.severity == Severity::Error) {
        eprintln!("Aborting due to previous errors");
        std::process::exit(1);
    }

    let options = ModelOptions {
        data_model: args.data_model,
        packing: if args.packed {
            Packing::Packed
        } else {
            Packing::Natural
        },
    };
    let program = match Program::from_parse_result(&result, &options) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Model error: {}", e);
            std::process::exit(1);
        }
    };

    for structure in &program.structs {
        println!("{structure}");
    }

    Ok(())
}
