use std::{collections::BTreeMap, error::Error};

use clap::Parser;
use incar::{Incar, Value};
use regex::RegexBuilder;

/// read a VASP INCAR file and print its keywords
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// INCAR file to read
    #[arg(value_parser, default_value_t = String::from("INCAR"))]
    infile: String,

    /// Print the keywords as JSON
    #[arg(short, long, default_value_t = false, conflicts_with = "toml")]
    json: bool,

    /// Print the keywords as a TOML table
    #[arg(short, long, default_value_t = false)]
    toml: bool,

    /// Lower-case the keys, as the calculator setup code sees them
    #[arg(short, long, default_value_t = false)]
    lower: bool,

    /// Only print keywords whose names match this regular expression. The
    /// match is case-insensitive
    #[arg(short, long)]
    keys: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut incar = Incar::load(&args.infile)?;
    if let Some(pat) = &args.keys {
        let re = RegexBuilder::new(pat).case_insensitive(true).build()?;
        incar = incar
            .iter()
            .filter(|(k, _)| re.is_match(k))
            .map(|(k, v)| (k.to_owned(), v.clone()))
            .collect();
        log::debug!("{} keywords match {pat}", incar.len());
    }

    if args.json || args.toml {
        let params: BTreeMap<String, Value> = if args.lower {
            incar.case_insensitive_view()
        } else {
            incar.params().clone()
        };
        if args.json {
            println!("{}", serde_json::to_string_pretty(&params)?);
        } else {
            print!("{}", toml::to_string(&params)?);
        }
    } else if args.lower {
        print!("{}", incar.display_lower());
    } else {
        print!("{incar}");
    }

    Ok(())
}
