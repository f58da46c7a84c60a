//! # Check Subcommand
//!
//! Parses a seed file and validates every entry without touching the
//! database.

use std::path::PathBuf;

use clap::Args;

use crate::catalog::SeedFile;

/// Arguments for the check subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Seed file to validate.
    #[arg(long, short, default_value = "seed/catalog.yaml")]
    pub file: PathBuf,
}

/// Exit code 0 when every entry is valid, 1 otherwise.
pub fn run_check(args: &CheckArgs) -> anyhow::Result<u8> {
    let seed = SeedFile::load(&args.file)?;
    let problems = seed.problems();

    println!("{}: {}", args.file.display(), seed.summary());
    if problems.is_empty() {
        println!("OK");
        return Ok(0);
    }
    for problem in &problems {
        eprintln!("  invalid {problem}");
    }
    eprintln!("{} invalid entries", problems.len());
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn seed_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn valid_file_exits_zero() {
        let file = seed_file("kegs:\n  - size: 20 Litros\n    stock: 50\n");
        let args = CheckArgs {
            file: file.path().to_path_buf(),
        };
        assert_eq!(run_check(&args).unwrap(), 0);
    }

    #[test]
    fn invalid_entry_exits_one() {
        let file = seed_file("events:\n  - title: \"\"\n    date: 2026-02-15T19:00:00Z\n");
        let args = CheckArgs {
            file: file.path().to_path_buf(),
        };
        assert_eq!(run_check(&args).unwrap(), 1);
    }

    #[test]
    fn missing_file_is_an_error() {
        let args = CheckArgs {
            file: PathBuf::from("/nonexistent/catalog.yaml"),
        };
        assert!(run_check(&args).is_err());
    }
}
