use plut_engine::LookupError;
use std::path::PathBuf;
use std::process;
use thiserror::Error;

/// Exit status for any fatal error
pub const EXIT_ERROR: i32 = 1;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}:{line}: {source}", path.display())]
    WordList {
        path: PathBuf,
        line: usize,
        source: LookupError,
    },
}

pub fn exit_with_error(err: CliError) -> ! {
    eprintln!("error: {}", err);
    process::exit(EXIT_ERROR);
}
