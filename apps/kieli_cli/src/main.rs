//! The `kieli` command-line tool.
//!
//! A thin wrapper around [`kieli_cli::run_cli`], handling error display
//! and exit codes. All command logic is implemented in the library
//! crate for testability.
//!
//! # Exit Codes
//!
//! - `0` - Success
//! - `1` - Error (message printed to stderr)

fn main() {
    env_logger::init();
    if let Err(error) = kieli_cli::run_cli() {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}
