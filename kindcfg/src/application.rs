use anyhow::Result;
use std::process::exit;

use crate::logging;
use crate::options::Options;

/// Handle a Result, printing the error and exiting with code 1 on failure.
pub fn handle_result(r: Result<()>) {
    match r {
        Ok(()) => {}
        Err(e) => {
            eprintln!("kindcfg error: {:?}", e);
            exit(1);
        }
    }
}

/// Run `f` with logging set up according to `options`.
pub fn with_logging(options: &Options, f: impl FnOnce() -> Result<()>) -> Result<()> {
    let mut frontend = logging::set_up(logging::Options {
        verbose: options.verbose,
        color: options.use_color(),
    })?;
    let result = f();
    frontend.tear_down()?;
    result
}
