//! render's main application entry point.
//! Parses arguments, sets up logging and hands off to the generator.

use render::{
    cli::get_args,
    error::{default_error_handler, Error},
    generate::{run, Options},
    logger::init_logger,
};

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    let json = args.json;
    let options = Options::from(args);

    match run(&options) {
        Ok(report) => {
            if let Err(e) = report.print(json) {
                default_error_handler(Error::IoError(e), json);
            }
        }
        Err(err) => default_error_handler(err, json),
    }
}
