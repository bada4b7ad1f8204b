use clap::Parser;
use reqline::{
    args::Args, logging, render_response, send_request, Error, RenderOptions, RequestSpec,
};
use std::{io, process};

/// reqline - Send one HTTP request and save the response body
fn main() {
    // Parse command line arguments
    let args = Args::parse();
    logging::init(args.verbose);

    if let Err(err) = run(&args) {
        match &err {
            Error::Transport(inner) if inner.is_timeout() => {
                eprintln!("Timeout error: {}", inner);
            }
            Error::Transport(inner) if inner.is_connect() => {
                eprintln!("Connection error: {}", inner);
            }
            _ => eprintln!("Error: {}", err),
        }
        if err.is_usage() {
            eprintln!("Try 'reqline --help' for more information.");
            process::exit(2);
        }
        process::exit(1);
    }
}

fn run(args: &Args) -> reqline::Result<()> {
    let spec = RequestSpec::from_args(args)?;
    let response = send_request(&spec, args.verbose)?;

    let stdout = io::stdout();
    render_response(Some(response), &RenderOptions::from(args), &mut stdout.lock())?;

    Ok(())
}
