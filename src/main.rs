use clap::Parser;

mod commands;
mod output;

use commands::patch;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "rebrand")]
#[command(version = VERSION)]
#[command(about = "Rebrand the Android tree of a RustDesk fork without breaking its native library")]
struct Cli {
    #[command(flatten)]
    patch: patch::PatchArgs,

    /// Print a JSON envelope instead of the one-line summary
    #[arg(long)]
    json: bool,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let json = cli.json;

    match patch::run(cli.patch) {
        Ok((data, exit_code)) => {
            if json {
                if let Err(err) = output::print_success(&data) {
                    eprintln!("{}", output::format_failure(&err));
                    return std::process::ExitCode::from(1);
                }
            } else {
                println!("{}", data.summary_line());
            }
            std::process::ExitCode::from(exit_code_to_u8(exit_code))
        }
        Err(err) => {
            eprintln!("{}", output::format_failure(&err));
            if json {
                let _ = output::print_error_json(&err);
            }
            let exit_code = output::exit_code_for_error(err.code);
            std::process::ExitCode::from(exit_code_to_u8(exit_code))
        }
    }
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
