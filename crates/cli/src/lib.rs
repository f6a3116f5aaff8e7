pub mod bootstrap;
pub mod commands;
pub mod logging;

use clap::Parser;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "stockroom",
    about = "Manage a local inventory through natural-language requests",
    long_about = "Send one free-text request to the configured language model, let it create, \
                  update, or delete inventory items, and print its summary.",
    after_help = "Examples:\n  stockroom add 10 units of Bolt\n  stockroom \"delete item 2\""
)]
pub struct Cli {
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, help = "Free-text request")]
    intent: Vec<String>,
}

impl Cli {
    pub fn intent(&self) -> String {
        self.intent.join(" ")
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let result = commands::run::run(&cli.intent());

    if result.exit_code == 0 {
        println!("{}", result.output);
    } else {
        eprintln!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
