use clap::{Arg, ArgAction, Command};

pub const NAME: &str = "migrate";
pub const ARG_DRY_RUN: &str = "dry-run";

#[must_use]
pub fn command() -> Command {
    Command::new(NAME)
        .about("Rehash customer passwords still stored as plaintext")
        .arg(
            Arg::new(ARG_DRY_RUN)
                .long(ARG_DRY_RUN)
                .help("Report the accounts that would be rehashed without writing")
                .env("DRY_RUN")
                .action(ArgAction::SetTrue)
                .value_parser(clap::builder::BoolishValueParser::new()),
        )
}
