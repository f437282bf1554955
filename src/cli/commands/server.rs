use clap::{Arg, ArgAction, Command};

pub const NAME: &str = "server";
pub const ARG_PORT: &str = "port";
pub const ARG_INIT_SCHEMA: &str = "init-schema";

#[must_use]
pub fn command() -> Command {
    Command::new(NAME)
        .about("Serve the customer authentication API")
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("ZOO_AUTH_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_INIT_SCHEMA)
                .long(ARG_INIT_SCHEMA)
                .help("Create the Customer table if it does not exist")
                .env("ZOO_AUTH_INIT_SCHEMA")
                .action(ArgAction::SetTrue)
                .value_parser(clap::builder::BoolishValueParser::new()),
        )
}
