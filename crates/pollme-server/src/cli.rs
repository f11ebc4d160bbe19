use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "pollme-server", about = "Poll creation and voting server")]
pub struct Args {
    /// Path to the TOML config file. Missing file means built-in defaults.
    #[arg(short, long, default_value = "pollme.toml")]
    pub config: String,
}
