mod cli;
mod config;
mod generate;
mod init;
mod write;

pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Gen(args) => generate::run(args),
        cli::Command::Init(args) => init::run(args),
    }
}
