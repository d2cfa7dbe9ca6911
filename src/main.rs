use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = roomctl::cli::Cli::parse();
    let exit_code = roomctl::run(cli).await;
    std::process::exit(exit_code);
}
