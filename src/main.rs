use esa_cert_rotator::cli::{handle_command, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    use clap::Parser;
    let cli = Cli::parse();

    // Failures are already logged; only a failed upload changes the exit code.
    if let Err(failure) = handle_command(cli).await {
        if failure.is_fatal() {
            std::process::exit(failure.exit_code());
        }
    }
}
