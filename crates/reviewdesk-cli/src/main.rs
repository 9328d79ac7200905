//! Entry point for the `reviewdesk` binary.

#[tokio::main]
async fn main() {
    let exit_code = reviewdesk_cli::run().await;
    std::process::exit(exit_code);
}
