//! Entry point for the `qbt-flow` binary.

#[tokio::main]
async fn main() {
    let exit_code = qbt_flow_cli::run().await;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}
