#[tokio::main]
async fn main() {
    if let Err(e) = taskboard_backend::run().await {
        log::error!(target: "taskboard.server", "Fatal: {}", e);
        eprintln!("taskboard-backend: {}", e);
        std::process::exit(1);
    }
}
