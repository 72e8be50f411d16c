use log::error;

#[tokio::main]
async fn main() {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    if let Err(e) = eatvote::run().await {
        error!("Server error: {e}");
    }
}
