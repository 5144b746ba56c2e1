#[tokio::main]
async fn main() {
    shares::start_server().await;
}
