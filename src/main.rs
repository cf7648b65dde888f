#[tokio::main]
async fn main() {
    oncolens::run().await;
}
