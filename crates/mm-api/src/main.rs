use mm_api::error::ApiError;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    mm_api::run().await
}
