use std::time::Duration;

use resilient_http::{
    BackoffConfig, CancellationToken, HttpRequest, ResilientClient, TransportOptions,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("PEOPLE_SEARCH_URL")?;

    let options = TransportOptions {
        timeout_ms: 5_000,
        retry_count: 3,
        backoff: BackoffConfig::new(
            Duration::from_millis(200),
            Duration::from_secs(5),
            2.0,
            Duration::from_millis(100),
        )?,
    };
    let mut client = ResilientClient::new(options);
    if let Ok(token) = std::env::var("PEOPLE_SEARCH_TOKEN") {
        client = client.with_bearer_auth(token)?;
    }

    let request = HttpRequest::post(url.parse()?).json(&serde_json::json!({
        "first_name": "Kit",
        "last_name": "Doe",
    }))?;

    // Give up on the whole call, retries included, after ten seconds.
    let cancel = CancellationToken::new();
    let deadline = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(10)).await;
        deadline.cancel();
    });

    let response = client.send_with_cancel(&request, &cancel).await?;
    println!("{} {}", response.status, response.text());

    Ok(())
}
