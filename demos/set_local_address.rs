use std::net::IpAddr;

#[tokio::main]
async fn main() -> Result<(), wreq::Error> {
    // Build a client bound to the default local address.
    let client = wreq::Client::builder().build()?;
    let resp = client.get("https://api.ip.sb/ip").send().await?;
    println!("{}", resp.text().await?);

    // Build another client bound to `172.200.10.2`.
    let client = wreq::Client::builder()
        .local_address(IpAddr::from([172, 200, 10, 2]))
        .build()?;
    let resp = client.get("https://api.ip.sb/ip").send().await?;
    println!("{}", resp.text().await?);

    Ok(())
}
