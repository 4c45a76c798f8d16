// Entry point for `cargo run -p web-server`: load settings, start logging,
// then hand over to the library.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = configuration::load_settings()?;
    let _guard = configuration::init_tracing(&settings.logging)?;

    web_server::run_server(&settings).await
}
