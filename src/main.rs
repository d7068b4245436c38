use gitgrade_lib::commands::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load()?;
    log::debug!("Effective settings: {settings:?}");
    gitgrade_lib::run(settings).await?;
    Ok(())
}
