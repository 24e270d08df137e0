use anyhow::{bail, Context, Result};
use lang_switch::{JsonDirLoader, SwitchCoordinator, SwitchOptions, ViewBinding, ViewProps};
use serde_json::{json, Value};
use tracing::info;

// Loads resolve on the same thread that dispatches, so end callbacks are
// observed in switch order.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lang_switch=info".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let dir = match args.next() {
        Some(dir) => dir,
        None => std::env::var("DICTIONARIES_DIR")
            .context("Usage: lang-switch <dictionaries-dir> <lang>... (or set DICTIONARIES_DIR)")?,
    };
    let langs: Vec<String> = args.collect();
    if langs.is_empty() {
        bail!("Usage: lang-switch <dictionaries-dir> <lang>...");
    }

    let loader = JsonDirLoader::new(&dir);
    info!(
        "Dictionaries available in {}: {:?}",
        dir,
        loader.available().await?
    );

    let options = SwitchOptions::<Value>::from_env()?
        .on_start_switch(|lang, _| info!("→ switching to {}", lang))
        .on_end_switch(|lang, _, _| info!("✓ {} is now active", lang));
    let coordinator = SwitchCoordinator::new(loader, options)?;
    let binding = ViewBinding::direct(coordinator.clone(), ());

    let _view = binding.mount(|props: ViewProps<Value>| {
        info!(
            "render: current={:?} loading={:?}",
            props.current_lang, props.loading_lang
        );
    });

    for lang in &langs {
        binding.props().switch_lang(lang)?;
        coordinator.settle().await;
    }

    let report = json!({
        "state": coordinator.state(),
        "metrics": coordinator.metrics().report(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
