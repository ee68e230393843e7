use anyhow::Result;
use dtstats::{init_tracing_once, process_keywords, process_stats, StatsStore, StoreOptions};

fn main() -> Result<()> {
    init_tracing_once();

    let opts = StoreOptions::from_env();
    let mut store = StatsStore::from_options(&opts)?;

    let latest = store.latest_dt_prefix().to_string();
    println!("latest discussion thread: {latest}");

    let short_stats = process_stats(&mut store, 0, &opts)?;
    println!(
        "wrote stats for {latest} ({} unique users)",
        short_stats.get("unique_users").and_then(|v| v.as_u64()).unwrap_or(0)
    );

    let keywords = process_keywords(&mut store, 0, &opts)?;
    println!("top keywords: {}", keywords.keywords_h1.join(", "));

    Ok(())
}
