use anyhow::{bail, Context, Result};
use std::{env, path::Path};
use sync_service::{observability, sources::split_csv_by_date};
use twin_client::domain::feature_key::parse_iso_date;

const DEFAULT_CUTOFF: &str = "2020-01-01";

fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 5 {
        bail!("usage: split_dataset <input.csv> <date_column> <train_out.csv> <test_out.csv> [cutoff YYYY-MM-DD]");
    }
    let cutoff_raw = args.get(5).map(String::as_str).unwrap_or(DEFAULT_CUTOFF);
    let Some(cutoff) = parse_iso_date(cutoff_raw) else {
        bail!("invalid cutoff date '{cutoff_raw}', expected YYYY-MM-DD");
    };

    let counts = split_csv_by_date(
        Path::new(&args[1]),
        &args[2],
        cutoff,
        Path::new(&args[3]),
        Path::new(&args[4]),
    )
    .with_context(|| format!("splitting {}", args[1]))?;

    tracing::info!(
        train = counts.train,
        test = counts.test,
        skipped = counts.skipped,
        cutoff = %cutoff_raw,
        "dataset split"
    );
    Ok(())
}
