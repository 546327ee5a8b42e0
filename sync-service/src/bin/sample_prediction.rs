use anyhow::{bail, Context, Result};
use std::env;
use sync_service::{
    config::AppConfig,
    models::{Models, WeatherFeatures, FEATURE_NAMES},
    observability,
};

const DEFAULT_INPUT: [f64; 4] = [85.0, 70.0, 65.0, 0.0];

fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let values = match args.len() {
        0 => DEFAULT_INPUT,
        4 => {
            let mut values = [0.0; 4];
            for ((slot, raw), name) in values.iter_mut().zip(&args).zip(FEATURE_NAMES) {
                *slot = raw.parse().with_context(|| format!("invalid {name} '{raw}'"))?;
            }
            values
        }
        _ => bail!("usage: sample_prediction [Temp_max Temp_min Dew_max Precipit]"),
    };

    let cfg = AppConfig::load()?;
    let models = Models::load(&cfg.models)?;
    let features = WeatherFeatures::from(values);

    println!("input: {FEATURE_NAMES:?} = {values:?}");
    println!("linear regression: {:.2} kWh", models.linear.predict(&features));
    println!("svr: {:.2} kWh", models.kernel.predict(&features));

    Ok(())
}
