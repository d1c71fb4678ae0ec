use replay::ReplayConfig;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ReplayConfig::default();
    let records = replay::run(&config)?;

    for record in &records {
        println!("output: {} {}", record.output, record.expected);
    }

    let worst = records
        .iter()
        .map(|record| record.deviation().abs())
        .fold(0.0_f32, f32::max);
    log::info!("replayed {} samples, largest deviation {:.3}", records.len(), worst);
    Ok(())
}
