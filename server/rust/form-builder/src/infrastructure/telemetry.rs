use tracing_subscriber::{
    fmt, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// TelemetryConfig はログ出力の初期化設定を保持する。
pub struct TelemetryConfig {
    pub service_name: String,
    pub version: String,
    pub environment: String,
    pub log_level: String,
    /// "text" の場合はプレーンテキスト、それ以外は JSON。
    pub log_format: String,
}

/// tracing-subscriber をグローバルに登録する。RUST_LOG が設定されていればそちらを優先する。
pub fn init_telemetry(cfg: &TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if cfg.log_format == "text" {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE);
        registry.with(fmt_layer).try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE);
        registry.with(fmt_layer).try_init()?;
    }

    tracing::info!(
        service = %cfg.service_name,
        version = %cfg.version,
        environment = %cfg.environment,
        "telemetry initialized"
    );
    Ok(())
}
