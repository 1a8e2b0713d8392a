//! 시세 일괄 갱신 CLI.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

use pricefeed_collector::{
    BatchOutcome, BatchSession, CollectorConfig, LogNotifier, QuotePipeline,
};
use pricefeed_core::{init_logging, LogConfig, LogFormat, Symbol, SymbolResolver};
use pricefeed_data::{
    ExchangeSuffixResolver, MorningstarQuoteParser, MorningstarQuoteSource, PgPriceStore,
};

#[derive(Parser)]
#[command(name = "pricefeed-collector")]
#[command(about = "Sequential quote ingestion pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 로그 포맷 (pretty, json, compact). 없으면 LOG_FORMAT 환경변수
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// 종목별 span 진입/종료 로그
    #[arg(long)]
    trace_items: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 시세 갱신 (지정하지 않으면 저장된 전체 종목)
    Update {
        /// 특정 심볼만 갱신 (쉼표로 구분, 예: "VOD.L,SAP.DE")
        #[arg(long)]
        symbols: Option<String>,

        /// 최종 결과를 JSON으로 출력
        #[arg(long)]
        json: bool,
    },

    /// 테이블 생성
    InitSchema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_format = cli.log_format.or_else(LogFormat::from_env).unwrap_or_default();
    init_logging(
        LogConfig::for_workspace(&cli.log_level)
            .with_format(log_format)
            .with_item_spans(cli.trace_items),
    )?;

    tracing::info!("Pricefeed Collector 시작");

    let config = CollectorConfig::from_env()?;
    tracing::debug!(
        base_url = %config.quote_source.base_url,
        target_zone = %config.parser.target_zone,
        "설정 로드 완료"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.require_database_url()?)
        .await?;
    tracing::info!("데이터베이스 연결 성공");

    let store = Arc::new(PgPriceStore::new(pool.clone()));

    match cli.command {
        Commands::InitSchema => {
            store.ensure_schema().await?;
            tracing::info!("스키마 준비 완료");
        }
        Commands::Update { symbols, json } => {
            let symbols = match symbols {
                Some(list) => Symbol::parse_list(&list),
                None => store.list_symbols().await?,
            };

            let resolver: Arc<dyn SymbolResolver> = Arc::new(ExchangeSuffixResolver::default());
            let source = Arc::new(MorningstarQuoteSource::new(config.quote_source.clone())?);
            let parser = Arc::new(MorningstarQuoteParser::new(
                config.parser.clone(),
                resolver.clone(),
            ));
            let pipeline = QuotePipeline::new(resolver, source, parser, store.clone())
                .with_request_delay(config.batch.request_delay());

            let notifier = Arc::new(LogNotifier);
            let session = BatchSession::new(pipeline, notifier.clone(), notifier);

            let Some(handle) = session.start(symbols) else {
                tracing::warn!("갱신할 종목이 없습니다");
                pool.close().await;
                return Ok(());
            };

            let cancel = handle.cancellation_token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("종료 신호 수신, 현재 종목 처리 후 중단합니다");
                    cancel.cancel();
                }
            });

            let report = handle.wait().await?;
            report.run.log_summary("가격 갱신");

            if json {
                println!("{}", serde_json::to_string_pretty(&report.to_json())?);
            }

            if let BatchOutcome::Failed(reason) = &report.outcome {
                pool.close().await;
                anyhow::bail!("가격 갱신 실패: {}", reason);
            }
        }
    }

    pool.close().await;
    tracing::info!("Pricefeed Collector 종료");

    Ok(())
}
