mod commands;
mod gateway;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cloudgate")]
#[command(about = "どのクラウドも、同じライフサイクルで。", long_about = None)]
struct Cli {
    /// DEBUGログを出力
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// リソース種別ごとの状態遷移表を表示
    States {
        /// リソース種別 (instance, system, network, load_balancer)
        #[arg(short, long)]
        kind: Option<String>,
    },
    /// バックエンドが宣言している操作を表示
    Capabilities {
        /// バックエンドID（指定しない場合は全バックエンド）
        #[arg(short, long, env = "CLOUDGATE_BACKEND")]
        backend: Option<String>,
    },
    /// バックエンドの生ステータスを正規化
    Normalize {
        /// バックエンドID（省略時は default_backend）
        #[arg(short, long, env = "CLOUDGATE_BACKEND")]
        backend: Option<String>,
        /// バックエンドが返した生ステータス
        raw: String,
    },
    /// インメモリのバックエンドで作成から削除までを実行
    Simulate {
        /// バックエンドID（省略時は default_backend）
        #[arg(short, long, env = "CLOUDGATE_BACKEND")]
        backend: Option<String>,
        /// リソース種別
        #[arg(short, long, default_value = "instance")]
        kind: String,
        /// 収束ポーリング間隔（ミリ秒）
        #[arg(long, default_value = "50")]
        interval_ms: u64,
    },
    /// 読み込んだ設定を表示
    Config,
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログはstderrへ。--verbose でDEBUGを追加
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = if cli.verbose {
        filter.add_directive(tracing::Level::DEBUG.into())
    } else {
        filter
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("cloudgate {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Statesコマンドは標準の遷移表のみ使う
    if let Commands::States { kind } = &cli.command {
        return commands::states::handle(kind.as_deref());
    }

    let (config, source) = cloudgate_config::load_config()?;
    config.validate(cloudgate_drivers::PROFILE_NAMES)?;
    tracing::debug!("Config loaded from {:?}", source);

    match cli.command {
        Commands::Capabilities { backend } => {
            commands::capabilities::handle(&config, backend.as_deref())?;
        }
        Commands::Normalize { backend, raw } => {
            commands::normalize::handle(&config, backend.as_deref(), &raw)?;
        }
        Commands::Simulate {
            backend,
            kind,
            interval_ms,
        } => {
            commands::simulate::handle(&config, backend.as_deref(), &kind, interval_ms).await?;
        }
        Commands::Config => {
            commands::config::handle(&config, source.as_deref())?;
        }
        Commands::States { .. } | Commands::Version => {}
    }

    Ok(())
}
