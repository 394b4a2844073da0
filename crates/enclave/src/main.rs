//! # Fortuna Protocol Enclaveサーバー
//!
//! 呼び出し元が指定した整数範囲から一様な乱数を抽選し、
//! Ledgerが検証できる署名を付けて返すEnclaveサーバーのエントリポイント。
//!
//! ## 起動シーケンス
//! 1. ランタイム選択（環境変数 `ENCLAVE_RUNTIME`: `mock` / `nitro`）
//! 2. 署名用Ed25519キーペア生成（秘密鍵はEnclave内メモリのみ）
//! 3. `/process_data`, `/get_attestation` の受付開始

mod endpoints;
mod error;
mod runtime;
mod state;

use std::sync::Arc;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // ランタイム選択: ENCLAVE_RUNTIME=nitro ならNSM、それ以外はモック
    let runtime: Box<dyn runtime::EnclaveRuntime + Send + Sync> =
        match std::env::var("ENCLAVE_RUNTIME").as_deref() {
            Ok("nitro") => {
                tracing::info!("NitroRuntimeで起動します");
                Box::new(runtime::nitro::NitroRuntime::new())
            }
            _ => {
                tracing::info!("MockRuntimeで起動します");
                Box::new(runtime::mock::MockRuntime::new())
            }
        };

    // 署名用キーペア生成
    tracing::info!("署名用キーペアを生成中...");
    runtime.generate_signing_keypair();
    tracing::info!(
        pubkey = %fortuna_types::encode_hex(&runtime.signing_pubkey()),
        "署名用キーペア生成完了"
    );

    let shared_state = Arc::new(AppState { runtime });

    // axumルーターの構築
    let app = axum::Router::new()
        .route("/", axum::routing::get(endpoints::ping))
        .route(
            "/get_attestation",
            axum::routing::get(endpoints::attestation::handle_get_attestation),
        )
        .route(
            "/process_data",
            axum::routing::post(endpoints::process_data::handle_process_data),
        )
        .with_state(shared_state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    tracing::info!("Enclaveサーバーを {} で起動します", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
