//! # Fortuna Protocol CLI
//!
//! Enclaveサーバーとの対話と、署名付きレスポンスのクライアント側検証を行う
//! コマンドラインツール。
//!
//! ## サブコマンド
//! - `request` — /process_data を呼び出し、署名付き乱数レスポンスを表示
//! - `attestation` — /get_attestation を呼び出し、Attestation Documentを表示
//! - `verify-response` — レスポンスの署名をEnclave公開鍵でオフライン検証

mod client;
mod error;
mod verify;

use clap::{Parser, Subcommand};

use client::EnclaveClient;

#[derive(Parser)]
#[command(name = "fortuna-cli", about = "Fortuna Protocol クライアントツール")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enclaveに乱数リクエストを送信する
    Request {
        /// EnclaveサーバーのURL（例: http://127.0.0.1:3000）
        #[arg(long)]
        endpoint: String,
        /// 範囲の下限（含む）
        #[arg(long)]
        min: u64,
        /// 範囲の上限（含む）
        #[arg(long)]
        max: u64,
    },
    /// EnclaveからAttestation Documentを取得する
    Attestation {
        /// EnclaveサーバーのURL
        #[arg(long)]
        endpoint: String,
        /// ドキュメントをパースしてPCR値を表示する（署名・チェーン検証は行わない）
        #[arg(long)]
        parse: bool,
    },
    /// /process_data レスポンスの署名をオフラインで検証する
    ///
    /// Ledgerへの提出前のプリフライトとして、Ledger側とバイト単位で同一の
    /// 正準バイト列を再構築して検証する。
    VerifyResponse {
        /// Enclaveの署名用Ed25519公開鍵（hex、32バイト）
        #[arg(long)]
        pubkey: String,
        /// /process_data レスポンスJSONのファイルパス
        #[arg(long)]
        file: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Request { endpoint, min, max } => {
            let client = EnclaveClient::new(endpoint);
            let response = client.process_data(min, max).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Attestation { endpoint, parse } => {
            let client = EnclaveClient::new(endpoint);
            let response = client.get_attestation().await?;
            if parse {
                let document = fortuna_types::decode_hex(&response.attestation)?;
                let doc = fortuna_crypto::attestation::nitro::parse_attestation(&document)?;
                println!("module_id: {}", doc.module_id);
                println!("digest:    {}", doc.digest);
                println!("timestamp: {}", doc.timestamp);
                for (index, value) in &doc.pcrs {
                    println!("PCR{}: {}", index, fortuna_types::encode_hex(value));
                }
                if let Some(public_key) = &doc.public_key {
                    println!("public_key: {}", fortuna_types::encode_hex(public_key));
                }
            } else {
                println!("{}", response.attestation);
            }
        }
        Command::VerifyResponse { pubkey, file } => {
            let response_json = std::fs::read_to_string(&file)?;
            let valid = verify::verify_processed_response(&pubkey, &response_json)?;
            if valid {
                println!("署名検証: 成功");
            } else {
                println!("署名検証: 失敗");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
