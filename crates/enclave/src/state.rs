//! # Enclaveサーバーの共有状態

use crate::runtime::EnclaveRuntime;

/// Enclaveサーバーの共有状態。
pub struct AppState {
    /// Enclaveランタイム実装
    pub runtime: Box<dyn EnclaveRuntime + Send + Sync>,
}
