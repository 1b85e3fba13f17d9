//! # MailGate API ライブラリ
//!
//! ユースケースとハンドラを公開する。
//! バイナリ（`main.rs`）と統合テストの両方からここを経由して利用する。

pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;
