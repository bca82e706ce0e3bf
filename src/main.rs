// `main.rs` only declares modules and delegates to `server::run()`.
// Directive handling lives in `dispatch`, `discovery` and `power`; the
// broker side in `mqtt`.
mod config;
mod directive;
mod discovery;
mod dispatch;
mod error;
mod handlers;
mod metrics;
mod mqtt;
mod power;
mod server;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    server::run().await
}
