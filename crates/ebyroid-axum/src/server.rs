//! Server startup.

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::create_router;
use crate::state::AppState;

/// Bind and serve the audiostream API until the process is stopped.
pub async fn serve(ctx: AppState, port: u16) -> Result<()> {
    let app = create_router(ctx);
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "ebyroid audiostream server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
