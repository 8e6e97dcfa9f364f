// Binary entry point for polyfmt
// This is a thin wrapper that delegates to the library implementation

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    match polyfmt::shell::run().await {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("polyfmt fatal error: {:#}", e);
            Err(e)
        }
    }
}
