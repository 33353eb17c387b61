//! # Tessera Application (Binary)
//!
//! Main executable entry point.

fn main() -> anyhow::Result<()> {
    tessera_app::main()
}
