// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Starting QR Studio v{}", env!("CARGO_PKG_VERSION"));

    // share the runtime so controller timers and Tauri commands use the same reactor
    tauri::async_runtime::set(tokio::runtime::Handle::current());

    if let Err(e) = qrstudio_lib::run() {
        log::error!("error while running QR Studio: {:#}", e);
        std::process::exit(1);
    }
}
