// Entry point stays minimal: logging, configuration, then the app loop in src/app.rs.

mod api;
mod app;
mod logger;
mod types;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logger::init();
    app::config::load_config_from_disk();

    let res = app::run();
    if let Err(ref e) = res {
        log::error!("console loop failed: {e}");
    }
    Ok(res?)
}
