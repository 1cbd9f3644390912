use beacon::config::{args::parse_config_path, get_config, init_config};
use beacon::errors::BeaconError;
use beacon::runtime::modes::run_server;
use beacon::system::init_logging;

#[actix_web::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let config_path = parse_config_path(&args);
    init_config(config_path.as_deref());
    let config = get_config();

    // guard 必须活到进程结束，否则非阻塞日志会丢
    let _log_guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    if let Err(e) = run_server().await {
        match e.downcast_ref::<BeaconError>() {
            Some(beacon_err) => eprintln!("{}", beacon_err.format_colored()),
            None => eprintln!(
                "{}",
                BeaconError::config(format!("{:#}", e)).format_colored()
            ),
        }
        std::process::exit(1);
    }
}
