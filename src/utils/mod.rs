pub mod ip;

pub use ip::{UNKNOWN_IP, extract_client_ip, is_private_or_local, should_skip_geolocation};
