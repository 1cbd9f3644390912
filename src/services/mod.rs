//! Service layer for business logic
//!
//! 采集与 Dashboard 逻辑，HTTP 层只做参数提取和响应包装

mod dashboard_service;
pub mod data_hub;
pub mod geoip;
mod ingest_service;
pub mod user_agent;

pub use dashboard_service::*;
pub use data_hub::{DataHubForwarder, EventForwarder, ForwardError};
pub use geoip::{GeoError, GeoInfo, GeoIpLookup, GeoIpProvider};
pub use ingest_service::*;
pub use user_agent::{ParsedUserAgent, UserAgentParse, WootheeParser};
