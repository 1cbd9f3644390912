use tracing::warn;

use crate::storage::PageView;
use migration::entities::page_view;

/// 将 Sea-ORM Model 转换为 PageView
pub fn model_to_page_view(model: page_view::Model) -> PageView {
    let meta = model.meta.and_then(|raw| match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring unreadable meta on page view {}: {}", model.id, e);
            None
        }
    });

    PageView {
        id: model.id,
        path: model.path,
        referrer: model.referrer,
        screen: model.screen,
        ip: model.ip,
        city: model.city,
        country: model.country,
        isp: model.isp,
        browser: model.browser,
        browser_version: model.browser_version,
        os: model.os,
        os_version: model.os_version,
        device_type: model.device_type,
        latitude: model.latitude,
        longitude: model.longitude,
        meta,
        timestamp: model.created_at,
    }
}

/// 将 PageView 转换为 ActiveModel（只用于插入）
pub fn page_view_to_active_model(view: &PageView) -> page_view::ActiveModel {
    use sea_orm::ActiveValue::Set;

    page_view::ActiveModel {
        id: Set(view.id),
        path: Set(view.path.clone()),
        referrer: Set(view.referrer.clone()),
        screen: Set(view.screen.clone()),
        ip: Set(view.ip.clone()),
        city: Set(view.city.clone()),
        country: Set(view.country.clone()),
        isp: Set(view.isp.clone()),
        browser: Set(view.browser.clone()),
        browser_version: Set(view.browser_version.clone()),
        os: Set(view.os.clone()),
        os_version: Set(view.os_version.clone()),
        device_type: Set(view.device_type.clone()),
        latitude: Set(view.latitude),
        longitude: Set(view.longitude),
        meta: Set(view.meta.as_ref().map(|m| m.to_string())),
        created_at: Set(view.timestamp),
        search_text: Set(view.search_text()),
    }
}
