use std::time::Duration;

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";
pub const DEFAULT_VIEWPORT: (u32, u32) = (1280, 800);
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10); // Timeout for opening a session

// Chrome browser arguments for deterministic page renders
pub fn chrome_arguments(headless: bool, viewport: (u32, u32)) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--no-sandbox",
        "--disable-gpu",
        "--disable-dev-shm-usage",
        "--disable-extensions",
        "--disable-notifications",
        "--disable-infobars",
        "--disable-popup-blocking",
        "--disable-features=TranslateUI",
        "--force-color-profile=srgb",
        "--hide-scrollbars",
        "--mute-audio",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    args.push(format!("--window-size={},{}", viewport.0, viewport.1));
    if headless {
        args.push("--headless=new".to_string());
    }
    args
}

// Chrome content settings preferences
pub fn chrome_preferences() -> serde_json::Map<String, serde_json::Value> {
    let mut prefs = serde_json::Map::new();
    prefs.insert("profile.default_content_setting_values.images".to_string(), 1.into()); // 1 = allow
    prefs.insert("profile.managed_default_content_settings.javascript".to_string(), 1.into()); // 1 = allow
    prefs.insert("profile.managed_default_content_settings.popups".to_string(), 2.into()); // 2 = block
    prefs.insert("profile.managed_default_content_settings.geolocation".to_string(), 2.into()); // 2 = block
    prefs
}
