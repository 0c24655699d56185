use serde::{Deserialize, Serialize};
use tower_cookies::{Cookie, Cookies};

const FLASH_COOKIE_NAME: &str = "_flash";

/// One-shot message shown on the next rendered page.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Flash {
    pub kind: String,
    pub message: String,
}

pub fn set_flash(cookies: &Cookies, kind: &str, message: impl Into<String>) {
    let flash = Flash {
        kind: kind.to_owned(),
        message: message.into(),
    };
    let Ok(value) = serde_json::to_string(&flash) else {
        return;
    };

    let mut cookie = Cookie::new(FLASH_COOKIE_NAME, value);
    cookie.set_path("/");
    cookies.add(cookie);
}

pub fn success(cookies: &Cookies, message: impl Into<String>) {
    set_flash(cookies, "success", message);
}

/// Reads the pending flash, if any, and clears it.
pub fn take_flash(cookies: &Cookies) -> Option<Flash> {
    let value = cookies.get(FLASH_COOKIE_NAME)?.value().to_owned();

    let mut removal = Cookie::new(FLASH_COOKIE_NAME, "");
    removal.set_path("/");
    cookies.remove(removal);

    serde_json::from_str(&value).ok()
}
