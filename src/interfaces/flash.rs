use actix_web::{
    cookie::{Cookie, CookieJar, Key, SameSite},
    dev::Payload,
    http::header::LOCATION,
    web, FromRequest, HttpRequest, HttpResponse,
};
use futures_util::future::{ready, Ready};

use crate::{errors::AppError, AppState};

pub const FLASH_COOKIE: &str = "_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Error,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Error => "error",
        }
    }
}

/// One-shot message shown on the next rendered page. Travels in a cookie
/// signed with the application key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

impl FlashMessage {
    pub fn success(message: impl Into<String>) -> Self {
        FlashMessage { level: FlashLevel::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        FlashMessage { level: FlashLevel::Error, message: message.into() }
    }

    /// `level:hex(message)`. Request cookies are percent-decoded on the way
    /// in, so the signed value must not contain `%`.
    fn encode(&self) -> String {
        let hex: String = self.message.bytes().map(|b| format!("{b:02x}")).collect();
        format!("{}:{}", self.level.as_str(), hex)
    }

    fn decode(value: &str) -> Option<Self> {
        let (level, hex) = value.split_once(':')?;
        let level = match level {
            "success" => FlashLevel::Success,
            "error" => FlashLevel::Error,
            _ => return None,
        };
        if hex.len() % 2 != 0 || !hex.is_ascii() {
            return None;
        }
        let bytes = (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
            .collect::<Option<Vec<u8>>>()?;
        let message = String::from_utf8(bytes).ok()?;
        Some(FlashMessage { level, message })
    }

    pub fn to_cookie(&self, key: &Key) -> Cookie<'static> {
        let cookie = Cookie::build(FLASH_COOKIE, self.encode())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish();

        let mut jar = CookieJar::new();
        jar.signed_mut(key).add(cookie);
        jar.get(FLASH_COOKIE)
            .cloned()
            .unwrap_or_else(|| Cookie::new(FLASH_COOKIE, ""))
    }

    /// Verifies and decodes the flash cookie; tampered values are ignored.
    pub fn from_cookie(cookie: Cookie<'static>, key: &Key) -> Option<Self> {
        let mut jar = CookieJar::new();
        jar.add_original(cookie);
        let verified = jar.signed(key).get(FLASH_COOKIE)?;
        Self::decode(verified.value())
    }

    pub fn removal_cookie() -> Cookie<'static> {
        let mut cookie = Cookie::build(FLASH_COOKIE, "").path("/").finish();
        cookie.make_removal();
        cookie
    }
}

impl FromRequest for FlashMessage {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let flash = req
            .app_data::<web::Data<AppState>>()
            .zip(req.cookie(FLASH_COOKIE))
            .and_then(|(state, cookie)| FlashMessage::from_cookie(cookie, &state.cookie_key));

        match flash {
            Some(flash) => ready(Ok(flash)),
            None => ready(Err(AppError::NotFound("No flash message".into()))),
        }
    }
}

/// 303 to `location`, carrying `flash` to the page rendered there.
pub fn redirect_with_flash(location: &str, flash: &FlashMessage, key: &Key) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .cookie(flash.to_cookie(key))
        .finish()
}
